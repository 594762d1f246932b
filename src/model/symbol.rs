//! Symbols: named, independently rasterizable sub-trees.

use serde::{Deserialize, Serialize};

use super::BoundingBox;

/// A `<symbol>` element extracted from a loaded document.
///
/// Symbols are recomputed on every successful load; a `Symbol` obtained
/// before a reload describes the previous document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Symbol {
    /// Element id, unique within the document
    pub id: String,

    /// Raw `viewBox` attribute, if present
    pub view_box: Option<String>,

    /// Computed bounding box in document units
    pub bounds: BoundingBox,
}

impl Symbol {
    /// Create a new symbol description.
    pub fn new(id: impl Into<String>, view_box: Option<String>, bounds: BoundingBox) -> Self {
        Self {
            id: id.into(),
            view_box,
            bounds,
        }
    }

    /// The region this symbol is framed by when rasterized on its own:
    /// the parsed `viewBox` when valid, otherwise the bounding box.
    pub fn frame(&self) -> BoundingBox {
        self.view_box
            .as_deref()
            .and_then(BoundingBox::from_view_box)
            .unwrap_or(self.bounds)
    }
}
