//! SVG document model.
//!
//! A [`Document`] is an owned, mutable element tree built from SVG source
//! text. It answers the queries the rasterization core needs (lookup by id,
//! restricted selectors, attribute access, child traversal) and serializes
//! back to SVG text for the render backend.

mod options;
mod tree;
pub(crate) mod writer;

pub use options::ParseOptions;
pub use tree::{Attribute, Document, ElementId};

/// Tags whose content is referenced from elsewhere (paint servers, clip
/// paths, symbols, styles) rather than drawn in place.
pub(crate) const DEFINITION_TAGS: &[&str] = &[
    "defs",
    "symbol",
    "linearGradient",
    "radialGradient",
    "pattern",
    "clipPath",
    "mask",
    "filter",
    "marker",
    "style",
];

impl Document {
    /// Top-most definition elements outside `exclude`'s subtree.
    ///
    /// Used to carry gradients, clip paths and referenced symbols along when
    /// a single element is rendered on its own.
    pub fn definition_roots(&self, exclude: ElementId) -> Vec<ElementId> {
        let mut roots = Vec::new();
        let mut stack = vec![self.root()];
        while let Some(el) = stack.pop() {
            if el == exclude {
                continue;
            }
            let is_definition = self
                .tag_name(el)
                .is_some_and(|tag| DEFINITION_TAGS.contains(&tag));
            if is_definition && !self.is_ancestor_or_self(el, exclude) {
                roots.push(el);
                continue;
            }
            stack.extend(self.children(el).into_iter().rev());
        }
        roots
    }
}
