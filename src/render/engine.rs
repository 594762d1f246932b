//! resvg-based implementation of [`RenderBackend`].

use std::fmt::Write as _;
use std::sync::Arc;

use resvg::{tiny_skia, usvg};

use super::backend::{NativeBitmap, RenderBackend, RenderTarget};
use crate::document::writer::{escape_attribute, write_children, write_subtree};
use crate::document::{Document, ElementId};
use crate::error::{Error, Result};
use crate::model::{BoundingBox, Color};

/// Attributes of a `<symbol>` that describe its frame rather than its paint;
/// they are not carried onto the wrapper group.
const SYMBOL_FRAME_ATTRIBUTES: &[&str] = &[
    "id",
    "viewBox",
    "preserveAspectRatio",
    "x",
    "y",
    "width",
    "height",
    "refX",
    "refY",
];

/// Render backend built on resvg, usvg and tiny-skia.
///
/// Documents are serialized to SVG text and re-parsed by usvg on every
/// call, so whatever attributes the caller mutated are what gets drawn.
#[derive(Default, Clone)]
pub struct ResvgBackend {
    fontdb: Option<Arc<usvg::fontdb::Database>>,
}

impl ResvgBackend {
    /// Create a backend without fonts (`<text>` renders nothing).
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the system fonts once and share them across renders.
    pub fn with_system_fonts(mut self) -> Self {
        let mut db = usvg::fontdb::Database::new();
        db.load_system_fonts();
        log::debug!("Loaded {} font faces", db.len());
        self.fontdb = Some(Arc::new(db));
        self
    }

    fn options(&self) -> usvg::Options<'static> {
        let mut opt = usvg::Options::default();
        if let Some(db) = &self.fontdb {
            opt.fontdb = Arc::clone(db);
        }
        opt
    }

    fn parse(&self, text: &str) -> Result<usvg::Tree> {
        Ok(usvg::Tree::from_str(text, &self.options())?)
    }

    /// Frame an element is drawn in when rendered alone: a symbol's own
    /// `viewBox`, otherwise its stroke bounding box.
    fn frame(&self, doc: &Document, el: ElementId) -> Result<Option<BoundingBox>> {
        if doc.tag_name(el) == Some("symbol") {
            if let Some(vb) = doc
                .get_attribute(el, "viewBox")
                .and_then(BoundingBox::from_view_box)
            {
                return Ok(Some(vb));
            }
        }
        self.bounding_box(doc, el)
    }
}

impl std::fmt::Debug for ResvgBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResvgBackend")
            .field("system_fonts", &self.fontdb.is_some())
            .finish()
    }
}

impl RenderBackend for ResvgBackend {
    fn bounding_box(&self, doc: &Document, el: ElementId) -> Result<Option<BoundingBox>> {
        if doc.tag_name(el).is_none() {
            return Err(Error::ElementNotFound(format!("{:?}", el)));
        }

        let markup = element_markup(doc, el, None);
        let tree = self.parse(&markup)?;
        if tree.root().children().is_empty() {
            return Ok(None);
        }

        let rect = tree.root().abs_stroke_bounding_box();
        let bounds = BoundingBox::new(rect.x(), rect.y(), rect.width(), rect.height());
        Ok((!bounds.is_empty()).then_some(bounds))
    }

    fn render(
        &self,
        doc: &Document,
        target: RenderTarget,
        width: u32,
        height: u32,
        background: u32,
    ) -> Result<NativeBitmap> {
        let (tree, transform) = match target {
            RenderTarget::Document => {
                let tree = self.parse(&doc.to_svg_string())?;
                let size = tree.size();
                let transform = tiny_skia::Transform::from_scale(
                    width as f32 / size.width(),
                    height as f32 / size.height(),
                );
                (tree, transform)
            }
            RenderTarget::Element(el) => {
                let Some(frame) = self.frame(doc, el)? else {
                    log::debug!("Element draws nothing, returning background only");
                    return Ok(NativeBitmap::filled(width, height, background));
                };
                let markup = element_markup(doc, el, Some((frame, width, height)));
                (self.parse(&markup)?, tiny_skia::Transform::identity())
            }
        };

        let mut pixmap = tiny_skia::Pixmap::new(width, height).ok_or_else(|| {
            Error::Render(format!("cannot allocate a {}x{} pixmap", width, height))
        })?;
        if background != 0 {
            let c = Color::from_argb(background);
            pixmap.fill(tiny_skia::Color::from_rgba8(c.r, c.g, c.b, c.a));
        }

        resvg::render(&tree, transform, &mut pixmap.as_mut());

        let pixels = pixmap
            .pixels()
            .iter()
            .map(|p| {
                (p.alpha() as u32) << 24
                    | (p.red() as u32) << 16
                    | (p.green() as u32) << 8
                    | p.blue() as u32
            })
            .collect();
        NativeBitmap::from_pixels(width, height, pixels)
    }
}

/// Standalone SVG document drawing one element, with the document's
/// definitions carried along so references keep resolving.
///
/// With a frame the output is `width` x `height` pixels showing exactly the
/// frame; without one the element is drawn in document units (used for
/// measuring).
fn element_markup(
    doc: &Document,
    el: ElementId,
    frame: Option<(BoundingBox, u32, u32)>,
) -> String {
    let mut out = String::from(
        r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink""#,
    );
    if let Some((frame, width, height)) = frame {
        let _ = write!(
            out,
            r#" width="{}" height="{}" viewBox="{}""#,
            width,
            height,
            frame.to_view_box()
        );
        if let Some(aspect) = doc.get_attribute(el, "preserveAspectRatio") {
            out.push_str(r#" preserveAspectRatio=""#);
            escape_attribute(aspect, &mut out);
            out.push('"');
        }
    }
    out.push('>');

    let defs = doc.definition_roots(el);
    if !defs.is_empty() {
        out.push_str("<defs>");
        for def in defs {
            write_subtree(doc, def, false, &mut out);
        }
        out.push_str("</defs>");
    }

    if doc.tag_name(el) == Some("symbol") {
        out.push_str("<g");
        for attr in doc.attributes(el) {
            if SYMBOL_FRAME_ATTRIBUTES.contains(&attr.name.as_str()) {
                continue;
            }
            out.push(' ');
            out.push_str(&attr.name);
            out.push_str("=\"");
            escape_attribute(&attr.value, &mut out);
            out.push('"');
        }
        out.push('>');
        write_children(doc, el, &mut out);
        out.push_str("</g>");
    } else {
        write_subtree(doc, el, false, &mut out);
    }

    out.push_str("</svg>");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const ICON: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="100" height="50">
  <defs>
    <linearGradient id="grad"><stop offset="0" stop-color="red"/></linearGradient>
    <symbol id="icon" viewBox="0 0 10 10">
      <rect id="body" width="10" height="10" fill="#0000ff"/>
    </symbol>
  </defs>
  <rect id="left" x="0" y="0" width="50" height="50" fill="#ff0000"/>
  <rect id="right" x="60" y="10" width="20" height="30" fill="url(#grad)"/>
</svg>"##;

    #[test]
    fn test_render_full_document_scales() {
        let doc = Document::parse(ICON).unwrap();
        let backend = ResvgBackend::new();
        let bitmap = backend
            .render(&doc, RenderTarget::Document, 200, 100, 0)
            .unwrap();

        assert_eq!(bitmap.width, 200);
        assert_eq!(bitmap.height, 100);
        assert_eq!(bitmap.pixel(10, 10), Some(0xFFFF_0000));
        assert_eq!(bitmap.pixel(190, 90), Some(0));
    }

    #[test]
    fn test_render_symbol_fills_frame() {
        let doc = Document::parse(ICON).unwrap();
        let icon = doc.find_element_by_id("icon").unwrap();
        let bitmap = ResvgBackend::new()
            .render(&doc, RenderTarget::Element(icon), 16, 16, 0)
            .unwrap();

        assert_eq!(bitmap.pixel(0, 0), Some(0xFF00_00FF));
        assert_eq!(bitmap.pixel(15, 15), Some(0xFF00_00FF));
    }

    #[test]
    fn test_bounding_box_in_document_units() {
        let doc = Document::parse(ICON).unwrap();
        let right = doc.find_element_by_id("right").unwrap();
        let bounds = ResvgBackend::new()
            .bounding_box(&doc, right)
            .unwrap()
            .unwrap();

        assert!((bounds.x - 60.0).abs() < 0.01);
        assert!((bounds.y - 10.0).abs() < 0.01);
        assert!((bounds.w - 20.0).abs() < 0.01);
        assert!((bounds.h - 30.0).abs() < 0.01);
    }

    #[test]
    fn test_empty_element_renders_background() {
        let doc = Document::parse(
            r#"<svg xmlns="http://www.w3.org/2000/svg"><g id="empty"/></svg>"#,
        )
        .unwrap();
        let empty = doc.find_element_by_id("empty").unwrap();
        let backend = ResvgBackend::new();

        assert_eq!(backend.bounding_box(&doc, empty).unwrap(), None);
        let bitmap = backend
            .render(&doc, RenderTarget::Element(empty), 4, 4, 0xFF10_2030)
            .unwrap();
        assert!(bitmap.pixels.iter().all(|&p| p == 0xFF10_2030));
    }

    #[test]
    fn test_background_fill() {
        let doc = Document::parse(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="4" height="4"/>"#,
        )
        .unwrap();
        let bitmap = ResvgBackend::new()
            .render(&doc, RenderTarget::Document, 4, 4, 0xFFFF_FFFF)
            .unwrap();
        assert!(bitmap.pixels.iter().all(|&p| p == 0xFFFF_FFFF));
    }
}
