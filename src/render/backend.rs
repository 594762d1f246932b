//! Render backend abstraction layer.
//!
//! Isolates the concrete rasterizer (resvg) from the cache and override
//! logic, so tests can count or fail render calls.

use crate::document::{Document, ElementId};
use crate::error::{Error, Result};
use crate::model::BoundingBox;

/// What a render call draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderTarget {
    /// The whole document, scaled to the output size.
    Document,
    /// One element (or symbol) framed on its own.
    Element(ElementId),
}

/// A rendered bitmap in the backend's native layout.
///
/// Every pixel is one `0xAARRGGBB` word with color channels premultiplied
/// by alpha.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeBitmap {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u32>,
}

impl NativeBitmap {
    /// A bitmap filled with one ARGB word.
    pub fn filled(width: u32, height: u32, argb: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![argb; width as usize * height as usize],
        }
    }

    /// Wrap an existing pixel buffer, checking its length.
    pub fn from_pixels(width: u32, height: u32, pixels: Vec<u32>) -> Result<Self> {
        if pixels.len() != width as usize * height as usize {
            return Err(Error::Render(format!(
                "bitmap buffer holds {} pixels, expected {}x{}",
                pixels.len(),
                width,
                height
            )));
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Pixel at `(x, y)`, if in bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<u32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get((y * self.width + x) as usize).copied()
    }
}

/// Abstract interface for the vector rasterizer.
///
/// Implementations receive the document with overrides already applied;
/// they must not keep references to it past the call.
pub trait RenderBackend: Send + Sync {
    /// Bounding box of an element in document units, including stroke.
    ///
    /// Returns `None` when the element draws nothing.
    fn bounding_box(&self, doc: &Document, el: ElementId) -> Result<Option<BoundingBox>>;

    /// Rasterize `target` into a `width` x `height` bitmap over a solid
    /// `background` (ARGB, `0` for transparent).
    fn render(
        &self,
        doc: &Document,
        target: RenderTarget,
        width: u32,
        height: u32,
        background: u32,
    ) -> Result<NativeBitmap>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_pixels_checks_length() {
        assert!(NativeBitmap::from_pixels(2, 2, vec![0; 4]).is_ok());
        assert!(matches!(
            NativeBitmap::from_pixels(2, 2, vec![0; 3]),
            Err(Error::Render(_))
        ));
    }

    #[test]
    fn test_pixel_access() {
        let mut bitmap = NativeBitmap::filled(3, 2, 0xFF00_0000);
        bitmap.pixels[4] = 0xFFFF_FFFF;
        assert_eq!(bitmap.pixel(1, 1), Some(0xFFFF_FFFF));
        assert_eq!(bitmap.pixel(0, 0), Some(0xFF00_0000));
        assert_eq!(bitmap.pixel(3, 0), None);
    }
}
