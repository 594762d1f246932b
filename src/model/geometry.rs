//! Pixel sizes and document-space boxes.

use serde::{Deserialize, Serialize};

/// A raster size in pixels.
///
/// Dimensions are signed so that invalid requests (zero or negative) can be
/// represented and rejected with [`crate::Error::InvalidSize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Size {
    /// Width in pixels
    pub width: i32,
    /// Height in pixels
    pub height: i32,
}

impl Size {
    /// Create a new size.
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    /// Create a square size.
    pub const fn square(side: i32) -> Self {
        Self::new(side, side)
    }

    /// Whether both dimensions are strictly positive.
    pub fn is_positive(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    /// Dimensions as unsigned values, if both are positive.
    pub fn to_unsigned(&self) -> Option<(u32, u32)> {
        if self.is_positive() {
            Some((self.width as u32, self.height as u32))
        } else {
            None
        }
    }

    /// Parse a `WIDTHxHEIGHT` string (e.g. `"256x128"`) or a single number
    /// for a square size.
    pub fn parse(s: &str) -> Result<Self, String> {
        let s = s.trim();
        if let Some((w, h)) = s.split_once(['x', 'X']) {
            let width: i32 = w.trim().parse().map_err(|_| "Invalid width")?;
            let height: i32 = h.trim().parse().map_err(|_| "Invalid height")?;
            return Ok(Size::new(width, height));
        }
        let side: i32 = s.parse().map_err(|_| "Invalid size")?;
        Ok(Size::square(side))
    }
}

impl From<(i32, i32)> for Size {
    fn from((width, height): (i32, i32)) -> Self {
        Self::new(width, height)
    }
}

impl std::fmt::Display for Size {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// An axis-aligned box in document units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl BoundingBox {
    /// Create a new bounding box.
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    /// Whether the box covers no area.
    pub fn is_empty(&self) -> bool {
        !(self.w > 0.0 && self.h > 0.0)
    }

    /// Parse an SVG `viewBox` attribute (`"min-x min-y width height"`,
    /// separated by whitespace and/or commas).
    pub fn from_view_box(value: &str) -> Option<Self> {
        let nums: Vec<f32> = value
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|s| !s.is_empty())
            .map(|s| s.parse::<f32>())
            .collect::<Result<_, _>>()
            .ok()?;

        match nums.as_slice() {
            [x, y, w, h] if w.is_finite() && h.is_finite() && *w > 0.0 && *h > 0.0 => {
                Some(Self::new(*x, *y, *w, *h))
            }
            _ => None,
        }
    }

    /// Format as an SVG `viewBox` attribute value.
    pub fn to_view_box(&self) -> String {
        format!("{} {} {} {}", self.x, self.y, self.w, self.h)
    }
}
