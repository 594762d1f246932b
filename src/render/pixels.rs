//! Pixel layout conversion and rescaling.

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};

use super::backend::NativeBitmap;
use crate::error::{Error, Result};

/// Convert a premultiplied ARGB bitmap to a straight-alpha RGBA image.
///
/// Color channels are divided back out by alpha when `0 < alpha < 255`;
/// fully transparent and fully opaque pixels pass through unchanged. Alpha
/// itself is never altered.
pub fn to_straight_rgba(bitmap: &NativeBitmap) -> Result<RgbaImage> {
    let mut raw = Vec::with_capacity(bitmap.pixels.len() * 4);
    for &argb in &bitmap.pixels {
        let [a, r, g, b] = argb.to_be_bytes();
        raw.extend_from_slice(&[
            unpremultiply(r, a),
            unpremultiply(g, a),
            unpremultiply(b, a),
            a,
        ]);
    }

    RgbaImage::from_raw(bitmap.width, bitmap.height, raw).ok_or_else(|| {
        Error::Render(format!(
            "bitmap buffer does not match {}x{}",
            bitmap.width, bitmap.height
        ))
    })
}

fn unpremultiply(channel: u8, alpha: u8) -> u8 {
    match alpha {
        0 | 255 => channel,
        a => (channel as u32 * 255 / a as u32).min(255) as u8,
    }
}

/// Premultiply one straight RGBA pixel into an ARGB word.
pub fn premultiply(pixel: Rgba<u8>) -> u32 {
    let [r, g, b, a] = pixel.0;
    let scale = |c: u8| -> u32 {
        match a {
            0 | 255 => c as u32,
            a => (c as u32 * a as u32 + 127) / 255,
        }
    };
    (a as u32) << 24 | scale(r) << 16 | scale(g) << 8 | scale(b)
}

/// Resample `image` to `width` x `height` with a Lanczos filter.
///
/// Returns a new buffer; the input is left untouched.
pub fn rescale(image: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    if image.width() == width && image.height() == height {
        return image.clone();
    }
    imageops::resize(image, width, height, FilterType::Lanczos3)
}
