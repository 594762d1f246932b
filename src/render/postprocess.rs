//! Shader post-process hook.

use image::RgbaImage;

use crate::error::Result;
use crate::model::{Shader, Size};

/// External collaborator that runs a [`Shader`] over a rendered image.
///
/// The resource never executes shaders itself. A processor is injected at
/// construction; without one, shader requests return the unshaded image.
pub trait PostProcessor: Send + Sync {
    /// Check whether this processor can run `shader` at all.
    fn validate(&self, shader: &Shader) -> bool {
        shader.is_valid()
    }

    /// Produce a shaded copy of `image`.
    ///
    /// `size` is the caller's requested size, which `image` already has.
    /// Errors are recovered by the caller, which falls back to the input.
    fn apply(&self, image: &RgbaImage, shader: &Shader, size: Size) -> Result<RgbaImage>;
}

/// Post-processor that applies a function to every pixel.
///
/// Mostly useful for tests and simple color effects (tints, inversion).
pub struct PixelShader<F> {
    f: F,
}

impl<F> PixelShader<F>
where
    F: Fn(image::Rgba<u8>) -> image::Rgba<u8> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> PostProcessor for PixelShader<F>
where
    F: Fn(image::Rgba<u8>) -> image::Rgba<u8> + Send + Sync,
{
    fn apply(&self, image: &RgbaImage, shader: &Shader, _size: Size) -> Result<RgbaImage> {
        log::debug!("Applying pixel shader '{}'", shader.name);
        let mut out = image.clone();
        for px in out.pixels_mut() {
            *px = (self.f)(*px);
        }
        Ok(out)
    }
}
