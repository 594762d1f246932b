//! Rasterization backends and pixel handling.
//!
//! The [`RenderBackend`] trait is the seam between the cache/override core
//! and the actual rasterizer. [`ResvgBackend`] is the default engine.
//! Rendered bitmaps come back premultiplied and are converted with
//! [`to_straight_rgba`] before they reach the cache.

mod backend;
mod engine;
mod options;
mod pixels;
mod postprocess;

pub use backend::{NativeBitmap, RenderBackend, RenderTarget};
pub use engine::ResvgBackend;
pub use options::ResourceOptions;
pub use pixels::{premultiply, rescale, to_straight_rgba};
pub use postprocess::{PixelShader, PostProcessor};
