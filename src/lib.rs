//! # svgtint
//!
//! Override-aware SVG rasterization with a level-of-detail raster cache.
//!
//! Load an SVG once, recolor or restyle parts of it at render time, and
//! rasterize the whole document, a `<symbol>` or any element by id. Repeated
//! requests with the same size and override state are served from cache.
//!
//! ## Quick Start
//!
//! ```no_run
//! use svgtint::{Color, Size, SvgResource};
//!
//! fn main() -> svgtint::Result<()> {
//!     let mut resource = SvgResource::new();
//!     resource.load_from_file("icons.svg")?;
//!
//!     // Recolor every element with class="accent"
//!     resource.set_fill_by_class("accent", Color::parse("#ff8800")?);
//!
//!     let image = resource.rasterize_symbol("home", Size::square(48))?;
//!     println!("{}x{}", image.width(), image.height());
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Overrides**: fill and stroke by id or class, arbitrary attributes by id,
//!   shader hints for an external post-processor
//! - **Caching**: keys built from content, render size and an
//!   order-independent override fingerprint
//! - **Level of detail**: render small targets smaller and large targets
//!   larger, then rescale to the requested size
//! - **SVGZ**: gzip-compressed input (`svgz` feature, on by default)

pub mod cache;
pub mod detect;
pub mod document;
pub mod error;
pub mod model;
pub mod overrides;
pub mod render;
pub mod resource;

// Re-export commonly used types
pub use cache::{compute_render_size, CacheStats, LodPolicy};
pub use detect::{detect_format_from_bytes, detect_format_from_path, is_svg, SvgFormat};
pub use document::{Document, ElementId, ParseOptions};
pub use error::{Error, Result};
pub use image::RgbaImage;
pub use model::{BoundingBox, Color, Shader, Size, Symbol};
pub use overrides::{EffectiveStyle, OverrideStore};
pub use render::{
    NativeBitmap, PixelShader, PostProcessor, RenderBackend, RenderTarget, ResourceOptions,
    ResvgBackend,
};
pub use resource::{ChangeReason, ContentChanged, SvgResource};

use std::path::Path;

/// Load an SVG file into a new resource with default options.
///
/// # Example
///
/// ```no_run
/// let resource = svgtint::load_file("icons.svg").unwrap();
/// println!("Symbols: {:?}", resource.symbol_ids());
/// ```
pub fn load_file<P: AsRef<Path>>(path: P) -> Result<SvgResource> {
    load_file_with_options(path, ResourceOptions::default())
}

/// Load an SVG file into a new resource with custom options.
pub fn load_file_with_options<P: AsRef<Path>>(
    path: P,
    options: ResourceOptions,
) -> Result<SvgResource> {
    let mut resource = SvgResource::with_options(options);
    resource.load_from_file(path)?;
    Ok(resource)
}

/// Load SVG source text into a new resource with default options.
pub fn load_str(text: &str) -> Result<SvgResource> {
    let mut resource = SvgResource::new();
    resource.load_from_str(text)?;
    Ok(resource)
}

/// Rasterize a whole SVG file at `size` in one call.
///
/// # Example
///
/// ```no_run
/// use svgtint::{rasterize_file, Size};
///
/// let image = rasterize_file("logo.svg", Size::new(256, 128)).unwrap();
/// assert_eq!(image.dimensions(), (256, 128));
/// ```
pub fn rasterize_file<P: AsRef<Path>>(path: P, size: Size) -> Result<RgbaImage> {
    load_file(path)?.rasterize_full(size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_str() {
        let resource = load_str(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="4" height="4"><symbol id="a"/></svg>"#,
        )
        .unwrap();
        assert!(resource.is_loaded());
        assert!(resource.has_symbol("a"));
    }

    #[test]
    fn test_load_str_rejects_garbage() {
        assert!(matches!(load_str("not svg"), Err(Error::Parse(_))));
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            load_file("/nonexistent/icons.svg"),
            Err(Error::Io(_))
        ));
    }
}
