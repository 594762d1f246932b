//! Resource configuration.

use crate::document::ParseOptions;

/// Options controlling how an [`crate::SvgResource`] caches and renders.
#[derive(Debug, Clone)]
pub struct ResourceOptions {
    /// Keep rasterized images between calls
    pub cache_enabled: bool,

    /// Render at a level-of-detail size and rescale to the requested size
    pub lod_enabled: bool,

    /// LOD scale factor (clamped to 0.1..=4.0)
    pub lod_bias: f32,

    /// Background painted under the content, as an ARGB word (0 = transparent)
    pub background: u32,

    /// Upper bound on cached images; the oldest entry is evicted first
    pub max_cache_entries: Option<usize>,

    /// Document loading options
    pub parse: ParseOptions,
}

impl ResourceOptions {
    /// Create new resource options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable the raster cache.
    pub fn with_cache(mut self, enabled: bool) -> Self {
        self.cache_enabled = enabled;
        self
    }

    /// Enable or disable LOD sizing.
    pub fn with_lod(mut self, enabled: bool) -> Self {
        self.lod_enabled = enabled;
        self
    }

    /// Set the LOD bias.
    pub fn with_lod_bias(mut self, bias: f32) -> Self {
        self.lod_bias = bias;
        self
    }

    /// Set the background color.
    pub fn with_background(mut self, argb: u32) -> Self {
        self.background = argb;
        self
    }

    /// Bound the number of cached images.
    pub fn with_max_cache_entries(mut self, max: usize) -> Self {
        self.max_cache_entries = Some(max);
        self
    }

    /// Set the document parse options.
    pub fn with_parse_options(mut self, parse: ParseOptions) -> Self {
        self.parse = parse;
        self
    }
}

impl Default for ResourceOptions {
    fn default() -> Self {
        Self {
            cache_enabled: true,
            lod_enabled: false,
            lod_bias: 1.0,
            background: 0,
            max_cache_entries: None,
            parse: ParseOptions::default(),
        }
    }
}
