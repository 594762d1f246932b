//! Rasterization cache, cache keys and LOD sizing.
//!
//! Keys combine what is drawn, the size it is drawn at and the override
//! fingerprint, so a cached image is reused only when all three match.
//! The whole cache is dropped on any override or configuration change.

mod key;
mod lod;
mod store;

pub use key::{build_key, ContentId};
pub use lod::{
    compute_render_size, LodPolicy, LARGE_TARGET, MAX_LOD_BIAS, MAX_RENDER_DIMENSION,
    MIN_LOD_BIAS, MIN_RENDER_DIMENSION, SMALL_TARGET,
};
pub use store::{CacheEntry, CacheStats, RasterCache};
