//! Level-of-detail sizing.

use serde::{Deserialize, Serialize};

use crate::model::Size;

/// Smallest accepted LOD bias.
pub const MIN_LOD_BIAS: f32 = 0.1;
/// Largest accepted LOD bias.
pub const MAX_LOD_BIAS: f32 = 4.0;

/// Requests with a dimension below this are rendered smaller.
pub const SMALL_TARGET: i32 = 128;
/// Requests with a dimension above this are rendered larger.
pub const LARGE_TARGET: i32 = 512;

const SMALL_TARGET_FACTOR: f32 = 0.75;
const LARGE_TARGET_FACTOR: f32 = 1.25;

/// Bounds for each dimension of an LOD render size.
pub const MIN_RENDER_DIMENSION: i32 = 32;
pub const MAX_RENDER_DIMENSION: i32 = 4096;

/// Whether and how strongly requested sizes are remapped before rendering.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LodPolicy {
    pub enabled: bool,
    bias: f32,
}

impl LodPolicy {
    /// Create a policy; `bias` is clamped like [`set_bias`](Self::set_bias).
    pub fn new(enabled: bool, bias: f32) -> Self {
        Self {
            enabled,
            bias: clamp_bias(bias),
        }
    }

    /// A policy that leaves every size unchanged.
    pub fn disabled() -> Self {
        Self::new(false, 1.0)
    }

    pub fn bias(&self) -> f32 {
        self.bias
    }

    /// Set the bias, clamped to `[MIN_LOD_BIAS, MAX_LOD_BIAS]`, and return
    /// the value actually stored.
    pub fn set_bias(&mut self, bias: f32) -> f32 {
        self.bias = clamp_bias(bias);
        self.bias
    }
}

impl Default for LodPolicy {
    fn default() -> Self {
        Self::disabled()
    }
}

fn clamp_bias(bias: f32) -> f32 {
    if !bias.is_finite() {
        log::warn!("Ignoring non-finite LOD bias {}, using 1.0", bias);
        return 1.0;
    }
    bias.clamp(MIN_LOD_BIAS, MAX_LOD_BIAS)
}

/// Map a requested size to the size actually rendered.
///
/// Disabled policies return `requested` unchanged. Otherwise both
/// dimensions are scaled by the bias, further reduced for small targets or
/// enlarged for large ones, truncated, and clamped to
/// `[MIN_RENDER_DIMENSION, MAX_RENDER_DIMENSION]`.
pub fn compute_render_size(requested: Size, policy: &LodPolicy) -> Size {
    if !policy.enabled {
        return requested;
    }

    // Scaled in f32: 200 at bias 0.7 must give 140, not 139.
    let mut scale = policy.bias;
    if requested.width < SMALL_TARGET || requested.height < SMALL_TARGET {
        scale *= SMALL_TARGET_FACTOR;
    } else if requested.width > LARGE_TARGET || requested.height > LARGE_TARGET {
        scale *= LARGE_TARGET_FACTOR;
    }

    let apply = |dim: i32| -> i32 {
        // `as` saturates on overflow.
        ((dim as f32 * scale).trunc() as i32).clamp(MIN_RENDER_DIMENSION, MAX_RENDER_DIMENSION)
    };

    Size::new(apply(requested.width), apply(requested.height))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_is_identity() {
        let policy = LodPolicy::new(false, 3.0);
        for size in [Size::new(1, 1), Size::new(64, 700), Size::new(10_000, 5)] {
            assert_eq!(compute_render_size(size, &policy), size);
        }
    }

    #[test]
    fn test_small_medium_large_targets() {
        let policy = LodPolicy::new(true, 1.0);
        assert_eq!(compute_render_size(Size::new(100, 100), &policy), Size::new(75, 75));
        assert_eq!(compute_render_size(Size::new(256, 256), &policy), Size::new(256, 256));
        assert_eq!(compute_render_size(Size::new(600, 600), &policy), Size::new(750, 750));
        // Small wins when one side is small and the other large.
        assert_eq!(compute_render_size(Size::new(100, 600), &policy), Size::new(75, 450));
    }

    #[test]
    fn test_thresholds_are_exclusive() {
        let policy = LodPolicy::new(true, 1.0);
        assert_eq!(compute_render_size(Size::new(128, 128), &policy), Size::new(128, 128));
        assert_eq!(compute_render_size(Size::new(512, 512), &policy), Size::new(512, 512));
    }

    #[test]
    fn test_truncation_and_clamping() {
        let policy = LodPolicy::new(true, 1.0);
        // 101 * 0.75 = 75.75
        assert_eq!(compute_render_size(Size::new(101, 200), &policy), Size::new(75, 150));
        assert_eq!(compute_render_size(Size::new(10, 10), &policy), Size::new(32, 32));

        let big = LodPolicy::new(true, 4.0);
        assert_eq!(compute_render_size(Size::new(2000, 2000), &big), Size::new(4096, 4096));
    }

    #[test]
    fn test_fractional_bias_keeps_whole_pixels() {
        let policy = LodPolicy::new(true, 0.7);
        assert_eq!(compute_render_size(Size::new(200, 200), &policy), Size::new(140, 140));

        let policy = LodPolicy::new(true, 0.3);
        assert_eq!(compute_render_size(Size::new(300, 300), &policy), Size::new(90, 90));
    }

    #[test]
    fn test_enabled_output_always_in_bounds() {
        for bias in [0.1, 0.5, 1.0, 2.5, 4.0] {
            let policy = LodPolicy::new(true, bias);
            for w in [1, 31, 127, 128, 300, 512, 513, 4096, 20_000] {
                for h in [1, 64, 256, 1024, i32::MAX] {
                    let out = compute_render_size(Size::new(w, h), &policy);
                    assert!((MIN_RENDER_DIMENSION..=MAX_RENDER_DIMENSION).contains(&out.width));
                    assert!((MIN_RENDER_DIMENSION..=MAX_RENDER_DIMENSION).contains(&out.height));
                }
            }
        }
    }

    #[test]
    fn test_bias_clamping() {
        assert_eq!(LodPolicy::new(true, 0.0).bias(), MIN_LOD_BIAS);
        assert_eq!(LodPolicy::new(true, 9.0).bias(), MAX_LOD_BIAS);
        assert_eq!(LodPolicy::new(true, f32::NAN).bias(), 1.0);

        let mut policy = LodPolicy::default();
        assert_eq!(policy.set_bias(2.0), 2.0);
        assert!(!policy.enabled);
    }
}
