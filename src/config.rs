/// Anti-aliasing strategy (spec.md §6's `aaMode` option).
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AaMode {
    Off,
    /// Fixed `k x k` sub-pixel grid, `k` = the stored factor.
    Ssaa(u32),
    /// Adaptive SSAA: subdivide only when the 4-corner color variance
    /// exceeds `RenderConfig::adaptive_ssaa_variance_threshold`, to the
    /// given maximum recursion depth.
    AdaptiveSsaa(u32),
}

/// BVH split strategy (spec.md §6's `bvh` option).
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BvhStrategy {
    Off,
    Median,
    Sah,
}

/// How pixel work is distributed across threads (spec.md §4.7/§6's
/// `threads` option: 0 = sequential, 1..n = worker pool, `Auto` =
/// data-parallel).
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ThreadMode {
    Sequential,
    WorkerPool(usize),
    DataParallel,
}

/// Replaces the source's process-wide mutable render state (spec.md §9)
/// with a single explicit struct threaded through the render call.
#[derive(Clone, Copy, Debug)]
pub struct RenderConfig {
    pub max_depth: u32,
    pub min_k: f32,
    /// Intersection/numerics tolerance. Not the `2^-40` the spec documents —
    /// that figure assumes double precision; every component here is `f32`,
    /// so `1e-5` is the tightest tolerance that still clears `f32` rounding
    /// noise on the dot products `align_zero` guards.
    pub epsilon: f32,
    pub soft_shadows: bool,
    pub aa_mode: AaMode,
    pub bvh: BvhStrategy,
    pub leaf_size: usize,
    pub threads: ThreadMode,
    pub seed: u64,
    /// Per-channel color variance threshold above which adaptive SSAA
    /// subdivides a pixel further. Fixed at `0.001` (spec.md §9's open
    /// question on the drifting source constant; see DESIGN.md).
    pub adaptive_ssaa_variance_threshold: f32,
}

impl Default for RenderConfig {
    fn default() -> RenderConfig {
        RenderConfig {
            max_depth: 5,
            min_k: 1e-3_f32,
            epsilon: 1e-5_f32,
            soft_shadows: false,
            aa_mode: AaMode::Off,
            bvh: BvhStrategy::Sah,
            leaf_size: 2,
            threads: ThreadMode::DataParallel,
            seed: 0,
            adaptive_ssaa_variance_threshold: 0.001_f32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_sane() {
        let c = RenderConfig::default();
        assert!(c.max_depth > 0);
        assert!((1..=4).contains(&c.leaf_size));
        assert!(c.min_k > 0_f32);
    }
}
