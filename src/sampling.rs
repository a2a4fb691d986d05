use rand::Rng;

/// Jittered-grid and jittered-disk sample generation, shared by every part
/// of the tracer that needs more than one sample per query: the light's
/// own soft-shadow area sampling (`Light::sample`), the camera's fixed and
/// adaptive SSAA sub-pixel grids, and depth-of-field lens sampling
/// (spec.md §2's "Sampling (Blackboard)" component, §4.6, §4.4).
///
/// Stratifying into an `n`-cell grid and jittering within each cell (rather
/// than pure uniform rejection sampling) keeps samples from clumping, which
/// is what makes a fixed small `n` converge faster for both SSAA and area
/// lights.
pub struct Blackboard;

impl Blackboard {
    /// `n * n` stratified samples in `[0, 1) x [0, 1)`. `n == 1` returns the
    /// exact cell center (no jitter), so `aaMode: Off` and `shadowSamples: 1`
    /// degenerate to the single deterministic sample a hard-shadow/no-AA
    /// pixel expects.
    pub fn jittered_grid<R: Rng + ?Sized>(n: u32, rng: &mut R) -> Vec<(f32, f32)> {
        if n <= 1 {
            return vec![(0.5_f32, 0.5_f32)];
        }
        let cell = 1_f32 / n as f32;
        let mut samples = Vec::with_capacity((n * n) as usize);
        for row in 0..n {
            for col in 0..n {
                let jx = rng.gen::<f32>();
                let jy = rng.gen::<f32>();
                samples.push((
                    (col as f32 + jx) * cell,
                    (row as f32 + jy) * cell,
                ));
            }
        }
        samples
    }

    /// `n` stratified samples on the unit disk, via concentric (Shirley)
    /// mapping of a jittered `ceil(sqrt(n))^2` grid so the disk stays evenly
    /// covered rather than clustering samples near the center the way naive
    /// polar jitter would. `n <= 1` returns the disk's center (hard shadow /
    /// no-DOF).
    pub fn jittered_disk<R: Rng + ?Sized>(n: u32, rng: &mut R) -> Vec<(f32, f32)> {
        if n <= 1 {
            return vec![(0_f32, 0_f32)];
        }
        let side = (n as f32).sqrt().ceil() as u32;
        Blackboard::jittered_grid(side, rng)
            .into_iter()
            .take(n as usize)
            .map(|(u, v)| concentric_disk(2_f32 * u - 1_f32, 2_f32 * v - 1_f32))
            .collect()
    }
}

/// Maps a point in `[-1, 1]^2` onto the unit disk, preserving area ratios
/// (Shirley & Chiu's concentric mapping) rather than the simpler but more
/// distorting polar mapping.
fn concentric_disk(sx: f32, sy: f32) -> (f32, f32) {
    if sx == 0_f32 && sy == 0_f32 {
        return (0_f32, 0_f32);
    }
    let (r, theta) = if sx.abs() > sy.abs() {
        (sx, std::f32::consts::FRAC_PI_4 * (sy / sx))
    } else {
        (sy, std::f32::consts::FRAC_PI_2 - std::f32::consts::FRAC_PI_4 * (sx / sy))
    };
    (r * theta.cos(), r * theta.sin())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn grid_of_one_is_center_with_no_jitter() {
        let mut rng = SmallRng::seed_from_u64(1);
        let grid = Blackboard::jittered_grid(1, &mut rng);
        assert_eq!(grid, vec![(0.5_f32, 0.5_f32)]);
    }

    #[test]
    fn grid_covers_every_cell_once() {
        let mut rng = SmallRng::seed_from_u64(2);
        let grid = Blackboard::jittered_grid(3, &mut rng);
        assert_eq!(grid.len(), 9);
        for (x, y) in grid {
            assert!((0_f32..1_f32).contains(&x));
            assert!((0_f32..1_f32).contains(&y));
        }
    }

    #[test]
    fn disk_samples_stay_within_unit_radius() {
        let mut rng = SmallRng::seed_from_u64(3);
        for (x, y) in Blackboard::jittered_disk(16, &mut rng) {
            assert!(x * x + y * y <= 1.0_f32 + 1e-4);
        }
    }
}
