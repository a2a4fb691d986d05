use crate::config::{AaMode, RenderConfig};
use crate::error::RtError;
use crate::point::Point3;
use crate::ray::Ray;
use crate::sampling::Blackboard;
use crate::vector::Vector3;

use rand::Rng;

/// Maps pixel indices to primary rays (spec.md §4.6). `position`/`forward`/
/// `up` define the view basis; `right = forward x up` is derived once at
/// construction rather than recomputed per pixel.
pub struct Camera {
    position: Point3,
    forward: Vector3,
    up: Vector3,
    right: Vector3,
    view_plane_center: Point3,
    px_width: f32,
    px_height: f32,
    res_x: u32,
    res_y: u32,
    lens_radius: f32,
}

impl Camera {
    /// `up` need not already be perpendicular to `forward`; the caller's
    /// `up` is only used to derive `right`, and the camera's own `up` is
    /// re-derived as `right x forward` so the basis is always orthonormal.
    /// Fails with `InvalidConfiguration` if `forward`/`up` are parallel (no
    /// basis can be formed) or the view-plane/resolution aren't positive.
    pub fn new(
        position: Point3,
        forward: Vector3,
        up: Vector3,
        view_plane_distance: f32,
        view_plane_width: f32,
        view_plane_height: f32,
        res_x: u32,
        res_y: u32,
        lens_radius: f32,
    ) -> Result<Camera, RtError> {
        if view_plane_width <= 0_f32 || view_plane_height <= 0_f32 || view_plane_distance <= 0_f32 {
            return Err(RtError::InvalidConfiguration(
                "view plane distance/width/height must be positive".into(),
            ));
        }
        if res_x == 0 || res_y == 0 {
            return Err(RtError::InvalidConfiguration(
                "image resolution must be non-zero".into(),
            ));
        }
        let forward = forward
            .normalize()
            .ok_or_else(|| RtError::InvalidConfiguration("camera forward must be non-zero".into()))?;
        let right = forward
            .cross(up)
            .normalize()
            .ok_or_else(|| {
                RtError::InvalidConfiguration("camera forward and up must not be parallel".into())
            })?;
        // Re-derives `up` from `right`/`forward` instead of raising
        // InvalidConfiguration for a non-perpendicular input `up` — any
        // `up` that isn't parallel to `forward` unambiguously determines
        // the view plane's vertical axis once projected this way.
        let up = right.cross(forward).normalized();

        Ok(Camera {
            position,
            forward,
            up,
            right,
            view_plane_center: position + forward * view_plane_distance,
            px_width: view_plane_width / res_x as f32,
            px_height: view_plane_height / res_y as f32,
            res_x,
            res_y,
            lens_radius,
        })
    }

    pub fn resolution(&self) -> (u32, u32) {
        (self.res_x, self.res_y)
    }

    /// World-space center of pixel `(x, y)`, `x`/`y` real-valued so
    /// sub-pixel SSAA samples can be plotted at fractional offsets.
    /// `(0, 0)` is the top-left pixel, matching spec.md §4.6's image-space
    /// convention.
    fn pixel_center(&self, x: f32, y: f32) -> Point3 {
        self.view_plane_center
            + self.right * ((x - (self.res_x as f32 - 1_f32) / 2_f32) * self.px_width)
            - self.up * ((y - (self.res_y as f32 - 1_f32) / 2_f32) * self.px_height)
    }

    /// Single ray through the exact center of pixel `(x, y)`, no AA, no DOF.
    pub fn primary_ray(&self, x: u32, y: u32) -> Ray {
        let target = self.pixel_center(x as f32, y as f32);
        Ray::new(self.position, (target - self.position).normalized())
    }

    fn ray_through(&self, x: f32, y: f32, lens_u: f32, lens_v: f32) -> Ray {
        let target = self.pixel_center(x, y);
        let origin = self.position + self.right * lens_u + self.up * lens_v;
        Ray::new(origin, (target - origin).normalized())
    }

    /// Every ray a pixel's SSAA/DOF sampling needs, per `config.aa_mode`.
    /// `AaMode::Off` returns exactly one ray (the pixel center, plus lens
    /// jitter if `lens_radius > 0`); `Ssaa(k)` returns `k*k` jittered
    /// sub-pixel rays; `AdaptiveSsaa` is handled separately by
    /// `adaptive_sample`, since it needs to trace and compare colors as it
    /// subdivides rather than just producing a flat ray list.
    pub fn sample_rays<R: Rng + ?Sized>(&self, x: u32, y: u32, config: &RenderConfig, rng: &mut R) -> Vec<Ray> {
        let sub_offsets = match config.aa_mode {
            AaMode::Off | AaMode::AdaptiveSsaa(_) => vec![(0.5_f32, 0.5_f32)],
            AaMode::Ssaa(k) => Blackboard::jittered_grid(k, rng),
        };

        sub_offsets
            .into_iter()
            .map(|(sx, sy)| {
                let (lens_u, lens_v) = if self.lens_radius > 0_f32 {
                    let (du, dv) = Blackboard::jittered_disk(1, rng)[0];
                    (du * self.lens_radius, dv * self.lens_radius)
                } else {
                    (0_f32, 0_f32)
                };
                self.ray_through(x as f32 - 0.5_f32 + sx, y as f32 - 0.5_f32 + sy, lens_u, lens_v)
            })
            .collect()
    }

    /// The four corner sample positions of pixel `(x, y)` used by adaptive
    /// SSAA's variance check, and the recursive subdivision helper.
    pub fn corner_rays(&self, x: f32, y: f32, half_extent: f32) -> [Ray; 4] {
        [
            self.ray_through(x - half_extent, y - half_extent, 0_f32, 0_f32),
            self.ray_through(x + half_extent, y - half_extent, 0_f32, 0_f32),
            self.ray_through(x - half_extent, y + half_extent, 0_f32, 0_f32),
            self.ray_through(x + half_extent, y + half_extent, 0_f32, 0_f32),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn basic_camera() -> Camera {
        Camera::new(
            Point3::origin(),
            Vector3::new(0_f32, 0_f32, -1_f32),
            Vector3::new(0_f32, 1_f32, 0_f32),
            1_f32,
            2_f32,
            2_f32,
            100,
            100,
            0_f32,
        )
        .unwrap()
    }

    #[test]
    fn center_pixel_ray_points_down_forward() {
        let cam = basic_camera();
        let r = cam.primary_ray(49, 49);
        assert!(r.dir.z() < 0_f32);
        assert!((r.dir.length() - 1_f32).abs() < 1e-4);
    }

    #[test]
    fn rejects_non_positive_view_plane() {
        assert!(Camera::new(
            Point3::origin(),
            Vector3::new(0_f32, 0_f32, -1_f32),
            Vector3::new(0_f32, 1_f32, 0_f32),
            1_f32,
            0_f32,
            2_f32,
            10,
            10,
            0_f32,
        )
        .is_err());
    }

    #[test]
    fn rejects_parallel_forward_and_up() {
        assert!(Camera::new(
            Point3::origin(),
            Vector3::new(0_f32, 1_f32, 0_f32),
            Vector3::new(0_f32, 1_f32, 0_f32),
            1_f32,
            2_f32,
            2_f32,
            10,
            10,
            0_f32,
        )
        .is_err());
    }

    #[test]
    fn ssaa_grid_produces_k_squared_rays() {
        let cam = basic_camera();
        let config = RenderConfig {
            aa_mode: AaMode::Ssaa(3),
            ..RenderConfig::default()
        };
        let mut rng = SmallRng::seed_from_u64(4);
        let rays = cam.sample_rays(10, 10, &config, &mut rng);
        assert_eq!(rays.len(), 9);
    }
}
