use crate::color::RGB;
use crate::point::Point3;
use crate::sampling::Blackboard;
use crate::utils::float_max;
use crate::vector::Vector3;

use rand::Rng;
use serde::Deserialize;
use std::f32;

fn default_kc() -> f32 {
    1_f32
}
fn default_radius() -> f32 {
    0_f32
}
fn default_sample_quality() -> u32 {
    1
}

/// Directional, point, and spot lights (spec.md §3/§4.4). `Ambient` is an
/// additional variant SPEC_FULL.md's scene model needs for `Scene::ambient`
/// — a flat, position-independent contribution added once per pixel, not
/// queried per-shadow-ray.
#[derive(Deserialize, Clone, Copy)]
#[serde(tag = "type")]
pub enum Light {
    Ambient {
        intensity: RGB,
    },
    Directional {
        intensity: RGB,
        direction: Vector3,
    },
    Point {
        intensity: RGB,
        position: Point3,
        #[serde(rename = "kC", default = "default_kc")]
        k_c: f32,
        #[serde(rename = "kL", default)]
        k_l: f32,
        #[serde(rename = "kQ", default)]
        k_q: f32,
        #[serde(default = "default_radius")]
        radius: f32,
        #[serde(default = "default_sample_quality")]
        sample_quality: u32,
    },
    Spot {
        intensity: RGB,
        position: Point3,
        #[serde(rename = "kC", default = "default_kc")]
        k_c: f32,
        #[serde(rename = "kL", default)]
        k_l: f32,
        #[serde(rename = "kQ", default)]
        k_q: f32,
        #[serde(default = "default_radius")]
        radius: f32,
        #[serde(default = "default_sample_quality")]
        sample_quality: u32,
        direction: Vector3,
        narrow_beam_exponent: f32,
    },
}

impl Light {
    /// Color contribution at `p`, attenuation included. Ignores `p` for
    /// directional/ambient lights.
    pub fn intensity_at(&self, p: Point3) -> RGB {
        match self {
            Light::Ambient { intensity } => *intensity,
            Light::Directional { intensity, .. } => *intensity,
            Light::Point {
                intensity,
                position,
                k_c,
                k_l,
                k_q,
                ..
            } => *intensity * attenuation(*position, p, *k_c, *k_l, *k_q),
            Light::Spot {
                intensity,
                position,
                k_c,
                k_l,
                k_q,
                direction,
                narrow_beam_exponent,
                ..
            } => {
                let att = attenuation(*position, p, *k_c, *k_l, *k_q);
                let to_point = (p - *position).normalized();
                let beam = float_max(direction.normalized().dot(to_point), 0_f32)
                    .powf(*narrow_beam_exponent);
                *intensity * (att * beam)
            }
        }
    }

    /// Unit vector from the light toward `p`. For directional lights this
    /// is the light's own fixed direction, independent of `p`.
    pub fn direction_to(&self, p: Point3) -> Vector3 {
        match self {
            Light::Ambient { .. } => Vector3::zero(),
            Light::Directional { direction, .. } => direction.normalized(),
            Light::Point { position, .. } | Light::Spot { position, .. } => {
                (p - *position).normalized()
            }
        }
    }

    /// Used as `tMax` for shadow rays; `+inf` for directional/ambient since
    /// they have no finite position to occlude against.
    pub fn distance_to(&self, p: Point3) -> f32 {
        match self {
            Light::Ambient { .. } | Light::Directional { .. } => f32::MAX,
            Light::Point { position, .. } | Light::Spot { position, .. } => (p - *position).length(),
        }
    }

    pub fn is_ambient(&self) -> bool {
        matches!(self, Light::Ambient { .. })
    }

    /// Soft-shadow sample count carried on the light itself (spec.md §3's
    /// `sampleQuality`, §4.4's `n_samples`). Directional/ambient lights have
    /// no notion of sample count, since they're either skipped or sampled
    /// with a single fixed ray.
    pub fn sample_quality(&self) -> u32 {
        match self {
            Light::Ambient { .. } | Light::Directional { .. } => 1,
            Light::Point { sample_quality, .. } | Light::Spot { sample_quality, .. } => *sample_quality,
        }
    }

    /// Sample points on the light for soft shadows. Directional/ambient and
    /// zero-radius point/spot lights return a single point (hard shadow).
    /// Otherwise returns a jittered disk of `n` points centered on the
    /// light's position, oriented perpendicular to `p - position` (spec.md
    /// §4.4 / §9's canonicalized orientation).
    pub fn sample<R: Rng + ?Sized>(&self, p: Point3, n: u32, rng: &mut R) -> Vec<Point3> {
        match self {
            Light::Ambient { .. } => vec![Point3::origin()],
            Light::Directional { .. } => vec![Point3::origin()],
            Light::Point {
                position, radius, ..
            }
            | Light::Spot {
                position, radius, ..
            } => {
                if *radius <= 0_f32 || n <= 1 {
                    return vec![*position];
                }
                let normal = (p - *position).normalized();
                let u = normal.perpendicular();
                let v = normal.cross(u).normalized();
                Blackboard::jittered_disk(n, rng)
                    .into_iter()
                    .map(|(dx, dy)| *position + u * (dx * *radius) + v * (dy * *radius))
                    .collect()
            }
        }
    }
}

fn attenuation(light_pos: Point3, p: Point3, k_c: f32, k_l: f32, k_q: f32) -> f32 {
    let d = (p - light_pos).length();
    1_f32 / (k_c + k_l * d + k_q * d * d)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    #[test]
    fn point_light_attenuates_with_distance() {
        let light = Light::Point {
            intensity: RGB::white(),
            position: Point3::origin(),
            k_c: 1_f32,
            k_l: 0_f32,
            k_q: 1_f32,
            radius: 0_f32,
            sample_quality: 1,
        };
        let near = light.intensity_at(Point3::new(1_f32, 0_f32, 0_f32));
        let far = light.intensity_at(Point3::new(10_f32, 0_f32, 0_f32));
        assert!(near.r() > far.r());
    }

    #[test]
    fn hard_point_light_samples_to_single_point() {
        let light = Light::Point {
            intensity: RGB::white(),
            position: Point3::new(1_f32, 2_f32, 3_f32),
            k_c: 1_f32,
            k_l: 0_f32,
            k_q: 0_f32,
            radius: 0_f32,
            sample_quality: 1,
        };
        let mut rng = SmallRng::seed_from_u64(1);
        let samples = light.sample(Point3::origin(), 9, &mut rng);
        assert_eq!(samples.len(), 1);
    }

    #[test]
    fn soft_light_samples_stay_within_radius_of_position() {
        let position = Point3::new(0_f32, 0_f32, 5_f32);
        let light = Light::Point {
            intensity: RGB::white(),
            position,
            k_c: 1_f32,
            k_l: 0_f32,
            k_q: 0_f32,
            radius: 1_f32,
            sample_quality: 9,
        };
        let mut rng = SmallRng::seed_from_u64(2);
        let p = Point3::origin();
        let samples = light.sample(p, 16, &mut rng);
        assert_eq!(samples.len(), 16);
        let normal = (p - position).normalized();
        for s in samples {
            assert!((s - position).length() <= 1.0_f32 + 1e-4);
            // the disk is perpendicular to light->surface, so the offset
            // from the light's center has no component along that axis.
            assert!((s - position).dot(normal).abs() < 1e-4);
        }
    }
}
