use crate::aggregate::Workspace;
use crate::color::RGB;
use crate::config::RenderConfig;
use crate::point::Point3;
use crate::ray::Ray;
use crate::scene::Scene;
use crate::shape::GeoPoint;
use crate::utils::{align_zero, float_max, T_MAX, T_MIN};
use crate::vector::Vector3;

use rand::Rng;

/// Recursive Phong shader (spec.md §4.5): local diffuse/specular/emission
/// per light, transparency-aware hard/soft shadows, and global reflection/
/// refraction pruned by `RenderConfig::min_k`. Holds only borrows, so a
/// scheduler can build one per worker thread and reuse it across every
/// pixel that worker traces.
pub struct Tracer<'a> {
    pub scene: &'a Scene,
    pub config: &'a RenderConfig,
}

impl<'a> Tracer<'a> {
    pub fn new(scene: &'a Scene, config: &'a RenderConfig) -> Tracer<'a> {
        Tracer { scene, config }
    }

    pub fn new_workspace(&self) -> Workspace {
        self.scene.geometries.get_workspace()
    }

    /// `traceRay` (spec.md §4.5): finds the closest hit, falls back to the
    /// background, and adds the scene's flat ambient term on top of the
    /// recursive local+global shading.
    pub fn trace_ray<R: Rng + ?Sized>(&self, r: &Ray, ws: &mut Workspace, rng: &mut R) -> RGB {
        match self.scene.geometries.closest_hit(r, T_MIN, T_MAX, ws) {
            None => self.scene.background,
            Some(gp) => {
                let ambient = self.scene.ambient.intensity_at(gp.point);
                let shaded = self.calc_color(&gp, r, self.config.max_depth, RGB::white(), ws, rng);
                (shaded + ambient).sanitized()
            }
        }
    }

    fn calc_color<R: Rng + ?Sized>(
        &self,
        gp: &GeoPoint,
        ray: &Ray,
        level: u32,
        k: RGB,
        ws: &mut Workspace,
        rng: &mut R,
    ) -> RGB {
        let n = gp.geometry.normal(gp.point);
        let v = ray.dir;
        let nv = align_zero(n.dot(v));
        if nv == 0_f32 {
            return RGB::black();
        }

        let material = gp.geometry.material();
        let mut local = material.emission.unwrap_or(RGB::black());
        for light in &self.scene.lights {
            local = local + self.local_contribution(light, gp, v, n, nv, k, ws, rng);
        }
        local = local.sanitized();

        if level <= 1 {
            return local;
        }

        (local + self.global_contribution(gp, v, n, nv, level, k, ws, rng)).sanitized()
    }

    fn local_contribution<R: Rng + ?Sized>(
        &self,
        light: &crate::light::Light,
        gp: &GeoPoint,
        v: Vector3,
        n: Vector3,
        nv: f32,
        k: RGB,
        ws: &mut Workspace,
        rng: &mut R,
    ) -> RGB {
        if light.is_ambient() {
            return RGB::black();
        }

        let l = light.direction_to(gp.point);
        let nl = align_zero(n.dot(l));
        if nl == 0_f32 || nl.signum() != nv.signum() {
            return RGB::black();
        }

        let ktr = self.transparency(gp.point, light, n, ws, rng);
        if (k * ktr).is_negligible(self.config.min_k) {
            return RGB::black();
        }

        let material = gp.geometry.material();
        let diffuse = material.k_diffuse * nl.abs();
        let reflected = l - n * (2_f32 * nl);
        let spec_base = float_max(-v.dot(reflected), 0_f32);
        let specular = material.k_specular * spec_base.powi(material.shininess as i32);

        light.intensity_at(gp.point) * ktr * (diffuse + specular)
    }

    /// Shadow/transparency factor from `p` to `light` (spec.md §4.5). Hard
    /// mode casts one ray toward the light and multiplies every blocker's
    /// `kT`; soft mode averages that same product over `light.sample`'s
    /// jittered points.
    fn transparency<R: Rng + ?Sized>(
        &self,
        p: Point3,
        light: &crate::light::Light,
        n: Vector3,
        ws: &mut Workspace,
        rng: &mut R,
    ) -> RGB {
        let n_samples = if self.config.soft_shadows {
            light.sample_quality()
        } else {
            1
        };
        let targets = shadow_targets(light, p, n_samples, rng);
        if targets.is_empty() {
            return RGB::white();
        }

        let mut sum = RGB::black();
        for (dir, t_max) in &targets {
            let shadow_ray = Ray::leaving_surface(p, n, *dir);
            let blockers = self.scene.geometries.all_hits(&shadow_ray, T_MIN, *t_max, ws);
            let mut factor = RGB::white();
            for blocker in blockers {
                factor = factor * blocker.geometry.material().k_transparency;
            }
            sum = sum + factor;
        }

        (sum / targets.len() as f32).sanitized()
    }

    fn global_contribution<R: Rng + ?Sized>(
        &self,
        gp: &GeoPoint,
        v: Vector3,
        n: Vector3,
        nv: f32,
        level: u32,
        k: RGB,
        ws: &mut Workspace,
        rng: &mut R,
    ) -> RGB {
        let material = gp.geometry.material();
        let mut color = RGB::black();

        let k_r = material.k_reflectance;
        let reflect_weight = k * k_r;
        if !reflect_weight.is_negligible(self.config.min_k) {
            let reflect_dir = v - n * (2_f32 * nv);
            let reflect_ray = Ray::leaving_surface(gp.point, n, reflect_dir);
            color = color + self.recurse(&reflect_ray, level - 1, reflect_weight, ws, rng) * k_r;
        }

        let k_t = material.k_transparency;
        let refract_weight = k * k_t;
        if !refract_weight.is_negligible(self.config.min_k) {
            let refract_ray = Ray::leaving_surface(gp.point, n, v);
            color = color + self.recurse(&refract_ray, level - 1, refract_weight, ws, rng) * k_t;
        }

        color
    }

    fn recurse<R: Rng + ?Sized>(&self, r: &Ray, level: u32, k: RGB, ws: &mut Workspace, rng: &mut R) -> RGB {
        match self.scene.geometries.closest_hit(r, T_MIN, T_MAX, ws) {
            None => self.scene.background,
            Some(gp) => self.calc_color(&gp, r, level, k, ws, rng),
        }
    }
}

/// Per-sample shadow-ray `(direction, tMax)` pairs (spec.md §4.4's `sample`
/// plus §4.5's transparency routine). Directional lights have no position
/// to sample, so they always produce a single fixed-direction ray at
/// `tMax = +inf`; point/spot lights defer to `Light::sample`, converting
/// each sampled point into a direction/distance pair.
fn shadow_targets<R: Rng + ?Sized>(
    light: &crate::light::Light,
    p: Point3,
    n_samples: u32,
    rng: &mut R,
) -> Vec<(Vector3, f32)> {
    use crate::light::Light;
    match light {
        Light::Ambient { .. } => Vec::new(),
        Light::Directional { direction, .. } => vec![(-direction.normalized(), T_MAX)],
        _ => light
            .sample(p, n_samples, rng)
            .into_iter()
            .map(|sample| {
                let delta = sample - p;
                (delta.normalized(), delta.length())
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::Camera;
    use crate::config::{AaMode, BvhStrategy, ThreadMode};
    use crate::light::Light;
    use crate::material::Material;
    use crate::shape::Sphere;
    use crate::vector::Vector3;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;
    use std::sync::Arc;

    fn camera() -> Camera {
        Camera::new(
            Point3::new(0_f32, 0_f32, 5_f32),
            Vector3::new(0_f32, 0_f32, -1_f32),
            Vector3::new(0_f32, 1_f32, 0_f32),
            1_f32,
            2_f32,
            2_f32,
            10,
            10,
            0_f32,
        )
        .unwrap()
    }

    fn config() -> RenderConfig {
        RenderConfig {
            aa_mode: AaMode::Off,
            bvh: BvhStrategy::Sah,
            threads: ThreadMode::Sequential,
            ..RenderConfig::default()
        }
    }

    #[test]
    fn primary_ray_miss_returns_background() {
        let scene = Scene {
            background: RGB::new(0.2_f32, 0.3_f32, 0.4_f32),
            ambient: Light::Ambient {
                intensity: RGB::black(),
            },
            lights: Vec::new(),
            geometries: crate::aggregate::Geometries::build(Vec::new(), BvhStrategy::Sah, 2),
            camera: camera(),
        };
        let config = config();
        let tracer = Tracer::new(&scene, &config);
        let mut ws = tracer.new_workspace();
        let mut rng = SmallRng::seed_from_u64(1);
        let r = Ray::new(Point3::new(0_f32, 0_f32, 5_f32), Vector3::new(0_f32, 0_f32, -1_f32));
        let c = tracer.trace_ray(&r, &mut ws, &mut rng);
        assert_eq!((c.r(), c.g(), c.b()), (0.2_f32, 0.3_f32, 0.4_f32));
    }

    #[test]
    fn opaque_sphere_casts_hard_shadow() {
        // Seed scenario 5 (spec.md §8): opaque sphere between a point
        // light and a surface point receives zero contribution from it.
        let mut material = Material::black();
        material.k_diffuse = RGB::white();
        let floor = Arc::new(
            crate::shape::Plane::new(Point3::new(0_f32, -1_f32, 0_f32), Vector3::new(0_f32, 1_f32, 0_f32))
                .unwrap()
                .with_material(material),
        ) as Arc<crate::shape::SyncGeometry>;
        let blocker = Arc::new(Sphere::new(Point3::origin(), 1_f32, Material::black()).unwrap())
            as Arc<crate::shape::SyncGeometry>;

        let scene = Scene {
            background: RGB::black(),
            ambient: Light::Ambient {
                intensity: RGB::black(),
            },
            lights: vec![Light::Point {
                intensity: RGB::white(),
                position: Point3::new(0_f32, 0_f32, 5_f32),
                k_c: 1_f32,
                k_l: 0_f32,
                k_q: 0_f32,
                radius: 0_f32,
                sample_quality: 1,
            }],
            geometries: crate::aggregate::Geometries::build(vec![floor, blocker], BvhStrategy::Sah, 2),
            camera: camera(),
        };
        let config = config();
        let tracer = Tracer::new(&scene, &config);
        let mut ws = tracer.new_workspace();
        let mut rng = SmallRng::seed_from_u64(2);

        // Straight down onto the floor at (0, -1, -2), directly behind the
        // sphere as seen from the light at (0, 0, 5).
        let r = Ray::new(Point3::new(0_f32, 5_f32, -2_f32), Vector3::new(0_f32, -1_f32, 0_f32));
        let c = tracer.trace_ray(&r, &mut ws, &mut rng);
        assert_eq!((c.r(), c.g(), c.b()), (0_f32, 0_f32, 0_f32));
    }

    #[test]
    fn bounded_recursion_terminates_between_parallel_mirrors() {
        // Seed scenario 6: two facing mirrors with kR=1 must not overflow
        // the stack and must return a finite color within maxDepth.
        let mut mirror = Material::black();
        mirror.k_reflectance = RGB::white();
        let left = Arc::new(
            crate::shape::Plane::new(Point3::new(-1_f32, 0_f32, 0_f32), Vector3::new(1_f32, 0_f32, 0_f32))
                .unwrap()
                .with_material(mirror),
        ) as Arc<crate::shape::SyncGeometry>;
        let right = Arc::new(
            crate::shape::Plane::new(Point3::new(1_f32, 0_f32, 0_f32), Vector3::new(-1_f32, 0_f32, 0_f32))
                .unwrap()
                .with_material(mirror),
        ) as Arc<crate::shape::SyncGeometry>;

        let scene = Scene {
            background: RGB::black(),
            ambient: Light::Ambient {
                intensity: RGB::black(),
            },
            lights: Vec::new(),
            geometries: crate::aggregate::Geometries::build(vec![left, right], BvhStrategy::Sah, 2),
            camera: camera(),
        };
        let config = RenderConfig {
            max_depth: 5,
            ..config()
        };
        let tracer = Tracer::new(&scene, &config);
        let mut ws = tracer.new_workspace();
        let mut rng = SmallRng::seed_from_u64(3);

        let r = Ray::new(Point3::new(0_f32, 0_f32, 0_f32), Vector3::new(1_f32, 0_f32, 0_f32));
        let c = tracer.trace_ray(&r, &mut ws, &mut rng);
        assert!(c.r().is_finite() && c.g().is_finite() && c.b().is_finite());
    }
}
