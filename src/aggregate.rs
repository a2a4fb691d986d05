use crate::bvh::{Bvh, Workspace as BvhWorkspace};
use crate::config::BvhStrategy;
use crate::ray::Ray;
use crate::shape::{intersect_arc, GeoPoint, SyncGeometry};

use std::sync::Arc;

/// Scratch state for one `Geometries` query, reused across the rays a
/// single worker traces (spec.md §4.3's "no heap allocation per ray").
/// Wraps the BVH's own workspace; the unbounded list needs no scratch
/// state since it is scanned linearly every time.
pub struct Workspace {
    bvh: BvhWorkspace,
}

/// The scene's aggregate intersectable (spec.md §3): a BVH built from every
/// geometry with a finite `aabb()`, plus a flat list of the rest (infinite
/// planes, tubes) tested linearly on every ray. Both are consulted by
/// every query; callers never see the split.
pub struct Geometries {
    bvh: Bvh,
    unbounded: Vec<Arc<SyncGeometry>>,
}

impl Geometries {
    pub fn build(shapes: Vec<Arc<SyncGeometry>>, strategy: BvhStrategy, leaf_size: usize) -> Geometries {
        let mut bounded = Vec::new();
        let mut unbounded = Vec::new();
        for shape in shapes {
            if shape.aabb().is_some() {
                bounded.push(shape);
            } else {
                unbounded.push(shape);
            }
        }
        Geometries {
            bvh: Bvh::build(bounded, strategy, leaf_size),
            unbounded,
        }
    }

    pub fn get_workspace(&self) -> Workspace {
        Workspace {
            bvh: self.bvh.get_workspace(),
        }
    }

    /// Closest intersection within `(t_min, t_max)` across both the BVH and
    /// the unbounded list, or `None`.
    pub fn closest_hit(&self, r: &Ray, t_min: f32, t_max: f32, ws: &mut Workspace) -> Option<GeoPoint> {
        let mut closest = self.bvh.closest_hit(r, t_min, t_max, &mut ws.bvh);
        let mut modified_t_max = closest
            .as_ref()
            .map(|gp| (gp.point - r.origin).length())
            .unwrap_or(t_max);

        for shape in &self.unbounded {
            if let Some(hits) = intersect_arc(shape, r, modified_t_max) {
                for gp in hits {
                    let t = (gp.point - r.origin).length();
                    if t > t_min && t < modified_t_max {
                        modified_t_max = t;
                        closest = Some(gp);
                    }
                }
            }
        }

        closest
    }

    /// Every intersection within `(t_min, t_max)`, for shadow/transparency
    /// queries that need the full set of blockers.
    pub fn all_hits(&self, r: &Ray, t_min: f32, t_max: f32, ws: &mut Workspace) -> Vec<GeoPoint> {
        let mut out = self.bvh.all_hits(r, t_min, t_max, &mut ws.bvh);
        for shape in &self.unbounded {
            if let Some(hits) = intersect_arc(shape, r, t_max) {
                out.extend(hits.into_iter().filter(|gp| {
                    let t = (gp.point - r.origin).length();
                    t > t_min && t < t_max
                }));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::Material;
    use crate::point::Point3;
    use crate::shape::{Plane, Sphere};
    use crate::vector::Vector3;

    fn sphere_at(x: f32) -> Arc<SyncGeometry> {
        Arc::new(Sphere::new(Point3::new(x, 0_f32, 0_f32), 1_f32, Material::black()).unwrap())
    }

    #[test]
    fn bounded_and_unbounded_shapes_both_participate() {
        // A sphere (bounded, goes in the BVH) sitting in front of an
        // infinite plane (unbounded, linear list) along the same ray.
        let plane = Arc::new(
            Plane::new(Point3::new(0_f32, 0_f32, 10_f32), Vector3::new(0_f32, 0_f32, -1_f32)).unwrap(),
        ) as Arc<SyncGeometry>;
        let geometries = Geometries::build(vec![sphere_at(0_f32), plane], BvhStrategy::Sah, 2);
        let mut ws = geometries.get_workspace();
        let r = Ray::new(Point3::new(-5_f32, 0_f32, 0_f32), Vector3::new(1_f32, 0_f32, 0_f32));

        let closest = geometries.closest_hit(&r, 1e-3, f32::MAX, &mut ws).unwrap();
        assert!((closest.point.x() - (-1_f32)).abs() < 1e-3);

        let all = geometries.all_hits(&r, 1e-3, f32::MAX, &mut ws);
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn empty_geometries_has_no_hits() {
        let geometries = Geometries::build(Vec::new(), BvhStrategy::Sah, 2);
        let mut ws = geometries.get_workspace();
        let r = Ray::new(Point3::origin(), Vector3::new(1_f32, 0_f32, 0_f32));
        assert!(geometries.closest_hit(&r, 1e-3, f32::MAX, &mut ws).is_none());
        assert!(geometries.all_hits(&r, 1e-3, f32::MAX, &mut ws).is_empty());
    }
}
