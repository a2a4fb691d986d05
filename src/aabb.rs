use crate::point::Point3;
use crate::ray::Ray;
use crate::vector::Axis;

use std::mem;

/// Axis aligned bounding box, used both as a `Geometry::aabb()` result and
/// as the internal node bound in the BVH (spec.md §5, §4.4).
#[derive(Copy, Clone)]
pub struct AABB {
    pub min: Point3,
    pub max: Point3,
}

impl AABB {
    pub fn new(min: Point3, max: Point3) -> AABB {
        AABB { min, max }
    }

    /// Degenerate empty box: every `union` with a real box absorbs it,
    /// since `min > max` on every axis until the first union happens.
    pub fn empty() -> AABB {
        AABB {
            min: Point3::new(f32::MAX, f32::MAX, f32::MAX),
            max: Point3::new(f32::MIN, f32::MIN, f32::MIN),
        }
    }

    pub fn union(a: &AABB, b: &AABB) -> AABB {
        AABB {
            min: Point3::min(a.min, b.min),
            max: Point3::max(a.max, b.max),
        }
    }

    pub fn union_point(a: &AABB, point: &Point3) -> AABB {
        AABB {
            min: Point3::min(a.min, *point),
            max: Point3::max(a.max, *point),
        }
    }

    pub fn center(&self) -> Point3 {
        Point3::new(
            self.min.x() * 0.5_f32 + self.max.x() * 0.5_f32,
            self.min.y() * 0.5_f32 + self.max.y() * 0.5_f32,
            self.min.z() * 0.5_f32 + self.max.z() * 0.5_f32,
        )
    }

    pub fn largest_axis(&self) -> Axis {
        let diagonal = self.max - self.min;
        if diagonal.x() > diagonal.y() && diagonal.x() > diagonal.z() {
            Axis::X
        } else if diagonal.y() > diagonal.z() {
            Axis::Y
        } else {
            Axis::Z
        }
    }

    pub fn surface_area(&self) -> f32 {
        let diagonal = self.max - self.min;
        2_f32
            * (diagonal.x() * diagonal.y()
                + diagonal.x() * diagonal.z()
                + diagonal.y() * diagonal.z())
    }

    pub fn intersect(&self, r: &Ray, t_min: f32, t_max: f32) -> bool {
        let (t_min, t_max) = match self.intersect_helper(r, t_min, t_max, Axis::X) {
            Some(v) => v,
            None => return false,
        };
        let (t_min, t_max) = match self.intersect_helper(r, t_min, t_max, Axis::Y) {
            Some(v) => v,
            None => return false,
        };
        self.intersect_helper(r, t_min, t_max, Axis::Z).is_some()
    }

    fn intersect_helper(&self, r: &Ray, t_min: f32, t_max: f32, axis: Axis) -> Option<(f32, f32)> {
        let inverse_direction = 1_f32 / r.dir[axis];
        let mut t0 = (self.min[axis] - r.origin[axis]) * inverse_direction;
        let mut t1 = (self.max[axis] - r.origin[axis]) * inverse_direction;
        if inverse_direction < 0_f32 {
            mem::swap(&mut t0, &mut t1);
        }

        let t_min = if t0 > t_min { t0 } else { t_min };
        let t_max = if t1 < t_max { t1 } else { t_max };
        if t_max <= t_min { None } else { Some((t_min, t_max)) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::Vector3;

    #[test]
    fn union_grows_to_contain_both() {
        let a = AABB::new(Point3::new(0_f32, 0_f32, 0_f32), Point3::new(1_f32, 1_f32, 1_f32));
        let b = AABB::new(Point3::new(-1_f32, 2_f32, 0_f32), Point3::new(0.5_f32, 3_f32, 0.5_f32));
        let u = AABB::union(&a, &b);
        assert_eq!((u.min.x(), u.min.y()), (-1_f32, 0_f32));
        assert_eq!((u.max.x(), u.max.y()), (1_f32, 3_f32));
    }

    #[test]
    fn ray_through_box_intersects() {
        let b = AABB::new(Point3::new(-1_f32, -1_f32, -1_f32), Point3::new(1_f32, 1_f32, 1_f32));
        let r = Ray::new(Point3::new(0_f32, 0_f32, -5_f32), Vector3::new(0_f32, 0_f32, 1_f32));
        assert!(b.intersect(&r, 1e-3, f32::MAX));
    }

    #[test]
    fn ray_missing_box_does_not_intersect() {
        let b = AABB::new(Point3::new(-1_f32, -1_f32, -1_f32), Point3::new(1_f32, 1_f32, 1_f32));
        let r = Ray::new(Point3::new(5_f32, 5_f32, -5_f32), Vector3::new(0_f32, 0_f32, 1_f32));
        assert!(!b.intersect(&r, 1e-3, f32::MAX));
    }
}
