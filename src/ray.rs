use crate::point::Point3;
use crate::utils::RAY_NUDGE;
use crate::vector::Vector3;

/// `origin + t * dir`. `dir` is expected to be unit length — callers that
/// build a `Ray` from an un-normalized direction should normalize first,
/// the way `Camera::primary_ray` and the tracer's reflect/refract rays do.
pub struct Ray {
    pub origin: Point3,
    pub dir: Vector3,
}

impl Ray {
    pub fn new(origin: Point3, dir: Vector3) -> Ray {
        Ray { origin, dir }
    }

    /// Builds a ray leaving a surface point `p` with normal `n`, nudging the
    /// origin by `±epsilon * n` so the ray doesn't immediately
    /// re-intersect the surface it just left (spec.md §3's self-intersection
    /// "acne" note). The sign is chosen so the nudge moves in the same
    /// half-space as `dir`.
    pub fn leaving_surface(p: Point3, n: Vector3, dir: Vector3) -> Ray {
        let sign = if n.dot(dir) >= 0_f32 { 1_f32 } else { -1_f32 };
        Ray {
            origin: p + n * (sign * RAY_NUDGE),
            dir,
        }
    }

    pub fn point_at(&self, t: f32) -> Point3 {
        self.origin + (self.dir * t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_at_follows_direction() {
        let r = Ray::new(Point3::origin(), Vector3::new(1_f32, 0_f32, 0_f32));
        let p = r.point_at(3_f32);
        assert_eq!((p.x(), p.y(), p.z()), (3_f32, 0_f32, 0_f32));
    }

    #[test]
    fn leaving_surface_nudges_away_from_incoming_side() {
        let p = Point3::new(0_f32, 0_f32, 0_f32);
        let n = Vector3::new(0_f32, 1_f32, 0_f32);
        let dir = Vector3::new(0_f32, 1_f32, 0_f32);
        let r = Ray::leaving_surface(p, n, dir);
        assert!(r.origin.y() > 0_f32);

        let dir_into = Vector3::new(0_f32, -1_f32, 0_f32);
        let r2 = Ray::leaving_surface(p, n, dir_into);
        assert!(r2.origin.y() < 0_f32);
    }
}
