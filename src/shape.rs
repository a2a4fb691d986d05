use crate::aabb::AABB;
use crate::error::RtError;
use crate::material::Material;
use crate::point::Point3;
use crate::quaternion::Quaternion;
use crate::ray::Ray;
use crate::utils::align_zero;
use crate::vector::Vector3;

use std::f32;
use std::sync::Arc;

/// `(geometry, point)` pair returned by intersection (spec.md §3). Holds a
/// cheap `Arc` clone rather than a borrow, matching the teacher's
/// `Arc<dyn Shape>`-based ownership and letting `GeoPoint` outlive a single
/// BVH traversal call without a lifetime parameter.
pub struct GeoPoint {
    pub geometry: Arc<SyncGeometry>,
    pub point: Point3,
}

/// Contract exposed by every primitive (spec.md §4.2). `translate`/
/// `rotate`/`scale` return `Self`, which isn't object-safe, so they live on
/// the concrete types directly rather than on this trait; the BVH/aggregate
/// code only ever needs this object-safe subset through `Arc<SyncGeometry>`.
pub trait Geometry {
    /// Caller guarantees `p` lies on the surface. Triangle/polygon may
    /// return either face normal depending on which side the ray approached
    /// from; sphere/ellipsoid/tube/cylinder always return the outward normal.
    fn normal(&self, p: Point3) -> Vector3;

    /// Returns every intersection with `0 < t < t_max`, or `None` (not an
    /// empty list) when there is no hit.
    fn intersect(&self, r: &Ray, t_max: f32) -> Option<Vec<Point3>>;

    /// `None` for unbounded geometry (infinite planes); signals "exclude
    /// from the BVH, test linearly instead" (spec.md §4.2/§4.3).
    fn aabb(&self) -> Option<AABB>;

    fn material(&self) -> &Material;
}

pub type SyncGeometry = dyn Geometry + Send + Sync;

fn geo_point(geometry: &Arc<SyncGeometry>, point: Point3) -> GeoPoint {
    GeoPoint {
        geometry: Arc::clone(geometry),
        point,
    }
}

/// Intersects `geometry` and wraps the resulting points as `GeoPoint`s,
/// the bridge every concrete shape's BVH-facing impl uses.
pub fn intersect_arc(geometry: &Arc<SyncGeometry>, r: &Ray, t_max: f32) -> Option<Vec<GeoPoint>> {
    geometry
        .intersect(r, t_max)
        .map(|pts| pts.into_iter().map(|p| geo_point(geometry, p)).collect())
}

// ---------------------------------------------------------------------
// Sphere
// ---------------------------------------------------------------------

pub struct Sphere {
    pub center: Point3,
    pub radius: f32,
    pub material: Material,
}

impl Sphere {
    pub fn new(center: Point3, radius: f32, material: Material) -> Result<Sphere, RtError> {
        if radius <= 0_f32 {
            return Err(RtError::InvalidGeometry(
                "sphere radius must be positive".into(),
            ));
        }
        Ok(Sphere {
            center,
            radius,
            material,
        })
    }

    pub fn translate(&self, delta: Vector3) -> Sphere {
        Sphere {
            center: self.center + delta,
            radius: self.radius,
            material: self.material,
        }
    }

    pub fn rotate(&self, _axis: Vector3, _angle: f32) -> Sphere {
        // A sphere is rotationally symmetric about its own center; nothing
        // in its intersection math depends on orientation.
        Sphere {
            center: self.center,
            radius: self.radius,
            material: self.material,
        }
    }

    pub fn scale(&self, factor: Vector3) -> Result<Sphere, RtError> {
        if align_zero(factor.x() - factor.y()) != 0_f32 || align_zero(factor.y() - factor.z()) != 0_f32 {
            return Err(RtError::InvalidGeometry(
                "non-uniform scaling of a sphere is unsupported; use an ellipsoid".into(),
            ));
        }
        Ok(Sphere {
            center: self.center,
            radius: self.radius * factor.x(),
            material: self.material,
        })
    }
}

impl Geometry for Sphere {
    fn normal(&self, p: Point3) -> Vector3 {
        (p - self.center).normalized()
    }

    fn intersect(&self, r: &Ray, t_max: f32) -> Option<Vec<Point3>> {
        let towards_origin = r.origin - self.center;
        let a = r.dir.dot(r.dir);
        let b = 2_f32 * towards_origin.dot(r.dir);
        let c = towards_origin.dot(towards_origin) - self.radius * self.radius;
        let discriminant = b * b - 4_f32 * a * c;
        if discriminant <= 0_f32 {
            return None;
        }

        let sqrt_d = discriminant.sqrt();
        let t0 = (-b - sqrt_d) / (2_f32 * a);
        let t1 = (-b + sqrt_d) / (2_f32 * a);
        let (t_near, t_far) = if t0 <= t1 { (t0, t1) } else { (t1, t0) };

        let mut hits = Vec::with_capacity(2);
        if t_near > 0_f32 && t_near < t_max {
            hits.push(r.point_at(t_near));
        }
        if t_far > 0_f32 && t_far < t_max {
            hits.push(r.point_at(t_far));
        }
        if hits.is_empty() { None } else { Some(hits) }
    }

    fn aabb(&self) -> Option<AABB> {
        let r = Vector3::new(self.radius, self.radius, self.radius);
        Some(AABB::new(self.center - r, self.center + r))
    }

    fn material(&self) -> &Material {
        &self.material
    }
}

// ---------------------------------------------------------------------
// Plane
// ---------------------------------------------------------------------

pub struct Plane {
    pub point: Point3,
    pub normal: Vector3,
    pub material: Material,
}

impl Plane {
    pub fn new(point: Point3, normal: Vector3) -> Result<Plane, RtError> {
        let normal = normal
            .normalize()
            .ok_or_else(|| RtError::InvalidGeometry("plane normal must be non-zero".into()))?;
        Ok(Plane {
            point,
            normal,
            material: Material::black(),
        })
    }

    pub fn with_material(mut self, material: Material) -> Plane {
        self.material = material;
        self
    }

    pub fn translate(&self, delta: Vector3) -> Plane {
        Plane {
            point: self.point + delta,
            normal: self.normal,
            material: self.material,
        }
    }

    pub fn rotate(&self, axis: Vector3, angle: f32) -> Plane {
        let q = Quaternion::from_axis_angle(axis, angle);
        Plane {
            point: self.point,
            normal: q.rotate(self.normal),
            material: self.material,
        }
    }

    pub fn scale(&self, _factor: Vector3) -> Plane {
        // An infinite plane's shape is unaffected by scale; only its point
        // of reference would move, and planes have no natural origin.
        Plane {
            point: self.point,
            normal: self.normal,
            material: self.material,
        }
    }
}

impl Geometry for Plane {
    fn normal(&self, _p: Point3) -> Vector3 {
        self.normal
    }

    fn intersect(&self, r: &Ray, t_max: f32) -> Option<Vec<Point3>> {
        let denom = self.normal.dot(r.dir);
        if align_zero(denom) == 0_f32 {
            return None;
        }
        let t = self.normal.dot(self.point - r.origin) / denom;
        if t > 0_f32 && t < t_max {
            Some(vec![r.point_at(t)])
        } else {
            None
        }
    }

    fn aabb(&self) -> Option<AABB> {
        // Infinite extent: excluded from the BVH, tested linearly.
        None
    }

    fn material(&self) -> &Material {
        &self.material
    }
}

// ---------------------------------------------------------------------
// Triangle
// ---------------------------------------------------------------------

pub struct Triangle {
    pub v0: Point3,
    pub v1: Point3,
    pub v2: Point3,
    edge1: Vector3,
    edge2: Vector3,
    material: Material,
}

impl Triangle {
    pub fn new(v0: Point3, v1: Point3, v2: Point3, material: Material) -> Result<Triangle, RtError> {
        let edge1 = v1 - v0;
        let edge2 = v2 - v0;
        if align_zero(edge1.cross(edge2).length_squared()) == 0_f32 {
            return Err(RtError::InvalidGeometry(
                "triangle vertices are collinear or coincident".into(),
            ));
        }
        Ok(Triangle {
            v0,
            v1,
            v2,
            edge1,
            edge2,
            material,
        })
    }

    pub fn translate(&self, delta: Vector3) -> Triangle {
        Triangle {
            v0: self.v0 + delta,
            v1: self.v1 + delta,
            v2: self.v2 + delta,
            edge1: self.edge1,
            edge2: self.edge2,
            material: self.material,
        }
    }

    pub fn rotate(&self, axis: Vector3, angle: f32) -> Triangle {
        let q = Quaternion::from_axis_angle(axis, angle);
        let v0 = self.v0;
        let v1 = v0 + q.rotate(self.v1 - v0);
        let v2 = v0 + q.rotate(self.v2 - v0);
        Triangle::new(v0, v1, v2, self.material).expect("rotation preserves non-degeneracy")
    }

    /// A collapsing factor (e.g. zero on one axis) can flatten the triangle
    /// into a line, so this propagates `Triangle::new`'s degeneracy check
    /// rather than assuming scale always preserves non-degeneracy.
    pub fn scale(&self, factor: Vector3) -> Result<Triangle, RtError> {
        let scale_about = |p: Point3, origin: Point3| -> Point3 {
            origin + Vector3::new(
                (p.x() - origin.x()) * factor.x(),
                (p.y() - origin.y()) * factor.y(),
                (p.z() - origin.z()) * factor.z(),
            )
        };
        let v0 = self.v0;
        let v1 = scale_about(self.v1, v0);
        let v2 = scale_about(self.v2, v0);
        Triangle::new(v0, v1, v2, self.material)
    }
}

impl Geometry for Triangle {
    fn normal(&self, _p: Point3) -> Vector3 {
        self.edge1.cross(self.edge2).normalized()
    }

    // Moller-Trumbore, with the strict interior rule from spec.md §4.2:
    // edges/vertices (u == 0, v == 0, u + v == 1) are non-hits.
    fn intersect(&self, r: &Ray, t_max: f32) -> Option<Vec<Point3>> {
        let p_vec = r.dir.cross(self.edge2);
        let det = self.edge1.dot(p_vec);
        if align_zero(det) == 0_f32 {
            return None;
        }

        let inv_det = 1_f32 / det;
        let t_vec = r.origin - self.v0;
        let u = t_vec.dot(p_vec) * inv_det;
        if align_zero(u) <= 0_f32 || u >= 1_f32 {
            return None;
        }

        let q_vec = t_vec.cross(self.edge1);
        let v = r.dir.dot(q_vec) * inv_det;
        if align_zero(v) <= 0_f32 || align_zero(u + v - 1_f32) >= 0_f32 {
            return None;
        }

        let t = self.edge2.dot(q_vec) * inv_det;
        if t > 0_f32 && t < t_max {
            Some(vec![r.point_at(t)])
        } else {
            None
        }
    }

    fn aabb(&self) -> Option<AABB> {
        Some(AABB::new(
            Point3::min(self.v0, Point3::min(self.v1, self.v2)),
            Point3::max(self.v0, Point3::max(self.v1, self.v2)),
        ))
    }

    fn material(&self) -> &Material {
        &self.material
    }
}

// ---------------------------------------------------------------------
// Polygon (convex, >= 3 vertices, coplanar)
// ---------------------------------------------------------------------

pub struct Polygon {
    pub vertices: Vec<Point3>,
    plane_point: Point3,
    plane_normal: Vector3,
    material: Material,
}

impl Polygon {
    pub fn new(vertices: Vec<Point3>, material: Material) -> Result<Polygon, RtError> {
        if vertices.len() < 3 {
            return Err(RtError::InvalidGeometry(
                "polygon needs at least 3 vertices".into(),
            ));
        }
        let plane_point = vertices[0];
        let plane_normal = (vertices[1] - vertices[0])
            .cross(vertices[2] - vertices[0])
            .normalize()
            .ok_or_else(|| RtError::InvalidGeometry("polygon vertices are degenerate".into()))?;

        if !is_convex(&vertices, plane_normal) {
            return Err(RtError::InvalidGeometry(
                "polygon is not convex".into(),
            ));
        }

        Ok(Polygon {
            vertices,
            plane_point,
            plane_normal,
            material,
        })
    }

    pub fn translate(&self, delta: Vector3) -> Polygon {
        let vertices = self.vertices.iter().map(|v| *v + delta).collect();
        Polygon::new(vertices, self.material).expect("translation preserves convexity")
    }

    pub fn rotate(&self, axis: Vector3, angle: f32) -> Polygon {
        let q = Quaternion::from_axis_angle(axis, angle);
        let origin = self.vertices[0];
        let vertices = self
            .vertices
            .iter()
            .map(|v| origin + q.rotate(*v - origin))
            .collect();
        Polygon::new(vertices, self.material).expect("rotation preserves convexity")
    }

    /// A non-uniform factor can turn a convex polygon non-convex (or
    /// collapse it flat), so this propagates `Polygon::new`'s convexity
    /// check rather than assuming scale always preserves it.
    pub fn scale(&self, factor: Vector3) -> Result<Polygon, RtError> {
        let origin = self.vertices[0];
        let vertices = self
            .vertices
            .iter()
            .map(|v| {
                origin
                    + Vector3::new(
                        (v.x() - origin.x()) * factor.x(),
                        (v.y() - origin.y()) * factor.y(),
                        (v.z() - origin.z()) * factor.z(),
                    )
            })
            .collect();
        Polygon::new(vertices, self.material)
    }
}

fn is_convex(vertices: &[Point3], normal: Vector3) -> bool {
    let n = vertices.len();
    let mut sign = 0_f32;
    for i in 0..n {
        let a = vertices[i];
        let b = vertices[(i + 1) % n];
        let c = vertices[(i + 2) % n];
        let cross = (b - a).cross(c - b).dot(normal);
        let cross = align_zero(cross);
        if cross == 0_f32 {
            continue;
        }
        if sign == 0_f32 {
            sign = cross.signum();
        } else if cross.signum() != sign {
            return false;
        }
    }
    true
}

impl Geometry for Polygon {
    fn normal(&self, _p: Point3) -> Vector3 {
        self.plane_normal
    }

    fn intersect(&self, r: &Ray, t_max: f32) -> Option<Vec<Point3>> {
        let denom = self.plane_normal.dot(r.dir);
        if align_zero(denom) == 0_f32 {
            return None;
        }
        let t = self.plane_normal.dot(self.plane_point - r.origin) / denom;
        if t <= 0_f32 || t >= t_max {
            return None;
        }
        let p = r.point_at(t);

        let n = self.vertices.len();
        for i in 0..n {
            let a = self.vertices[i];
            let b = self.vertices[(i + 1) % n];
            let edge_cross = (b - a).cross(p - a).dot(self.plane_normal);
            if align_zero(edge_cross) < 0_f32 {
                return None;
            }
        }
        Some(vec![p])
    }

    fn aabb(&self) -> Option<AABB> {
        let mut bb = AABB::new(self.vertices[0], self.vertices[0]);
        for v in &self.vertices[1..] {
            bb = AABB::union_point(&bb, v);
        }
        Some(bb)
    }

    fn material(&self) -> &Material {
        &self.material
    }
}

// ---------------------------------------------------------------------
// Tube (infinite cylinder) and Cylinder (finite, with end caps)
// ---------------------------------------------------------------------

pub struct Tube {
    pub axis_origin: Point3,
    pub axis_dir: Vector3,
    pub radius: f32,
    material: Material,
}

impl Tube {
    pub fn new(axis_origin: Point3, axis_dir: Vector3, radius: f32, material: Material) -> Result<Tube, RtError> {
        if radius <= 0_f32 {
            return Err(RtError::InvalidGeometry("tube radius must be positive".into()));
        }
        let axis_dir = axis_dir
            .normalize()
            .ok_or_else(|| RtError::InvalidGeometry("tube axis must be non-zero".into()))?;
        Ok(Tube {
            axis_origin,
            axis_dir,
            radius,
            material,
        })
    }

    /// Quadratic coefficients for the radial distance of `r(t)` from the
    /// axis, shared by `Tube` and `Cylinder`'s lateral surface.
    fn quadratic(&self, r: &Ray) -> (f32, f32, f32) {
        let delta = r.origin - self.axis_origin;
        let d_perp = r.dir - self.axis_dir * r.dir.dot(self.axis_dir);
        let delta_perp = delta - self.axis_dir * delta.dot(self.axis_dir);

        let a = d_perp.dot(d_perp);
        let b = 2_f32 * d_perp.dot(delta_perp);
        let c = delta_perp.dot(delta_perp) - self.radius * self.radius;
        (a, b, c)
    }

    pub fn translate(&self, delta: Vector3) -> Tube {
        Tube {
            axis_origin: self.axis_origin + delta,
            axis_dir: self.axis_dir,
            radius: self.radius,
            material: self.material,
        }
    }

    pub fn rotate(&self, axis: Vector3, angle: f32) -> Tube {
        let q = Quaternion::from_axis_angle(axis, angle);
        Tube {
            axis_origin: self.axis_origin,
            axis_dir: q.rotate(self.axis_dir),
            radius: self.radius,
            material: self.material,
        }
    }

    pub fn scale(&self, factor: Vector3) -> Result<Tube, RtError> {
        if align_zero(factor.x() - factor.y()) != 0_f32 || align_zero(factor.y() - factor.z()) != 0_f32 {
            return Err(RtError::InvalidGeometry(
                "non-uniform scaling of a tube/cylinder is unsupported".into(),
            ));
        }
        Ok(Tube {
            axis_origin: self.axis_origin,
            axis_dir: self.axis_dir,
            radius: self.radius * factor.x(),
            material: self.material,
        })
    }
}

impl Geometry for Tube {
    fn normal(&self, p: Point3) -> Vector3 {
        let delta = p - self.axis_origin;
        let along = self.axis_dir * delta.dot(self.axis_dir);
        (delta - along).normalized()
    }

    fn intersect(&self, r: &Ray, t_max: f32) -> Option<Vec<Point3>> {
        let (a, b, c) = self.quadratic(r);
        if align_zero(a) == 0_f32 {
            return None;
        }
        let discriminant = b * b - 4_f32 * a * c;
        if discriminant <= 0_f32 {
            return None;
        }
        let sqrt_d = discriminant.sqrt();
        let t0 = (-b - sqrt_d) / (2_f32 * a);
        let t1 = (-b + sqrt_d) / (2_f32 * a);
        let (t_near, t_far) = if t0 <= t1 { (t0, t1) } else { (t1, t0) };

        let mut hits = Vec::with_capacity(2);
        if t_near > 0_f32 && t_near < t_max {
            hits.push(r.point_at(t_near));
        }
        if t_far > 0_f32 && t_far < t_max {
            hits.push(r.point_at(t_far));
        }
        if hits.is_empty() { None } else { Some(hits) }
    }

    fn aabb(&self) -> Option<AABB> {
        // Infinite extent along its axis: excluded from the BVH.
        None
    }

    fn material(&self) -> &Material {
        &self.material
    }
}

pub struct Cylinder {
    tube: Tube,
    pub height: f32,
}

impl Cylinder {
    pub fn new(
        axis_origin: Point3,
        axis_dir: Vector3,
        radius: f32,
        height: f32,
        material: Material,
    ) -> Result<Cylinder, RtError> {
        if height <= 0_f32 {
            return Err(RtError::InvalidGeometry(
                "cylinder height must be positive".into(),
            ));
        }
        Ok(Cylinder {
            tube: Tube::new(axis_origin, axis_dir, radius, material)?,
            height,
        })
    }

    fn axial_coord(&self, p: Point3) -> f32 {
        (p - self.tube.axis_origin).dot(self.tube.axis_dir)
    }

    pub fn translate(&self, delta: Vector3) -> Cylinder {
        Cylinder {
            tube: self.tube.translate(delta),
            height: self.height,
        }
    }

    pub fn rotate(&self, axis: Vector3, angle: f32) -> Cylinder {
        Cylinder {
            tube: self.tube.rotate(axis, angle),
            height: self.height,
        }
    }

    pub fn scale(&self, factor: Vector3) -> Result<Cylinder, RtError> {
        Ok(Cylinder {
            tube: self.tube.scale(factor)?,
            height: self.height * factor.x(),
        })
    }
}

impl Geometry for Cylinder {
    fn normal(&self, p: Point3) -> Vector3 {
        let along = self.axial_coord(p);
        if align_zero(along) == 0_f32 {
            -self.tube.axis_dir
        } else if align_zero(along - self.height) == 0_f32 {
            self.tube.axis_dir
        } else {
            self.tube.normal(p)
        }
    }

    fn intersect(&self, r: &Ray, t_max: f32) -> Option<Vec<Point3>> {
        let mut hits = Vec::new();

        if let Some(lateral) = self.tube.intersect(r, t_max) {
            for p in lateral {
                let along = self.axial_coord(p);
                if along >= 0_f32 && along <= self.height {
                    hits.push(p);
                }
            }
        }

        // End caps: plane intersect at each end, clipped to the disk.
        for cap_t in [0_f32, self.height] {
            let cap_center = self.tube.axis_origin + self.tube.axis_dir * cap_t;
            let denom = self.tube.axis_dir.dot(r.dir);
            if align_zero(denom) == 0_f32 {
                continue;
            }
            let t = self.tube.axis_dir.dot(cap_center - r.origin) / denom;
            if t <= 0_f32 || t >= t_max {
                continue;
            }
            let p = r.point_at(t);
            if (p - cap_center).length_squared() <= self.tube.radius * self.tube.radius {
                hits.push(p);
            }
        }

        if hits.is_empty() { None } else { Some(hits) }
    }

    fn aabb(&self) -> Option<AABB> {
        // Conservative box: extend by radius on every axis around the
        // segment between the two cap centers.
        let p0 = self.tube.axis_origin;
        let p1 = self.tube.axis_origin + self.tube.axis_dir * self.height;
        let r = Vector3::new(self.tube.radius, self.tube.radius, self.tube.radius);
        Some(AABB::union(
            &AABB::new(p0 - r, p0 + r),
            &AABB::new(p1 - r, p1 + r),
        ))
    }

    fn material(&self) -> &Material {
        &self.tube.material
    }
}

// ---------------------------------------------------------------------
// Ellipsoid
// ---------------------------------------------------------------------

pub struct Ellipsoid {
    pub center: Point3,
    pub radii: Vector3,
    material: Material,
}

impl Ellipsoid {
    pub fn new(center: Point3, radii: Vector3, material: Material) -> Result<Ellipsoid, RtError> {
        if radii.x() <= 0_f32 || radii.y() <= 0_f32 || radii.z() <= 0_f32 {
            return Err(RtError::InvalidGeometry(
                "ellipsoid radii must be positive".into(),
            ));
        }
        Ok(Ellipsoid {
            center,
            radii,
            material,
        })
    }

    fn to_unit_space(&self, p: Point3) -> Point3 {
        let rel = p - self.center;
        self.center
            + Vector3::new(rel.x() / self.radii.x(), rel.y() / self.radii.y(), rel.z() / self.radii.z())
    }

    pub fn translate(&self, delta: Vector3) -> Ellipsoid {
        Ellipsoid {
            center: self.center + delta,
            radii: self.radii,
            material: self.material,
        }
    }

    /// Rotating a general ellipsoid would require storing an orientation
    /// frame; this tracer only supports axis-aligned ellipsoids, so a
    /// rotation about a principal axis by a multiple of a right angle is a
    /// no-op and anything else is rejected as unsupported geometry.
    pub fn rotate(&self, axis: Vector3, angle: f32) -> Result<Ellipsoid, RtError> {
        let is_world_axis = [
            Vector3::new(1_f32, 0_f32, 0_f32),
            Vector3::new(0_f32, 1_f32, 0_f32),
            Vector3::new(0_f32, 0_f32, 1_f32),
        ]
        .iter()
        .any(|world_axis| axis.is_parallel(*world_axis));

        let quarter_turns = angle / f32::consts::FRAC_PI_2;
        let is_right_angle = align_zero(quarter_turns - quarter_turns.round()) == 0_f32;

        if !is_world_axis || !is_right_angle {
            return Err(RtError::InvalidGeometry(
                "arbitrary ellipsoid rotation is unsupported; only right-angle rotations about a world axis are".into(),
            ));
        }
        Ok(Ellipsoid {
            center: self.center,
            radii: self.radii,
            material: self.material,
        })
    }

    pub fn scale(&self, factor: Vector3) -> Result<Ellipsoid, RtError> {
        if factor.x() <= 0_f32 || factor.y() <= 0_f32 || factor.z() <= 0_f32 {
            return Err(RtError::InvalidGeometry(
                "ellipsoid scale factors must be positive".into(),
            ));
        }
        Ok(Ellipsoid {
            center: self.center,
            radii: Vector3::new(
                self.radii.x() * factor.x(),
                self.radii.y() * factor.y(),
                self.radii.z() * factor.z(),
            ),
            material: self.material,
        })
    }
}

impl Geometry for Ellipsoid {
    fn normal(&self, p: Point3) -> Vector3 {
        let u = self.to_unit_space(p) - self.center;
        Vector3::new(u.x() / self.radii.x(), u.y() / self.radii.y(), u.z() / self.radii.z())
            .normalized()
    }

    fn intersect(&self, r: &Ray, t_max: f32) -> Option<Vec<Point3>> {
        // Transform to unit-sphere space via diag(1/radii), intersect,
        // transform back (spec.md §4.2).
        let local_origin = self.to_unit_space(r.origin);
        let local_dir = Vector3::new(
            r.dir.x() / self.radii.x(),
            r.dir.y() / self.radii.y(),
            r.dir.z() / self.radii.z(),
        );

        let towards_origin = local_origin - self.center;
        let a = local_dir.dot(local_dir);
        let b = 2_f32 * towards_origin.dot(local_dir);
        let c = towards_origin.dot(towards_origin) - 1_f32;
        let discriminant = b * b - 4_f32 * a * c;
        if discriminant <= 0_f32 {
            return None;
        }

        let sqrt_d = discriminant.sqrt();
        let t0 = (-b - sqrt_d) / (2_f32 * a);
        let t1 = (-b + sqrt_d) / (2_f32 * a);
        let (t_near, t_far) = if t0 <= t1 { (t0, t1) } else { (t1, t0) };

        // t is the same parameter in both spaces since local_dir is just a
        // linear rescale of r.dir with no shift in t.
        let mut hits = Vec::with_capacity(2);
        if t_near > 0_f32 && t_near < t_max {
            hits.push(r.point_at(t_near));
        }
        if t_far > 0_f32 && t_far < t_max {
            hits.push(r.point_at(t_far));
        }
        if hits.is_empty() { None } else { Some(hits) }
    }

    fn aabb(&self) -> Option<AABB> {
        Some(AABB::new(self.center - self.radii, self.center + self.radii))
    }

    fn material(&self) -> &Material {
        &self.material
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mat() -> Material {
        Material::black()
    }

    #[test]
    fn sphere_ray_through_center_hits_twice() {
        let s = Sphere::new(Point3::new(1_f32, 0_f32, 0_f32), 1_f32, mat()).unwrap();
        let r = Ray::new(Point3::new(-1_f32, 0_f32, 0_f32), Vector3::new(1_f32, 0_f32, 0_f32));
        let hits = s.intersect(&r, f32::MAX).unwrap();
        assert_eq!(hits.len(), 2);
        assert!((hits[0].x() - 0_f32).abs() < 1e-4);
        assert!((hits[1].x() - 2_f32).abs() < 1e-4);
    }

    #[test]
    fn sphere_tangent_ray_misses() {
        let s = Sphere::new(Point3::origin(), 1_f32, mat()).unwrap();
        let r = Ray::new(Point3::new(-1_f32, 0_f32, 1_f32), Vector3::new(1_f32, 0_f32, 0_f32));
        assert!(s.intersect(&r, f32::MAX).is_none());
    }

    #[test]
    fn triangle_edge_ray_is_a_miss() {
        let t = Triangle::new(
            Point3::new(1_f32, 1_f32, 0_f32),
            Point3::new(2_f32, 1_f32, 0_f32),
            Point3::new(1_f32, 2_f32, 0_f32),
            mat(),
        )
        .unwrap();
        let r = Ray::new(Point3::new(1.5_f32, 1.5_f32, 1_f32), Vector3::new(0_f32, 0_f32, -1_f32));
        assert!(t.intersect(&r, f32::MAX).is_none());
    }

    #[test]
    fn triangle_interior_ray_hits() {
        let t = Triangle::new(
            Point3::new(0_f32, 0_f32, 0_f32),
            Point3::new(2_f32, 0_f32, 0_f32),
            Point3::new(0_f32, 2_f32, 0_f32),
            mat(),
        )
        .unwrap();
        let r = Ray::new(Point3::new(0.5_f32, 0.5_f32, 1_f32), Vector3::new(0_f32, 0_f32, -1_f32));
        assert!(t.intersect(&r, f32::MAX).is_some());
    }

    #[test]
    fn sphere_rejects_non_positive_radius() {
        assert!(Sphere::new(Point3::origin(), 0_f32, mat()).is_err());
        assert!(Sphere::new(Point3::origin(), -1_f32, mat()).is_err());
    }

    #[test]
    fn sphere_rejects_non_uniform_scale() {
        let s = Sphere::new(Point3::origin(), 1_f32, mat()).unwrap();
        assert!(s.scale(Vector3::new(2_f32, 1_f32, 1_f32)).is_err());
        assert!(s.scale(Vector3::new(2_f32, 2_f32, 2_f32)).is_ok());
    }

    #[test]
    fn cylinder_caps_and_lateral_hit() {
        let c = Cylinder::new(
            Point3::origin(),
            Vector3::new(0_f32, 1_f32, 0_f32),
            1_f32,
            2_f32,
            mat(),
        )
        .unwrap();
        let straight_down = Ray::new(Point3::new(0_f32, 5_f32, 0_f32), Vector3::new(0_f32, -1_f32, 0_f32));
        let hits = c.intersect(&straight_down, f32::MAX).unwrap();
        assert!(!hits.is_empty());

        let side = Ray::new(Point3::new(5_f32, 1_f32, 0_f32), Vector3::new(-1_f32, 0_f32, 0_f32));
        let hits = c.intersect(&side, f32::MAX).unwrap();
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn ellipsoid_normal_is_unit_length() {
        let e = Ellipsoid::new(Point3::origin(), Vector3::new(2_f32, 1_f32, 1_f32), mat()).unwrap();
        let n = e.normal(Point3::new(2_f32, 0_f32, 0_f32));
        assert!((n.length() - 1_f32).abs() < 1e-4);
    }

    #[test]
    fn polygon_rejects_fewer_than_three_vertices() {
        let v = vec![Point3::origin(), Point3::new(1_f32, 0_f32, 0_f32)];
        assert!(Polygon::new(v, mat()).is_err());
    }

    #[test]
    fn convex_quad_inside_point_hits() {
        let v = vec![
            Point3::new(-1_f32, -1_f32, 0_f32),
            Point3::new(1_f32, -1_f32, 0_f32),
            Point3::new(1_f32, 1_f32, 0_f32),
            Point3::new(-1_f32, 1_f32, 0_f32),
        ];
        let poly = Polygon::new(v, mat()).unwrap();
        let r = Ray::new(Point3::new(0_f32, 0_f32, 5_f32), Vector3::new(0_f32, 0_f32, -1_f32));
        assert!(poly.intersect(&r, f32::MAX).is_some());
    }
}
