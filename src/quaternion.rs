use crate::vector::Vector3;

/// Unit quaternion used to rotate a `Vector3` about an arbitrary axis
/// (spec.md §4.1). Used directly by `rotate` rather than building a general
/// 4x4 transform, since every shape's `rotate` only ever needs to turn a
/// single axis/angle pair into a rotated vector or point.
#[derive(Copy, Clone, Debug)]
pub struct Quaternion {
    pub w: f32,
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Quaternion {
    /// `axis` is normalized internally; `angle` is in radians.
    pub fn from_axis_angle(axis: Vector3, angle: f32) -> Quaternion {
        let axis = axis.normalized();
        let half = angle * 0.5_f32;
        let s = half.sin();
        Quaternion {
            w: half.cos(),
            x: axis.x() * s,
            y: axis.y() * s,
            z: axis.z() * s,
        }
    }

    pub fn conjugate(self) -> Quaternion {
        Quaternion {
            w: self.w,
            x: -self.x,
            y: -self.y,
            z: -self.z,
        }
    }

    pub fn length_squared(self) -> f32 {
        self.w * self.w + self.x * self.x + self.y * self.y + self.z * self.z
    }

    pub fn normalize(self) -> Quaternion {
        let len = self.length_squared().sqrt();
        Quaternion {
            w: self.w / len,
            x: self.x / len,
            y: self.y / len,
            z: self.z / len,
        }
    }

    /// Hamilton product `self * rhs`. Composition is associative but not
    /// commutative, matching rotation composition in general.
    pub fn mul(self, rhs: Quaternion) -> Quaternion {
        Quaternion {
            w: self.w * rhs.w - self.x * rhs.x - self.y * rhs.y - self.z * rhs.z,
            x: self.w * rhs.x + self.x * rhs.w + self.y * rhs.z - self.z * rhs.y,
            y: self.w * rhs.y - self.x * rhs.z + self.y * rhs.w + self.z * rhs.x,
            z: self.w * rhs.z + self.x * rhs.y - self.y * rhs.x + self.z * rhs.w,
        }
    }

    /// Rotates `v` by this quaternion: `q * v * q_conjugate`, treating `v`
    /// as a pure quaternion. Preserves length to within floating point error.
    pub fn rotate(self, v: Vector3) -> Vector3 {
        let p = Quaternion {
            w: 0_f32,
            x: v.x(),
            y: v.y(),
            z: v.z(),
        };
        let r = self.mul(p).mul(self.conjugate());
        Vector3::new(r.x, r.y, r.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotate_preserves_length() {
        let q = Quaternion::from_axis_angle(Vector3::new(0_f32, 1_f32, 0_f32), 1.234_f32);
        let v = Vector3::new(1_f32, 2_f32, 3_f32);
        let r = q.rotate(v);
        assert!((r.length() - v.length()).abs() < 1e-4);
    }

    #[test]
    fn quarter_turn_about_z_maps_x_to_y() {
        let q = Quaternion::from_axis_angle(
            Vector3::new(0_f32, 0_f32, 1_f32),
            std::f32::consts::FRAC_PI_2,
        );
        let r = q.rotate(Vector3::new(1_f32, 0_f32, 0_f32));
        assert!((r.x()).abs() < 1e-4);
        assert!((r.y() - 1_f32).abs() < 1e-4);
    }

    #[test]
    fn composition_is_associative() {
        let qa = Quaternion::from_axis_angle(Vector3::new(1_f32, 0_f32, 0_f32), 0.4_f32);
        let qb = Quaternion::from_axis_angle(Vector3::new(0_f32, 1_f32, 0_f32), 0.7_f32);
        let qc = Quaternion::from_axis_angle(Vector3::new(0_f32, 0_f32, 1_f32), 1.1_f32);
        let v = Vector3::new(0.3_f32, -0.8_f32, 1.5_f32);

        let left = qa.mul(qb).mul(qc).rotate(v);
        let right = qa.mul(qb.mul(qc)).rotate(v);
        assert!((left - right).length() < 1e-3);
    }
}
