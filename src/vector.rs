use crate::base::Tuple3;
use crate::utils::EPSILON;

use serde::Deserialize;
use std::convert;
use std::ops;

/// A direction in world space. Construction from raw components never
/// fails; `Vector3::normalize` is the fallible operation (spec.md §4.1),
/// since a zero vector has no defined direction.
#[derive(Deserialize)]
#[serde(try_from = "Vec<f32>")]
pub struct Vector3(pub Tuple3<f32>);

// Vector3 is Copy: it is three f32s, cheap to duplicate, and passing it
// by value keeps call sites free of borrow bookkeeping that buys nothing
// for a type this small.
impl Copy for Vector3 {}
impl Clone for Vector3 {
    fn clone(&self) -> Vector3 {
        *self
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub fn from_index(i: usize) -> Axis {
        match i % 3 {
            0 => Axis::X,
            1 => Axis::Y,
            _ => Axis::Z,
        }
    }
}

impl Vector3 {
    pub fn zero() -> Vector3 {
        Vector3(Tuple3::new(0_f32, 0_f32, 0_f32))
    }

    pub fn one() -> Vector3 {
        Vector3(Tuple3::new(1_f32, 1_f32, 1_f32))
    }

    pub fn new(x: f32, y: f32, z: f32) -> Vector3 {
        Vector3(Tuple3::new(x, y, z))
    }

    pub fn x(&self) -> f32 {
        self.0.x
    }
    pub fn y(&self) -> f32 {
        self.0.y
    }
    pub fn z(&self) -> f32 {
        self.0.z
    }

    pub fn min(v1: Vector3, v2: Vector3) -> Vector3 {
        Vector3(Tuple3::min(v1.0, v2.0))
    }

    pub fn max(v1: Vector3, v2: Vector3) -> Vector3 {
        Vector3(Tuple3::max(v1.0, v2.0))
    }

    pub fn dot(self, other: Vector3) -> f32 {
        (self.x() * other.x()) + (self.y() * other.y()) + (self.z() * other.z())
    }

    pub fn length_squared(self) -> f32 {
        self.dot(self)
    }

    pub fn length(self) -> f32 {
        self.length_squared().sqrt()
    }

    /// Fails with `None` on a zero-length vector rather than returning NaN,
    /// per spec.md §4.1 ("normalize fails with ZeroVector on a zero
    /// magnitude").
    pub fn normalize(self) -> Option<Vector3> {
        let len = self.length();
        if len < EPSILON {
            None
        } else {
            Some(self / len)
        }
    }

    /// Infallible normalize for call sites that already know the vector is
    /// non-zero (e.g. a cross product of two non-parallel edges).
    pub fn normalized(self) -> Vector3 {
        self / self.length()
    }

    pub fn cross(self, other: Vector3) -> Vector3 {
        Vector3(Tuple3::new(
            (self.y() * other.z()) - (self.z() * other.y()),
            (self.z() * other.x()) - (self.x() * other.z()),
            (self.x() * other.y()) - (self.y() * other.x()),
        ))
    }

    pub fn is_parallel(self, other: Vector3) -> bool {
        crate::utils::align_zero(self.cross(other).length_squared()) == 0_f32
    }

    pub fn is_perpendicular(self, other: Vector3) -> bool {
        crate::utils::align_zero(self.dot(other)) == 0_f32
    }

    /// Returns some unit vector orthogonal to `self`. Deterministically
    /// picks the world axis least aligned with `self` before crossing, so
    /// the cross product is never taken against a near-parallel vector
    /// (spec.md §4.1).
    pub fn perpendicular(self) -> Vector3 {
        let ax = self.x().abs();
        let ay = self.y().abs();
        let az = self.z().abs();
        let axis = if ax <= ay && ax <= az {
            Vector3::new(1_f32, 0_f32, 0_f32)
        } else if ay <= az {
            Vector3::new(0_f32, 1_f32, 0_f32)
        } else {
            Vector3::new(0_f32, 0_f32, 1_f32)
        };
        self.cross(axis).normalized()
    }

    pub fn index(&self, axis: Axis) -> f32 {
        match axis {
            Axis::X => self.0.x,
            Axis::Y => self.0.y,
            Axis::Z => self.0.z,
        }
    }
}

impl ops::Add for Vector3 {
    type Output = Vector3;
    fn add(self, rhs: Vector3) -> Vector3 {
        Vector3(self.0.add(rhs.0))
    }
}

impl ops::Sub for Vector3 {
    type Output = Vector3;
    fn sub(self, rhs: Vector3) -> Vector3 {
        Vector3(self.0.sub(rhs.0))
    }
}

impl ops::Neg for Vector3 {
    type Output = Vector3;
    fn neg(self) -> Vector3 {
        Vector3(self.0.neg())
    }
}

impl ops::Mul for Vector3 {
    type Output = Vector3;
    fn mul(self, rhs: Vector3) -> Vector3 {
        Vector3(self.0.mul(rhs.0))
    }
}

impl ops::Mul<f32> for Vector3 {
    type Output = Vector3;
    fn mul(self, rhs: f32) -> Vector3 {
        Vector3(self.0.mul(rhs))
    }
}

impl ops::Mul<Vector3> for f32 {
    type Output = Vector3;
    fn mul(self, rhs: Vector3) -> Vector3 {
        rhs * self
    }
}

impl ops::Div<f32> for Vector3 {
    type Output = Vector3;
    fn div(self, rhs: f32) -> Vector3 {
        Vector3(self.0.div(rhs))
    }
}

impl ops::Index<Axis> for Vector3 {
    type Output = f32;
    fn index(&self, index: Axis) -> &f32 {
        match index {
            Axis::X => &self.0.x,
            Axis::Y => &self.0.y,
            Axis::Z => &self.0.z,
        }
    }
}

impl convert::TryFrom<Vec<f32>> for Vector3 {
    type Error = &'static str;

    fn try_from(vec: Vec<f32>) -> Result<Self, Self::Error> {
        if vec.len() != 3 {
            Err("Deserializing into Vector3 requires an array of length 3")
        } else {
            Ok(Vector3::new(vec[0], vec[1], vec[2]))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_unit_length() {
        let v = Vector3::new(3_f32, 4_f32, 0_f32).normalize().unwrap();
        assert!((v.length() - 1_f32).abs() < 1e-6);
    }

    #[test]
    fn normalize_zero_fails() {
        assert!(Vector3::zero().normalize().is_none());
    }

    #[test]
    fn perpendicular_is_orthogonal() {
        for v in [
            Vector3::new(1_f32, 0_f32, 0_f32),
            Vector3::new(0_f32, 1_f32, 0_f32),
            Vector3::new(1_f32, 2_f32, 3_f32),
        ] {
            let p = v.perpendicular();
            assert!(v.dot(p).abs() < 1e-5);
            assert!((p.length() - 1_f32).abs() < 1e-5);
        }
    }

    #[test]
    fn cross_is_perpendicular_to_both() {
        let a = Vector3::new(1_f32, 0_f32, 0_f32);
        let b = Vector3::new(0_f32, 1_f32, 0_f32);
        let c = a.cross(b);
        assert!(c.dot(a).abs() < 1e-6);
        assert!(c.dot(b).abs() < 1e-6);
    }

    #[test]
    fn parallel_vectors_detected() {
        let a = Vector3::new(2_f32, 0_f32, 0_f32);
        let b = Vector3::new(5_f32, 0_f32, 0_f32);
        assert!(a.is_parallel(b));
        assert!(!a.is_parallel(Vector3::new(0_f32, 1_f32, 0_f32)));
    }
}
