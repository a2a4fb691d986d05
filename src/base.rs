use serde::Deserialize;
use std::cmp;
use std::ops;

/// Shared storage for the three-component value types (`Point3`, `Vector3`,
/// `RGB`). Keeping the component algebra here means each of those types
/// only needs to define the operations that are actually meaningful for it.
#[derive(Deserialize)]
pub struct Tuple3<T> {
    pub x: T,
    pub y: T,
    pub z: T,
}

impl<T: Copy> Copy for Tuple3<T> {}
impl<T: Copy> Clone for Tuple3<T> {
    fn clone(&self) -> Tuple3<T> {
        *self
    }
}

impl<T> Tuple3<T>
where
    T: cmp::PartialOrd,
{
    pub fn new(x: T, y: T, z: T) -> Tuple3<T> {
        Tuple3 { x, y, z }
    }

    pub fn min(v1: Tuple3<T>, v2: Tuple3<T>) -> Tuple3<T> {
        Tuple3 {
            x: if v1.x < v2.x { v1.x } else { v2.x },
            y: if v1.y < v2.y { v1.y } else { v2.y },
            z: if v1.z < v2.z { v1.z } else { v2.z },
        }
    }

    pub fn max(v1: Tuple3<T>, v2: Tuple3<T>) -> Tuple3<T> {
        Tuple3 {
            x: if v1.x > v2.x { v1.x } else { v2.x },
            y: if v1.y > v2.y { v1.y } else { v2.y },
            z: if v1.z > v2.z { v1.z } else { v2.z },
        }
    }
}

impl<T> ops::Add for Tuple3<T>
where
    T: ops::Add<Output = T>,
{
    type Output = Tuple3<T>;
    fn add(self, rhs: Tuple3<T>) -> Tuple3<T> {
        Tuple3 {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
            z: self.z + rhs.z,
        }
    }
}

impl<T> ops::Sub for Tuple3<T>
where
    T: ops::Sub<Output = T>,
{
    type Output = Tuple3<T>;
    fn sub(self, rhs: Tuple3<T>) -> Tuple3<T> {
        Tuple3 {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
            z: self.z - rhs.z,
        }
    }
}

impl<T> ops::Neg for Tuple3<T>
where
    T: ops::Neg<Output = T>,
{
    type Output = Tuple3<T>;
    fn neg(self) -> Tuple3<T> {
        Tuple3 {
            x: -self.x,
            y: -self.y,
            z: -self.z,
        }
    }
}

impl<T> ops::Mul for Tuple3<T>
where
    T: ops::Mul<Output = T>,
{
    type Output = Tuple3<T>;
    fn mul(self, rhs: Tuple3<T>) -> Tuple3<T> {
        Tuple3 {
            x: self.x * rhs.x,
            y: self.y * rhs.y,
            z: self.z * rhs.z,
        }
    }
}

impl<T> ops::Mul<T> for Tuple3<T>
where
    T: Copy + ops::Mul<Output = T>,
{
    type Output = Tuple3<T>;
    fn mul(self, rhs: T) -> Tuple3<T> {
        Tuple3 {
            x: self.x * rhs,
            y: self.y * rhs,
            z: self.z * rhs,
        }
    }
}

impl<T> ops::Div<T> for Tuple3<T>
where
    T: Copy + ops::Div<Output = T>,
{
    type Output = Tuple3<T>;
    fn div(self, rhs: T) -> Tuple3<T> {
        Tuple3 {
            x: self.x / rhs,
            y: self.y / rhs,
            z: self.z / rhs,
        }
    }
}
