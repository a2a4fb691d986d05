use crate::vector::Vector3;

use serde::Deserialize;

fn default_translate() -> Vector3 {
    Vector3::zero()
}
fn default_rotate_axis() -> Vector3 {
    Vector3::new(0_f32, 1_f32, 0_f32)
}
fn default_rotate_angle() -> f32 {
    0_f32
}
fn default_scale() -> Vector3 {
    Vector3::one()
}

/// A scene object's placement: translate, then an axis/angle rotation, then
/// a (uniform, for curved shapes) scale, composed in that order. Transforms
/// are consumed at scene load time by applying `scale`/`rotate`/`translate`
/// directly to the concrete `Geometry`; nothing downstream holds a
/// `Transform`.
#[derive(Deserialize)]
pub struct Transform {
    #[serde(default = "default_translate")]
    translate: Vector3,
    #[serde(default = "default_rotate_axis")]
    rotate_axis: Vector3,
    #[serde(default = "default_rotate_angle")]
    rotate_angle: f32,
    #[serde(default = "default_scale")]
    scale: Vector3,
}

impl Transform {
    pub fn identity() -> Transform {
        Transform {
            translate: default_translate(),
            rotate_axis: default_rotate_axis(),
            rotate_angle: default_rotate_angle(),
            scale: default_scale(),
        }
    }

    pub fn translate(&self) -> Vector3 {
        self.translate
    }

    pub fn rotate_axis(&self) -> Vector3 {
        self.rotate_axis
    }

    pub fn rotate_angle(&self) -> f32 {
        self.rotate_angle
    }

    pub fn scale(&self) -> Vector3 {
        self.scale
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_transform_has_no_effect() {
        let t = Transform::identity();
        assert_eq!((t.translate().x(), t.translate().y(), t.translate().z()), (0_f32, 0_f32, 0_f32));
        assert_eq!((t.scale().x(), t.scale().y(), t.scale().z()), (1_f32, 1_f32, 1_f32));
        assert_eq!(t.rotate_angle(), 0_f32);
    }
}
