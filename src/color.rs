use crate::base::Tuple3;
use crate::utils::clamp;

use serde::Deserialize;
use std::convert;
use std::ops;

/// Linear RGB, components typically in `[0, 1]` but not clamped until a
/// pixel is finally written out (spec.md §6's PixelSink): intermediate
/// light accumulation (e.g. summed specular highlights) can exceed 1.
#[derive(Deserialize)]
#[serde(try_from = "Vec<f32>")]
pub struct RGB(pub Tuple3<f32>);

impl Copy for RGB {}
impl Clone for RGB {
    fn clone(&self) -> RGB {
        *self
    }
}

impl RGB {
    pub fn new(r: f32, g: f32, b: f32) -> RGB {
        RGB(Tuple3::new(r, g, b))
    }

    pub fn black() -> RGB {
        RGB(Tuple3::new(0_f32, 0_f32, 0_f32))
    }

    pub fn white() -> RGB {
        RGB(Tuple3::new(1_f32, 1_f32, 1_f32))
    }

    pub fn r(&self) -> f32 {
        self.0.x
    }
    pub fn g(&self) -> f32 {
        self.0.y
    }
    pub fn b(&self) -> f32 {
        self.0.z
    }

    /// Collapses NaN/Inf channels (which arise from divide-by-near-zero in
    /// reflection/refraction falloff) to black rather than propagating them
    /// into the output image, per spec.md §8's edge case handling.
    pub fn sanitized(self) -> RGB {
        let fix = |c: f32| if c.is_finite() { c } else { 0_f32 };
        RGB::new(fix(self.r()), fix(self.g()), fix(self.b()))
    }

    /// `true` when every channel is below `threshold` (spec.md §4.5's
    /// `MIN_K` attenuation cutoff: a reflect/refract branch whose
    /// accumulated weight is this faint is pruned rather than traced).
    pub fn is_negligible(self, threshold: f32) -> bool {
        self.r() < threshold && self.g() < threshold && self.b() < threshold
    }

    /// Clamps each channel to `[0, 1]` and converts to 8-bit, the last step
    /// before a pixel reaches the `PixelSink`.
    pub fn to_u8(self) -> [u8; 3] {
        let c = self.sanitized();
        [
            (clamp(c.r(), 0_f32, 1_f32) * 255_f32).round() as u8,
            (clamp(c.g(), 0_f32, 1_f32) * 255_f32).round() as u8,
            (clamp(c.b(), 0_f32, 1_f32) * 255_f32).round() as u8,
        ]
    }
}

impl ops::Mul for RGB {
    type Output = RGB;
    fn mul(self, rhs: RGB) -> RGB {
        RGB(self.0.mul(rhs.0))
    }
}

impl ops::Add for RGB {
    type Output = RGB;
    fn add(self, rhs: RGB) -> RGB {
        RGB(self.0.add(rhs.0))
    }
}

impl ops::Mul<f32> for RGB {
    type Output = RGB;
    fn mul(self, rhs: f32) -> RGB {
        RGB(self.0.mul(rhs))
    }
}

impl ops::Div<f32> for RGB {
    type Output = RGB;
    fn div(self, rhs: f32) -> RGB {
        RGB(self.0.div(rhs))
    }
}

impl convert::TryFrom<Vec<f32>> for RGB {
    type Error = &'static str;

    fn try_from(vec: Vec<f32>) -> Result<Self, Self::Error> {
        if vec.len() != 3 {
            Err("Deserializing into RGB requires an array of length 3")
        } else {
            Ok(RGB::new(vec[0], vec[1], vec[2]))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitized_collapses_non_finite_to_black_channel() {
        let c = RGB::new(f32::NAN, f32::INFINITY, 0.5_f32).sanitized();
        assert_eq!((c.r(), c.g(), c.b()), (0_f32, 0_f32, 0.5_f32));
    }

    #[test]
    fn to_u8_clamps_above_one() {
        let c = RGB::new(2_f32, -1_f32, 0.5_f32);
        assert_eq!(c.to_u8(), [255, 0, 128]);
    }

    #[test]
    fn is_negligible_requires_every_channel_below_threshold() {
        assert!(RGB::new(0.0001_f32, 0_f32, 0.0005_f32).is_negligible(1e-3));
        assert!(!RGB::new(0.01_f32, 0_f32, 0_f32).is_negligible(1e-3));
    }
}
