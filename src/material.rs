use crate::color::RGB;

use serde::Deserialize;

fn default_black() -> RGB {
    RGB::black()
}
fn default_shininess() -> u32 {
    0
}

/// Phong material: diffuse/specular/transparency/reflectance are each an RGB
/// triple in `[0,1]` per channel (spec.md §3), with an optional emission
/// term for light-emitting surfaces. Replaces the teacher's trait-based
/// `Material` (scatter/emit/importance-sampling PDFs) with a plain struct,
/// since this tracer's shading model is local Phong + bounded recursion,
/// not path tracing.
#[derive(Deserialize, Clone, Copy)]
pub struct Material {
    #[serde(rename = "kD", default = "default_black")]
    pub k_diffuse: RGB,
    #[serde(rename = "kS", default = "default_black")]
    pub k_specular: RGB,
    #[serde(rename = "kT", default = "default_black")]
    pub k_transparency: RGB,
    #[serde(rename = "kR", default = "default_black")]
    pub k_reflectance: RGB,
    #[serde(default = "default_shininess")]
    pub shininess: u32,
    #[serde(default)]
    pub emission: Option<RGB>,
}

impl Material {
    pub fn black() -> Material {
        Material {
            k_diffuse: RGB::black(),
            k_specular: RGB::black(),
            k_transparency: RGB::black(),
            k_reflectance: RGB::black(),
            shininess: 0,
            emission: None,
        }
    }
}
