use crate::aggregate::Geometries;
use crate::camera::Camera;
use crate::color::RGB;
use crate::config::BvhStrategy;
use crate::error::{RtError, RtResult};
use crate::light::Light;
use crate::material::Material;
use crate::point::Point3;
use crate::shape::{Cylinder, Ellipsoid, Plane, Polygon, Sphere, SyncGeometry, Triangle, Tube};
use crate::transform::Transform;
use crate::vector::Vector3;

use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Render-ready scene (spec.md §3): background, a flat ambient term, the
/// light list, the aggregate intersectable, and the camera that generates
/// primary rays into it.
pub struct Scene {
    pub background: RGB,
    pub ambient: Light,
    pub lights: Vec<Light>,
    pub geometries: Geometries,
    pub camera: Camera,
}

#[derive(Deserialize)]
struct Resolution {
    width: u32,
    height: u32,
}

fn default_lens_radius() -> f32 {
    0_f32
}

#[derive(Deserialize)]
struct CameraDescription {
    position: Point3,
    forward: Vector3,
    up: Vector3,
    distance: f32,
    width: f32,
    height: f32,
    #[serde(default = "default_lens_radius")]
    lens_radius: f32,
}

/// Parses a JSON scene description into a render-ready `Scene` (spec.md
/// §6's scene ingestion contract, mirroring the teacher's
/// `scene::deserialize`'s required-key helpers and per-shape-type
/// dispatch). `bvh`/`leaf_size` come from the caller's `RenderConfig`
/// rather than the scene file, since they tune how the aggregate is built,
/// not what it contains.
pub fn load(
    json: &str,
    bvh: BvhStrategy,
    leaf_size: usize,
    resolution_override: Option<(u32, u32)>,
) -> RtResult<Scene> {
    let top_level: Value = serde_json::from_str(json)?;

    let resolution_value = required_key(&top_level, "resolution")?;
    let mut resolution: Resolution = serde_json::from_value(resolution_value.clone())?;
    if let Some((width, height)) = resolution_override {
        resolution.width = width;
        resolution.height = height;
    }

    let background_value = required_key(&top_level, "background")?;
    let background: RGB = serde_json::from_value(background_value.clone())?;

    let ambient_value = required_key(&top_level, "ambient")?;
    let ambient: Light = serde_json::from_value(ambient_value.clone())?;

    let lights_value = required_key(&top_level, "lights")?;
    let lights: Vec<Light> = serde_json::from_value(lights_value.clone())?;

    let camera_value = required_key(&top_level, "camera")?;
    let camera_desc: CameraDescription = serde_json::from_value(camera_value.clone())?;
    let camera = Camera::new(
        camera_desc.position,
        camera_desc.forward,
        camera_desc.up,
        camera_desc.distance,
        camera_desc.width,
        camera_desc.height,
        resolution.width,
        resolution.height,
        camera_desc.lens_radius,
    )?;

    let materials_value = required_key(&top_level, "materials")?;
    let materials: HashMap<String, Material> = serde_json::from_value(materials_value.clone())?;

    let geometries_value = required_key(&top_level, "geometries")?;
    let geometries_json = geometries_value.as_array().ok_or_else(|| {
        RtError::InvalidConfiguration("'geometries' is not a JSON array".into())
    })?;
    let mut shapes = Vec::with_capacity(geometries_json.len());
    for entry in geometries_json {
        shapes.push(deserialize_shape(entry, &materials)?);
    }

    Ok(Scene {
        background,
        ambient,
        lights,
        geometries: Geometries::build(shapes, bvh, leaf_size),
        camera,
    })
}

fn required_key<'a>(value: &'a Value, key: &str) -> RtResult<&'a Value> {
    value
        .get(key)
        .ok_or_else(|| RtError::InvalidConfiguration(format!("required key '{}' is missing", key)))
}

fn lookup_material(materials: &HashMap<String, Material>, name: &str) -> RtResult<Material> {
    materials
        .get(name)
        .copied()
        .ok_or_else(|| RtError::InvalidConfiguration(format!("unknown material '{}'", name)))
}

fn deserialize_shape(json: &Value, materials: &HashMap<String, Material>) -> RtResult<Arc<SyncGeometry>> {
    let kind = required_key(json, "type")?
        .as_str()
        .ok_or_else(|| RtError::InvalidConfiguration("shape 'type' is not a string".into()))?
        .to_owned();

    match kind.as_str() {
        "Sphere" => deserialize_sphere(json, materials),
        "Plane" => deserialize_plane(json, materials),
        "Triangle" => deserialize_triangle(json, materials),
        "Polygon" => deserialize_polygon(json, materials),
        "Tube" => deserialize_tube(json, materials),
        "Cylinder" => deserialize_cylinder(json, materials),
        "Ellipsoid" => deserialize_ellipsoid(json, materials),
        other => Err(RtError::InvalidConfiguration(format!(
            "unknown geometry type '{}'",
            other
        ))),
    }
}

#[derive(Deserialize)]
struct SphereDescription {
    center: Point3,
    radius: f32,
    material: String,
    #[serde(default)]
    transform: Option<Transform>,
}

fn deserialize_sphere(json: &Value, materials: &HashMap<String, Material>) -> RtResult<Arc<SyncGeometry>> {
    let desc: SphereDescription = serde_json::from_value(json.clone())?;
    let material = lookup_material(materials, &desc.material)?;
    let mut sphere = Sphere::new(desc.center, desc.radius, material)?;
    if let Some(t) = desc.transform {
        sphere = sphere
            .scale(t.scale())?
            .rotate(t.rotate_axis(), t.rotate_angle())
            .translate(t.translate());
    }
    Ok(Arc::new(sphere))
}

#[derive(Deserialize)]
struct PlaneDescription {
    point: Point3,
    normal: Vector3,
    material: String,
    #[serde(default)]
    transform: Option<Transform>,
}

fn deserialize_plane(json: &Value, materials: &HashMap<String, Material>) -> RtResult<Arc<SyncGeometry>> {
    let desc: PlaneDescription = serde_json::from_value(json.clone())?;
    let material = lookup_material(materials, &desc.material)?;
    let mut plane = Plane::new(desc.point, desc.normal)?.with_material(material);
    if let Some(t) = desc.transform {
        plane = plane
            .scale(t.scale())
            .rotate(t.rotate_axis(), t.rotate_angle())
            .translate(t.translate());
    }
    Ok(Arc::new(plane))
}

#[derive(Deserialize)]
struct TriangleDescription {
    v0: Point3,
    v1: Point3,
    v2: Point3,
    material: String,
    #[serde(default)]
    transform: Option<Transform>,
}

fn deserialize_triangle(json: &Value, materials: &HashMap<String, Material>) -> RtResult<Arc<SyncGeometry>> {
    let desc: TriangleDescription = serde_json::from_value(json.clone())?;
    let material = lookup_material(materials, &desc.material)?;
    let mut triangle = Triangle::new(desc.v0, desc.v1, desc.v2, material)?;
    if let Some(t) = desc.transform {
        triangle = triangle
            .scale(t.scale())?
            .rotate(t.rotate_axis(), t.rotate_angle())
            .translate(t.translate());
    }
    Ok(Arc::new(triangle))
}

#[derive(Deserialize)]
struct PolygonDescription {
    vertices: Vec<Point3>,
    material: String,
    #[serde(default)]
    transform: Option<Transform>,
}

fn deserialize_polygon(json: &Value, materials: &HashMap<String, Material>) -> RtResult<Arc<SyncGeometry>> {
    let desc: PolygonDescription = serde_json::from_value(json.clone())?;
    let material = lookup_material(materials, &desc.material)?;
    let mut polygon = Polygon::new(desc.vertices, material)?;
    if let Some(t) = desc.transform {
        polygon = polygon
            .scale(t.scale())?
            .rotate(t.rotate_axis(), t.rotate_angle())
            .translate(t.translate());
    }
    Ok(Arc::new(polygon))
}

#[derive(Deserialize)]
struct TubeDescription {
    axis_origin: Point3,
    axis_dir: Vector3,
    radius: f32,
    material: String,
    #[serde(default)]
    transform: Option<Transform>,
}

fn deserialize_tube(json: &Value, materials: &HashMap<String, Material>) -> RtResult<Arc<SyncGeometry>> {
    let desc: TubeDescription = serde_json::from_value(json.clone())?;
    let material = lookup_material(materials, &desc.material)?;
    let mut tube = Tube::new(desc.axis_origin, desc.axis_dir, desc.radius, material)?;
    if let Some(t) = desc.transform {
        tube = tube
            .scale(t.scale())?
            .rotate(t.rotate_axis(), t.rotate_angle())
            .translate(t.translate());
    }
    Ok(Arc::new(tube))
}

#[derive(Deserialize)]
struct CylinderDescription {
    axis_origin: Point3,
    axis_dir: Vector3,
    radius: f32,
    height: f32,
    material: String,
    #[serde(default)]
    transform: Option<Transform>,
}

fn deserialize_cylinder(json: &Value, materials: &HashMap<String, Material>) -> RtResult<Arc<SyncGeometry>> {
    let desc: CylinderDescription = serde_json::from_value(json.clone())?;
    let material = lookup_material(materials, &desc.material)?;
    let mut cylinder = Cylinder::new(desc.axis_origin, desc.axis_dir, desc.radius, desc.height, material)?;
    if let Some(t) = desc.transform {
        cylinder = cylinder
            .scale(t.scale())?
            .rotate(t.rotate_axis(), t.rotate_angle())
            .translate(t.translate());
    }
    Ok(Arc::new(cylinder))
}

#[derive(Deserialize)]
struct EllipsoidDescription {
    center: Point3,
    radii: Vector3,
    material: String,
    #[serde(default)]
    transform: Option<Transform>,
}

fn deserialize_ellipsoid(json: &Value, materials: &HashMap<String, Material>) -> RtResult<Arc<SyncGeometry>> {
    let desc: EllipsoidDescription = serde_json::from_value(json.clone())?;
    let material = lookup_material(materials, &desc.material)?;
    let mut ellipsoid = Ellipsoid::new(desc.center, desc.radii, material)?;
    if let Some(t) = desc.transform {
        ellipsoid = ellipsoid
            .scale(t.scale())?
            .rotate(t.rotate_axis(), t.rotate_angle())?
            .translate(t.translate());
    }
    Ok(Arc::new(ellipsoid))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_scene_json() -> String {
        r#"{
            "resolution": {"width": 4, "height": 4},
            "background": [0, 0, 0],
            "ambient": {"type": "Ambient", "intensity": [0.1, 0.1, 0.1]},
            "lights": [
                {"type": "Point", "intensity": [1, 1, 1], "position": [0, 5, 0]}
            ],
            "camera": {
                "position": [0, 0, 5],
                "forward": [0, 0, -1],
                "up": [0, 1, 0],
                "distance": 1.0,
                "width": 2.0,
                "height": 2.0
            },
            "materials": {
                "matte": {"kD": [0.8, 0.1, 0.1]}
            },
            "geometries": [
                {"type": "Sphere", "material": "matte", "center": [0, 0, 0], "radius": 1.0}
            ]
        }"#
        .to_owned()
    }

    #[test]
    fn loads_a_minimal_scene() {
        let scene = load(&minimal_scene_json(), BvhStrategy::Sah, 2, None).unwrap();
        assert_eq!(scene.camera.resolution(), (4, 4));
        assert_eq!(scene.lights.len(), 1);
    }

    #[test]
    fn rejects_unknown_material_reference() {
        let json = minimal_scene_json().replace("\"matte\", \"center\"", "\"ghost\", \"center\"");
        assert!(load(&json, BvhStrategy::Sah, 2, None).is_err());
    }

    #[test]
    fn rejects_missing_required_key() {
        let json = minimal_scene_json().replace("\"background\"", "\"nope\"");
        assert!(load(&json, BvhStrategy::Sah, 2, None).is_err());
    }
}
