//! Declarative description of the traced world.
//!
//! The path tracer does not intersect scene-graph geometry; the world it
//! integrates over is a handful of analytic shapes handed to the fragment
//! shader as uniforms: a set of spheres, an axis-aligned room, and at most
//! one small triangle mesh. [`SceneDescription`] is the plain-data form of
//! that world; [`Scene`](crate::scene::Scene) turns it into uniform uploads
//! at construction. The default description is a grey room lit by two
//! emissive spheres.

use cgmath::{Point3, Vector3};

use crate::resources::mesh::MeshData;

/// Surface behavior of a traced shape.
///
/// Emittance is radiance added when a ray hits the surface; reflectance
/// scales whatever the continued ray returns. A material that is neither
/// mirror nor diffuse terminates paths (pure light sources work this way).
#[derive(Clone, Copy, Debug)]
pub struct Material {
    pub emittance: Vector3<f32>,
    pub reflectance: Vector3<f32>,
    pub is_mirror: bool,
    pub is_diffuse: bool,
}

impl Material {
    /// A light source: emits `emittance`, terminates the path.
    pub fn emissive(emittance: Vector3<f32>) -> Self {
        Self {
            emittance,
            reflectance: Vector3::new(1.0, 1.0, 1.0),
            is_mirror: false,
            is_diffuse: false,
        }
    }

    /// A Lambertian surface with the given reflectance.
    pub fn diffuse(reflectance: Vector3<f32>) -> Self {
        Self {
            emittance: Vector3::new(0.0, 0.0, 0.0),
            reflectance,
            is_mirror: false,
            is_diffuse: true,
        }
    }

    /// A perfect mirror.
    pub fn mirror() -> Self {
        Self {
            emittance: Vector3::new(0.0, 0.0, 0.0),
            reflectance: Vector3::new(1.0, 1.0, 1.0),
            is_mirror: true,
            is_diffuse: false,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Sphere {
    pub center: Point3<f32>,
    pub radius: f32,
    pub material: Material,
}

/// An axis-aligned room enclosing the scene, with one material per face in
/// the order left, right, near, far, bottom, top.
#[derive(Clone, Copy, Debug)]
pub struct Room {
    pub min_corner: Point3<f32>,
    pub max_corner: Point3<f32>,
    pub materials: [Material; 6],
}

impl Default for Room {
    /// A 128 x 128 x 48 room: red left wall, green right wall, grey walls
    /// and floor, emissive ceiling.
    fn default() -> Self {
        Self {
            min_corner: Point3::new(-64.0, -1.0, -16.0),
            max_corner: Point3::new(64.0, 127.0, 32.0),
            materials: [
                Material::diffuse(Vector3::new(0.4, 0.0, 0.0)),
                Material::diffuse(Vector3::new(0.0, 0.4, 0.0)),
                Material::diffuse(Vector3::new(0.8, 0.8, 0.8)),
                Material::diffuse(Vector3::new(0.8, 0.8, 0.8)),
                Material::diffuse(Vector3::new(0.2, 0.2, 0.2)),
                Material::emissive(Vector3::new(0.4, 0.4, 0.4)),
            ],
        }
    }
}

/// Everything the tracer integrates over, plus the ambient term added to
/// every path.
#[derive(Clone, Debug)]
pub struct SceneDescription {
    pub ambient: Vector3<f32>,
    pub spheres: Vec<Sphere>,
    pub room: Room,
    pub mesh: Option<MeshData>,
    pub mesh_material: Material,
}

impl Default for SceneDescription {
    /// The default room under two emissive spheres: a small bright one high
    /// on the left and a large dim one behind the camera.
    fn default() -> Self {
        Self {
            ambient: Vector3::new(0.1, 0.1, 0.1),
            spheres: vec![
                Sphere {
                    center: Point3::new(-20.0, 60.0, -30.0),
                    radius: 7.5,
                    material: Material::emissive(Vector3::new(1.0, 1.0, 1.0)),
                },
                Sphere {
                    center: Point3::new(0.0, 85.0, 85.0),
                    radius: 35.0,
                    material: Material::emissive(Vector3::new(0.66, 0.66, 0.66)),
                },
            ],
            room: Room::default(),
            mesh: None,
            mesh_material: Material::diffuse(Vector3::new(1.0, 1.0, 1.0)),
        }
    }
}
