//! Camera state: view and projection matrices plus the eye position the
//! fragment shader fires primary rays from.
//!
//! The camera is plain mutable data. External controllers (orbit handlers,
//! scripted flights) overwrite the fields directly; after any change the
//! owning [`Scene`](crate::scene::Scene) must be told to
//! [`reset_sampling`](crate::scene::Scene::reset_sampling), otherwise stale
//! samples from the old viewpoint keep bleeding into the average.

use cgmath::{Matrix4, Point3, Vector3};

#[derive(Clone, Debug)]
pub struct Camera {
    pub view_matrix: Matrix4<f32>,
    pub projection_matrix: Matrix4<f32>,
    pub eye: Point3<f32>,
}

impl Camera {
    pub fn new(view_matrix: Matrix4<f32>, projection_matrix: Matrix4<f32>, eye: Point3<f32>) -> Self {
        Self {
            view_matrix,
            projection_matrix,
            eye,
        }
    }
}

impl Default for Camera {
    /// Eye at the origin looking slightly up and backwards into the room,
    /// with a unit orthographic projection over the full-screen stage quad.
    fn default() -> Self {
        let eye = Point3::new(0.0, 0.0, 0.0);
        Self {
            view_matrix: Matrix4::look_at_rh(
                eye,
                Point3::new(-0.2, 1.0, -0.6),
                Vector3::unit_z(),
            ),
            projection_matrix: cgmath::ortho(-1.0, 1.0, -1.0, 1.0, 0.01, 100.0),
            eye,
        }
    }
}
