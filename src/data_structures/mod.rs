//! Renderer data structures.
//!
//! - `scene_graph` holds the retained-mode node hierarchy and the `Drawable`
//!   trait everything renderable implements
//! - `stage` is the full-screen quad the path tracer rasterizes once per pass
//! - `scene_desc` is the declarative description of the traced world
//!   (spheres, room, mesh, materials) that becomes shader uniforms

pub mod scene_desc;
pub mod scene_graph;
pub mod stage;
