//! raymond
//!
//! A progressive GPU path-tracing renderer built on a minimal retained-mode
//! scene graph. Every frame renders one new noisy Monte-Carlo sample of the
//! scene in a fragment shader and blends it into a running average with an
//! `n / (n + 1)` weight, so the image sharpens for as long as the camera
//! holds still. The crate is a library: the host application owns the window
//! and the OpenGL context and drives the frame loop.
//!
//! High-level modules
//! - `animation`: the start/stoppable frame clock driving the render loop
//! - `camera`: view/projection state and the ray origin
//! - `context`: the rendering-context trait and its glow/OpenGL backend
//! - `data_structures`: scene graph, stage quad and the traced-world description
//! - `pipelines`: built-in GLSL sources and shader program builders
//! - `program`: shader programs with reflected, type-checked uniforms
//! - `resources`: texture loading and mesh packing
//! - `scene`: the progressive two-pass accumulation loop
//! - `vbo`: vertex attribute and index buffers
//!

pub mod animation;
pub mod camera;
pub mod context;
pub mod data_structures;
pub mod error;
pub mod pipelines;
pub mod program;
pub mod resources;
pub mod scene;
pub mod vbo;

// Re-exports commonly used types for convenience in downstream code.
pub use crate::animation::Animation;
pub use crate::camera::Camera;
pub use crate::context::RenderingContext;
pub use crate::data_structures::scene_desc::SceneDescription;
pub use crate::data_structures::scene_graph::{Drawable, SceneNode};
pub use crate::error::{RenderError, Result};
pub use crate::program::ShaderProgram;
pub use crate::scene::Scene;
pub use cgmath;
