//! Error types for the renderer core.
//!
//! Construction-time failures (shader builds, malformed buffers, oversized
//! meshes) are fatal and propagate to the caller. Per-frame soft conditions
//! (an unused uniform, a texture that has not finished loading) are not
//! errors at all: they are absorbed at the call site with a log line so a
//! single missing binding never halts the render loop.

use thiserror::Error;

use crate::context::UniformType;

/// The shader stage a compile diagnostic refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl std::fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShaderStage::Vertex => write!(f, "vertex"),
            ShaderStage::Fragment => write!(f, "fragment"),
        }
    }
}

/// Errors that can occur while building or drawing a scene.
#[derive(Error, Debug)]
pub enum RenderError {
    /// A shader stage failed to compile. Carries the compiler log.
    #[error("{stage} shader compilation failed: {log}")]
    Compile { stage: ShaderStage, log: String },

    /// The program failed to link. Carries the linker log.
    #[error("program linking failed: {log}")]
    Link { log: String },

    /// A uniform was set with a value whose type does not match the
    /// declaration in the shader. No GPU state is touched in this case.
    #[error("uniform '{name}' is declared as {expected:?}, got {provided:?}")]
    InvalidUniformType {
        name: String,
        expected: UniformType,
        provided: UniformType,
    },

    /// A texture unit outside the range supported by the context.
    #[error("texture unit {unit} out of range [0..{max})")]
    TextureUnitOutOfRange { unit: u32, max: u32 },

    /// Attribute data whose length is not a multiple of the component count.
    #[error("attribute data of length {len} does not divide into {num_components} components")]
    InvalidLayout { len: usize, num_components: u32 },

    /// An OBJ source that could not be parsed into a usable triangle mesh.
    #[error("failed to load mesh: {0}")]
    MeshLoad(String),

    /// A mesh array that does not fit one row of the mesh sampler texture.
    #[error("mesh does not fit the sampler: {len} values, capacity {capacity}")]
    MeshTooLarge { len: usize, capacity: usize },

    /// A scene node reached draw time with no program resolvable along its
    /// ancestor chain. Indicates a scene-construction wiring bug.
    #[error("no program specified in scene node '{node}'")]
    MissingProgram { node: String },

    /// The underlying graphics API refused a resource allocation.
    #[error("context error: {0}")]
    Context(String),
}

/// Result type for renderer operations.
pub type Result<T> = std::result::Result<T, RenderError>;
