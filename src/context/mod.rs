//! Rendering-context abstraction.
//!
//! The renderer core never talks to a graphics API directly; everything goes
//! through [`RenderingContext`], a thin capability set covering exactly what
//! the core needs: program builds, uniform reflection and upload, vertex and
//! index buffers, 2D textures, one framebuffer level, and a handful of draw
//! and state calls. The production implementation is [`gl::GlContext`] over
//! an OpenGL 3.3 core context; tests substitute an in-memory recording
//! implementation so scene logic can be verified without a GPU.
//!
//! The context also owns the "currently active program" cache that
//! [`ShaderProgram::activate`](crate::program::ShaderProgram::activate) uses
//! to elide redundant binds. Keeping the cache on the context (rather than in
//! module-level state) means two contexts never poison each other.

pub mod gl;

use cgmath::{Matrix2, Matrix3, Matrix4, Vector2, Vector3, Vector4};

use crate::error::Result;

/// Handle to a linked program owned by a context.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProgramId(pub u32);

/// Handle to a vertex or index buffer owned by a context.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BufferId(pub u32);

/// Handle to a 2D texture owned by a context.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextureId(pub u32);

/// Handle to a framebuffer object owned by a context.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FramebufferId(pub u32);

/// Location of a uniform within a specific program, as resolved by
/// [`RenderingContext::uniform_info`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UniformLocation(pub u32);

/// The GLSL-declared type of a uniform, reported by program reflection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UniformType {
    Float,
    Int,
    Bool,
    Vec2,
    Vec3,
    Vec4,
    Mat2,
    Mat3,
    Mat4,
    Sampler2D,
}

/// Location and declared type of a uniform.
#[derive(Clone, Copy, Debug)]
pub struct UniformInfo {
    pub location: UniformLocation,
    pub ty: UniformType,
}

/// A typed uniform value ready for upload.
///
/// The variant must match the shader's declaration; `ShaderProgram` checks
/// this against the reflection data before any GPU call is issued. Booleans
/// are transferred as integers, as the GL convention demands.
#[derive(Clone, Copy, Debug)]
pub enum UniformValue {
    Float(f32),
    Int(i32),
    Bool(bool),
    Vec2(Vector2<f32>),
    Vec3(Vector3<f32>),
    Vec4(Vector4<f32>),
    Mat2(Matrix2<f32>),
    Mat3(Matrix3<f32>),
    Mat4(Matrix4<f32>),
}

impl UniformValue {
    /// The [`UniformType`] a shader must declare for this value to be
    /// accepted. Sampler uniforms are set through
    /// [`ShaderProgram::set_texture`](crate::program::ShaderProgram::set_texture),
    /// which uploads the unit index as an `Int`.
    pub fn uniform_type(&self) -> UniformType {
        match self {
            UniformValue::Float(_) => UniformType::Float,
            UniformValue::Int(_) => UniformType::Int,
            UniformValue::Bool(_) => UniformType::Bool,
            UniformValue::Vec2(_) => UniformType::Vec2,
            UniformValue::Vec3(_) => UniformType::Vec3,
            UniformValue::Vec4(_) => UniformType::Vec4,
            UniformValue::Mat2(_) => UniformType::Mat2,
            UniformValue::Mat3(_) => UniformType::Mat3,
            UniformValue::Mat4(_) => UniformType::Mat4,
        }
    }
}

/// Texture sampling parameters adjustable after creation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TexParameter {
    MinFilter,
    MagFilter,
    WrapS,
    WrapT,
}

/// Values for [`TexParameter`]. Filter parameters take `Nearest`, `Linear`
/// or `LinearMipmapLinear`; wrap parameters take `Repeat` or `ClampToEdge`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TexValue {
    Nearest,
    Linear,
    LinearMipmapLinear,
    Repeat,
    ClampToEdge,
}

/// The capability set the renderer core requires from a host graphics
/// context.
///
/// All methods take `&self`: a GL-style context is one big piece of mutable
/// driver state behind a handle, and everything here runs on the one
/// event-loop thread anyway. Implementations use interior mutability for
/// their bookkeeping.
pub trait RenderingContext {
    /// Pixel dimensions of the drawable surface.
    fn surface_size(&self) -> (u32, u32);

    // --- programs ---

    /// Compile both stages and link. Fails fast with
    /// [`RenderError::Compile`](crate::error::RenderError::Compile) naming
    /// the offending stage, or
    /// [`RenderError::Link`](crate::error::RenderError::Link).
    fn create_program(&self, vertex_source: &str, fragment_source: &str) -> Result<ProgramId>;

    /// Make the program current. Callers should prefer
    /// [`ShaderProgram::activate`](crate::program::ShaderProgram::activate),
    /// which consults [`active_program`](Self::active_program) first.
    fn use_program(&self, program: ProgramId);

    /// The program currently bound on this context, if any.
    fn active_program(&self) -> Option<ProgramId>;

    /// Reflection lookup: location and declared type of a named uniform.
    /// `None` means the uniform is not active in the program.
    fn uniform_info(&self, program: ProgramId, name: &str) -> Option<UniformInfo>;

    /// Upload a uniform value. The caller has already verified the type
    /// against [`uniform_info`](Self::uniform_info).
    fn write_uniform(&self, program: ProgramId, location: UniformLocation, value: &UniformValue);

    /// Location of a named vertex attribute, `None` if not active.
    fn attribute_location(&self, program: ProgramId, name: &str) -> Option<u32>;

    /// Highest usable texture unit count.
    fn max_texture_units(&self) -> u32;

    // --- buffers ---

    /// Create a vertex attribute buffer and upload `data` into it.
    fn create_attribute_buffer(&self, data: &[f32]) -> Result<BufferId>;

    /// Create an index buffer and upload `indices` into it.
    fn create_index_buffer(&self, indices: &[u16]) -> Result<BufferId>;

    /// Bind `buffer` to attribute `location` as tightly packed floats with
    /// `num_components` components per vertex, and enable the attribute.
    fn bind_attribute(&self, buffer: BufferId, location: u32, num_components: u32);

    /// Make `buffer` the active element/index source.
    fn bind_indices(&self, buffer: BufferId);

    // --- textures ---

    /// Create an (empty) 2D texture object.
    fn create_texture(&self) -> Result<TextureId>;

    /// (Re)define the texture image as RGB bytes. `pixels: None` allocates
    /// uninitialized storage, e.g. for a render target.
    fn upload_texture(&self, texture: TextureId, width: u32, height: u32, pixels: Option<&[u8]>);

    /// Generate the mipmap chain for `texture`.
    fn generate_mipmaps(&self, texture: TextureId);

    /// Change one sampling parameter of `texture`.
    fn set_texture_parameter(&self, texture: TextureId, param: TexParameter, value: TexValue);

    /// Bind `texture` to the given texture unit.
    fn bind_texture(&self, unit: u32, texture: TextureId);

    // --- framebuffers ---

    /// Create a framebuffer object.
    fn create_framebuffer(&self) -> Result<FramebufferId>;

    /// Attach `texture` as the framebuffer's color target.
    fn attach_color_target(&self, framebuffer: FramebufferId, texture: TextureId);

    /// Bind `framebuffer` as the render target; `None` binds the default
    /// (on-screen) framebuffer.
    fn bind_framebuffer(&self, framebuffer: Option<FramebufferId>);

    // --- per-frame state and draws ---

    /// Enable or disable depth testing with "keep nearer fragment"
    /// comparison.
    fn set_depth_test(&self, enabled: bool);

    /// Clear color and depth buffers to the given color.
    fn clear(&self, color: [f32; 4]);

    /// Draw `num_vertices` from the bound attribute buffers as a triangle
    /// strip.
    fn draw_triangle_strip(&self, num_vertices: u32);

    /// Draw `num_indices` from the bound index buffer as triangles.
    fn draw_indexed_triangles(&self, num_indices: u32);
}
