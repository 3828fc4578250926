//! OpenGL backend for [`RenderingContext`], built on [`glow`].
//!
//! The embedding application creates the `glow::Context` with whatever
//! windowing stack it uses and hands it over; this module never opens
//! windows. All unsafe GL calls live here. Resource handles given out to the
//! rest of the crate are indices into per-kind registries, so the core never
//! sees a raw GL object.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::sync::Arc;

use glow::{HasContext, PixelUnpackData};
use log::warn;

use crate::context::{
    BufferId, FramebufferId, ProgramId, RenderingContext, TexParameter, TexValue, TextureId,
    UniformInfo, UniformLocation, UniformType, UniformValue,
};
use crate::error::{RenderError, Result, ShaderStage};

/// GL internal format for the RGB8 textures this renderer uses, pre-cast to
/// the `i32` that `tex_image_2d` expects.
const RGB8_INTERNAL_FORMAT: i32 = glow::RGB8 as i32;

/// Reflection data for one linked program.
struct ProgramEntry {
    raw: glow::Program,
    /// Uniform name -> (slot into `slots`, declared type).
    uniforms: HashMap<String, (u32, UniformType)>,
    slots: Vec<glow::UniformLocation>,
    attributes: HashMap<String, u32>,
}

/// [`RenderingContext`] implementation over an OpenGL 3.3 core context.
pub struct GlContext {
    gl: Arc<glow::Context>,
    size: Cell<(u32, u32)>,
    programs: RefCell<Vec<ProgramEntry>>,
    buffers: RefCell<Vec<glow::Buffer>>,
    textures: RefCell<Vec<glow::Texture>>,
    framebuffers: RefCell<Vec<glow::Framebuffer>>,
    /// Currently bound program; consulted to elide redundant `use_program`.
    active: Cell<Option<ProgramId>>,
}

impl GlContext {
    /// Wrap a ready GL context whose drawable surface is `width` x `height`
    /// pixels.
    ///
    /// # Safety
    ///
    /// `gl` must be current on the calling thread and must stay current for
    /// every later call into this context.
    pub unsafe fn new(gl: Arc<glow::Context>, width: u32, height: u32) -> Result<Self> {
        unsafe {
            // Core profile requires a bound VAO for vertex attribute state;
            // one context-wide VAO mirrors the WebGL-style global state the
            // rest of the crate assumes.
            let vao = gl
                .create_vertex_array()
                .map_err(RenderError::Context)?;
            gl.bind_vertex_array(Some(vao));
            // Rows of tightly packed RGB bytes are not 4-byte aligned.
            gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, 1);
        }
        Ok(Self {
            gl,
            size: Cell::new((width, height)),
            programs: RefCell::new(Vec::new()),
            buffers: RefCell::new(Vec::new()),
            textures: RefCell::new(Vec::new()),
            framebuffers: RefCell::new(Vec::new()),
            active: Cell::new(None),
        })
    }

    /// Tell the context the drawable surface was resized.
    pub fn resize(&self, width: u32, height: u32) {
        self.size.set((width, height));
    }

    fn compile_stage(&self, stage: ShaderStage, source: &str) -> Result<glow::Shader> {
        let gl = &self.gl;
        let kind = match stage {
            ShaderStage::Vertex => glow::VERTEX_SHADER,
            ShaderStage::Fragment => glow::FRAGMENT_SHADER,
        };
        unsafe {
            let shader = gl.create_shader(kind).map_err(RenderError::Context)?;
            gl.shader_source(shader, source);
            gl.compile_shader(shader);
            if !gl.get_shader_compile_status(shader) {
                let log = gl.get_shader_info_log(shader);
                gl.delete_shader(shader);
                return Err(RenderError::Compile { stage, log });
            }
            Ok(shader)
        }
    }

    fn tex_parameter(param: TexParameter) -> u32 {
        match param {
            TexParameter::MinFilter => glow::TEXTURE_MIN_FILTER,
            TexParameter::MagFilter => glow::TEXTURE_MAG_FILTER,
            TexParameter::WrapS => glow::TEXTURE_WRAP_S,
            TexParameter::WrapT => glow::TEXTURE_WRAP_T,
        }
    }

    fn tex_value(value: TexValue) -> i32 {
        // GL constant values are small enough that the cast is always safe.
        let v = match value {
            TexValue::Nearest => glow::NEAREST,
            TexValue::Linear => glow::LINEAR,
            TexValue::LinearMipmapLinear => glow::LINEAR_MIPMAP_LINEAR,
            TexValue::Repeat => glow::REPEAT,
            TexValue::ClampToEdge => glow::CLAMP_TO_EDGE,
        };
        v as i32
    }

    fn uniform_type_of(gl_type: u32) -> Option<UniformType> {
        match gl_type {
            glow::FLOAT => Some(UniformType::Float),
            glow::INT => Some(UniformType::Int),
            glow::BOOL => Some(UniformType::Bool),
            glow::FLOAT_VEC2 => Some(UniformType::Vec2),
            glow::FLOAT_VEC3 => Some(UniformType::Vec3),
            glow::FLOAT_VEC4 => Some(UniformType::Vec4),
            glow::FLOAT_MAT2 => Some(UniformType::Mat2),
            glow::FLOAT_MAT3 => Some(UniformType::Mat3),
            glow::FLOAT_MAT4 => Some(UniformType::Mat4),
            glow::SAMPLER_2D => Some(UniformType::Sampler2D),
            _ => None,
        }
    }

    fn with_texture<R>(&self, texture: TextureId, f: impl FnOnce(&glow::Context) -> R) -> R {
        let raw = self.textures.borrow()[texture.0 as usize];
        unsafe {
            self.gl.bind_texture(glow::TEXTURE_2D, Some(raw));
        }
        f(&self.gl)
    }
}

impl RenderingContext for GlContext {
    fn surface_size(&self) -> (u32, u32) {
        self.size.get()
    }

    fn create_program(&self, vertex_source: &str, fragment_source: &str) -> Result<ProgramId> {
        let gl = &self.gl;
        let vertex = self.compile_stage(ShaderStage::Vertex, vertex_source)?;
        let fragment = match self.compile_stage(ShaderStage::Fragment, fragment_source) {
            Ok(shader) => shader,
            Err(e) => {
                unsafe { gl.delete_shader(vertex) };
                return Err(e);
            }
        };

        let raw = unsafe {
            let program = gl.create_program().map_err(RenderError::Context)?;
            gl.attach_shader(program, vertex);
            gl.attach_shader(program, fragment);
            gl.link_program(program);
            gl.detach_shader(program, vertex);
            gl.detach_shader(program, fragment);
            gl.delete_shader(vertex);
            gl.delete_shader(fragment);
            if !gl.get_program_link_status(program) {
                let log = gl.get_program_info_log(program);
                gl.delete_program(program);
                return Err(RenderError::Link { log });
            }
            program
        };

        // Build the reflection tables once, at link time. Struct and array
        // uniforms are enumerated member by member ("spheres[1].radius"), so
        // a flat name map is all that is needed.
        let mut uniforms = HashMap::new();
        let mut slots = Vec::new();
        let mut attributes = HashMap::new();
        unsafe {
            for i in 0..gl.get_active_uniforms(raw) {
                let Some(active) = gl.get_active_uniform(raw, i) else {
                    continue;
                };
                let Some(ty) = Self::uniform_type_of(active.utype) else {
                    warn!("uniform {} has unsupported GL type {:#x}", active.name, active.utype);
                    continue;
                };
                if let Some(location) = gl.get_uniform_location(raw, &active.name) {
                    let slot = slots.len() as u32;
                    slots.push(location);
                    uniforms.insert(active.name.clone(), (slot, ty));
                }
            }
            for i in 0..gl.get_active_attributes(raw) {
                let Some(active) = gl.get_active_attribute(raw, i) else {
                    continue;
                };
                if let Some(location) = gl.get_attrib_location(raw, &active.name) {
                    attributes.insert(active.name.clone(), location);
                }
            }
        }

        let mut programs = self.programs.borrow_mut();
        programs.push(ProgramEntry {
            raw,
            uniforms,
            slots,
            attributes,
        });
        Ok(ProgramId(programs.len() as u32 - 1))
    }

    fn use_program(&self, program: ProgramId) {
        let raw = self.programs.borrow()[program.0 as usize].raw;
        unsafe {
            self.gl.use_program(Some(raw));
        }
        self.active.set(Some(program));
    }

    fn active_program(&self) -> Option<ProgramId> {
        self.active.get()
    }

    fn uniform_info(&self, program: ProgramId, name: &str) -> Option<UniformInfo> {
        let programs = self.programs.borrow();
        let (slot, ty) = *programs[program.0 as usize].uniforms.get(name)?;
        Some(UniformInfo {
            location: UniformLocation(slot),
            ty,
        })
    }

    fn write_uniform(&self, program: ProgramId, location: UniformLocation, value: &UniformValue) {
        let programs = self.programs.borrow();
        let loc = programs[program.0 as usize].slots[location.0 as usize].clone();
        let gl = &self.gl;
        unsafe {
            match value {
                UniformValue::Float(v) => gl.uniform_1_f32(Some(&loc), *v),
                UniformValue::Int(v) => gl.uniform_1_i32(Some(&loc), *v),
                UniformValue::Bool(v) => gl.uniform_1_i32(Some(&loc), i32::from(*v)),
                UniformValue::Vec2(v) => gl.uniform_2_f32(Some(&loc), v.x, v.y),
                UniformValue::Vec3(v) => gl.uniform_3_f32(Some(&loc), v.x, v.y, v.z),
                UniformValue::Vec4(v) => gl.uniform_4_f32(Some(&loc), v.x, v.y, v.z, v.w),
                UniformValue::Mat2(m) => {
                    let m: &[f32; 4] = m.as_ref();
                    gl.uniform_matrix_2_f32_slice(Some(&loc), false, m)
                }
                UniformValue::Mat3(m) => {
                    let m: &[f32; 9] = m.as_ref();
                    gl.uniform_matrix_3_f32_slice(Some(&loc), false, m)
                }
                UniformValue::Mat4(m) => {
                    let m: &[f32; 16] = m.as_ref();
                    gl.uniform_matrix_4_f32_slice(Some(&loc), false, m)
                }
            }
        }
    }

    fn attribute_location(&self, program: ProgramId, name: &str) -> Option<u32> {
        let programs = self.programs.borrow();
        programs[program.0 as usize].attributes.get(name).copied()
    }

    fn max_texture_units(&self) -> u32 {
        let units = unsafe { self.gl.get_parameter_i32(glow::MAX_COMBINED_TEXTURE_IMAGE_UNITS) };
        units.max(0) as u32
    }

    fn create_attribute_buffer(&self, data: &[f32]) -> Result<BufferId> {
        let gl = &self.gl;
        let raw = unsafe {
            let buffer = gl.create_buffer().map_err(RenderError::Context)?;
            gl.bind_buffer(glow::ARRAY_BUFFER, Some(buffer));
            gl.buffer_data_u8_slice(glow::ARRAY_BUFFER, bytemuck::cast_slice(data), glow::STATIC_DRAW);
            buffer
        };
        let mut buffers = self.buffers.borrow_mut();
        buffers.push(raw);
        Ok(BufferId(buffers.len() as u32 - 1))
    }

    fn create_index_buffer(&self, indices: &[u16]) -> Result<BufferId> {
        let gl = &self.gl;
        let raw = unsafe {
            let buffer = gl.create_buffer().map_err(RenderError::Context)?;
            gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(buffer));
            gl.buffer_data_u8_slice(
                glow::ELEMENT_ARRAY_BUFFER,
                bytemuck::cast_slice(indices),
                glow::STATIC_DRAW,
            );
            buffer
        };
        let mut buffers = self.buffers.borrow_mut();
        buffers.push(raw);
        Ok(BufferId(buffers.len() as u32 - 1))
    }

    fn bind_attribute(&self, buffer: BufferId, location: u32, num_components: u32) {
        let raw = self.buffers.borrow()[buffer.0 as usize];
        let gl = &self.gl;
        unsafe {
            gl.bind_buffer(glow::ARRAY_BUFFER, Some(raw));
            gl.vertex_attrib_pointer_f32(location, num_components as i32, glow::FLOAT, false, 0, 0);
            gl.enable_vertex_attrib_array(location);
        }
    }

    fn bind_indices(&self, buffer: BufferId) {
        let raw = self.buffers.borrow()[buffer.0 as usize];
        unsafe {
            self.gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(raw));
        }
    }

    fn create_texture(&self) -> Result<TextureId> {
        let raw = unsafe { self.gl.create_texture().map_err(RenderError::Context)? };
        let mut textures = self.textures.borrow_mut();
        textures.push(raw);
        Ok(TextureId(textures.len() as u32 - 1))
    }

    fn upload_texture(&self, texture: TextureId, width: u32, height: u32, pixels: Option<&[u8]>) {
        self.with_texture(texture, |gl| unsafe {
            gl.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                RGB8_INTERNAL_FORMAT,
                width as i32,
                height as i32,
                0,
                glow::RGB,
                glow::UNSIGNED_BYTE,
                PixelUnpackData::Slice(pixels),
            );
        });
    }

    fn generate_mipmaps(&self, texture: TextureId) {
        self.with_texture(texture, |gl| unsafe {
            gl.generate_mipmap(glow::TEXTURE_2D);
        });
    }

    fn set_texture_parameter(&self, texture: TextureId, param: TexParameter, value: TexValue) {
        self.with_texture(texture, |gl| unsafe {
            gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                Self::tex_parameter(param),
                Self::tex_value(value),
            );
        });
    }

    fn bind_texture(&self, unit: u32, texture: TextureId) {
        let raw = self.textures.borrow()[texture.0 as usize];
        let gl = &self.gl;
        unsafe {
            gl.active_texture(glow::TEXTURE0 + unit);
            gl.bind_texture(glow::TEXTURE_2D, Some(raw));
        }
    }

    fn create_framebuffer(&self) -> Result<FramebufferId> {
        let raw = unsafe { self.gl.create_framebuffer().map_err(RenderError::Context)? };
        let mut framebuffers = self.framebuffers.borrow_mut();
        framebuffers.push(raw);
        Ok(FramebufferId(framebuffers.len() as u32 - 1))
    }

    fn attach_color_target(&self, framebuffer: FramebufferId, texture: TextureId) {
        let fb = self.framebuffers.borrow()[framebuffer.0 as usize];
        let tex = self.textures.borrow()[texture.0 as usize];
        let gl = &self.gl;
        unsafe {
            gl.bind_framebuffer(glow::FRAMEBUFFER, Some(fb));
            gl.framebuffer_texture_2d(
                glow::FRAMEBUFFER,
                glow::COLOR_ATTACHMENT0,
                glow::TEXTURE_2D,
                Some(tex),
                0,
            );
            gl.bind_framebuffer(glow::FRAMEBUFFER, None);
        }
    }

    fn bind_framebuffer(&self, framebuffer: Option<FramebufferId>) {
        let raw = framebuffer.map(|f| self.framebuffers.borrow()[f.0 as usize]);
        unsafe {
            self.gl.bind_framebuffer(glow::FRAMEBUFFER, raw);
        }
    }

    fn set_depth_test(&self, enabled: bool) {
        let gl = &self.gl;
        unsafe {
            if enabled {
                gl.enable(glow::DEPTH_TEST);
                gl.depth_func(glow::LESS);
            } else {
                gl.disable(glow::DEPTH_TEST);
            }
        }
    }

    fn clear(&self, color: [f32; 4]) {
        let gl = &self.gl;
        unsafe {
            gl.clear_color(color[0], color[1], color[2], color[3]);
            gl.clear(glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT);
        }
    }

    fn draw_triangle_strip(&self, num_vertices: u32) {
        unsafe {
            self.gl.draw_arrays(glow::TRIANGLE_STRIP, 0, num_vertices as i32);
        }
    }

    fn draw_indexed_triangles(&self, num_indices: u32) {
        unsafe {
            self.gl
                .draw_elements(glow::TRIANGLES, num_indices as i32, glow::UNSIGNED_SHORT, 0);
        }
    }
}
