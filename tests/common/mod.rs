//! Shared test support: an in-memory rendering context that records every
//! call, so scene logic can be verified without a GPU.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use raymond::context::{
    BufferId, FramebufferId, ProgramId, RenderingContext, TexParameter, TexValue, TextureId,
    UniformInfo, UniformLocation, UniformType, UniformValue,
};
use raymond::error::{RenderError, Result, ShaderStage};

/// One recorded context call, for asserting call ordering.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    UseProgram(u32),
    WriteUniform { program: u32, name: String },
    BindFramebuffer(Option<u32>),
    AttachColor { framebuffer: u32, texture: u32 },
    Clear,
    DrawTriangleStrip(u32),
    DrawIndexedTriangles(u32),
    BindTexture { unit: u32, texture: u32 },
    UploadTexture { texture: u32, with_pixels: bool },
}

#[derive(Default)]
pub struct MockContext {
    size: (u32, u32),
    num_programs: Cell<u32>,
    num_buffers: Cell<u32>,
    num_textures: Cell<u32>,
    num_framebuffers: Cell<u32>,
    active: Cell<Option<ProgramId>>,
    /// (program, name) -> slot; slot -> (program, name) in `slot_names`.
    locations: RefCell<HashMap<(u32, String), u32>>,
    slot_names: RefCell<Vec<String>>,
    /// Per-name reflection overrides; `None` marks the uniform absent.
    declared: RefCell<HashMap<String, Option<UniformType>>>,
    pub events: RefCell<Vec<Event>>,
    pub writes: RefCell<Vec<(u32, String, UniformValue)>>,
}

impl MockContext {
    pub fn new(width: u32, height: u32) -> Self {
        // Make the crate's log output visible when a test fails.
        let _ = env_logger::builder().is_test(true).try_init();
        Self {
            size: (width, height),
            ..Self::default()
        }
    }

    /// Override the reflected type of `name`; `None` makes the uniform
    /// absent from every program.
    pub fn declare_uniform(&self, name: &str, ty: Option<UniformType>) {
        self.declared.borrow_mut().insert(name.to_owned(), ty);
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.borrow().clone()
    }

    pub fn writes_of(&self, name: &str) -> Vec<UniformValue> {
        self.writes
            .borrow()
            .iter()
            .filter(|(_, n, _)| n == name)
            .map(|(_, _, v)| *v)
            .collect()
    }

    pub fn last_write(&self, name: &str) -> Option<UniformValue> {
        self.writes_of(name).last().copied()
    }

    pub fn num_texture_uploads(&self) -> usize {
        self.events
            .borrow()
            .iter()
            .filter(|e| matches!(e, Event::UploadTexture { .. }))
            .count()
    }

    /// Default reflection table covering the uniform names the built-in
    /// shaders declare, including struct-array members.
    fn infer(name: &str) -> Option<UniformType> {
        match name {
            "modelViewMatrix" | "projectionMatrix" => Some(UniformType::Mat4),
            "normalMatrix" => Some(UniformType::Mat3),
            "secondsSinceStart" | "textureWeight" => Some(UniformType::Float),
            "texture0" | "meshData" => Some(UniformType::Sampler2D),
            "eyePosition" | "La" | "roomMinCorner" | "roomMaxCorner" => Some(UniformType::Vec3),
            "meshOnePixel" => Some(UniformType::Vec2),
            "meshNumTriangles" => Some(UniformType::Int),
            "toneMapping" => Some(UniformType::Bool),
            _ if name.ends_with(".center") || name.ends_with(".Le") || name.ends_with(".Kd") => {
                Some(UniformType::Vec3)
            }
            _ if name.ends_with(".radius") => Some(UniformType::Float),
            _ if name.contains(".is") => Some(UniformType::Bool),
            _ => None,
        }
    }

    fn push(&self, event: Event) {
        self.events.borrow_mut().push(event);
    }
}

impl RenderingContext for MockContext {
    fn surface_size(&self) -> (u32, u32) {
        self.size
    }

    fn create_program(&self, vertex_source: &str, fragment_source: &str) -> Result<ProgramId> {
        // "#error" in a source stands in for any compiler failure.
        for (stage, source) in [
            (ShaderStage::Vertex, vertex_source),
            (ShaderStage::Fragment, fragment_source),
        ] {
            if source.contains("#error") {
                return Err(RenderError::Compile {
                    stage,
                    log: format!("0:1: '#error' : {stage} stage rejected"),
                });
            }
        }
        let id = self.num_programs.get();
        self.num_programs.set(id + 1);
        Ok(ProgramId(id))
    }

    fn use_program(&self, program: ProgramId) {
        self.active.set(Some(program));
        self.push(Event::UseProgram(program.0));
    }

    fn active_program(&self) -> Option<ProgramId> {
        self.active.get()
    }

    fn uniform_info(&self, program: ProgramId, name: &str) -> Option<UniformInfo> {
        let ty = match self.declared.borrow().get(name) {
            Some(over) => (*over)?,
            None => Self::infer(name)?,
        };
        let key = (program.0, name.to_owned());
        let mut locations = self.locations.borrow_mut();
        let mut slot_names = self.slot_names.borrow_mut();
        let slot = *locations.entry(key).or_insert_with(|| {
            slot_names.push(name.to_owned());
            slot_names.len() as u32 - 1
        });
        Some(UniformInfo {
            location: UniformLocation(slot),
            ty,
        })
    }

    fn write_uniform(&self, program: ProgramId, location: UniformLocation, value: &UniformValue) {
        let name = self.slot_names.borrow()[location.0 as usize].clone();
        self.push(Event::WriteUniform {
            program: program.0,
            name: name.clone(),
        });
        self.writes
            .borrow_mut()
            .push((program.0, name, *value));
    }

    fn attribute_location(&self, _program: ProgramId, name: &str) -> Option<u32> {
        match name {
            "vertexPosition" => Some(0),
            "vertexTexCoords" => Some(1),
            "vertexNormal" => Some(2),
            _ => None,
        }
    }

    fn max_texture_units(&self) -> u32 {
        8
    }

    fn create_attribute_buffer(&self, _data: &[f32]) -> Result<BufferId> {
        let id = self.num_buffers.get();
        self.num_buffers.set(id + 1);
        Ok(BufferId(id))
    }

    fn create_index_buffer(&self, _indices: &[u16]) -> Result<BufferId> {
        self.create_attribute_buffer(&[])
    }

    fn bind_attribute(&self, _buffer: BufferId, _location: u32, _num_components: u32) {}

    fn bind_indices(&self, _buffer: BufferId) {}

    fn create_texture(&self) -> Result<TextureId> {
        let id = self.num_textures.get();
        self.num_textures.set(id + 1);
        Ok(TextureId(id))
    }

    fn upload_texture(&self, texture: TextureId, _width: u32, _height: u32, pixels: Option<&[u8]>) {
        self.push(Event::UploadTexture {
            texture: texture.0,
            with_pixels: pixels.is_some(),
        });
    }

    fn generate_mipmaps(&self, _texture: TextureId) {}

    fn set_texture_parameter(&self, _texture: TextureId, _param: TexParameter, _value: TexValue) {}

    fn bind_texture(&self, unit: u32, texture: TextureId) {
        self.push(Event::BindTexture {
            unit,
            texture: texture.0,
        });
    }

    fn create_framebuffer(&self) -> Result<FramebufferId> {
        let id = self.num_framebuffers.get();
        self.num_framebuffers.set(id + 1);
        Ok(FramebufferId(id))
    }

    fn attach_color_target(&self, framebuffer: FramebufferId, texture: TextureId) {
        self.push(Event::AttachColor {
            framebuffer: framebuffer.0,
            texture: texture.0,
        });
    }

    fn bind_framebuffer(&self, framebuffer: Option<FramebufferId>) {
        self.push(Event::BindFramebuffer(framebuffer.map(|f| f.0)));
    }

    fn set_depth_test(&self, _enabled: bool) {}

    fn clear(&self, _color: [f32; 4]) {
        self.push(Event::Clear);
    }

    fn draw_triangle_strip(&self, num_vertices: u32) {
        self.push(Event::DrawTriangleStrip(num_vertices));
    }

    fn draw_indexed_triangles(&self, num_indices: u32) {
        self.push(Event::DrawIndexedTriangles(num_indices));
    }
}
