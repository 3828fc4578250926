//! Shader program wrapper with name-based, type-checked uniform access.
//!
//! A [`ShaderProgram`] owns one linked program on its context and exposes the
//! uniform interface the rest of the crate uses:
//!
//! - `activate` makes the program current, skipping the GL call when the
//!   context reports it already bound,
//! - `set_uniform` resolves a uniform by name and checks the value's type
//!   against the shader's declaration before anything reaches the GPU,
//! - `set_texture` binds a texture to a unit and points a sampler uniform at
//!   it, quietly skipping textures whose pixel data has not arrived yet.

use std::rc::Rc;

use log::{debug, warn};

use crate::context::{ProgramId, RenderingContext, UniformType, UniformValue};
use crate::error::{RenderError, Result};
use crate::resources::texture::Texture2D;

pub struct ShaderProgram {
    ctx: Rc<dyn RenderingContext>,
    id: ProgramId,
}

impl std::fmt::Debug for ShaderProgram {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShaderProgram")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

impl ShaderProgram {
    /// Compile `vertex_source` and `fragment_source` and link them.
    ///
    /// Fails with [`RenderError::Compile`] naming the offending stage, or
    /// [`RenderError::Link`]; in both cases the compiler/linker log is
    /// carried in the error.
    pub fn new(
        ctx: Rc<dyn RenderingContext>,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<Self> {
        let id = ctx.create_program(vertex_source, fragment_source)?;
        Ok(Self { ctx, id })
    }

    pub fn id(&self) -> ProgramId {
        self.id
    }

    /// Make this program the active one. No-op when it already is.
    pub fn activate(&self) {
        if self.ctx.active_program() != Some(self.id) {
            self.ctx.use_program(self.id);
        }
    }

    /// Set the uniform `name` to `value`.
    ///
    /// Returns `Ok(true)` when the value was uploaded. A uniform that is not
    /// active in the program yields `Ok(false)`; with `warn_if_unused` set a
    /// warning is logged (scene-wide uniforms like the normal matrix are set
    /// on every program and legitimately miss some). A type mismatch between
    /// `value` and the shader declaration is an
    /// [`RenderError::InvalidUniformType`] and nothing is written.
    pub fn set_uniform(
        &self,
        name: &str,
        value: UniformValue,
        warn_if_unused: bool,
    ) -> Result<bool> {
        let Some(info) = self.ctx.uniform_info(self.id, name) else {
            if warn_if_unused {
                warn!("uniform {name} is not used in the shader program");
            }
            return Ok(false);
        };
        let provided = value.uniform_type();
        if info.ty != provided {
            return Err(RenderError::InvalidUniformType {
                name: name.to_owned(),
                expected: info.ty,
                provided,
            });
        }
        self.activate();
        self.ctx.write_uniform(self.id, info.location, &value);
        Ok(true)
    }

    /// Bind `texture` to texture unit `unit` and set the sampler uniform
    /// `name` to that unit.
    ///
    /// A texture still waiting for its image data is skipped with
    /// `Ok(false)`; the caller retries next frame. A unit at or beyond the
    /// context's limit is a hard error. An absent sampler uniform behaves
    /// like in [`set_uniform`](Self::set_uniform).
    pub fn set_texture(
        &self,
        name: &str,
        unit: u32,
        texture: &Texture2D,
        warn_if_unused: bool,
    ) -> Result<bool> {
        if !texture.is_loaded() {
            debug!("texture for sampler {name} not yet loaded, skipping bind");
            return Ok(false);
        }
        let max = self.ctx.max_texture_units();
        if unit >= max {
            return Err(RenderError::TextureUnitOutOfRange { unit, max });
        }
        let Some(info) = self.ctx.uniform_info(self.id, name) else {
            if warn_if_unused {
                warn!("sampler {name} is not used in the shader program");
            }
            return Ok(false);
        };
        if info.ty != UniformType::Sampler2D {
            return Err(RenderError::InvalidUniformType {
                name: name.to_owned(),
                expected: info.ty,
                provided: UniformType::Sampler2D,
            });
        }
        self.ctx.bind_texture(unit, texture.id());
        self.activate();
        self.ctx
            .write_uniform(self.id, info.location, &UniformValue::Int(unit as i32));
        Ok(true)
    }

    pub(crate) fn context(&self) -> &Rc<dyn RenderingContext> {
        &self.ctx
    }
}
