//! Vertex buffer objects: per-vertex float attributes and u16 index lists.

use log::warn;

use crate::context::{BufferId, RenderingContext};
use crate::error::{RenderError, Result};
use crate::program::ShaderProgram;

/// A per-vertex float attribute buffer (positions, normals, texture
/// coordinates) with a fixed number of components per vertex.
#[derive(Debug)]
pub struct Attribute {
    buffer: BufferId,
    num_components: u32,
    num_vertices: u32,
}

impl Attribute {
    /// Upload `data` as an attribute buffer of `num_components` floats per
    /// vertex. The data length must divide evenly into vertices.
    pub fn new(ctx: &dyn RenderingContext, num_components: u32, data: &[f32]) -> Result<Self> {
        if num_components == 0 || data.len() % num_components as usize != 0 {
            return Err(RenderError::InvalidLayout {
                len: data.len(),
                num_components,
            });
        }
        let buffer = ctx.create_attribute_buffer(data)?;
        Ok(Self {
            buffer,
            num_components,
            num_vertices: (data.len() / num_components as usize) as u32,
        })
    }

    pub fn num_vertices(&self) -> u32 {
        self.num_vertices
    }

    /// Bind this buffer to the attribute `name` of `program`.
    ///
    /// The program is activated first so the location lookup refers to the
    /// program actually drawn with. An attribute the shader does not declare
    /// (or that the compiler optimized out) is skipped; `warn_if_unused`
    /// controls whether that is logged.
    pub fn bind(
        &self,
        ctx: &dyn RenderingContext,
        program: &ShaderProgram,
        name: &str,
        warn_if_unused: bool,
    ) {
        program.activate();
        match ctx.attribute_location(program.id(), name) {
            Some(location) => ctx.bind_attribute(self.buffer, location, self.num_components),
            None => {
                if warn_if_unused {
                    warn!("attribute {name} is not used in the shader program");
                }
            }
        }
    }
}

/// An element index buffer for indexed triangle draws.
pub struct Indices {
    buffer: BufferId,
    num_indices: u32,
}

impl Indices {
    pub fn new(ctx: &dyn RenderingContext, indices: &[u16]) -> Result<Self> {
        let buffer = ctx.create_index_buffer(indices)?;
        Ok(Self {
            buffer,
            num_indices: indices.len() as u32,
        })
    }

    pub fn num_indices(&self) -> u32 {
        self.num_indices
    }

    pub fn bind(&self, ctx: &dyn RenderingContext) {
        ctx.bind_indices(self.buffer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attribute_rejects_ragged_data() {
        let ctx = crate::context::test_support::NullContext::default();
        let err = Attribute::new(&ctx, 3, &[0.0; 8]).unwrap_err();
        assert!(matches!(
            err,
            RenderError::InvalidLayout {
                len: 8,
                num_components: 3
            }
        ));
    }

    #[test]
    fn attribute_counts_vertices() {
        let ctx = crate::context::test_support::NullContext::default();
        let attr = Attribute::new(&ctx, 3, &[0.0; 12]).unwrap();
        assert_eq!(attr.num_vertices(), 4);
    }
}
