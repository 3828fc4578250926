//! The stage: a full-screen quad at z = -2.
//!
//! Both render passes rasterize this single quad; the path tracer fires one
//! primary ray per covered fragment, and the display pass uses it to blit
//! the accumulation texture. Drawn as a four-vertex triangle strip.

use cgmath::Matrix4;

use crate::context::RenderingContext;
use crate::data_structures::scene_graph::Drawable;
use crate::error::{RenderError, Result};
use crate::program::ShaderProgram;
use crate::vbo::{Attribute, Indices};

const POSITIONS: [f32; 12] = [
    -1.0, -1.0, -2.0, //
    1.0, -1.0, -2.0, //
    -1.0, 1.0, -2.0, //
    1.0, 1.0, -2.0,
];

const TEX_COORDS: [f32; 8] = [
    0.0, 0.0, //
    1.0, 0.0, //
    0.0, 1.0, //
    1.0, 1.0,
];

pub struct Stage {
    positions: Attribute,
    tex_coords: Attribute,
}

impl Stage {
    pub fn new(ctx: &dyn RenderingContext) -> Result<Self> {
        Ok(Self {
            positions: Attribute::new(ctx, 3, &POSITIONS)?,
            tex_coords: Attribute::new(ctx, 2, &TEX_COORDS)?,
        })
    }
}

impl Drawable for Stage {
    fn draw(
        &self,
        ctx: &dyn RenderingContext,
        program: Option<&ShaderProgram>,
        _model_view: Matrix4<f32>,
    ) -> Result<()> {
        let program = program.ok_or_else(|| RenderError::MissingProgram {
            node: "Stage".to_owned(),
        })?;
        self.positions.bind(ctx, program, "vertexPosition", true);
        self.tex_coords.bind(ctx, program, "vertexTexCoords", false);
        ctx.draw_triangle_strip(self.positions.num_vertices());
        Ok(())
    }
}

/// An indexed triangle mesh drawn through the scene graph, for hosts that
/// mix rasterized geometry into the scene alongside the traced stage.
pub struct IndexedMesh {
    positions: Attribute,
    normals: Option<Attribute>,
    indices: Indices,
}

impl IndexedMesh {
    pub fn new(
        ctx: &dyn RenderingContext,
        positions: &[f32],
        normals: Option<&[f32]>,
        indices: &[u16],
    ) -> Result<Self> {
        Ok(Self {
            positions: Attribute::new(ctx, 3, positions)?,
            normals: normals.map(|n| Attribute::new(ctx, 3, n)).transpose()?,
            indices: Indices::new(ctx, indices)?,
        })
    }
}

impl Drawable for IndexedMesh {
    fn draw(
        &self,
        ctx: &dyn RenderingContext,
        program: Option<&ShaderProgram>,
        _model_view: Matrix4<f32>,
    ) -> Result<()> {
        let program = program.ok_or_else(|| RenderError::MissingProgram {
            node: "IndexedMesh".to_owned(),
        })?;
        self.positions.bind(ctx, program, "vertexPosition", true);
        if let Some(normals) = &self.normals {
            normals.bind(ctx, program, "vertexNormal", false);
        }
        self.indices.bind(ctx);
        ctx.draw_indexed_triangles(self.indices.num_indices());
        Ok(())
    }
}
