//! Shader registry and program builders.
//!
//! GLSL sources are compiled into the binary with `include_str!` and looked
//! up by file name through [`shader_source`]. The path-tracing fragment
//! shader is a template of sorts: the scene's shape (sphere count, mesh
//! present or not) is fixed at build time by splicing a `#define` block in
//! right after the `#version` line, so the compiled shader contains exactly
//! the intersection loops the scene needs.

use std::rc::Rc;

use crate::context::RenderingContext;
use crate::error::{RenderError, Result, ShaderStage};
use crate::program::ShaderProgram;

const PATHTRACING_VERT: &str = include_str!("../../shaders/pathtracing.vert");
const PATHTRACING_FRAG: &str = include_str!("../../shaders/pathtracing.frag");
const DISPLAY_VERT: &str = include_str!("../../shaders/display.vert");
const DISPLAY_FRAG: &str = include_str!("../../shaders/display.frag");

/// Look up a built-in shader source by file name.
pub fn shader_source(name: &str) -> Option<&'static str> {
    match name {
        "pathtracing.vert" => Some(PATHTRACING_VERT),
        "pathtracing.frag" => Some(PATHTRACING_FRAG),
        "display.vert" => Some(DISPLAY_VERT),
        "display.frag" => Some(DISPLAY_FRAG),
        _ => None,
    }
}

/// Compile-time shape of the path-tracing shader.
#[derive(Clone, Copy, Debug)]
pub struct TraceConfig {
    pub num_spheres: u32,
    pub has_mesh: bool,
    pub mesh_sampler_width: u32,
}

impl TraceConfig {
    fn defines(&self) -> String {
        let mut block = format!("#define NUM_SPHERES {}\n", self.num_spheres);
        if self.has_mesh {
            block.push_str("#define HAS_MESH\n");
            block.push_str(&format!(
                "#define MESH_SAMPLER_WIDTH {}\n",
                self.mesh_sampler_width
            ));
        }
        block
    }
}

/// Insert `defines` into `source` directly after the `#version` line.
///
/// GLSL requires `#version` to be the very first line, so a source that does
/// not start with one has nowhere valid to put the block; that is rejected
/// here rather than as a cryptic compiler diagnostic later.
fn splice_defines(source: &str, defines: &str) -> Result<String> {
    let end = source
        .find('\n')
        .filter(|_| source.starts_with("#version"))
        .ok_or_else(|| RenderError::Compile {
            stage: ShaderStage::Fragment,
            log: "shader source must start with a #version line".to_owned(),
        })?;
    Ok(format!(
        "{}\n{}{}",
        &source[..end],
        defines,
        &source[end + 1..]
    ))
}

/// Build the path-tracing program for the given scene shape.
pub fn pathtracing_program(
    ctx: Rc<dyn RenderingContext>,
    config: &TraceConfig,
) -> Result<ShaderProgram> {
    let fragment = splice_defines(PATHTRACING_FRAG, &config.defines())?;
    ShaderProgram::new(ctx, PATHTRACING_VERT, &fragment)
}

/// Build the blit/tone-map program that puts the accumulation texture on
/// screen.
pub fn display_program(ctx: Rc<dyn RenderingContext>) -> Result<ShaderProgram> {
    ShaderProgram::new(ctx, DISPLAY_VERT, DISPLAY_FRAG)
}
