//! Scene orchestration: programs, accumulation targets, and the two-pass
//! progressive draw.
//!
//! Each `draw` renders one new noisy path-traced sample of the world and
//! folds it into the running average. The accumulation lives in a ping-pong
//! pair of textures: the trace pass samples the previous average from one
//! texture while rendering the new average into the other through the
//! framebuffer, the display pass blits the freshly written texture to the
//! screen, then the pair swaps roles. The blend weight is
//! `n / (n + 1)` for sample counter `n`, so the very first sample replaces
//! whatever was in the target and every later one nudges the mean.
//!
//! The counter only resets through [`Scene::reset_sampling`]. Any mutation
//! that changes what a pixel should converge to (camera, visibility, node
//! transforms) must be followed by a reset, otherwise stale samples keep
//! their weight.

use std::cell::Cell;
use std::rc::Rc;

use cgmath::EuclideanSpace;
use log::info;

use crate::camera::Camera;
use crate::context::{FramebufferId, RenderingContext, TexParameter, TexValue, UniformValue};
use crate::data_structures::scene_desc::{Material, SceneDescription};
use crate::data_structures::scene_graph::Drawable;
use crate::data_structures::scene_graph::SceneNode;
use crate::data_structures::stage::Stage;
use crate::error::Result;
use crate::pipelines::{self, TraceConfig};
use crate::program::ShaderProgram;
use crate::resources::mesh::pack_mesh;
use crate::resources::texture::Texture2D;

/// Width of the mesh data texture. Indices are single bytes, so no more
/// than 256 vertices are addressable anyway.
pub const MESH_SAMPLER_WIDTH: u32 = 256;
/// Three rows are needed (indices, positions, normals); four keeps the
/// height a power of two.
pub const MESH_SAMPLER_HEIGHT: u32 = 4;

/// Named per-frame toggles, meant to be flipped by whatever UI or input
/// layer the host wires up. Consulted at the start of every draw.
#[derive(Clone, Copy, Debug)]
pub struct DrawOptions {
    pub show_stage: bool,
    pub tone_mapping: bool,
}

impl Default for DrawOptions {
    fn default() -> Self {
        Self {
            show_stage: true,
            tone_mapping: true,
        }
    }
}

pub struct Scene {
    ctx: Rc<dyn RenderingContext>,
    pub camera: Camera,
    pub draw_options: DrawOptions,
    prog_pathtracing: Rc<ShaderProgram>,
    prog_display: Rc<ShaderProgram>,
    framebuffer: FramebufferId,
    targets: [Texture2D; 2],
    read_index: Cell<usize>,
    mesh_texture: Option<Texture2D>,
    mesh_num_triangles: u32,
    world: Rc<SceneNode>,
    stage_node: Rc<SceneNode>,
    sample_counter: Cell<u32>,
}

impl std::fmt::Debug for Scene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scene")
            .field("camera", &self.camera)
            .field("draw_options", &self.draw_options)
            .field("mesh_num_triangles", &self.mesh_num_triangles)
            .field("sample_counter", &self.sample_counter)
            .finish_non_exhaustive()
    }
}

impl Scene {
    /// Build programs, accumulation targets and the world graph for
    /// `description`, and upload all scene uniforms.
    ///
    /// The mesh is packed before any GPU resource is created, so an
    /// oversized mesh fails the whole construction without leaving a
    /// texture behind.
    pub fn new(ctx: Rc<dyn RenderingContext>, description: &SceneDescription) -> Result<Self> {
        let packed_mesh = description
            .mesh
            .as_ref()
            .map(|mesh| pack_mesh(mesh, MESH_SAMPLER_WIDTH, MESH_SAMPLER_HEIGHT))
            .transpose()?;
        let mesh_num_triangles = description
            .mesh
            .as_ref()
            .map_or(0, |mesh| mesh.num_triangles());

        let (width, height) = ctx.surface_size();
        let framebuffer = ctx.create_framebuffer()?;

        // Accumulation texels are averages, not images; filtering them
        // would smear samples across pixels.
        let targets = [
            Texture2D::empty(Rc::clone(&ctx), width, height)?,
            Texture2D::empty(Rc::clone(&ctx), width, height)?,
        ];
        for target in &targets {
            target.set_parameter(TexParameter::MinFilter, TexValue::Nearest);
            target.set_parameter(TexParameter::MagFilter, TexValue::Nearest);
        }

        let mesh_texture = packed_mesh
            .map(|pixels| {
                Texture2D::from_data(
                    Rc::clone(&ctx),
                    MESH_SAMPLER_WIDTH,
                    MESH_SAMPLER_HEIGHT,
                    &pixels,
                )
            })
            .transpose()?;
        if let Some(mesh_texture) = &mesh_texture {
            mesh_texture.set_parameter(TexParameter::MinFilter, TexValue::Nearest);
            mesh_texture.set_parameter(TexParameter::MagFilter, TexValue::Nearest);
        }

        let config = TraceConfig {
            num_spheres: description.spheres.len() as u32,
            has_mesh: mesh_texture.is_some(),
            mesh_sampler_width: MESH_SAMPLER_WIDTH,
        };
        let prog_pathtracing = Rc::new(pipelines::pathtracing_program(Rc::clone(&ctx), &config)?);
        let prog_display = Rc::new(pipelines::display_program(Rc::clone(&ctx))?);

        let stage: Rc<dyn Drawable> = Rc::new(Stage::new(ctx.as_ref())?);
        let stage_node = Rc::new(SceneNode::new("StageNode", vec![stage], None));
        let world_children: Vec<Rc<dyn Drawable>> = vec![Rc::clone(&stage_node) as _];
        let world = Rc::new(SceneNode::new("world", world_children, None));

        let scene = Self {
            ctx,
            camera: Camera::default(),
            draw_options: DrawOptions::default(),
            prog_pathtracing,
            prog_display,
            framebuffer,
            targets,
            read_index: Cell::new(0),
            mesh_texture,
            mesh_num_triangles,
            world,
            stage_node,
            sample_counter: Cell::new(0),
        };
        scene.upload_scene_uniforms(description)?;
        info!(
            "scene ready: {} spheres, mesh with {} triangles, {width}x{height} accumulation",
            description.spheres.len(),
            mesh_num_triangles
        );
        Ok(scene)
    }

    fn upload_scene_uniforms(&self, description: &SceneDescription) -> Result<()> {
        let prog = &self.prog_pathtracing;
        prog.set_uniform("La", UniformValue::Vec3(description.ambient), true)?;

        for (i, sphere) in description.spheres.iter().enumerate() {
            prog.set_uniform(
                &format!("spheres[{i}].center"),
                UniformValue::Vec3(sphere.center.to_vec()),
                true,
            )?;
            prog.set_uniform(
                &format!("spheres[{i}].radius"),
                UniformValue::Float(sphere.radius),
                true,
            )?;
            set_material(prog, &format!("sphereMaterials[{i}]"), &sphere.material)?;
        }

        let room = &description.room;
        prog.set_uniform(
            "roomMinCorner",
            UniformValue::Vec3(room.min_corner.to_vec()),
            true,
        )?;
        prog.set_uniform(
            "roomMaxCorner",
            UniformValue::Vec3(room.max_corner.to_vec()),
            true,
        )?;
        for (i, material) in room.materials.iter().enumerate() {
            set_material(prog, &format!("roomMaterials[{i}]"), material)?;
        }

        if let Some(mesh_texture) = &self.mesh_texture {
            set_material(prog, "meshMaterial", &description.mesh_material)?;
            prog.set_uniform(
                "meshOnePixel",
                UniformValue::Vec2(cgmath::Vector2::new(
                    1.0 / MESH_SAMPLER_WIDTH as f32,
                    1.0 / MESH_SAMPLER_HEIGHT as f32,
                )),
                true,
            )?;
            prog.set_uniform(
                "meshNumTriangles",
                UniformValue::Int(self.mesh_num_triangles as i32),
                true,
            )?;
            prog.set_texture("meshData", 1, mesh_texture, true)?;
        }
        Ok(())
    }

    /// The root of the scene graph. Hosts hang their own nodes off this.
    pub fn world(&self) -> &Rc<SceneNode> {
        &self.world
    }

    /// The node holding the stage quad; its visibility follows
    /// `draw_options.show_stage`.
    pub fn stage_node(&self) -> &Rc<SceneNode> {
        &self.stage_node
    }

    pub fn sample_counter(&self) -> u32 {
        self.sample_counter.get()
    }

    /// Throw away the accumulated average. Call after any camera or scene
    /// mutation; the next draw starts a fresh weight sequence at 0.
    pub fn reset_sampling(&self) {
        self.sample_counter.set(0);
    }

    /// Render one progressive sample: the trace pass into the offscreen
    /// write target, then the display pass to the screen, then swap.
    pub fn draw(&self, ms_since_start: f64) -> Result<()> {
        let n = self.sample_counter.get();
        let weight = n as f32 / (n as f32 + 1.0);
        self.stage_node.set_visible(self.draw_options.show_stage);

        let read = &self.targets[self.read_index.get()];
        let write = &self.targets[1 - self.read_index.get()];

        let prog = &self.prog_pathtracing;
        prog.activate();
        prog.set_uniform(
            "secondsSinceStart",
            UniformValue::Float((ms_since_start * 0.001) as f32),
            false,
        )?;
        prog.set_uniform("textureWeight", UniformValue::Float(weight), false)?;
        prog.set_uniform(
            "projectionMatrix",
            UniformValue::Mat4(self.camera.projection_matrix),
            false,
        )?;
        prog.set_uniform(
            "eyePosition",
            UniformValue::Vec3(self.camera.eye.to_vec()),
            false,
        )?;
        prog.set_texture("texture0", 0, read, false)?;
        if let Some(mesh_texture) = &self.mesh_texture {
            prog.set_texture("meshData", 1, mesh_texture, false)?;
        }

        self.ctx.set_depth_test(true);
        self.ctx.attach_color_target(self.framebuffer, write.id());
        self.ctx.bind_framebuffer(Some(self.framebuffer));
        self.ctx.clear([1.0, 1.0, 1.0, 1.0]);
        self.world
            .draw(self.ctx.as_ref(), Some(prog), self.camera.view_matrix)?;
        self.ctx.bind_framebuffer(None);

        let display = &self.prog_display;
        display.activate();
        display.set_uniform(
            "projectionMatrix",
            UniformValue::Mat4(self.camera.projection_matrix),
            false,
        )?;
        display.set_uniform(
            "toneMapping",
            UniformValue::Bool(self.draw_options.tone_mapping),
            false,
        )?;
        display.set_texture("texture0", 0, write, false)?;
        self.ctx.clear([1.0, 1.0, 1.0, 1.0]);
        self.world
            .draw(self.ctx.as_ref(), Some(display), self.camera.view_matrix)?;

        self.sample_counter.set(n + 1);
        self.read_index.set(1 - self.read_index.get());
        Ok(())
    }
}

fn set_material(program: &ShaderProgram, prefix: &str, material: &Material) -> Result<()> {
    program.set_uniform(
        &format!("{prefix}.isPerfectMirror"),
        UniformValue::Bool(material.is_mirror),
        false,
    )?;
    program.set_uniform(
        &format!("{prefix}.isDiffuse"),
        UniformValue::Bool(material.is_diffuse),
        false,
    )?;
    program.set_uniform(
        &format!("{prefix}.Le"),
        UniformValue::Vec3(material.emittance),
        false,
    )?;
    program.set_uniform(
        &format!("{prefix}.Kd"),
        UniformValue::Vec3(material.reflectance),
        false,
    )?;
    Ok(())
}
