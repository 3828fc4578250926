//! Scene graph and hierarchical scene organization.
//!
//! A scene is a tree of [`SceneNode`]s over leaf [`Drawable`]s. Each node
//! carries a local transform, optional visibility, and optionally its own
//! shader program; children without one inherit the nearest ancestor's.
//! Drawing walks the tree in insertion order, accumulating model-view
//! matrices parent-first and pushing `modelViewMatrix` / `normalMatrix` into
//! whichever program applies to each child.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use cgmath::{Matrix, Matrix3, Matrix4, SquareMatrix};
use log::warn;

use crate::context::{RenderingContext, UniformValue};
use crate::error::{RenderError, Result};
use crate::program::ShaderProgram;

/// Anything that can be rendered by the scene traversal.
///
/// `program` is the program resolved so far along the ancestor chain;
/// `model_view` is the transform accumulated down to (and including) the
/// caller. Host code can implement this directly for one-off effects, or use
/// [`CustomDrawable`] to wrap a closure.
pub trait Drawable {
    fn draw(
        &self,
        ctx: &dyn RenderingContext,
        program: Option<&ShaderProgram>,
        model_view: Matrix4<f32>,
    ) -> Result<()>;
}

/// An interior node of the scene graph.
pub struct SceneNode {
    name: String,
    children: RefCell<Vec<Rc<dyn Drawable>>>,
    program: Option<Rc<ShaderProgram>>,
    transform: Cell<Matrix4<f32>>,
    visible: Cell<bool>,
}

impl SceneNode {
    /// `program: None` makes the node inherit whatever program is active in
    /// the traversal; the root of a drawn tree must resolve one somewhere.
    pub fn new(
        name: impl Into<String>,
        children: Vec<Rc<dyn Drawable>>,
        program: Option<Rc<ShaderProgram>>,
    ) -> Self {
        Self {
            name: name.into(),
            children: RefCell::new(children),
            program,
            transform: Cell::new(Matrix4::identity()),
            visible: Cell::new(true),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The local transform, applied before anything inherited from above.
    pub fn transform(&self) -> Matrix4<f32> {
        self.transform.get()
    }

    pub fn set_transform(&self, transform: Matrix4<f32>) {
        self.transform.set(transform);
    }

    pub fn is_visible(&self) -> bool {
        self.visible.get()
    }

    /// An invisible node is skipped entirely, its subtree included.
    pub fn set_visible(&self, visible: bool) {
        self.visible.set(visible);
    }

    /// Append drawables to the child list, keeping insertion order.
    pub fn add_objects(&self, objects: &[Rc<dyn Drawable>]) {
        self.children
            .borrow_mut()
            .extend(objects.iter().map(Rc::clone));
    }

    /// Remove the given drawables from the child list, by identity. Objects
    /// that are not children are ignored.
    pub fn remove_objects(&self, objects: &[Rc<dyn Drawable>]) {
        self.children
            .borrow_mut()
            .retain(|child| !objects.iter().any(|o| Rc::ptr_eq(child, o)));
    }

    pub fn num_children(&self) -> usize {
        self.children.borrow().len()
    }
}

impl Drawable for SceneNode {
    fn draw(
        &self,
        ctx: &dyn RenderingContext,
        program: Option<&ShaderProgram>,
        model_view: Matrix4<f32>,
    ) -> Result<()> {
        if !self.visible.get() {
            return Ok(());
        }
        let program = self
            .program
            .as_deref()
            .or(program)
            .ok_or_else(|| RenderError::MissingProgram {
                node: self.name.clone(),
            })?;

        let local_mv = model_view * self.transform.get();
        let normal = normal_matrix(&local_mv, &self.name);

        for child in self.children.borrow().iter() {
            program.activate();
            // Not every program declares both matrices, so absence is fine.
            program.set_uniform("modelViewMatrix", UniformValue::Mat4(local_mv), false)?;
            program.set_uniform("normalMatrix", UniformValue::Mat3(normal), false)?;
            child.draw(ctx, Some(program), local_mv)?;
        }
        Ok(())
    }
}

/// Transpose of the inverse of the upper-left 3x3, for transforming normals
/// under non-uniform scale. Singular transforms keep the traversal alive
/// with an identity fallback.
fn normal_matrix(model_view: &Matrix4<f32>, node: &str) -> Matrix3<f32> {
    let m = Matrix3::from_cols(
        model_view.x.truncate(),
        model_view.y.truncate(),
        model_view.z.truncate(),
    );
    match m.invert() {
        Some(inverse) => inverse.transpose(),
        None => {
            warn!("singular model-view in scene node {node}, using identity normal matrix");
            Matrix3::identity()
        }
    }
}

type DrawFn = dyn Fn(&dyn RenderingContext, Option<&ShaderProgram>, Matrix4<f32>) -> Result<()>;

/// A leaf drawable wrapping a closure, for host-supplied draw logic that
/// does not warrant its own type.
pub struct CustomDrawable {
    draw_fn: Box<DrawFn>,
}

impl CustomDrawable {
    pub fn new(
        draw_fn: impl Fn(&dyn RenderingContext, Option<&ShaderProgram>, Matrix4<f32>) -> Result<()>
        + 'static,
    ) -> Self {
        Self {
            draw_fn: Box::new(draw_fn),
        }
    }
}

impl Drawable for CustomDrawable {
    fn draw(
        &self,
        ctx: &dyn RenderingContext,
        program: Option<&ShaderProgram>,
        model_view: Matrix4<f32>,
    ) -> Result<()> {
        (self.draw_fn)(ctx, program, model_view)
    }
}
