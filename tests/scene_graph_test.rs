mod common;

use std::cell::RefCell;
use std::rc::Rc;

use cgmath::{Matrix4, SquareMatrix, Vector3};
use common::MockContext;
use raymond::context::{RenderingContext, UniformValue};
use raymond::data_structures::scene_graph::{CustomDrawable, Drawable, SceneNode};
use raymond::error::RenderError;
use raymond::program::ShaderProgram;

const VERT: &str = "#version 330 core\nvoid main() {}\n";
const FRAG: &str = "#version 330 core\nvoid main() {}\n";

fn mock() -> Rc<MockContext> {
    Rc::new(MockContext::new(256, 256))
}

fn program(ctx: &Rc<MockContext>) -> Rc<ShaderProgram> {
    Rc::new(
        ShaderProgram::new(Rc::clone(ctx) as Rc<dyn RenderingContext>, VERT, FRAG)
            .expect("mock programs always link"),
    )
}

/// A leaf that records the model-view matrix it is drawn with.
fn probe() -> (Rc<dyn Drawable>, Rc<RefCell<Vec<Matrix4<f32>>>>) {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let drawable: Rc<dyn Drawable> = Rc::new(CustomDrawable::new(move |_, _, model_view| {
        sink.borrow_mut().push(model_view);
        Ok(())
    }));
    (drawable, seen)
}

#[test]
fn model_view_composes_ancestor_locals_in_order() {
    let ctx = mock();
    let prog = program(&ctx);
    let (leaf, seen) = probe();

    let child = Rc::new(SceneNode::new("child", vec![leaf], None));
    child.set_transform(Matrix4::from_translation(Vector3::new(0.0, 5.0, 0.0)));
    let root = Rc::new(SceneNode::new("root", vec![child as _], Some(prog)));
    root.set_transform(Matrix4::from_translation(Vector3::new(2.0, 0.0, 0.0)));

    let view = Matrix4::from_translation(Vector3::new(0.0, 0.0, -10.0));
    root.draw(ctx.as_ref(), None, view).unwrap();

    let expected = view
        * Matrix4::from_translation(Vector3::new(2.0, 0.0, 0.0))
        * Matrix4::from_translation(Vector3::new(0.0, 5.0, 0.0));
    assert_eq!(seen.borrow().as_slice(), &[expected]);
}

#[test]
fn matrices_are_uploaded_for_every_node_level() {
    let ctx = mock();
    let prog = program(&ctx);
    let (leaf, _) = probe();

    let child = Rc::new(SceneNode::new("child", vec![leaf], None));
    let root = SceneNode::new("root", vec![child as _], Some(prog));
    root.draw(ctx.as_ref(), None, Matrix4::identity()).unwrap();

    // one write per node: root for its child, child for its leaf
    assert_eq!(ctx.writes_of("modelViewMatrix").len(), 2);
    assert_eq!(ctx.writes_of("normalMatrix").len(), 2);
}

#[test]
fn normal_matrix_is_the_inverse_transpose() {
    let ctx = mock();
    let prog = program(&ctx);
    let (leaf, _) = probe();

    let node = SceneNode::new("scaled", vec![leaf], Some(prog));
    node.set_transform(Matrix4::from_scale(2.0));
    node.draw(ctx.as_ref(), None, Matrix4::identity()).unwrap();

    match ctx.last_write("normalMatrix") {
        Some(UniformValue::Mat3(m)) => {
            assert_eq!(m.x.x, 0.5);
            assert_eq!(m.y.y, 0.5);
            assert_eq!(m.z.z, 0.5);
        }
        other => panic!("expected a mat3 write, got {other:?}"),
    }
}

#[test]
fn singular_transform_falls_back_to_identity_normals() {
    let ctx = mock();
    let prog = program(&ctx);
    let (leaf, seen) = probe();

    let node = SceneNode::new("flat", vec![leaf], Some(prog));
    node.set_transform(Matrix4::from_nonuniform_scale(1.0, 1.0, 0.0));
    node.draw(ctx.as_ref(), None, Matrix4::identity()).unwrap();

    // the traversal survives and the leaf still gets drawn
    assert_eq!(seen.borrow().len(), 1);
    match ctx.last_write("normalMatrix") {
        Some(UniformValue::Mat3(m)) => assert_eq!(m.z.z, 1.0),
        other => panic!("expected a mat3 write, got {other:?}"),
    }
}

#[test]
fn child_program_overrides_the_inherited_one() {
    let ctx = mock();
    let outer = program(&ctx);
    let inner = program(&ctx);

    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let leaf: Rc<dyn Drawable> = Rc::new(CustomDrawable::new(move |_, program, _| {
        sink.borrow_mut().push(program.map(|p| p.id()));
        Ok(())
    }));

    let child = Rc::new(SceneNode::new("child", vec![leaf], Some(Rc::clone(&inner))));
    let root = SceneNode::new("root", vec![child as _], Some(Rc::clone(&outer)));
    root.draw(ctx.as_ref(), None, Matrix4::identity()).unwrap();

    assert_eq!(seen.borrow().as_slice(), &[Some(inner.id())]);
}

#[test]
fn missing_program_names_the_node() {
    let ctx = mock();
    let (leaf, _) = probe();
    let node = SceneNode::new("orphan", vec![leaf], None);

    let err = node
        .draw(ctx.as_ref(), None, Matrix4::identity())
        .unwrap_err();
    match err {
        RenderError::MissingProgram { node } => assert_eq!(node, "orphan"),
        other => panic!("expected MissingProgram, got {other:?}"),
    }
}

#[test]
fn invisible_subtree_is_skipped() {
    let ctx = mock();
    let prog = program(&ctx);
    let (leaf, seen) = probe();

    let node = SceneNode::new("hidden", vec![leaf], Some(prog));
    node.set_visible(false);
    node.draw(ctx.as_ref(), None, Matrix4::identity()).unwrap();

    assert!(seen.borrow().is_empty());
    assert!(ctx.writes.borrow().is_empty());
}

#[test]
fn objects_can_be_added_and_removed_at_runtime() {
    let ctx = mock();
    let prog = program(&ctx);
    let (leaf, seen) = probe();

    let node = SceneNode::new("dynamic", vec![], Some(prog));
    assert_eq!(node.num_children(), 0);

    node.add_objects(std::slice::from_ref(&leaf));
    node.draw(ctx.as_ref(), None, Matrix4::identity()).unwrap();
    assert_eq!(seen.borrow().len(), 1);

    node.remove_objects(std::slice::from_ref(&leaf));
    assert_eq!(node.num_children(), 0);
    node.draw(ctx.as_ref(), None, Matrix4::identity()).unwrap();
    assert_eq!(seen.borrow().len(), 1, "removed leaf must not draw again");
}

#[test]
fn removing_a_foreign_object_is_a_no_op() {
    let ctx = mock();
    let prog = program(&ctx);
    let (resident, _) = probe();
    let (stranger, _) = probe();

    let node = SceneNode::new("node", vec![resident], Some(prog));
    node.remove_objects(std::slice::from_ref(&stranger));
    assert_eq!(node.num_children(), 1);
}
