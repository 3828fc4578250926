mod common;

use std::path::Path;
use std::rc::Rc;

use common::{Event, MockContext};
use raymond::context::{RenderingContext, UniformType, UniformValue};
use raymond::error::{RenderError, ShaderStage};
use raymond::program::ShaderProgram;
use raymond::resources::texture::{Texture2D, TextureLoader};

const VERT: &str = "#version 330 core\nvoid main() {}\n";
const FRAG: &str = "#version 330 core\nvoid main() {}\n";

fn mock() -> Rc<MockContext> {
    Rc::new(MockContext::new(256, 256))
}

fn program(ctx: &Rc<MockContext>) -> ShaderProgram {
    ShaderProgram::new(Rc::clone(ctx) as Rc<dyn RenderingContext>, VERT, FRAG)
        .expect("mock programs always link")
}

#[test]
fn broken_fragment_source_reports_the_fragment_stage() {
    let ctx = mock();
    let err = ShaderProgram::new(
        Rc::clone(&ctx) as Rc<dyn RenderingContext>,
        VERT,
        "#version 330 core\n#error broken\n",
    )
    .unwrap_err();

    match &err {
        RenderError::Compile { stage, .. } => assert_eq!(*stage, ShaderStage::Fragment),
        other => panic!("expected a compile error, got {other:?}"),
    }
    assert!(err.to_string().contains("fragment"));
}

#[test]
fn broken_vertex_source_reports_the_vertex_stage() {
    let ctx = mock();
    let err = ShaderProgram::new(
        Rc::clone(&ctx) as Rc<dyn RenderingContext>,
        "#version 330 core\n#error broken\n",
        FRAG,
    )
    .unwrap_err();
    assert!(err.to_string().contains("vertex"));
}

#[test]
fn type_mismatch_is_an_error_and_writes_nothing() {
    let ctx = mock();
    let prog = program(&ctx);

    let err = prog
        .set_uniform(
            "textureWeight",
            UniformValue::Vec3(cgmath::Vector3::new(0.0, 0.0, 0.0)),
            false,
        )
        .unwrap_err();

    match err {
        RenderError::InvalidUniformType {
            name,
            expected,
            provided,
        } => {
            assert_eq!(name, "textureWeight");
            assert_eq!(expected, UniformType::Float);
            assert_eq!(provided, UniformType::Vec3);
        }
        other => panic!("expected InvalidUniformType, got {other:?}"),
    }
    assert!(ctx.writes.borrow().is_empty(), "no GPU write may happen");
}

#[test]
fn absent_uniform_is_skipped_without_error() {
    let ctx = mock();
    let prog = program(&ctx);

    let written = prog
        .set_uniform("bogusUniform", UniformValue::Float(1.0), true)
        .unwrap();

    assert!(!written);
    assert!(ctx.writes.borrow().is_empty());
}

#[test]
fn matching_uniform_is_written() {
    let ctx = mock();
    let prog = program(&ctx);

    let written = prog
        .set_uniform("textureWeight", UniformValue::Float(0.5), false)
        .unwrap();

    assert!(written);
    match ctx.last_write("textureWeight") {
        Some(UniformValue::Float(v)) => assert_eq!(v, 0.5),
        other => panic!("expected a float write, got {other:?}"),
    }
}

#[test]
fn redundant_activation_is_suppressed() {
    let ctx = mock();
    let prog = program(&ctx);

    prog.activate();
    prog.activate();
    prog.activate();

    let activations = ctx
        .events()
        .iter()
        .filter(|e| matches!(e, Event::UseProgram(_)))
        .count();
    assert_eq!(activations, 1);
}

#[test]
fn activation_switches_between_programs() {
    let ctx = mock();
    let first = program(&ctx);
    let second = program(&ctx);

    first.activate();
    second.activate();
    first.activate();

    let activations: Vec<_> = ctx
        .events()
        .into_iter()
        .filter(|e| matches!(e, Event::UseProgram(_)))
        .collect();
    assert_eq!(activations.len(), 3);
}

#[test]
fn unloaded_texture_is_skipped_without_binding() {
    let ctx = mock();
    let prog = program(&ctx);
    let loader = TextureLoader::new(Rc::clone(&ctx) as Rc<dyn RenderingContext>);
    // never polled, so the texture stays unloaded no matter what the worker did
    let pending = loader
        .load(Path::new("does-not-exist.png"), false, None)
        .unwrap();

    let bound = prog.set_texture("texture0", 0, &pending, false).unwrap();

    assert!(!bound);
    assert!(
        !ctx.events()
            .iter()
            .any(|e| matches!(e, Event::BindTexture { .. }))
    );
}

#[test]
fn loaded_texture_binds_unit_and_sampler() -> anyhow::Result<()> {
    let ctx = mock();
    let prog = program(&ctx);
    let texture = Texture2D::empty(Rc::clone(&ctx) as Rc<dyn RenderingContext>, 4, 4)?;

    let bound = prog.set_texture("texture0", 3, &texture, false)?;

    assert!(bound);
    assert!(
        ctx.events()
            .iter()
            .any(|e| matches!(e, Event::BindTexture { unit: 3, .. }))
    );
    match ctx.last_write("texture0") {
        Some(UniformValue::Int(unit)) => assert_eq!(unit, 3),
        other => panic!("expected the unit index as an int, got {other:?}"),
    }
    Ok(())
}

#[test]
fn non_sampler_uniform_rejects_texture_binds() {
    let ctx = mock();
    let prog = program(&ctx);
    let texture = Texture2D::empty(Rc::clone(&ctx) as Rc<dyn RenderingContext>, 4, 4).unwrap();
    ctx.declare_uniform("texture0", Some(UniformType::Vec3));

    let err = prog.set_texture("texture0", 0, &texture, false).unwrap_err();

    match err {
        RenderError::InvalidUniformType { name, expected, .. } => {
            assert_eq!(name, "texture0");
            assert_eq!(expected, UniformType::Vec3);
        }
        other => panic!("expected InvalidUniformType, got {other:?}"),
    }
    assert!(
        !ctx.events()
            .iter()
            .any(|e| matches!(e, Event::BindTexture { .. }))
    );
}

#[test]
fn texture_unit_beyond_the_limit_is_an_error() {
    let ctx = mock();
    let prog = program(&ctx);
    let texture = Texture2D::empty(Rc::clone(&ctx) as Rc<dyn RenderingContext>, 4, 4).unwrap();

    let err = prog.set_texture("texture0", 8, &texture, false).unwrap_err();
    assert!(matches!(
        err,
        RenderError::TextureUnitOutOfRange { unit: 8, max: 8 }
    ));
}
