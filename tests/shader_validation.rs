//! Every generated shader must parse and validate with naga.

use naga::valid::{Capabilities, ValidationFlags, Validator};
use plasma_lab::shaders::{
    cell_render_shader, drift_render_shader, drift_update_shader, explosion_render_shader,
    explosion_update_shader, mass_render_shader, particle_render_shader, particle_update_shader,
    spawner_render_shader, trail_render_shader,
};
use plasma_lab::systems::WORLD_SIZE;

fn validate(name: &str, source: &str) -> naga::Module {
    let module = match naga::front::wgsl::parse_str(source) {
        Ok(module) => module,
        Err(err) => panic!("{name} failed to parse:\n{}", err.emit_to_string(source)),
    };
    if let Err(err) = Validator::new(ValidationFlags::all(), Capabilities::all()).validate(&module)
    {
        panic!("{name} failed validation: {err:?}\n{source}");
    }
    module
}

fn entry_points(module: &naga::Module) -> Vec<(naga::ShaderStage, String)> {
    module
        .entry_points
        .iter()
        .map(|ep| (ep.stage, ep.name.clone()))
        .collect()
}

#[test]
fn test_update_shaders_validate() {
    for (name, source) in [
        ("particle update", particle_update_shader()),
        ("drift update", drift_update_shader()),
        ("explosion update", explosion_update_shader()),
    ] {
        let module = validate(name, &source);
        assert_eq!(
            entry_points(&module),
            vec![(naga::ShaderStage::Compute, "main".to_string())],
            "{name}"
        );
    }
}

#[test]
fn test_render_shaders_validate() {
    for (name, source) in [
        ("particle render", particle_render_shader()),
        ("drift render", drift_render_shader()),
        ("explosion render", explosion_render_shader()),
        ("mass render", mass_render_shader()),
        ("spawner render", spawner_render_shader()),
        ("trail render", trail_render_shader(WORLD_SIZE)),
        ("cell render", cell_render_shader(WORLD_SIZE)),
    ] {
        let module = validate(name, &source);
        let stages = entry_points(&module);
        assert!(
            stages.contains(&(naga::ShaderStage::Vertex, "vs_main".to_string())),
            "{name}"
        );
        assert!(
            stages.contains(&(naga::ShaderStage::Fragment, "fs_main".to_string())),
            "{name}"
        );
    }
}

#[test]
fn test_world_size_is_baked_in() {
    let source = trail_render_shader(512.0);
    assert!(source.contains("vec2<f32>(512.0, 512.0)"));
    validate("trail render 512", &source);
}
