//! WGSL generation for the update kernels and the quad renderers.
//!
//! Instance structs come from `#[derive(GpuInstance)]`, so the shader text
//! and the Rust buffers can never disagree on layout. Every kernel runs one
//! invocation per instance in 1-D workgroups of [`WORKGROUP_SIZE`].
//!
//! Bind group layouts:
//!
//! | Kind | Binding | Resource |
//! |------|---------|----------|
//! | update | 0 | `array<Instance>` storage, read-write |
//! | update | 1 | `array<MassInstance, 32>` storage, read-only |
//! | update | 2 | [`UpdateUniforms`] |
//! | render | 0 | [`ViewUniforms`] |
//!
//! Render shaders take the instance fields as `@location` inputs starting at
//! 0 and use `vs_main` / `fs_main`; update shaders use `main`.

use bytemuck::{Pod, Zeroable};

use crate::kernel::{
    DriftInstance, MassInstance, ParticleInstance, BOUNCE_DAMPING, FALLOFF_EXPONENT, G,
    REFERENCE_FPS,
};
use crate::mass::MASS_CAPACITY;
use crate::shader_utils::all_utils_wgsl;
use crate::spawner::{SpawnerInstance, SpawnerUniform};
use crate::systems::{CellInstance, TrailInstance};
use crate::GpuInstance;

pub const WORKGROUP_SIZE: u32 = 256;

/// Half-size of a plasma particle quad in world units.
pub const PARTICLE_SIZE: f32 = 0.008;
/// Length stretch per unit of speed for spawner particles.
pub const PARTICLE_STRETCH: f32 = 10.0;
/// Length stretch per unit of speed for plasma field particles.
pub const DRIFT_STRETCH: f32 = 6.0;
/// Width lost per unit of speed.
pub const PARTICLE_SQUASH: f32 = 0.4;
pub const EXPLOSION_SIZE: f32 = 0.02;
/// Mass quad size per unit of |mass|.
pub const MASS_SIZE: f32 = 0.1;

/// Uniforms of the update kernels. 48 bytes.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct UpdateUniforms {
    pub spawner: SpawnerUniform,
    pub delta_time: f32,
    pub elapsed: f32,
    /// Changes every frame so births draw fresh random numbers.
    pub seed: u32,
    pub _pad: u32,
}

const UPDATE_UNIFORMS_WGSL: &str = r#"
struct UpdateUniforms {
    spawner_pos: vec2<f32>,
    direction: f32,
    spread: f32,
    min_speed: f32,
    max_speed: f32,
    spawner_radius: f32,
    spawner_lifetime: f32,
    delta_time: f32,
    elapsed: f32,
    seed: u32,
    _pad: u32,
}
"#;

/// Uniforms shared by every render shader. 16 bytes.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct ViewUniforms {
    /// World to clip scale keeping the `[-1, 1]` square undistorted.
    pub view_scale: [f32; 2],
    pub elapsed: f32,
    pub _pad: f32,
}

const VIEW_WGSL: &str = r#"
struct ViewUniforms {
    view_scale: vec2<f32>,
    elapsed: f32,
    _pad: f32,
}

@group(0) @binding(0) var<uniform> view_uniforms: ViewUniforms;
"#;

/// WGSL float literal.
fn lit(v: f32) -> String {
    format!("{:?}", v)
}

/// `struct InstanceInput` with one `@location` per derived field.
pub fn vertex_input<T: GpuInstance>() -> String {
    let fields: Vec<String> = T::ATTRIBUTES
        .iter()
        .enumerate()
        .map(|(i, attr)| format!("    @location({}) {}: {},", i, attr.name, attr.format.wgsl_type()))
        .collect();
    format!("struct InstanceInput {{\n{}\n}}\n", fields.join("\n"))
}

/// Structs, bindings and physics helpers shared by the update kernels.
fn update_preamble<T: GpuInstance>() -> String {
    format!(
        r#"{instance}

{mass}
{uniforms}
@group(0) @binding(0) var<storage, read_write> instances: array<{name}>;
@group(0) @binding(1) var<storage, read> masses: array<MassInstance, {capacity}>;
@group(0) @binding(2) var<uniform> uniforms: UpdateUniforms;
{lib}
fn attract(pos: vec2<f32>, vel: vec2<f32>, dt: f32) -> vec2<f32> {{
    var v = vel;
    for (var i = 0u; i < {capacity}u; i++) {{
        let m = masses[i];
        if m.mass == 0.0 {{
            break;
        }}
        let diff = m.pos - pos;
        let dist = length(diff);
        if dist == 0.0 {{
            continue;
        }}
        v += diff * ({g} / pow(dist, {exponent})) * m.mass * dt;
    }}
    return v;
}}

struct Bounced {{
    pos: vec2<f32>,
    vel: vec2<f32>,
}}

fn bounce(pos: vec2<f32>, vel: vec2<f32>) -> Bounced {{
    var p = pos;
    var v = vel;
    if p.x > 1.0 {{
        if v.x > 0.0 {{ v.x = -v.x * {damping}; }}
        p.x = 2.0 - p.x;
    }} else if p.x < -1.0 {{
        if v.x < 0.0 {{ v.x = -v.x * {damping}; }}
        p.x = -2.0 - p.x;
    }}
    if p.y > 1.0 {{
        if v.y > 0.0 {{ v.y = -v.y * {damping}; }}
        p.y = 2.0 - p.y;
    }} else if p.y < -1.0 {{
        if v.y < 0.0 {{ v.y = -v.y * {damping}; }}
        p.y = -2.0 - p.y;
    }}
    return Bounced(p, v);
}}
"#,
        instance = T::WGSL_STRUCT,
        mass = MassInstance::WGSL_STRUCT,
        uniforms = UPDATE_UNIFORMS_WGSL,
        name = T::WGSL_NAME,
        capacity = MASS_CAPACITY,
        lib = all_utils_wgsl(),
        g = lit(G),
        exponent = lit(FALLOFF_EXPONENT),
        damping = lit(BOUNCE_DAMPING),
    )
}

/// Lifecycle kernel for spawner-owned particles.
pub fn particle_update_shader() -> String {
    format!(
        r#"{preamble}
fn birth(p: ParticleInstance, seed: u32) -> ParticleInstance {{
    var q = p;
    q.pos = uniforms.spawner_pos + in_unit_circle(seed) * uniforms.spawner_radius;
    let theta = uniforms.direction + (rand(hash(seed + 1u)) - 0.5) * uniforms.spread;
    let speed = rand_range(hash(seed + 2u), uniforms.min_speed, uniforms.max_speed);
    q.vel = polar_to_cartesian(theta, speed);

    let lifetime = uniforms.spawner_lifetime;
    q.lifetime = lifetime;
    q.age = select(0.0, p.age - floor(p.age / lifetime) * lifetime, lifetime > 0.0);
    q.born = 1u;
    return q;
}}

@compute @workgroup_size({workgroup})
fn main(@builtin(global_invocation_id) global_id: vec3<u32>) {{
    let index = global_id.x;
    if index >= arrayLength(&instances) {{
        return;
    }}

    var p = instances[index];
    let dt = uniforms.delta_time;
    let seed = hash(index ^ hash(uniforms.seed));

    if p.age < 0.0 {{
        p.age += dt;
        if p.age >= 0.0 {{
            p = birth(p, seed);
        }}
        instances[index] = p;
        return;
    }}

    let bounced = bounce(p.pos, attract(p.pos, p.vel, dt));
    p.pos = bounced.pos + bounced.vel * dt;
    p.vel = bounced.vel;
    p.age += dt;

    if p.age >= p.lifetime {{
        p = birth(p, seed);
    }}
    instances[index] = p;
}}
"#,
        preamble = update_preamble::<ParticleInstance>(),
        workgroup = WORKGROUP_SIZE,
    )
}

/// Forces, bounce and integration for immortal particles.
pub fn drift_update_shader() -> String {
    format!(
        r#"{preamble}
@compute @workgroup_size({workgroup})
fn main(@builtin(global_invocation_id) global_id: vec3<u32>) {{
    let index = global_id.x;
    if index >= arrayLength(&instances) {{
        return;
    }}

    var p = instances[index];
    let dt = uniforms.delta_time;
    let bounced = bounce(p.pos, attract(p.pos, p.vel, dt));
    p.pos = bounced.pos + bounced.vel * dt;
    p.vel = bounced.vel;
    instances[index] = p;
}}
"#,
        preamble = update_preamble::<DriftInstance>(),
        workgroup = WORKGROUP_SIZE,
    )
}

/// Explosion particles: straight lines between hard walls.
pub fn explosion_update_shader() -> String {
    format!(
        r#"{preamble}
@compute @workgroup_size({workgroup})
fn main(@builtin(global_invocation_id) global_id: vec3<u32>) {{
    let index = global_id.x;
    if index >= arrayLength(&instances) {{
        return;
    }}

    var p = instances[index];
    p.pos += p.vel * uniforms.delta_time * {fps};
    if p.pos.x > 1.0 {{
        p.vel.x = -abs(p.vel.x);
    }} else if p.pos.x < -1.0 {{
        p.vel.x = abs(p.vel.x);
    }}
    if p.pos.y > 1.0 {{
        p.vel.y = -abs(p.vel.y);
    }} else if p.pos.y < -1.0 {{
        p.vel.y = abs(p.vel.y);
    }}
    instances[index] = p;
}}
"#,
        preamble = update_preamble::<DriftInstance>(),
        workgroup = WORKGROUP_SIZE,
        fps = lit(REFERENCE_FPS),
    )
}

fn render_preamble<T: GpuInstance>() -> String {
    format!("{}\n{}\n{}", VIEW_WGSL, all_utils_wgsl(), vertex_input::<T>())
}

/// Velocity-stretched glow shared by spawner particles and the plasma field.
fn glow_fragment(fade: &str) -> String {
    format!(
        r#"
@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {{
    let a = clamp(1.0 - length(in.uv), 0.0, 1.0);
    return vec4<f32>(pow(a, 4.0), pow(a, 8.0), 1.0, pow(a, 1.2) * 0.2{fade});
}}
"#
    )
}

/// Spawner particles. Unborn particles collapse to a point and draw nothing.
pub fn particle_render_shader() -> String {
    format!(
        r#"{preamble}
struct VertexOutput {{
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
    @location(1) completion: f32,
}}

@vertex
fn vs_main(@builtin(vertex_index) vertex_index: u32, inst: InstanceInput) -> VertexOutput {{
    var out: VertexOutput;
    let corner = quad_vert(vertex_index);
    out.uv = corner;
    out.completion = select(clamp(inst.age / inst.lifetime, 0.0, 1.0), 0.0, inst.lifetime == 0.0);

    if inst.born == 0u {{
        out.clip_position = vec4<f32>(0.0, 0.0, 0.0, 1.0);
        return out;
    }}

    let speed = length(inst.vel);
    var local = corner * {size};
    local.x *= 1.0 + speed * {stretch};
    local.y *= max(1.0 - speed * {squash}, 0.0);
    local = rotate_vec2(local, atan2(inst.vel.y, inst.vel.x));

    out.clip_position = vec4<f32>((inst.pos + local) * view_uniforms.view_scale, 0.0, 1.0);
    return out;
}}
{fragment}"#,
        preamble = render_preamble::<ParticleInstance>(),
        size = lit(PARTICLE_SIZE),
        stretch = lit(PARTICLE_STRETCH),
        squash = lit(PARTICLE_SQUASH),
        fragment = glow_fragment(" * (1.0 - in.completion)"),
    )
}

/// Plasma field particles.
pub fn drift_render_shader() -> String {
    format!(
        r#"{preamble}
struct VertexOutput {{
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
}}

@vertex
fn vs_main(@builtin(vertex_index) vertex_index: u32, inst: InstanceInput) -> VertexOutput {{
    var out: VertexOutput;
    let corner = quad_vert(vertex_index);
    out.uv = corner;

    let speed = length(inst.vel);
    var local = corner * {size};
    local.x *= 1.0 + speed * {stretch};
    local.y *= max(1.0 - speed * {squash}, 0.0);
    local = rotate_vec2(local, atan2(inst.vel.y, inst.vel.x));

    out.clip_position = vec4<f32>((inst.pos + local) * view_uniforms.view_scale, 0.0, 1.0);
    return out;
}}
{fragment}"#,
        preamble = render_preamble::<DriftInstance>(),
        size = lit(PARTICLE_SIZE),
        stretch = lit(DRIFT_STRETCH),
        squash = lit(PARTICLE_SQUASH),
        fragment = glow_fragment(""),
    )
}

/// Explosion particles: round, unrotated.
pub fn explosion_render_shader() -> String {
    format!(
        r#"{preamble}
struct VertexOutput {{
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
}}

@vertex
fn vs_main(@builtin(vertex_index) vertex_index: u32, inst: InstanceInput) -> VertexOutput {{
    var out: VertexOutput;
    let corner = quad_vert(vertex_index);
    out.uv = corner;
    out.clip_position = vec4<f32>((inst.pos + corner * {size}) * view_uniforms.view_scale, 0.0, 1.0);
    return out;
}}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {{
    let a = clamp(1.0 - length(in.uv), 0.0, 1.0);
    return vec4<f32>(a, 0.0, 1.0, a * 0.1);
}}
"#,
        preamble = render_preamble::<DriftInstance>(),
        size = lit(EXPLOSION_SIZE),
    )
}

/// Masses: a disc sized by |mass| with a slowly turning highlight.
pub fn mass_render_shader() -> String {
    format!(
        r#"{preamble}
struct VertexOutput {{
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
    @location(1) center: vec2<f32>,
}}

@vertex
fn vs_main(@builtin(vertex_index) vertex_index: u32, inst: InstanceInput) -> VertexOutput {{
    var out: VertexOutput;
    let corner = quad_vert(vertex_index);
    out.uv = corner;
    out.center = inst.pos;
    let world = inst.pos + corner * abs(inst.mass) * {size};
    out.clip_position = vec4<f32>(world * view_uniforms.view_scale, 0.0, 1.0);
    return out;
}}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {{
    let a = clamp(1.0 - length(in.uv), 0.0, 1.0);
    let l = 1.0 - a;
    let theta = atan2(in.uv.y, in.uv.x);
    let phase = in.center.x * 31.0 + in.center.y * 73.0;
    let white = (sin(theta * 2.0 + phase + view_uniforms.elapsed) + 1.0) * 0.5 * l * a;
    return vec4<f32>(l * 0.3, l * 0.2, l, a) + vec4<f32>(white);
}}
"#,
        preamble = render_preamble::<MassInstance>(),
        size = lit(MASS_SIZE),
    )
}

/// Spawner markers. The selected one is tinted orange.
pub fn spawner_render_shader() -> String {
    format!(
        r#"{preamble}
struct VertexOutput {{
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
    @location(1) @interpolate(flat) selected: u32,
}}

@vertex
fn vs_main(@builtin(vertex_index) vertex_index: u32, inst: InstanceInput) -> VertexOutput {{
    var out: VertexOutput;
    let corner = quad_vert(vertex_index);
    out.uv = corner;
    out.selected = inst.selected;
    let world = inst.pos + corner * inst.radius;
    out.clip_position = vec4<f32>(world * view_uniforms.view_scale, 0.0, 1.0);
    return out;
}}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {{
    let d = clamp(1.0 - length(in.uv), 0.0, 1.0);
    if in.selected != 0u {{
        return vec4<f32>(d, d * 0.6, d * 0.2, 1.0);
    }}
    return vec4<f32>(d, d, d, 1.0);
}}
"#,
        preamble = render_preamble::<SpawnerInstance>(),
    )
}

/// Pixel space (y down) to clip space, for the jellyfish world.
fn world_to_clip_wgsl(world_size: f32) -> String {
    format!(
        r#"
const WORLD_SIZE: vec2<f32> = vec2<f32>({size}, {size});

fn world_to_clip(p: vec2<f32>) -> vec2<f32> {{
    let c = (p / WORLD_SIZE - 0.5) * 2.0;
    return vec2<f32>(c.x, -c.y) * view_uniforms.view_scale;
}}
"#,
        size = lit(world_size)
    )
}

/// Jellyfish exhaust: red when fresh, blue when old.
pub fn trail_render_shader(world_size: f32) -> String {
    format!(
        r#"{preamble}
{world_to_clip}
struct VertexOutput {{
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
    @location(1) completion: f32,
}}

@vertex
fn vs_main(@builtin(vertex_index) vertex_index: u32, inst: InstanceInput) -> VertexOutput {{
    var out: VertexOutput;
    let corner = quad_vert(vertex_index);
    out.uv = corner;
    out.completion = inst.completion;

    var local = corner * inst.size;
    local.x *= 1.0 + length(inst.velocity);
    local = rotate_vec2(local, atan2(inst.velocity.y, inst.velocity.x));
    out.clip_position = vec4<f32>(world_to_clip(inst.pos + local), 0.0, 1.0);
    return out;
}}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {{
    let from_center = 1.0 - length(in.uv);
    let alpha = step(0.2, from_center);
    let fade = min((1.0 - in.completion) * 2.0, 1.0);
    return vec4<f32>(1.0 - in.completion, 0.0, in.completion, alpha * fade);
}}
"#,
        preamble = render_preamble::<TrailInstance>(),
        world_to_clip = world_to_clip_wgsl(world_size),
    )
}

/// Jellyfish bodies: a disc with a wavy rim.
pub fn cell_render_shader(world_size: f32) -> String {
    format!(
        r#"{preamble}
{world_to_clip}
struct VertexOutput {{
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
}}

@vertex
fn vs_main(@builtin(vertex_index) vertex_index: u32, inst: InstanceInput) -> VertexOutput {{
    var out: VertexOutput;
    let corner = quad_vert(vertex_index);
    out.uv = corner;
    out.clip_position = vec4<f32>(world_to_clip(inst.pos + corner * inst.size), 0.0, 1.0);
    return out;
}}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {{
    let theta = atan2(in.uv.y, in.uv.x);
    let wavy = sin(theta * 12.0) * 0.03;
    let from_center = 1.0 - length(in.uv) - wavy;
    let alpha = step(0.2, from_center);
    return vec4<f32>(0.5, from_center, 1.0, alpha);
}}
"#,
        preamble = render_preamble::<CellInstance>(),
        world_to_clip = world_to_clip_wgsl(world_size),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_sizes() {
        assert_eq!(std::mem::size_of::<UpdateUniforms>(), 48);
        assert_eq!(std::mem::size_of::<ViewUniforms>(), 16);
    }

    #[test]
    fn test_vertex_input_skips_padding() {
        let input = vertex_input::<MassInstance>();
        assert!(input.contains("@location(0) pos: vec2<f32>,"));
        assert!(input.contains("@location(1) mass: f32,"));
        assert!(!input.contains("_pad"));
    }

    #[test]
    fn test_update_shaders_bound_check() {
        for src in [
            particle_update_shader(),
            drift_update_shader(),
            explosion_update_shader(),
        ] {
            assert!(src.contains("@workgroup_size(256)"));
            assert!(src.contains("if index >= arrayLength(&instances)"));
        }
    }

    #[test]
    fn test_constants_are_inlined() {
        let src = particle_update_shader();
        assert!(src.contains("pow(dist, 1.3)"));
        assert!(src.contains("* 0.7;"));
        assert!(src.contains("array<MassInstance, 32>"));
    }

    #[test]
    fn test_float_literals() {
        assert_eq!(lit(1.0), "1.0");
        assert_eq!(lit(800.0), "800.0");
        assert_eq!(lit(0.008), "0.008");
    }
}
