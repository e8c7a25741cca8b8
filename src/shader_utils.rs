//! WGSL utility functions shared by every generated shader.
//!
//! # Available Functions
//!
//! ## Random & Hash
//! - `hash(n: u32) -> u32` - Hash a u32 to pseudo-random u32
//! - `rand(seed: u32) -> f32` - Random float in [0, 1)
//! - `rand_range(seed: u32, min: f32, max: f32) -> f32` - Random float in range
//!
//! ## Geometry
//! - `quad_vert(idx: u32) -> vec2<f32>` - Corner of the unit quad for vertex `idx` (0..6)
//! - `rotate_vec2(v: vec2<f32>, angle: f32) -> vec2<f32>` - Counter-clockwise rotation
//! - `polar_to_cartesian(theta: f32, r: f32) -> vec2<f32>`
//! - `in_unit_circle(seed: u32) -> vec2<f32>` - Uniform point in the unit disc
//!
//! The CPU twins of the geometry helpers live in [`crate::math`].

/// WGSL code for random/hash functions.
pub const RANDOM_WGSL: &str = r#"
fn hash(n: u32) -> u32 {
    var x = n;
    x = x ^ (x >> 17u);
    x = x * 0xed5ad4bbu;
    x = x ^ (x >> 11u);
    x = x * 0xac4c1b51u;
    x = x ^ (x >> 15u);
    x = x * 0x31848babu;
    x = x ^ (x >> 14u);
    return x;
}

// Top 24 bits keep the result strictly below 1.0
fn rand(seed: u32) -> f32 {
    return f32(hash(seed) >> 8u) / 16777216.0;
}

fn rand_range(seed: u32, min_val: f32, max_val: f32) -> f32 {
    return min_val + rand(seed) * (max_val - min_val);
}
"#;

/// WGSL code for quad and vector helpers.
pub const GEOMETRY_WGSL: &str = r#"
const TAU: f32 = 6.2831855;

fn quad_vert(idx: u32) -> vec2<f32> {
    var corners = array<vec2<f32>, 6>(
        vec2<f32>(-1.0, -1.0),
        vec2<f32>(1.0, -1.0),
        vec2<f32>(-1.0, 1.0),
        vec2<f32>(-1.0, 1.0),
        vec2<f32>(1.0, -1.0),
        vec2<f32>(1.0, 1.0),
    );
    return corners[idx % 6u];
}

fn rotate_vec2(v: vec2<f32>, angle: f32) -> vec2<f32> {
    let c = cos(angle);
    let s = sin(angle);
    return vec2<f32>(v.x * c - v.y * s, v.x * s + v.y * c);
}

fn polar_to_cartesian(theta: f32, r: f32) -> vec2<f32> {
    return vec2<f32>(cos(theta), sin(theta)) * r;
}

fn in_unit_circle(seed: u32) -> vec2<f32> {
    let angle = rand(seed) * TAU;
    let radius = sqrt(rand(seed ^ 0x9e3779b9u));
    return polar_to_cartesian(angle, radius);
}
"#;

/// Returns all utility functions combined.
pub fn all_utils_wgsl() -> String {
    format!("{}\n{}", RANDOM_WGSL, GEOMETRY_WGSL)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_declares_helpers() {
        let lib = all_utils_wgsl();
        for name in [
            "fn hash(",
            "fn rand(",
            "fn rand_range(",
            "fn quad_vert(",
            "fn rotate_vec2(",
            "fn polar_to_cartesian(",
            "fn in_unit_circle(",
        ] {
            assert!(lib.contains(name), "missing {name}");
        }
    }

    #[test]
    fn test_quad_matches_cpu_corners() {
        for corner in crate::math::QUAD_VERTICES {
            let text = format!("vec2<f32>({:.1}, {:.1})", corner.x, corner.y);
            assert!(GEOMETRY_WGSL.contains(&text), "missing {text}");
        }
    }
}
