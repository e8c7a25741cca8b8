//! Small math helpers shared by the CPU kernels and the jellyfish systems.
//!
//! The WGSL library in [`crate::shader_utils`] has a twin for each of the
//! vector helpers here; both sides must agree.

use glam::Vec2;
use rand::Rng;
use std::f32::consts::TAU;

/// Corner offsets of the unit quad, two triangles.
pub const QUAD_VERTICES: [Vec2; 6] = [
    Vec2::new(-1.0, -1.0),
    Vec2::new(1.0, -1.0),
    Vec2::new(-1.0, 1.0),
    Vec2::new(-1.0, 1.0),
    Vec2::new(1.0, -1.0),
    Vec2::new(1.0, 1.0),
];

/// Uniform value in `[-max, max)`.
pub fn random_on_zero<R: Rng + ?Sized>(rng: &mut R, max: f32) -> f32 {
    (rng.gen::<f32>() * 2.0 - 1.0) * max
}

/// Uniform value in `[min, max)`.
pub fn random_range<R: Rng + ?Sized>(rng: &mut R, min: f32, max: f32) -> f32 {
    rng.gen::<f32>() * (max - min) + min
}

/// Vector with each component drawn from `random_on_zero(max)`.
pub fn random_vec_on_zero<R: Rng + ?Sized>(rng: &mut R, max: f32) -> Vec2 {
    Vec2::new(random_on_zero(rng, max), random_on_zero(rng, max))
}

/// Uniformly distributed point in the unit disc.
pub fn in_unit_circle<R: Rng + ?Sized>(rng: &mut R) -> Vec2 {
    let angle = rng.gen::<f32>() * TAU;
    let radius = rng.gen::<f32>().sqrt();
    polar_to_cartesian(angle, radius)
}

/// `(theta, r)` to `(r cos theta, r sin theta)`.
pub fn polar_to_cartesian(theta: f32, r: f32) -> Vec2 {
    Vec2::new(theta.cos(), theta.sin()) * r
}

/// Counter-clockwise rotation by `angle` radians.
pub fn rotate_vec2(v: Vec2, angle: f32) -> Vec2 {
    Vec2::from_angle(angle).rotate(v)
}

/// Wrap an angle into `[0, TAU)`.
pub fn wrap_angle(angle: f32) -> f32 {
    angle.rem_euclid(TAU)
}

/// Pixel coordinates (origin top-left, y down) to clip space (y up).
pub fn world_to_clip(pos: Vec2, world_size: Vec2) -> Vec2 {
    let clip = (pos / world_size - 0.5) * 2.0;
    Vec2::new(clip.x, -clip.y)
}

/// Per-axis scale that keeps the `[-1, 1]` square undistorted in a window.
pub fn view_scale(width: u32, height: u32) -> Vec2 {
    if width == 0 || height == 0 {
        return Vec2::ONE;
    }
    let (w, h) = (width as f32, height as f32);
    if w > h {
        Vec2::new(h / w, 1.0)
    } else {
        Vec2::new(1.0, w / h)
    }
}
