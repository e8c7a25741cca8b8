//! CPU reference of the particle update kernels.
//!
//! The WGSL in [`crate::shaders`] runs these same steps on the GPU, one
//! invocation per instance. Keeping a CPU copy lets the physics be tested
//! and benchmarked without a device, and seeds the instance buffers.
//!
//! All positions live in the `[-1, 1]` square.

use glam::Vec2;
use rand::Rng;

use crate::mass::MASS_CAPACITY;
use crate::math::{
    in_unit_circle, polar_to_cartesian, random_on_zero, random_range, random_vec_on_zero,
};
use crate::spawner::Spawner;
use crate::GpuInstance;

/// Gravitational constant.
pub const G: f32 = 1.0;

/// Distance exponent of the attraction falloff.
pub const FALLOFF_EXPONENT: f32 = 1.3;

/// Fraction of speed kept when bouncing off the bounds.
pub const BOUNCE_DAMPING: f32 = 0.7;

/// Frame rate the per-frame explosion velocities were tuned for.
pub const REFERENCE_FPS: f32 = 60.0;

/// A spawner-owned particle.
///
/// `age < 0` means the particle is still waiting for its first birth and is
/// not drawn.
#[derive(GpuInstance, Clone, Copy, Debug, Default, PartialEq)]
pub struct ParticleInstance {
    pub pos: Vec2,
    pub vel: Vec2,
    pub lifetime: f32,
    pub age: f32,
    pub born: u32,
}

/// A particle with no lifecycle, used by the plasma field and explosions.
#[derive(GpuInstance, Clone, Copy, Debug, Default, PartialEq)]
pub struct DriftInstance {
    pub pos: Vec2,
    pub vel: Vec2,
}

/// One entry of the mass table.
#[derive(GpuInstance, Clone, Copy, Debug, Default, PartialEq)]
pub struct MassInstance {
    pub pos: Vec2,
    pub mass: f32,
}

/// Add the pull of every active mass to `vel`.
///
/// Iteration stops at the first zero mass. A particle sitting exactly on a
/// mass gets no force from it.
pub fn accumulate_mass_forces(pos: Vec2, vel: Vec2, masses: &[MassInstance], dt: f32) -> Vec2 {
    let mut vel = vel;
    for m in masses.iter().take(MASS_CAPACITY) {
        if m.mass == 0.0 {
            break;
        }
        let diff = m.pos - pos;
        let dist = diff.length();
        if dist == 0.0 {
            continue;
        }
        vel += diff * (G / dist.powf(FALLOFF_EXPONENT)) * m.mass * dt;
    }
    vel
}

/// Keep a particle inside `[-1, 1]`.
///
/// Velocity pointing out of a crossed bound is flipped and damped, and the
/// position is reflected back across the bound. Velocity already pointing
/// inward is left alone.
pub fn bounce(pos: Vec2, vel: Vec2) -> (Vec2, Vec2) {
    let (x, vx) = bounce_axis(pos.x, vel.x);
    let (y, vy) = bounce_axis(pos.y, vel.y);
    (Vec2::new(x, y), Vec2::new(vx, vy))
}

fn bounce_axis(p: f32, v: f32) -> (f32, f32) {
    if p > 1.0 {
        (2.0 - p, if v > 0.0 { -v * BOUNCE_DAMPING } else { v })
    } else if p < -1.0 {
        (-2.0 - p, if v < 0.0 { -v * BOUNCE_DAMPING } else { v })
    } else {
        (p, v)
    }
}

/// Position and velocity of a newborn particle.
pub fn birth<R: Rng + ?Sized>(origin: Vec2, spawner: &Spawner, rng: &mut R) -> (Vec2, Vec2) {
    let pos = origin + in_unit_circle(rng) * spawner.radius;
    let iv = &spawner.initial_vel;
    let theta = iv.direction + (rng.gen::<f32>() - 0.5) * iv.spread;
    let speed = iv.min_speed + rng.gen::<f32>() * (iv.max_speed - iv.min_speed);
    (pos, polar_to_cartesian(theta, speed))
}

/// Rebirth in place, carrying overshoot past the lifetime into the new age.
fn rebirth<R: Rng + ?Sized>(p: &mut ParticleInstance, origin: Vec2, spawner: &Spawner, rng: &mut R) {
    let (pos, vel) = birth(origin, spawner, rng);
    p.pos = pos;
    p.vel = vel;
    p.lifetime = spawner.lifetime;
    p.age = if spawner.lifetime > 0.0 {
        p.age.rem_euclid(spawner.lifetime)
    } else {
        0.0
    };
    p.born = 1;
}

/// One step of a spawner-owned particle.
pub fn step_particle<R: Rng + ?Sized>(
    p: &mut ParticleInstance,
    masses: &[MassInstance],
    origin: Vec2,
    spawner: &Spawner,
    dt: f32,
    rng: &mut R,
) {
    if p.age < 0.0 {
        p.age += dt;
        if p.age >= 0.0 {
            rebirth(p, origin, spawner, rng);
        }
        return;
    }

    let vel = accumulate_mass_forces(p.pos, p.vel, masses, dt);
    let (pos, vel) = bounce(p.pos, vel);
    p.pos = pos + vel * dt;
    p.vel = vel;
    p.age += dt;

    if p.age >= p.lifetime {
        rebirth(p, origin, spawner, rng);
    }
}

/// One step of a plasma field particle: forces, bounce, integrate.
pub fn step_drift(p: &mut DriftInstance, masses: &[MassInstance], dt: f32) {
    let vel = accumulate_mass_forces(p.pos, p.vel, masses, dt);
    let (pos, vel) = bounce(p.pos, vel);
    p.pos = pos + vel * dt;
    p.vel = vel;
}

/// One step of an explosion particle.
///
/// Velocity is in units per reference frame. Bounds are hard walls: the
/// velocity component is forced to point back inside, undamped.
pub fn step_explosion(p: &mut DriftInstance, dt: f32) {
    p.pos += p.vel * dt * REFERENCE_FPS;
    if p.pos.x > 1.0 {
        p.vel.x = -p.vel.x.abs();
    } else if p.pos.x < -1.0 {
        p.vel.x = p.vel.x.abs();
    }
    if p.pos.y > 1.0 {
        p.vel.y = -p.vel.y.abs();
    } else if p.pos.y < -1.0 {
        p.vel.y = p.vel.y.abs();
    }
}

/// Fresh, unborn particles for a spawner.
///
/// Ages are spread over `[-lifetime, 0)` so births trickle in instead of
/// arriving in one burst.
pub fn seed_instances<R: Rng + ?Sized>(
    count: usize,
    spawner: &Spawner,
    rng: &mut R,
) -> Vec<ParticleInstance> {
    (0..count)
        .map(|_| ParticleInstance {
            lifetime: spawner.lifetime,
            age: -(1.0 - rng.gen::<f32>()) * spawner.lifetime,
            ..Default::default()
        })
        .collect()
}

/// Explosion burst centered on `center`.
pub fn explosion_burst<R: Rng + ?Sized>(
    count: usize,
    center: Vec2,
    spread: f32,
    rng: &mut R,
) -> Vec<DriftInstance> {
    (0..count)
        .map(|_| DriftInstance {
            pos: center,
            vel: random_vec_on_zero(rng, spread),
        })
        .collect()
}

/// Plasma field start: two columns flowing in opposite directions.
///
/// Each particle picks a side `s = ±1`, starts near `(0.6 s, 0)` and moves
/// along y with speed in `[0.6, 1)` towards `s`.
pub fn field_columns<R: Rng + ?Sized>(count: usize, rng: &mut R) -> Vec<DriftInstance> {
    (0..count)
        .map(|_| {
            let side = if rng.gen::<f32>() > 0.5 { 1.0 } else { -1.0 };
            DriftInstance {
                pos: Vec2::new(
                    random_on_zero(rng, 0.2) + 0.6 * side,
                    random_on_zero(rng, 0.15),
                ),
                vel: Vec2::new(0.0, random_range(rng, 0.6, 1.0) * side),
            }
        })
        .collect()
}

/// Fraction of life used, clamped to `[0, 1]`.
pub fn completion(age: f32, lifetime: f32) -> f32 {
    if lifetime <= 0.0 {
        return 0.0;
    }
    (age / lifetime).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spawner::InitialVelocity;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn mass(x: f32, y: f32, mass: f32) -> MassInstance {
        MassInstance {
            pos: Vec2::new(x, y),
            mass,
        }
    }

    #[test]
    fn test_instance_sizes() {
        assert_eq!(ParticleInstance::SIZE, 32);
        assert_eq!(DriftInstance::SIZE, 16);
        assert_eq!(MassInstance::SIZE, 16);
        assert_eq!(std::mem::size_of::<ParticleInstanceGpu>(), 32);
    }

    #[test]
    fn test_single_mass_pull() {
        let masses = [mass(1.0, 0.0, 1.0)];
        let vel = accumulate_mass_forces(Vec2::ZERO, Vec2::ZERO, &masses, 0.1);
        // |diff| = 1, so the pull is diff * mass * dt
        assert!((vel - Vec2::new(0.1, 0.0)).length() < 1e-6);
    }

    #[test]
    fn test_falloff_exponent() {
        let masses = [mass(2.0, 0.0, 1.0)];
        let vel = accumulate_mass_forces(Vec2::ZERO, Vec2::ZERO, &masses, 1.0);
        let expected = 2.0 / 2.0f32.powf(1.3);
        assert!((vel.x - expected).abs() < 1e-5);
    }

    #[test]
    fn test_zero_mass_terminates_table() {
        let masses = [mass(1.0, 0.0, 1.0), mass(0.0, 0.0, 0.0), mass(-1.0, 0.0, 5.0)];
        let vel = accumulate_mass_forces(Vec2::ZERO, Vec2::ZERO, &masses, 0.1);
        assert!((vel.x - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_coincident_mass_adds_nothing() {
        let masses = [mass(0.3, 0.3, 1.0)];
        let vel = accumulate_mass_forces(Vec2::splat(0.3), Vec2::X, &masses, 0.1);
        assert_eq!(vel, Vec2::X);
        assert!(vel.is_finite());
    }

    #[test]
    fn test_bounce_reflects_and_damps() {
        let (pos, vel) = bounce(Vec2::new(1.2, -1.1), Vec2::new(1.0, -2.0));
        assert!((pos - Vec2::new(0.8, -0.9)).length() < 1e-6);
        assert!((vel - Vec2::new(-0.7, 1.4)).length() < 1e-6);
    }

    #[test]
    fn test_bounce_keeps_inward_velocity() {
        let (pos, vel) = bounce(Vec2::new(1.1, 0.0), Vec2::new(-0.5, 0.0));
        assert!((pos.x - 0.9).abs() < 1e-6);
        assert_eq!(vel.x, -0.5);
    }

    #[test]
    fn test_birth_inside_disc_and_cone() {
        let mut rng = StdRng::seed_from_u64(11);
        let spawner = Spawner {
            initial_vel: InitialVelocity {
                direction: 1.0,
                spread: 0.5,
                min_speed: 0.2,
                max_speed: 0.4,
            },
            radius: 0.1,
            lifetime: 5.0,
        };
        let origin = Vec2::new(-0.5, 0.25);
        for _ in 0..500 {
            let (pos, vel) = birth(origin, &spawner, &mut rng);
            assert!(pos.distance(origin) <= 0.1 + 1e-5);
            let speed = vel.length();
            assert!((0.2 - 1e-5..=0.4 + 1e-5).contains(&speed));
            let angle = vel.y.atan2(vel.x);
            assert!((angle - 1.0).abs() <= 0.25 + 1e-4);
        }
    }

    #[test]
    fn test_pending_particle_only_ages() {
        let mut rng = StdRng::seed_from_u64(1);
        let spawner = Spawner::default();
        let mut p = ParticleInstance {
            pos: Vec2::new(0.5, 0.5),
            lifetime: 25.0,
            age: -1.0,
            ..Default::default()
        };
        let masses = [mass(0.0, 0.0, 10.0)];
        step_particle(&mut p, &masses, Vec2::ZERO, &spawner, 0.25, &mut rng);
        assert_eq!(p.age, -0.75);
        assert_eq!(p.pos, Vec2::new(0.5, 0.5));
        assert_eq!(p.vel, Vec2::ZERO);
        assert_eq!(p.born, 0);
    }

    #[test]
    fn test_pending_particle_born_on_crossing_zero() {
        let mut rng = StdRng::seed_from_u64(2);
        let spawner = Spawner::default();
        let origin = Vec2::new(0.4, -0.2);
        let mut p = ParticleInstance {
            lifetime: 25.0,
            age: -0.1,
            ..Default::default()
        };
        step_particle(&mut p, &[], origin, &spawner, 0.25, &mut rng);
        assert_eq!(p.born, 1);
        assert!((p.age - 0.15).abs() < 1e-6);
        assert!(p.pos.distance(origin) <= spawner.radius + 1e-6);
    }

    #[test]
    fn test_expired_particle_reborn_with_spawner_lifetime() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut spawner = Spawner::default();
        spawner.lifetime = 2.0;
        let mut p = ParticleInstance {
            pos: Vec2::new(0.9, 0.9),
            lifetime: 5.0,
            age: 4.9,
            born: 1,
            ..Default::default()
        };
        step_particle(&mut p, &[], Vec2::ZERO, &spawner, 0.2, &mut rng);
        assert_eq!(p.lifetime, 2.0);
        // 5.1 mod 2.0
        assert!((p.age - 1.1).abs() < 1e-5);
        assert!(p.pos.length() <= spawner.radius + 1e-6);
    }

    #[test]
    fn test_live_particle_integrates() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut p = ParticleInstance {
            pos: Vec2::ZERO,
            vel: Vec2::new(0.5, 0.0),
            lifetime: 10.0,
            age: 1.0,
            born: 1,
        };
        step_particle(&mut p, &[], Vec2::ZERO, &Spawner::default(), 0.1, &mut rng);
        assert!((p.pos.x - 0.05).abs() < 1e-6);
        assert!((p.age - 1.1).abs() < 1e-6);
    }

    #[test]
    fn test_drift_stays_bounded() {
        let masses = [mass(0.0, 0.0, 0.5)];
        let mut p = DriftInstance {
            pos: Vec2::new(0.6, 0.0),
            vel: Vec2::new(0.0, 0.8),
        };
        for _ in 0..2000 {
            step_drift(&mut p, &masses, 1.0 / 60.0);
            assert!(p.pos.x.abs() < 1.1 && p.pos.y.abs() < 1.1);
        }
    }

    #[test]
    fn test_explosion_walls() {
        let mut p = DriftInstance {
            pos: Vec2::new(0.999, 0.0),
            vel: Vec2::new(0.01, -0.002),
        };
        step_explosion(&mut p, 1.0 / REFERENCE_FPS);
        assert!(p.pos.x > 1.0);
        assert!(p.vel.x < 0.0);
        assert_eq!(p.vel.y, -0.002);
    }

    #[test]
    fn test_seeded_ages_are_pending() {
        let mut rng = StdRng::seed_from_u64(5);
        let spawner = Spawner::default();
        for p in seed_instances(1000, &spawner, &mut rng) {
            assert!(p.age < 0.0 && p.age >= -spawner.lifetime);
            assert_eq!(p.born, 0);
            assert_eq!(p.lifetime, spawner.lifetime);
        }
    }

    #[test]
    fn test_explosion_burst_centered() {
        let mut rng = StdRng::seed_from_u64(6);
        let burst = explosion_burst(100, Vec2::new(0.2, 0.3), 0.002, &mut rng);
        assert!(burst.iter().all(|p| p.pos == Vec2::new(0.2, 0.3)));
        assert!(burst.iter().all(|p| p.vel.x.abs() <= 0.002 && p.vel.y.abs() <= 0.002));
    }

    #[test]
    fn test_field_columns_flow_apart() {
        let mut rng = StdRng::seed_from_u64(8);
        let field = field_columns(500, &mut rng);
        for p in &field {
            let side = p.vel.y.signum();
            assert!((p.pos.x - 0.6 * side).abs() <= 0.2 + 1e-6);
            assert!(p.pos.y.abs() <= 0.15);
            assert!(p.vel.y.abs() >= 0.6 && p.vel.y.abs() <= 1.0);
            assert_eq!(p.vel.x, 0.0);
        }
        assert!(field.iter().any(|p| p.vel.y > 0.0));
        assert!(field.iter().any(|p| p.vel.y < 0.0));
    }

    #[test]
    fn test_completion() {
        assert_eq!(completion(5.0, 10.0), 0.5);
        assert_eq!(completion(-1.0, 10.0), 0.0);
        assert_eq!(completion(12.0, 10.0), 1.0);
        assert_eq!(completion(1.0, 0.0), 0.0);
    }
}
