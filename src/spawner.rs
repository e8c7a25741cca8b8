//! Particle spawners.
//!
//! A spawner is an entity with a [`Position`] and a [`Spawner`]. Each one
//! owns a fixed-size particle stream on the GPU; particles are born inside
//! the spawner's disc with a velocity drawn from its [`InitialVelocity`]
//! cone and live for the spawner's lifetime before respawning.
//!
//! ```ignore
//! let left = add_spawner(&mut world, Vec2::new(-0.5, 0.0), Spawner::default());
//! let right = mirror_x(&mut world, left);
//! ```

use bevy_ecs::prelude::*;
use bytemuck::{Pod, Zeroable};
use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

use crate::components::{next_spawned, sort_by_spawn, spawn_key, Position, Selected, Spawned};
use crate::math::wrap_angle;
use crate::GpuInstance;

/// Polar velocity distribution for newborn particles.
///
/// Angle is `direction + (u - 0.5) * spread`, speed is
/// `min_speed + u * (max_speed - min_speed)`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InitialVelocity {
    /// Radians, counter-clockwise from +x.
    pub direction: f32,
    /// Full width of the cone in radians.
    pub spread: f32,
    pub min_speed: f32,
    pub max_speed: f32,
}

impl Default for InitialVelocity {
    fn default() -> Self {
        Self {
            direction: 0.0,
            spread: 0.0,
            min_speed: 0.0,
            max_speed: 0.1,
        }
    }
}

#[derive(Component, Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Spawner {
    pub initial_vel: InitialVelocity,
    /// Radius of the birth disc.
    pub radius: f32,
    /// Seconds each particle lives before it is reborn.
    pub lifetime: f32,
}

impl Default for Spawner {
    fn default() -> Self {
        Self {
            initial_vel: InitialVelocity::default(),
            radius: 0.05,
            lifetime: 25.0,
        }
    }
}

impl Spawner {
    /// Mirror across the vertical axis.
    pub fn mirrored_x(&self) -> Self {
        let mut out = *self;
        out.initial_vel.direction = wrap_angle(PI - self.initial_vel.direction);
        out
    }

    /// Mirror across the horizontal axis.
    pub fn mirrored_y(&self) -> Self {
        let mut out = *self;
        out.initial_vel.direction = wrap_angle(-self.initial_vel.direction);
        out
    }

    pub fn to_uniform(&self, pos: Vec2) -> SpawnerUniform {
        SpawnerUniform {
            pos: pos.to_array(),
            direction: self.initial_vel.direction,
            spread: self.initial_vel.spread,
            min_speed: self.initial_vel.min_speed,
            max_speed: self.initial_vel.max_speed,
            radius: self.radius,
            lifetime: self.lifetime,
        }
    }
}

/// Spawner state as laid out at the head of the update uniforms.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct SpawnerUniform {
    pub pos: [f32; 2],
    pub direction: f32,
    pub spread: f32,
    pub min_speed: f32,
    pub max_speed: f32,
    pub radius: f32,
    pub lifetime: f32,
}

/// Instance record for the spawner markers.
#[derive(GpuInstance, Clone, Copy, Debug, Default, PartialEq)]
pub struct SpawnerInstance {
    pub pos: Vec2,
    pub radius: f32,
    pub selected: u32,
}

pub fn add_spawner(world: &mut World, pos: Vec2, spawner: Spawner) -> Entity {
    let stamp = next_spawned(world);
    world.spawn((Position(pos), spawner, stamp)).id()
}

/// Spawn the mirror image of `source` across the vertical axis.
///
/// Returns `None` if `source` is not a spawner.
pub fn mirror_x(world: &mut World, source: Entity) -> Option<Entity> {
    let (pos, spawner) = read_spawner(world, source)?;
    Some(add_spawner(
        world,
        Vec2::new(-pos.x, pos.y),
        spawner.mirrored_x(),
    ))
}

/// Spawn the mirror image of `source` across the horizontal axis.
pub fn mirror_y(world: &mut World, source: Entity) -> Option<Entity> {
    let (pos, spawner) = read_spawner(world, source)?;
    Some(add_spawner(
        world,
        Vec2::new(pos.x, -pos.y),
        spawner.mirrored_y(),
    ))
}

/// All spawners in creation order.
pub fn spawner_entities(world: &mut World) -> Vec<Entity> {
    let mut entities: Vec<Entity> = world
        .query_filtered::<Entity, (With<Spawner>, With<Position>)>()
        .iter(world)
        .collect();
    sort_by_spawn(world, &mut entities);
    entities
}

/// Marker instances for every spawner.
pub fn spawner_instances(world: &mut World) -> Vec<SpawnerInstance> {
    let mut out: Vec<((u64, u32), SpawnerInstance)> = world
        .query::<(Entity, &Position, &Spawner, Has<Selected>, Option<&Spawned>)>()
        .iter(world)
        .map(|(entity, pos, spawner, selected, stamp)| {
            (
                spawn_key(stamp, entity),
                SpawnerInstance {
                    pos: pos.0,
                    radius: spawner.radius,
                    selected: selected as u32,
                },
            )
        })
        .collect();
    out.sort_by_key(|(key, _)| *key);
    out.into_iter().map(|(_, instance)| instance).collect()
}

fn read_spawner(world: &World, entity: Entity) -> Option<(Vec2, Spawner)> {
    let pos = world.get::<Position>(entity)?.0;
    let spawner = *world.get::<Spawner>(entity)?;
    Some((pos, spawner))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::select;
    use std::f32::consts::TAU;

    #[test]
    fn test_default_spawner() {
        let s = Spawner::default();
        assert_eq!(s.initial_vel.direction, 0.0);
        assert_eq!(s.initial_vel.spread, 0.0);
        assert_eq!(s.initial_vel.min_speed, 0.0);
        assert_eq!(s.initial_vel.max_speed, 0.1);
        assert_eq!(s.radius, 0.05);
        assert_eq!(s.lifetime, 25.0);
    }

    #[test]
    fn test_mirror_x() {
        let mut world = World::new();
        let mut spawner = Spawner::default();
        spawner.initial_vel.direction = PI / 4.0;
        let source = add_spawner(&mut world, Vec2::new(0.3, 0.2), spawner);

        let mirrored = mirror_x(&mut world, source).unwrap();
        assert_eq!(world.get::<Position>(mirrored).unwrap().0, Vec2::new(-0.3, 0.2));
        let dir = world.get::<Spawner>(mirrored).unwrap().initial_vel.direction;
        assert!((dir - 3.0 * PI / 4.0).abs() < 1e-5);
    }

    #[test]
    fn test_mirror_y_wraps_direction() {
        let mut world = World::new();
        let mut spawner = Spawner::default();
        spawner.initial_vel.direction = PI / 2.0;
        let source = add_spawner(&mut world, Vec2::new(0.3, 0.2), spawner);

        let mirrored = mirror_y(&mut world, source).unwrap();
        assert_eq!(world.get::<Position>(mirrored).unwrap().0, Vec2::new(0.3, -0.2));
        let dir = world.get::<Spawner>(mirrored).unwrap().initial_vel.direction;
        assert!((dir - 1.5 * PI).abs() < 1e-5);
        assert!((0.0..TAU).contains(&dir));
    }

    #[test]
    fn test_mirror_of_non_spawner() {
        let mut world = World::new();
        let plain = world.spawn(Position(Vec2::ZERO)).id();
        assert!(mirror_x(&mut world, plain).is_none());
    }

    #[test]
    fn test_uniform_layout() {
        assert_eq!(std::mem::size_of::<SpawnerUniform>(), 32);
        let uniform = Spawner::default().to_uniform(Vec2::new(1.0, 2.0));
        assert_eq!(uniform.pos, [1.0, 2.0]);
        assert_eq!(uniform.lifetime, 25.0);
    }

    #[test]
    fn test_marker_instances_flag_selection() {
        let mut world = World::new();
        let a = add_spawner(&mut world, Vec2::ZERO, Spawner::default());
        let _b = add_spawner(&mut world, Vec2::ONE, Spawner::default());
        select(&mut world, Some(a));

        let markers = spawner_instances(&mut world);
        assert_eq!(markers.len(), 2);
        assert_eq!(markers[0].selected, 1);
        assert_eq!(markers[1].selected, 0);
        assert!(world.get::<Selected>(a).is_some());
        assert_eq!(SpawnerInstance::SIZE, 16);
    }
}
