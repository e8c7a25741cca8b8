//! ECS components shared by the experiments.
//!
//! The plasma scenes store spawners and masses as entities carrying a
//! [`Position`]; the jellyfish scene stores cells and trail particles with
//! the full kinematic set.

use bevy_ecs::prelude::*;
use glam::Vec2;

#[derive(Component, Clone, Copy, Debug, Default, PartialEq)]
pub struct Position(pub Vec2);

#[derive(Component, Clone, Copy, Debug, Default, PartialEq)]
pub struct Velocity(pub Vec2);

#[derive(Component, Clone, Copy, Debug, Default, PartialEq)]
pub struct Radius(pub f32);

/// Velocity multiplier applied once per tick.
#[derive(Component, Clone, Copy, Debug, PartialEq)]
pub struct Drag(pub f32);

/// Countdown measured in simulation ticks.
#[derive(Component, Clone, Copy, Debug, PartialEq)]
pub struct Lifetime {
    pub total: f32,
    pub current: f32,
}

impl Lifetime {
    pub fn new(total: f32) -> Self {
        Self {
            total,
            current: 0.0,
        }
    }

    pub fn tick(&mut self, elapsed: f32) {
        self.current += elapsed;
    }

    /// Dead once strictly past the total.
    pub fn is_dead(&self) -> bool {
        self.current > self.total
    }

    /// `current / total`, 0.0 for a zero-length life.
    pub fn completion(&self) -> f32 {
        if self.total <= 0.0 {
            0.0
        } else {
            self.current / self.total
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CellState {
    Birthing,
    Moving,
    Dying,
}

/// A jellyfish body.
#[derive(Component, Clone, Copy, Debug, PartialEq)]
pub struct Cell {
    pub state: CellState,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            state: CellState::Birthing,
        }
    }
}

/// Marker for exhaust particles left behind by moving cells.
#[derive(Component, Clone, Copy, Debug, Default)]
pub struct TrailParticle;

/// Marker for the entity the editing keys and panels act on.
#[derive(Component, Clone, Copy, Debug, Default)]
pub struct Selected;

/// Creation stamp. Entity indices are recycled after a despawn, so spawners
/// and masses are ordered by this instead.
#[derive(Component, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Spawned(pub u64);

#[derive(Resource, Default)]
struct SpawnCounter(u64);

/// Take the next creation stamp for `world`.
pub fn next_spawned(world: &mut World) -> Spawned {
    let mut counter = world.get_resource_or_insert_with(SpawnCounter::default);
    let stamp = Spawned(counter.0);
    counter.0 += 1;
    stamp
}

/// Sort key for creation order. Unstamped entities go last.
pub fn spawn_key(stamp: Option<&Spawned>, entity: Entity) -> (u64, u32) {
    (stamp.map_or(u64::MAX, |s| s.0), entity.index())
}

/// Sort `entities` into creation order.
pub fn sort_by_spawn(world: &World, entities: &mut [Entity]) {
    entities.sort_by_key(|&e| spawn_key(world.get::<Spawned>(e), e));
}

/// Move the [`Selected`] marker to `entity`, or clear it with `None`.
pub fn select(world: &mut World, entity: Option<Entity>) {
    let current: Vec<Entity> = world
        .query_filtered::<Entity, With<Selected>>()
        .iter(world)
        .collect();
    for e in current {
        if let Some(mut entity_mut) = world.get_entity_mut(e) {
            entity_mut.remove::<Selected>();
        }
    }
    if let Some(e) = entity {
        if let Some(mut entity_mut) = world.get_entity_mut(e) {
            entity_mut.insert(Selected);
        }
    }
}

/// The currently selected entity, if any.
pub fn selected(world: &mut World) -> Option<Entity> {
    world
        .query_filtered::<Entity, With<Selected>>()
        .iter(world)
        .next()
}
