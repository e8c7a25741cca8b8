//! Point masses ("warpers") and the pointer mass.
//!
//! Masses are entities with a [`Position`] and a [`Mass`]. Each frame they
//! are packed into a fixed [`MassTable`] of [`MASS_CAPACITY`] entries that
//! every update kernel reads; a zero entry ends the active prefix.

use bevy_ecs::prelude::*;
use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::components::{next_spawned, sort_by_spawn, spawn_key, Position, Spawned};
use crate::kernel::{MassInstance, MassInstanceGpu};
use crate::GpuInstance;

/// Number of slots in the mass table.
pub const MASS_CAPACITY: usize = 32;

/// Attractor strength. Negative values repel.
#[derive(Component, Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Mass(pub f32);

impl Default for Mass {
    fn default() -> Self {
        Mass(1.0)
    }
}

pub fn add_mass(world: &mut World, pos: Vec2, mass: Mass) -> Entity {
    let stamp = next_spawned(world);
    world.spawn((Position(pos), mass, stamp)).id()
}

/// All mass entities in creation order.
pub fn mass_entities(world: &mut World) -> Vec<Entity> {
    let mut entities: Vec<Entity> = world
        .query_filtered::<Entity, (With<Mass>, With<Position>)>()
        .iter(world)
        .collect();
    sort_by_spawn(world, &mut entities);
    entities
}

/// `(position, mass)` of every mass entity in creation order.
pub fn collect_masses(world: &mut World) -> Vec<MassInstance> {
    let mut masses: Vec<((u64, u32), MassInstance)> = world
        .query::<(Entity, &Position, &Mass, Option<&Spawned>)>()
        .iter(world)
        .map(|(entity, pos, mass, stamp)| {
            (
                spawn_key(stamp, entity),
                MassInstance {
                    pos: pos.0,
                    mass: mass.0,
                },
            )
        })
        .collect();
    masses.sort_by_key(|(key, _)| *key);
    masses.into_iter().map(|(_, m)| m).collect()
}

/// Fixed-size, zero-terminated table of active masses.
#[derive(Clone, Debug)]
pub struct MassTable {
    slots: Vec<MassInstanceGpu>,
    len: usize,
    dropped: usize,
}

impl Default for MassTable {
    fn default() -> Self {
        Self::new()
    }
}

impl MassTable {
    pub fn new() -> Self {
        Self {
            slots: vec![MassInstance::default().to_gpu(); MASS_CAPACITY],
            len: 0,
            dropped: 0,
        }
    }

    /// Pack non-zero masses contiguously from slot 0.
    ///
    /// Zero masses are skipped so they cannot cut the table short; entries
    /// past the capacity are dropped, with a warning whenever the number
    /// dropped changes. Returns the number of active slots.
    pub fn pack<I>(&mut self, masses: I) -> usize
    where
        I: IntoIterator<Item = MassInstance>,
    {
        let zero = MassInstance::default().to_gpu();
        self.slots.iter_mut().for_each(|slot| *slot = zero);
        self.len = 0;

        let mut dropped = 0usize;
        for mass in masses.into_iter().filter(|m| m.mass != 0.0) {
            if self.len == MASS_CAPACITY {
                dropped += 1;
                continue;
            }
            self.slots[self.len] = mass.to_gpu();
            self.len += 1;
        }
        self.note_dropped(dropped);
        self.len
    }

    /// Record this pack's overflow. Returns true if it was reported.
    fn note_dropped(&mut self, dropped: usize) -> bool {
        if dropped == self.dropped {
            return false;
        }
        self.dropped = dropped;
        if dropped > 0 {
            log::warn!(
                "mass table holds {} entries, dropped {} extra",
                MASS_CAPACITY,
                dropped
            );
        } else {
            log::info!("mass table no longer overflows");
        }
        true
    }

    /// Masses left out by the last pack.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// Number of active slots.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// All slots, active prefix first. Always `MASS_CAPACITY` long.
    pub fn as_gpu(&self) -> &[MassInstanceGpu] {
        &self.slots
    }

    pub fn active(&self) -> impl Iterator<Item = MassInstance> + '_ {
        self.slots[..self.len].iter().map(MassInstance::from_gpu)
    }
}

/// The pointer acting as one extra mass.
///
/// Outside the window it has no pull, hovering pulls at `strength`, holding
/// a button pulls at twice that.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MouseForce {
    pub strength: f32,
    scale: f32,
    position: Vec2,
}

impl MouseForce {
    pub fn new(strength: f32) -> Self {
        Self {
            strength,
            scale: 0.0,
            position: Vec2::ZERO,
        }
    }

    pub fn on_enter(&mut self) {
        self.scale = 1.0;
    }

    pub fn on_leave(&mut self) {
        self.scale = 0.0;
    }

    pub fn on_press(&mut self) {
        self.scale = 2.0;
    }

    pub fn on_release(&mut self) {
        self.scale = 1.0;
    }

    /// Derive the scale from level state: inside and held.
    pub fn sync(&mut self, inside: bool, held: bool) {
        match (inside, held) {
            (false, _) => self.on_leave(),
            (true, true) => self.on_press(),
            (true, false) => self.on_enter(),
        }
    }

    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// The pointer as a table entry, or `None` when it exerts nothing.
    pub fn as_mass(&self) -> Option<MassInstance> {
        let mass = self.scale * self.strength;
        (mass != 0.0).then_some(MassInstance {
            pos: self.position,
            mass,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m(x: f32, mass: f32) -> MassInstance {
        MassInstance {
            pos: Vec2::new(x, 0.0),
            mass,
        }
    }

    #[test]
    fn test_pack_skips_zero_masses() {
        let mut table = MassTable::new();
        let n = table.pack([m(0.1, 1.0), m(0.2, 0.0), m(0.3, -0.5)]);
        assert_eq!(n, 2);

        let active: Vec<_> = table.active().collect();
        assert_eq!(active[0].mass, 1.0);
        assert_eq!(active[1].pos.x, 0.3);
        assert_eq!(table.as_gpu()[2].mass, 0.0);
        assert_eq!(table.as_gpu().len(), MASS_CAPACITY);
    }

    #[test]
    fn test_pack_drops_overflow() {
        let mut table = MassTable::new();
        let n = table.pack((0..40).map(|i| m(i as f32, 1.0)));
        assert_eq!(n, MASS_CAPACITY);
        assert_eq!(table.as_gpu()[MASS_CAPACITY - 1].pos[0], 31.0);
    }

    #[test]
    fn test_overflow_reported_once_per_change() {
        let mut table = MassTable::new();
        table.pack((0..40).map(|i| m(i as f32, 1.0)));
        assert_eq!(table.dropped(), 8);
        assert!(!table.note_dropped(8));
        assert!(table.note_dropped(9));

        table.pack((0..40).map(|i| m(i as f32, 1.0)));
        assert_eq!(table.dropped(), 8);
        table.pack([m(0.1, 1.0)]);
        assert_eq!(table.dropped(), 0);
        assert!(!table.note_dropped(0));
    }

    #[test]
    fn test_repack_clears_old_entries() {
        let mut table = MassTable::new();
        table.pack([m(0.1, 1.0), m(0.2, 1.0)]);
        table.pack([m(0.5, 2.0)]);
        assert_eq!(table.len(), 1);
        assert_eq!(table.as_gpu()[1].mass, 0.0);
    }

    #[test]
    fn test_mouse_force_transitions() {
        let mut mouse = MouseForce::new(0.5);
        assert!(mouse.as_mass().is_none());

        mouse.on_enter();
        mouse.set_position(Vec2::new(0.2, 0.1));
        assert_eq!(mouse.as_mass().unwrap().mass, 0.5);

        mouse.on_press();
        assert_eq!(mouse.as_mass().unwrap().mass, 1.0);

        mouse.on_release();
        assert_eq!(mouse.scale(), 1.0);

        mouse.on_leave();
        assert!(mouse.as_mass().is_none());
    }

    #[test]
    fn test_mouse_force_sync() {
        let mut mouse = MouseForce::new(1.0);
        mouse.sync(true, true);
        assert_eq!(mouse.scale(), 2.0);
        mouse.sync(false, true);
        assert_eq!(mouse.scale(), 0.0);
    }

    #[test]
    fn test_collect_masses_in_creation_order() {
        let mut world = World::new();
        add_mass(&mut world, Vec2::new(0.5, 0.0), Mass::default());
        add_mass(&mut world, Vec2::new(-0.5, 0.0), Mass(-2.0));

        let masses = collect_masses(&mut world);
        assert_eq!(masses.len(), 2);
        assert_eq!(masses[0].mass, 1.0);
        assert_eq!(masses[1].mass, -2.0);
        assert_eq!(mass_entities(&mut world).len(), 2);
    }
}
