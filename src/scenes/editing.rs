//! Keyboard editing of spawners and masses.

use bevy_ecs::prelude::*;
use glam::Vec2;

use crate::components::{select, selected, sort_by_spawn};
use crate::input::{Input, KeyCode};
use crate::mass::{add_mass, mass_entities, Mass};
use crate::spawner::{add_spawner, mirror_x, mirror_y, spawner_entities, Spawner};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Edit {
    AddSpawner(Vec2),
    AddMass(Vec2),
    MirrorX,
    MirrorY,
    DeleteSelected,
    CycleSelection,
}

/// Edits requested by this frame's key presses. `S` and `M` place at
/// `pointer`.
pub fn edits_from_input(input: &Input, pointer: Vec2) -> Vec<Edit> {
    let mut edits = Vec::new();
    if input.key_pressed(KeyCode::S) {
        edits.push(Edit::AddSpawner(pointer));
    }
    if input.key_pressed(KeyCode::M) {
        edits.push(Edit::AddMass(pointer));
    }
    if input.key_pressed(KeyCode::X) {
        edits.push(Edit::MirrorX);
    }
    if input.key_pressed(KeyCode::Y) {
        edits.push(Edit::MirrorY);
    }
    if input.key_pressed(KeyCode::Delete) || input.key_pressed(KeyCode::Backspace) {
        edits.push(Edit::DeleteSelected);
    }
    if input.key_pressed(KeyCode::Tab) {
        edits.push(Edit::CycleSelection);
    }
    edits
}

/// Spawners and masses in creation order.
pub fn editable_entities(world: &mut World) -> Vec<Entity> {
    let mut entities = spawner_entities(world);
    entities.extend(mass_entities(world));
    sort_by_spawn(world, &mut entities);
    entities
}

/// Apply one edit. New entities become the selection.
pub fn apply_edit(world: &mut World, edit: Edit) {
    match edit {
        Edit::AddSpawner(pos) => {
            let e = add_spawner(world, pos, Spawner::default());
            log::debug!("added spawner {:?} at {}", e, pos);
            select(world, Some(e));
        }
        Edit::AddMass(pos) => {
            let e = add_mass(world, pos, Mass::default());
            log::debug!("added mass {:?} at {}", e, pos);
            select(world, Some(e));
        }
        Edit::MirrorX | Edit::MirrorY => {
            let Some(source) = selected(world) else {
                return;
            };
            let mirrored = if edit == Edit::MirrorX {
                mirror_x(world, source)
            } else {
                mirror_y(world, source)
            };
            if let Some(e) = mirrored {
                select(world, Some(e));
            }
        }
        Edit::DeleteSelected => {
            if let Some(e) = selected(world) {
                world.despawn(e);
                log::debug!("removed {:?}", e);
            }
        }
        Edit::CycleSelection => {
            let entities = editable_entities(world);
            let next = match selected(world) {
                Some(current) => entities
                    .iter()
                    .position(|&e| e == current)
                    .map(|i| entities[(i + 1) % entities.len()]),
                None => entities.first().copied(),
            };
            select(world, next.or_else(|| entities.first().copied()));
        }
    }
}
