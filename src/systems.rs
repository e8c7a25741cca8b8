//! The jellyfish rockets world.
//!
//! Cells fade in at random spots, launch in a random direction, spray
//! exhaust particles while drag slows them down, then shrink away. The world
//! is measured in pixels (`0..WORLD_SIZE` on both axes, y down) and advances
//! one tick per simulated frame; velocities are in pixels per tick.
//!
//! ```ignore
//! let mut world = jellyfish_world(JellyfishSettings::default(), 42);
//! let mut schedule = jellyfish_schedule();
//! schedule.run(&mut world);
//! ```

use bevy_ecs::prelude::*;
use glam::Vec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::components::{Cell, CellState, Drag, Lifetime, Position, Radius, TrailParticle, Velocity};
use crate::math::{random_range, random_vec_on_zero};
use crate::GpuInstance;

/// Edge length of the square world in pixels.
pub const WORLD_SIZE: f32 = 800.0;

/// Radius change per tick while a cell grows or shrinks.
pub const CELL_GROWTH: f32 = 0.25;

/// Radius at which a birthing cell launches.
pub const CELL_LAUNCH_RADIUS: f32 = 25.0;

/// Speed below which a moving cell starts dying.
pub const CELL_STALL_SPEED: f32 = 0.1;

pub const CELL_DRAG: f32 = 0.985;
pub const TRAIL_DRAG: f32 = 0.98;

/// Trail particles emitted per moving cell per tick.
pub const TRAILS_PER_TICK: usize = 3;

#[derive(Resource, Clone, Copy, Debug, PartialEq)]
pub struct JellyfishSettings {
    /// Chance per tick that a new cell appears.
    pub spawn_chance: f32,
    pub world_size: f32,
}

impl Default for JellyfishSettings {
    fn default() -> Self {
        Self {
            spawn_chance: 0.06,
            world_size: WORLD_SIZE,
        }
    }
}

#[derive(Resource)]
pub struct JellyfishRng(pub StdRng);

/// Instance record for one exhaust particle.
#[derive(GpuInstance, Clone, Copy, Debug, Default, PartialEq)]
pub struct TrailInstance {
    pub pos: Vec2,
    pub velocity: Vec2,
    pub size: f32,
    pub completion: f32,
}

/// Instance record for one cell body.
#[derive(GpuInstance, Clone, Copy, Debug, Default, PartialEq)]
pub struct CellInstance {
    pub pos: Vec2,
    pub size: f32,
}

/// An empty world with the resources the systems need.
pub fn jellyfish_world(settings: JellyfishSettings, seed: u64) -> World {
    let mut world = World::new();
    world.insert_resource(settings);
    world.insert_resource(JellyfishRng(StdRng::seed_from_u64(seed)));
    world
}

/// All systems in tick order.
pub fn jellyfish_schedule() -> Schedule {
    let mut schedule = Schedule::default();
    schedule.add_systems(
        (
            update_positions,
            apply_drag,
            update_lifetimes,
            remove_dead,
            spawn_cells,
            birth_cells,
            move_cells,
            kill_cells,
        )
            .chain(),
    );
    schedule
}

/// Integrate and keep everything inside the world, one radius from the edges.
pub fn update_positions(
    settings: Res<JellyfishSettings>,
    mut query: Query<(&mut Position, &mut Velocity, Option<&Radius>)>,
) {
    let size = settings.world_size;
    for (mut pos, mut vel, radius) in &mut query {
        pos.0 += vel.0;

        let r = radius.map_or(0.0, |r| r.0);
        if pos.0.x < r {
            vel.0.x = vel.0.x.abs();
        }
        if pos.0.y < r {
            vel.0.y = vel.0.y.abs();
        }
        if pos.0.x > size - r {
            vel.0.x = -vel.0.x.abs();
        }
        if pos.0.y > size - r {
            vel.0.y = -vel.0.y.abs();
        }
    }
}

pub fn apply_drag(mut query: Query<(&mut Velocity, &Drag)>) {
    for (mut vel, drag) in &mut query {
        vel.0 *= drag.0;
    }
}

pub fn update_lifetimes(mut query: Query<&mut Lifetime>) {
    for mut lifetime in &mut query {
        lifetime.tick(1.0);
    }
}

pub fn remove_dead(mut commands: Commands, query: Query<(Entity, &Lifetime)>) {
    for (entity, lifetime) in &query {
        if lifetime.is_dead() {
            commands.entity(entity).despawn();
        }
    }
}

pub fn spawn_cells(
    mut commands: Commands,
    settings: Res<JellyfishSettings>,
    mut rng: ResMut<JellyfishRng>,
) {
    if rng.0.gen::<f32>() < settings.spawn_chance {
        let pos = Vec2::new(
            rng.0.gen::<f32>() * settings.world_size,
            rng.0.gen::<f32>() * settings.world_size,
        );
        commands.spawn(cell_bundle(pos));
    }
}

/// Components of a freshly appeared cell.
pub fn cell_bundle(pos: Vec2) -> (Cell, Position, Velocity, Drag, Radius) {
    (
        Cell::default(),
        Position(pos),
        Velocity(Vec2::ZERO),
        Drag(CELL_DRAG),
        Radius(0.0),
    )
}

pub fn birth_cells(
    mut rng: ResMut<JellyfishRng>,
    mut query: Query<(&mut Cell, &mut Radius, &mut Velocity)>,
) {
    for (mut cell, mut radius, mut vel) in &mut query {
        if cell.state != CellState::Birthing {
            continue;
        }
        radius.0 += CELL_GROWTH;

        if radius.0 > CELL_LAUNCH_RADIUS {
            cell.state = CellState::Moving;
            vel.0 = Vec2::new(
                random_range(&mut rng.0, -15.0, 15.0),
                random_range(&mut rng.0, -15.0, 15.0),
            );
        }
    }
}

/// Moving cells leave exhaust every tick, including the tick they stall on.
pub fn move_cells(
    mut commands: Commands,
    mut rng: ResMut<JellyfishRng>,
    mut query: Query<(&mut Cell, &Position, &Velocity)>,
) {
    for (mut cell, pos, vel) in &mut query {
        if cell.state != CellState::Moving {
            continue;
        }
        if vel.0.length() < CELL_STALL_SPEED {
            cell.state = CellState::Dying;
        }
        for _ in 0..TRAILS_PER_TICK {
            let exhaust = -vel.0 + random_vec_on_zero(&mut rng.0, 1.5);
            commands.spawn((
                TrailParticle,
                Position(pos.0),
                Velocity(exhaust),
                Drag(TRAIL_DRAG),
                Radius(random_range(&mut rng.0, 1.0, 4.0)),
                Lifetime::new(random_range(&mut rng.0, 50.0, 150.0)),
            ));
        }
    }
}

pub fn kill_cells(mut commands: Commands, mut query: Query<(Entity, &Cell, &mut Radius)>) {
    for (entity, cell, mut radius) in &mut query {
        if cell.state != CellState::Dying {
            continue;
        }
        radius.0 -= CELL_GROWTH;
        if radius.0 <= 0.0 {
            commands.entity(entity).despawn();
        }
    }
}

pub fn trail_instances(world: &mut World) -> Vec<TrailInstance> {
    world
        .query_filtered::<(&Position, &Velocity, &Radius, &Lifetime), With<TrailParticle>>()
        .iter(world)
        .map(|(pos, vel, radius, lifetime)| TrailInstance {
            pos: pos.0,
            velocity: vel.0,
            size: radius.0,
            completion: lifetime.completion(),
        })
        .collect()
}

pub fn cell_instances(world: &mut World) -> Vec<CellInstance> {
    world
        .query_filtered::<(&Position, &Radius), With<Cell>>()
        .iter(world)
        .map(|(pos, radius)| CellInstance {
            pos: pos.0,
            size: radius.0,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world() -> World {
        jellyfish_world(
            JellyfishSettings {
                spawn_chance: 0.0,
                ..Default::default()
            },
            9,
        )
    }

    fn run<M>(world: &mut World, systems: impl IntoSystemConfigs<M>) {
        let mut schedule = Schedule::default();
        schedule.add_systems(systems);
        schedule.run(world);
    }

    fn count<F: bevy_ecs::query::QueryFilter>(world: &mut World) -> usize {
        world.query_filtered::<Entity, F>().iter(world).count()
    }

    #[test]
    fn test_spawn_cells_always_with_full_chance() {
        let mut world = jellyfish_world(
            JellyfishSettings {
                spawn_chance: 1.0,
                ..Default::default()
            },
            1,
        );
        run(&mut world, spawn_cells);
        let cells = cell_instances(&mut world);
        assert_eq!(cells.len(), 1);
        assert_eq!(cells[0].size, 0.0);
        assert!(cells[0].pos.x >= 0.0 && cells[0].pos.x < WORLD_SIZE);
    }

    #[test]
    fn test_birthing_cell_launches() {
        let mut world = world();
        let cell = world.spawn(cell_bundle(Vec2::splat(400.0))).id();
        world.get_mut::<Radius>(cell).unwrap().0 = 24.9;

        run(&mut world, birth_cells);
        assert_eq!(world.get::<Cell>(cell).unwrap().state, CellState::Moving);
        let vel = world.get::<Velocity>(cell).unwrap().0;
        assert!(vel.x >= -15.0 && vel.x < 15.0);
        assert!(vel.y >= -15.0 && vel.y < 15.0);
    }

    #[test]
    fn test_birthing_cell_grows() {
        let mut world = world();
        let cell = world.spawn(cell_bundle(Vec2::splat(400.0))).id();
        run(&mut world, birth_cells);
        assert_eq!(world.get::<Radius>(cell).unwrap().0, CELL_GROWTH);
        assert_eq!(world.get::<Cell>(cell).unwrap().state, CellState::Birthing);
    }

    #[test]
    fn test_moving_cell_emits_trails() {
        let mut world = world();
        let cell = world
            .spawn((
                Cell {
                    state: CellState::Moving,
                },
                Position(Vec2::splat(400.0)),
                Velocity(Vec2::new(5.0, 0.0)),
                Drag(CELL_DRAG),
                Radius(26.0),
            ))
            .id();

        run(&mut world, move_cells);
        let trails = trail_instances(&mut world);
        assert_eq!(trails.len(), TRAILS_PER_TICK);
        for trail in &trails {
            assert_eq!(trail.pos, Vec2::splat(400.0));
            assert!((trail.velocity.x + 5.0).abs() <= 1.5);
            assert!(trail.size >= 1.0 && trail.size < 4.0);
        }
        assert_eq!(world.get::<Cell>(cell).unwrap().state, CellState::Moving);
    }

    #[test]
    fn test_stalled_cell_leaves_last_trail_then_shrinks() {
        let mut world = world();
        let cell = world
            .spawn((
                Cell {
                    state: CellState::Moving,
                },
                Position(Vec2::splat(400.0)),
                Velocity(Vec2::new(0.05, 0.0)),
                Radius(0.5),
            ))
            .id();

        run(&mut world, move_cells);
        assert_eq!(world.get::<Cell>(cell).unwrap().state, CellState::Dying);
        assert_eq!(count::<With<TrailParticle>>(&mut world), TRAILS_PER_TICK);

        // Dying cells emit nothing further
        run(&mut world, move_cells);
        assert_eq!(count::<With<TrailParticle>>(&mut world), TRAILS_PER_TICK);

        run(&mut world, kill_cells);
        assert_eq!(world.get::<Radius>(cell).unwrap().0, 0.25);
        run(&mut world, kill_cells);
        assert!(world.get_entity(cell).is_none());
    }

    #[test]
    fn test_lifetimes_expire() {
        let mut world = world();
        world.spawn((TrailParticle, Lifetime::new(1.0)));

        run(&mut world, (update_lifetimes, remove_dead).chain());
        assert_eq!(count::<With<TrailParticle>>(&mut world), 1);
        run(&mut world, (update_lifetimes, remove_dead).chain());
        assert_eq!(count::<With<TrailParticle>>(&mut world), 0);
    }

    #[test]
    fn test_walls_bounce_with_radius_margin() {
        let mut world = world();
        let e = world
            .spawn((
                Position(Vec2::new(785.0, 10.0)),
                Velocity(Vec2::new(2.0, -2.0)),
                Radius(20.0),
            ))
            .id();
        let bare = world
            .spawn((Position(Vec2::new(1.0, 400.0)), Velocity(Vec2::new(-2.0, 0.0))))
            .id();

        run(&mut world, update_positions);
        assert_eq!(world.get::<Velocity>(e).unwrap().0, Vec2::new(-2.0, 2.0));
        assert_eq!(world.get::<Position>(e).unwrap().0, Vec2::new(787.0, 8.0));
        assert_eq!(world.get::<Velocity>(bare).unwrap().0, Vec2::new(2.0, 0.0));
    }

    #[test]
    fn test_drag() {
        let mut world = world();
        let e = world.spawn((Velocity(Vec2::new(10.0, -4.0)), Drag(0.5))).id();
        run(&mut world, apply_drag);
        assert_eq!(world.get::<Velocity>(e).unwrap().0, Vec2::new(5.0, -2.0));
    }

    #[test]
    fn test_schedule_populates_world() {
        let mut world = jellyfish_world(JellyfishSettings::default(), 1234);
        let mut schedule = jellyfish_schedule();
        for _ in 0..600 {
            schedule.run(&mut world);
        }
        // At 6% per tick some cell has appeared in 600 ticks
        assert!(count::<With<Cell>>(&mut world) > 0 || count::<With<TrailParticle>>(&mut world) > 0);
        for cell in cell_instances(&mut world) {
            assert!(cell.size >= 0.0);
        }
    }

    #[test]
    fn test_instance_layouts() {
        assert_eq!(TrailInstance::SIZE, 32);
        assert_eq!(CellInstance::SIZE, 16);
    }
}
