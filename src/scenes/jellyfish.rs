//! Jellyfish rockets: the CPU world from [`crate::systems`], drawn as quads.

use bevy_ecs::prelude::*;
use rand::rngs::StdRng;
use rand::Rng;

use crate::config::{JellyfishConfig, LabConfig};
use crate::gpu::{load_pass, Blend, FrameContext, QuadLayer};
use crate::instance_buffer::CapacityPolicy;
use crate::shaders::{cell_render_shader, trail_render_shader};
use crate::systems::{
    cell_instances, jellyfish_schedule, jellyfish_world, trail_instances, CellInstance,
    JellyfishSettings, TrailInstance, WORLD_SIZE,
};
use crate::InstanceBufferError;

use super::{scene_rng, Scene, SceneGpu, SceneKind, UpdateContext};

/// Simulation ticks per second.
pub const TICK_RATE: f32 = 60.0;

/// Most ticks run in one frame; a longer backlog is dropped.
const MAX_TICKS_PER_FRAME: u32 = 4;

/// Turns frame deltas into whole ticks.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TickClock {
    accumulator: f32,
}

impl TickClock {
    /// Ticks due after `delta` more seconds.
    pub fn advance(&mut self, delta: f32) -> u32 {
        let step = 1.0 / TICK_RATE;
        self.accumulator += delta.max(0.0);
        let mut ticks = 0;
        while self.accumulator >= step {
            self.accumulator -= step;
            ticks += 1;
            if ticks == MAX_TICKS_PER_FRAME {
                self.accumulator = 0.0;
                break;
            }
        }
        ticks
    }
}

pub struct JellyfishScene {
    settings: JellyfishSettings,
    world: World,
    schedule: Schedule,
    clock: TickClock,
    rng: StdRng,
    trails: QuadLayer<TrailInstance>,
    cells: QuadLayer<CellInstance>,
}

impl JellyfishScene {
    pub fn new(config: &LabConfig, gpu: &SceneGpu) -> Self {
        let settings = settings_from(&config.jellyfish);
        let mut rng = scene_rng(config.seed);
        let world = jellyfish_world(settings, rng.gen());

        Self {
            settings,
            world,
            schedule: jellyfish_schedule(),
            clock: TickClock::default(),
            rng,
            trails: QuadLayer::new(
                gpu.device,
                gpu.format,
                gpu.view,
                "Jellyfish Trails",
                &trail_render_shader(settings.world_size),
                Blend::Alpha,
                CapacityPolicy::paged(config.jellyfish.trail_page_size),
            ),
            cells: QuadLayer::new(
                gpu.device,
                gpu.format,
                gpu.view,
                "Jellyfish Cells",
                &cell_render_shader(settings.world_size),
                Blend::Alpha,
                CapacityPolicy::fixed(config.jellyfish.cell_capacity),
            ),
        }
    }
}

fn settings_from(config: &JellyfishConfig) -> JellyfishSettings {
    JellyfishSettings {
        spawn_chance: config.spawn_chance,
        world_size: WORLD_SIZE,
    }
}

impl Scene for JellyfishScene {
    fn kind(&self) -> SceneKind {
        SceneKind::JellyfishRockets
    }

    fn update(&mut self, ctx: &UpdateContext) {
        for _ in 0..self.clock.advance(ctx.time.delta()) {
            self.schedule.run(&mut self.world);
        }
    }

    fn render(&mut self, frame: &mut FrameContext) -> Result<(), InstanceBufferError> {
        let trails = trail_instances(&mut self.world);
        self.trails.write(frame.device, frame.queue, trails)?;
        let cells = cell_instances(&mut self.world);
        self.cells.write(frame.device, frame.queue, cells)?;

        let mut pass = load_pass(frame.encoder, frame.target, "Jellyfish Render");
        self.trails.draw(&mut pass, frame.view);
        self.cells.draw(&mut pass, frame.view);
        Ok(())
    }

    fn reset(&mut self) {
        self.world = jellyfish_world(self.settings, self.rng.gen());
        self.clock = TickClock::default();
    }
}
