//! Spawner streams bent by masses and the pointer.

use std::collections::BTreeMap;

use bevy_ecs::prelude::*;
use rand::rngs::StdRng;
use rand::Rng;

use crate::components::Position;
use crate::config::{LabConfig, PlasmaConfig};
use crate::gpu::{
    load_pass, Blend, FrameContext, MassLayer, ParticlePipelines, ParticleStream, QuadLayer,
};
use crate::instance_buffer::CapacityPolicy;
use crate::kernel::seed_instances;
use crate::mass::add_mass;
use crate::shaders::{spawner_render_shader, UpdateUniforms};
use crate::spawner::{add_spawner, spawner_entities, spawner_instances, Spawner, SpawnerInstance};
use crate::InstanceBufferError;

use super::editing::{apply_edit, edits_from_input};
use super::gravity::Gravity;
use super::{scene_rng, Scene, SceneGpu, SceneKind, UpdateContext};

/// Markers grow in pages of this many spawners.
const MARKER_PAGE: usize = 16;

pub struct PlasmaScene {
    world: World,
    particles_per_spawner: usize,
    pipelines: ParticlePipelines,
    streams: BTreeMap<Entity, ParticleStream>,
    masses: MassLayer,
    markers: QuadLayer<SpawnerInstance>,
    gravity: Gravity,
    rng: StdRng,
    delta: f32,
    elapsed: f32,
    needs_reset: bool,
    #[cfg(feature = "egui")]
    tab: crate::controls::PanelTab,
}

impl PlasmaScene {
    pub fn new(config: &LabConfig, gpu: &SceneGpu) -> Self {
        Self {
            world: plasma_world(&config.plasma),
            particles_per_spawner: config.plasma.particles_per_spawner as usize,
            pipelines: ParticlePipelines::new(gpu.device, gpu.format, gpu.view),
            streams: BTreeMap::new(),
            masses: MassLayer::new(gpu.device, gpu.format, gpu.view),
            markers: QuadLayer::new(
                gpu.device,
                gpu.format,
                gpu.view,
                "Spawner Markers",
                &spawner_render_shader(),
                Blend::Alpha,
                CapacityPolicy::paged(MARKER_PAGE),
            ),
            gravity: Gravity::new(config.mouse_strength),
            rng: scene_rng(config.seed),
            delta: 0.0,
            elapsed: 0.0,
            needs_reset: false,
            #[cfg(feature = "egui")]
            tab: Default::default(),
        }
    }

    /// Streams for new spawners, none for despawned ones.
    fn sync_streams(&mut self, device: &wgpu::Device) {
        let live = spawner_entities(&mut self.world);
        self.streams.retain(|entity, _| live.contains(entity));

        for entity in live {
            if self.streams.contains_key(&entity) {
                continue;
            }
            let Some(spawner) = self.world.get::<Spawner>(entity).copied() else {
                continue;
            };
            let seeded = seed_instances(self.particles_per_spawner, &spawner, &mut self.rng);
            let stream = ParticleStream::new(device, &self.pipelines, self.masses.buffer(), &seeded);
            log::debug!("created particle stream for {:?}", entity);
            self.streams.insert(entity, stream);
        }
    }

    fn reseed(&mut self, queue: &wgpu::Queue) {
        for (entity, stream) in &self.streams {
            let Some(spawner) = self.world.get::<Spawner>(*entity) else {
                continue;
            };
            let seeded = seed_instances(stream.count() as usize, spawner, &mut self.rng);
            stream.reset(queue, &seeded);
        }
    }
}

/// World holding the configured spawners and masses.
pub(crate) fn plasma_world(config: &PlasmaConfig) -> World {
    let mut world = World::new();
    for entry in &config.spawners {
        add_spawner(&mut world, entry.pos, entry.spawner);
    }
    for entry in &config.masses {
        add_mass(&mut world, entry.pos, entry.mass);
    }
    world
}

impl Scene for PlasmaScene {
    fn kind(&self) -> SceneKind {
        SceneKind::Plasma
    }

    fn update(&mut self, ctx: &UpdateContext) {
        for edit in edits_from_input(ctx.input, ctx.pointer()) {
            apply_edit(&mut self.world, edit);
        }
        self.gravity.update(&mut self.world, ctx);
        self.delta = ctx.time.delta();
        self.elapsed = ctx.time.elapsed();
    }

    fn render(&mut self, frame: &mut FrameContext) -> Result<(), InstanceBufferError> {
        self.sync_streams(frame.device);
        if std::mem::take(&mut self.needs_reset) {
            self.reseed(frame.queue);
        }

        // Masses first: the update pass reads them
        self.gravity.upload(frame.queue, &mut self.masses);

        let mut spawners = self.world.query::<(Entity, &Position, &Spawner)>();
        for (entity, pos, spawner) in spawners.iter(&self.world) {
            if let Some(stream) = self.streams.get(&entity) {
                stream.write_uniforms(
                    frame.queue,
                    &UpdateUniforms {
                        spawner: spawner.to_uniform(pos.0),
                        delta_time: self.delta,
                        elapsed: self.elapsed,
                        seed: self.rng.gen(),
                        _pad: 0,
                    },
                );
            }
        }

        let markers = spawner_instances(&mut self.world);
        self.markers.write(frame.device, frame.queue, markers)?;

        {
            let mut pass = frame.encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Plasma Update"),
                timestamp_writes: None,
            });
            for stream in self.streams.values() {
                stream.dispatch(&mut pass, &self.pipelines);
            }
        }

        {
            let mut pass = load_pass(frame.encoder, frame.target, "Plasma Render");
            for stream in self.streams.values() {
                stream.draw(&mut pass, &self.pipelines, frame.view);
            }
            self.masses.draw(&mut pass, frame.view);
            self.markers.draw(&mut pass, frame.view);
        }

        Ok(())
    }

    fn reset(&mut self) {
        self.needs_reset = true;
    }

    #[cfg(feature = "egui")]
    fn ui(&mut self, ui: &mut egui::Ui) {
        crate::controls::plasma_panel(ui, &mut self.world, &mut self.tab);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mass::mass_entities;

    #[test]
    fn test_world_from_default_config() {
        let mut world = plasma_world(&PlasmaConfig::default());
        assert_eq!(spawner_entities(&mut world).len(), 2);
        assert_eq!(mass_entities(&mut world).len(), 1);
    }
}
