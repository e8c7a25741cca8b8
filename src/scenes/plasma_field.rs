//! Two counter-flowing columns of immortal particles bent by masses.

use bevy_ecs::prelude::*;
use rand::rngs::StdRng;
use rand::Rng;

use crate::config::LabConfig;
use crate::gpu::{load_pass, FrameContext, MassLayer, Swarm, SwarmKind};
use crate::kernel::field_columns;
use crate::mass::add_mass;
use crate::shaders::UpdateUniforms;
use crate::InstanceBufferError;

use super::editing::{apply_edit, edits_from_input, Edit};
use super::gravity::Gravity;
use super::{scene_rng, Scene, SceneGpu, SceneKind, UpdateContext};

pub struct PlasmaFieldScene {
    world: World,
    swarm: Swarm,
    masses: MassLayer,
    gravity: Gravity,
    rng: StdRng,
    delta: f32,
    elapsed: f32,
    needs_reset: bool,
    #[cfg(feature = "egui")]
    tab: crate::controls::PanelTab,
}

impl PlasmaFieldScene {
    pub fn new(config: &LabConfig, gpu: &SceneGpu) -> Self {
        let mut world = World::new();
        for entry in &config.plasma_field.masses {
            add_mass(&mut world, entry.pos, entry.mass);
        }

        let mut rng = scene_rng(config.seed);
        let masses = MassLayer::new(gpu.device, gpu.format, gpu.view);
        let field = field_columns(config.plasma_field.particle_count as usize, &mut rng);
        let swarm = Swarm::new(
            gpu.device,
            gpu.format,
            gpu.view,
            SwarmKind::PlasmaField,
            masses.buffer(),
            &field,
        );

        Self {
            world,
            swarm,
            masses,
            gravity: Gravity::new(config.mouse_strength),
            rng,
            delta: 0.0,
            elapsed: 0.0,
            needs_reset: false,
            #[cfg(feature = "egui")]
            tab: crate::controls::PanelTab::Warpers,
        }
    }
}

/// The field has no spawners; only mass edits apply.
fn field_edit(edit: &Edit) -> bool {
    matches!(
        edit,
        Edit::AddMass(_) | Edit::DeleteSelected | Edit::CycleSelection
    )
}

impl Scene for PlasmaFieldScene {
    fn kind(&self) -> SceneKind {
        SceneKind::PlasmaField
    }

    fn update(&mut self, ctx: &UpdateContext) {
        for edit in edits_from_input(ctx.input, ctx.pointer())
            .into_iter()
            .filter(field_edit)
        {
            apply_edit(&mut self.world, edit);
        }
        self.gravity.update(&mut self.world, ctx);
        self.delta = ctx.time.delta();
        self.elapsed = ctx.time.elapsed();
    }

    fn render(&mut self, frame: &mut FrameContext) -> Result<(), InstanceBufferError> {
        if std::mem::take(&mut self.needs_reset) {
            let field = field_columns(self.swarm.count() as usize, &mut self.rng);
            self.swarm.upload(frame.queue, &field);
        }

        self.gravity.upload(frame.queue, &mut self.masses);
        self.swarm.write_uniforms(
            frame.queue,
            &UpdateUniforms {
                delta_time: self.delta,
                elapsed: self.elapsed,
                seed: self.rng.gen(),
                ..Default::default()
            },
        );

        {
            let mut pass = frame.encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Plasma Field Update"),
                timestamp_writes: None,
            });
            self.swarm.dispatch(&mut pass);
        }

        {
            let mut pass = load_pass(frame.encoder, frame.target, "Plasma Field Render");
            self.swarm.draw(&mut pass, frame.view);
            self.masses.draw(&mut pass, frame.view);
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
    use glam::Vec2;

    #[test]
    fn test_field_ignores_spawner_edits() {
        assert!(field_edit(&Edit::AddMass(Vec2::ZERO)));
        assert!(!field_edit(&Edit::AddSpawner(Vec2::ZERO)));
        assert!(!field_edit(&Edit::MirrorX));
    }
}
