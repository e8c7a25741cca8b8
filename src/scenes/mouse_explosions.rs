//! A particle burst that follows clicks.

use glam::Vec2;
use rand::rngs::StdRng;
use rand::Rng;
use wgpu::util::DeviceExt;

use crate::config::LabConfig;
use crate::gpu::{load_pass, FrameContext, Swarm, SwarmKind};
use crate::input::MouseButton;
use crate::kernel::explosion_burst;
use crate::mass::MassTable;
use crate::shaders::UpdateUniforms;
use crate::InstanceBufferError;

use super::{scene_rng, Scene, SceneGpu, SceneKind, UpdateContext};

pub struct MouseExplosionsScene {
    swarm: Swarm,
    // Bound by the update layout; explosions ignore masses
    _masses: wgpu::Buffer,
    spread: f32,
    rng: StdRng,
    pending_burst: Option<Vec2>,
    delta: f32,
    elapsed: f32,
}

impl MouseExplosionsScene {
    pub fn new(config: &LabConfig, gpu: &SceneGpu) -> Self {
        let masses = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Explosion Masses"),
                contents: bytemuck::cast_slice(MassTable::new().as_gpu()),
                usage: wgpu::BufferUsages::STORAGE,
            });

        let mut rng = scene_rng(config.seed);
        let spread = config.explosions.spread;
        let burst = explosion_burst(
            config.explosions.particle_count as usize,
            Vec2::ZERO,
            spread,
            &mut rng,
        );
        let swarm = Swarm::new(
            gpu.device,
            gpu.format,
            gpu.view,
            SwarmKind::Explosion,
            &masses,
            &burst,
        );

        Self {
            swarm,
            _masses: masses,
            spread,
            rng,
            pending_burst: None,
            delta: 0.0,
            elapsed: 0.0,
        }
    }
}

impl Scene for MouseExplosionsScene {
    fn kind(&self) -> SceneKind {
        SceneKind::MouseExplosions
    }

    fn update(&mut self, ctx: &UpdateContext) {
        if ctx.pointer_active() && ctx.input.mouse_pressed(MouseButton::Left) {
            self.pending_burst = Some(ctx.pointer());
        }
        self.delta = ctx.time.delta();
        self.elapsed = ctx.time.elapsed();
    }

    fn render(&mut self, frame: &mut FrameContext) -> Result<(), InstanceBufferError> {
        if let Some(center) = self.pending_burst.take() {
            let burst = explosion_burst(
                self.swarm.count() as usize,
                center,
                self.spread,
                &mut self.rng,
            );
            self.swarm.upload(frame.queue, &burst);
        }

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
                label: Some("Explosion Update"),
                timestamp_writes: None,
            });
            self.swarm.dispatch(&mut pass);
        }

        {
            let mut pass = load_pass(frame.encoder, frame.target, "Explosion Render");
            self.swarm.draw(&mut pass, frame.view);
        }

        Ok(())
    }

    /// Burst again from the origin.
    fn reset(&mut self) {
        self.pending_burst = Some(Vec2::ZERO);
    }
}
