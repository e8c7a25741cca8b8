//! A fixed population of drifting particles updated and drawn on the GPU.

use wgpu::util::DeviceExt;

use crate::kernel::DriftInstance;
use crate::shaders::{
    drift_render_shader, drift_update_shader, explosion_render_shader, explosion_update_shader,
    UpdateUniforms,
};
use crate::GpuInstance;

use super::pipeline::{storage_records, Blend, QuadPipeline, UpdatePipeline, ViewBinding};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SwarmKind {
    /// Mass-attracted field with bouncing walls, drawn additively.
    PlasmaField,
    /// Free-flying burst with hard walls.
    Explosion,
}

impl SwarmKind {
    fn label(self) -> &'static str {
        match self {
            SwarmKind::PlasmaField => "Plasma Field",
            SwarmKind::Explosion => "Explosion",
        }
    }

    fn shaders(self) -> (String, String) {
        match self {
            SwarmKind::PlasmaField => (drift_update_shader(), drift_render_shader()),
            SwarmKind::Explosion => (explosion_update_shader(), explosion_render_shader()),
        }
    }

    fn blend(self) -> Blend {
        match self {
            SwarmKind::PlasmaField => Blend::Additive,
            SwarmKind::Explosion => Blend::Alpha,
        }
    }
}

pub struct Swarm {
    update: UpdatePipeline,
    render: QuadPipeline,
    instances: wgpu::Buffer,
    uniforms: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    count: u32,
}

impl Swarm {
    pub fn new(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        view: &ViewBinding,
        kind: SwarmKind,
        masses: &wgpu::Buffer,
        instances: &[DriftInstance],
    ) -> Self {
        let label = kind.label();
        let (update_src, render_src) = kind.shaders();
        let update = UpdatePipeline::new(device, label, &update_src);
        let render =
            QuadPipeline::new::<DriftInstance>(device, format, view, label, &render_src, kind.blend());

        let gpu = storage_records(instances);
        let instance_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(&gpu),
            usage: wgpu::BufferUsages::STORAGE
                | wgpu::BufferUsages::VERTEX
                | wgpu::BufferUsages::COPY_DST,
        });

        let uniforms = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::bytes_of(&UpdateUniforms::default()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group = update.bind(device, label, &instance_buffer, masses, &uniforms);

        Self {
            update,
            render,
            instances: instance_buffer,
            uniforms,
            bind_group,
            count: instances.len() as u32,
        }
    }

    /// Replace the population. Extra instances past the initial count are ignored.
    pub fn upload(&self, queue: &wgpu::Queue, instances: &[DriftInstance]) {
        let gpu: Vec<_> = instances
            .iter()
            .take(self.count as usize)
            .map(GpuInstance::to_gpu)
            .collect();
        queue.write_buffer(&self.instances, 0, bytemuck::cast_slice(&gpu));
    }

    pub fn write_uniforms(&self, queue: &wgpu::Queue, uniforms: &UpdateUniforms) {
        queue.write_buffer(&self.uniforms, 0, bytemuck::bytes_of(uniforms));
    }

    pub fn dispatch(&self, pass: &mut wgpu::ComputePass<'_>) {
        self.update.dispatch(pass, &self.bind_group, self.count);
    }

    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>, view: &ViewBinding) {
        self.render.draw(pass, view, &self.instances, self.count);
    }

    pub fn count(&self) -> u32 {
        self.count
    }
}
