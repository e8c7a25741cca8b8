//! Spawner-owned particle streams.
//!
//! Every spawner has its own instance buffer and uniform block; the kernel
//! and the render pipeline are shared.

use wgpu::util::DeviceExt;

use crate::kernel::ParticleInstance;
use crate::shaders::{particle_render_shader, particle_update_shader, UpdateUniforms};
use crate::GpuInstance;

use super::pipeline::{storage_records, Blend, QuadPipeline, UpdatePipeline, ViewBinding};

pub struct ParticlePipelines {
    update: UpdatePipeline,
    render: QuadPipeline,
}

impl ParticlePipelines {
    pub fn new(device: &wgpu::Device, format: wgpu::TextureFormat, view: &ViewBinding) -> Self {
        Self {
            update: UpdatePipeline::new(device, "Particle Update", &particle_update_shader()),
            render: QuadPipeline::new::<ParticleInstance>(
                device,
                format,
                view,
                "Particle Render",
                &particle_render_shader(),
                Blend::Additive,
            ),
        }
    }
}

pub struct ParticleStream {
    instances: wgpu::Buffer,
    uniforms: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    count: u32,
}

impl ParticleStream {
    pub fn new(
        device: &wgpu::Device,
        pipelines: &ParticlePipelines,
        masses: &wgpu::Buffer,
        instances: &[ParticleInstance],
    ) -> Self {
        let gpu = storage_records(instances);
        let instance_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Particle Buffer"),
            contents: bytemuck::cast_slice(&gpu),
            usage: wgpu::BufferUsages::STORAGE
                | wgpu::BufferUsages::VERTEX
                | wgpu::BufferUsages::COPY_DST,
        });

        let uniforms = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Particle Uniforms"),
            contents: bytemuck::bytes_of(&UpdateUniforms::default()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group = pipelines.update.bind(
            device,
            "Particle Update Bind Group",
            &instance_buffer,
            masses,
            &uniforms,
        );

        Self {
            instances: instance_buffer,
            uniforms,
            bind_group,
            count: instances.len() as u32,
        }
    }

    /// Overwrite every instance, e.g. with freshly seeded ones.
    pub fn reset(&self, queue: &wgpu::Queue, instances: &[ParticleInstance]) {
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

    pub fn dispatch(&self, pass: &mut wgpu::ComputePass<'_>, pipelines: &ParticlePipelines) {
        pipelines.update.dispatch(pass, &self.bind_group, self.count);
    }

    pub fn draw(
        &self,
        pass: &mut wgpu::RenderPass<'_>,
        pipelines: &ParticlePipelines,
        view: &ViewBinding,
    ) {
        pipelines.render.draw(pass, view, &self.instances, self.count);
    }

    pub fn count(&self) -> u32 {
        self.count
    }
}
