//! The mass table buffer.
//!
//! Bound read-only by every update kernel and drawn as a vertex buffer.
//! Only the first `visible` entries are drawn, so the pointer mass can sit
//! after the world masses without being shown.

use wgpu::util::DeviceExt;

use crate::kernel::MassInstance;
use crate::mass::MassTable;
use crate::shaders::mass_render_shader;

use super::pipeline::{Blend, QuadPipeline, ViewBinding};

pub struct MassLayer {
    buffer: wgpu::Buffer,
    pipeline: QuadPipeline,
    visible: u32,
}

impl MassLayer {
    pub fn new(device: &wgpu::Device, format: wgpu::TextureFormat, view: &ViewBinding) -> Self {
        let table = MassTable::new();
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Mass Buffer"),
            contents: bytemuck::cast_slice(table.as_gpu()),
            usage: wgpu::BufferUsages::STORAGE
                | wgpu::BufferUsages::VERTEX
                | wgpu::BufferUsages::COPY_DST,
        });

        let pipeline = QuadPipeline::new::<MassInstance>(
            device,
            format,
            view,
            "Mass Render",
            &mass_render_shader(),
            Blend::Alpha,
        );

        Self {
            buffer,
            pipeline,
            visible: 0,
        }
    }

    /// Write the whole table. Must happen before the update pass reads it.
    pub fn upload(&mut self, queue: &wgpu::Queue, table: &MassTable, visible: usize) {
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(table.as_gpu()));
        self.visible = visible.min(table.len()) as u32;
    }

    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }

    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>, view: &ViewBinding) {
        self.pipeline.draw(pass, view, &self.buffer, self.visible);
    }
}
