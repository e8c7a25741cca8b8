//! GPU side of [`StagingBuffer`]: a vertex buffer recreated on growth.

use crate::instance_buffer::{CapacityPolicy, StagingBuffer};
use crate::{GpuInstance, InstanceBufferError};

use super::pipeline::{Blend, QuadPipeline, ViewBinding};

/// Vertex buffer rewritten from the CPU every frame.
pub struct InstanceBuffer<T: GpuInstance> {
    label: String,
    staging: StagingBuffer<T>,
    buffer: wgpu::Buffer,
}

impl<T: GpuInstance> InstanceBuffer<T> {
    pub fn new(device: &wgpu::Device, label: &str, policy: CapacityPolicy) -> Self {
        let staging = StagingBuffer::new(policy);
        let buffer = create_buffer(device, label, staging.byte_capacity().max(T::SIZE as u64));
        Self {
            label: label.to_string(),
            staging,
            buffer,
        }
    }

    /// Replace the contents with `items`.
    ///
    /// A fixed buffer that cannot hold them keeps what it had and returns
    /// the error; the previous frame's instances stay on screen.
    pub fn write<I>(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        items: I,
    ) -> Result<(), InstanceBufferError>
    where
        I: IntoIterator<Item = T>,
    {
        if self.staging.stage(items)? {
            log::debug!(
                "{}: growing to {} instances",
                self.label,
                self.staging.capacity()
            );
            self.buffer = create_buffer(device, &self.label, self.staging.byte_capacity());
        }
        if !self.staging.is_empty() {
            queue.write_buffer(&self.buffer, 0, self.staging.as_bytes());
        }
        Ok(())
    }

    pub fn len(&self) -> u32 {
        self.staging.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.staging.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.staging.capacity()
    }

    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }
}

fn create_buffer(device: &wgpu::Device, label: &str, size: u64) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

/// A quad pipeline paired with the instance buffer it draws.
pub struct QuadLayer<T: GpuInstance> {
    pipeline: QuadPipeline,
    instances: InstanceBuffer<T>,
}

impl<T: GpuInstance> QuadLayer<T> {
    pub fn new(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        view: &ViewBinding,
        label: &str,
        source: &str,
        blend: Blend,
        policy: CapacityPolicy,
    ) -> Self {
        Self {
            pipeline: QuadPipeline::new::<T>(device, format, view, label, source, blend),
            instances: InstanceBuffer::new(device, label, policy),
        }
    }

    pub fn write<I>(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        items: I,
    ) -> Result<(), InstanceBufferError>
    where
        I: IntoIterator<Item = T>,
    {
        self.instances.write(device, queue, items)
    }

    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>, view: &ViewBinding) {
        self.pipeline
            .draw(pass, view, self.instances.buffer(), self.instances.len());
    }

    pub fn len(&self) -> u32 {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}
