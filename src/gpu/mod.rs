//! wgpu plumbing: device setup, shared pipelines and per-scene GPU buffers.

mod buffer;
#[cfg(feature = "egui")]
mod egui_integration;
mod masses;
mod particles;
mod pipeline;
mod swarm;

use std::sync::Arc;

use glam::Vec2;
use winit::window::Window;

pub use buffer::{InstanceBuffer, QuadLayer};
#[cfg(feature = "egui")]
pub use egui_integration::{EguiFrameOutput, EguiIntegration};
pub use masses::MassLayer;
pub use particles::{ParticlePipelines, ParticleStream};
pub use pipeline::{
    storage_entry, storage_records, uniform_entry, vertex_attributes, Blend, QuadPipeline,
    UpdatePipeline, ViewBinding,
};
pub use swarm::{Swarm, SwarmKind};

use crate::math::view_scale;
use crate::time::Time;
use crate::GpuError;

/// Background the frame is cleared to before any scene draws.
pub const CLEAR_COLOR: wgpu::Color = wgpu::Color::BLACK;

/// Surface, device and queue of the running window.
pub struct GpuContext {
    surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
}

impl GpuContext {
    pub async fn new(window: Arc<Window>) -> Result<Self, GpuError> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(GpuError::NoAdapter)?;

        log::info!("using adapter {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await?;

        // The glow colors are tuned for a linear canvas
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| !f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        Ok(Self {
            surface,
            device,
            queue,
            config,
        })
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
        }
    }

    /// Reconfigure with the current size, after the surface was lost.
    pub fn reconfigure(&mut self) {
        self.surface.configure(&self.device, &self.config);
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    pub fn view_scale(&self) -> Vec2 {
        view_scale(self.config.width, self.config.height)
    }

    pub fn current_texture(&self) -> Result<wgpu::SurfaceTexture, wgpu::SurfaceError> {
        self.surface.get_current_texture()
    }
}

/// Everything a scene needs to record one frame.
pub struct FrameContext<'a> {
    pub device: &'a wgpu::Device,
    pub queue: &'a wgpu::Queue,
    pub encoder: &'a mut wgpu::CommandEncoder,
    pub target: &'a wgpu::TextureView,
    pub view: &'a ViewBinding,
    pub time: &'a Time,
}

/// Render pass drawing over what is already in `target`.
pub fn load_pass<'e>(
    encoder: &'e mut wgpu::CommandEncoder,
    target: &'e wgpu::TextureView,
    label: &str,
) -> wgpu::RenderPass<'e> {
    color_pass(encoder, target, label, wgpu::LoadOp::Load)
}

/// Render pass that clears `target` to [`CLEAR_COLOR`] first.
pub fn clear_pass<'e>(
    encoder: &'e mut wgpu::CommandEncoder,
    target: &'e wgpu::TextureView,
) -> wgpu::RenderPass<'e> {
    color_pass(encoder, target, "Clear Pass", wgpu::LoadOp::Clear(CLEAR_COLOR))
}

fn color_pass<'e>(
    encoder: &'e mut wgpu::CommandEncoder,
    target: &'e wgpu::TextureView,
    label: &str,
    load: wgpu::LoadOp<wgpu::Color>,
) -> wgpu::RenderPass<'e> {
    encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some(label),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: target,
            resolve_target: None,
            ops: wgpu::Operations {
                load,
                store: wgpu::StoreOp::Store,
            },
        })],
        depth_stencil_attachment: None,
        timestamp_writes: None,
        occlusion_query_set: None,
    })
}
