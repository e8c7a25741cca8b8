//! Pipeline builders shared by every scene.
//!
//! Two shapes cover all drawing and simulation:
//! - [`UpdatePipeline`] runs an update kernel over an instance storage buffer
//! - [`QuadPipeline`] draws 6 vertices per instance from a vertex buffer

use wgpu::util::DeviceExt;

use crate::shaders::{ViewUniforms, WORKGROUP_SIZE};
use crate::GpuInstance;

/// How a layer combines with what is already drawn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Blend {
    /// Source scaled by its alpha, added on top. Overlaps glow.
    Additive,
    /// Regular alpha blending.
    Alpha,
}

impl Blend {
    pub fn state(self) -> wgpu::BlendState {
        match self {
            Blend::Additive => wgpu::BlendState {
                color: wgpu::BlendComponent {
                    src_factor: wgpu::BlendFactor::SrcAlpha,
                    dst_factor: wgpu::BlendFactor::One,
                    operation: wgpu::BlendOperation::Add,
                },
                alpha: wgpu::BlendComponent {
                    src_factor: wgpu::BlendFactor::One,
                    dst_factor: wgpu::BlendFactor::One,
                    operation: wgpu::BlendOperation::Add,
                },
            },
            Blend::Alpha => wgpu::BlendState::ALPHA_BLENDING,
        }
    }
}

/// Per-instance vertex attributes of `T`, one shader location per field.
pub fn vertex_attributes<T: GpuInstance>() -> Vec<wgpu::VertexAttribute> {
    T::ATTRIBUTES
        .iter()
        .enumerate()
        .map(|(i, attr)| wgpu::VertexAttribute {
            offset: attr.offset as wgpu::BufferAddress,
            shader_location: i as u32,
            format: attr.format.to_wgpu(),
        })
        .collect()
}

/// GPU records for a storage buffer. Never empty: a zero-sized binding is
/// invalid, so an empty population gets one zeroed record.
pub fn storage_records<T: GpuInstance>(instances: &[T]) -> Vec<T::Gpu> {
    if instances.is_empty() {
        return vec![bytemuck::Zeroable::zeroed()];
    }
    instances.iter().map(GpuInstance::to_gpu).collect()
}

pub fn uniform_entry(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

pub fn storage_entry(binding: u32, read_only: bool) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

/// The view uniform buffer and its bind group, shared by all quad pipelines.
pub struct ViewBinding {
    buffer: wgpu::Buffer,
    layout: wgpu::BindGroupLayout,
    bind_group: wgpu::BindGroup,
}

impl ViewBinding {
    pub fn new(device: &wgpu::Device) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("View Uniform Buffer"),
            contents: bytemuck::bytes_of(&ViewUniforms::default()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("View Bind Group Layout"),
            entries: &[uniform_entry(
                0,
                wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            )],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("View Bind Group"),
            layout: &layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        });

        Self {
            buffer,
            layout,
            bind_group,
        }
    }

    pub fn update(&self, queue: &wgpu::Queue, view_scale: glam::Vec2, elapsed: f32) {
        let uniforms = ViewUniforms {
            view_scale: view_scale.to_array(),
            elapsed,
            _pad: 0.0,
        };
        queue.write_buffer(&self.buffer, 0, bytemuck::bytes_of(&uniforms));
    }

    pub fn layout(&self) -> &wgpu::BindGroupLayout {
        &self.layout
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }
}

/// Instanced quad renderer for one instance type.
pub struct QuadPipeline {
    pipeline: wgpu::RenderPipeline,
}

impl QuadPipeline {
    pub fn new<T: GpuInstance>(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        view: &ViewBinding,
        label: &str,
        source: &str,
        blend: Blend,
    ) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(label),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(label),
            bind_group_layouts: &[view.layout()],
            push_constant_ranges: &[],
        });

        let attributes = vertex_attributes::<T>();

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(label),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: T::SIZE as wgpu::BufferAddress,
                    step_mode: wgpu::VertexStepMode::Instance,
                    attributes: &attributes,
                }],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(blend.state()),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        Self { pipeline }
    }

    /// Draw `count` instances. Nothing is recorded for zero.
    pub fn draw(
        &self,
        pass: &mut wgpu::RenderPass<'_>,
        view: &ViewBinding,
        instances: &wgpu::Buffer,
        count: u32,
    ) {
        if count == 0 {
            return;
        }
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, view.bind_group(), &[]);
        pass.set_vertex_buffer(0, instances.slice(..));
        pass.draw(0..6, 0..count);
    }
}

/// Update kernel over `instances`, reading `masses` and a uniform block.
pub struct UpdatePipeline {
    pipeline: wgpu::ComputePipeline,
    layout: wgpu::BindGroupLayout,
}

impl UpdatePipeline {
    pub fn new(device: &wgpu::Device, label: &str, source: &str) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(label),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });

        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some(label),
            entries: &[
                storage_entry(0, false),
                storage_entry(1, true),
                uniform_entry(2, wgpu::ShaderStages::COMPUTE),
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(label),
            bind_group_layouts: &[&layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some(label),
            layout: Some(&pipeline_layout),
            module: &shader,
            entry_point: Some("main"),
            compilation_options: Default::default(),
            cache: None,
        });

        Self { pipeline, layout }
    }

    pub fn bind(
        &self,
        device: &wgpu::Device,
        label: &str,
        instances: &wgpu::Buffer,
        masses: &wgpu::Buffer,
        uniforms: &wgpu::Buffer,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout: &self.layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: instances.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: masses.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: uniforms.as_entire_binding(),
                },
            ],
        })
    }

    /// One invocation per instance.
    pub fn dispatch(&self, pass: &mut wgpu::ComputePass<'_>, bind_group: &wgpu::BindGroup, count: u32) {
        if count == 0 {
            return;
        }
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, bind_group, &[]);
        pass.dispatch_workgroups(count.div_ceil(WORKGROUP_SIZE), 1, 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::ParticleInstance;
    use crate::systems::TrailInstance;

    #[test]
    fn test_attributes_follow_declaration_order() {
        let attrs = vertex_attributes::<ParticleInstance>();
        let locations: Vec<u32> = attrs.iter().map(|a| a.shader_location).collect();
        assert_eq!(locations, vec![0, 1, 2, 3, 4]);
        assert_eq!(attrs[0].format, wgpu::VertexFormat::Float32x2);
        assert_eq!(attrs[1].offset, 8);
        assert_eq!(attrs[4].format, wgpu::VertexFormat::Uint32);
    }

    #[test]
    fn test_attributes_fit_in_stride() {
        let attrs = vertex_attributes::<TrailInstance>();
        for attr in attrs {
            assert!(attr.offset + attr.format.size() <= TrailInstance::SIZE as u64);
        }
    }

    #[test]
    fn test_empty_population_gets_one_record() {
        let records = storage_records::<ParticleInstance>(&[]);
        assert_eq!(records.len(), 1);
        let records = storage_records(&[ParticleInstance::default(); 3]);
        assert_eq!(records.len(), 3);
    }

    #[test]
    fn test_additive_blend_adds_onto_destination() {
        let state = Blend::Additive.state();
        assert_eq!(state.color.src_factor, wgpu::BlendFactor::SrcAlpha);
        assert_eq!(state.color.dst_factor, wgpu::BlendFactor::One);
        assert_eq!(Blend::Alpha.state(), wgpu::BlendState::ALPHA_BLENDING);
    }
}
