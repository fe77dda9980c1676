//! Simulation and presentation stages

use wgpu::util::DeviceExt;
use wgpu::{CommandEncoder, ComputePipeline, Device, RenderPipeline, TextureView};

use crate::bindings;
use crate::frame::FramePlan;
use crate::gpu::layouts::Layouts;
use crate::gpu::textures::{FieldTexture, TexturePairs};
use crate::gpu::uniforms::{UniformBuffers, UniformSlot};
use crate::shaders;
use crate::CanvasSize;

/// Workgroups needed to cover `size` with 16×16 tiles
pub fn workgroup_count(size: CanvasSize) -> (u32, u32) {
    (
        size.width.div_ceil(bindings::WORKGROUP_SIZE),
        size.height.div_ceil(bindings::WORKGROUP_SIZE),
    )
}

/// Compute stage that advances the pigment and water fields one step
pub struct SimulationStage {
    pipeline: ComputePipeline,
}

impl SimulationStage {
    /// Create the simulation compute pipeline
    pub fn new(device: &Device, layouts: &Layouts) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("simulate_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::simulate().into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("simulate_pipeline_layout"),
            bind_group_layouts: &[&layouts.simulate_textures, &layouts.simulate_uniforms],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("simulate_pipeline"),
            layout: Some(&pipeline_layout),
            module: &shader,
            entry_point: "simulate",
        });

        Self { pipeline }
    }

    /// Record one simulation pass reading `plan.read` and writing `plan.write`
    pub fn encode(
        &self,
        device: &Device,
        encoder: &mut CommandEncoder,
        layouts: &Layouts,
        pairs: &TexturePairs<FieldTexture>,
        uniforms: &UniformBuffers,
        plan: FramePlan,
    ) {
        let textures = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("simulate_textures_bg"),
            layout: &layouts.simulate_textures,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: bindings::PIGMENT_IN,
                    resource: wgpu::BindingResource::TextureView(&pairs.pigment(plan.read).view_sample),
                },
                wgpu::BindGroupEntry {
                    binding: bindings::PIGMENT_OUT,
                    resource: wgpu::BindingResource::TextureView(&pairs.pigment(plan.write).view_store),
                },
                wgpu::BindGroupEntry {
                    binding: bindings::WATER_IN,
                    resource: wgpu::BindingResource::TextureView(&pairs.water(plan.read).view_sample),
                },
                wgpu::BindGroupEntry {
                    binding: bindings::WATER_OUT,
                    resource: wgpu::BindingResource::TextureView(&pairs.water(plan.write).view_store),
                },
            ],
        });

        let uniform_entries: Vec<_> = UniformSlot::ALL
            .into_iter()
            .map(|slot| wgpu::BindGroupEntry {
                binding: slot.binding(),
                resource: uniforms.buffer(slot).as_entire_binding(),
            })
            .collect();
        let uniform_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("simulate_uniforms_bg"),
            layout: &layouts.simulate_uniforms,
            entries: &uniform_entries,
        });

        let (groups_x, groups_y) = workgroup_count(pairs.size());
        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("simulate_pass"),
            timestamp_writes: None,
        });
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(bindings::TEXTURE_GROUP, &textures, &[]);
        pass.set_bind_group(bindings::UNIFORM_GROUP, &uniform_group, &[]);
        pass.dispatch_workgroups(groups_x, groups_y, 1);
    }
}

/// Render stage that draws the current pigment texture to the target
pub struct PresentationStage {
    pipeline: RenderPipeline,
    sampler: wgpu::Sampler,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    num_indices: u32,
}

impl PresentationStage {
    /// Create the presentation pipeline for a target of `format`
    pub fn new(device: &Device, layouts: &Layouts, format: wgpu::TextureFormat) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("present_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::present().into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("present_pipeline_layout"),
            bind_group_layouts: &[&layouts.present],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("present_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: "vs_main",
                buffers: &[Vertex::desc()],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: "fs_main",
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    // Pigment is stored premultiplied
                    blend: Some(wgpu::BlendState::PREMULTIPLIED_ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: Some(wgpu::Face::Back),
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("pigment_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        // Full-target quad; texture row 0 is the top of the canvas
        let vertices = [
            Vertex { position: [-1.0, -1.0], tex_coords: [0.0, 1.0] },
            Vertex { position: [1.0, -1.0], tex_coords: [1.0, 1.0] },
            Vertex { position: [1.0, 1.0], tex_coords: [1.0, 0.0] },
            Vertex { position: [-1.0, 1.0], tex_coords: [0.0, 0.0] },
        ];
        let indices: [u16; 6] = [0, 1, 2, 0, 2, 3];

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("present_vertex_buffer"),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("present_index_buffer"),
            contents: bytemuck::cast_slice(&indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        Self {
            pipeline,
            sampler,
            vertex_buffer,
            index_buffer,
            num_indices: indices.len() as u32,
        }
    }

    /// Record a render pass drawing `pigment[plan.present]` into `target`
    pub fn encode(
        &self,
        device: &Device,
        encoder: &mut CommandEncoder,
        layouts: &Layouts,
        pairs: &TexturePairs<FieldTexture>,
        target: &TextureView,
        plan: FramePlan,
    ) {
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("present_bg"),
            layout: &layouts.present,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&pairs.pigment(plan.present).view_sample),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        });

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("present_pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            occlusion_query_set: None,
            timestamp_writes: None,
        });

        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &bind_group, &[]);
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint16);
        pass.draw_indexed(0..self.num_indices, 0, 0..1);
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct Vertex {
    position: [f32; 2],
    tex_coords: [f32; 2],
}

impl Vertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        const ATTRIBUTES: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x2];
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &ATTRIBUTES,
        }
    }
}
