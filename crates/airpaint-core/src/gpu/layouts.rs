use wgpu::{BindGroupLayout, Device};

use crate::bindings;
use crate::gpu::textures::FIELD_FORMAT;

/// Owns the bind group layouts shared by the simulation and presentation stages
///
/// Stages borrow these when building pipelines; per-frame bind groups are
/// created against the same layouts.
pub struct Layouts {
    /// Simulation group 0: field textures for one ping-pong direction
    pub simulate_textures: BindGroupLayout,

    /// Simulation group 1: pointer, brush, wind and canvas uniforms
    pub simulate_uniforms: BindGroupLayout,

    /// Presentation group 0: pigment texture and sampler
    pub present: BindGroupLayout,
}

impl Layouts {
    /// Create all bind group layouts once
    pub fn new(device: &Device) -> Self {
        Self {
            simulate_textures: Self::create_simulate_textures_layout(device),
            simulate_uniforms: Self::create_simulate_uniforms_layout(device),
            present: Self::create_present_layout(device),
        }
    }

    fn create_simulate_textures_layout(device: &Device) -> BindGroupLayout {
        device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("simulate_textures_bgl"),
            entries: &[
                // @binding(0) pigment_in sampled texture
                sampled_entry(bindings::PIGMENT_IN),
                // @binding(1) pigment_out storage texture
                storage_entry(bindings::PIGMENT_OUT),
                // @binding(2) water_in sampled texture
                sampled_entry(bindings::WATER_IN),
                // @binding(3) water_out storage texture
                storage_entry(bindings::WATER_OUT),
            ],
        })
    }

    fn create_simulate_uniforms_layout(device: &Device) -> BindGroupLayout {
        let entries: Vec<_> = [bindings::POINTER, bindings::BRUSH, bindings::WIND, bindings::SIZE]
            .into_iter()
            .map(|binding| wgpu::BindGroupLayoutEntry {
                binding,
                visibility: wgpu::ShaderStages::COMPUTE,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(bindings::UNIFORM_SIZES[binding as usize]),
                },
                count: None,
            })
            .collect();

        device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("simulate_uniforms_bgl"),
            entries: &entries,
        })
    }

    fn create_present_layout(device: &Device) -> BindGroupLayout {
        device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("present_bgl"),
            entries: &[
                // @binding(0) pigment texture (filterable)
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                // @binding(1) linear sampler
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        })
    }
}

fn sampled_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: false },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    }
}

fn storage_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::StorageTexture {
            access: wgpu::StorageTextureAccess::WriteOnly,
            format: FIELD_FORMAT,
            view_dimension: wgpu::TextureViewDimension::D2,
        },
        count: None,
    }
}
