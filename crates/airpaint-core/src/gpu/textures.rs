use std::sync::Arc;
use wgpu::{Device, Queue, TextureViewDescriptor};

use crate::error::PipelineError;
use crate::frame::Parity;
use crate::gpu::device::scoped;
use crate::CanvasSize;

/// Storage format of the pigment and water fields
pub const FIELD_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

const BYTES_PER_TEXEL: u32 = 4;

/// Simulated field held in a double-buffered texture pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Pigment,
    Water,
}

impl Field {
    pub fn label(self, slot: Parity) -> &'static str {
        match (self, slot) {
            (Field::Pigment, Parity::Even) => "pigment_0",
            (Field::Pigment, Parity::Odd) => "pigment_1",
            (Field::Water, Parity::Even) => "water_0",
            (Field::Water, Parity::Odd) => "water_1",
        }
    }
}

/// Creates and destroys the textures behind a [`ResourceManager`]
pub trait TextureFactory {
    type Texture;

    /// Create one zero-initialized texture of `size`
    fn create(&self, field: Field, slot: Parity, size: CanvasSize) -> Result<Self::Texture, PipelineError>;

    /// Zero an existing texture in place
    fn clear(&self, texture: &Self::Texture);

    /// Destroy a texture; called exactly once per created texture
    fn release(&self, texture: Self::Texture);
}

/// The pigment and water pairs, indexed by parity
pub struct TexturePairs<T> {
    pigment: [T; 2],
    water: [T; 2],
    size: CanvasSize,
}

impl<T> TexturePairs<T> {
    pub fn size(&self) -> CanvasSize {
        self.size
    }

    pub fn pigment(&self, slot: Parity) -> &T {
        &self.pigment[slot.index()]
    }

    pub fn water(&self, slot: Parity) -> &T {
        &self.water[slot.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.pigment.iter().chain(self.water.iter())
    }

    fn into_textures(self) -> impl Iterator<Item = T> {
        let [p0, p1] = self.pigment;
        let [w0, w1] = self.water;
        [p0, p1, w0, w1].into_iter()
    }
}

/// Owns the four field textures and swaps them atomically on resize
pub struct ResourceManager<F: TextureFactory> {
    factory: F,
    pairs: Option<TexturePairs<F::Texture>>,
    generation: u64,
    fault: Option<PipelineError>,
}

impl<F: TextureFactory> ResourceManager<F> {
    /// Allocate the initial texture set
    pub fn new(factory: F, size: CanvasSize) -> Result<Self, PipelineError> {
        let pairs = Self::allocate(&factory, size)?;
        log::debug!("Allocated field textures {}x{}", size.width, size.height);
        Ok(Self {
            factory,
            pairs: Some(pairs),
            generation: 1,
            fault: None,
        })
    }

    /// Create pigment×2 and water×2; on failure nothing created survives
    pub fn allocate(factory: &F, size: CanvasSize) -> Result<TexturePairs<F::Texture>, PipelineError> {
        let order = [
            (Field::Pigment, Parity::Even),
            (Field::Pigment, Parity::Odd),
            (Field::Water, Parity::Even),
            (Field::Water, Parity::Odd),
        ];

        let mut created = Vec::with_capacity(order.len());
        for (field, slot) in order {
            match factory.create(field, slot, size) {
                Ok(texture) => created.push(texture),
                Err(err) => {
                    for texture in created {
                        factory.release(texture);
                    }
                    return Err(err);
                }
            }
        }

        let mut created = created.into_iter();
        match (created.next(), created.next(), created.next(), created.next()) {
            (Some(p0), Some(p1), Some(w0), Some(w1)) => Ok(TexturePairs {
                pigment: [p0, p1],
                water: [w0, w1],
                size,
            }),
            _ => Err(PipelineError::exhausted("field textures", "texture factory returned too few textures")),
        }
    }

    /// Replace the texture set with blank textures of `size`.
    ///
    /// The previous set is released only after all four replacements exist;
    /// on error it stays installed.
    pub fn reallocate(&mut self, size: CanvasSize) -> Result<(), PipelineError> {
        if self.pairs.as_ref().map(|pairs| pairs.size) == Some(size) {
            return Ok(());
        }

        let next = Self::allocate(&self.factory, size)?;
        if let Some(previous) = self.pairs.replace(next) {
            for texture in previous.into_textures() {
                self.factory.release(texture);
            }
        }
        self.generation += 1;
        log::info!(
            "Reallocated field textures at {}x{} (generation {})",
            size.width,
            size.height,
            self.generation
        );
        Ok(())
    }

    /// Reallocate from a size subscription, recording failure as the session fault
    pub fn handle_resize(&mut self, size: CanvasSize) {
        if let Err(err) = self.reallocate(size) {
            log::error!("Texture reallocation failed: {}", err);
            self.fault = Some(err);
        }
    }

    /// Fatal error recorded by [`ResourceManager::handle_resize`]
    pub fn fault(&self) -> Option<&PipelineError> {
        self.fault.as_ref()
    }

    /// Current textures, provided they match the canvas size a frame expects
    pub fn pairs_for(&self, expected: CanvasSize) -> Result<&TexturePairs<F::Texture>, PipelineError> {
        match &self.pairs {
            Some(pairs) if pairs.size == expected => Ok(pairs),
            other => {
                let found = other.as_ref().map(|pairs| pairs.size);
                Err(PipelineError::StaleResourceReference {
                    expected_width: expected.width,
                    expected_height: expected.height,
                    found_width: found.map_or(0, |size| size.width),
                    found_height: found.map_or(0, |size| size.height),
                })
            }
        }
    }

    pub fn pairs(&self) -> Option<&TexturePairs<F::Texture>> {
        self.pairs.as_ref()
    }

    /// Zero all four textures without reallocating
    pub fn clear(&self) {
        if let Some(pairs) = &self.pairs {
            for texture in pairs.iter() {
                self.factory.clear(texture);
            }
        }
    }

    /// Destroy the texture set; idempotent
    pub fn release(&mut self) {
        if let Some(pairs) = self.pairs.take() {
            for texture in pairs.into_textures() {
                self.factory.release(texture);
            }
            log::debug!("Released field textures");
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Field texture with its sampling and storage views
pub struct FieldTexture {
    pub texture: wgpu::Texture,
    pub view_sample: wgpu::TextureView,
    pub view_store: wgpu::TextureView,
    pub size: CanvasSize,
}

/// [`TextureFactory`] backed by a wgpu device
pub struct WgpuTextureFactory {
    device: Arc<Device>,
    queue: Arc<Queue>,
}

impl WgpuTextureFactory {
    pub fn new(device: Arc<Device>, queue: Arc<Queue>) -> Self {
        Self { device, queue }
    }
}

impl TextureFactory for WgpuTextureFactory {
    type Texture = FieldTexture;

    fn create(&self, field: Field, slot: Parity, size: CanvasSize) -> Result<FieldTexture, PipelineError> {
        let label = field.label(slot);
        let limit = self.device.limits().max_texture_dimension_2d;
        if size.width > limit || size.height > limit {
            return Err(PipelineError::exhausted(
                label,
                format!("{}x{} exceeds the device limit of {}", size.width, size.height, limit),
            ));
        }

        let usage = wgpu::TextureUsages::TEXTURE_BINDING
            | wgpu::TextureUsages::STORAGE_BINDING
            | wgpu::TextureUsages::RENDER_ATTACHMENT
            | wgpu::TextureUsages::COPY_DST
            | wgpu::TextureUsages::COPY_SRC;

        // wgpu zero-initializes texture memory before first use
        let texture = scoped(&self.device, label, || {
            self.device.create_texture(&wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d {
                    width: size.width,
                    height: size.height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: FIELD_FORMAT,
                usage,
                view_formats: &[],
            })
        })?;

        let view_sample = texture.create_view(&TextureViewDescriptor::default());
        let view_store = texture.create_view(&TextureViewDescriptor {
            label: Some(label),
            format: Some(FIELD_FORMAT),
            dimension: Some(wgpu::TextureViewDimension::D2),
            aspect: wgpu::TextureAspect::All,
            base_mip_level: 0,
            mip_level_count: Some(1),
            base_array_layer: 0,
            array_layer_count: Some(1),
        });

        Ok(FieldTexture {
            texture,
            view_sample,
            view_store,
            size,
        })
    }

    fn clear(&self, texture: &FieldTexture) {
        let size = texture.size;
        let zeros = vec![0u8; (size.pixel_count() * BYTES_PER_TEXEL as u64) as usize];

        self.queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &texture.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &zeros,
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(size.width * BYTES_PER_TEXEL),
                rows_per_image: Some(size.height),
            },
            wgpu::Extent3d {
                width: size.width,
                height: size.height,
                depth_or_array_layers: 1,
            },
        );
    }

    fn release(&self, texture: FieldTexture) {
        texture.texture.destroy();
    }
}
