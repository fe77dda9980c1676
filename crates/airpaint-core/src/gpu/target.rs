//! Presentation targets: a window surface or an offscreen texture

use wgpu::{Adapter, Device, Surface, SurfaceConfiguration, TextureView};

use crate::error::PipelineError;
use crate::gpu::device::scoped;
use crate::CanvasSize;

/// Something the presentation stage can draw into once per frame
pub trait PresentTarget {
    fn format(&self) -> wgpu::TextureFormat;

    fn size(&self) -> CanvasSize;

    /// Match the target to the canvas backing-store size
    fn configure(&mut self, device: &Device, size: CanvasSize) -> Result<(), PipelineError>;

    /// Next texture to draw into; `None` skips this frame
    fn acquire(&mut self, device: &Device) -> Result<Option<TargetFrame>, PipelineError>;

    /// Texture holding the last presented frame, when it can be read back
    fn readable_texture(&self) -> Option<&wgpu::Texture> {
        None
    }
}

/// Acquired target texture for one frame
pub struct TargetFrame {
    view: TextureView,
    surface_texture: Option<wgpu::SurfaceTexture>,
}

impl TargetFrame {
    pub fn view(&self) -> &TextureView {
        &self.view
    }

    /// Hand the frame to the compositor; a no-op for offscreen targets
    pub fn present(self) {
        if let Some(texture) = self.surface_texture {
            texture.present();
        }
    }
}

/// Window surface target
pub struct SurfaceTarget {
    surface: Surface<'static>,
    config: SurfaceConfiguration,
}

impl SurfaceTarget {
    pub fn new(surface: Surface<'static>, adapter: &Adapter, size: CanvasSize, vsync: bool) -> Self {
        let caps = surface.get_capabilities(adapter);

        // Field values are displayed as stored, so avoid a second sRGB encode
        let format = caps
            .formats
            .iter()
            .copied()
            .find(|format| !format.is_srgb())
            .or_else(|| caps.formats.first().copied())
            .unwrap_or(wgpu::TextureFormat::Bgra8Unorm);

        let alpha_mode = if caps.alpha_modes.contains(&wgpu::CompositeAlphaMode::PreMultiplied) {
            wgpu::CompositeAlphaMode::PreMultiplied
        } else {
            caps.alpha_modes.first().copied().unwrap_or(wgpu::CompositeAlphaMode::Auto)
        };

        let present_mode = if vsync {
            wgpu::PresentMode::AutoVsync
        } else {
            wgpu::PresentMode::AutoNoVsync
        };

        let config = SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width,
            height: size.height,
            present_mode,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        log::info!(
            "Surface format {:?}, alpha {:?}, present mode {:?}",
            format,
            alpha_mode,
            present_mode
        );

        Self { surface, config }
    }
}

impl PresentTarget for SurfaceTarget {
    fn format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    fn size(&self) -> CanvasSize {
        CanvasSize::new(self.config.width, self.config.height)
    }

    fn configure(&mut self, device: &Device, size: CanvasSize) -> Result<(), PipelineError> {
        self.config.width = size.width;
        self.config.height = size.height;
        scoped(device, "surface", || self.surface.configure(device, &self.config))
    }

    fn acquire(&mut self, device: &Device) -> Result<Option<TargetFrame>, PipelineError> {
        match self.surface.get_current_texture() {
            Ok(texture) => {
                let view = texture.texture.create_view(&wgpu::TextureViewDescriptor::default());
                Ok(Some(TargetFrame {
                    view,
                    surface_texture: Some(texture),
                }))
            }
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::warn!("Surface lost or outdated; reconfiguring");
                let size = self.size();
                self.configure(device, size)?;
                Ok(None)
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("Surface acquire timed out; skipping frame");
                Ok(None)
            }
            Err(wgpu::SurfaceError::OutOfMemory) => Err(PipelineError::exhausted("surface texture", "out of memory")),
        }
    }
}

/// Offscreen render target used by the headless runner
pub struct OffscreenTarget {
    texture: Option<wgpu::Texture>,
    size: CanvasSize,
}

impl OffscreenTarget {
    pub const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

    pub fn new(device: &Device, size: CanvasSize) -> Result<Self, PipelineError> {
        let mut target = Self { texture: None, size };
        target.configure(device, size)?;
        Ok(target)
    }
}

impl PresentTarget for OffscreenTarget {
    fn format(&self) -> wgpu::TextureFormat {
        Self::FORMAT
    }

    fn size(&self) -> CanvasSize {
        self.size
    }

    fn configure(&mut self, device: &Device, size: CanvasSize) -> Result<(), PipelineError> {
        if self.texture.is_some() && self.size == size {
            return Ok(());
        }

        let texture = scoped(device, "offscreen_target", || {
            device.create_texture(&wgpu::TextureDescriptor {
                label: Some("offscreen_target"),
                size: wgpu::Extent3d {
                    width: size.width,
                    height: size.height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: Self::FORMAT,
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
                view_formats: &[],
            })
        })?;

        if let Some(previous) = self.texture.replace(texture) {
            previous.destroy();
        }
        self.size = size;
        Ok(())
    }

    fn acquire(&mut self, _device: &Device) -> Result<Option<TargetFrame>, PipelineError> {
        Ok(self.texture.as_ref().map(|texture| TargetFrame {
            view: texture.create_view(&wgpu::TextureViewDescriptor::default()),
            surface_texture: None,
        }))
    }

    fn readable_texture(&self) -> Option<&wgpu::Texture> {
        self.texture.as_ref()
    }
}
