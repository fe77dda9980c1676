use std::sync::Arc;
use wgpu::{Adapter, Device, Instance, Queue, RequestAdapterOptions};

use crate::error::PipelineError;

/// Resolved GPU handles handed to a canvas session
pub struct GpuDevice {
    pub instance: Instance,
    pub adapter: Adapter,
    pub device: Arc<Device>,
    pub queue: Arc<Queue>,
}

impl GpuDevice {
    /// Create a GPU device without a presentation surface
    pub async fn new() -> Result<Self, PipelineError> {
        Self::request(Instance::default(), None).await
    }

    /// Request an adapter (compatible with `surface` when given) and a device
    pub async fn request(
        instance: Instance,
        surface: Option<&wgpu::Surface<'static>>,
    ) -> Result<Self, PipelineError> {
        let adapter = instance
            .request_adapter(&RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: surface,
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| PipelineError::DeviceUnavailable("no suitable GPU adapter found".into()))?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    label: Some("airpaint_device"),
                },
                None,
            )
            .await?;

        Ok(Self {
            instance,
            adapter,
            device: Arc::new(device),
            queue: Arc::new(queue),
        })
    }

    /// Get device info for logging
    pub fn info(&self) -> String {
        let info = self.adapter.get_info();
        format!(
            "GPU: {} ({:?}), Features: {:?}",
            info.name,
            info.backend,
            self.device.features()
        )
    }

    /// Wait for GPU operations to complete
    pub fn wait(&self) {
        self.device.poll(wgpu::Maintain::Wait);
    }
}

/// Run `create` inside an out-of-memory error scope.
///
/// Allocation failures surface as [`PipelineError::ResourceExhausted`]
/// instead of reaching the device's uncaptured error handler.
pub fn scoped<T>(device: &Device, what: &str, create: impl FnOnce() -> T) -> Result<T, PipelineError> {
    device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
    let value = create();
    match pollster::block_on(device.pop_error_scope()) {
        None => Ok(value),
        Some(err) => {
            log::error!("Allocation of {} failed: {}", what, err);
            Err(PipelineError::exhausted(what, err))
        }
    }
}
