/// Errors raised by the canvas pipeline.
///
/// Every variant is fatal to the pipeline instance except
/// [`PipelineError::StaleResourceReference`], which the frame loop answers by
/// skipping one frame.
#[derive(Debug, Clone, thiserror::Error)]
pub enum PipelineError {
    #[error("No compatible GPU device: {0}")]
    DeviceUnavailable(String),

    #[error("GPU resource exhausted while creating {what}: {reason}")]
    ResourceExhausted { what: String, reason: String },

    #[error("Frame referenced {found_width}x{found_height} textures but the canvas is {expected_width}x{expected_height}")]
    StaleResourceReference {
        expected_width: u32,
        expected_height: u32,
        found_width: u32,
        found_height: u32,
    },

    #[error("Texture readback failed: {0}")]
    Readback(String),
}

impl PipelineError {
    pub fn exhausted(what: impl Into<String>, reason: impl ToString) -> Self {
        Self::ResourceExhausted {
            what: what.into(),
            reason: reason.to_string(),
        }
    }

    /// True when the session cannot continue after this error
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::StaleResourceReference { .. })
    }
}

impl From<wgpu::RequestDeviceError> for PipelineError {
    fn from(err: wgpu::RequestDeviceError) -> Self {
        Self::DeviceUnavailable(err.to_string())
    }
}

impl From<wgpu::CreateSurfaceError> for PipelineError {
    fn from(err: wgpu::CreateSurfaceError) -> Self {
        Self::DeviceUnavailable(err.to_string())
    }
}

impl From<wgpu::BufferAsyncError> for PipelineError {
    fn from(err: wgpu::BufferAsyncError) -> Self {
        Self::Readback(err.to_string())
    }
}
