use crate::controllers::interactive::data::gpu_params::GpuParams;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct GpuCapability {
    pub available: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GpuError {
    #[error("no GPU device available: {0}")]
    Unavailable(String),
    #[error("GPU device lost: {0}")]
    DeviceLost(String),
    #[error("GPU dispatch failed: {0}")]
    Dispatch(String),
}

impl GpuError {
    /// Errors after which the device must not be used again.
    #[must_use]
    pub fn is_permanent(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::DeviceLost(_))
    }
}

/// A compute device that evaluates the fractal kernel over a whole surface
/// in one dispatch.
pub trait GpuDevice: Send + Sync {
    fn probe(&self) -> GpuCapability;

    /// Blocks until the dispatch has been read back. Returns row-major RGBA
    /// bytes for `params.width` x `params.height` pixels.
    fn dispatch(&self, params: &GpuParams) -> Result<Vec<u8>, GpuError>;
}
