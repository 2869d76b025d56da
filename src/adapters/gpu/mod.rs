//! Implementations of the compute device port.

pub mod software;
#[cfg(feature = "gpu")]
pub mod wgpu_device;

pub use software::SoftwareDevice;
#[cfg(feature = "gpu")]
pub use wgpu_device::WgpuDevice;
