pub mod adapters;
pub mod controllers;
pub mod core;
pub mod presenters;
pub mod storage;

pub use adapters::gpu::SoftwareDevice;
#[cfg(feature = "gpu")]
pub use adapters::gpu::WgpuDevice;
pub use controllers::interactive::{Backend, RenderOrchestrator, RenderState, RendererConfig, RendererError};
pub use controllers::pool::{PoolConfig, WorkerPool};
pub use presenters::canvas::CanvasCompositor;
pub use storage::write_ppm::write_ppm;
