//! Interfaces between the render orchestrator and its collaborators.

pub mod gpu_device;
pub mod presentation_sink;
pub mod view_state;
