//! Progressive rendering for interactive exploration.
//!
//! The orchestrator turns view snapshots into a sequence of passes of rising
//! quality, runs them on the GPU device or the worker pool, and hands the
//! results to a [`ports::presentation_sink::PresentationSink`]. Collaborators
//! plug in through the traits under [`ports`].

pub mod config;
mod controller;
pub mod data;
pub mod errors;
pub mod ports;
pub mod types;

pub use config::RendererConfig;
pub use controller::RenderOrchestrator;
pub use errors::renderer::RendererError;
pub use types::{Backend, RenderState};
