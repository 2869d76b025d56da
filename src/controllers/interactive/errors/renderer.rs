use crate::controllers::pool::errors::{PoolError, PoolInitError};

/// Failures the orchestrator surfaces to its caller or sink.
#[derive(Debug, thiserror::Error)]
pub enum RendererError {
    #[error("worker pool could not be initialized")]
    PoolInit(#[from] PoolInitError),
    #[error("worker pool stopped")]
    Pool(#[from] PoolError),
    #[error("render thread could not be spawned")]
    Spawn(#[source] std::io::Error),
}
