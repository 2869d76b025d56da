use std::time::Duration;

/// The pool could not be brought up. Fatal: nothing may be submitted.
#[derive(Debug, thiserror::Error)]
pub enum PoolInitError {
    #[error("worker pool size must be between 1 and {max}, got {size}")]
    InvalidSize { size: usize, max: usize },
    #[error("failed to spawn execution unit {unit}")]
    Spawn {
        unit: usize,
        #[source]
        source: std::io::Error,
    },
    #[error("execution unit {unit} failed to start: {reason}")]
    UnitFailed { unit: usize, reason: String },
    #[error("execution unit {unit} not ready after {waited:?}")]
    Timeout { unit: usize, waited: Duration },
}

/// Returned by `submit` once the pool can no longer run jobs.
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PoolError {
    #[error("worker pool has been shut down")]
    ShutDown,
    #[error("execution unit {unit} terminated unexpectedly; the pool must be recreated")]
    UnitLost { unit: usize },
}

/// A single job went wrong. Recovered at the unit boundary: the job resolves
/// to no result and the unit carries on.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TileExecutionFault {
    #[error("tile job panicked: {message}")]
    Panicked { message: String },
    #[error("kernel failed: {message}")]
    Kernel { message: String },
    #[error("tile buffer has {actual} bytes, expected {expected}")]
    BufferSize { expected: usize, actual: usize },
    /// The job's generation was superseded mid-tile. The unit reports the
    /// job as skipped rather than failed.
    #[error("tile generation superseded while running")]
    Superseded,
}
