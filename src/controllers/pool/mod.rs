//! Fixed-size pool of long-lived units that render tiles off the caller's
//! thread.

pub mod config;
pub mod errors;
pub mod executor;
pub mod job;
pub mod worker_pool;

pub use config::PoolConfig;
pub use worker_pool::WorkerPool;
