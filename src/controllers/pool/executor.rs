use crate::controllers::pool::errors::TileExecutionFault;
use crate::controllers::pool::job::TileJob;
use crate::core::actions::render_tile::{RenderTileError, render_tile_cancelable};
use crate::core::data::pixel_buffer::PixelBuffer;

/// What an execution unit runs for each job.
pub trait TileExecutor: Send + Sync {
    /// Called once on each unit's thread before it reports ready.
    fn prepare(&self) -> Result<(), String> {
        Ok(())
    }

    /// Row-major RGBA bytes for `job.tile`. Executors that poll
    /// `job.cancel_token()` return [`TileExecutionFault::Superseded`] once it
    /// fires.
    fn execute(&self, job: &TileJob) -> Result<Vec<u8>, TileExecutionFault>;
}

/// Runs the fractal kernel over the tile, stopping early once the job's
/// generation is superseded.
#[derive(Debug, Clone, Copy, Default)]
pub struct KernelExecutor;

impl TileExecutor for KernelExecutor {
    fn execute(&self, job: &TileJob) -> Result<Vec<u8>, TileExecutionFault> {
        render_tile_cancelable(job.tile, &job.viewport, &job.params, job.cancel_token())
            .map(PixelBuffer::into_data)
            .map_err(|err| match err {
                RenderTileError::Cancelled(_) => TileExecutionFault::Superseded,
                RenderTileError::PixelBuffer(err) => TileExecutionFault::Kernel {
                    message: err.to_string(),
                },
            })
    }
}
