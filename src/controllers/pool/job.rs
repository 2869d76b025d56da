use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::Duration;

use crate::controllers::generation::GenerationWatch;
use crate::controllers::pool::errors::TileExecutionFault;
use crate::core::actions::cancellation::{CancelToken, NeverCancel};
use crate::core::data::generation::Generation;
use crate::core::data::render_params::RenderParameters;
use crate::core::data::tile::{Tile, TileResult};
use crate::core::data::viewport::Viewport;

/// One tile of one pass.
///
/// `viewport` is the pass surface (already resolution-scaled); the tile is
/// in that surface's pixels.
#[derive(Debug, Clone)]
pub struct TileJob {
    pub tile: Tile,
    pub viewport: Viewport,
    pub params: RenderParameters,
    pub generation: Generation,
    watch: Option<GenerationWatch>,
}

impl TileJob {
    #[must_use]
    pub fn new(tile: Tile, viewport: Viewport, params: RenderParameters, generation: Generation) -> Self {
        Self {
            tile,
            viewport,
            params,
            generation,
            watch: None,
        }
    }

    /// Lets a unit skip the job if its generation has been superseded by
    /// the time it is dequeued.
    #[must_use]
    pub fn watched(tile: Tile, viewport: Viewport, params: RenderParameters, watch: GenerationWatch) -> Self {
        Self {
            tile,
            viewport,
            params,
            generation: watch.generation(),
            watch: Some(watch),
        }
    }

    #[must_use]
    pub fn is_stale(&self) -> bool {
        self.cancel_token().is_cancelled()
    }

    /// What the kernel polls while running this job. Unwatched jobs never
    /// cancel.
    #[must_use]
    pub fn cancel_token(&self) -> &dyn CancelToken {
        match &self.watch {
            Some(watch) => watch,
            None => &NeverCancel,
        }
    }
}

/// What became of a job.
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    Completed(TileResult),
    Failed {
        tile: Tile,
        generation: Generation,
        fault: TileExecutionFault,
    },
    /// Its generation stopped being current before or while a unit ran it.
    Skipped { tile: Tile, generation: Generation },
}

impl JobOutcome {
    #[must_use]
    pub fn tile(&self) -> Tile {
        match self {
            Self::Completed(result) => result.tile,
            Self::Failed { tile, .. } | Self::Skipped { tile, .. } => *tile,
        }
    }

    #[must_use]
    pub fn into_result(self) -> Option<TileResult> {
        match self {
            Self::Completed(result) => Some(result),
            Self::Failed { .. } | Self::Skipped { .. } => None,
        }
    }
}

/// Handle to one submitted job.
#[derive(Debug)]
pub struct JobHandle {
    tile: Tile,
    receiver: Receiver<JobOutcome>,
}

impl JobHandle {
    pub(crate) fn new(tile: Tile, receiver: Receiver<JobOutcome>) -> Self {
        Self { tile, receiver }
    }

    #[must_use]
    pub fn tile(&self) -> Tile {
        self.tile
    }

    /// Blocks until the job finishes. `None` when it faulted, was skipped,
    /// or was discarded by a shutdown.
    #[must_use]
    pub fn wait(self) -> Option<TileResult> {
        self.wait_outcome().and_then(JobOutcome::into_result)
    }

    /// `None` only when the pool discarded the job without running it.
    #[must_use]
    pub fn wait_outcome(self) -> Option<JobOutcome> {
        self.receiver.recv().ok()
    }

    /// `Err(Timeout)` leaves the job running; `Err(Disconnected)` means it
    /// was discarded.
    pub fn wait_timeout(&self, timeout: Duration) -> Result<JobOutcome, RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }
}

/// Outcomes of a batch, in completion order rather than submission order.
///
/// Iteration ends once every job has reported, or early if the pool drops
/// the remaining jobs.
#[derive(Debug)]
pub struct Completions {
    receiver: Receiver<JobOutcome>,
    remaining: usize,
}

impl Completions {
    pub(crate) fn new(receiver: Receiver<JobOutcome>, remaining: usize) -> Self {
        Self {
            receiver,
            remaining,
        }
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.remaining
    }
}

impl Iterator for Completions {
    type Item = JobOutcome;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        match self.receiver.recv() {
            Ok(outcome) => {
                self.remaining -= 1;
                Some(outcome)
            }
            Err(_) => {
                self.remaining = 0;
                None
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining))
    }
}
