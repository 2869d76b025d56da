use std::any::Any;
use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use tracing::{debug, error, info, trace, warn};

use crate::controllers::pool::config::{MAX_POOL_SIZE, PoolConfig};
use crate::controllers::pool::errors::{PoolError, PoolInitError, TileExecutionFault};
use crate::controllers::pool::executor::TileExecutor;
use crate::controllers::pool::job::{Completions, JobHandle, JobOutcome, TileJob};
use crate::core::data::pixel_buffer::{BYTES_PER_PIXEL, PixelBuffer};
use crate::core::data::tile::TileResult;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum PoolState {
    Running,
    ShutDown,
    Failed { unit: usize },
}

struct QueuedJob {
    job: TileJob,
    reply: Sender<JobOutcome>,
}

struct PoolQueue {
    jobs: VecDeque<QueuedJob>,
    state: PoolState,
}

struct SharedState {
    queue: Mutex<PoolQueue>,
    wake: Condvar,
    busy: Vec<AtomicBool>,
    executor: Arc<dyn TileExecutor>,
}

impl SharedState {
    fn lock_queue(&self) -> MutexGuard<'_, PoolQueue> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stops the pool for good. Queued jobs are dropped, which resolves
    /// their handles to `None`.
    fn stop(&self, state: PoolState) {
        let discarded = {
            let mut queue = self.lock_queue();
            if queue.state == PoolState::Running {
                queue.state = state;
            }
            std::mem::take(&mut queue.jobs)
        };

        self.wake.notify_all();
        drop(discarded);
    }

    fn mark_unit_lost(&self, unit: usize) {
        error!(unit, "execution unit terminated unexpectedly");
        self.stop(PoolState::Failed { unit });
    }

    fn is_running(&self) -> bool {
        self.lock_queue().state == PoolState::Running
    }
}

/// Marks the pool failed if its unit unwinds outside the per-job guard.
struct UnitGuard {
    unit: usize,
    shared: Arc<SharedState>,
}

impl Drop for UnitGuard {
    fn drop(&mut self) {
        self.shared.busy[self.unit].store(false, Ordering::Release);

        if thread::panicking() {
            self.shared.mark_unit_lost(self.unit);
        }
    }
}

enum UnitStatus {
    Ready(usize),
    Failed(usize, String),
}

/// Fixed set of execution units draining one FIFO queue.
///
/// Each unit is an OS thread that runs at most one job at a time. Ordering
/// is whatever order jobs were submitted in; the pool never reorders.
pub struct WorkerPool {
    shared: Arc<SharedState>,
    units: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Starts `config.size` units (capped at [`MAX_POOL_SIZE`]) and waits
    /// until every one reports ready.
    ///
    /// Any unit that fails to spawn, fails or panics in its preparation, or
    /// stays silent past `config.init_timeout` fails the whole pool.
    pub fn initialize(
        config: PoolConfig,
        executor: Arc<dyn TileExecutor>,
    ) -> Result<Self, PoolInitError> {
        if config.size == 0 {
            return Err(PoolInitError::InvalidSize {
                size: config.size,
                max: MAX_POOL_SIZE,
            });
        }
        let size = config.size.min(MAX_POOL_SIZE);
        if size < config.size {
            warn!(requested = config.size, size, "worker pool size capped");
        }

        let start = Instant::now();
        let shared = Arc::new(SharedState {
            queue: Mutex::new(PoolQueue {
                jobs: VecDeque::new(),
                state: PoolState::Running,
            }),
            wake: Condvar::new(),
            busy: (0..size).map(|_| AtomicBool::new(false)).collect(),
            executor,
        });

        let (status_tx, status_rx) = mpsc::channel();
        let mut units = Vec::with_capacity(size);

        for unit in 0..size {
            let unit_shared = Arc::clone(&shared);
            let unit_status = status_tx.clone();

            let spawned = thread::Builder::new()
                .name(format!("tile-unit-{unit}"))
                .spawn(move || Self::unit_main(unit, unit_shared, &unit_status));

            match spawned {
                Ok(handle) => units.push(handle),
                Err(source) => {
                    error!(unit, error = %source, "failed to spawn execution unit");
                    shared.stop(PoolState::ShutDown);
                    return Err(PoolInitError::Spawn { unit, source });
                }
            }
        }
        drop(status_tx);

        let mut ready = vec![false; size];
        let deadline = start + config.init_timeout;

        while ready.iter().any(|r| !r) {
            let remaining = deadline.saturating_duration_since(Instant::now());
            let failure = match status_rx.recv_timeout(remaining) {
                Ok(UnitStatus::Ready(unit)) => {
                    debug!(unit, "execution unit ready");
                    ready[unit] = true;
                    continue;
                }
                Ok(UnitStatus::Failed(unit, reason)) => PoolInitError::UnitFailed { unit, reason },
                Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => {
                    let unit = ready.iter().position(|r| !r).unwrap_or_default();
                    PoolInitError::Timeout {
                        unit,
                        waited: start.elapsed(),
                    }
                }
            };

            error!(error = %failure, "worker pool initialization failed");
            // Units stuck in preparation are left to exit on their own.
            shared.stop(PoolState::ShutDown);
            return Err(failure);
        }

        info!(
            size,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "worker pool initialized"
        );

        Ok(Self { shared, units })
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.shared.busy.len()
    }

    /// Units currently running a job.
    #[must_use]
    pub fn busy_units(&self) -> usize {
        self.shared
            .busy
            .iter()
            .filter(|busy| busy.load(Ordering::Acquire))
            .count()
    }

    #[must_use]
    pub fn queued_jobs(&self) -> usize {
        self.shared.lock_queue().jobs.len()
    }

    /// `None` while running; otherwise why the pool stopped accepting jobs.
    #[must_use]
    pub fn health(&self) -> Option<PoolError> {
        match self.shared.lock_queue().state {
            PoolState::Running => None,
            PoolState::ShutDown => Some(PoolError::ShutDown),
            PoolState::Failed { unit } => Some(PoolError::UnitLost { unit }),
        }
    }

    pub fn submit(&self, job: TileJob) -> Result<JobHandle, PoolError> {
        let (reply, receiver) = mpsc::channel();
        let tile = job.tile;

        self.enqueue(std::iter::once(QueuedJob { job, reply }))?;
        self.shared.wake.notify_one();

        Ok(JobHandle::new(tile, receiver))
    }

    /// Enqueues a batch in order and returns its outcomes as they arrive.
    pub fn submit_all<I>(&self, jobs: I) -> Result<Completions, PoolError>
    where
        I: IntoIterator<Item = TileJob>,
    {
        let (reply, receiver) = mpsc::channel();
        let batch: Vec<QueuedJob> = jobs
            .into_iter()
            .map(|job| QueuedJob {
                job,
                reply: reply.clone(),
            })
            .collect();
        let count = batch.len();

        self.enqueue(batch)?;
        self.shared.wake.notify_all();

        Ok(Completions::new(receiver, count))
    }

    fn enqueue<I>(&self, jobs: I) -> Result<(), PoolError>
    where
        I: IntoIterator<Item = QueuedJob>,
    {
        let mut queue = self.shared.lock_queue();

        match queue.state {
            PoolState::Running => {
                queue.jobs.extend(jobs);
                Ok(())
            }
            PoolState::ShutDown => Err(PoolError::ShutDown),
            PoolState::Failed { unit } => Err(PoolError::UnitLost { unit }),
        }
    }

    /// Stops every unit and discards the queue. Handles of queued and
    /// in-flight jobs resolve to `None`.
    pub fn shutdown(&mut self) {
        self.shared.stop(PoolState::ShutDown);

        for handle in self.units.drain(..) {
            let _ = handle.join();
        }
    }

    fn unit_main(unit: usize, shared: Arc<SharedState>, status: &Sender<UnitStatus>) {
        let prepared = panic::catch_unwind(AssertUnwindSafe(|| shared.executor.prepare()))
            .unwrap_or_else(|payload| {
                Err(format!("panicked: {}", panic_message(payload.as_ref())))
            });
        if let Err(reason) = prepared {
            let _ = status.send(UnitStatus::Failed(unit, reason));
            return;
        }

        if status.send(UnitStatus::Ready(unit)).is_err() {
            return;
        }

        let guard = UnitGuard { unit, shared };
        Self::unit_loop(&guard);
    }

    fn unit_loop(guard: &UnitGuard) {
        let unit = guard.unit;
        let shared = &guard.shared;

        loop {
            let queued = {
                let mut queue = shared.lock_queue();
                loop {
                    if queue.state != PoolState::Running {
                        return;
                    }

                    if let Some(queued) = queue.jobs.pop_front() {
                        shared.busy[unit].store(true, Ordering::Release);
                        break queued;
                    }

                    queue = shared
                        .wake
                        .wait(queue)
                        .unwrap_or_else(PoisonError::into_inner);
                }
            };

            let outcome = Self::run_job(unit, shared.executor.as_ref(), queued.job);
            shared.busy[unit].store(false, Ordering::Release);

            // After shutdown in-flight jobs resolve to nothing.
            if shared.is_running() {
                let _ = queued.reply.send(outcome);
            }
        }
    }

    fn run_job(unit: usize, executor: &dyn TileExecutor, job: TileJob) -> JobOutcome {
        let tile = job.tile;
        let generation = job.generation;

        if job.is_stale() {
            trace!(unit, %generation, "skipping job from superseded generation");
            return JobOutcome::Skipped { tile, generation };
        }

        let executed = panic::catch_unwind(AssertUnwindSafe(|| executor.execute(&job)))
            .unwrap_or_else(|payload| {
                Err(TileExecutionFault::Panicked {
                    message: panic_message(payload.as_ref()),
                })
            });

        let pixels = executed.and_then(|data| {
            let actual = data.len();
            PixelBuffer::from_data(tile.width, tile.height, data).map_err(|_| {
                TileExecutionFault::BufferSize {
                    expected: tile.pixel_count() * BYTES_PER_PIXEL,
                    actual,
                }
            })
        });

        match pixels {
            Ok(pixels) => JobOutcome::Completed(TileResult {
                tile,
                pixels,
                generation,
            }),
            Err(TileExecutionFault::Superseded) => {
                trace!(unit, %generation, "job superseded while running");
                JobOutcome::Skipped { tile, generation }
            }
            Err(fault) => {
                warn!(unit, %generation, x = tile.x, y = tile.y, error = %fault, "tile job failed");
                JobOutcome::Failed {
                    tile,
                    generation,
                    fault,
                }
            }
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
