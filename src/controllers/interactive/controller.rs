use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, error, info, trace, warn};

use crate::controllers::generation::Generations;
use crate::controllers::interactive::config::RendererConfig;
use crate::controllers::interactive::data::frame_data::{FullFrame, TileFrame};
use crate::controllers::interactive::data::gpu_params::GpuParams;
use crate::controllers::interactive::errors::renderer::RendererError;
use crate::controllers::interactive::ports::gpu_device::{GpuDevice, GpuError};
use crate::controllers::interactive::ports::presentation_sink::PresentationSink;
use crate::controllers::interactive::ports::view_state::ViewStateProvider;
use crate::controllers::interactive::types::{Backend, RenderState};
use crate::controllers::pool::errors::PoolError;
use crate::controllers::pool::executor::{KernelExecutor, TileExecutor};
use crate::controllers::pool::job::{JobOutcome, TileJob};
use crate::controllers::pool::worker_pool::WorkerPool;
use crate::core::data::generation::Generation;
use crate::core::data::pixel_buffer::PixelBuffer;
use crate::core::data::render_params::{FractalType, JuliaParams, RenderMode, RenderParameters};
use crate::core::data::render_pass::RenderPass;
use crate::core::data::viewport::Viewport;
use crate::core::util::tile_scheduler::TileScheduler;

struct RenderRequest {
    viewport: Viewport,
    params: RenderParameters,
}

struct Inner {
    state: RenderState,
    backend: Backend,
    latest_request: Option<(Generation, RenderRequest)>,
    busy: bool,
    fatal_error: Option<Arc<RendererError>>,
}

struct SharedState {
    generations: Arc<Generations>,
    inner: Mutex<Inner>,
    wake: Condvar,
    idle: Condvar,
    shutdown: AtomicBool,
    sink: Arc<dyn PresentationSink>,
    config: RendererConfig,
    executor: Arc<dyn TileExecutor>,
}

impl SharedState {
    fn lock_inner(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_backend(&self, backend: Backend) {
        self.lock_inner().backend = backend;
    }

    /// A fresh worker pool is serving; earlier failures no longer apply.
    fn pool_ready(&self) {
        let mut inner = self.lock_inner();
        inner.backend = Backend::Cpu;
        inner.fatal_error = None;
    }
}

/// Chosen once at startup. GPU loss moves to `Cpu` for good; a dead pool
/// moves to `None` until the next request rebuilds it.
enum ExecutionPath {
    Gpu(Arc<dyn GpuDevice>),
    Cpu(WorkerPool),
    None,
}

impl ExecutionPath {
    fn backend(&self) -> Backend {
        match self {
            Self::Gpu(_) => Backend::Gpu,
            Self::Cpu(_) => Backend::Cpu,
            Self::None => Backend::Unavailable,
        }
    }
}

enum PassOutcome {
    Completed,
    Superseded,
}

enum PassFailure {
    GpuLost(GpuError),
    Renderer(RendererError),
}

/// Drives progressive multi-pass rendering on a dedicated thread.
///
/// Every request gets a new generation. Results from older generations are
/// dropped before they reach the sink, and a superseded render stops at the
/// next tile completion or pass boundary.
pub struct RenderOrchestrator {
    shared: Arc<SharedState>,
    worker: Option<JoinHandle<()>>,
}

impl RenderOrchestrator {
    pub fn new(
        config: RendererConfig,
        sink: Arc<dyn PresentationSink>,
        gpu: Option<Arc<dyn GpuDevice>>,
    ) -> Result<Self, RendererError> {
        Self::with_executor(config, sink, gpu, Arc::new(KernelExecutor))
    }

    /// Like [`Self::new`] with a custom tile executor for the CPU path.
    pub fn with_executor(
        config: RendererConfig,
        sink: Arc<dyn PresentationSink>,
        gpu: Option<Arc<dyn GpuDevice>>,
        executor: Arc<dyn TileExecutor>,
    ) -> Result<Self, RendererError> {
        let path = Self::select_path(gpu, &config, &executor)?;
        let backend = path.backend();
        info!(%backend, "render backend selected");

        let shared = Arc::new(SharedState {
            generations: Arc::new(Generations::new()),
            inner: Mutex::new(Inner {
                state: RenderState::Idle,
                backend,
                latest_request: None,
                busy: false,
                fatal_error: None,
            }),
            wake: Condvar::new(),
            idle: Condvar::new(),
            shutdown: AtomicBool::new(false),
            sink,
            config,
            executor,
        });

        let worker_shared = Arc::clone(&shared);
        let worker = thread::Builder::new()
            .name("render-orchestrator".to_string())
            .spawn(move || Self::worker_loop(&worker_shared, path))
            .map_err(RendererError::Spawn)?;

        Ok(Self {
            shared,
            worker: Some(worker),
        })
    }

    fn select_path(
        gpu: Option<Arc<dyn GpuDevice>>,
        config: &RendererConfig,
        executor: &Arc<dyn TileExecutor>,
    ) -> Result<ExecutionPath, RendererError> {
        if let Some(device) = gpu {
            if device.probe().available {
                return Ok(ExecutionPath::Gpu(device));
            }
            info!("GPU device not available, using worker pool");
        }

        let pool = WorkerPool::initialize(config.pool, Arc::clone(executor))?;
        Ok(ExecutionPath::Cpu(pool))
    }

    /// Supersedes whatever is in flight and starts the pass sequence for a
    /// new generation, which is returned.
    pub fn start_render(
        &self,
        viewport: Viewport,
        params: RenderParameters,
        mode: RenderMode,
        julia: JuliaParams,
    ) -> Generation {
        let julia = if julia.c.is_finite() {
            julia
        } else {
            warn!("non-finite Julia constant, using the default");
            JuliaParams::default()
        };
        let request = RenderRequest {
            viewport,
            params: params.with_fractal(FractalType::from_mode(mode, julia)),
        };

        let (generation, ()) = self.shared.generations.advance_with(|generation| {
            self.shared.sink.clear(generation);

            let mut inner = self.shared.lock_inner();
            inner.state = RenderState::Running(generation);
            inner.latest_request = Some((generation, request));
        });

        debug!(%generation, "render requested");
        self.shared.wake.notify_one();

        generation
    }

    /// Reads a snapshot from `view` and starts rendering it.
    pub fn start_render_from(&self, view: &dyn ViewStateProvider) -> Generation {
        self.start_render(
            view.viewport(),
            view.render_params(),
            view.mode(),
            view.julia_params(),
        )
    }

    /// Bumps the generation without queueing new work.
    pub fn cancel_render(&self) -> Generation {
        let (generation, ()) = self.shared.generations.advance_with(|_| {
            let mut inner = self.shared.lock_inner();
            inner.latest_request = None;
            if let RenderState::Running(running) = inner.state {
                inner.state = RenderState::Superseded(running);
            }
        });

        debug!(%generation, "render cancelled");
        self.shared.idle.notify_all();

        generation
    }

    #[must_use]
    pub fn is_rendering(&self) -> bool {
        self.shared.lock_inner().state.is_running()
    }

    #[must_use]
    pub fn state(&self) -> RenderState {
        self.shared.lock_inner().state
    }

    #[must_use]
    pub fn backend(&self) -> Backend {
        self.shared.lock_inner().backend
    }

    #[must_use]
    pub fn current_generation(&self) -> Generation {
        self.shared.generations.current()
    }

    /// The error that stopped the last failed render. Cleared once a
    /// rebuilt worker pool is serving again.
    #[must_use]
    pub fn fatal_error(&self) -> Option<Arc<RendererError>> {
        self.shared.lock_inner().fatal_error.clone()
    }

    /// Blocks until no render is running or queued. Returns `false` on
    /// timeout.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let inner = self.shared.lock_inner();
        let (_inner, result) = self
            .shared
            .idle
            .wait_timeout_while(inner, timeout, |inner| {
                inner.busy || inner.latest_request.is_some() || inner.state.is_running()
            })
            .unwrap_or_else(PoisonError::into_inner);

        !result.timed_out()
    }

    pub fn shutdown(&mut self) {
        {
            let _inner = self.shared.lock_inner();
            self.shared.shutdown.store(true, Ordering::Release);
        }
        self.shared.generations.advance();
        self.shared.wake.notify_one();

        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }
    }

    fn worker_loop(shared: &Arc<SharedState>, mut path: ExecutionPath) {
        loop {
            let (generation, request) = {
                let mut inner = shared.lock_inner();
                loop {
                    if shared.shutdown.load(Ordering::Acquire) {
                        return;
                    }

                    if let Some(request) = inner.latest_request.take() {
                        inner.busy = true;
                        break request;
                    }

                    inner = shared
                        .wake
                        .wait(inner)
                        .unwrap_or_else(PoisonError::into_inner);
                }
            };

            Self::render_request(shared, &mut path, generation, &request);

            shared.lock_inner().busy = false;
            shared.idle.notify_all();
        }
    }

    fn render_request(
        shared: &Arc<SharedState>,
        path: &mut ExecutionPath,
        generation: Generation,
        request: &RenderRequest,
    ) {
        let start = Instant::now();

        if matches!(path, ExecutionPath::None) {
            match WorkerPool::initialize(shared.config.pool, Arc::clone(&shared.executor)) {
                Ok(pool) => {
                    info!("worker pool recreated");
                    *path = ExecutionPath::Cpu(pool);
                    shared.pool_ready();
                }
                Err(err) => {
                    Self::fail(shared, generation, err.into());
                    return;
                }
            }
        }

        for pass in &shared.config.passes {
            if !shared.generations.is_current(generation) {
                trace!(%generation, pass = %pass.kind, "superseded before pass");
                return;
            }

            let surface = request.viewport.scaled(pass.resolution_scale);
            let params = request
                .params
                .with_max_iterations(pass.effective_iterations(request.params.max_iterations()));

            debug!(
                %generation,
                pass = %pass.kind,
                width = surface.width(),
                height = surface.height(),
                iterations = params.max_iterations(),
                "pass started"
            );

            let outcome = loop {
                match Self::run_pass(shared, path, generation, pass, &surface, &params) {
                    Ok(outcome) => break Ok(outcome),
                    Err(PassFailure::Renderer(err)) => break Err(err),
                    Err(PassFailure::GpuLost(err)) => {
                        if let Err(init) = Self::fall_back_to_cpu(shared, path, &err) {
                            break Err(init);
                        }
                    }
                }
            };

            match outcome {
                Ok(PassOutcome::Completed) => {
                    shared.generations.apply_if_current(generation, || {
                        shared.sink.pass_completed(generation, pass.kind);
                    });
                    debug!(
                        %generation,
                        pass = %pass.kind,
                        elapsed_ms = start.elapsed().as_millis() as u64,
                        "pass finished"
                    );
                }
                Ok(PassOutcome::Superseded) => {
                    trace!(%generation, pass = %pass.kind, "superseded during pass");
                    return;
                }
                Err(err) => {
                    if matches!(err, RendererError::Pool(_)) {
                        *path = ExecutionPath::None;
                        shared.set_backend(Backend::Unavailable);
                    }
                    Self::fail(shared, generation, err);
                    return;
                }
            }
        }

        let completed = shared.generations.apply_if_current(generation, || {
            shared.lock_inner().state = RenderState::Completed(generation);
        });

        if completed.is_some() {
            info!(
                %generation,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "render completed"
            );
        }
    }

    fn run_pass(
        shared: &Arc<SharedState>,
        path: &ExecutionPath,
        generation: Generation,
        pass: &RenderPass,
        surface: &Viewport,
        params: &RenderParameters,
    ) -> Result<PassOutcome, PassFailure> {
        match path {
            ExecutionPath::Gpu(device) => {
                Self::run_gpu_pass(shared, device.as_ref(), generation, pass, surface, params)
            }
            ExecutionPath::Cpu(pool) => {
                Self::run_cpu_pass(shared, pool, generation, pass, surface, params)
            }
            ExecutionPath::None => Err(PassFailure::Renderer(PoolError::ShutDown.into())),
        }
    }

    /// Submits every tile of the pass and presents results as they arrive.
    fn run_cpu_pass(
        shared: &Arc<SharedState>,
        pool: &WorkerPool,
        generation: Generation,
        pass: &RenderPass,
        surface: &Viewport,
        params: &RenderParameters,
    ) -> Result<PassOutcome, PassFailure> {
        let tiles = TileScheduler::new(shared.config.tile_size).schedule(surface.width(), surface.height());
        let total = tiles.len();
        let jobs = tiles.into_iter().map(|tile| {
            TileJob::watched(tile, *surface, *params, shared.generations.watch(generation))
        });

        let completions = pool
            .submit_all(jobs)
            .map_err(|err| PassFailure::Renderer(err.into()))?;
        let mut received = 0;

        for outcome in completions {
            received += 1;

            let result = match outcome {
                JobOutcome::Completed(result) => result,
                // Left transparent; the next pass will likely cover it.
                JobOutcome::Failed { .. } => {
                    if !shared.generations.is_current(generation) {
                        return Ok(PassOutcome::Superseded);
                    }
                    continue;
                }
                JobOutcome::Skipped { .. } => return Ok(PassOutcome::Superseded),
            };

            let frame = TileFrame {
                generation,
                pass: pass.kind,
                tile: result.tile,
                pixels: result.pixels,
                is_partial: pass.is_partial(),
                resolution_scale: pass.resolution_scale,
                surface_width: surface.width(),
                surface_height: surface.height(),
            };

            let presented = shared
                .generations
                .apply_if_current(generation, || shared.sink.present(frame));
            if presented.is_none() {
                trace!(%generation, "discarding tile from superseded generation");
                return Ok(PassOutcome::Superseded);
            }
        }

        if received < total {
            if let Some(err) = pool.health() {
                return Err(PassFailure::Renderer(err.into()));
            }
        }

        Ok(PassOutcome::Completed)
    }

    /// One dispatch for the whole pass surface.
    fn run_gpu_pass(
        shared: &Arc<SharedState>,
        device: &dyn GpuDevice,
        generation: Generation,
        pass: &RenderPass,
        surface: &Viewport,
        params: &RenderParameters,
    ) -> Result<PassOutcome, PassFailure> {
        let block = GpuParams::new(surface, params);
        let start = Instant::now();

        let data = match device.dispatch(&block) {
            Ok(data) => data,
            Err(err) if err.is_permanent() => return Err(PassFailure::GpuLost(err)),
            Err(err) => {
                warn!(%generation, pass = %pass.kind, error = %err, "GPU dispatch failed, pass left unfilled");
                return Ok(PassOutcome::Completed);
            }
        };

        let pixels = match PixelBuffer::from_data(surface.width(), surface.height(), data) {
            Ok(pixels) => pixels,
            Err(err) => {
                warn!(%generation, pass = %pass.kind, error = %err, "GPU returned a malformed buffer");
                return Ok(PassOutcome::Completed);
            }
        };

        let frame = FullFrame {
            generation,
            pass: pass.kind,
            pixels,
            is_partial: pass.is_partial(),
            resolution_scale: pass.resolution_scale,
            render_duration: start.elapsed(),
        };

        match shared
            .generations
            .apply_if_current(generation, || shared.sink.present_full(frame))
        {
            Some(()) => Ok(PassOutcome::Completed),
            None => {
                trace!(%generation, "discarding GPU frame from superseded generation");
                Ok(PassOutcome::Superseded)
            }
        }
    }

    fn fall_back_to_cpu(
        shared: &Arc<SharedState>,
        path: &mut ExecutionPath,
        cause: &GpuError,
    ) -> Result<(), RendererError> {
        warn!(error = %cause, "GPU path lost, falling back to the worker pool");

        match WorkerPool::initialize(shared.config.pool, Arc::clone(&shared.executor)) {
            Ok(pool) => {
                *path = ExecutionPath::Cpu(pool);
                shared.pool_ready();
                info!(backend = %Backend::Cpu, "render backend switched");
                Ok(())
            }
            Err(err) => {
                *path = ExecutionPath::None;
                shared.set_backend(Backend::Unavailable);
                Err(err.into())
            }
        }
    }

    fn fail(shared: &Arc<SharedState>, generation: Generation, err: RendererError) {
        error!(%generation, error = %err, "render failed");
        let err = Arc::new(err);
        shared.lock_inner().fatal_error = Some(Arc::clone(&err));

        shared.generations.apply_if_current(generation, || {
            shared.lock_inner().state = RenderState::Failed(generation);
            shared.sink.failed(generation, &err);
        });
    }
}

impl Drop for RenderOrchestrator {
    fn drop(&mut self) {
        self.shutdown();
    }
}
