use std::num::NonZeroU32;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use progressive_fractal::controllers::interactive::ports::gpu_device::GpuDevice;
use progressive_fractal::controllers::interactive::ports::presentation_sink::PresentationSink;
use progressive_fractal::core::data::complex::Complex;
use progressive_fractal::core::data::render_params::{
    FractalType, JuliaParams, OrbitTrap, OrbitTrapKind, PaletteId, RenderMode, RenderParameters,
};
use progressive_fractal::core::data::viewport::Viewport;
use progressive_fractal::{
    CanvasCompositor, PoolConfig, RenderOrchestrator, RenderState, RendererConfig, SoftwareDevice,
    write_ppm,
};

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
enum BackendArg {
    /// Worker pool only.
    Cpu,
    /// Full-surface dispatches evaluated on the CPU.
    SoftwareGpu,
    /// Hardware compute through wgpu; needs the `gpu` feature.
    Gpu,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
enum PaletteArg {
    Classic,
    Rainbow,
    Fire,
    Ice,
    Grayscale,
}

impl From<PaletteArg> for PaletteId {
    fn from(value: PaletteArg) -> Self {
        match value {
            PaletteArg::Classic => Self::Classic,
            PaletteArg::Rainbow => Self::Rainbow,
            PaletteArg::Fire => Self::Fire,
            PaletteArg::Ice => Self::Ice,
            PaletteArg::Grayscale => Self::Grayscale,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
enum TrapArg {
    Point,
    Cross,
    Circle,
    Line,
    Square,
}

impl From<TrapArg> for OrbitTrapKind {
    fn from(value: TrapArg) -> Self {
        match value {
            TrapArg::Point => Self::Point,
            TrapArg::Cross => Self::Cross,
            TrapArg::Circle => Self::Circle,
            TrapArg::Line => Self::Line,
            TrapArg::Square => Self::Square,
        }
    }
}

/// Renders one view progressively and writes the final frame as PPM.
#[derive(Parser, Debug)]
#[command(name = "progressive_fractal", version, about)]
struct Args {
    #[arg(long, env = "FRACTAL_WIDTH", default_value_t = 800)]
    width: u32,

    #[arg(long, env = "FRACTAL_HEIGHT", default_value_t = 600)]
    height: u32,

    /// View centre as `re,im`; defaults to the standard view for the mode.
    #[arg(long, env = "FRACTAL_CENTER", value_name = "RE,IM", allow_hyphen_values = true, value_parser = parse_complex)]
    center: Option<Complex>,

    /// Complex units per pixel.
    #[arg(long, env = "FRACTAL_SCALE", default_value_t = 0.004)]
    scale: f64,

    #[arg(long, env = "FRACTAL_ITERATIONS", default_value_t = 1000)]
    iterations: u32,

    #[arg(long, env = "FRACTAL_PALETTE", value_enum, default_value_t = PaletteArg::Classic)]
    palette: PaletteArg,

    #[arg(long, env = "FRACTAL_CYCLE_OFFSET", default_value_t = 0.0, allow_hyphen_values = true)]
    cycle_offset: f64,

    /// Renders the Julia set for this constant instead of the Mandelbrot set.
    #[arg(long, env = "FRACTAL_JULIA", value_name = "RE,IM", allow_hyphen_values = true, value_parser = parse_complex)]
    julia: Option<Complex>,

    #[arg(long, env = "FRACTAL_TRAP", value_enum)]
    trap: Option<TrapArg>,

    #[arg(long, env = "FRACTAL_TRAP_CENTER", value_name = "RE,IM", allow_hyphen_values = true, value_parser = parse_complex, default_value = "0,0")]
    trap_center: Complex,

    #[arg(long, env = "FRACTAL_TRAP_SIZE", default_value_t = 0.5)]
    trap_size: f64,

    /// Radians.
    #[arg(long, env = "FRACTAL_TRAP_ROTATION", default_value_t = 0.0, allow_hyphen_values = true)]
    trap_rotation: f64,

    /// Worker pool size; defaults to the available parallelism.
    #[arg(long, env = "FRACTAL_WORKERS")]
    workers: Option<usize>,

    #[arg(long, env = "FRACTAL_TILE_SIZE", default_value = "64")]
    tile_size: NonZeroU32,

    #[arg(long, env = "FRACTAL_BACKEND", value_enum, default_value_t = BackendArg::Cpu)]
    backend: BackendArg,

    /// Seconds to wait for the render to finish.
    #[arg(long, env = "FRACTAL_TIMEOUT", default_value_t = 120)]
    timeout: u64,

    #[arg(short, long, env = "FRACTAL_OUTPUT", default_value = "output/fractal.ppm")]
    output: PathBuf,
}

fn parse_complex(value: &str) -> Result<Complex, String> {
    let (real, imag) = value
        .split_once(',')
        .ok_or_else(|| format!("expected `re,im`, got `{value}`"))?;
    let parse = |part: &str| {
        part.trim()
            .parse::<f64>()
            .map_err(|e| format!("invalid number `{}`: {e}", part.trim()))
    };

    Ok(Complex::new(parse(real)?, parse(imag)?))
}

impl Args {
    fn mode(&self) -> RenderMode {
        if self.julia.is_some() {
            RenderMode::Julia
        } else {
            RenderMode::Mandelbrot
        }
    }

    fn julia_params(&self) -> JuliaParams {
        self.julia.map_or_else(JuliaParams::default, |c| JuliaParams { c })
    }

    fn viewport(&self) -> Result<Viewport> {
        let default_center = match self.mode() {
            RenderMode::Mandelbrot => Complex::new(-0.5, 0.0),
            RenderMode::Julia => Complex::ZERO,
        };
        Viewport::new(
            self.center.unwrap_or(default_center),
            self.scale,
            self.width,
            self.height,
        )
        .context("invalid view")
    }

    fn render_params(&self) -> Result<RenderParameters> {
        let trap = self.trap.map(|kind| OrbitTrap {
            kind: kind.into(),
            center: self.trap_center,
            size: self.trap_size,
            rotation: self.trap_rotation,
        });

        let params = RenderParameters::new(
            self.iterations,
            FractalType::from_mode(self.mode(), self.julia_params()),
        )
        .and_then(|p| p.with_orbit_trap(trap))
        .context("invalid render parameters")?
        .with_palette(self.palette.into())
        .with_color_cycle_offset(self.cycle_offset);

        Ok(params)
    }

    fn renderer_config(&self) -> RendererConfig {
        let pool = match self.workers {
            Some(size) => PoolConfig::default().with_size(size),
            None => PoolConfig::default(),
        };

        RendererConfig {
            tile_size: self.tile_size,
            pool,
            ..RendererConfig::default()
        }
    }

    fn gpu_device(&self) -> Option<Arc<dyn GpuDevice>> {
        match self.backend {
            BackendArg::Cpu => None,
            BackendArg::SoftwareGpu => Some(Arc::new(SoftwareDevice::new())),
            BackendArg::Gpu => hardware_device(),
        }
    }
}

#[cfg(feature = "gpu")]
fn hardware_device() -> Option<Arc<dyn GpuDevice>> {
    match progressive_fractal::WgpuDevice::new() {
        Ok(device) => Some(Arc::new(device)),
        Err(err) => {
            warn!(error = %err, "no usable GPU, rendering on the worker pool");
            None
        }
    }
}

#[cfg(not(feature = "gpu"))]
fn hardware_device() -> Option<Arc<dyn GpuDevice>> {
    warn!("built without the `gpu` feature, rendering on the worker pool");
    None
}

fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn run(args: &Args) -> Result<()> {
    let viewport = args.viewport()?;
    let params = args.render_params()?;
    let compositor = Arc::new(CanvasCompositor::new(viewport.width(), viewport.height()));

    let mut renderer = RenderOrchestrator::new(
        args.renderer_config(),
        Arc::clone(&compositor) as Arc<dyn PresentationSink>,
        args.gpu_device(),
    )
    .context("failed to start renderer")?;

    let start = Instant::now();
    let generation = renderer.start_render(viewport, params, args.mode(), args.julia_params());
    let timeout = Duration::from_secs(args.timeout);

    if !renderer.wait_idle(timeout) {
        bail!("render did not finish within {timeout:?}");
    }
    if let Some(err) = renderer.fatal_error() {
        bail!("render failed: {err}");
    }
    match renderer.state() {
        RenderState::Completed(done) if done == generation => {}
        other => bail!("render ended in unexpected state {other:?}"),
    }
    renderer.shutdown();

    if let Some(parent) = args.output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    write_ppm(&compositor.snapshot(), &args.output)
        .with_context(|| format!("failed to write {}", args.output.display()))?;

    info!(
        path = %args.output.display(),
        width = viewport.width(),
        height = viewport.height(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "frame written"
    );

    Ok(())
}

fn main() -> Result<()> {
    initialise_tracing();
    let args = Args::parse();
    run(&args)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> Args {
        let mut argv = vec!["progressive_fractal"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    fn temp_output(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("progressive_fractal_{}_{name}.ppm", std::process::id()))
    }

    #[test]
    fn test_parse_complex() {
        assert_eq!(parse_complex("-0.7, 0.27015"), Ok(Complex::new(-0.7, 0.27015)));
        assert!(parse_complex("1.0").is_err());
        assert!(parse_complex("a,b").is_err());
    }

    #[test]
    fn test_defaults_describe_mandelbrot_view() {
        let args = parse(&[]);

        assert_eq!(args.mode(), RenderMode::Mandelbrot);
        assert_eq!(args.viewport().unwrap(), Viewport::mandelbrot_default(800, 600).unwrap());
        assert_eq!(args.render_params().unwrap().max_iterations(), 1000);
        assert!(args.gpu_device().is_none());
    }

    #[test]
    fn test_julia_flag_switches_mode_and_centre() {
        let args = parse(&["--julia=-0.8,0.156", "--trap", "square", "--palette", "fire"]);

        assert_eq!(args.mode(), RenderMode::Julia);
        assert_eq!(args.viewport().unwrap().center(), Complex::ZERO);
        let params = args.render_params().unwrap();
        assert_eq!(
            params.fractal(),
            FractalType::Julia {
                c: Complex::new(-0.8, 0.156)
            }
        );
        assert_eq!(params.orbit_trap().unwrap().kind, OrbitTrapKind::Square);
        assert_eq!(params.palette(), PaletteId::Fire);
    }

    #[test]
    fn test_invalid_scale_is_rejected() {
        let args = parse(&["--scale", "0"]);

        assert!(args.viewport().is_err());
    }

    #[test]
    fn test_run_writes_frame_on_cpu() {
        let output = temp_output("cpu");
        let output_arg = output.display().to_string();
        let args = parse(&["--width", "48", "--height", "32", "--iterations", "64", "--workers", "2", "-o", &output_arg]);

        run(&args).unwrap();

        let written = std::fs::read(&output).unwrap();
        std::fs::remove_file(&output).unwrap();
        assert!(written.starts_with(b"P6\n48 32\n255\n"));
        assert_eq!(written.len(), "P6\n48 32\n255\n".len() + 48 * 32 * 3);
    }

    #[test]
    fn test_run_writes_frame_on_software_gpu() {
        let output = temp_output("software_gpu");
        let output_arg = output.display().to_string();
        let args = parse(&[
            "--width", "40", "--height", "24", "--iterations", "64", "--workers", "2", "--backend", "software-gpu", "-o", &output_arg,
        ]);

        run(&args).unwrap();

        let written = std::fs::read(&output).unwrap();
        std::fs::remove_file(&output).unwrap();
        assert_eq!(written.len(), "P6\n40 24\n255\n".len() + 40 * 24 * 3);
    }
}
