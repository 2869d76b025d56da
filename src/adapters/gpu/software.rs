//! A compute device that runs the dispatch on the CPU.
//!
//! It accepts exactly the parameter block the hardware device does, so the
//! orchestrator's GPU path can run headless and under test.

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::trace;

use crate::controllers::interactive::data::gpu_params::GpuParams;
use crate::controllers::interactive::ports::gpu_device::{GpuCapability, GpuDevice, GpuError};
use crate::core::actions::render_surface::render_surface_parallel;
use crate::core::data::complex::Complex;
use crate::core::data::render_params::{
    FractalType, OrbitTrap, OrbitTrapKind, PaletteId, RenderParameters,
};
use crate::core::data::viewport::Viewport;

#[derive(Debug, Default)]
pub struct SoftwareDevice {
    lost: AtomicBool,
}

impl SoftwareDevice {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every later dispatch fails with `DeviceLost`.
    pub fn lose(&self) {
        self.lost.store(true, Ordering::SeqCst);
    }
}

impl GpuDevice for SoftwareDevice {
    fn probe(&self) -> GpuCapability {
        GpuCapability {
            available: !self.lost.load(Ordering::SeqCst),
        }
    }

    fn dispatch(&self, params: &GpuParams) -> Result<Vec<u8>, GpuError> {
        if self.lost.load(Ordering::SeqCst) {
            return Err(GpuError::DeviceLost("software device was lost".to_string()));
        }

        let (viewport, render_params) = decode(params)?;
        trace!(width = params.width, height = params.height, "software dispatch");

        Ok(render_surface_parallel(&viewport, &render_params).into_data())
    }
}

/// Rebuilds the view a parameter block describes. Fields are widened from
/// f32, so results match a hardware dispatch rather than the f64 CPU path.
pub fn decode(params: &GpuParams) -> Result<(Viewport, RenderParameters), GpuError> {
    let viewport = Viewport::new(
        Complex::new(f64::from(params.center_x), f64::from(params.center_y)),
        f64::from(params.scale),
        params.width,
        params.height,
    )
    .map_err(|err| GpuError::Dispatch(err.to_string()))?;

    let fractal = match params.fractal_type {
        0 => FractalType::Mandelbrot,
        _ => FractalType::Julia {
            c: Complex::new(
                f64::from(params.julia_c_real),
                f64::from(params.julia_c_imag),
            ),
        },
    };

    let trap = (params.orbit_trap_enabled != 0).then(|| OrbitTrap {
        kind: OrbitTrapKind::from_index(params.orbit_trap_type),
        center: Complex::new(
            f64::from(params.orbit_trap_x),
            f64::from(params.orbit_trap_y),
        ),
        size: f64::from(params.orbit_trap_size),
        rotation: f64::from(params.orbit_trap_rotation),
    });

    let render_params = RenderParameters::new(params.max_iterations, fractal)
        .and_then(|p| p.with_orbit_trap(trap))
        .map_err(|err| GpuError::Dispatch(err.to_string()))?
        .with_palette(PaletteId::from_index(params.palette_id))
        .with_color_cycle_offset(f64::from(params.color_cycle_offset));

    Ok((viewport, render_params))
}
