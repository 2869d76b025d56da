use crate::core::data::complex::Complex;
use crate::core::data::render_params::{FractalType, OrbitTrap, RenderParameters};
use crate::core::fractals::orbit_traps::trap_distance;

pub const BAILOUT_RADIUS: f64 = 256.0;
pub const BAILOUT_SQUARED: f64 = BAILOUT_RADIUS * BAILOUT_RADIUS;

/// How an orbit ended.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Escape {
    /// Reached the iteration cap, or was classified interior before iterating.
    Interior { iterated: u32, short_circuit: bool },
    /// Crossed the bailout radius at `iteration`; `smooth` is the continuous
    /// iteration count.
    Escaped { iteration: u32, smooth: f64 },
}

/// Closest approach of the orbit to the trap shape.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TrapHit {
    pub distance: f64,
    pub iteration: u32,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct EscapeResult {
    pub escape: Escape,
    pub trap: Option<TrapHit>,
}

impl EscapeResult {
    #[must_use]
    pub fn is_interior(&self) -> bool {
        matches!(self.escape, Escape::Interior { .. })
    }
}

#[must_use]
pub fn in_main_cardioid(c: Complex) -> bool {
    let x = c.real - 0.25;
    let q = x * x + c.imag * c.imag;
    q * (q + x) < 0.25 * c.imag * c.imag
}

#[must_use]
pub fn in_period2_bulb(c: Complex) -> bool {
    let dx = c.real + 1.0;
    dx * dx + c.imag * c.imag < 0.0625
}

/// Continuous iteration count for an orbit that escaped at `iteration` with
/// squared magnitude `magnitude_squared`.
#[must_use]
pub fn smooth_iteration_count(iteration: u32, magnitude_squared: f64) -> f64 {
    let ln2 = std::f64::consts::LN_2;
    let log_zn = magnitude_squared.ln() / 2.0;
    let nu = (log_zn / ln2).ln() / ln2;

    f64::from(iteration) + 1.0 - nu
}

/// Iterates `z <- z^2 + c` from `z0`.
///
/// When a trap is supplied the distance is measured on every iteration that
/// has not yet escaped, keeping the first minimum.
#[must_use]
pub fn iterate(c: Complex, z0: Complex, max_iterations: u32, trap: Option<&OrbitTrap>) -> EscapeResult {
    let mut z = z0;
    let mut closest: Option<TrapHit> = None;

    for iteration in 0..max_iterations {
        let magnitude_squared = z.magnitude_squared();

        if magnitude_squared > BAILOUT_SQUARED {
            return EscapeResult {
                escape: Escape::Escaped {
                    iteration,
                    smooth: smooth_iteration_count(iteration, magnitude_squared),
                },
                trap: closest,
            };
        }

        if let Some(trap) = trap {
            let distance = trap_distance(z, trap);
            if closest.is_none_or(|hit| distance < hit.distance) {
                closest = Some(TrapHit {
                    distance,
                    iteration,
                });
            }
        }

        z = z * z + c;
    }

    EscapeResult {
        escape: Escape::Interior {
            iterated: max_iterations,
            short_circuit: false,
        },
        trap: closest,
    }
}

/// Escape-time evaluation of one complex coordinate.
///
/// Mandelbrot points inside the main cardioid or the period-2 bulb are
/// classified interior without iterating. Julia sets get no such shortcut.
#[must_use]
pub fn escape_time(point: Complex, params: &RenderParameters) -> EscapeResult {
    let trap = params.orbit_trap();

    match params.fractal() {
        FractalType::Mandelbrot => {
            if in_main_cardioid(point) || in_period2_bulb(point) {
                return EscapeResult {
                    escape: Escape::Interior {
                        iterated: 0,
                        short_circuit: true,
                    },
                    trap: None,
                };
            }

            iterate(point, Complex::ZERO, params.max_iterations(), trap.as_ref())
        }
        FractalType::Julia { c } => iterate(c, point, params.max_iterations(), trap.as_ref()),
    }
}
