use crate::core::data::complex::Complex;
use crate::core::data::render_params::{OrbitTrap, OrbitTrapKind};

/// Distance from an orbit sample to the trap shape.
#[must_use]
pub fn trap_distance(z: Complex, trap: &OrbitTrap) -> f64 {
    let local = z - trap.center;

    match trap.kind {
        OrbitTrapKind::Point => local.magnitude(),
        OrbitTrapKind::Cross => local.real.abs().min(local.imag.abs()),
        OrbitTrapKind::Circle => (local.magnitude() - trap.size).abs(),
        OrbitTrapKind::Line => local.rotated(trap.rotation).imag.abs(),
        // `size` is the half-width, matching the circle's radius
        OrbitTrapKind::Square => (local.real.abs().max(local.imag.abs()) - trap.size).abs(),
    }
}
