//! The per-pixel compute kernel.
//!
//! [`evaluate`] is a pure function of its inputs, which is what lets tiles be
//! computed on any thread in any order and still stitch together seamlessly.

use crate::core::data::colour::Rgba8;
use crate::core::data::render_params::RenderParameters;
use crate::core::data::viewport::Viewport;
use crate::core::fractals::escape_time::{Escape, EscapeResult, escape_time};
use crate::core::fractals::palettes::Palette;

const TRAP_DISTANCE_WEIGHT: f64 = 2.0;
const TRAP_ITERATION_BLEND: f64 = 0.3;
const GLOW_FALLOFF: f64 = 10.0;
const GLOW_STRENGTH: f64 = 0.3;

/// Colour of the pixel at surface position `(px, py)`.
#[must_use]
pub fn evaluate(px: u32, py: u32, viewport: &Viewport, params: &RenderParameters) -> Rgba8 {
    let point = viewport.pixel_to_complex(f64::from(px), f64::from(py));
    let result = escape_time(point, params);

    colour_for(&result, params)
}

/// Maps an orbit outcome to a colour.
#[must_use]
pub fn colour_for(result: &EscapeResult, params: &RenderParameters) -> Rgba8 {
    let smooth = match result.escape {
        Escape::Interior { .. } => return Rgba8::BLACK,
        Escape::Escaped { smooth, .. } => smooth,
    };

    let palette = Palette::new(params.palette(), params.color_cycle_offset());
    let max_iterations = f64::from(params.max_iterations());

    match (params.orbit_trap(), result.trap) {
        (Some(_), Some(hit)) => {
            let distance_t = hit.distance * TRAP_DISTANCE_WEIGHT;
            let iteration_t = f64::from(hit.iteration) / max_iterations;
            let t = distance_t * (1.0 - TRAP_ITERATION_BLEND) + iteration_t * TRAP_ITERATION_BLEND;

            let glow = (-hit.distance * GLOW_FALLOFF).exp() * GLOW_STRENGTH;
            let rgb = palette.rgb(t).map(|channel| channel + (1.0 - channel) * glow);

            Rgba8::from_unit_rgb(rgb)
        }
        _ => {
            let t = (smooth / max_iterations).max(0.0).sqrt();
            palette.lookup(t)
        }
    }
}
