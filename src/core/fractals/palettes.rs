use crate::core::data::colour::Rgba8;
use crate::core::data::render_params::{PaletteId, wrap_unit};
use std::f64::consts::TAU;

/// A palette together with its colour-cycle offset.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Palette {
    id: PaletteId,
    cycle_offset: f64,
}

impl Palette {
    #[must_use]
    pub fn new(id: PaletteId, cycle_offset: f64) -> Self {
        Self {
            id,
            cycle_offset: wrap_unit(cycle_offset),
        }
    }

    #[must_use]
    pub fn id(&self) -> PaletteId {
        self.id
    }

    /// Linear RGB for `t`. Any `t` is reduced into `[0, 1)` before the
    /// offset is applied, so `rgb(t) == rgb(t mod 1)`.
    #[must_use]
    pub fn rgb(&self, t: f64) -> [f64; 3] {
        let cycled = wrap_unit(wrap_unit(t) + self.cycle_offset);

        match self.id {
            PaletteId::Classic => classic(cycled),
            PaletteId::Rainbow => rainbow(cycled),
            PaletteId::Fire => fire(cycled),
            PaletteId::Ice => ice(cycled),
            PaletteId::Grayscale => [cycled, cycled, cycled],
        }
    }

    #[must_use]
    pub fn lookup(&self, t: f64) -> Rgba8 {
        Rgba8::from_unit_rgb(self.rgb(t))
    }
}

#[must_use]
pub fn palette_lookup(t: f64, id: PaletteId, cycle_offset: f64) -> Rgba8 {
    Palette::new(id, cycle_offset).lookup(t)
}

fn classic(t: f64) -> [f64; 3] {
    let wave = |phase: f64| 0.5 + 0.5 * (TAU * (t + phase)).cos();
    [wave(0.0), wave(0.33), wave(0.67)]
}

fn rainbow(t: f64) -> [f64; 3] {
    let hue = t * 6.0;
    let x = 1.0 - (hue % 2.0 - 1.0).abs();

    match hue {
        h if h < 1.0 => [1.0, x, 0.0],
        h if h < 2.0 => [x, 1.0, 0.0],
        h if h < 3.0 => [0.0, 1.0, x],
        h if h < 4.0 => [0.0, x, 1.0],
        h if h < 5.0 => [x, 0.0, 1.0],
        _ => [1.0, 0.0, x],
    }
}

// black, red, orange, yellow, white
fn fire(t: f64) -> [f64; 3] {
    [
        (t * 3.0).clamp(0.0, 1.0),
        (t * 3.0 - 1.0).clamp(0.0, 1.0),
        (t * 3.0 - 2.0).clamp(0.0, 1.0),
    ]
}

// black, blue, cyan, white
fn ice(t: f64) -> [f64; 3] {
    [
        (t * 2.0 - 1.0).clamp(0.0, 1.0),
        (t * 2.0 - 0.5).clamp(0.0, 1.0),
        (t * 1.5).clamp(0.0, 1.0),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_periodic_in_t() {
        for &id in PaletteId::ALL {
            let palette = Palette::new(id, 0.3);
            for t in [0.0, 0.125, 0.5, 0.75, 0.9375] {
                assert_eq!(palette.lookup(t), palette.lookup(t + 1.0), "{id} at {t}");
                assert_eq!(palette.lookup(t), palette.lookup(t + 7.0), "{id} at {t}");
            }
        }
    }

    #[test]
    fn test_unknown_palette_index_is_grayscale_of_cycled_value() {
        let colour = palette_lookup(0.5, PaletteId::from_index(99), 0.25);

        assert_eq!(colour, Rgba8::opaque(191, 191, 191));
    }

    #[test]
    fn test_offset_shifts_the_lookup() {
        let shifted = palette_lookup(0.1, PaletteId::Fire, 0.2);
        let direct = palette_lookup(0.3, PaletteId::Fire, 0.0);

        assert_eq!(shifted, direct);
    }

    #[test]
    fn test_fire_ramp_endpoints() {
        assert_eq!(palette_lookup(0.0, PaletteId::Fire, 0.0), Rgba8::BLACK);
        assert_eq!(
            palette_lookup(0.999_999, PaletteId::Fire, 0.0),
            Rgba8::opaque(255, 255, 254)
        );
    }

    #[test]
    fn test_ice_starts_black_and_turns_blue_first() {
        assert_eq!(palette_lookup(0.0, PaletteId::Ice, 0.0), Rgba8::BLACK);

        let early = palette_lookup(0.2, PaletteId::Ice, 0.0);
        assert_eq!(early.r, 0);
        assert_eq!(early.g, 0);
        assert!(early.b > 0);
    }

    #[test]
    fn test_rainbow_starts_red() {
        assert_eq!(
            palette_lookup(0.0, PaletteId::Rainbow, 0.0),
            Rgba8::opaque(255, 0, 0)
        );
    }

    #[test]
    fn test_classic_red_channel_peaks_at_zero() {
        let colour = palette_lookup(0.0, PaletteId::Classic, 0.0);

        assert_eq!(colour.r, 255);
        assert_eq!(colour.a, 255);
    }
}
