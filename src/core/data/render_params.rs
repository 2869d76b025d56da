//! Parameters that select what the kernel computes and how it is coloured.

use crate::core::data::complex::Complex;

#[derive(Debug, Copy, Clone, PartialEq, thiserror::Error)]
pub enum RenderParametersError {
    #[error("maximum iterations must be greater than zero")]
    ZeroMaxIterations,
    #[error("julia constant must be finite")]
    NonFiniteJuliaConstant,
    #[error("orbit trap {field} must be finite")]
    NonFiniteTrap { field: &'static str },
}

/// Colour palettes understood by the kernel.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum PaletteId {
    #[default]
    Classic,
    Rainbow,
    Fire,
    Ice,
    Grayscale,
}

impl PaletteId {
    pub const ALL: &'static [Self] = &[
        Self::Classic,
        Self::Rainbow,
        Self::Fire,
        Self::Ice,
        Self::Grayscale,
    ];

    /// Any index outside the named palettes falls back to grayscale.
    #[must_use]
    pub const fn from_index(index: u32) -> Self {
        match index {
            0 => Self::Classic,
            1 => Self::Rainbow,
            2 => Self::Fire,
            3 => Self::Ice,
            _ => Self::Grayscale,
        }
    }

    #[must_use]
    pub const fn index(self) -> u32 {
        match self {
            Self::Classic => 0,
            Self::Rainbow => 1,
            Self::Fire => 2,
            Self::Ice => 3,
            Self::Grayscale => 4,
        }
    }

    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Classic => "Classic",
            Self::Rainbow => "Rainbow",
            Self::Fire => "Fire",
            Self::Ice => "Ice",
            Self::Grayscale => "Grayscale",
        }
    }
}

impl std::fmt::Display for PaletteId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).display_name())
    }
}

/// Mode as seen by the view-state provider.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum RenderMode {
    #[default]
    Mandelbrot,
    Julia,
}

/// The Julia constant chosen in the UI; only read in Julia mode.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct JuliaParams {
    pub c: Complex,
}

impl Default for JuliaParams {
    fn default() -> Self {
        Self {
            c: Complex::new(-0.7, 0.27015),
        }
    }
}

/// Which escape-time set to iterate. Julia carries its constant, so a Julia
/// request without one cannot be expressed.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum FractalType {
    Mandelbrot,
    Julia { c: Complex },
}

impl FractalType {
    #[must_use]
    pub fn from_mode(mode: RenderMode, julia: JuliaParams) -> Self {
        match mode {
            RenderMode::Mandelbrot => Self::Mandelbrot,
            RenderMode::Julia => Self::Julia { c: julia.c },
        }
    }

    #[must_use]
    pub fn mode(&self) -> RenderMode {
        match self {
            Self::Mandelbrot => RenderMode::Mandelbrot,
            Self::Julia { .. } => RenderMode::Julia,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum OrbitTrapKind {
    Point,
    Cross,
    #[default]
    Circle,
    Line,
    Square,
}

impl OrbitTrapKind {
    pub const ALL: &'static [Self] = &[
        Self::Point,
        Self::Cross,
        Self::Circle,
        Self::Line,
        Self::Square,
    ];

    #[must_use]
    pub const fn index(self) -> u32 {
        match self {
            Self::Point => 0,
            Self::Cross => 1,
            Self::Circle => 2,
            Self::Line => 3,
            Self::Square => 4,
        }
    }

    /// Unknown indices behave like a point trap.
    #[must_use]
    pub const fn from_index(index: u32) -> Self {
        match index {
            1 => Self::Cross,
            2 => Self::Circle,
            3 => Self::Line,
            4 => Self::Square,
            _ => Self::Point,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct OrbitTrap {
    pub kind: OrbitTrapKind,
    pub center: Complex,
    pub size: f64,
    pub rotation: f64,
}

impl Default for OrbitTrap {
    fn default() -> Self {
        Self {
            kind: OrbitTrapKind::Circle,
            center: Complex::ZERO,
            size: 0.5,
            rotation: 0.0,
        }
    }
}

/// Everything the kernel needs besides the viewport.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RenderParameters {
    max_iterations: u32,
    palette: PaletteId,
    color_cycle_offset: f64,
    fractal: FractalType,
    orbit_trap: Option<OrbitTrap>,
}

impl RenderParameters {
    pub fn new(max_iterations: u32, fractal: FractalType) -> Result<Self, RenderParametersError> {
        if max_iterations == 0 {
            return Err(RenderParametersError::ZeroMaxIterations);
        }

        if let FractalType::Julia { c } = fractal {
            if !c.is_finite() {
                return Err(RenderParametersError::NonFiniteJuliaConstant);
            }
        }

        Ok(Self {
            max_iterations,
            palette: PaletteId::default(),
            color_cycle_offset: 0.0,
            fractal,
            orbit_trap: None,
        })
    }

    #[must_use]
    pub fn with_palette(self, palette: PaletteId) -> Self {
        Self { palette, ..self }
    }

    /// Offsets wrap into `[0, 1)`; non-finite offsets reset to zero.
    #[must_use]
    pub fn with_color_cycle_offset(self, offset: f64) -> Self {
        Self {
            color_cycle_offset: wrap_unit(offset),
            ..self
        }
    }

    pub fn with_orbit_trap(self, trap: Option<OrbitTrap>) -> Result<Self, RenderParametersError> {
        if let Some(trap) = trap {
            if !trap.center.is_finite() {
                return Err(RenderParametersError::NonFiniteTrap { field: "center" });
            }
            if !trap.size.is_finite() {
                return Err(RenderParametersError::NonFiniteTrap { field: "size" });
            }
            if !trap.rotation.is_finite() {
                return Err(RenderParametersError::NonFiniteTrap { field: "rotation" });
            }
        }

        Ok(Self {
            orbit_trap: trap,
            ..self
        })
    }

    #[must_use]
    pub fn with_fractal(self, fractal: FractalType) -> Self {
        Self { fractal, ..self }
    }

    /// Same parameters with a different iteration cap, used for the
    /// low-budget refinement passes. Zero is bumped to one.
    #[must_use]
    pub fn with_max_iterations(self, max_iterations: u32) -> Self {
        Self {
            max_iterations: max_iterations.max(1),
            ..self
        }
    }

    #[must_use]
    pub fn max_iterations(&self) -> u32 {
        self.max_iterations
    }

    #[must_use]
    pub fn palette(&self) -> PaletteId {
        self.palette
    }

    #[must_use]
    pub fn color_cycle_offset(&self) -> f64 {
        self.color_cycle_offset
    }

    #[must_use]
    pub fn fractal(&self) -> FractalType {
        self.fractal
    }

    #[must_use]
    pub fn orbit_trap(&self) -> Option<OrbitTrap> {
        self.orbit_trap
    }
}

/// Reduces `value` into `[0, 1)`.
#[must_use]
pub fn wrap_unit(value: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }

    let wrapped = value.rem_euclid(1.0);
    // rem_euclid rounds tiny negative inputs up to exactly 1.0
    if wrapped >= 1.0 { 0.0 } else { wrapped }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_max_iterations_is_rejected() {
        assert_eq!(
            RenderParameters::new(0, FractalType::Mandelbrot),
            Err(RenderParametersError::ZeroMaxIterations)
        );
    }

    #[test]
    fn test_julia_constant_must_be_finite() {
        let fractal = FractalType::Julia {
            c: Complex::new(f64::NAN, 0.0),
        };

        assert_eq!(
            RenderParameters::new(100, fractal),
            Err(RenderParametersError::NonFiniteJuliaConstant)
        );
    }

    #[test]
    fn test_color_cycle_offset_wraps() {
        let params = RenderParameters::new(100, FractalType::Mandelbrot)
            .unwrap()
            .with_color_cycle_offset(2.25);
        assert!((params.color_cycle_offset() - 0.25).abs() < 1e-12);

        let params = params.with_color_cycle_offset(-0.25);
        assert!((params.color_cycle_offset() - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_wrap_unit_never_returns_one() {
        assert_eq!(wrap_unit(-1e-20), 0.0);
        assert_eq!(wrap_unit(1.0), 0.0);
        assert_eq!(wrap_unit(f64::INFINITY), 0.0);
    }

    #[test]
    fn test_trap_fields_must_be_finite() {
        let params = RenderParameters::new(100, FractalType::Mandelbrot).unwrap();
        let trap = OrbitTrap {
            size: f64::NAN,
            ..OrbitTrap::default()
        };

        assert_eq!(
            params.with_orbit_trap(Some(trap)),
            Err(RenderParametersError::NonFiniteTrap { field: "size" })
        );
    }

    #[test]
    fn test_with_max_iterations_never_zero() {
        let params = RenderParameters::new(100, FractalType::Mandelbrot)
            .unwrap()
            .with_max_iterations(0);

        assert_eq!(params.max_iterations(), 1);
    }

    #[test]
    fn test_palette_index_round_trip_and_fallback() {
        for &palette in PaletteId::ALL {
            assert_eq!(PaletteId::from_index(palette.index()), palette);
        }
        assert_eq!(PaletteId::from_index(42), PaletteId::Grayscale);
    }

    #[test]
    fn test_trap_kind_unknown_index_is_point() {
        for &kind in OrbitTrapKind::ALL {
            assert_eq!(OrbitTrapKind::from_index(kind.index()), kind);
        }
        assert_eq!(OrbitTrapKind::from_index(9), OrbitTrapKind::Point);
    }

    #[test]
    fn test_fractal_type_from_mode() {
        let julia = JuliaParams::default();

        assert_eq!(
            FractalType::from_mode(RenderMode::Mandelbrot, julia),
            FractalType::Mandelbrot
        );
        assert_eq!(
            FractalType::from_mode(RenderMode::Julia, julia),
            FractalType::Julia { c: julia.c }
        );
        assert_eq!(FractalType::Julia { c: julia.c }.mode(), RenderMode::Julia);
    }
}
