use crate::core::data::render_params::{
    FractalType, JuliaParams, OrbitTrap, OrbitTrapKind, RenderParameters,
};
use crate::core::data::viewport::Viewport;

pub const GPU_PARAMS_SIZE: usize = 72;

/// Uniform block for one compute dispatch, mirroring the WGSL `Params`
/// struct field for field.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct GpuParams {
    pub center_x: f32,
    pub center_y: f32,
    pub scale: f32,
    pub width: u32,
    pub height: u32,
    pub max_iterations: u32,
    pub fractal_type: u32,
    pub julia_c_real: f32,
    pub julia_c_imag: f32,
    pub palette_id: u32,
    pub orbit_trap_enabled: u32,
    pub orbit_trap_type: u32,
    pub orbit_trap_x: f32,
    pub orbit_trap_y: f32,
    pub orbit_trap_size: f32,
    pub orbit_trap_rotation: f32,
    pub color_cycle_offset: f32,
}

impl GpuParams {
    /// Disabled traps and Mandelbrot mode still fill their fields with the
    /// defaults so the block is fully defined.
    #[must_use]
    pub fn new(viewport: &Viewport, params: &RenderParameters) -> Self {
        let (fractal_type, julia_c) = match params.fractal() {
            FractalType::Mandelbrot => (0, JuliaParams::default().c),
            FractalType::Julia { c } => (1, c),
        };
        let (trap_enabled, trap) = match params.orbit_trap() {
            Some(trap) => (1, trap),
            None => (
                0,
                OrbitTrap {
                    kind: OrbitTrapKind::Point,
                    ..OrbitTrap::default()
                },
            ),
        };

        Self {
            center_x: viewport.center().real as f32,
            center_y: viewport.center().imag as f32,
            scale: viewport.scale() as f32,
            width: viewport.width(),
            height: viewport.height(),
            max_iterations: params.max_iterations(),
            fractal_type,
            julia_c_real: julia_c.real as f32,
            julia_c_imag: julia_c.imag as f32,
            palette_id: params.palette().index(),
            orbit_trap_enabled: trap_enabled,
            orbit_trap_type: trap.kind.index(),
            orbit_trap_x: trap.center.real as f32,
            orbit_trap_y: trap.center.imag as f32,
            orbit_trap_size: trap.size as f32,
            orbit_trap_rotation: trap.rotation as f32,
            color_cycle_offset: params.color_cycle_offset() as f32,
        }
    }

    #[must_use]
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Little-endian, 4 bytes per field, trailing 4 bytes of padding.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; GPU_PARAMS_SIZE] {
        let words: [[u8; 4]; GPU_PARAMS_SIZE / 4] = [
            self.center_x.to_le_bytes(),
            self.center_y.to_le_bytes(),
            self.scale.to_le_bytes(),
            self.width.to_le_bytes(),
            self.height.to_le_bytes(),
            self.max_iterations.to_le_bytes(),
            self.fractal_type.to_le_bytes(),
            self.julia_c_real.to_le_bytes(),
            self.julia_c_imag.to_le_bytes(),
            self.palette_id.to_le_bytes(),
            self.orbit_trap_enabled.to_le_bytes(),
            self.orbit_trap_type.to_le_bytes(),
            self.orbit_trap_x.to_le_bytes(),
            self.orbit_trap_y.to_le_bytes(),
            self.orbit_trap_size.to_le_bytes(),
            self.orbit_trap_rotation.to_le_bytes(),
            self.color_cycle_offset.to_le_bytes(),
            0f32.to_le_bytes(),
        ];

        let mut bytes = [0u8; GPU_PARAMS_SIZE];
        for (chunk, word) in bytes.chunks_exact_mut(4).zip(words) {
            chunk.copy_from_slice(&word);
        }
        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::data::complex::Complex;
    use crate::core::data::render_params::PaletteId;

    fn word(bytes: &[u8], index: usize) -> [u8; 4] {
        bytes[index * 4..index * 4 + 4].try_into().unwrap()
    }

    #[test]
    fn test_mandelbrot_block_layout() {
        let viewport = Viewport::mandelbrot_default(800, 600).unwrap();
        let params = RenderParameters::new(1000, FractalType::Mandelbrot)
            .unwrap()
            .with_palette(PaletteId::Fire)
            .with_color_cycle_offset(0.25);

        let bytes = GpuParams::new(&viewport, &params).to_bytes();

        assert_eq!(bytes.len(), 72);
        assert_eq!(f32::from_le_bytes(word(&bytes, 0)), -0.5);
        assert_eq!(f32::from_le_bytes(word(&bytes, 2)), 0.004);
        assert_eq!(u32::from_le_bytes(word(&bytes, 3)), 800);
        assert_eq!(u32::from_le_bytes(word(&bytes, 4)), 600);
        assert_eq!(u32::from_le_bytes(word(&bytes, 5)), 1000);
        assert_eq!(u32::from_le_bytes(word(&bytes, 6)), 0);
        assert_eq!(f32::from_le_bytes(word(&bytes, 7)), -0.7);
        assert_eq!(u32::from_le_bytes(word(&bytes, 9)), 2);
        assert_eq!(u32::from_le_bytes(word(&bytes, 10)), 0);
        assert_eq!(f32::from_le_bytes(word(&bytes, 14)), 0.5);
        assert_eq!(f32::from_le_bytes(word(&bytes, 16)), 0.25);
        assert_eq!(word(&bytes, 17), [0; 4]);
    }

    #[test]
    fn test_julia_and_trap_fields() {
        let viewport = Viewport::julia_default(64, 32).unwrap();
        let trap = OrbitTrap {
            kind: OrbitTrapKind::Square,
            center: Complex::new(0.25, -0.5),
            size: 0.75,
            rotation: 1.5,
        };
        let params = RenderParameters::new(
            300,
            FractalType::Julia {
                c: Complex::new(0.285, 0.01),
            },
        )
        .unwrap()
        .with_orbit_trap(Some(trap))
        .unwrap();

        let block = GpuParams::new(&viewport, &params);
        let bytes = block.to_bytes();

        assert_eq!(block.pixel_count(), 2048);
        assert_eq!(u32::from_le_bytes(word(&bytes, 6)), 1);
        assert_eq!(f32::from_le_bytes(word(&bytes, 7)), 0.285);
        assert_eq!(f32::from_le_bytes(word(&bytes, 8)), 0.01);
        assert_eq!(u32::from_le_bytes(word(&bytes, 10)), 1);
        assert_eq!(u32::from_le_bytes(word(&bytes, 11)), 4);
        assert_eq!(f32::from_le_bytes(word(&bytes, 12)), 0.25);
        assert_eq!(f32::from_le_bytes(word(&bytes, 13)), -0.5);
        assert_eq!(f32::from_le_bytes(word(&bytes, 14)), 0.75);
        assert_eq!(f32::from_le_bytes(word(&bytes, 15)), 1.5);
    }
}
