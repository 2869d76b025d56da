use rayon::prelude::*;

use crate::core::data::pixel_buffer::{BYTES_PER_PIXEL, PixelBuffer};
use crate::core::data::render_params::RenderParameters;
use crate::core::data::viewport::Viewport;
use crate::core::fractals::kernel::evaluate;

/// Renders the whole viewport in one go using rayon's work-stealing scheduler.
///
/// This is the single-dispatch counterpart to tiled rendering. It backs the
/// software compute device and one-shot exports. Rows are processed in
/// parallel.
#[must_use]
pub fn render_surface_parallel(viewport: &Viewport, params: &RenderParameters) -> PixelBuffer {
    let width = viewport.width();
    let height = viewport.height();
    let row_bytes = width as usize * BYTES_PER_PIXEL;
    let mut pixels = PixelBuffer::new(width, height);

    pixels
        .buffer_mut()
        .par_chunks_mut(row_bytes)
        .enumerate()
        .for_each(|(y, row)| {
            for (x, px) in row.chunks_exact_mut(BYTES_PER_PIXEL).enumerate() {
                px.copy_from_slice(&evaluate(x as u32, y as u32, viewport, params).to_bytes());
            }
        });

    pixels
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::actions::render_tile::render_tile;
    use crate::core::data::render_params::{FractalType, OrbitTrap, PaletteId};
    use crate::core::data::tile::Tile;
    use crate::core::data::complex::Complex;

    #[test]
    fn test_parallel_surface_matches_single_tile() {
        let viewport = Viewport::julia_default(37, 23).unwrap();
        let params = RenderParameters::new(
            120,
            FractalType::Julia {
                c: Complex::new(-0.7, 0.27015),
            },
        )
        .unwrap()
        .with_palette(PaletteId::Fire)
        .with_orbit_trap(Some(OrbitTrap::default()))
        .unwrap();

        let surface = render_surface_parallel(&viewport, &params);
        let tile = render_tile(Tile::new(0, 0, 37, 23), &viewport, &params).unwrap();

        assert_eq!(surface, tile);
    }
}
