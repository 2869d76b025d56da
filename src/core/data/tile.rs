use crate::core::data::generation::Generation;
use crate::core::data::pixel_buffer::PixelBuffer;

/// Rectangular piece of a render surface, in surface pixels.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Tile {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Tile {
    #[must_use]
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    #[must_use]
    pub fn center(&self) -> (f64, f64) {
        (
            f64::from(self.x) + f64::from(self.width) / 2.0,
            f64::from(self.y) + f64::from(self.height) / 2.0,
        )
    }

    #[must_use]
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    #[must_use]
    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x && y >= self.y && x < self.x + self.width && y < self.y + self.height
    }
}

/// Pixels computed for one tile, stamped with the generation that asked for
/// them. Owned by whoever receives it; the pool keeps no reference.
#[derive(Debug, Clone, PartialEq)]
pub struct TileResult {
    pub tile: Tile,
    pub pixels: PixelBuffer,
    pub generation: Generation,
}
