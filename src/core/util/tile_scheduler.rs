use std::num::NonZeroU32;

use crate::core::data::tile::Tile;

pub const DEFAULT_TILE_SIZE: NonZeroU32 = NonZeroU32::new(64).unwrap();

/// Splits a surface into square tiles and orders them centre-first.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TileScheduler {
    tile_size: NonZeroU32,
}

impl Default for TileScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_TILE_SIZE)
    }
}

impl TileScheduler {
    #[must_use]
    pub const fn new(tile_size: NonZeroU32) -> Self {
        Self { tile_size }
    }

    #[must_use]
    pub const fn tile_size(&self) -> u32 {
        self.tile_size.get()
    }

    /// Row-major partition of a `width` x `height` surface. Edge tiles are
    /// clipped to the surface; an empty surface yields no tiles.
    #[must_use]
    pub fn partition(&self, width: u32, height: u32) -> Vec<Tile> {
        let size = self.tile_size.get();
        let columns = width.div_ceil(size) as usize;
        let rows = height.div_ceil(size) as usize;
        let mut tiles = Vec::with_capacity(columns * rows);

        for y in (0..height).step_by(size as usize) {
            for x in (0..width).step_by(size as usize) {
                tiles.push(Tile::new(
                    x,
                    y,
                    size.min(width - x),
                    size.min(height - y),
                ));
            }
        }

        tiles
    }

    /// Stable sort by distance from each tile's centre to the surface centre.
    /// Equidistant tiles keep their row-major order.
    pub fn prioritize(tiles: &mut [Tile], width: u32, height: u32) {
        let cx = f64::from(width) / 2.0;
        let cy = f64::from(height) / 2.0;
        let distance = |tile: &Tile| {
            let (tx, ty) = tile.center();
            (tx - cx).hypot(ty - cy)
        };

        tiles.sort_by(|a, b| distance(a).total_cmp(&distance(b)));
    }

    /// Partition then prioritize: the submission order for one pass.
    #[must_use]
    pub fn schedule(&self, width: u32, height: u32) -> Vec<Tile> {
        let mut tiles = self.partition(width, height);
        Self::prioritize(&mut tiles, width, height);
        tiles
    }
}
