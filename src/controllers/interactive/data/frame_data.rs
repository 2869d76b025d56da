use std::time::Duration;

use crate::core::data::generation::Generation;
use crate::core::data::pixel_buffer::PixelBuffer;
use crate::core::data::render_pass::PassKind;
use crate::core::data::tile::Tile;

/// One finished tile of a CPU pass.
///
/// `tile` is in pass-surface pixels. A partial frame was computed below full
/// resolution and should be upsampled with nearest-neighbour sampling.
#[derive(Debug, Clone, PartialEq)]
pub struct TileFrame {
    pub generation: Generation,
    pub pass: PassKind,
    pub tile: Tile,
    pub pixels: PixelBuffer,
    pub is_partial: bool,
    pub resolution_scale: f64,
    pub surface_width: u32,
    pub surface_height: u32,
}

/// A whole pass surface from one GPU dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct FullFrame {
    pub generation: Generation,
    pub pass: PassKind,
    pub pixels: PixelBuffer,
    pub is_partial: bool,
    pub resolution_scale: f64,
    pub render_duration: Duration,
}
