use crate::core::actions::cancellation::{
    CANCEL_CHECK_INTERVAL_PIXELS, CancelToken, Cancelled, NeverCancel,
};
use crate::core::data::pixel_buffer::{BYTES_PER_PIXEL, PixelBuffer, PixelBufferError};
use crate::core::data::render_params::RenderParameters;
use crate::core::data::tile::Tile;
use crate::core::data::viewport::Viewport;
use crate::core::fractals::kernel::evaluate;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RenderTileError {
    #[error(transparent)]
    Cancelled(#[from] Cancelled),
    #[error("pixel buffer error: {0}")]
    PixelBuffer(#[from] PixelBufferError),
}

/// Computes every pixel of `tile`, sampling `viewport` at surface positions.
pub fn render_tile(
    tile: Tile,
    viewport: &Viewport,
    params: &RenderParameters,
) -> Result<PixelBuffer, PixelBufferError> {
    render_tile_cancelable(tile, viewport, params, &NeverCancel).map_err(|e| match e {
        RenderTileError::PixelBuffer(err) => err,
        RenderTileError::Cancelled(_) => {
            unreachable!("NeverCancel token should never signal cancellation")
        }
    })
}

/// Like [`render_tile`], checking `cancel` at the start of each row and every
/// [`CANCEL_CHECK_INTERVAL_PIXELS`] pixels.
pub fn render_tile_cancelable<C>(
    tile: Tile,
    viewport: &Viewport,
    params: &RenderParameters,
    cancel: &C,
) -> Result<PixelBuffer, RenderTileError>
where
    C: CancelToken + ?Sized,
{
    let mut data = Vec::with_capacity(tile.pixel_count() * BYTES_PER_PIXEL);

    for y in tile.y..tile.y + tile.height {
        for (i, x) in (tile.x..tile.x + tile.width).enumerate() {
            if i % CANCEL_CHECK_INTERVAL_PIXELS == 0 {
                cancel.check()?;
            }

            data.extend_from_slice(&evaluate(x, y, viewport, params).to_bytes());
        }
    }

    Ok(PixelBuffer::from_data(tile.width, tile.height, data)?)
}
