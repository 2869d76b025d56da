use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::{trace, warn};

use crate::controllers::interactive::data::frame_data::{FullFrame, TileFrame};
use crate::controllers::interactive::errors::renderer::RendererError;
use crate::controllers::interactive::ports::presentation_sink::PresentationSink;
use crate::core::data::generation::Generation;
use crate::core::data::pixel_buffer::{BYTES_PER_PIXEL, PixelBuffer};
use crate::core::data::render_pass::PassKind;
use crate::core::data::tile::Tile;

struct Canvas {
    pixels: PixelBuffer,
    generation: Generation,
    completed_passes: Vec<PassKind>,
    last_render_duration: Option<Duration>,
    last_error_message: Option<String>,
}

impl Canvas {
    fn reset(&mut self, generation: Generation) {
        self.pixels.clear();
        self.generation = generation;
        self.completed_passes.clear();
        self.last_render_duration = None;
        self.last_error_message = None;
    }

    /// Frames older than the last clear are dropped; a newer one implies
    /// the clear was missed.
    fn accept(&mut self, generation: Generation) -> bool {
        if generation < self.generation {
            trace!(%generation, current = %self.generation, "dropping frame from old generation");
            return false;
        }
        if generation > self.generation {
            self.reset(generation);
        }
        true
    }
}

/// Full-resolution RGBA canvas that composes progressive passes.
///
/// Partial passes are upsampled with nearest-neighbour sampling, so each
/// coarse pixel covers the block of canvas pixels it was computed for.
pub struct CanvasCompositor {
    canvas: Mutex<Canvas>,
}

impl CanvasCompositor {
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            canvas: Mutex::new(Canvas {
                pixels: PixelBuffer::new(width, height),
                generation: Generation::NONE,
                completed_passes: Vec::new(),
                last_render_duration: None,
                last_error_message: None,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Canvas> {
        self.canvas.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Drops the current contents.
    pub fn resize(&self, width: u32, height: u32) {
        let mut canvas = self.lock();
        canvas.pixels = PixelBuffer::new(width, height);
        let generation = canvas.generation;
        canvas.reset(generation);
    }

    #[must_use]
    pub fn snapshot(&self) -> PixelBuffer {
        self.lock().pixels.clone()
    }

    #[must_use]
    pub fn generation(&self) -> Generation {
        self.lock().generation
    }

    #[must_use]
    pub fn completed_passes(&self) -> Vec<PassKind> {
        self.lock().completed_passes.clone()
    }

    #[must_use]
    pub fn last_render_duration(&self) -> Option<Duration> {
        self.lock().last_render_duration
    }

    #[must_use]
    pub fn last_error_message(&self) -> Option<String> {
        self.lock().last_error_message.clone()
    }
}

impl PresentationSink for CanvasCompositor {
    fn clear(&self, generation: Generation) {
        self.lock().reset(generation);
    }

    fn present(&self, frame: TileFrame) {
        let mut canvas = self.lock();
        if !canvas.accept(frame.generation) {
            return;
        }

        blit(
            &mut canvas.pixels,
            &frame.pixels,
            frame.tile,
            frame.surface_width,
            frame.surface_height,
        );
    }

    fn present_full(&self, frame: FullFrame) {
        let mut canvas = self.lock();
        if !canvas.accept(frame.generation) {
            return;
        }

        let (width, height) = (frame.pixels.width(), frame.pixels.height());
        blit(
            &mut canvas.pixels,
            &frame.pixels,
            Tile::new(0, 0, width, height),
            width,
            height,
        );
        canvas.last_render_duration = Some(frame.render_duration);
    }

    fn pass_completed(&self, generation: Generation, pass: PassKind) {
        let mut canvas = self.lock();
        if canvas.accept(generation) {
            canvas.completed_passes.push(pass);
        }
    }

    fn failed(&self, generation: Generation, error: &RendererError) {
        let mut canvas = self.lock();
        if canvas.accept(generation) {
            warn!(%generation, %error, "render failed, canvas left as is");
            canvas.last_error_message = Some(error.to_string());
        }
    }
}

/// First canvas pixel whose nearest source pixel is at or after `source`.
fn canvas_start(source: u32, canvas_len: u32, surface_len: u32) -> u32 {
    let scaled = u64::from(source) * u64::from(canvas_len);
    scaled.div_ceil(u64::from(surface_len)) as u32
}

/// Copies `src`, which covers `tile` of a `surface_width` x `surface_height`
/// surface, onto the canvas.
fn blit(canvas: &mut PixelBuffer, src: &PixelBuffer, tile: Tile, surface_width: u32, surface_height: u32) {
    if surface_width == 0 || surface_height == 0 || src.width() != tile.width || src.height() != tile.height {
        return;
    }

    let (width, height) = (canvas.width(), canvas.height());
    let x_range = canvas_start(tile.x, width, surface_width)
        ..canvas_start(tile.x + tile.width, width, surface_width).min(width);
    let y_range = canvas_start(tile.y, height, surface_height)
        ..canvas_start(tile.y + tile.height, height, surface_height).min(height);

    let src_bytes = src.buffer();
    let dst_bytes = canvas.buffer_mut();

    for cy in y_range {
        let sy = (u64::from(cy) * u64::from(surface_height) / u64::from(height)) as u32 - tile.y;
        for cx in x_range.clone() {
            let sx = (u64::from(cx) * u64::from(surface_width) / u64::from(width)) as u32 - tile.x;

            let from = (sy as usize * tile.width as usize + sx as usize) * BYTES_PER_PIXEL;
            let to = (cy as usize * width as usize + cx as usize) * BYTES_PER_PIXEL;
            dst_bytes[to..to + BYTES_PER_PIXEL].copy_from_slice(&src_bytes[from..from + BYTES_PER_PIXEL]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controllers::interactive::RenderOrchestrator;
    use crate::controllers::interactive::config::RendererConfig;
    use crate::controllers::pool::config::PoolConfig;
    use crate::controllers::pool::errors::PoolError;
    use crate::core::actions::render_surface::render_surface_parallel;
    use crate::core::data::colour::Rgba8;
    use crate::core::data::render_params::{FractalType, JuliaParams, RenderMode, RenderParameters};
    use crate::core::data::viewport::Viewport;
    use std::sync::Arc;

    const RED: Rgba8 = Rgba8::opaque(255, 0, 0);
    const GREEN: Rgba8 = Rgba8::opaque(0, 255, 0);
    const BLUE: Rgba8 = Rgba8::opaque(0, 0, 255);
    const WHITE: Rgba8 = Rgba8::opaque(255, 255, 255);

    fn quad() -> PixelBuffer {
        let mut pixels = PixelBuffer::new(2, 2);
        pixels.set_pixel(0, 0, RED).unwrap();
        pixels.set_pixel(1, 0, GREEN).unwrap();
        pixels.set_pixel(0, 1, BLUE).unwrap();
        pixels.set_pixel(1, 1, WHITE).unwrap();
        pixels
    }

    fn tile_frame(generation: Generation, tile: Tile, pixels: PixelBuffer, surface: (u32, u32)) -> TileFrame {
        TileFrame {
            generation,
            pass: PassKind::Preview,
            tile,
            pixels,
            is_partial: true,
            resolution_scale: 0.25,
            surface_width: surface.0,
            surface_height: surface.1,
        }
    }

    #[test]
    fn test_partial_pass_is_upsampled_nearest_neighbour() {
        let compositor = CanvasCompositor::new(8, 8);
        let g1 = Generation::new(1);
        compositor.clear(g1);

        compositor.present(tile_frame(g1, Tile::new(0, 0, 2, 2), quad(), (2, 2)));

        let canvas = compositor.snapshot();
        assert_eq!(canvas.pixel(0, 0).unwrap(), RED);
        assert_eq!(canvas.pixel(3, 3).unwrap(), RED);
        assert_eq!(canvas.pixel(4, 0).unwrap(), GREEN);
        assert_eq!(canvas.pixel(7, 3).unwrap(), GREEN);
        assert_eq!(canvas.pixel(0, 4).unwrap(), BLUE);
        assert_eq!(canvas.pixel(7, 7).unwrap(), WHITE);
    }

    #[test]
    fn test_tile_lands_at_scaled_offset() {
        let compositor = CanvasCompositor::new(8, 8);
        let g1 = Generation::new(1);
        compositor.clear(g1);

        let mut pixels = PixelBuffer::new(1, 1);
        pixels.set_pixel(0, 0, GREEN).unwrap();
        compositor.present(tile_frame(g1, Tile::new(1, 0, 1, 1), pixels, (2, 2)));

        let canvas = compositor.snapshot();
        assert_eq!(canvas.pixel(3, 0).unwrap(), Rgba8::TRANSPARENT);
        assert_eq!(canvas.pixel(4, 0).unwrap(), GREEN);
        assert_eq!(canvas.pixel(7, 3).unwrap(), GREEN);
        assert_eq!(canvas.pixel(4, 4).unwrap(), Rgba8::TRANSPARENT);
    }

    #[test]
    fn test_uneven_surface_covers_every_canvas_pixel() {
        // 10 * 0.25 rounds up to a 3 pixel surface
        let compositor = CanvasCompositor::new(10, 10);
        let g1 = Generation::new(1);
        compositor.clear(g1);

        let mut pixels = PixelBuffer::new(3, 3);
        for y in 0..3 {
            for x in 0..3 {
                pixels.set_pixel(x, y, WHITE).unwrap();
            }
        }
        compositor.present(tile_frame(g1, Tile::new(0, 0, 3, 3), pixels, (3, 3)));

        let canvas = compositor.snapshot();
        assert!(canvas.buffer().chunks_exact(4).all(|px| px == WHITE.to_bytes().as_slice()));
    }

    #[test]
    fn test_stale_frames_are_dropped_after_clear() {
        let compositor = CanvasCompositor::new(2, 2);
        let (g1, g2) = (Generation::new(1), Generation::new(2));
        compositor.clear(g1);
        compositor.clear(g2);

        compositor.present(tile_frame(g1, Tile::new(0, 0, 2, 2), quad(), (2, 2)));
        compositor.pass_completed(g1, PassKind::Preview);

        assert!(compositor.snapshot().buffer().iter().all(|&b| b == 0));
        assert!(compositor.completed_passes().is_empty());
        assert_eq!(compositor.generation(), g2);
    }

    #[test]
    fn test_clear_resets_canvas() {
        let compositor = CanvasCompositor::new(2, 2);
        compositor.clear(Generation::new(1));
        compositor.present(tile_frame(Generation::new(1), Tile::new(0, 0, 2, 2), quad(), (2, 2)));

        compositor.clear(Generation::new(2));

        assert!(compositor.snapshot().buffer().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_full_frame_replaces_canvas_and_records_duration() {
        let compositor = CanvasCompositor::new(4, 4);
        let g1 = Generation::new(1);
        compositor.clear(g1);

        compositor.present_full(FullFrame {
            generation: g1,
            pass: PassKind::Low,
            pixels: quad(),
            is_partial: true,
            resolution_scale: 0.5,
            render_duration: Duration::from_millis(3),
        });

        let canvas = compositor.snapshot();
        assert_eq!(canvas.pixel(1, 1).unwrap(), RED);
        assert_eq!(canvas.pixel(2, 3).unwrap(), WHITE);
        assert_eq!(compositor.last_render_duration(), Some(Duration::from_millis(3)));
    }

    #[test]
    fn test_failure_is_recorded_for_current_generation() {
        let compositor = CanvasCompositor::new(2, 2);
        compositor.clear(Generation::new(3));

        compositor.failed(Generation::new(3), &RendererError::Pool(PoolError::ShutDown));

        assert_eq!(
            compositor.last_error_message().as_deref(),
            Some("worker pool stopped")
        );
    }

    #[test]
    fn test_progressive_render_ends_at_full_resolution_image() {
        let viewport = Viewport::mandelbrot_default(72, 40).unwrap();
        let params = RenderParameters::new(150, FractalType::Mandelbrot).unwrap();
        let compositor = Arc::new(CanvasCompositor::new(72, 40));
        let config = RendererConfig {
            pool: PoolConfig::default().with_size(3),
            ..RendererConfig::default()
        };
        let renderer = RenderOrchestrator::new(
            config,
            Arc::clone(&compositor) as Arc<dyn PresentationSink>,
            None,
        )
        .unwrap();

        renderer.start_render(viewport, params, RenderMode::Mandelbrot, JuliaParams::default());
        assert!(renderer.wait_idle(Duration::from_secs(10)));

        assert_eq!(compositor.snapshot(), render_surface_parallel(&viewport, &params));
        assert_eq!(
            compositor.completed_passes(),
            vec![PassKind::Preview, PassKind::Low, PassKind::Medium, PassKind::High]
        );
    }
}
