use crate::core::data::complex::Complex;

#[derive(Debug, Copy, Clone, PartialEq, thiserror::Error)]
pub enum ViewportError {
    #[error("viewport scale must be positive and finite, got {scale}")]
    InvalidScale { scale: f64 },
    #[error("viewport centre must be finite, got ({real}, {imag})")]
    InvalidCenter { real: f64, imag: f64 },
    #[error("viewport size must be positive: {width}x{height}")]
    InvalidSize { width: u32, height: u32 },
}

/// The visible region of the complex plane, expressed as a centre, a scale in
/// complex units per pixel, and the pixel size of the surface.
///
/// Viewports are immutable values; the helpers below return new instances.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Viewport {
    center: Complex,
    scale: f64,
    width: u32,
    height: u32,
}

impl Viewport {
    pub fn new(
        center: Complex,
        scale: f64,
        width: u32,
        height: u32,
    ) -> Result<Self, ViewportError> {
        if !(scale.is_finite() && scale > 0.0) {
            return Err(ViewportError::InvalidScale { scale });
        }

        if !center.is_finite() {
            return Err(ViewportError::InvalidCenter {
                real: center.real,
                imag: center.imag,
            });
        }

        if width == 0 || height == 0 {
            return Err(ViewportError::InvalidSize { width, height });
        }

        Ok(Self {
            center,
            scale,
            width,
            height,
        })
    }

    /// Whole Mandelbrot set on screen.
    pub fn mandelbrot_default(width: u32, height: u32) -> Result<Self, ViewportError> {
        Self::new(Complex::new(-0.5, 0.0), 0.004, width, height)
    }

    pub fn julia_default(width: u32, height: u32) -> Result<Self, ViewportError> {
        Self::new(Complex::ZERO, 0.004, width, height)
    }

    #[must_use]
    pub fn center(&self) -> Complex {
        self.center
    }

    #[must_use]
    pub fn scale(&self) -> f64 {
        self.scale
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[must_use]
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Maps a pixel position to its complex coordinate.
    ///
    /// Pixels are addressed by their top-left corner; the surface centre sits at
    /// `(width / 2, height / 2)`. Positions outside the surface are still mapped,
    /// which lets callers sample just past an edge.
    #[must_use]
    pub fn pixel_to_complex(&self, px: f64, py: f64) -> Complex {
        Complex {
            real: (px - f64::from(self.width) / 2.0) * self.scale + self.center.real,
            imag: (py - f64::from(self.height) / 2.0) * self.scale + self.center.imag,
        }
    }

    /// The same region of the plane sampled at `resolution` times the pixel
    /// density. Dimensions round up so no part of the view is lost.
    #[must_use]
    pub fn scaled(&self, resolution: f64) -> Self {
        if !(resolution.is_finite() && resolution > 0.0) || resolution == 1.0 {
            return *self;
        }

        let width = ((f64::from(self.width) * resolution).ceil() as u32).max(1);
        let height = ((f64::from(self.height) * resolution).ceil() as u32).max(1);

        Self {
            center: self.center,
            scale: self.scale / resolution,
            width,
            height,
        }
    }

    /// Zooms by `factor` (below 1 zooms in) while keeping the complex
    /// coordinate under the focus pixel fixed.
    pub fn zoom_at(&self, factor: f64, focus_x: f64, focus_y: f64) -> Result<Self, ViewportError> {
        let before = self.pixel_to_complex(focus_x, focus_y);
        let scale = self.scale * factor;

        let dx = focus_x - f64::from(self.width) / 2.0;
        let dy = focus_y - f64::from(self.height) / 2.0;
        let center = Complex {
            real: before.real - dx * scale,
            imag: before.imag - dy * scale,
        };

        Self::new(center, scale, self.width, self.height)
    }

    /// Drags the view by a pixel delta; content follows the pointer.
    #[must_use]
    pub fn pan(&self, dx: f64, dy: f64) -> Self {
        Self {
            center: Complex {
                real: self.center.real - dx * self.scale,
                imag: self.center.imag - dy * self.scale,
            },
            ..*self
        }
    }

    /// Same view on a surface of a different size.
    pub fn resized(&self, width: u32, height: u32) -> Result<Self, ViewportError> {
        Self::new(self.center, self.scale, width, height)
    }
}
