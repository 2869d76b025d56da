use crate::core::data::colour::Rgba8;

pub const BYTES_PER_PIXEL: usize = 4;

fn buffer_size_for(width: u32, height: u32) -> usize {
    width as usize * height as usize * BYTES_PER_PIXEL
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PixelBufferError {
    #[error("pixel at x:{x}, y:{y} outside of {width}x{height} buffer")]
    PixelOutsideBounds {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },
    #[error("{width}x{height} buffer needs {expected} bytes, got {actual}")]
    BoundsMismatch {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
}

pub type PixelBufferData = Vec<u8>;

/// Row-major RGBA8 pixels for a `width` x `height` surface.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    buffer: PixelBufferData,
}

impl PixelBuffer {
    /// Fully transparent buffer; unfilled regions stay transparent.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            buffer: vec![0; buffer_size_for(width, height)],
        }
    }

    pub fn from_data(
        width: u32,
        height: u32,
        buffer: PixelBufferData,
    ) -> Result<Self, PixelBufferError> {
        let expected = buffer_size_for(width, height);

        if expected != buffer.len() {
            return Err(PixelBufferError::BoundsMismatch {
                width,
                height,
                expected,
                actual: buffer.len(),
            });
        }

        Ok(Self {
            width,
            height,
            buffer,
        })
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
    pub fn buffer(&self) -> &PixelBufferData {
        &self.buffer
    }

    pub fn buffer_mut(&mut self) -> &mut [u8] {
        &mut self.buffer
    }

    #[must_use]
    pub fn buffer_size(&self) -> usize {
        self.buffer.len()
    }

    #[must_use]
    pub fn into_data(self) -> PixelBufferData {
        self.buffer
    }

    pub fn clear(&mut self) {
        self.buffer.fill(0);
    }

    fn index_of(&self, x: u32, y: u32) -> Result<usize, PixelBufferError> {
        if x >= self.width || y >= self.height {
            return Err(PixelBufferError::PixelOutsideBounds {
                x,
                y,
                width: self.width,
                height: self.height,
            });
        }

        Ok((y as usize * self.width as usize + x as usize) * BYTES_PER_PIXEL)
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, colour: Rgba8) -> Result<(), PixelBufferError> {
        let index = self.index_of(x, y)?;
        self.buffer[index..index + BYTES_PER_PIXEL].copy_from_slice(&colour.to_bytes());

        Ok(())
    }

    pub fn pixel(&self, x: u32, y: u32) -> Result<Rgba8, PixelBufferError> {
        let index = self.index_of(x, y)?;
        let px = &self.buffer[index..index + BYTES_PER_PIXEL];

        Ok(Rgba8 {
            r: px[0],
            g: px[1],
            b: px[2],
            a: px[3],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_creates_transparent_buffer() {
        let buffer = PixelBuffer::new(10, 10);

        assert_eq!(buffer.buffer_size(), 400); // 10 * 10 * 4
        assert!(buffer.buffer().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_from_data_valid() {
        let data: Vec<u8> = vec![
            255, 0, 0, 255, // pixel (0,0) - red
            0, 255, 0, 255, // pixel (1,0) - green
        ];

        let buffer = PixelBuffer::from_data(2, 1, data.clone()).unwrap();

        assert_eq!(buffer.buffer(), &data);
        assert_eq!(buffer.pixel(1, 0).unwrap(), Rgba8::opaque(0, 255, 0));
    }

    #[test]
    fn test_from_data_buffer_too_small() {
        let result = PixelBuffer::from_data(2, 2, vec![255, 0, 0]);

        assert_eq!(
            result.unwrap_err(),
            PixelBufferError::BoundsMismatch {
                width: 2,
                height: 2,
                expected: 16,
                actual: 3
            }
        );
    }

    #[test]
    fn test_set_pixel_writes_rgba() {
        let mut buffer = PixelBuffer::new(3, 3);
        buffer.set_pixel(1, 1, Rgba8::opaque(255, 0, 0)).unwrap();

        assert_eq!(&buffer.buffer()[16..20], &[255, 0, 0, 255]);
    }

    #[test]
    fn test_set_pixel_outside_bounds() {
        let mut buffer = PixelBuffer::new(3, 3);

        assert_eq!(
            buffer.set_pixel(3, 0, Rgba8::BLACK),
            Err(PixelBufferError::PixelOutsideBounds {
                x: 3,
                y: 0,
                width: 3,
                height: 3
            })
        );
    }

    #[test]
    fn test_clear_resets_to_transparent() {
        let mut buffer = PixelBuffer::new(2, 2);
        buffer.set_pixel(0, 0, Rgba8::opaque(9, 9, 9)).unwrap();
        buffer.clear();

        assert_eq!(buffer.pixel(0, 0).unwrap(), Rgba8::TRANSPARENT);
    }
}
