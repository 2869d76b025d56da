/// One RGBA pixel with 8 bits per channel.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8 {
    pub const BLACK: Self = Self::opaque(0, 0, 0);
    pub const TRANSPARENT: Self = Self {
        r: 0,
        g: 0,
        b: 0,
        a: 0,
    };

    #[must_use]
    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Converts linear `[0, 1]` channels, clamping and truncating like the
    /// compute shader's `u32(clamp(x, 0, 1) * 255)`.
    #[must_use]
    pub fn from_unit_rgb(rgb: [f64; 3]) -> Self {
        let channel = |v: f64| (v.clamp(0.0, 1.0) * 255.0) as u8;
        Self::opaque(channel(rgb[0]), channel(rgb[1]), channel(rgb[2]))
    }

    #[must_use]
    pub const fn to_bytes(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_unit_rgb_clamps() {
        assert_eq!(
            Rgba8::from_unit_rgb([-1.0, 0.5, 2.0]),
            Rgba8::opaque(0, 127, 255)
        );
    }

    #[test]
    fn test_nan_channel_maps_to_zero() {
        // f64::clamp keeps NaN and `as u8` saturates NaN to 0
        assert_eq!(Rgba8::from_unit_rgb([f64::NAN, 1.0, 1.0]).r, 0);
    }

    #[test]
    fn test_to_bytes_order() {
        assert_eq!(
            Rgba8 { r: 1, g: 2, b: 3, a: 4 }.to_bytes(),
            [1, 2, 3, 4]
        );
    }
}
