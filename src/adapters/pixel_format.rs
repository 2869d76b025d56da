//! Pixel format conversion for output adapters.

/// Drops the alpha channel of RGBA pixels. `dst` must hold three bytes for
/// every four in `src`; any trailing partial pixel is ignored.
///
/// # Panics
/// Panics if `dst` does not have room for exactly `src.len() / 4` pixels.
pub fn copy_rgba_to_rgb(src: &[u8], dst: &mut [u8]) {
    let expected_dst_len = (src.len() / 4) * 3;
    assert_eq!(
        dst.len(),
        expected_dst_len,
        "dst length {} does not match expected {}",
        dst.len(),
        expected_dst_len
    );

    for (src_pixel, dst_pixel) in src.chunks_exact(4).zip(dst.chunks_exact_mut(3)) {
        dst_pixel.copy_from_slice(&src_pixel[..3]);
    }
}

/// Allocating form of [`copy_rgba_to_rgb`].
#[must_use]
pub fn rgba_to_rgb(src: &[u8]) -> Vec<u8> {
    let mut dst = vec![0; (src.len() / 4) * 3];
    copy_rgba_to_rgb(src, &mut dst);
    dst
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copy_rgba_to_rgb_known_values() {
        let src = vec![
            255, 0, 0, 255, // red
            0, 255, 0, 128, // green, half transparent
            0, 0, 255, 0, // blue, transparent
        ];
        let mut dst = vec![0; 9];

        copy_rgba_to_rgb(&src, &mut dst);

        assert_eq!(dst, vec![255, 0, 0, 0, 255, 0, 0, 0, 255]);
    }

    #[test]
    fn test_rgba_to_rgb_empty_buffer() {
        assert!(rgba_to_rgb(&[]).is_empty());
    }

    #[test]
    fn test_rgba_to_rgb_ignores_trailing_bytes() {
        assert_eq!(rgba_to_rgb(&[1, 2, 3, 4, 5, 6]), vec![1, 2, 3]);
    }

    #[test]
    #[should_panic(expected = "does not match expected")]
    fn test_copy_rgba_to_rgb_rejects_short_destination() {
        let mut dst = vec![0; 2];
        copy_rgba_to_rgb(&[1, 2, 3, 4], &mut dst);
    }
}
