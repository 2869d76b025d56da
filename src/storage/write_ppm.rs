use std::io::Write;
use std::path::Path;

use crate::adapters::pixel_format::rgba_to_rgb;
use crate::core::data::pixel_buffer::PixelBuffer;

/// Binary PPM (P6). Alpha is dropped, so transparent pixels come out black.
pub fn encode_ppm(buffer: &PixelBuffer, mut out: impl Write) -> std::io::Result<()> {
    // P6 means binary RGB, then width height max_colour
    writeln!(out, "P6")?;
    writeln!(out, "{} {}", buffer.width(), buffer.height())?;
    writeln!(out, "255")?;
    out.write_all(&rgba_to_rgb(buffer.buffer()))?;

    Ok(())
}

pub fn write_ppm(buffer: &PixelBuffer, filepath: impl AsRef<Path>) -> std::io::Result<()> {
    let file = std::fs::File::create(filepath)?;
    let mut writer = std::io::BufWriter::new(file);
    encode_ppm(buffer, &mut writer)?;
    writer.flush()
}
