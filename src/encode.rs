use std::io::Write;

use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder, ImageError, RgbaImage};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("PNG encoding failed: {0}")]
    Png(#[from] ImageError),
}

/// Encodes `canvas` as PNG into memory.
pub fn encode_png(canvas: &RgbaImage) -> Result<Vec<u8>, EncodeError> {
    let mut buf = Vec::new();
    PngEncoder::new(&mut buf).write_image(
        canvas.as_raw(),
        canvas.width(),
        canvas.height(),
        ColorType::Rgba8,
    )?;
    Ok(buf)
}

/// Encodes `canvas` and writes it to `sink` in one piece, then flushes.
///
/// Encoding finishes before the first byte is written, so an encoding
/// failure never leaves a truncated image behind.
pub fn write_png<W: Write>(canvas: &RgbaImage, sink: &mut W) -> Result<(), crate::RenderError> {
    let bytes = encode_png(canvas)?;
    sink.write_all(&bytes)?;
    sink.flush()?;
    Ok(())
}
