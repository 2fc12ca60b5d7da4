//! Encoding captured frames.

use image::{ImageBuffer, Rgba};

use turntable_core::FrameBuffer;

/// Encodes an RGBA8 frame as PNG in memory.
///
/// Rows are expected top row first, as read back from wgpu, so no vertical
/// flip is applied.
pub fn encode_png(frame: &FrameBuffer) -> Result<Vec<u8>, ScreenshotError> {
    let img: ImageBuffer<Rgba<u8>, &[u8]> =
        ImageBuffer::from_raw(frame.width, frame.height, frame.pixels.as_slice())
            .ok_or(ScreenshotError::InvalidImageData)?;

    let mut buffer = std::io::Cursor::new(Vec::new());
    img.write_to(&mut buffer, image::ImageFormat::Png)?;

    Ok(buffer.into_inner())
}

/// Error type for frame encoding.
#[derive(Debug, thiserror::Error)]
pub enum ScreenshotError {
    #[error("Image encoding error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("Invalid image data")]
    InvalidImageData,
}
