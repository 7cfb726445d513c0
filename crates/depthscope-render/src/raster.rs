//! Raster encoding of depth values.

use image::{ImageBuffer, RgbaImage};

use crate::error::{RenderError, RenderResult};

/// Scales a value in [0, 1] back to a byte, rounding to nearest.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn value_to_byte(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Builds a grayscale image with R=G=B from row-major values, alpha 255.
///
/// Row 0 of `values` becomes the top row of the image.
pub fn grayscale_raster(values: &[f32], width: u32, height: u32) -> RenderResult<RgbaImage> {
    if values.len() != width as usize * height as usize {
        return Err(RenderError::InvalidImageData);
    }
    let data: Vec<u8> = values
        .iter()
        .flat_map(|&v| {
            let g = value_to_byte(v);
            [g, g, g, 255]
        })
        .collect();
    ImageBuffer::from_raw(width, height, data).ok_or(RenderError::InvalidImageData)
}

/// Encodes an image as PNG in memory.
pub fn encode_png(image: &RgbaImage) -> RenderResult<Vec<u8>> {
    let mut buffer = std::io::Cursor::new(Vec::new());
    image.write_to(&mut buffer, image::ImageFormat::Png)?;
    Ok(buffer.into_inner())
}
