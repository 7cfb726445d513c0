//! Conversion of raw RGBA8 readback into depth values.

use depthscope_core::{DepthscopeError, EncodingMode, Result, RowOrder};

/// Turns an RGBA8 readback into `width * height` values in [0, 1].
///
/// The output is row-major with row 0 at the top of the rendered view.
/// Only the red channel is inspected: raw-luma yields `red / 255`,
/// binary-mask yields `1.0` for any nonzero red and `0.0` otherwise.
pub fn normalize_pixels(
    pixels: &[u8],
    width: u32,
    height: u32,
    row_order: RowOrder,
    mode: EncodingMode,
) -> Result<Vec<f32>> {
    let width = width as usize;
    let height = height as usize;
    let expected = width * height * 4;
    if pixels.len() != expected {
        return Err(DepthscopeError::ReadbackSizeMismatch {
            expected,
            actual: pixels.len(),
        });
    }

    let row_bytes = width * 4;
    let mut values = Vec::with_capacity(width * height);
    for out_row in 0..height {
        let src_row = match row_order {
            RowOrder::TopDown => out_row,
            RowOrder::BottomUp => height - 1 - out_row,
        };
        let row = &pixels[src_row * row_bytes..(src_row + 1) * row_bytes];
        values.extend(row.chunks_exact(4).map(|px| channel_value(px[0], mode)));
    }
    Ok(values)
}

fn channel_value(red: u8, mode: EncodingMode) -> f32 {
    match mode {
        EncodingMode::RawLuma => f32::from(red) / 255.0,
        EncodingMode::BinaryMask => {
            if red == 0 {
                0.0
            } else {
                1.0
            }
        }
    }
}
