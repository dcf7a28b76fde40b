//! Turn a normalized field into an RGB raster.

use image::RgbImage;
use rayon::prelude::*;

use super::colormap::Colormap;
use crate::error::{ReliefError, Result};
use crate::reconstruct::NormalizedField;

/// Colorize a normalized field.
///
/// The output has the field's dimensions with one RGB triple per cell in
/// row-major order; pixel `(x, y)` is cell `[[y, x]]`. Rows are mapped in
/// parallel, which does not affect the pixel values.
pub fn colorize(field: &NormalizedField, colormap: &dyn Colormap) -> Result<RgbImage> {
    let (height, width) = field.dim();
    if width == 0 || height == 0 {
        return Err(ReliefError::ImageGeneration {
            message: format!("cannot colorize an empty {}x{} field", width, height),
        });
    }

    let mut buffer = vec![0u8; width * height * 3];
    buffer
        .par_chunks_mut(width * 3)
        .enumerate()
        .for_each(|(row, out)| {
            for (pixel, &value) in out.chunks_exact_mut(3).zip(field.row(row).iter()) {
                pixel.copy_from_slice(&colormap.map_normalized(value));
            }
        });

    RgbImage::from_raw(width as u32, height as u32, buffer).ok_or_else(|| {
        ReliefError::ImageGeneration {
            message: "pixel buffer does not match raster dimensions".to_string(),
        }
    })
}
