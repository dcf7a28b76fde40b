//! Image utilities for testing.
//!
//! This module provides helper functions for loading and verifying rendered rasters.

#![allow(dead_code)]

use image::{DynamicImage, GenericImageView, ImageError, ImageFormat};
use std::path::Path;

/// Load an image from a file
pub fn load_image(path: &Path) -> Result<DynamicImage, ImageError> {
    image::open(path)
}

/// Detect the image format of a file from its leading bytes
pub fn detect_image_format(path: &Path) -> Option<ImageFormat> {
    let bytes = std::fs::read(path).ok()?;
    image::guess_format(&bytes).ok()
}

/// Check if an image has the expected dimensions
///
/// # Returns
///
/// * `Ok(())` if the image has the expected dimensions
/// * `Err(String)` with an error message if the dimensions differ
pub fn assert_image_dimensions(
    image: &DynamicImage,
    expected_width: u32,
    expected_height: u32,
) -> Result<(), String> {
    let (actual_width, actual_height) = image.dimensions();

    if actual_width != expected_width || actual_height != expected_height {
        return Err(format!(
            "Image dimensions differ: actual = {}x{}, expected = {}x{}",
            actual_width, actual_height, expected_width, expected_height
        ));
    }

    Ok(())
}

/// Check if a file holds an image of the expected format
pub fn assert_image_format(path: &Path, expected_format: ImageFormat) -> Result<(), String> {
    let actual_format =
        detect_image_format(path).ok_or_else(|| "Could not detect image format".to_string())?;

    if actual_format != expected_format {
        return Err(format!(
            "Image format differs: actual = {:?}, expected = {:?}",
            actual_format, expected_format
        ));
    }

    Ok(())
}
