//! Assertion utilities for testing.
//!
//! This module provides helper functions for making assertions in tests,
//! particularly for floating-point and pixel comparisons.

#![allow(dead_code)]

/// Default epsilon for floating-point comparisons
pub const DEFAULT_EPSILON: f64 = 1e-9;

/// Assert that two floating-point values are approximately equal.
///
/// # Panics
///
/// Panics if the absolute difference between `actual` and `expected` is greater than `epsilon`.
pub fn assert_approx_eq(actual: f64, expected: f64, epsilon: Option<f64>) {
    let epsilon = epsilon.unwrap_or(DEFAULT_EPSILON);
    let diff = (actual - expected).abs();

    assert!(
        diff <= epsilon,
        "Values not approximately equal: actual = {}, expected = {}, diff = {}, epsilon = {}",
        actual,
        expected,
        diff,
        epsilon
    );
}

/// Assert that every channel of a pixel is within `tolerance` of the expected color
pub fn assert_pixel_near(actual: [u8; 3], expected: [u8; 3], tolerance: u8) {
    for channel in 0..3 {
        let diff = (actual[channel] as i16 - expected[channel] as i16).unsigned_abs();
        assert!(
            diff <= tolerance as u16,
            "Pixel channel {} differs: actual = {:?}, expected = {:?}, tolerance = {}",
            channel,
            actual,
            expected,
            tolerance
        );
    }
}
