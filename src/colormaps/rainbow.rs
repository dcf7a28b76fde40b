//! Seven-stop rainbow ramp.
//!
//! The unit interval is split into six equal segments whose endpoints are
//! red, orange, yellow, green, blue, indigo and violet. Channels are linearly
//! interpolated inside each segment, so every channel is continuous across
//! the internal boundaries at `k / 6`.

use super::colormap::{clamp_unit, lerp_color, Colormap};

/// Segment endpoint colors, low to high
pub const RAINBOW_STOPS: [[u8; 3]; 7] = [
    [255, 0, 0],   // Red
    [255, 127, 0], // Orange
    [255, 255, 0], // Yellow
    [0, 255, 0],   // Green
    [0, 0, 255],   // Blue
    [75, 0, 130],  // Indigo
    [148, 0, 211], // Violet
];

const SEGMENTS: usize = RAINBOW_STOPS.len() - 1;

/// Red to violet rainbow ramp
pub struct Rainbow;

impl Rainbow {
    /// Segment index and position inside it for a value
    fn locate(value: f64) -> (usize, f64) {
        let position = clamp_unit(value) * SEGMENTS as f64;
        let index = (position.floor() as usize).min(SEGMENTS - 1);
        (index, position - index as f64)
    }

    /// Unquantized channel values in `[0, 255]`
    pub fn channels(value: f64) -> [f64; 3] {
        let (index, t) = Self::locate(value);
        let (c1, c2) = (RAINBOW_STOPS[index], RAINBOW_STOPS[index + 1]);
        let mix = |a: u8, b: u8| a as f64 * (1.0 - t) + b as f64 * t;
        [mix(c1[0], c2[0]), mix(c1[1], c2[1]), mix(c1[2], c2[2])]
    }
}

impl Colormap for Rainbow {
    fn map_normalized(&self, value: f64) -> [u8; 3] {
        let (index, t) = Self::locate(value);
        lerp_color(RAINBOW_STOPS[index], RAINBOW_STOPS[index + 1], t)
    }

    fn name(&self) -> &str {
        "rainbow"
    }
}
