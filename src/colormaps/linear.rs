//! Linear two-hue ramp from blue (low) to yellow (high).

use super::colormap::{clamp_unit, Colormap};

/// Blue to yellow ramp: `R = G = 255 v`, `B = 255 (1 - v)`, truncated
pub struct LinearRamp;

impl Colormap for LinearRamp {
    fn map_normalized(&self, value: f64) -> [u8; 3] {
        let v = clamp_unit(value);
        let rising = (v * 255.0) as u8;
        let falling = (255.0 * (1.0 - v)) as u8;
        [rising, rising, falling]
    }

    fn name(&self) -> &str {
        "linear"
    }
}
