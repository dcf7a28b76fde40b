//! Colormap trait and utilities.
//!
//! This module defines the common interface for all colormaps and the policy
//! enum used to pick one from configuration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{ReliefError, Result};

/// Trait for color mapping implementations
pub trait Colormap: Send + Sync {
    /// Map a normalized value (0.0 to 1.0) to an RGB color.
    ///
    /// Values outside the unit interval are clamped and NaN maps like 0.0.
    fn map_normalized(&self, value: f64) -> [u8; 3];

    /// Get the name of this colormap
    fn name(&self) -> &str;
}

/// Selectable colormap policies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColormapPolicy {
    /// Blue to yellow two-hue ramp
    #[default]
    Linear,
    /// Red through violet seven-stop ramp
    Rainbow,
}

impl ColormapPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColormapPolicy::Linear => "linear",
            ColormapPolicy::Rainbow => "rainbow",
        }
    }

    /// Instantiate the colormap for this policy
    pub fn colormap(&self) -> Box<dyn Colormap> {
        use super::{linear::LinearRamp, rainbow::Rainbow};

        match self {
            ColormapPolicy::Linear => Box::new(LinearRamp),
            ColormapPolicy::Rainbow => Box::new(Rainbow),
        }
    }
}

impl fmt::Display for ColormapPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColormapPolicy {
    type Err = ReliefError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "linear" | "blue-yellow" => Ok(ColormapPolicy::Linear),
            "rainbow" | "roygbiv" => Ok(ColormapPolicy::Rainbow),
            _ => Err(ReliefError::InvalidParameter {
                param: "colormap".to_string(),
                message: format!("Unknown colormap: {}", s),
            }),
        }
    }
}

/// Get a colormap by name
pub fn get_colormap(name: &str) -> Result<Box<dyn Colormap>> {
    Ok(name.parse::<ColormapPolicy>()?.colormap())
}

/// Clamp a value into `[0, 1]`, sending NaN to 0
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Linear interpolation between two colors
pub fn lerp_color(c1: [u8; 3], c2: [u8; 3], t: f64) -> [u8; 3] {
    let mix = |a: u8, b: u8| (a as f64 * (1.0 - t) + b as f64 * t).round() as u8;
    [mix(c1[0], c2[0]), mix(c1[1], c2[1]), mix(c1[2], c2[2])]
}
