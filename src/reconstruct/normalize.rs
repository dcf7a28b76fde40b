//! Field normalizer.
//!
//! The elevation range comes from the sample set rather than the filled grid,
//! so gap-filled cells can never widen it.

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use super::{ElevationField, Sample};
use crate::error::{ReliefError, Result};

/// Elevation field rescaled into `[0, 1]`
pub type NormalizedField = Array2<f64>;

/// Observed elevation extremes of a sample set
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ElevationRange {
    pub min: f64,
    pub max: f64,
}

impl ElevationRange {
    /// Compute the range over all finite sample elevations.
    ///
    /// Fails with `EmptyInput` when there is nothing to measure and with
    /// `DegenerateRange` when every sample has the same elevation.
    pub fn from_samples(samples: &[Sample]) -> Result<Self> {
        let (min, max) = samples
            .iter()
            .map(|s| s.elevation)
            .filter(|e| e.is_finite())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), e| {
                (lo.min(e), hi.max(e))
            });

        if min > max {
            return Err(ReliefError::EmptyInput {
                message: "no finite sample elevations".to_string(),
            });
        }
        Self::new(min, max)
    }

    /// Create a range, rejecting `max <= min`
    pub fn new(min: f64, max: f64) -> Result<Self> {
        if max == min {
            return Err(ReliefError::DegenerateRange { elevation: min });
        }
        if max < min || !min.is_finite() || !max.is_finite() {
            return Err(ReliefError::InvalidParameter {
                param: "elevation_range".to_string(),
                message: format!("invalid range [{}, {}]", min, max),
            });
        }
        Ok(Self { min, max })
    }

    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    /// Rescale one elevation into the unit interval, clamping stragglers
    pub fn normalize_value(&self, value: f64) -> f64 {
        ((value - self.min) / self.span()).clamp(0.0, 1.0)
    }
}

/// Rescale a filled elevation field into `[0, 1]`
pub fn normalize(field: &ElevationField, range: &ElevationRange) -> NormalizedField {
    field.values.mapv(|v| range.normalize_value(v))
}
