//! Scattered-to-grid reconstruction.
//!
//! Samples are binned into an [`AccumulationGrid`], empty cells are filled by
//! the [`crate::interpolation`] layer, and the resulting [`ElevationField`] is
//! rescaled into the unit interval before colorizing.

pub mod accumulate;
pub mod normalize;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

pub use accumulate::{rasterize, rasterize_parallel, AccumulationGrid, Rasterized};
pub use normalize::{normalize, ElevationRange, NormalizedField};

/// A single geolocated elevation reading
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub latitude: f64,
    pub longitude: f64,
    pub elevation: f64,
}

impl Sample {
    pub fn new(latitude: f64, longitude: f64, elevation: f64) -> Self {
        Self {
            latitude,
            longitude,
            elevation,
        }
    }
}

impl From<(f64, f64, f64)> for Sample {
    fn from((latitude, longitude, elevation): (f64, f64, f64)) -> Self {
        Self::new(latitude, longitude, elevation)
    }
}

/// Fully populated elevation grid produced by gap filling
#[derive(Debug, Clone)]
pub struct ElevationField {
    /// Elevation per cell, `[[row, col]]` with row 0 at the northern edge
    pub values: Array2<f64>,
    /// Number of cells that had no samples and were filled
    pub filled_cells: usize,
}

impl ElevationField {
    pub fn width(&self) -> usize {
        self.values.ncols()
    }

    pub fn height(&self) -> usize {
        self.values.nrows()
    }
}
