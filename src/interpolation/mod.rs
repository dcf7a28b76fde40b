//! Gap filling for partially populated accumulation grids.
//!
//! A gap filler turns the sparse cell means of an [`AccumulationGrid`] into a
//! fully populated [`ElevationField`].

pub mod common;
pub mod nearest;

use crate::cancel::CancellationToken;
use crate::error::{ReliefError, Result};
use crate::reconstruct::{AccumulationGrid, ElevationField};

pub use nearest::{NearestFiller, DEFAULT_BATCH_SIZE};

/// Trait for gap filling methods
pub trait GapFiller: Send + Sync {
    /// Produce a field where every cell holds a defined elevation
    fn fill(&self, grid: &AccumulationGrid, cancel: &CancellationToken)
        -> Result<ElevationField>;

    /// Get the name of this gap filling method
    fn name(&self) -> &str;
}

/// Get a gap filler by name
pub fn get_gap_filler(name: &str, batch_size: usize) -> Result<Box<dyn GapFiller>> {
    match name.to_lowercase().as_str() {
        "nearest" => Ok(Box::new(NearestFiller::new(batch_size)?)),
        _ => Err(ReliefError::InvalidParameter {
            param: "fill_method".to_string(),
            message: format!("Unknown gap filling method: {}", name),
        }),
    }
}
