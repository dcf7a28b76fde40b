//! Grid rasterizer: bins scattered samples into sum/count accumulation grids.
//!
//! Each sample maps to one cell through [`Region::cell_of`]; samples that
//! land outside the grid are dropped without error. Samples sharing a cell are
//! summed and the cell value is their mean.

use ndarray::{Array2, Zip};
use rayon::prelude::*;
use tracing::debug;

use super::Sample;
use crate::cancel::CancellationToken;
use crate::error::Result;
use crate::region::{GridShape, Region};

/// Number of samples binned between cancellation checks
pub const CANCEL_CHECK_INTERVAL: usize = 1 << 16;

/// Upper bound on partial grids held at once by the parallel rasterizer
const MAX_PARTIAL_GRIDS: usize = 8;

/// Smallest chunk handed to a parallel worker
const MIN_PARALLEL_CHUNK: usize = 1 << 14;

/// Parallel sum/count arrays indexed `[[row, col]]`
#[derive(Debug, Clone, PartialEq)]
pub struct AccumulationGrid {
    /// Sum of sample elevations per cell; meaningful only where `count > 0`
    pub sum: Array2<f64>,
    /// Number of samples binned into each cell
    pub count: Array2<u32>,
}

impl AccumulationGrid {
    /// Create an empty grid with the given dimensions
    pub fn new(shape: GridShape) -> Self {
        Self {
            sum: Array2::zeros(shape.dim()),
            count: Array2::zeros(shape.dim()),
        }
    }

    pub fn shape(&self) -> GridShape {
        GridShape {
            width: self.sum.ncols(),
            height: self.sum.nrows(),
        }
    }

    /// Add one elevation reading to a cell
    pub fn add(&mut self, row: usize, col: usize, elevation: f64) {
        self.sum[[row, col]] += elevation;
        self.count[[row, col]] += 1;
    }

    /// Fold another grid of the same shape into this one, cell by cell
    pub fn merge(&mut self, other: &AccumulationGrid) {
        Zip::from(&mut self.sum)
            .and(&other.sum)
            .for_each(|a, &b| *a += b);
        Zip::from(&mut self.count)
            .and(&other.count)
            .for_each(|a, &b| *a += b);
    }

    /// Mean elevation of a cell, or `None` when no sample landed there
    pub fn mean(&self, row: usize, col: usize) -> Option<f64> {
        match self.count[[row, col]] {
            0 => None,
            n => Some(self.sum[[row, col]] / n as f64),
        }
    }

    /// Number of cells holding at least one sample
    pub fn populated_cells(&self) -> usize {
        self.count.iter().filter(|&&c| c > 0).count()
    }
}

/// Accumulation grid plus binning statistics
#[derive(Debug, Clone, PartialEq)]
pub struct Rasterized {
    pub grid: AccumulationGrid,
    /// Samples binned into a cell
    pub accepted: usize,
    /// Samples dropped as out of region or non-finite
    pub discarded: usize,
}

impl Rasterized {
    fn empty(shape: GridShape) -> Self {
        Self {
            grid: AccumulationGrid::new(shape),
            accepted: 0,
            discarded: 0,
        }
    }

    fn merge(&mut self, other: &Rasterized) {
        self.grid.merge(&other.grid);
        self.accepted += other.accepted;
        self.discarded += other.discarded;
    }

    fn bin(
        &mut self,
        samples: &[Sample],
        region: &Region,
        shape: GridShape,
        cancel: &CancellationToken,
    ) -> Result<()> {
        for (i, sample) in samples.iter().enumerate() {
            if i % CANCEL_CHECK_INTERVAL == 0 {
                cancel.check()?;
            }
            if !sample.elevation.is_finite() {
                self.discarded += 1;
                continue;
            }
            match region.cell_of(sample.latitude, sample.longitude, shape) {
                Some((row, col)) => {
                    self.grid.add(row, col, sample.elevation);
                    self.accepted += 1;
                }
                None => self.discarded += 1,
            }
        }
        Ok(())
    }
}

/// Bin samples into a fresh accumulation grid on the calling thread
pub fn rasterize(
    samples: &[Sample],
    region: &Region,
    shape: GridShape,
    cancel: &CancellationToken,
) -> Result<Rasterized> {
    region.validate()?;
    let mut out = Rasterized::empty(shape);
    out.bin(samples, region, shape, cancel)?;

    debug!(
        accepted = out.accepted,
        discarded = out.discarded,
        populated = out.grid.populated_cells(),
        "Rasterized samples"
    );
    Ok(out)
}

/// Bin samples using per-worker partial grids.
///
/// Samples are split into at most `MAX_PARTIAL_GRIDS` chunks whose size
/// depends only on the input length. Each chunk fills its own grid and the
/// partial grids are merged in chunk order, so the result does not depend on
/// the thread pool.
pub fn rasterize_parallel(
    samples: &[Sample],
    region: &Region,
    shape: GridShape,
    cancel: &CancellationToken,
) -> Result<Rasterized> {
    region.validate()?;
    let chunk_len = samples
        .len()
        .div_ceil(MAX_PARTIAL_GRIDS)
        .max(MIN_PARALLEL_CHUNK);

    if samples.len() <= chunk_len {
        return rasterize(samples, region, shape, cancel);
    }

    let partials = samples
        .par_chunks(chunk_len)
        .map(|chunk| {
            let mut partial = Rasterized::empty(shape);
            partial.bin(chunk, region, shape, cancel)?;
            Ok(partial)
        })
        .collect::<Result<Vec<_>>>()?;

    let mut out = Rasterized::empty(shape);
    for partial in &partials {
        out.merge(partial);
    }

    debug!(
        chunks = partials.len(),
        accepted = out.accepted,
        discarded = out.discarded,
        populated = out.grid.populated_cells(),
        "Rasterized samples in parallel"
    );
    Ok(out)
}
