//! Nearest-neighbor gap filling.
//!
//! Every cell without samples takes the value of the closest populated cell,
//! found through an R-tree over the populated cells. Empty cells are visited
//! in row-major batches so the per-query scratch space stays bounded no
//! matter how sparse the grid is.
//!
//! When two populated cells are equally close, which one wins is decided by
//! the R-tree traversal and is implementation-defined.

use rayon::prelude::*;
use rstar::RTree;
use tracing::debug;

use super::common::{cell_means, cell_point, GridCell};
use super::GapFiller;
use crate::cancel::CancellationToken;
use crate::error::{ReliefError, Result};
use crate::reconstruct::{AccumulationGrid, ElevationField};

/// Default number of empty cells resolved per batch
pub const DEFAULT_BATCH_SIZE: usize = 65_536;

/// Nearest neighbor gap filler
#[derive(Debug, Clone)]
pub struct NearestFiller {
    batch_size: usize,
}

impl NearestFiller {
    pub fn new(batch_size: usize) -> Result<Self> {
        if batch_size == 0 {
            return Err(ReliefError::InvalidParameter {
                param: "batch_size".to_string(),
                message: "batch size must be at least 1".to_string(),
            });
        }
        Ok(Self { batch_size })
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    fn fill_batch(
        &self,
        tree: &RTree<GridCell>,
        batch: &[(usize, usize)],
        values: &mut ndarray::Array2<f64>,
        cancel: &CancellationToken,
    ) -> Result<()> {
        cancel.check()?;

        let nearest: Vec<Option<f64>> = batch
            .par_iter()
            .map(|&(row, col)| {
                tree.nearest_neighbor(&cell_point(row, col))
                    .map(|cell| cell.value)
            })
            .collect();

        for (&(row, col), value) in batch.iter().zip(nearest) {
            values[[row, col]] = value.ok_or_else(|| ReliefError::EmptyInput {
                message: "spatial index returned no neighbor".to_string(),
            })?;
        }
        Ok(())
    }
}

impl Default for NearestFiller {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl GapFiller for NearestFiller {
    fn fill(
        &self,
        grid: &AccumulationGrid,
        cancel: &CancellationToken,
    ) -> Result<ElevationField> {
        let (mut values, populated) = cell_means(grid);
        if populated.is_empty() {
            return Err(ReliefError::EmptyInput {
                message: "no grid cell received a sample".to_string(),
            });
        }

        let empty_total = values.len() - populated.len();
        if empty_total == 0 {
            return Ok(ElevationField {
                values,
                filled_cells: 0,
            });
        }

        let populated_total = populated.len();
        let tree = RTree::bulk_load(populated);

        let mut batch = Vec::with_capacity(self.batch_size.min(empty_total));
        let mut batches = 0usize;
        for ((row, col), &count) in grid.count.indexed_iter() {
            if count > 0 {
                continue;
            }
            batch.push((row, col));
            if batch.len() == self.batch_size {
                self.fill_batch(&tree, &batch, &mut values, cancel)?;
                batch.clear();
                batches += 1;
            }
        }
        if !batch.is_empty() {
            self.fill_batch(&tree, &batch, &mut values, cancel)?;
            batches += 1;
        }

        debug!(
            populated = populated_total,
            filled = empty_total,
            batches = batches,
            batch_size = self.batch_size,
            "Filled empty cells"
        );

        Ok(ElevationField {
            values,
            filled_cells: empty_total,
        })
    }

    fn name(&self) -> &str {
        "nearest"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpolation::common::squared_distance;
    use crate::region::GridShape;

    fn grid_with(shape: (usize, usize), cells: &[(usize, usize, f64)]) -> AccumulationGrid {
        let mut grid = AccumulationGrid::new(GridShape::new(shape.0, shape.1).unwrap());
        for &(row, col, value) in cells {
            grid.add(row, col, value);
        }
        grid
    }

    #[test]
    fn test_fill_is_total() {
        let grid = grid_with((8, 6), &[(0, 0, 1.0), (5, 7, 9.0)]);
        let field = NearestFiller::new(4)
            .unwrap()
            .fill(&grid, &CancellationToken::new())
            .unwrap();

        assert_eq!(field.filled_cells, 46);
        assert!(field.values.iter().all(|v| v.is_finite()));
        assert_eq!(field.values[[0, 1]], 1.0);
        assert_eq!(field.values[[5, 6]], 9.0);
    }

    #[test]
    fn test_filled_value_comes_from_a_nearest_cell() {
        let cells = [(0, 0, 1.0), (0, 9, 2.0), (9, 0, 3.0), (4, 4, 4.0), (9, 9, 5.0)];
        let grid = grid_with((10, 10), &cells);
        let field = NearestFiller::default()
            .fill(&grid, &CancellationToken::new())
            .unwrap();

        for ((row, col), &value) in field.values.indexed_iter() {
            let here = cell_point(row, col);
            let best = cells
                .iter()
                .map(|&(r, c, _)| squared_distance(here, cell_point(r, c)))
                .fold(f64::INFINITY, f64::min);
            // Any populated cell at the minimum distance is an acceptable source
            let ok = cells.iter().any(|&(r, c, v)| {
                squared_distance(here, cell_point(r, c)) == best && v == value
            });
            assert!(ok, "cell ({}, {}) got {} which is not a nearest value", row, col, value);
        }
    }

    #[test]
    fn test_batch_size_does_not_change_result() {
        let cells = [(1, 2, 10.0), (6, 3, 20.0), (3, 11, 30.0), (7, 12, 40.0)];
        let grid = grid_with((13, 8), &cells);
        let token = CancellationToken::new();

        let reference = NearestFiller::new(1).unwrap().fill(&grid, &token).unwrap();
        for batch_size in [2, 7, 64, 10_000] {
            let field = NearestFiller::new(batch_size)
                .unwrap()
                .fill(&grid, &token)
                .unwrap();
            assert_eq!(field.values, reference.values, "batch size {}", batch_size);
        }
    }

    #[test]
    fn test_full_grid_is_noop() {
        let grid = grid_with((2, 1), &[(0, 0, 3.0), (0, 1, 4.0)]);
        let field = NearestFiller::default()
            .fill(&grid, &CancellationToken::new())
            .unwrap();
        assert_eq!(field.filled_cells, 0);
        assert_eq!(field.values[[0, 1]], 4.0);
    }

    #[test]
    fn test_empty_grid_is_rejected() {
        let grid = grid_with((3, 3), &[]);
        let result = NearestFiller::default().fill(&grid, &CancellationToken::new());
        assert!(matches!(result, Err(ReliefError::EmptyInput { .. })));
    }

    #[test]
    fn test_zero_batch_size_is_rejected() {
        assert!(NearestFiller::new(0).is_err());
    }

    #[test]
    fn test_cancelled_fill() {
        let grid = grid_with((4, 4), &[(0, 0, 1.0)]);
        let token = CancellationToken::new();
        token.cancel();
        let result = NearestFiller::default().fill(&grid, &token);
        assert!(matches!(result, Err(ReliefError::Cancelled)));
    }
}
