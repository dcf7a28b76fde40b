//! Shared grid-space primitives for gap filling.
//!
//! Distances are measured in grid cells, not degrees; over a small region the
//! cells are close enough to uniform for that to hold.

use ndarray::Array2;
use rstar::{PointDistance, RTreeObject, AABB};

use crate::reconstruct::AccumulationGrid;

/// A populated cell stored in the spatial index
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridCell {
    pub row: usize,
    pub col: usize,
    pub value: f64,
}

impl GridCell {
    pub fn position(&self) -> [f64; 2] {
        cell_point(self.row, self.col)
    }
}

impl RTreeObject for GridCell {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.position())
    }
}

impl PointDistance for GridCell {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        squared_distance(self.position(), *point)
    }
}

/// Grid-space point for a `(row, col)` cell
pub fn cell_point(row: usize, col: usize) -> [f64; 2] {
    [row as f64, col as f64]
}

/// Squared Euclidean distance between two grid-space points
pub fn squared_distance(a: [f64; 2], b: [f64; 2]) -> f64 {
    let dr = a[0] - b[0];
    let dc = a[1] - b[1];
    dr * dr + dc * dc
}

/// Split an accumulation grid into cell means and the populated cell list.
///
/// Empty cells hold NaN in the returned array. The populated list is in
/// row-major order.
pub fn cell_means(grid: &AccumulationGrid) -> (Array2<f64>, Vec<GridCell>) {
    let mut values = Array2::from_elem(grid.count.raw_dim(), f64::NAN);
    let mut populated = Vec::new();

    for ((row, col), &count) in grid.count.indexed_iter() {
        if count > 0 {
            let value = grid.sum[[row, col]] / count as f64;
            values[[row, col]] = value;
            populated.push(GridCell { row, col, value });
        }
    }

    (values, populated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::GridShape;

    #[test]
    fn test_squared_distance() {
        assert_eq!(squared_distance([0.0, 0.0], [3.0, 4.0]), 25.0);
        assert_eq!(squared_distance([2.0, 2.0], [2.0, 2.0]), 0.0);
    }

    #[test]
    fn test_cell_means() {
        let mut grid = AccumulationGrid::new(GridShape::new(3, 2).unwrap());
        grid.add(0, 2, 10.0);
        grid.add(0, 2, 30.0);
        grid.add(1, 0, 5.0);

        let (values, populated) = cell_means(&grid);
        assert_eq!(values[[0, 2]], 20.0);
        assert_eq!(values[[1, 0]], 5.0);
        assert!(values[[0, 0]].is_nan());
        assert_eq!(
            populated,
            vec![
                GridCell {
                    row: 0,
                    col: 2,
                    value: 20.0
                },
                GridCell {
                    row: 1,
                    col: 0,
                    value: 5.0
                },
            ]
        );
    }
}
