//! Test data generation utilities.
//!
//! This module writes elevation tiles with known point patterns for the
//! integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use relief::ingest::write_tile;
use relief::Sample;

/// The three-sample scenario over a 10x10 degree region
pub fn scenario_samples() -> Vec<Sample> {
    vec![
        Sample::new(0.0, 0.0, 100.0),
        Sample::new(10.0, 10.0, 200.0),
        Sample::new(5.0, 5.0, 100.0),
    ]
}

/// A sparse, deterministic cone: elevation rises toward the region center.
///
/// Points are laid on a `steps x steps` lattice over `[0, 10]` on both axes,
/// with every third lattice point skipped to leave gaps.
pub fn cone_samples(steps: usize) -> Vec<Sample> {
    let mut samples = Vec::new();
    for i in 0..steps {
        for j in 0..steps {
            if (i * steps + j) % 3 == 0 {
                continue;
            }
            let lat = 10.0 * i as f64 / (steps - 1) as f64;
            let lon = 10.0 * j as f64 / (steps - 1) as f64;
            let distance = ((lat - 5.0).powi(2) + (lon - 5.0).powi(2)).sqrt();
            samples.push(Sample::new(lat, lon, 3000.0 - 200.0 * distance));
        }
    }
    samples
}

/// Write samples to `dir/name` as a JSON tile and return the path
pub fn write_fixture_tile(dir: &Path, name: &str, samples: &[Sample]) -> PathBuf {
    let path = dir.join(name);
    write_tile(samples, &path).expect("failed to write fixture tile");
    path
}
