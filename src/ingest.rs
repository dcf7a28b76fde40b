//! Point ingestion from per-tile elevation stores.
//!
//! A tile is a JSON array of `{ "latitude", "longitude", "elevation" }`
//! records, one per stored point; `elevation` may be `null` for points that
//! were collected without a reading. Several tiles are combined through a
//! [`TileSet`], which tolerates unreadable tiles and resolves duplicate
//! coordinates so the reconstruction core only ever sees one clean point set.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::{ReliefError, Result};
use crate::reconstruct::Sample;
use crate::region::Region;

/// Anything that can produce elevation samples
pub trait PointSource: Send + Sync {
    /// Every sample with a non-null elevation
    fn fetch_all(&self) -> Result<Vec<Sample>>;

    /// Samples inside `region`, edges included
    fn fetch(&self, region: &Region) -> Result<Vec<Sample>> {
        let mut samples = self.fetch_all()?;
        samples.retain(|s| region.contains(s.latitude, s.longitude));
        Ok(samples)
    }

    /// Human-readable name used in logs
    fn name(&self) -> String;
}

/// On-disk record layout of a tile
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PointRecord {
    pub latitude: f64,
    pub longitude: f64,
    pub elevation: Option<f64>,
}

impl PointRecord {
    fn into_sample(self) -> Option<Sample> {
        let elevation = self.elevation.filter(|e| e.is_finite())?;
        Some(Sample::new(self.latitude, self.longitude, elevation))
    }
}

impl From<Sample> for PointRecord {
    fn from(sample: Sample) -> Self {
        Self {
            latitude: sample.latitude,
            longitude: sample.longitude,
            elevation: Some(sample.elevation),
        }
    }
}

/// A single JSON tile file
#[derive(Debug, Clone)]
pub struct JsonTile {
    path: PathBuf,
}

impl JsonTile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PointSource for JsonTile {
    fn fetch_all(&self) -> Result<Vec<Sample>> {
        let file = File::open(&self.path)?;
        let records: Vec<PointRecord> = serde_json::from_reader(BufReader::new(file))?;
        let total = records.len();
        let samples: Vec<Sample> = records
            .into_iter()
            .filter_map(PointRecord::into_sample)
            .collect();

        debug!(
            tile = %self.path.display(),
            records = total,
            samples = samples.len(),
            "Read tile"
        );
        Ok(samples)
    }

    fn name(&self) -> String {
        self.path.display().to_string()
    }
}

/// Several point sources merged into one deduplicated point set.
///
/// A source that fails to read is logged and skipped. When two sources hold
/// the same coordinate, the first source wins and later copies are dropped.
pub struct TileSet {
    sources: Vec<Box<dyn PointSource>>,
}

impl TileSet {
    pub fn new(sources: Vec<Box<dyn PointSource>>) -> Self {
        Self { sources }
    }

    /// Build a tile set from files and directories.
    ///
    /// Directories contribute their `*.json` files in name order.
    pub fn from_paths(paths: &[PathBuf]) -> Result<Self> {
        let mut sources: Vec<Box<dyn PointSource>> = Vec::new();
        for path in paths {
            if path.is_dir() {
                let mut files: Vec<PathBuf> = std::fs::read_dir(path)?
                    .filter_map(|entry| entry.ok().map(|e| e.path()))
                    .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "json"))
                    .collect();
                files.sort();
                sources.extend(
                    files
                        .into_iter()
                        .map(|f| Box::new(JsonTile::new(f)) as Box<dyn PointSource>),
                );
            } else {
                sources.push(Box::new(JsonTile::new(path.clone())));
            }
        }

        if sources.is_empty() {
            return Err(ReliefError::Config {
                message: "no point sources found".to_string(),
            });
        }
        Ok(Self::new(sources))
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    fn merge_sources<F>(&self, read: F) -> Vec<Sample>
    where
        F: Fn(&dyn PointSource) -> Result<Vec<Sample>>,
    {
        let mut merged: Vec<Sample> = Vec::new();
        let mut seen: HashSet<(u64, u64)> = HashSet::new();
        let mut failed = 0usize;
        let mut duplicates = 0usize;

        for source in &self.sources {
            let samples = match read(source.as_ref()) {
                Ok(samples) => samples,
                Err(e) => {
                    warn!(source = %source.name(), error = %e, "Skipping unreadable point source");
                    failed += 1;
                    continue;
                }
            };

            for sample in samples {
                if seen.insert(coordinate_key(&sample)) {
                    merged.push(sample);
                } else {
                    duplicates += 1;
                }
            }
        }

        info!(
            sources = self.sources.len(),
            failed = failed,
            duplicates = duplicates,
            points = merged.len(),
            "Merged point sources"
        );
        merged
    }
}

impl PointSource for TileSet {
    fn fetch_all(&self) -> Result<Vec<Sample>> {
        Ok(self.merge_sources(|source| source.fetch_all()))
    }

    fn fetch(&self, region: &Region) -> Result<Vec<Sample>> {
        Ok(self.merge_sources(|source| source.fetch(region)))
    }

    fn name(&self) -> String {
        format!("{} tiles", self.sources.len())
    }
}

/// Exact coordinate identity, treating `-0.0` and `0.0` as the same point
fn coordinate_key(sample: &Sample) -> (u64, u64) {
    let canonical = |v: f64| if v == 0.0 { 0.0f64.to_bits() } else { v.to_bits() };
    (canonical(sample.latitude), canonical(sample.longitude))
}

/// Aggregate statistics of a point set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileSummary {
    pub points: usize,
    pub min_elevation: f64,
    pub max_elevation: f64,
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

/// Summarize a point set, or `None` when it is empty
pub fn summarize(samples: &[Sample]) -> Option<TileSummary> {
    let first = samples.first()?;
    let seed = TileSummary {
        points: 0,
        min_elevation: first.elevation,
        max_elevation: first.elevation,
        min_lat: first.latitude,
        max_lat: first.latitude,
        min_lon: first.longitude,
        max_lon: first.longitude,
    };

    Some(samples.iter().fold(seed, |acc, s| TileSummary {
        points: acc.points + 1,
        min_elevation: acc.min_elevation.min(s.elevation),
        max_elevation: acc.max_elevation.max(s.elevation),
        min_lat: acc.min_lat.min(s.latitude),
        max_lat: acc.max_lat.max(s.latitude),
        min_lon: acc.min_lon.min(s.longitude),
        max_lon: acc.max_lon.max(s.longitude),
    }))
}

/// Write samples as a JSON tile
pub fn write_tile(samples: &[Sample], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let records: Vec<PointRecord> = samples.iter().copied().map(PointRecord::from).collect();
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer(writer, &records)?;
    Ok(())
}

/// Merge every point of a tile set into one consolidated tile
pub fn consolidate(tiles: &TileSet, output: &Path) -> Result<TileSummary> {
    let samples = tiles.fetch_all()?;
    let summary = summarize(&samples).ok_or_else(|| ReliefError::EmptyInput {
        message: format!("no points to consolidate from {}", tiles.name()),
    })?;

    write_tile(&samples, output)?;
    info!(
        output = %output.display(),
        points = summary.points,
        min_elevation = summary.min_elevation,
        max_elevation = summary.max_elevation,
        "Consolidated tiles"
    );
    Ok(summary)
}
