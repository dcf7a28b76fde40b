//! End-to-end reconstruction pipeline.
//!
//! Rasterize, fill gaps, normalize, colorize. Each stage runs to completion
//! before the next starts and owns the grid while it works on it.

use chrono::{DateTime, Utc};
use image::RgbImage;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Instant;
use tracing::info;
use uuid::Uuid;

use crate::cancel::CancellationToken;
use crate::colormaps::{colorize, ColormapPolicy};
use crate::error::{ReliefError, Result};
use crate::interpolation::{get_gap_filler, DEFAULT_BATCH_SIZE};
use crate::logging::log_timed_operation;
use crate::reconstruct::{
    normalize, rasterize, rasterize_parallel, ElevationField, ElevationRange, Sample,
};
use crate::region::{GridShape, Region};

/// Parameters of one render run
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    pub region: Region,
    pub shape: GridShape,
    pub colormap: ColormapPolicy,
    /// Gap filling method name
    pub fill_method: String,
    /// Empty cells resolved per nearest-neighbor batch
    pub batch_size: usize,
    /// Bin samples with per-worker partial grids
    pub parallel_binning: bool,
}

impl RenderOptions {
    pub fn new(region: Region, shape: GridShape) -> Self {
        Self {
            region,
            shape,
            colormap: ColormapPolicy::default(),
            fill_method: "nearest".to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            parallel_binning: false,
        }
    }

    pub fn with_colormap(mut self, colormap: ColormapPolicy) -> Self {
        self.colormap = colormap;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_parallel_binning(mut self, parallel_binning: bool) -> Self {
        self.parallel_binning = parallel_binning;
        self
    }
}

/// Statistics of a finished render
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderReport {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    /// Samples handed to the pipeline
    pub samples: usize,
    pub accepted: usize,
    pub discarded: usize,
    pub populated_cells: usize,
    pub filled_cells: usize,
    pub range: ElevationRange,
    pub width: usize,
    pub height: usize,
    pub colormap: String,
    pub fill_method: String,
    pub duration_ms: f64,
}

impl RenderReport {
    /// Write the report as pretty-printed JSON
    pub fn write_json(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

/// Output of a render run
#[derive(Debug, Clone)]
pub struct Rendered {
    /// Colorized raster, origin at the north-west corner
    pub image: RgbImage,
    /// Gap-filled elevations before normalization
    pub field: ElevationField,
    pub report: RenderReport,
}

/// Reconstruct and colorize an elevation surface from scattered samples.
///
/// Fails with `EmptyInput` when there are no samples or none lands inside the
/// grid, and with `DegenerateRange` when all samples share one elevation.
pub fn render(
    samples: &[Sample],
    options: &RenderOptions,
    cancel: &CancellationToken,
) -> Result<Rendered> {
    let start = Instant::now();
    options.region.validate()?;
    let shape = GridShape::new(options.shape.width, options.shape.height)?;
    let filler = get_gap_filler(&options.fill_method, options.batch_size)?;

    if samples.is_empty() {
        return Err(ReliefError::EmptyInput {
            message: "no samples available for the region".to_string(),
        });
    }

    info!(
        samples = samples.len(),
        width = shape.width,
        height = shape.height,
        colormap = %options.colormap,
        "Starting reconstruction"
    );

    let rasterized = log_timed_operation("rasterize", || {
        if options.parallel_binning {
            rasterize_parallel(samples, &options.region, shape, cancel)
        } else {
            rasterize(samples, &options.region, shape, cancel)
        }
    })?;
    let populated_cells = rasterized.grid.populated_cells();

    let field = log_timed_operation("gap_fill", || filler.fill(&rasterized.grid, cancel))?;
    let range = ElevationRange::from_samples(samples)?;
    let normalized = normalize(&field, &range);

    let colormap = options.colormap.colormap();
    let image = log_timed_operation("colorize", || colorize(&normalized, colormap.as_ref()))?;

    let report = RenderReport {
        run_id: Uuid::new_v4(),
        generated_at: Utc::now(),
        samples: samples.len(),
        accepted: rasterized.accepted,
        discarded: rasterized.discarded,
        populated_cells,
        filled_cells: field.filled_cells,
        range,
        width: shape.width,
        height: shape.height,
        colormap: colormap.name().to_string(),
        fill_method: filler.name().to_string(),
        duration_ms: start.elapsed().as_secs_f64() * 1000.0,
    };

    Ok(Rendered {
        image,
        field,
        report,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> RenderOptions {
        RenderOptions::new(
            Region::new(0.0, 10.0, 0.0, 10.0).unwrap(),
            GridShape::new(10, 10).unwrap(),
        )
    }

    #[test]
    fn test_render_empty_input() {
        let result = render(&[], &options(), &CancellationToken::new());
        assert!(matches!(result, Err(ReliefError::EmptyInput { .. })));
    }

    #[test]
    fn test_render_all_out_of_region() {
        let samples = [Sample::new(50.0, 50.0, 1.0), Sample::new(-50.0, 50.0, 2.0)];
        let result = render(&samples, &options(), &CancellationToken::new());
        assert!(matches!(result, Err(ReliefError::EmptyInput { .. })));
    }

    #[test]
    fn test_render_flat_input() {
        let samples = [Sample::new(1.0, 1.0, 5.0), Sample::new(9.0, 9.0, 5.0)];
        let result = render(&samples, &options(), &CancellationToken::new());
        assert!(matches!(
            result,
            Err(ReliefError::DegenerateRange { elevation }) if elevation == 5.0
        ));
    }

    #[test]
    fn test_render_rejects_unknown_fill_method() {
        let mut opts = options();
        opts.fill_method = "spline".to_string();
        let samples = [Sample::new(1.0, 1.0, 5.0), Sample::new(9.0, 9.0, 6.0)];
        assert!(render(&samples, &opts, &CancellationToken::new()).is_err());
    }

    #[test]
    fn test_render_report_counts() {
        let samples = [
            Sample::new(10.0, 0.0, 0.0),
            Sample::new(0.0, 10.0, 10.0),
            Sample::new(40.0, 40.0, 3.0),
        ];
        let rendered = render(&samples, &options(), &CancellationToken::new()).unwrap();
        let report = &rendered.report;

        assert_eq!(report.samples, 3);
        assert_eq!(report.accepted, 2);
        assert_eq!(report.discarded, 1);
        assert_eq!(report.populated_cells, 2);
        assert_eq!(report.filled_cells, 98);
        assert_eq!(report.colormap, "linear");
        assert_eq!(report.fill_method, "nearest");
        assert_eq!(rendered.image.dimensions(), (10, 10));
    }
}
