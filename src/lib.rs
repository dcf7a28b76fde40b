//! # relief
//!
//! Reconstructs a continuous elevation surface from an irregular,
//! duplicate-laden cloud of scattered elevation samples and renders it as a
//! colorized raster.
//!
//! ## Pipeline
//!
//! - **Rasterizer**: bins samples into a fixed-size sum/count grid by linear
//!   coordinate mapping, averaging samples that share a cell
//! - **Gap filler**: gives every empty cell the value of its nearest
//!   populated cell, using an R-tree queried in bounded batches
//! - **Normalizer**: rescales the filled field into `[0, 1]` using the sample
//!   elevation range
//! - **Colorizer**: maps the normalized field to RGB through a linear
//!   blue-yellow ramp or a seven-stop rainbow ramp
//!
//! Point ingestion from per-tile stores and cartographic decoration live in
//! [`ingest`] and [`compose`]. [`contour`] draws a black-and-white isoline
//! map of the same reconstructed field.

pub mod cancel;
pub mod colormaps;
pub mod compose;
pub mod config;
pub mod contour;
pub mod error;
pub mod ingest;
pub mod interpolation;
pub mod logging;
pub mod pipeline;
pub mod reconstruct;
pub mod region;

pub use cancel::CancellationToken;
pub use colormaps::{Colormap, ColormapPolicy};
pub use compose::{compose, save_raster, City, Decoration, GeoPoint};
pub use config::Config;
pub use contour::{render_contours, ContourConfig};
pub use error::{ReliefError, Result};
pub use ingest::{JsonTile, PointSource, TileSet, TileSummary};
pub use logging::{
    init_tracing, log_error, log_operation_end, log_operation_start, log_render_stats,
    log_timed_operation,
};
pub use pipeline::{render, RenderOptions, RenderReport, Rendered};
pub use reconstruct::{ElevationField, ElevationRange, Sample};
pub use region::{parse_bbox, GridShape, Region};
