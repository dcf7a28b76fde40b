//! Error types for the relief pipeline.
//!
//! Every stage of the reconstruction reports its failures through
//! [`ReliefError`], so a caller can tell an empty point set apart from a flat
//! one and decide whether to retry ingestion with a different region.

use thiserror::Error;

/// The main error type for relief operations.
#[derive(Error, Debug)]
pub enum ReliefError {
    /// No usable samples reached the stage
    #[error("Empty input: {message}")]
    EmptyInput { message: String },

    /// Every sample shares the same elevation, so the field cannot be normalized
    #[error("Degenerate elevation range: all samples are at {elevation}")]
    DegenerateRange { elevation: f64 },

    /// Bounding region errors
    #[error("Invalid region: {message}")]
    InvalidRegion { message: String },

    /// Raster dimension errors
    #[error("Invalid dimensions: {message}")]
    InvalidDimensions { message: String },

    /// Invalid parameter errors
    #[error("Invalid parameter: {param} - {message}")]
    InvalidParameter { param: String, message: String },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// The run was cancelled through its cancellation token
    #[error("Operation cancelled")]
    Cancelled,

    /// Image generation errors
    #[error("Image generation error: {message}")]
    ImageGeneration { message: String },

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Image encoding errors
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

/// Convenience type alias for Results with ReliefError
pub type Result<T> = std::result::Result<T, ReliefError>;
