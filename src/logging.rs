//! Logging utilities for relief.
//!
//! This module provides structured logging functionality so render runs can
//! be followed stage by stage and compared across runs.

use std::time::Instant;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::pipeline::RenderReport;

/// Initialize the tracing subscriber with the given log level
pub fn init_tracing(log_level: &str) {
    let filter = match std::env::var("RUST_LOG") {
        Ok(val) => val,
        Err(_) => log_level.to_string(),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();
}

/// Log a start message for a significant operation
pub fn log_operation_start(operation: &str, details: Option<&str>) {
    if let Some(details) = details {
        info!(
            operation = operation,
            details = details,
            "Starting operation"
        );
    } else {
        info!(operation = operation, "Starting operation");
    }
}

/// Log the completion of a significant operation
pub fn log_operation_end(operation: &str, start_time: Instant, success: bool) {
    let duration_ms = start_time.elapsed().as_secs_f64() * 1000.0;

    if success {
        info!(
            operation = operation,
            duration_ms = duration_ms,
            "Operation completed successfully"
        );
    } else {
        warn!(
            operation = operation,
            duration_ms = duration_ms,
            "Operation failed"
        );
    }
}

/// Log an operation with timing and result in a single statement
pub fn log_timed_operation<F, R>(operation: &str, f: F) -> R
where
    F: FnOnce() -> R,
{
    let start = Instant::now();
    let operation_id = Uuid::new_v4();

    debug!(
        operation = operation,
        operation_id = %operation_id,
        "Starting operation"
    );

    let result = f();

    info!(
        operation = operation,
        operation_id = %operation_id,
        duration_ms = start.elapsed().as_secs_f64() * 1000.0,
        "Operation completed"
    );

    result
}

/// Log the statistics of a finished render
pub fn log_render_stats(report: &RenderReport) {
    info!(
        operation = "render",
        run_id = %report.run_id,
        samples = report.samples,
        accepted = report.accepted,
        discarded = report.discarded,
        populated_cells = report.populated_cells,
        filled_cells = report.filled_cells,
        min_elevation = report.range.min,
        max_elevation = report.range.max,
        width = report.width,
        height = report.height,
        colormap = %report.colormap,
        duration_ms = report.duration_ms,
        "Render completed"
    );
}

/// Log an error with context
pub fn log_error(error: &crate::error::ReliefError, context: &str) {
    error!(
        error = %error,
        context = context,
        error_type = std::any::type_name_of_val(error),
        "Error occurred"
    );
}
