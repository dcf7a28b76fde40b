//! relief - scattered elevation samples to colorized relief rasters
//!
//! This is the main entry point for the relief command-line tool.

use std::time::Instant;
use tracing::{error, info};

use relief::config::{Command, MergeArgs, RenderArgs};
use relief::ingest::consolidate;
use relief::{
    compose, init_tracing, log_error, log_operation_end, log_operation_start, log_render_stats,
    log_timed_operation, render, render_contours, save_raster, CancellationToken, Config,
    PointSource, Result, TileSet,
};

fn main() -> Result<()> {
    // Load configuration
    let (config, command) = Config::load()?;

    init_tracing(&config.log_level);
    info!("Starting relief v{}", env!("CARGO_PKG_VERSION"));

    // Validate configuration
    config.validate().map_err(|e| {
        error!("Invalid configuration: {}", e);
        e
    })?;

    let result = match &command {
        Command::Render(args) => run_render(&config, args),
        Command::Merge(args) => run_merge(args),
    };

    if let Err(e) = &result {
        log_error(e, "relief");
    }
    result
}

fn run_render(config: &Config, args: &RenderArgs) -> Result<()> {
    let start = Instant::now();
    log_operation_start("render", Some(&config.render.output.display().to_string()));

    let tiles = TileSet::from_paths(&args.sources)?;
    info!("Reading {} point sources", tiles.len());
    let samples = tiles.fetch(&config.region)?;

    let options = config.render_options()?;
    let rendered = render(&samples, &options, &CancellationToken::new())?;
    log_render_stats(&rendered.report);

    let mut image = rendered.image;
    if !config.decoration.is_empty() {
        let colormap = options.colormap.colormap();
        compose(&mut image, &config.region, &config.decoration, colormap.as_ref());
    }
    save_raster(&image, &config.render.output, config.render.jpeg_quality)?;

    if let (Some(contour_config), Some(contour_path)) =
        (config.contour_config(), &config.render.contour_output)
    {
        let contours = log_timed_operation("contour", || {
            render_contours(&rendered.field, &contour_config)
        })?;
        save_raster(&contours, contour_path, config.render.jpeg_quality)?;
    }

    if let Some(report_path) = &args.report {
        rendered.report.write_json(report_path)?;
        info!("Wrote run report to {}", report_path.display());
    }

    log_operation_end("render", start, true);
    Ok(())
}

fn run_merge(args: &MergeArgs) -> Result<()> {
    let start = Instant::now();
    log_operation_start("merge", Some(&args.output.display().to_string()));

    let tiles = TileSet::from_paths(&args.sources)?;
    let summary = consolidate(&tiles, &args.output)?;

    info!(
        "Merged {} points, elevation {:.1}m to {:.1}m",
        summary.points, summary.min_elevation, summary.max_elevation
    );
    log_operation_end("merge", start, true);
    Ok(())
}
