//! Configuration management for relief.
//!
//! This module handles the layered configuration system with the following precedence:
//! 1. Command-line arguments (highest priority)
//! 2. Environment variables
//! 3. JSON config file
//! 4. Default values (lowest priority)

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::colormaps::ColormapPolicy;
use crate::compose::{Decoration, DEFAULT_JPEG_QUALITY};
use crate::contour::{ContourConfig, DEFAULT_CONTOUR_LEVELS};
use crate::error::{ReliefError, Result};
use crate::interpolation::DEFAULT_BATCH_SIZE;
use crate::pipeline::RenderOptions;
use crate::region::{parse_bbox, GridShape, Region};

/// Command-line arguments for relief
#[derive(Parser, Debug)]
#[command(name = "relief")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to JSON configuration file
    #[arg(short, long, env = "RELIEF_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "RELIEF_LOG_LEVEL", global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Reconstruct and render an elevation raster from point tiles
    Render(RenderArgs),
    /// Consolidate point tiles into a single deduplicated tile
    Merge(MergeArgs),
}

/// Arguments of the `render` subcommand
#[derive(clap::Args, Debug, Clone)]
pub struct RenderArgs {
    /// Tile files or directories of `*.json` tiles
    #[arg(required = true)]
    pub sources: Vec<PathBuf>,

    /// Output raster path (.png, .jpg)
    #[arg(short, long, env = "RELIEF_OUTPUT")]
    pub output: Option<PathBuf>,

    /// Raster width in pixels
    #[arg(long, env = "RELIEF_WIDTH")]
    pub width: Option<usize>,

    /// Raster height in pixels
    #[arg(long, env = "RELIEF_HEIGHT")]
    pub height: Option<usize>,

    /// Colormap (linear, rainbow)
    #[arg(long, env = "RELIEF_COLORMAP")]
    pub colormap: Option<String>,

    /// Region as "min_lon,min_lat,max_lon,max_lat"
    #[arg(long, env = "RELIEF_BBOX", allow_hyphen_values = true)]
    pub bbox: Option<String>,

    /// Empty cells resolved per nearest-neighbor batch
    #[arg(long, env = "RELIEF_BATCH_SIZE")]
    pub batch_size: Option<usize>,

    /// Bin samples on all cores with per-worker partial grids
    #[arg(long)]
    pub parallel_binning: bool,

    /// Write a JSON run report to this path
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Skip markers, border and legend
    #[arg(long)]
    pub no_decorations: bool,

    /// Also write a contour map of the reconstructed field to this path
    #[arg(long, env = "RELIEF_CONTOURS")]
    pub contours: Option<PathBuf>,

    /// Number of contour levels
    #[arg(long)]
    pub contour_levels: Option<usize>,

    /// TrueType font for city labels
    #[arg(long, env = "RELIEF_FONT")]
    pub font: Option<PathBuf>,
}

/// Arguments of the `merge` subcommand
#[derive(clap::Args, Debug, Clone)]
pub struct MergeArgs {
    /// Tile files or directories of `*.json` tiles
    #[arg(required = true)]
    pub sources: Vec<PathBuf>,

    /// Consolidated tile path
    #[arg(short, long)]
    pub output: PathBuf,
}

/// Rendering configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Raster width in pixels
    #[serde(default = "default_dimension")]
    pub width: usize,

    /// Raster height in pixels
    #[serde(default = "default_dimension")]
    pub height: usize,

    /// Colormap name
    #[serde(default = "default_colormap")]
    pub colormap: String,

    /// Gap filling method
    #[serde(default = "default_fill_method")]
    pub fill_method: String,

    /// Empty cells resolved per nearest-neighbor batch
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Bin samples with per-worker partial grids
    #[serde(default)]
    pub parallel_binning: bool,

    /// Output raster path
    #[serde(default = "default_output")]
    pub output: PathBuf,

    /// JPEG quality (1-100)
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,

    /// Contour map output path, none to skip the contour map
    #[serde(default)]
    pub contour_output: Option<PathBuf>,

    /// Number of contour levels
    #[serde(default = "default_contour_levels")]
    pub contour_levels: usize,
}

/// Complete configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Bounding region of the raster
    #[serde(default = "default_region")]
    pub region: Region,

    /// Rendering configuration
    #[serde(default)]
    pub render: RenderConfig,

    /// Decorations drawn over the raster
    #[serde(default)]
    pub decoration: Decoration,

    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Config {
    /// Load configuration from all sources with proper precedence
    pub fn load() -> Result<(Self, Command)> {
        Self::from_args(Args::parse())
    }

    /// Build the configuration from already parsed arguments
    pub fn from_args(args: Args) -> Result<(Self, Command)> {
        // Start with defaults
        let mut config = Config::default();

        // Load from JSON file if provided
        if let Some(config_path) = &args.config {
            let json_config = Self::load_from_file(config_path)?;
            config.merge(json_config);
        }

        // Override with command-line arguments
        if let Some(level) = args.log_level {
            config.log_level = level;
        }
        if let Command::Render(render_args) = &args.command {
            config.apply_render_args(render_args)?;
        }

        Ok((config, args.command))
    }

    /// Load configuration from a JSON file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Merge another config into this one (other takes precedence)
    fn merge(&mut self, other: Config) {
        self.region = other.region;
        self.render = other.render;
        self.decoration = other.decoration;
        self.log_level = other.log_level;
    }

    fn apply_render_args(&mut self, args: &RenderArgs) -> Result<()> {
        if let Some(bbox) = &args.bbox {
            self.region = parse_bbox(bbox)?;
        }
        if let Some(width) = args.width {
            self.render.width = width;
        }
        if let Some(height) = args.height {
            self.render.height = height;
        }
        if let Some(colormap) = &args.colormap {
            self.render.colormap = colormap.clone();
        }
        if let Some(batch_size) = args.batch_size {
            self.render.batch_size = batch_size;
        }
        if let Some(output) = &args.output {
            self.render.output = output.clone();
        }
        if args.parallel_binning {
            self.render.parallel_binning = true;
        }
        if let Some(contours) = &args.contours {
            self.render.contour_output = Some(contours.clone());
        }
        if let Some(levels) = args.contour_levels {
            self.render.contour_levels = levels;
        }
        if let Some(font) = &args.font {
            self.decoration.font_path = Some(font.clone());
        }
        if args.no_decorations {
            self.decoration = Decoration {
                border_width: self.decoration.border_width,
                ..Decoration::default()
            };
        }
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.region.validate()?;
        GridShape::new(self.render.width, self.render.height)?;

        if self.render.batch_size == 0 {
            return Err(ReliefError::Config {
                message: "Batch size must be at least 1".to_string(),
            });
        }

        self.render.colormap.parse::<ColormapPolicy>()?;

        match self.render.fill_method.as_str() {
            "nearest" => {}
            _ => {
                return Err(ReliefError::Config {
                    message: format!(
                        "Invalid fill method: {}. Must be: nearest",
                        self.render.fill_method
                    ),
                });
            }
        }

        if self.render.contour_levels == 0 {
            return Err(ReliefError::Config {
                message: "Contour levels must be at least 1".to_string(),
            });
        }

        if !(1..=100).contains(&self.render.jpeg_quality) {
            return Err(ReliefError::Config {
                message: format!(
                    "JPEG quality must be between 1 and 100, got {}",
                    self.render.jpeg_quality
                ),
            });
        }

        // Validate log level
        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ReliefError::Config {
                    message: format!(
                        "Invalid log level: {}. Must be one of: trace, debug, info, warn, error",
                        self.log_level
                    ),
                });
            }
        }

        Ok(())
    }

    /// Contour map styling, when a contour map is requested
    pub fn contour_config(&self) -> Option<ContourConfig> {
        self.render.contour_output.as_ref().map(|_| ContourConfig {
            levels: self.render.contour_levels,
            ..ContourConfig::default()
        })
    }

    /// Pipeline options described by this configuration
    pub fn render_options(&self) -> Result<RenderOptions> {
        let shape = GridShape::new(self.render.width, self.render.height)?;
        let mut options = RenderOptions::new(self.region, shape)
            .with_colormap(self.render.colormap.parse()?)
            .with_batch_size(self.render.batch_size)
            .with_parallel_binning(self.render.parallel_binning);
        options.fill_method = self.render.fill_method.clone();
        Ok(options)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            region: default_region(),
            render: RenderConfig::default(),
            decoration: Decoration::default(),
            log_level: default_log_level(),
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: default_dimension(),
            height: default_dimension(),
            colormap: default_colormap(),
            fill_method: default_fill_method(),
            batch_size: default_batch_size(),
            parallel_binning: false,
            output: default_output(),
            jpeg_quality: default_jpeg_quality(),
            contour_output: None,
            contour_levels: default_contour_levels(),
        }
    }
}

// Default value functions for serde
fn default_region() -> Region {
    Region {
        min_lat: 31.20,
        max_lat: 37.20,
        min_lon: -109.20,
        max_lon: -102.80,
    }
}

fn default_dimension() -> usize {
    2000
}

fn default_colormap() -> String {
    "linear".to_string()
}

fn default_fill_method() -> String {
    "nearest".to_string()
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_output() -> PathBuf {
    PathBuf::from("images/elevation.jpg")
}

fn default_jpeg_quality() -> u8 {
    DEFAULT_JPEG_QUALITY
}

fn default_contour_levels() -> usize {
    DEFAULT_CONTOUR_LEVELS
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.region.min_lat, 31.20);
        assert_eq!(config.render.width, 2000);
        assert_eq!(config.render.colormap, "linear");
        assert_eq!(config.render.jpeg_quality, 95);
        assert_eq!(config.log_level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_merge() {
        let mut config1 = Config::default();
        let mut config2 = Config::default();

        config2.render.width = 640;
        config2.render.colormap = "rainbow".to_string();

        config1.merge(config2);

        assert_eq!(config1.render.width, 640);
        assert_eq!(config1.render.colormap, "rainbow");
    }

    #[test]
    fn test_config_validation() {
        // Valid config should pass
        let config = Config::default();
        assert!(config.validate().is_ok());

        let mut config = Config::default();
        config.render.width = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.render.batch_size = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.render.colormap = "viridis".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.render.fill_method = "kriging".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.render.jpeg_quality = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.log_level = "invalid".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.region.max_lat = config.region.min_lat;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: Config = serde_json::from_str(
            r#"{"region": {"minLat": 0, "maxLat": 1, "minLon": 0, "maxLon": 1},
                "render": {"width": 64}}"#,
        )
        .unwrap();
        assert_eq!(config.render.width, 64);
        assert_eq!(config.render.height, 2000);
        assert_eq!(config.decoration.border_width, 6);
    }

    #[test]
    fn test_cli_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("relief.json");
        let mut file = std::fs::File::create(&path).unwrap();
        write!(
            file,
            r#"{{"render": {{"width": 300, "height": 200, "colormap": "rainbow"}}, "log_level": "debug"}}"#
        )
        .unwrap();

        let args = Args::try_parse_from([
            "relief",
            "--config",
            path.to_str().unwrap(),
            "render",
            "tiles/",
            "--width",
            "120",
            "--bbox",
            "-109.2,31.2,-102.8,37.2",
        ])
        .unwrap();
        let (config, command) = Config::from_args(args).unwrap();

        assert_eq!(config.render.width, 120);
        assert_eq!(config.render.height, 200);
        assert_eq!(config.render.colormap, "rainbow");
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.region.min_lon, -109.2);
        assert!(matches!(command, Command::Render(_)));
    }

    #[test]
    fn test_render_options() {
        let mut config = Config::default();
        config.render.colormap = "rainbow".to_string();
        config.render.batch_size = 128;

        let options = config.render_options().unwrap();
        assert_eq!(options.colormap, ColormapPolicy::Rainbow);
        assert_eq!(options.batch_size, 128);
        assert_eq!(options.shape, GridShape::new(2000, 2000).unwrap());
    }

    #[test]
    fn test_new_mexico_preset() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("demos/new_mexico.json");
        let config = Config::load_from_file(&path).unwrap();

        assert!(config.validate().is_ok());
        assert_eq!(config.region.max_lon, -102.80);
        assert_eq!(config.decoration.cities.len(), 11);
        assert_eq!(config.decoration.border.len(), 16);
        assert!(config.decoration.legend);
        assert!(config.decoration.font_path.is_some());
        assert_eq!(config.contour_config().unwrap().levels, 30);
        assert_eq!(
            config.render_options().unwrap().colormap,
            ColormapPolicy::Rainbow
        );
    }

    #[test]
    fn test_contour_and_font_flags() {
        let config = Config::default();
        assert!(config.contour_config().is_none());

        let args = Args::try_parse_from([
            "relief",
            "render",
            "tiles/",
            "--contours",
            "images/contours.png",
            "--contour-levels",
            "12",
            "--font",
            "fonts/DejaVuSans.ttf",
        ])
        .unwrap();
        let (config, _) = Config::from_args(args).unwrap();

        assert_eq!(
            config.render.contour_output,
            Some(PathBuf::from("images/contours.png"))
        );
        assert_eq!(config.contour_config().unwrap().levels, 12);
        assert_eq!(
            config.decoration.font_path,
            Some(PathBuf::from("fonts/DejaVuSans.ttf"))
        );

        let mut invalid = config;
        invalid.render.contour_levels = 0;
        assert!(invalid.validate().is_err());
    }
}
