//! Raster composer: decorations on top of the colorized field, then file output.
//!
//! All geographic positions go through [`Region::to_pixel`], the same linear
//! transform the rasterizer uses, so markers and borders line up with the
//! reconstructed surface.

use image::codecs::jpeg::JpegEncoder;
use image::{ColorType, ImageFormat, Rgb, RgbImage};
use imageproc::drawing::{
    draw_filled_circle_mut, draw_hollow_circle_mut, draw_hollow_rect_mut, draw_line_segment_mut,
    draw_text_mut, text_size,
};
use imageproc::rect::Rect;
use rusttype::{Font, Scale};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::colormaps::Colormap;
use crate::error::{ReliefError, Result};
use crate::region::{GridShape, Region};

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
const RED: Rgb<u8> = Rgb([255, 0, 0]);

/// Default JPEG quality for saved rasters
pub const DEFAULT_JPEG_QUALITY: u8 = 95;

/// A geographic vertex
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

/// A city marker, sized by population
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct City {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub population: u64,
}

/// Everything drawn on top of the colorized raster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decoration {
    /// City markers
    #[serde(default)]
    pub cities: Vec<City>,

    /// Closed border polyline
    #[serde(default)]
    pub border: Vec<GeoPoint>,

    /// Border line width in pixels
    #[serde(default = "default_border_width")]
    pub border_width: u32,

    /// Whether to draw a colorbar legend
    #[serde(default)]
    pub legend: bool,

    /// TrueType font for city names; labels are skipped without one
    #[serde(default)]
    pub font_path: Option<PathBuf>,
}

impl Default for Decoration {
    fn default() -> Self {
        Self {
            cities: Vec::new(),
            border: Vec::new(),
            border_width: default_border_width(),
            legend: false,
            font_path: None,
        }
    }
}

fn default_border_width() -> u32 {
    6
}

impl Decoration {
    pub fn is_empty(&self) -> bool {
        self.cities.is_empty() && self.border.is_empty() && !self.legend
    }
}

/// Draw every configured decoration onto the raster
pub fn compose(
    img: &mut RgbImage,
    region: &Region,
    decoration: &Decoration,
    colormap: &dyn Colormap,
) {
    let shape = GridShape {
        width: img.width() as usize,
        height: img.height() as usize,
    };

    if decoration.border.len() >= 2 {
        draw_border(img, region, shape, &decoration.border, decoration.border_width);
    }
    if !decoration.cities.is_empty() {
        draw_city_markers(img, region, shape, &decoration.cities);
        match decoration.font_path.as_deref().and_then(load_font) {
            Some(font) => draw_city_labels(img, region, shape, &decoration.cities, &font),
            None => debug!("No usable font configured, skipping city labels"),
        }
    }
    if decoration.legend {
        draw_legend(img, colormap);
    }

    debug!(
        cities = decoration.cities.len(),
        border_points = decoration.border.len(),
        legend = decoration.legend,
        "Composed decorations"
    );
}

/// Log-population ratio in `[0, 1]` used to size markers and labels
fn population_ratio(population: u64, max_population: u64) -> f64 {
    if population > 1 && max_population > 1 {
        ((population as f64).ln() / (max_population as f64).ln()).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Marker radius in pixels, 5 to 20 on a log-population scale
pub fn marker_radius(population: u64, max_population: u64) -> i32 {
    (5.0 + population_ratio(population, max_population) * 15.0) as i32
}

/// Label font size in pixels, 12 to 24 on a log-population scale
pub fn label_size(population: u64, max_population: u64) -> f32 {
    (12.0 + population_ratio(population, max_population) * 12.0).trunc() as f32
}

/// Top-left corner of a label centered above a marker
pub fn label_origin(center: (i32, i32), radius: i32, text: (i32, i32)) -> (i32, i32) {
    (center.0 - text.0 / 2, center.1 - text.1 - radius - 5)
}

fn load_font(path: &Path) -> Option<Font<'static>> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "Could not read font");
            return None;
        }
    };
    let font = Font::try_from_vec(bytes);
    if font.is_none() {
        debug!(path = %path.display(), "Font file is not a usable TrueType font");
    }
    font
}

fn draw_city_labels(
    img: &mut RgbImage,
    region: &Region,
    shape: GridShape,
    cities: &[City],
    font: &Font<'_>,
) {
    let max_population = cities.iter().map(|c| c.population).max().unwrap_or(0);

    for city in cities {
        let (x, y) = region.to_pixel(city.lat, city.lon, shape);
        let radius = marker_radius(city.population, max_population);
        let scale = Scale::uniform(label_size(city.population, max_population));
        let (text_x, text_y) = label_origin(
            (x as i32, y as i32),
            radius,
            text_size(scale, font, &city.name),
        );

        // 2-pixel white outline under black text
        for dx in -2..=2 {
            for dy in -2..=2 {
                draw_text_mut(img, WHITE, text_x + dx, text_y + dy, scale, font, &city.name);
            }
        }
        draw_text_mut(img, BLACK, text_x, text_y, scale, font, &city.name);
    }
}

fn draw_city_markers(img: &mut RgbImage, region: &Region, shape: GridShape, cities: &[City]) {
    let max_population = cities.iter().map(|c| c.population).max().unwrap_or(0);

    for city in cities {
        let (x, y) = region.to_pixel(city.lat, city.lon, shape);
        let center = (x as i32, y as i32);
        let radius = marker_radius(city.population, max_population);

        // White halo so markers read on any part of the ramp
        for dx in -1..=1 {
            for dy in -1..=1 {
                draw_hollow_circle_mut(img, (center.0 + dx, center.1 + dy), radius + 1, WHITE);
            }
        }
        draw_filled_circle_mut(img, center, radius, RED);
        draw_hollow_circle_mut(img, center, radius, BLACK);
        draw_hollow_circle_mut(img, center, radius - 1, BLACK);
    }
}

fn draw_border(
    img: &mut RgbImage,
    region: &Region,
    shape: GridShape,
    points: &[GeoPoint],
    width: u32,
) {
    let pixels: Vec<(f32, f32)> = points
        .iter()
        .map(|p| {
            let (x, y) = region.to_pixel(p.lat, p.lon, shape);
            (x as f32, y as f32)
        })
        .collect();

    // Black underlay first, white line on top
    for (color, line_width) in [(BLACK, width + 4), (WHITE, width)] {
        for i in 0..pixels.len() {
            let start = pixels[i];
            let end = pixels[(i + 1) % pixels.len()];
            draw_thick_segment(img, start, end, line_width, color);
        }
    }
}

fn draw_thick_segment(
    img: &mut RgbImage,
    start: (f32, f32),
    end: (f32, f32),
    width: u32,
    color: Rgb<u8>,
) {
    let (dx, dy) = (end.0 - start.0, end.1 - start.1);
    let length = (dx * dx + dy * dy).sqrt();
    let half = width as f32 / 2.0;

    if length > f32::EPSILON {
        let (nx, ny) = (-dy / length, dx / length);
        let steps = (width.max(1) as f32 * 2.0) as i32;
        for step in 0..=steps {
            let offset = -half + step as f32 * (width as f32 / steps as f32);
            draw_line_segment_mut(
                img,
                (start.0 + nx * offset, start.1 + ny * offset),
                (end.0 + nx * offset, end.1 + ny * offset),
                color,
            );
        }
    }

    // Round joints between consecutive segments
    let radius = half.round() as i32;
    draw_filled_circle_mut(img, (start.0 as i32, start.1 as i32), radius, color);
    draw_filled_circle_mut(img, (end.0 as i32, end.1 as i32), radius, color);
}

/// Vertical colorbar in the lower-right corner, 1.0 at the top
fn draw_legend(img: &mut RgbImage, colormap: &dyn Colormap) {
    let (width, height) = img.dimensions();
    let margin = (width / 50).max(8);
    let bar_width = (width / 40).max(12);
    let bar_height = height / 3;

    if bar_height < 2 || bar_width + 2 * margin > width || bar_height + 2 * margin > height {
        debug!(width, height, "Raster too small for a legend");
        return;
    }

    let left = width - margin - bar_width;
    let top = height - margin - bar_height;
    for row in 0..bar_height {
        let value = 1.0 - row as f64 / (bar_height - 1) as f64;
        let color = Rgb(colormap.map_normalized(value));
        for col in 0..bar_width {
            img.put_pixel(left + col, top + row, color);
        }
    }

    let frame = Rect::at(left as i32 - 1, top as i32 - 1).of_size(bar_width + 2, bar_height + 2);
    draw_hollow_rect_mut(img, frame, BLACK);
}

/// Write the raster to disk, picking the format from the file extension
pub fn save_raster(img: &RgbImage, path: &Path, jpeg_quality: u8) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        "jpg" | "jpeg" => {
            let writer = BufWriter::new(File::create(path)?);
            let mut encoder = JpegEncoder::new_with_quality(writer, jpeg_quality);
            encoder.encode(img.as_raw(), img.width(), img.height(), ColorType::Rgb8)?;
        }
        "png" => img.save_with_format(path, ImageFormat::Png)?,
        other => {
            return Err(ReliefError::InvalidParameter {
                param: "output".to_string(),
                message: format!("Unsupported output format: '{}' (use png or jpg)", other),
            })
        }
    }

    info!(
        path = %path.display(),
        width = img.width(),
        height = img.height(),
        "Raster saved"
    );
    Ok(())
}
