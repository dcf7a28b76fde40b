//! Contour (isoline) maps of a reconstructed elevation field.
//!
//! Isolines are traced with marching squares over the gap-filled field and
//! drawn as thin polylines on a plain background. No colormap is involved,
//! so a contour map can be written next to any colorized raster.

use image::{Rgb, RgbImage};
use imageproc::drawing::draw_line_segment_mut;
use ndarray::Array2;
use rayon::prelude::*;
use std::collections::{HashMap, VecDeque};
use tracing::debug;

use crate::error::{ReliefError, Result};
use crate::reconstruct::ElevationField;

/// Default number of contour levels
pub const DEFAULT_CONTOUR_LEVELS: usize = 30;

/// Endpoints closer than this (in pixels) are treated as the same point
const JOIN_TOLERANCE: f64 = 1e-6;

/// A point in pixel space: `x` is the column, `y` the row
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    fn key(&self) -> (i64, i64) {
        (
            (self.x / JOIN_TOLERANCE).round() as i64,
            (self.y / JOIN_TOLERANCE).round() as i64,
        )
    }
}

/// A line segment between two points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub start: Point,
    pub end: Point,
}

/// A connected isoline
#[derive(Debug, Clone, PartialEq)]
pub struct Contour {
    pub level: f64,
    pub points: Vec<Point>,
    pub closed: bool,
}

/// Contour map styling
#[derive(Debug, Clone)]
pub struct ContourConfig {
    /// Number of levels between the lowest and highest elevation
    pub levels: usize,
    pub line_color: Rgb<u8>,
    pub background: Rgb<u8>,
}

impl Default for ContourConfig {
    fn default() -> Self {
        Self {
            levels: DEFAULT_CONTOUR_LEVELS,
            line_color: Rgb([0, 0, 0]),
            background: Rgb([255, 255, 255]),
        }
    }
}

/// `count` evenly spaced levels strictly between `min` and `max`.
///
/// A flat or non-finite range has no levels.
pub fn contour_levels(min: f64, max: f64, count: usize) -> Vec<f64> {
    if count == 0 || !min.is_finite() || !max.is_finite() || max <= min {
        return Vec::new();
    }
    let span = max - min;
    (1..=count)
        .map(|k| min + span * k as f64 / (count + 1) as f64)
        .collect()
}

/// Lowest and highest finite value of a field
pub fn field_extent(values: &Array2<f64>) -> Option<(f64, f64)> {
    values
        .iter()
        .filter(|v| v.is_finite())
        .fold(None, |acc, &v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

/// Marching squares over one level.
///
/// Each 2x2 block of neighboring cells is classified by which corners are at
/// or above `level`; crossings are placed on the block edges by linear
/// interpolation. Blocks touching a NaN are skipped.
pub fn march_squares(values: &Array2<f64>, level: f64) -> Vec<Segment> {
    let (height, width) = values.dim();
    if width < 2 || height < 2 {
        return Vec::new();
    }

    let mut segments = Vec::new();
    for row in 0..height - 1 {
        for col in 0..width - 1 {
            let tl = values[[row, col]];
            let tr = values[[row, col + 1]];
            let bl = values[[row + 1, col]];
            let br = values[[row + 1, col + 1]];
            if tl.is_nan() || tr.is_nan() || bl.is_nan() || br.is_nan() {
                continue;
            }

            let mut case = 0u8;
            if tl >= level {
                case |= 1;
            }
            if tr >= level {
                case |= 2;
            }
            if br >= level {
                case |= 4;
            }
            if bl >= level {
                case |= 8;
            }
            if case == 0 || case == 15 {
                continue;
            }

            let (x, y) = (col as f64, row as f64);
            let top = interpolate_edge((x, y), (x + 1.0, y), tl, tr, level);
            let right = interpolate_edge((x + 1.0, y), (x + 1.0, y + 1.0), tr, br, level);
            let bottom = interpolate_edge((x, y + 1.0), (x + 1.0, y + 1.0), bl, br, level);
            let left = interpolate_edge((x, y), (x, y + 1.0), tl, bl, level);

            let mut push = |start, end| segments.push(Segment { start, end });
            match case {
                1 | 14 => push(left, top),
                2 | 13 => push(top, right),
                3 | 12 => push(left, right),
                4 | 11 => push(right, bottom),
                6 | 9 => push(top, bottom),
                7 | 8 => push(left, bottom),
                // Saddles: split by the block mean
                5 | 10 => {
                    let center_high = (tl + tr + bl + br) / 4.0 >= level;
                    if (case == 5) == center_high {
                        push(left, bottom);
                        push(top, right);
                    } else {
                        push(left, top);
                        push(right, bottom);
                    }
                }
                _ => {}
            }
        }
    }
    segments
}

fn interpolate_edge(a: (f64, f64), b: (f64, f64), va: f64, vb: f64, level: f64) -> Point {
    if (vb - va).abs() < f64::EPSILON {
        return Point::new((a.0 + b.0) / 2.0, (a.1 + b.1) / 2.0);
    }
    let t = ((level - va) / (vb - va)).clamp(0.0, 1.0);
    Point::new(a.0 + t * (b.0 - a.0), a.1 + t * (b.1 - a.1))
}

/// Join unordered segments into polylines.
///
/// Segments are chained through shared endpoints in both directions; a chain
/// whose ends meet is closed.
pub fn connect_segments(segments: &[Segment], level: f64) -> Vec<Contour> {
    let mut by_endpoint: HashMap<(i64, i64), Vec<usize>> = HashMap::new();
    for (i, segment) in segments.iter().enumerate() {
        by_endpoint.entry(segment.start.key()).or_default().push(i);
        by_endpoint.entry(segment.end.key()).or_default().push(i);
    }

    let mut used = vec![false; segments.len()];
    let next_unused = |at: Point, used: &mut Vec<bool>| -> Option<Point> {
        let candidates = by_endpoint.get(&at.key())?;
        let &i = candidates.iter().find(|&&i| !used[i])?;
        used[i] = true;
        let segment = segments[i];
        Some(if segment.start.key() == at.key() {
            segment.end
        } else {
            segment.start
        })
    };

    let mut contours = Vec::new();
    for i in 0..segments.len() {
        if used[i] {
            continue;
        }
        used[i] = true;

        let mut points = VecDeque::from([segments[i].start, segments[i].end]);
        while let Some(&back) = points.back() {
            match next_unused(back, &mut used) {
                Some(point) => points.push_back(point),
                None => break,
            }
        }
        while let Some(&front) = points.front() {
            match next_unused(front, &mut used) {
                Some(point) => points.push_front(point),
                None => break,
            }
        }

        let closed = points.len() > 2
            && points.front().map(Point::key) == points.back().map(Point::key);
        contours.push(Contour {
            level,
            points: points.into(),
            closed,
        });
    }
    contours
}

/// Trace every level over the field, levels in parallel, output in level order
pub fn trace_contours(field: &ElevationField, levels: &[f64]) -> Vec<Contour> {
    levels
        .par_iter()
        .map(|&level| connect_segments(&march_squares(&field.values, level), level))
        .collect::<Vec<_>>()
        .into_iter()
        .flatten()
        .collect()
}

/// Draw a contour map of the field.
///
/// Levels are spread evenly over the field's own elevation extent, so a flat
/// field renders as a blank background.
pub fn render_contours(field: &ElevationField, config: &ContourConfig) -> Result<RgbImage> {
    let (height, width) = field.values.dim();
    if width == 0 || height == 0 {
        return Err(ReliefError::ImageGeneration {
            message: format!("cannot draw contours of an empty {}x{} field", width, height),
        });
    }

    let levels = field_extent(&field.values)
        .map(|(lo, hi)| contour_levels(lo, hi, config.levels))
        .unwrap_or_default();
    let contours = trace_contours(field, &levels);

    let mut img = RgbImage::from_pixel(width as u32, height as u32, config.background);
    for contour in &contours {
        for pair in contour.points.windows(2) {
            draw_line_segment_mut(
                &mut img,
                (pair[0].x as f32, pair[0].y as f32),
                (pair[1].x as f32, pair[1].y as f32),
                config.line_color,
            );
        }
    }

    debug!(
        levels = levels.len(),
        contours = contours.len(),
        "Rendered contour map"
    );
    Ok(img)
}
