//! Bounding regions and the linear degree-to-pixel transform.
//!
//! Row 0 of every raster is the northern (max-latitude) edge and column 0 the
//! western (min-longitude) edge. The rasterizer and the decoration layer both
//! go through [`Region`] so their pixel coordinates stay consistent.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{ReliefError, Result};

/// Fixed geographic rectangle defining the coordinate-to-pixel transform
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Region {
    /// Southern edge in degrees
    #[serde(alias = "minLat")]
    pub min_lat: f64,
    /// Northern edge in degrees
    #[serde(alias = "maxLat")]
    pub max_lat: f64,
    /// Western edge in degrees
    #[serde(alias = "minLon")]
    pub min_lon: f64,
    /// Eastern edge in degrees
    #[serde(alias = "maxLon")]
    pub max_lon: f64,
}

impl Region {
    /// Create a validated region
    pub fn new(min_lat: f64, max_lat: f64, min_lon: f64, max_lon: f64) -> Result<Self> {
        let region = Self {
            min_lat,
            max_lat,
            min_lon,
            max_lon,
        };
        region.validate()?;
        Ok(region)
    }

    /// Check the `min < max` invariants on both axes
    pub fn validate(&self) -> Result<()> {
        let bounds = [self.min_lat, self.max_lat, self.min_lon, self.max_lon];
        if bounds.iter().any(|b| !b.is_finite()) {
            return Err(ReliefError::InvalidRegion {
                message: format!("bounds must be finite: {:?}", bounds),
            });
        }
        if self.min_lat >= self.max_lat {
            return Err(ReliefError::InvalidRegion {
                message: format!(
                    "min_lat ({}) must be < max_lat ({})",
                    self.min_lat, self.max_lat
                ),
            });
        }
        if self.min_lon >= self.max_lon {
            return Err(ReliefError::InvalidRegion {
                message: format!(
                    "min_lon ({}) must be < max_lon ({})",
                    self.min_lon, self.max_lon
                ),
            });
        }
        Ok(())
    }

    /// Whether a coordinate lies inside the region, edges included
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        (self.min_lat..=self.max_lat).contains(&lat) && (self.min_lon..=self.max_lon).contains(&lon)
    }

    /// Continuous pixel position `(x, y)` of a coordinate.
    ///
    /// Not floored or clamped; decorations use it to place markers and
    /// border vertices with the same transform the rasterizer uses.
    pub fn to_pixel(&self, lat: f64, lon: f64, shape: GridShape) -> (f64, f64) {
        let x = (lon - self.min_lon) / (self.max_lon - self.min_lon) * (shape.width - 1) as f64;
        let y = (self.max_lat - lat) / (self.max_lat - self.min_lat) * (shape.height - 1) as f64;
        (x, y)
    }

    /// Map a coordinate to its `(row, col)` cell.
    ///
    /// Returns `None` when the floored position falls outside the grid or any
    /// input is non-finite; such samples are dropped by the rasterizer.
    pub fn cell_of(&self, lat: f64, lon: f64, shape: GridShape) -> Option<(usize, usize)> {
        if !lat.is_finite() || !lon.is_finite() {
            return None;
        }
        let (x, y) = self.to_pixel(lat, lon, shape);
        let col = x.floor();
        let row = y.floor();
        if col < 0.0 || row < 0.0 || col >= shape.width as f64 || row >= shape.height as f64 {
            return None;
        }
        Some((row as usize, col as usize))
    }
}

impl FromStr for Region {
    type Err = ReliefError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        parse_bbox(s)
    }
}

/// Parse a bounding box string "min_lon,min_lat,max_lon,max_lat" into a region
pub fn parse_bbox(bbox: &str) -> Result<Region> {
    let parts: Vec<&str> = bbox.split(',').map(str::trim).collect();
    if parts.len() != 4 {
        return Err(ReliefError::InvalidParameter {
            param: "bbox".to_string(),
            message: "Bounding box must be in format 'min_lon,min_lat,max_lon,max_lat'".to_string(),
        });
    }

    let mut values = [0.0f64; 4];
    for (slot, (part, label)) in values
        .iter_mut()
        .zip(parts.iter().zip(["min_lon", "min_lat", "max_lon", "max_lat"]))
    {
        *slot = part
            .parse::<f64>()
            .map_err(|_| ReliefError::InvalidParameter {
                param: "bbox".to_string(),
                message: format!("Invalid {}: {}", label, part),
            })?;
    }

    let [min_lon, min_lat, max_lon, max_lat] = values;
    Region::new(min_lat, max_lat, min_lon, max_lon)
}

/// Target raster dimensions in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridShape {
    pub width: usize,
    pub height: usize,
}

impl GridShape {
    /// Create validated dimensions; both sides must be at least one pixel
    pub fn new(width: usize, height: usize) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(ReliefError::InvalidDimensions {
                message: format!("grid must be at least 1x1, got {}x{}", width, height),
            });
        }
        Ok(Self { width, height })
    }

    /// Total number of cells
    pub fn cells(&self) -> usize {
        self.width * self.height
    }

    /// Shape tuple in ndarray `(rows, cols)` order
    pub fn dim(&self) -> (usize, usize) {
        (self.height, self.width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_region() -> Region {
        Region::new(0.0, 10.0, 0.0, 10.0).unwrap()
    }

    #[test]
    fn test_region_validation() {
        assert!(Region::new(0.0, 10.0, 0.0, 10.0).is_ok());
        assert!(Region::new(10.0, 10.0, 0.0, 10.0).is_err());
        assert!(Region::new(0.0, 10.0, 5.0, -5.0).is_err());
        assert!(Region::new(f64::NAN, 10.0, 0.0, 10.0).is_err());
    }

    #[test]
    fn test_corner_mapping() {
        let region = unit_region();
        let shape = GridShape::new(10, 10).unwrap();

        // North-west corner is the origin
        assert_eq!(region.cell_of(10.0, 0.0, shape), Some((0, 0)));
        // South-east corner is the last cell
        assert_eq!(region.cell_of(0.0, 10.0, shape), Some((9, 9)));
    }

    #[test]
    fn test_mapping_non_square() {
        let region = Region::new(31.2, 37.2, -109.2, -102.8).unwrap();
        let shape = GridShape::new(200, 100).unwrap();

        assert_eq!(region.cell_of(37.2, -109.2, shape), Some((0, 0)));
        assert_eq!(region.cell_of(31.2, -102.8, shape), Some((99, 199)));
    }

    #[test]
    fn test_out_of_region_discarded() {
        let region = unit_region();
        let shape = GridShape::new(10, 10).unwrap();

        assert_eq!(region.cell_of(5.0, -1.0, shape), None);
        assert_eq!(region.cell_of(12.0, 5.0, shape), None);
        assert_eq!(region.cell_of(5.0, 12.0, shape), None);
        assert_eq!(region.cell_of(f64::NAN, 5.0, shape), None);
        assert_eq!(region.cell_of(5.0, f64::INFINITY, shape), None);
    }

    #[test]
    fn test_contains_is_inclusive() {
        let region = unit_region();
        assert!(region.contains(0.0, 0.0));
        assert!(region.contains(10.0, 10.0));
        assert!(!region.contains(10.01, 5.0));
    }

    #[test]
    fn test_parse_bbox() {
        let region = parse_bbox("-109.2,31.2,-102.8,37.2").unwrap();
        assert_eq!(region.min_lon, -109.2);
        assert_eq!(region.min_lat, 31.2);
        assert_eq!(region.max_lon, -102.8);
        assert_eq!(region.max_lat, 37.2);

        assert!(parse_bbox("1,2,3").is_err());
        assert!(parse_bbox("1,2,x,4").is_err());
        // min > max
        assert!(parse_bbox("10,0,0,10").is_err());
        assert!("0,0,10,10".parse::<Region>().is_ok());
    }

    #[test]
    fn test_region_json_aliases() {
        let region: Region =
            serde_json::from_str(r#"{"minLat": 1, "maxLat": 2, "minLon": 3, "maxLon": 4}"#)
                .unwrap();
        assert_eq!(region, Region::new(1.0, 2.0, 3.0, 4.0).unwrap());
    }

    #[test]
    fn test_grid_shape() {
        assert!(GridShape::new(0, 5).is_err());
        let shape = GridShape::new(4, 3).unwrap();
        assert_eq!(shape.cells(), 12);
        assert_eq!(shape.dim(), (3, 4));
    }
}
