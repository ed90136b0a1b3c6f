//! Bounding box types and operations.

use serde::{Deserialize, Serialize};

use crate::error::{MapError, MapResult};

/// A geographic or projected bounding box (left, bottom, right, top).
///
/// For geographic CRS (EPSG:4326), coordinates are in degrees.
/// For projected CRS (EPSG:3857, EPSG:3577, etc.), coordinates are in meters.
/// The CRS itself is carried by whoever owns the box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    /// Create a new bounding box from corner coordinates.
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Smallest box enclosing every point. Non-finite points are skipped.
    ///
    /// Returns None when no finite point was supplied.
    pub fn from_points(points: impl IntoIterator<Item = (f64, f64)>) -> Option<Self> {
        let mut bbox: Option<Self> = None;
        for (x, y) in points {
            if !x.is_finite() || !y.is_finite() {
                continue;
            }
            bbox = Some(match bbox {
                None => Self::new(x, y, x, y),
                Some(b) => Self::new(b.min_x.min(x), b.min_y.min(y), b.max_x.max(x), b.max_y.max(y)),
            });
        }
        bbox
    }

    /// Check that left < right and bottom < top with finite coordinates.
    pub fn validate(&self) -> MapResult<()> {
        let finite = [self.min_x, self.min_y, self.max_x, self.max_y]
            .iter()
            .all(|v| v.is_finite());
        if !finite {
            return Err(MapError::InvalidBbox(format!("non-finite coordinate in {:?}", self)));
        }
        if self.min_x >= self.max_x || self.min_y >= self.max_y {
            return Err(MapError::InvalidBbox(format!(
                "expected left < right and bottom < top, got {:?}",
                self
            )));
        }
        Ok(())
    }

    /// Width of the bounding box in coordinate units.
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Height of the bounding box in coordinate units.
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Centroid as (x, y).
    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    /// Check if `other` lies inside this bbox, allowing `tolerance` on each edge.
    pub fn covers(&self, other: &BoundingBox, tolerance: f64) -> bool {
        self.min_x <= other.min_x + tolerance
            && self.min_y <= other.min_y + tolerance
            && self.max_x >= other.max_x - tolerance
            && self.max_y >= other.max_y - tolerance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rejects_inverted() {
        assert!(BoundingBox::new(0.0, 0.0, 10.0, 10.0).validate().is_ok());
        assert!(BoundingBox::new(10.0, 0.0, 0.0, 10.0).validate().is_err());
        assert!(BoundingBox::new(0.0, 5.0, 10.0, 5.0).validate().is_err());
        assert!(BoundingBox::new(0.0, f64::NAN, 10.0, 5.0).validate().is_err());
    }

    #[test]
    fn test_covers_with_tolerance() {
        let outer = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        assert!(outer.covers(&BoundingBox::new(1.0, 1.0, 9.0, 9.0), 0.0));
        assert!(!outer.covers(&BoundingBox::new(-0.5, 1.0, 9.0, 9.0), 0.1));
        assert!(outer.covers(&BoundingBox::new(-0.05, 1.0, 10.05, 9.0), 0.1));
    }

    #[test]
    fn test_from_points_skips_non_finite() {
        let bbox = BoundingBox::from_points(vec![
            (1.0, 2.0),
            (f64::NAN, 100.0),
            (-3.0, 8.0),
            (f64::INFINITY, 0.0),
        ])
        .unwrap();
        assert_eq!(bbox, BoundingBox::new(-3.0, 2.0, 1.0, 8.0));
        assert!(BoundingBox::from_points(Vec::new()).is_none());
    }
}
