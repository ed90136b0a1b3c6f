//! Geographic "projection": x is longitude, y is latitude, both in degrees.

/// Plate carrée identity mapping with range checks.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Geographic;

impl Geographic {
    /// Longitude/latitude to (x, y). None for latitudes beyond the poles.
    pub fn forward(&self, lon: f64, lat: f64) -> Option<(f64, f64)> {
        if !lon.is_finite() || !lat.is_finite() || lat.abs() > 90.0 {
            return None;
        }
        Some((lon, lat))
    }

    /// (x, y) back to longitude/latitude.
    pub fn inverse(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        self.forward(x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity() {
        assert_eq!(Geographic.forward(150.5, -33.9), Some((150.5, -33.9)));
        assert_eq!(Geographic.inverse(-96.0, 23.0), Some((-96.0, 23.0)));
    }

    #[test]
    fn test_rejects_beyond_pole() {
        assert_eq!(Geographic.forward(0.0, 90.5), None);
        assert_eq!(Geographic.forward(f64::NAN, 0.0), None);
    }
}
