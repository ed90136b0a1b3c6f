//! Spherical ("Web") Mercator, EPSG:3857.
//!
//! Coordinates are meters on a sphere with the WGS84 semi-major axis as
//! radius. Latitudes are clamped to the square-world limit of ±85.0511°.

use std::f64::consts::PI;

/// Earth radius used by Web Mercator (meters)
pub const EARTH_RADIUS: f64 = 6_378_137.0;

/// Latitude at which the projected world becomes square.
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_59;

/// Half the projected world width, `π × R`.
pub const HALF_WORLD: f64 = PI * EARTH_RADIUS;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WebMercator {
    pub radius: f64,
}

impl Default for WebMercator {
    fn default() -> Self {
        Self {
            radius: EARTH_RADIUS,
        }
    }
}

impl WebMercator {
    /// Longitude/latitude in degrees to meters.
    pub fn forward(&self, lon: f64, lat: f64) -> Option<(f64, f64)> {
        if !lon.is_finite() || !lat.is_finite() || lat.abs() > 90.0 {
            return None;
        }
        let lat = lat.clamp(-MAX_LATITUDE, MAX_LATITUDE);

        let x = self.radius * lon.to_radians();
        let y = self.radius * (PI / 4.0 + lat.to_radians() / 2.0).tan().ln();
        Some((x, y))
    }

    /// Meters to longitude/latitude in degrees.
    pub fn inverse(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        if !x.is_finite() || !y.is_finite() {
            return None;
        }
        let lon = (x / self.radius).to_degrees();
        let lat = (2.0 * (y / self.radius).exp().atan() - PI / 2.0).to_degrees();
        Some((lon, lat))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_world_edges() {
        let merc = WebMercator::default();
        let (x, y) = merc.forward(180.0, MAX_LATITUDE).unwrap();
        assert!((x - 20_037_508.342_789_244).abs() < 1e-6, "x = {}", x);
        assert!((y - 20_037_508.342_789_244).abs() < 1e-3, "y = {}", y);
    }

    #[test]
    fn test_clamps_polar_latitude() {
        let merc = WebMercator::default();
        let (_, y_pole) = merc.forward(0.0, 90.0).unwrap();
        let (_, y_max) = merc.forward(0.0, MAX_LATITUDE).unwrap();
        assert_eq!(y_pole, y_max);
    }

    #[test]
    fn test_roundtrip() {
        let merc = WebMercator::default();
        let (x, y) = merc.forward(151.2093, -33.8688).unwrap();
        let (lon, lat) = merc.inverse(x, y).unwrap();
        assert!((lon - 151.2093).abs() < 1e-9);
        assert!((lat + 33.8688).abs() < 1e-9);
    }
}
