//! Lambert Conformal Conic projection (two standard parallels, ellipsoidal).
//!
//! It maps a cone secant to the ellipsoid onto a flat plane. The pipeline
//! uses it for EPSG:3112, GDA94 / Geoscience Australia Lambert.
//!
//! The projection parameters include:
//! - Latitude of origin (lat0)
//! - Central meridian (lon0)
//! - Standard parallels: lat1 and lat2 (can be equal for tangent cone)
//! - False easting and northing in meters
//!
//! Formulas follow Snyder (1987), pp. 107-109.

use std::f64::consts::PI;

use crate::ellipsoid::{normalize_radians, Ellipsoid};

/// Lambert Conformal Conic projection parameters.
#[derive(Debug, Clone)]
pub struct LambertConformal {
    /// Central meridian in radians
    pub lon0: f64,
    /// Latitude of origin in radians
    pub lat0: f64,
    /// First standard parallel in radians
    pub lat1: f64,
    /// Second standard parallel in radians
    pub lat2: f64,
    /// False easting (meters)
    pub false_easting: f64,
    /// False northing (meters)
    pub false_northing: f64,
    pub ellipsoid: Ellipsoid,
    /// Cone constant (n)
    n: f64,
    /// F constant
    f: f64,
    /// Rho at the latitude of origin
    rho0: f64,
}

impl LambertConformal {
    /// Create a projection from its defining parameters.
    ///
    /// # Arguments
    /// * `lat0_deg` - Latitude of origin (degrees)
    /// * `lon0_deg` - Central meridian (degrees)
    /// * `lat1_deg` - First standard parallel (degrees)
    /// * `lat2_deg` - Second standard parallel (degrees)
    /// * `false_easting` - False easting (meters)
    /// * `false_northing` - False northing (meters)
    /// * `ellipsoid` - Reference ellipsoid
    pub fn new(
        lat0_deg: f64,
        lon0_deg: f64,
        lat1_deg: f64,
        lat2_deg: f64,
        false_easting: f64,
        false_northing: f64,
        ellipsoid: Ellipsoid,
    ) -> Self {
        let lat0 = lat0_deg.to_radians();
        let lon0 = lon0_deg.to_radians();
        let lat1 = lat1_deg.to_radians();
        let lat2 = lat2_deg.to_radians();

        let m1 = ellipsoid.m(lat1);
        let m2 = ellipsoid.m(lat2);
        let t0 = ellipsoid.t(lat0);
        let t1 = ellipsoid.t(lat1);
        let t2 = ellipsoid.t(lat2);

        // Compute cone constant n
        let n = if (lat1 - lat2).abs() < 1e-10 {
            // Tangent cone (single standard parallel)
            lat1.sin()
        } else {
            // Secant cone (two standard parallels)
            (m1.ln() - m2.ln()) / (t1.ln() - t2.ln())
        };

        let f = m1 / (n * t1.powf(n));
        let rho0 = ellipsoid.a * f * t0.powf(n);

        Self {
            lon0,
            lat0,
            lat1,
            lat2,
            false_easting,
            false_northing,
            ellipsoid,
            n,
            f,
            rho0,
        }
    }

    /// EPSG:3112, GDA94 / Geoscience Australia Lambert.
    pub fn geoscience_australia() -> Self {
        Self::new(0.0, 134.0, -18.0, -36.0, 0.0, 0.0, Ellipsoid::GRS80)
    }

    /// Longitude/latitude in degrees to projected meters.
    ///
    /// None at the pole opposite the cone apex, where rho is unbounded.
    pub fn forward(&self, lon: f64, lat: f64) -> Option<(f64, f64)> {
        if !lon.is_finite() || !lat.is_finite() || lat.abs() > 90.0 {
            return None;
        }
        let phi = lat.to_radians();
        let dlon = normalize_radians(lon.to_radians() - self.lon0);

        let rho = self.ellipsoid.a * self.f * self.ellipsoid.t(phi).powf(self.n);
        if !rho.is_finite() {
            return None;
        }
        let theta = self.n * dlon;

        let x = rho * theta.sin() + self.false_easting;
        let y = self.rho0 - rho * theta.cos() + self.false_northing;
        Some((x, y))
    }

    /// Projected meters to longitude/latitude in degrees.
    pub fn inverse(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        if !x.is_finite() || !y.is_finite() {
            return None;
        }
        let x = x - self.false_easting;
        let dy = self.rho0 - (y - self.false_northing);

        let sign = self.n.signum();
        let rho = sign * (x * x + dy * dy).sqrt();
        let theta = (sign * x).atan2(sign * dy);

        if rho == 0.0 {
            // Cone apex
            return Some((self.lon0.to_degrees(), 90.0 * sign));
        }

        let t = (rho / (self.ellipsoid.a * self.f)).powf(1.0 / self.n);
        let e = self.ellipsoid.e();

        // Iterate Snyder eq. 7-9
        let mut phi = PI / 2.0 - 2.0 * t.atan();
        for _ in 0..15 {
            let s = phi.sin();
            let next = PI / 2.0 - 2.0 * (t * ((1.0 - e * s) / (1.0 + e * s)).powf(e / 2.0)).atan();
            let done = (next - phi).abs() < 1e-12;
            phi = next;
            if done {
                break;
            }
        }
        if !phi.is_finite() {
            return None;
        }

        let lon = normalize_radians(self.lon0 + theta / self.n);
        Some((lon.to_degrees(), phi.to_degrees()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_maps_to_zero() {
        let proj = LambertConformal::geoscience_australia();
        let (x, y) = proj.forward(134.0, 0.0).unwrap();
        assert!(x.abs() < 1e-6, "x should be ~0, got {}", x);
        assert!(y.abs() < 1e-6, "y should be ~0, got {}", y);
    }

    #[test]
    fn test_roundtrip() {
        let proj = LambertConformal::geoscience_australia();
        for (lon, lat) in [(115.86, -31.95), (149.13, -35.28), (130.84, -12.46), (147.33, -42.88)] {
            let (x, y) = proj.forward(lon, lat).unwrap();
            let (lon2, lat2) = proj.inverse(x, y).unwrap();
            assert!((lon - lon2).abs() < 1e-8, "lon roundtrip failed: {} vs {}", lon, lon2);
            assert!((lat - lat2).abs() < 1e-8, "lat roundtrip failed: {} vs {}", lat, lat2);
        }
    }

    #[test]
    fn test_canberra_quadrant() {
        let proj = LambertConformal::geoscience_australia();

        // Canberra is east of 134°E and well south of the equator
        let (x, y) = proj.forward(149.13, -35.28).unwrap();
        assert!(x > 1_000_000.0 && x < 1_700_000.0, "x = {}", x);
        assert!(y < -3_500_000.0 && y > -4_600_000.0, "y = {}", y);
    }

    #[test]
    fn test_north_pole_is_unprojectable() {
        // The apex of a southern cone is the south pole; the north pole is at infinity
        let proj = LambertConformal::geoscience_australia();
        assert!(proj.forward(134.0, 90.0).is_none());
    }
}
