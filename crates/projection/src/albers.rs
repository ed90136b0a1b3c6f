//! Albers Equal-Area Conic projection on an ellipsoid.
//!
//! Used for continental land-use grids, where preserving area matters more
//! than preserving shape:
//! - EPSG:3577 GDA94 / Australian Albers
//! - EPSG:5070 NAD83 / Conus Albers
//!
//! Formulas follow Snyder (1987), pp. 101-102.

use std::f64::consts::PI;

use crate::ellipsoid::{normalize_radians, Ellipsoid};

/// Albers Equal-Area Conic projection parameters.
#[derive(Debug, Clone)]
pub struct AlbersEqualArea {
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
    /// Cone constant
    n: f64,
    /// Snyder's C
    c: f64,
    /// Rho at the latitude of origin
    rho0: f64,
    /// q at the pole
    qp: f64,
}

impl AlbersEqualArea {
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
        let q0 = ellipsoid.q(lat0);
        let q1 = ellipsoid.q(lat1);
        let q2 = ellipsoid.q(lat2);

        let n = if (lat1 - lat2).abs() < 1e-10 {
            // Single standard parallel
            lat1.sin()
        } else {
            (m1 * m1 - m2 * m2) / (q2 - q1)
        };
        let c = m1 * m1 + n * q1;
        let rho0 = ellipsoid.a * (c - n * q0).sqrt() / n;
        let qp = ellipsoid.q(PI / 2.0);

        Self {
            lon0,
            lat0,
            lat1,
            lat2,
            false_easting,
            false_northing,
            ellipsoid,
            n,
            c,
            rho0,
            qp,
        }
    }

    /// EPSG:3577, GDA94 / Australian Albers.
    pub fn australian() -> Self {
        Self::new(0.0, 132.0, -18.0, -36.0, 0.0, 0.0, Ellipsoid::GRS80)
    }

    /// EPSG:5070, NAD83 / Conus Albers.
    pub fn conus() -> Self {
        Self::new(23.0, -96.0, 29.5, 45.5, 0.0, 0.0, Ellipsoid::GRS80)
    }

    /// Longitude/latitude in degrees to projected meters.
    pub fn forward(&self, lon: f64, lat: f64) -> Option<(f64, f64)> {
        if !lon.is_finite() || !lat.is_finite() || lat.abs() > 90.0 {
            return None;
        }
        let phi = lat.to_radians();
        let dlon = normalize_radians(lon.to_radians() - self.lon0);

        let q = self.ellipsoid.q(phi);
        let inner = self.c - self.n * q;
        if inner < 0.0 {
            return None;
        }
        let rho = self.ellipsoid.a * inner.sqrt() / self.n;
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

        let a = self.ellipsoid.a;
        let q = (self.c - rho * rho * self.n * self.n / (a * a)) / self.n;

        let phi = if q.abs() > self.qp + 1e-9 {
            return None;
        } else if q.abs() >= self.qp - 1e-12 {
            PI / 2.0 * q.signum()
        } else {
            self.authalic_inverse(q)?
        };

        let lon = normalize_radians(self.lon0 + theta / self.n);
        Some((lon.to_degrees(), phi.to_degrees()))
    }

    /// Iterate Snyder eq. 3-16 for the latitude whose q equals `q`.
    fn authalic_inverse(&self, q: f64) -> Option<f64> {
        let e = self.ellipsoid.e();
        let e2 = self.ellipsoid.e2();

        let mut phi = (q / 2.0).asin();
        for _ in 0..15 {
            let s = phi.sin();
            let one_minus = 1.0 - e2 * s * s;
            let delta = one_minus * one_minus / (2.0 * phi.cos())
                * (q / (1.0 - e2) - s / one_minus
                    + (1.0 / (2.0 * e)) * ((1.0 - e * s) / (1.0 + e * s)).ln());
            phi += delta;
            if delta.abs() < 1e-12 {
                return Some(phi);
            }
        }
        phi.is_finite().then_some(phi)
    }
}
