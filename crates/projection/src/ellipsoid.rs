//! Reference ellipsoids and the auxiliary functions shared by the conic
//! projections (Snyder, "Map Projections: A Working Manual", 1987).

use std::f64::consts::PI;

/// Reference ellipsoid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ellipsoid {
    /// Semi-major axis (meters)
    pub a: f64,
    /// Flattening
    pub f: f64,
}

impl Ellipsoid {
    /// GRS 1980, used by GDA94, GDA2020 and NAD83.
    pub const GRS80: Ellipsoid = Ellipsoid {
        a: 6_378_137.0,
        f: 1.0 / 298.257_222_101,
    };

    /// WGS 84.
    pub const WGS84: Ellipsoid = Ellipsoid {
        a: 6_378_137.0,
        f: 1.0 / 298.257_223_563,
    };

    /// Square of the first eccentricity.
    pub fn e2(&self) -> f64 {
        2.0 * self.f - self.f * self.f
    }

    /// First eccentricity.
    pub fn e(&self) -> f64 {
        self.e2().sqrt()
    }

    /// Snyder's `m`: cos φ / sqrt(1 - e² sin² φ).
    pub fn m(&self, phi: f64) -> f64 {
        let s = phi.sin();
        phi.cos() / (1.0 - self.e2() * s * s).sqrt()
    }

    /// Snyder's `q`, the authalic function used by equal-area projections.
    pub fn q(&self, phi: f64) -> f64 {
        let e = self.e();
        let e2 = self.e2();
        let s = phi.sin();
        (1.0 - e2) * (s / (1.0 - e2 * s * s) - (1.0 / (2.0 * e)) * ((1.0 - e * s) / (1.0 + e * s)).ln())
    }

    /// Snyder's `t`, the conformal function used by Lambert and Mercator.
    pub fn t(&self, phi: f64) -> f64 {
        let e = self.e();
        let s = phi.sin();
        (PI / 4.0 - phi / 2.0).tan() / ((1.0 - e * s) / (1.0 + e * s)).powf(e / 2.0)
    }
}

/// Wrap an angle in radians into [-π, π].
pub fn normalize_radians(mut angle: f64) -> f64 {
    while angle > PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}
