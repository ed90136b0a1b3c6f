//! CRS to CRS point and bounds transformation.

use map_common::{BoundingBox, CrsCode, MapError, MapResult};
use tracing::debug;

use crate::albers::AlbersEqualArea;
use crate::geographic::Geographic;
use crate::lambert::LambertConformal;
use crate::mercator::WebMercator;

/// Points sampled along each edge when transforming a bounding box.
pub const DEFAULT_DENSIFY_POINTS: usize = 21;

/// A concrete projection for one supported CRS.
#[derive(Debug, Clone)]
pub enum Projection {
    Geographic(Geographic),
    WebMercator(WebMercator),
    Albers(AlbersEqualArea),
    Lambert(LambertConformal),
}

impl Projection {
    pub fn for_crs(crs: CrsCode) -> Self {
        match crs {
            CrsCode::Epsg4326 | CrsCode::Epsg4269 | CrsCode::Epsg4283 | CrsCode::Epsg7844 => {
                Projection::Geographic(Geographic)
            }
            CrsCode::Epsg3857 => Projection::WebMercator(WebMercator::default()),
            CrsCode::Epsg3577 => Projection::Albers(AlbersEqualArea::australian()),
            CrsCode::Epsg5070 => Projection::Albers(AlbersEqualArea::conus()),
            CrsCode::Epsg3112 => Projection::Lambert(LambertConformal::geoscience_australia()),
        }
    }

    /// Longitude/latitude (degrees) to CRS coordinates.
    pub fn forward(&self, lon: f64, lat: f64) -> Option<(f64, f64)> {
        match self {
            Projection::Geographic(p) => p.forward(lon, lat),
            Projection::WebMercator(p) => p.forward(lon, lat),
            Projection::Albers(p) => p.forward(lon, lat),
            Projection::Lambert(p) => p.forward(lon, lat),
        }
    }

    /// CRS coordinates to longitude/latitude (degrees).
    pub fn inverse(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        match self {
            Projection::Geographic(p) => p.inverse(x, y),
            Projection::WebMercator(p) => p.inverse(x, y),
            Projection::Albers(p) => p.inverse(x, y),
            Projection::Lambert(p) => p.inverse(x, y),
        }
    }
}

/// Converts coordinates from one CRS to another through longitude/latitude.
#[derive(Debug, Clone)]
pub struct Transformer {
    src_crs: CrsCode,
    dst_crs: CrsCode,
    src: Projection,
    dst: Projection,
    identity: bool,
}

impl Transformer {
    pub fn new(src_crs: CrsCode, dst_crs: CrsCode) -> Self {
        // Geographic codes share one datum for our purposes
        let identity =
            src_crs == dst_crs || (src_crs.is_geographic() && dst_crs.is_geographic());
        Self {
            src_crs,
            dst_crs,
            src: Projection::for_crs(src_crs),
            dst: Projection::for_crs(dst_crs),
            identity,
        }
    }

    pub fn src_crs(&self) -> CrsCode {
        self.src_crs
    }

    pub fn dst_crs(&self) -> CrsCode {
        self.dst_crs
    }

    pub fn is_identity(&self) -> bool {
        self.identity
    }

    /// The transformer for the opposite direction.
    pub fn inverse(&self) -> Transformer {
        Transformer::new(self.dst_crs, self.src_crs)
    }

    /// Transform one point. None when it cannot be represented in the target CRS.
    pub fn transform_point(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        if self.identity {
            return (x.is_finite() && y.is_finite()).then_some((x, y));
        }
        let (lon, lat) = self.src.inverse(x, y)?;
        let (tx, ty) = self.dst.forward(lon, lat)?;
        (tx.is_finite() && ty.is_finite()).then_some((tx, ty))
    }

    /// Transform a bounding box, sampling `densify_points` points along each edge.
    ///
    /// The result encloses every sampled point that could be projected.
    pub fn transform_bounds(&self, bbox: &BoundingBox, densify_points: usize) -> MapResult<BoundingBox> {
        bbox.validate()?;
        if self.identity {
            return Ok(*bbox);
        }

        let steps = densify_points.max(2) - 1;
        let mut samples = Vec::with_capacity(4 * (steps + 1));
        for i in 0..=steps {
            let t = i as f64 / steps as f64;
            let x = bbox.min_x + t * bbox.width();
            let y = bbox.min_y + t * bbox.height();
            samples.push((x, bbox.min_y));
            samples.push((x, bbox.max_y));
            samples.push((bbox.min_x, y));
            samples.push((bbox.max_x, y));
        }

        let total = samples.len();
        let projected: Vec<(f64, f64)> = samples
            .into_iter()
            .filter_map(|(x, y)| self.transform_point(x, y))
            .collect();

        debug!(
            src = %self.src_crs,
            dst = %self.dst_crs,
            sampled = total,
            projected = projected.len(),
            "Transformed bounds"
        );

        BoundingBox::from_points(projected.into_iter())
            .filter(|b| b.width() > 0.0 && b.height() > 0.0)
            .ok_or_else(|| {
                MapError::UnsupportedProjection(format!(
                    "bounds {:?} cannot be transformed from {} to {}",
                    bbox, self.src_crs, self.dst_crs
                ))
            })
    }
}
