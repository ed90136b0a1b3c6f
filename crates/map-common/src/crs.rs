//! Coordinate Reference System types and utilities.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::MapError;

/// Well-known CRS codes supported by the pipeline.
///
/// Geographic codes on GRS80/WGS84-compatible datums are treated as
/// interchangeable; the sub-metre datum shifts between them are below the
/// resolution of the land-use rasters this pipeline styles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CrsCode {
    /// WGS84 Geographic (lat/lon in degrees)
    Epsg4326,
    /// NAD83 Geographic
    Epsg4269,
    /// GDA94 Geographic
    Epsg4283,
    /// GDA2020 Geographic
    Epsg7844,
    /// Web Mercator (meters)
    Epsg3857,
    /// GDA94 / Australian Albers
    Epsg3577,
    /// NAD83 / CONUS Albers
    Epsg5070,
    /// GDA94 / Geoscience Australia Lambert
    Epsg3112,
}

impl CrsCode {
    /// Look up a CRS by its EPSG number.
    pub fn from_epsg(code: u32) -> Result<Self, MapError> {
        match code {
            4326 => Ok(CrsCode::Epsg4326),
            4269 => Ok(CrsCode::Epsg4269),
            4283 => Ok(CrsCode::Epsg4283),
            7844 => Ok(CrsCode::Epsg7844),
            3857 | 900913 | 3785 => Ok(CrsCode::Epsg3857),
            3577 => Ok(CrsCode::Epsg3577),
            5070 => Ok(CrsCode::Epsg5070),
            3112 => Ok(CrsCode::Epsg3112),
            other => Err(MapError::UnsupportedProjection(format!("EPSG:{}", other))),
        }
    }

    /// Parse a CRS string.
    ///
    /// Accepts formats like:
    /// - "EPSG:4326"
    /// - "epsg:3857"
    /// - "3577"
    /// - "CRS:84" (equivalent to EPSG:4326)
    pub fn parse(s: &str) -> Result<Self, MapError> {
        let normalized = s.trim().to_uppercase();
        if normalized == "CRS:84" {
            return Ok(CrsCode::Epsg4326);
        }

        let digits = normalized.strip_prefix("EPSG:").unwrap_or(&normalized);
        let code: u32 = digits
            .parse()
            .map_err(|_| MapError::UnsupportedProjection(s.to_string()))?;
        Self::from_epsg(code)
    }

    /// The EPSG number of this CRS.
    pub fn epsg(&self) -> u32 {
        match self {
            CrsCode::Epsg4326 => 4326,
            CrsCode::Epsg4269 => 4269,
            CrsCode::Epsg4283 => 4283,
            CrsCode::Epsg7844 => 7844,
            CrsCode::Epsg3857 => 3857,
            CrsCode::Epsg3577 => 3577,
            CrsCode::Epsg5070 => 5070,
            CrsCode::Epsg3112 => 3112,
        }
    }

    /// Check if this is a geographic (lat/lon) CRS.
    pub fn is_geographic(&self) -> bool {
        matches!(
            self,
            CrsCode::Epsg4326 | CrsCode::Epsg4269 | CrsCode::Epsg4283 | CrsCode::Epsg7844
        )
    }
}

impl fmt::Display for CrsCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.epsg())
    }
}

impl FromStr for CrsCode {
    type Err = MapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for CrsCode {
    type Error = MapError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CrsCode> for String {
    fn from(code: CrsCode) -> Self {
        code.to_string()
    }
}
