//! Output artifacts: GeoTIFF, PNG and the placement descriptor for web maps.

use std::path::Path;

use map_common::{BoundingBox, CrsCode, MapError, MapResult, RasterBuffer};
use projection::{Transformer, DEFAULT_DENSIFY_POINTS};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::png::encode_png;

pub use crate::geotiff::write_raster;

/// Where a styled image sits on a web map.
///
/// `corners` and `center` are in (y, x) order, i.e. (lat, lon) for a
/// geographic display CRS.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayPlacement {
    pub display_crs: CrsCode,
    pub display_bounds: BoundingBox,
    pub native_bounds: BoundingBox,
    /// `[[bottom, left], [top, right]]`
    pub corners: [[f64; 2]; 2],
    /// `[(bottom + top) / 2, (left + right) / 2]`
    pub center: [f64; 2],
}

impl DisplayPlacement {
    fn from_bounds(display_crs: CrsCode, display: BoundingBox, native: BoundingBox) -> Self {
        let (cx, cy) = display.center();
        Self {
            display_crs,
            display_bounds: display,
            native_bounds: native,
            corners: [[display.min_y, display.min_x], [display.max_y, display.max_x]],
            center: [cy, cx],
        }
    }
}

/// Write `buffer` as a PNG image at `path`.
pub fn write_image(buffer: &RasterBuffer, path: impl AsRef<Path>) -> MapResult<()> {
    let path = path.as_ref();
    let png = encode_png(buffer)?;
    std::fs::write(path, &png).map_err(|e| MapError::io(path.display().to_string(), e))?;

    debug!(
        path = %path.display(),
        width = buffer.width(),
        height = buffer.height(),
        bytes = png.len(),
        "Wrote PNG"
    );
    Ok(())
}

/// Compute where `buffer` lands when displayed in `display_crs`.
pub fn compute_display_bounds(buffer: &RasterBuffer, display_crs: CrsCode) -> MapResult<DisplayPlacement> {
    let src_crs = buffer.crs().ok_or_else(|| {
        MapError::UnsupportedProjection("raster has no CRS defined".to_string())
    })?;

    let native = buffer.bounds();
    let display = Transformer::new(src_crs, display_crs).transform_bounds(&native, DEFAULT_DENSIFY_POINTS)?;

    Ok(DisplayPlacement::from_bounds(display_crs, display, native))
}

#[cfg(test)]
mod tests {
    use super::*;
    use map_common::{GeoTransform, PixelData};

    #[test]
    fn test_placement_same_crs() {
        let buffer = RasterBuffer::new(
            4,
            2,
            1,
            PixelData::U8(vec![1; 8]),
            GeoTransform::north_up(140.0, -30.0, 1.0, 1.0),
            Some(CrsCode::Epsg4326),
        )
        .unwrap();

        let placement = compute_display_bounds(&buffer, CrsCode::Epsg4326).unwrap();
        assert_eq!(placement.native_bounds, BoundingBox::new(140.0, -32.0, 144.0, -30.0));
        assert_eq!(placement.corners, [[-32.0, 140.0], [-30.0, 144.0]]);
        assert_eq!(placement.center, [-31.0, 142.0]);
    }

    #[test]
    fn test_placement_requires_crs() {
        let buffer = RasterBuffer::new(
            1,
            1,
            1,
            PixelData::U8(vec![1]),
            GeoTransform::north_up(0.0, 1.0, 1.0, 1.0),
            None,
        )
        .unwrap();
        assert!(matches!(
            compute_display_bounds(&buffer, CrsCode::Epsg4326),
            Err(MapError::UnsupportedProjection(_))
        ));
    }

    #[test]
    fn test_placement_serializes() {
        let placement = DisplayPlacement::from_bounds(
            CrsCode::Epsg4326,
            BoundingBox::new(0.0, 0.0, 2.0, 4.0),
            BoundingBox::new(0.0, 0.0, 2.0, 4.0),
        );
        let json = serde_json::to_value(&placement).unwrap();
        assert_eq!(json["display_crs"], "EPSG:4326");
        assert_eq!(json["center"][0], 2.0);
        assert_eq!(json["center"][1], 1.0);
    }
}
