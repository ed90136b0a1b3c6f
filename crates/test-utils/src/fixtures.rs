//! Common test fixtures for land-use styling tests.
//!
//! This module provides pre-defined grids, rasters and palettes that
//! represent common scenarios in land-use map processing.

use map_common::raster::Pixel;
use map_common::{ColorTable, CrsCode, GeoTransform, RasterBuffer, Rgba};

/// Top-left corner of the fixture grid in EPSG:3577 meters.
pub const FIXTURE_ORIGIN: (f64, f64) = (1_000_000.0, -3_600_000.0);

/// Pixel size of the fixture grid in meters.
pub const FIXTURE_RESOLUTION: f64 = 1_000.0;

/// North-up transform for the fixture grid.
pub fn fixture_transform() -> GeoTransform {
    GeoTransform::north_up(
        FIXTURE_ORIGIN.0,
        FIXTURE_ORIGIN.1,
        FIXTURE_RESOLUTION,
        FIXTURE_RESOLUTION,
    )
}

/// Wrap a single band of samples as an EPSG:3577 raster on the fixture grid.
///
/// # Panics
///
/// Panics if the data length does not match the shape or the nodata value
/// does not fit the sample type.
pub fn single_band<T: Pixel>(
    width: usize,
    height: usize,
    data: Vec<T>,
    nodata: Option<f64>,
) -> RasterBuffer {
    RasterBuffer::new(
        width,
        height,
        1,
        T::wrap(data),
        fixture_transform(),
        Some(CrsCode::Epsg3577),
    )
    .and_then(|r| r.with_nodata(nodata))
    .expect("fixture raster should be valid")
}

/// The same samples on a geographic grid with 0.01° pixels.
pub fn single_band_geographic<T: Pixel>(
    width: usize,
    height: usize,
    data: Vec<T>,
    nodata: Option<f64>,
) -> RasterBuffer {
    RasterBuffer::new(
        width,
        height,
        1,
        T::wrap(data),
        GeoTransform::north_up(145.0, -35.0, 0.01, 0.01),
        Some(CrsCode::Epsg4283),
    )
    .and_then(|r| r.with_nodata(nodata))
    .expect("fixture raster should be valid")
}

/// Scratch directory for files written by a test; removed on drop.
pub fn scratch_dir() -> tempfile::TempDir {
    tempfile::tempdir().expect("failed to create temp dir")
}

/// Colors for a reduced land-use classification.
///
/// | code | class |
/// |------|-------|
/// | 1    | dryland cropping |
/// | 2    | irrigated cropping |
/// | 3    | grazing |
/// | 4    | conservation |
pub fn land_use_colors() -> ColorTable {
    ColorTable::new()
        .with_entry(1, Rgba::new(0xE6, 0xCE, 0x9C, 255))
        .with_entry(2, Rgba::new(0x4D, 0xA6, 0xFF, 255))
        .with_entry(3, Rgba::new(0x76, 0xA6, 0x65, 255))
        .with_entry(4, Rgba::new(0x1B, 0x5E, 0x20, 255))
}

/// Palette JSON matching [`land_use_colors`].
pub const LAND_USE_PALETTE_JSON: &str = r##"{
    "name": "land-use",
    "entries": [
        {"code": 1, "color": "#E6CE9C", "description": "Dryland cropping"},
        {"code": 2, "color": "#4DA6FF", "description": "Irrigated cropping"},
        {"code": 3, "color": "#76A665", "description": "Grazing"},
        {"code": 4, "color": "#1B5E20", "description": "Conservation"}
    ]
}"##;
