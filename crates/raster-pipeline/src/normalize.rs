//! Continuous (fractional) rasters to integer classes, and invalid-data masking.

use map_common::{DataType, MapError, MapResult, PixelData, RasterBuffer};
use tracing::{debug, warn};

/// Fractions are scaled to percent before truncation.
pub const DEFAULT_SCALE: f64 = 100.0;

/// Nodata sentinel of a normalized band.
pub const NORMALIZED_NODATA: i16 = i16::MIN;

/// Value marking invalid cells in a mask raster.
pub const DEFAULT_MASK_SENTINEL: f64 = -9999.0;

/// Scale a floating point band by 100 and truncate toward zero into `i16`.
pub fn normalize(buffer: &RasterBuffer, band: usize) -> MapResult<RasterBuffer> {
    normalize_scaled(buffer, band, DEFAULT_SCALE)
}

/// Like [`normalize`] with an explicit scale factor.
///
/// NaN, source nodata and scaled values outside `-32767..=32767` become
/// [`NORMALIZED_NODATA`].
pub fn normalize_scaled(buffer: &RasterBuffer, band: usize, scale: f64) -> MapResult<RasterBuffer> {
    if !buffer.dtype().is_float() {
        return Err(MapError::InvalidRaster(format!(
            "normalize requires floating point data, got {}",
            buffer.dtype()
        )));
    }
    if !scale.is_finite() || scale == 0.0 {
        return Err(MapError::Config(format!("invalid normalization scale {}", scale)));
    }
    if band == 0 {
        return Err(MapError::InvalidRaster("band numbers start at 1".to_string()));
    }

    let values = buffer.data().floats(buffer.band_range(band - 1)?);
    // f32 samples are compared against nodata at f32 precision
    let nodata = buffer.nodata().map(|nd| match buffer.dtype() {
        DataType::F32 => nd as f32 as f64,
        _ => nd,
    });
    let limit = i16::MAX as f64;

    let mut invalid = 0usize;
    let out: Vec<i16> = values
        .into_iter()
        .map(|v| {
            let is_nodata = v.is_nan() || nodata.is_some_and(|nd| v == nd);
            let scaled = (v * scale).trunc();
            if is_nodata || !(-limit..=limit).contains(&scaled) {
                invalid += 1;
                NORMALIZED_NODATA
            } else {
                scaled as i16
            }
        })
        .collect();

    debug!(
        width = buffer.width(),
        height = buffer.height(),
        scale = scale,
        nodata_pixels = invalid,
        "Normalized continuous band"
    );

    RasterBuffer::new(
        buffer.width(),
        buffer.height(),
        1,
        PixelData::I16(out),
        *buffer.transform(),
        buffer.crs(),
    )?
    .with_nodata(Some(NORMALIZED_NODATA as f64))
    .map(|r| r.with_compression(buffer.compression()))
}

/// Positions where band 1 of `mask` equals `invalid_sentinel`.
///
/// A NaN sentinel matches NaN mask values.
fn invalid_cells(target: &RasterBuffer, mask: &RasterBuffer, invalid_sentinel: f64) -> MapResult<Vec<bool>> {
    if !target.same_dimensions(mask) {
        return Err(MapError::DimensionMismatch {
            stage: "mask",
            expected: (target.width(), target.height()),
            actual: (mask.width(), mask.height()),
        });
    }
    if !target.transform().approx_eq(mask.transform(), 1e-9) {
        warn!(
            data = ?target.transform().to_gdal(),
            mask = ?mask.transform().to_gdal(),
            "Mask geotransform differs from data; masking by pixel position"
        );
    }

    Ok(mask
        .data()
        .floats(mask.band_range(0)?)
        .into_iter()
        .map(|v| {
            if invalid_sentinel.is_nan() {
                v.is_nan()
            } else {
                v == invalid_sentinel
            }
        })
        .collect())
}

/// Set cells of a normalized class band to [`NORMALIZED_NODATA`] where the mask is invalid.
///
/// Masked cells then take the transparent nodata route through expansion,
/// whatever class the data held.
pub fn mask_classes(classes: &RasterBuffer, mask: &RasterBuffer, invalid_sentinel: f64) -> MapResult<RasterBuffer> {
    let values = match classes.data() {
        PixelData::I16(d) if classes.bands() == 1 => d,
        _ => {
            return Err(MapError::InvalidRaster(format!(
                "class mask expects a single i16 band, got {} bands of {}",
                classes.bands(),
                classes.dtype()
            )))
        }
    };

    let invalid = invalid_cells(classes, mask, invalid_sentinel)?;
    let out: Vec<i16> = values
        .iter()
        .zip(&invalid)
        .map(|(v, hit)| if *hit { NORMALIZED_NODATA } else { *v })
        .collect();

    RasterBuffer::new(
        classes.width(),
        classes.height(),
        1,
        PixelData::I16(out),
        *classes.transform(),
        classes.crs(),
    )?
    .with_nodata(Some(NORMALIZED_NODATA as f64))
    .map(|r| r.with_compression(classes.compression()))
}

/// Make every RGBA pixel transparent where band 1 of `mask` equals `invalid_sentinel`.
///
/// A NaN sentinel matches NaN mask values.
pub fn mask_invalid(rgba: &RasterBuffer, mask: &RasterBuffer, invalid_sentinel: f64) -> MapResult<RasterBuffer> {
    let pixels = match rgba.data() {
        PixelData::U8(d) if rgba.bands() == 4 => d,
        _ => {
            return Err(MapError::InvalidRaster(format!(
                "mask expects a 4-band u8 raster, got {} bands of {}",
                rgba.bands(),
                rgba.dtype()
            )))
        }
    };

    let invalid = invalid_cells(rgba, mask, invalid_sentinel)?;
    let n = rgba.pixels_per_band();
    let mut out = pixels.clone();
    let mut masked = 0usize;

    for (i, _) in invalid.iter().enumerate().filter(|(_, hit)| **hit) {
        for band in 0..4 {
            out[band * n + i] = 0;
        }
        masked += 1;
    }

    debug!(masked = masked, sentinel = invalid_sentinel, "Applied invalid-data mask");

    RasterBuffer::new(
        rgba.width(),
        rgba.height(),
        4,
        PixelData::U8(out),
        *rgba.transform(),
        rgba.crs(),
    )?
    .with_nodata(rgba.nodata())
    .map(|r| r.with_compression(rgba.compression()))
}
