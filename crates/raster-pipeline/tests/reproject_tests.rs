//! Tests for grid reprojection.
//!
//! Covers:
//! - Output grid covering the transformed extent
//! - Idempotence when the CRS does not change
//! - Exact category values under nearest-neighbour resampling
//! - Nodata fill outside the source footprint

use map_common::{CrsCode, DataType, PixelData};
use projection::{Transformer, DEFAULT_DENSIFY_POINTS};
use raster_pipeline::{default_output_grid, reproject, ResamplingMethod};
use test_utils::{assert_bbox_covers, create_class_grid, create_fraction_grid, fixtures};

// ============================================================================
// Output grid
// ============================================================================

#[test]
fn test_output_covers_transformed_extent() {
    let source = fixtures::single_band(60, 40, create_class_grid(60, 40, 8, &[1, 2, 3]), None);

    for target in [CrsCode::Epsg3857, CrsCode::Epsg4326, CrsCode::Epsg3112] {
        let out = reproject(&source, target, ResamplingMethod::Nearest).unwrap();
        let extent = Transformer::new(CrsCode::Epsg3577, target)
            .transform_bounds(&source.bounds(), DEFAULT_DENSIFY_POINTS)
            .unwrap();

        let res = out.transform().pixel_width;
        assert_bbox_covers!(out.bounds(), extent, res * 1e-5);
        assert_eq!(out.crs(), Some(target));
    }
}

#[test]
fn test_output_pixels_are_square() {
    let source = fixtures::single_band(30, 50, vec![1u8; 1500], None);
    let transformer = Transformer::new(CrsCode::Epsg3577, CrsCode::Epsg4326);
    let grid = default_output_grid(&source, &transformer).unwrap();

    assert!(grid.transform.is_north_up());
    assert_eq!(grid.transform.pixel_width, -grid.transform.pixel_height);
}

#[test]
fn test_output_pixel_count_close_to_source() {
    let source = fixtures::single_band(100, 100, vec![1u8; 10_000], None);
    let out = reproject(&source, CrsCode::Epsg3857, ResamplingMethod::Nearest).unwrap();

    // Resolution keeps the diagonal pixel count, so the total stays close
    let pixels = out.width() * out.height();
    assert!(pixels > 9_000, "{} pixels", pixels);
    assert!(pixels < 12_000, "{} pixels", pixels);
}

// ============================================================================
// Idempotence
// ============================================================================

#[test]
fn test_reproject_twice_is_stable() {
    let source = fixtures::single_band(25, 20, create_class_grid(25, 20, 4, &[1, 2]), Some(-1.0));

    let once = reproject(&source, CrsCode::Epsg3857, ResamplingMethod::Nearest).unwrap();
    let twice = reproject(&once, CrsCode::Epsg3857, ResamplingMethod::Nearest).unwrap();

    assert_eq!(twice.width(), once.width());
    assert_eq!(twice.height(), once.height());
    assert_eq!(twice.transform(), once.transform());
    assert_eq!(twice.data(), once.data());
}

// ============================================================================
// Sampling
// ============================================================================

#[test]
fn test_nearest_keeps_category_values() {
    let codes = [3i16, 7, 11, 42];
    let source = fixtures::single_band(40, 40, create_class_grid(40, 40, 5, &codes), Some(-1.0));
    let out = reproject(&source, CrsCode::Epsg4326, ResamplingMethod::Nearest).unwrap();

    assert_eq!(out.dtype(), DataType::I16);
    match out.data() {
        PixelData::I16(values) => {
            for v in values {
                assert!(codes.contains(v) || *v == -1, "unexpected value {}", v);
            }
            for code in codes {
                assert!(values.contains(&code), "class {} lost", code);
            }
        }
        other => panic!("unexpected datatype {}", other.dtype()),
    }
}

#[test]
fn test_outside_footprint_is_nodata_or_zero() {
    let source = fixtures::single_band(20, 20, vec![9u8; 400], None);
    let out = reproject(&source, CrsCode::Epsg3857, ResamplingMethod::Nearest).unwrap();
    let values = out.data().as_u8().unwrap();

    // No nodata declared: the corners of the rotated footprint are zero-filled
    assert!(values.iter().all(|v| *v == 9 || *v == 0));
    assert!(values.contains(&0));
    assert_eq!(out.nodata(), None);
}

#[test]
fn test_bilinear_stays_within_source_range() {
    let source = fixtures::single_band(30, 30, create_fraction_grid(30, 30), Some(-9999.0));
    let out = reproject(&source, CrsCode::Epsg3857, ResamplingMethod::Bilinear).unwrap();

    match out.data() {
        PixelData::F32(values) => {
            for v in values {
                assert!(*v == -9999.0 || (0.0..=1.0).contains(v), "value {}", v);
            }
        }
        other => panic!("unexpected datatype {}", other.dtype()),
    }
}

#[test]
fn test_multiband_rgba_reprojects_every_band() {
    let n = 16 * 16;
    let mut data = Vec::with_capacity(n * 4);
    for value in [200u8, 100, 50, 255] {
        data.extend(std::iter::repeat(value).take(n));
    }
    let source = map_common::RasterBuffer::new(
        16,
        16,
        4,
        PixelData::U8(data),
        fixtures::fixture_transform(),
        Some(CrsCode::Epsg3577),
    )
    .unwrap()
    .with_nodata(Some(0.0))
    .unwrap();

    let out = reproject(&source, CrsCode::Epsg3857, ResamplingMethod::Nearest).unwrap();
    assert_eq!(out.bands(), 4);

    let values = out.data().as_u8().unwrap();
    let n = out.pixels_per_band();
    for i in 0..n {
        let pixel = [values[i], values[n + i], values[2 * n + i], values[3 * n + i]];
        assert!(pixel == [200, 100, 50, 255] || pixel == [0, 0, 0, 0], "{:?}", pixel);
    }
}
