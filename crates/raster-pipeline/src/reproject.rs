//! Grid reprojection between coordinate reference systems.
//!
//! The output grid is chosen the way GDAL's default warp does: the source
//! extent is transformed with densified edges, pixels stay square, and the
//! output resolution keeps roughly the same number of pixels along the
//! diagonal as the source.

use map_common::raster::{Pixel, PixelVisitor};
use map_common::{BoundingBox, CrsCode, GeoTransform, MapError, MapResult, PixelData, RasterBuffer};
use projection::{Transformer, DEFAULT_DENSIFY_POINTS};
use tracing::{debug, info};

use crate::resampling::{bilinear_interpolate, nearest_index, ResamplingMethod};

/// Destination grid of a reprojection.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputGrid {
    pub width: usize,
    pub height: usize,
    pub transform: GeoTransform,
}

impl OutputGrid {
    pub fn bounds(&self) -> BoundingBox {
        self.transform.bounds(self.width, self.height)
    }
}

/// Compute the default output grid for warping `buffer` through `transformer`.
pub fn default_output_grid(buffer: &RasterBuffer, transformer: &Transformer) -> MapResult<OutputGrid> {
    let extent = transformer.transform_bounds(&buffer.bounds(), DEFAULT_DENSIFY_POINTS)?;

    let src_diagonal = ((buffer.width().pow(2) + buffer.height().pow(2)) as f64).sqrt();
    let dst_diagonal = (extent.width().powi(2) + extent.height().powi(2)).sqrt();
    let res = dst_diagonal / src_diagonal;
    if !res.is_finite() || res <= 0.0 {
        return Err(MapError::UnsupportedProjection(format!(
            "degenerate output resolution {} for extent {:?}",
            res, extent
        )));
    }

    let width = ((extent.width() / res - 1e-6).ceil() as usize).max(1);
    let height = ((extent.height() / res - 1e-6).ceil() as usize).max(1);

    Ok(OutputGrid {
        width,
        height,
        transform: GeoTransform::north_up(extent.min_x, extent.max_y, res, res),
    })
}

/// Reproject every band of `buffer` into `target_crs`.
///
/// Returns the buffer unchanged when it is already in `target_crs`.
/// Datatype, band count, nodata and compression hint are preserved.
pub fn reproject(
    buffer: &RasterBuffer,
    target_crs: CrsCode,
    resampling: ResamplingMethod,
) -> MapResult<RasterBuffer> {
    let src_crs = buffer.crs().ok_or_else(|| {
        MapError::UnsupportedProjection("source raster has no CRS defined".to_string())
    })?;

    let transformer = Transformer::new(src_crs, target_crs);
    if transformer.is_identity() {
        debug!(crs = %src_crs, target = %target_crs, "Reprojection skipped, CRS unchanged");
        return RasterBuffer::new(
            buffer.width(),
            buffer.height(),
            buffer.bands(),
            buffer.data().clone(),
            *buffer.transform(),
            Some(target_crs),
        )?
        .with_nodata(buffer.nodata())
        .map(|r| r.with_compression(buffer.compression()));
    }

    let grid = default_output_grid(buffer, &transformer)?;
    let positions = source_positions(buffer, &grid, &transformer.inverse())?;

    let data = buffer.data().visit(Warp {
        buffer,
        positions: &positions,
        resampling,
    })?;

    info!(
        src = %src_crs,
        dst = %target_crs,
        src_size = ?(buffer.width(), buffer.height()),
        dst_size = ?(grid.width, grid.height),
        resampling = %resampling,
        "Reprojected raster"
    );

    RasterBuffer::new(
        grid.width,
        grid.height,
        buffer.bands(),
        data,
        grid.transform,
        Some(target_crs),
    )?
    .with_nodata(buffer.nodata())
    .map(|r| r.with_compression(buffer.compression()))
}

/// Fractional source pixel position of every destination pixel centre.
fn source_positions(
    buffer: &RasterBuffer,
    grid: &OutputGrid,
    to_source: &Transformer,
) -> MapResult<Vec<Option<(f64, f64)>>> {
    let to_pixel = buffer.transform().inverse().ok_or_else(|| {
        MapError::InvalidRaster("source geotransform is not invertible".to_string())
    })?;

    let mut positions = Vec::with_capacity(grid.width * grid.height);
    for row in 0..grid.height {
        for col in 0..grid.width {
            let (x, y) = grid.transform.apply(col as f64 + 0.5, row as f64 + 0.5);
            positions.push(
                to_source
                    .transform_point(x, y)
                    .map(|(sx, sy)| to_pixel.apply(sx, sy)),
            );
        }
    }

    let hits = positions.iter().filter(|p| p.is_some()).count();
    debug!(
        pixels = positions.len(),
        projected = hits,
        "Computed source sample positions"
    );
    Ok(positions)
}

struct Warp<'a> {
    buffer: &'a RasterBuffer,
    positions: &'a [Option<(f64, f64)>],
    resampling: ResamplingMethod,
}

impl PixelVisitor for Warp<'_> {
    type Output = MapResult<PixelData>;

    fn visit<T: Pixel>(self, data: &[T]) -> MapResult<PixelData> {
        let (width, height) = (self.buffer.width(), self.buffer.height());
        let nodata = self.buffer.nodata();
        let fill = T::from_f64(nodata.unwrap_or(0.0)).ok_or_else(|| {
            MapError::InvalidRaster(format!("fill value cannot be stored as {}", T::DTYPE))
        })?;

        let n = self.buffer.pixels_per_band();
        let mut out = Vec::with_capacity(self.positions.len() * self.buffer.bands());

        for band in 0..self.buffer.bands() {
            let samples = &data[band * n..(band + 1) * n];
            // Widened copy for interpolation, only when needed
            let widened: Vec<f64> = match self.resampling {
                ResamplingMethod::Bilinear => samples
                    .iter()
                    .map(|v| v.to_f64().unwrap_or(f64::NAN))
                    .collect(),
                ResamplingMethod::Nearest => Vec::new(),
            };
            let is_valid = |v: f64| !v.is_nan() && nodata.map_or(true, |nd| v != nd);

            for position in self.positions {
                let Some((x, y)) = *position else {
                    out.push(fill);
                    continue;
                };
                let nearest = nearest_index(width, height, x, y).map(|i| samples[i]);

                let value = match self.resampling {
                    ResamplingMethod::Nearest => nearest,
                    ResamplingMethod::Bilinear => {
                        bilinear_interpolate(&widened, width, height, x, y, is_valid)
                            .and_then(|v| {
                                let v = if T::DTYPE.is_float() { v } else { v.round() };
                                T::from_f64(v)
                            })
                            // Nodata neighbours fall back to the containing pixel
                            .or(nearest)
                    }
                };
                out.push(value.unwrap_or(fill));
            }
        }

        Ok(T::wrap(out))
    }
}
