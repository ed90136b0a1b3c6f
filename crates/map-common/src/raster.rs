//! In-memory raster representation passed between pipeline stages.
//!
//! Pixels are stored band-major: band 0 occupies `[0, width * height)`,
//! band 1 the next `width * height` samples, and so on. Each row runs
//! left-to-right, rows run top-to-bottom.

use num_traits::{NumCast, ToPrimitive};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;

use crate::bbox::BoundingBox;
use crate::crs::CrsCode;
use crate::error::{MapError, MapResult};

/// Per-pixel sample type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    U8,
    I8,
    U16,
    I16,
    I32,
    F32,
    F64,
}

impl DataType {
    pub fn name(&self) -> &'static str {
        match self {
            DataType::U8 => "u8",
            DataType::I8 => "i8",
            DataType::U16 => "u16",
            DataType::I16 => "i16",
            DataType::I32 => "i32",
            DataType::F32 => "f32",
            DataType::F64 => "f64",
        }
    }

    pub fn is_float(&self) -> bool {
        matches!(self, DataType::F32 | DataType::F64)
    }

    /// Check that `value` can be stored in this type without loss.
    pub fn can_represent(&self, value: f64) -> bool {
        match self {
            DataType::U8 => fits_integer::<u8>(value),
            DataType::I8 => fits_integer::<i8>(value),
            DataType::U16 => fits_integer::<u16>(value),
            DataType::I16 => fits_integer::<i16>(value),
            DataType::I32 => fits_integer::<i32>(value),
            DataType::F32 => value.is_nan() || value.is_infinite() || value.abs() <= f32::MAX as f64,
            DataType::F64 => true,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn fits_integer<T: NumCast>(value: f64) -> bool {
    value.fract() == 0.0 && <T as NumCast>::from(value).is_some()
}

/// A sample type that can live in a [`PixelData`] buffer.
pub trait Pixel: Copy + PartialEq + NumCast + ToPrimitive + fmt::Debug + 'static {
    const DTYPE: DataType;

    /// Move a typed vector into the matching [`PixelData`] variant.
    fn wrap(data: Vec<Self>) -> PixelData;

    /// Convert from f64, or None when the value does not fit.
    fn from_f64(value: f64) -> Option<Self> {
        <Self as NumCast>::from(value)
    }
}

macro_rules! impl_pixel {
    ($ty:ty, $variant:ident) => {
        impl Pixel for $ty {
            const DTYPE: DataType = DataType::$variant;

            fn wrap(data: Vec<Self>) -> PixelData {
                PixelData::$variant(data)
            }
        }
    };
}

impl_pixel!(u8, U8);
impl_pixel!(i8, I8);
impl_pixel!(u16, U16);
impl_pixel!(i16, I16);
impl_pixel!(i32, I32);
impl_pixel!(f32, F32);
impl_pixel!(f64, F64);

/// Operation generic over the sample type of a [`PixelData`] buffer.
pub trait PixelVisitor {
    type Output;

    fn visit<T: Pixel>(self, data: &[T]) -> Self::Output;
}

/// Typed sample storage.
#[derive(Debug, Clone, PartialEq)]
pub enum PixelData {
    U8(Vec<u8>),
    I8(Vec<i8>),
    U16(Vec<u16>),
    I16(Vec<i16>),
    I32(Vec<i32>),
    F32(Vec<f32>),
    F64(Vec<f64>),
}

impl PixelData {
    pub fn dtype(&self) -> DataType {
        match self {
            PixelData::U8(_) => DataType::U8,
            PixelData::I8(_) => DataType::I8,
            PixelData::U16(_) => DataType::U16,
            PixelData::I16(_) => DataType::I16,
            PixelData::I32(_) => DataType::I32,
            PixelData::F32(_) => DataType::F32,
            PixelData::F64(_) => DataType::F64,
        }
    }

    /// Dispatch `visitor` on the concrete sample slice.
    pub fn visit<V: PixelVisitor>(&self, visitor: V) -> V::Output {
        match self {
            PixelData::U8(d) => visitor.visit(d),
            PixelData::I8(d) => visitor.visit(d),
            PixelData::U16(d) => visitor.visit(d),
            PixelData::I16(d) => visitor.visit(d),
            PixelData::I32(d) => visitor.visit(d),
            PixelData::F32(d) => visitor.visit(d),
            PixelData::F64(d) => visitor.visit(d),
        }
    }

    pub fn len(&self) -> usize {
        struct Len;
        impl PixelVisitor for Len {
            type Output = usize;
            fn visit<T: Pixel>(self, data: &[T]) -> usize {
                data.len()
            }
        }
        self.visit(Len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Samples in `range` widened to i64. None for floating point data.
    pub fn integers(&self, range: Range<usize>) -> Option<Vec<i64>> {
        struct Integers(Range<usize>);
        impl PixelVisitor for Integers {
            type Output = Option<Vec<i64>>;
            fn visit<T: Pixel>(self, data: &[T]) -> Option<Vec<i64>> {
                if T::DTYPE.is_float() {
                    return None;
                }
                data[self.0].iter().map(|v| v.to_i64()).collect()
            }
        }
        self.visit(Integers(range))
    }

    /// Samples in `range` widened to f64.
    pub fn floats(&self, range: Range<usize>) -> Vec<f64> {
        struct Floats(Range<usize>);
        impl PixelVisitor for Floats {
            type Output = Vec<f64>;
            fn visit<T: Pixel>(self, data: &[T]) -> Vec<f64> {
                data[self.0]
                    .iter()
                    .map(|v| v.to_f64().unwrap_or(f64::NAN))
                    .collect()
            }
        }
        self.visit(Floats(range))
    }

    /// Borrow the samples when the data is `u8`.
    pub fn as_u8(&self) -> Option<&[u8]> {
        match self {
            PixelData::U8(d) => Some(d),
            _ => None,
        }
    }
}

/// Compression applied when the buffer is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompressionHint {
    None,
    #[default]
    Lzw,
    Deflate,
}

impl CompressionHint {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "none" | "uncompressed" => Some(Self::None),
            "lzw" => Some(Self::Lzw),
            "deflate" | "zlib" => Some(Self::Deflate),
            _ => None,
        }
    }
}

/// Affine pixel → world mapping, in GDAL coefficient order.
///
/// `x = origin_x + col * pixel_width + row * row_rotation`
/// `y = origin_y + col * column_rotation + row * pixel_height`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    pub origin_x: f64,
    pub pixel_width: f64,
    pub row_rotation: f64,
    pub origin_y: f64,
    pub column_rotation: f64,
    pub pixel_height: f64,
}

impl GeoTransform {
    /// North-up transform with the top-left corner at (`left`, `top`).
    ///
    /// `res_y` is given as a positive size; the stored pixel height is negative.
    pub fn north_up(left: f64, top: f64, res_x: f64, res_y: f64) -> Self {
        Self {
            origin_x: left,
            pixel_width: res_x,
            row_rotation: 0.0,
            origin_y: top,
            column_rotation: 0.0,
            pixel_height: -res_y.abs(),
        }
    }

    pub fn from_gdal(c: [f64; 6]) -> Self {
        Self {
            origin_x: c[0],
            pixel_width: c[1],
            row_rotation: c[2],
            origin_y: c[3],
            column_rotation: c[4],
            pixel_height: c[5],
        }
    }

    pub fn to_gdal(&self) -> [f64; 6] {
        [
            self.origin_x,
            self.pixel_width,
            self.row_rotation,
            self.origin_y,
            self.column_rotation,
            self.pixel_height,
        ]
    }

    pub fn is_north_up(&self) -> bool {
        self.row_rotation == 0.0 && self.column_rotation == 0.0
    }

    /// World coordinate of fractional pixel position (`col`, `row`).
    pub fn apply(&self, col: f64, row: f64) -> (f64, f64) {
        (
            self.origin_x + col * self.pixel_width + row * self.row_rotation,
            self.origin_y + col * self.column_rotation + row * self.pixel_height,
        )
    }

    /// The world → pixel transform, or None for a singular matrix.
    pub fn inverse(&self) -> Option<GeoTransform> {
        let det = self.pixel_width * self.pixel_height - self.row_rotation * self.column_rotation;
        if det.abs() < 1e-15 || !det.is_finite() {
            return None;
        }

        let a = self.pixel_height / det;
        let b = -self.row_rotation / det;
        let d = -self.column_rotation / det;
        let e = self.pixel_width / det;

        Some(GeoTransform {
            origin_x: -(a * self.origin_x + b * self.origin_y),
            pixel_width: a,
            row_rotation: b,
            origin_y: -(d * self.origin_x + e * self.origin_y),
            column_rotation: d,
            pixel_height: e,
        })
    }

    /// Extent covered by a `width` × `height` grid.
    pub fn bounds(&self, width: usize, height: usize) -> BoundingBox {
        let (w, h) = (width as f64, height as f64);
        let corners = [
            self.apply(0.0, 0.0),
            self.apply(w, 0.0),
            self.apply(0.0, h),
            self.apply(w, h),
        ];
        let min_x = corners.iter().map(|c| c.0).fold(f64::INFINITY, f64::min);
        let max_x = corners.iter().map(|c| c.0).fold(f64::NEG_INFINITY, f64::max);
        let min_y = corners.iter().map(|c| c.1).fold(f64::INFINITY, f64::min);
        let max_y = corners.iter().map(|c| c.1).fold(f64::NEG_INFINITY, f64::max);
        BoundingBox::new(min_x, min_y, max_x, max_y)
    }

    /// Approximate equality, coefficient by coefficient.
    pub fn approx_eq(&self, other: &GeoTransform, tolerance: f64) -> bool {
        self.to_gdal()
            .iter()
            .zip(other.to_gdal().iter())
            .all(|(a, b)| (a - b).abs() <= tolerance)
    }
}

/// The unit of data handed from one pipeline stage to the next.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterBuffer {
    width: usize,
    height: usize,
    bands: usize,
    data: PixelData,
    nodata: Option<f64>,
    transform: GeoTransform,
    crs: Option<CrsCode>,
    compression: CompressionHint,
}

impl RasterBuffer {
    /// Create a buffer, checking that the sample count matches the shape.
    pub fn new(
        width: usize,
        height: usize,
        bands: usize,
        data: PixelData,
        transform: GeoTransform,
        crs: Option<CrsCode>,
    ) -> MapResult<Self> {
        if width == 0 || height == 0 || bands == 0 {
            return Err(MapError::InvalidRaster(format!(
                "zero-sized raster: {}x{} with {} bands",
                width, height, bands
            )));
        }
        let expected = width * height * bands;
        if data.len() != expected {
            return Err(MapError::InvalidRaster(format!(
                "{} samples do not match {} bands of {}x{} ({} expected)",
                data.len(),
                bands,
                width,
                height,
                expected
            )));
        }
        if transform.inverse().is_none() {
            return Err(MapError::InvalidRaster(format!(
                "geotransform is not invertible: {:?}",
                transform.to_gdal()
            )));
        }

        Ok(Self {
            width,
            height,
            bands,
            data,
            nodata: None,
            transform,
            crs,
            compression: CompressionHint::default(),
        })
    }

    /// Declare the nodata sentinel; it must be representable in the datatype.
    pub fn with_nodata(mut self, nodata: Option<f64>) -> MapResult<Self> {
        if let Some(value) = nodata {
            if !self.dtype().can_represent(value) {
                return Err(MapError::InvalidRaster(format!(
                    "nodata {} cannot be stored as {}",
                    value,
                    self.dtype()
                )));
            }
        }
        self.nodata = nodata;
        Ok(self)
    }

    pub fn with_compression(mut self, compression: CompressionHint) -> Self {
        self.compression = compression;
        self
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn bands(&self) -> usize {
        self.bands
    }

    pub fn dtype(&self) -> DataType {
        self.data.dtype()
    }

    pub fn data(&self) -> &PixelData {
        &self.data
    }

    pub fn into_data(self) -> PixelData {
        self.data
    }

    pub fn nodata(&self) -> Option<f64> {
        self.nodata
    }

    /// Nodata as an integer, when declared and integral.
    pub fn nodata_integer(&self) -> Option<i64> {
        self.nodata
            .filter(|v| v.is_finite() && v.fract() == 0.0)
            .map(|v| v as i64)
    }

    pub fn transform(&self) -> &GeoTransform {
        &self.transform
    }

    pub fn crs(&self) -> Option<CrsCode> {
        self.crs
    }

    pub fn compression(&self) -> CompressionHint {
        self.compression
    }

    pub fn pixels_per_band(&self) -> usize {
        self.width * self.height
    }

    /// Sample index range of zero-based `band`.
    pub fn band_range(&self, band: usize) -> MapResult<Range<usize>> {
        if band >= self.bands {
            return Err(MapError::InvalidRaster(format!(
                "band {} requested from a {}-band raster",
                band + 1,
                self.bands
            )));
        }
        let n = self.pixels_per_band();
        Ok(band * n..(band + 1) * n)
    }

    /// Extent in the buffer's own CRS.
    pub fn bounds(&self) -> BoundingBox {
        self.transform.bounds(self.width, self.height)
    }

    /// Whether the two buffers share width and height.
    pub fn same_dimensions(&self, other: &RasterBuffer) -> bool {
        self.width == other.width && self.height == other.height
    }
}
