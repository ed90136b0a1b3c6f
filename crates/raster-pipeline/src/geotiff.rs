//! GeoTIFF reading and writing.
//!
//! Only the subset needed by the pipeline is handled: single-image files,
//! chunky (pixel-interleaved) samples, georeferencing through
//! ModelPixelScale + ModelTiepoint or ModelTransformation, an EPSG code in
//! the GeoKey directory and GDAL's ASCII nodata tag.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, Write};
use std::path::Path;

use map_common::{CompressionHint, CrsCode, GeoTransform, MapError, MapResult, PixelData, RasterBuffer};
use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::colortype::{
    ColorType, Gray16, Gray32Float, Gray64Float, Gray8, GrayI16, GrayI32, GrayI8, RGB16,
    RGB32Float, RGB8, RGBA16, RGBA32Float, RGBA8,
};
use tiff::encoder::{Compression, DeflateLevel, TiffEncoder, TiffValue};
use tiff::tags::Tag;
use tracing::{debug, warn};

// GeoTIFF tag IDs
const MODEL_PIXEL_SCALE: u16 = 33550;
const MODEL_TIEPOINT: u16 = 33922;
const MODEL_TRANSFORMATION: u16 = 34264;
const GEO_KEY_DIRECTORY: u16 = 34735;
const GDAL_NODATA: u16 = 42113;

// GeoKey IDs
const GT_MODEL_TYPE_GEO_KEY: u16 = 1024;
const GT_RASTER_TYPE_GEO_KEY: u16 = 1025;
const GEOGRAPHIC_TYPE_GEO_KEY: u16 = 2048;
const PROJECTED_CS_TYPE_GEO_KEY: u16 = 3072;

// GeoKey values
const MODEL_TYPE_PROJECTED: u16 = 1;
const MODEL_TYPE_GEOGRAPHIC: u16 = 2;
const RASTER_PIXEL_IS_AREA: u16 = 1;
const USER_DEFINED: u16 = 32767;

// TIFF compression tag values
const COMPRESSION_NONE: u32 = 1;
const COMPRESSION_LZW: u32 = 5;
const COMPRESSION_DEFLATE: u32 = 8;
const COMPRESSION_ADOBE_DEFLATE: u32 = 32946;

const PLANAR_SEPARATE: u32 = 2;

fn tiff_error(label: &str) -> impl Fn(tiff::TiffError) -> MapError + '_ {
    move |e| MapError::io(label, e)
}

/// Write `buffer` as a GeoTIFF file at `path`.
///
/// A 4-band `u8` buffer is written as RGBA with its nodata cleared, since
/// transparency lives in the alpha band. Any other buffer keeps its nodata
/// in the `GDAL_NODATA` tag.
pub fn write_raster(buffer: &RasterBuffer, path: impl AsRef<Path>) -> MapResult<()> {
    let path = path.as_ref();
    let label = path.display().to_string();
    let file = File::create(path).map_err(|e| MapError::io(&label, e))?;
    write_geotiff(buffer, BufWriter::new(file), &label)?;

    debug!(
        path = %label,
        width = buffer.width(),
        height = buffer.height(),
        bands = buffer.bands(),
        dtype = %buffer.dtype(),
        "Wrote GeoTIFF"
    );
    Ok(())
}

/// Write `buffer` as GeoTIFF to any seekable writer.
pub fn write_raster_to<W: Write + Seek>(buffer: &RasterBuffer, writer: W) -> MapResult<()> {
    write_geotiff(buffer, writer, "<stream>")
}

fn write_geotiff<W: Write + Seek>(buffer: &RasterBuffer, writer: W, label: &str) -> MapResult<()> {
    let compression = match buffer.compression() {
        CompressionHint::None => Compression::Uncompressed,
        CompressionHint::Lzw => Compression::Lzw,
        CompressionHint::Deflate => Compression::Deflate(DeflateLevel::Fast),
    };
    let mut encoder = TiffEncoder::new(writer)
        .map_err(tiff_error(label))?
        .with_compression(compression);

    let bands = buffer.bands();
    let n = buffer.pixels_per_band();
    let w = &mut encoder;

    match (buffer.data(), bands) {
        (PixelData::U8(d), 1) => write_image::<_, Gray8>(w, buffer, d, label),
        (PixelData::U8(d), 3) => write_image::<_, RGB8>(w, buffer, &interleave(d, 3, n), label),
        (PixelData::U8(d), 4) => write_image::<_, RGBA8>(w, buffer, &interleave(d, 4, n), label),
        (PixelData::I8(d), 1) => write_image::<_, GrayI8>(w, buffer, d, label),
        (PixelData::U16(d), 1) => write_image::<_, Gray16>(w, buffer, d, label),
        (PixelData::U16(d), 3) => write_image::<_, RGB16>(w, buffer, &interleave(d, 3, n), label),
        (PixelData::U16(d), 4) => write_image::<_, RGBA16>(w, buffer, &interleave(d, 4, n), label),
        (PixelData::I16(d), 1) => write_image::<_, GrayI16>(w, buffer, d, label),
        (PixelData::I32(d), 1) => write_image::<_, GrayI32>(w, buffer, d, label),
        (PixelData::F32(d), 1) => write_image::<_, Gray32Float>(w, buffer, d, label),
        (PixelData::F32(d), 3) => {
            write_image::<_, RGB32Float>(w, buffer, &interleave(d, 3, n), label)
        }
        (PixelData::F32(d), 4) => {
            write_image::<_, RGBA32Float>(w, buffer, &interleave(d, 4, n), label)
        }
        (PixelData::F64(d), 1) => write_image::<_, Gray64Float>(w, buffer, d, label),
        (data, bands) => Err(MapError::InvalidRaster(format!(
            "GeoTIFF output of {} bands of {} is not supported",
            bands,
            data.dtype()
        ))),
    }
}

fn write_image<W, C>(
    encoder: &mut TiffEncoder<W>,
    buffer: &RasterBuffer,
    samples: &[C::Inner],
    label: &str,
) -> MapResult<()>
where
    W: Write + Seek,
    C: ColorType,
    [C::Inner]: TiffValue,
{
    let mut image = encoder
        .new_image::<C>(buffer.width() as u32, buffer.height() as u32)
        .map_err(tiff_error(label))?;
    write_geotiff_tags(image.encoder(), buffer).map_err(tiff_error(label))?;
    image.write_data(samples).map_err(tiff_error(label))
}

fn write_geotiff_tags<W: Write + Seek, K: tiff::encoder::TiffKind>(
    dir: &mut tiff::encoder::DirectoryEncoder<W, K>,
    buffer: &RasterBuffer,
) -> tiff::TiffResult<()> {
    let gt = buffer.transform();

    if gt.is_north_up() {
        // ModelPixelScale: [ScaleX, ScaleY, ScaleZ]
        let pixel_scale = [gt.pixel_width, -gt.pixel_height, 0.0];
        dir.write_tag(Tag::Unknown(MODEL_PIXEL_SCALE), pixel_scale.as_slice())?;

        // ModelTiepoint: raster (0, 0) to the top-left corner
        let tiepoint = [0.0, 0.0, 0.0, gt.origin_x, gt.origin_y, 0.0];
        dir.write_tag(Tag::Unknown(MODEL_TIEPOINT), tiepoint.as_slice())?;
    } else {
        let matrix = [
            gt.pixel_width, gt.row_rotation, 0.0, gt.origin_x,
            gt.column_rotation, gt.pixel_height, 0.0, gt.origin_y,
            0.0, 0.0, 0.0, 0.0,
            0.0, 0.0, 0.0, 1.0,
        ];
        dir.write_tag(Tag::Unknown(MODEL_TRANSFORMATION), matrix.as_slice())?;
    }

    if let Some(crs) = buffer.crs() {
        let geokeys = build_geokey_directory(crs);
        dir.write_tag(Tag::Unknown(GEO_KEY_DIRECTORY), geokeys.as_slice())?;
    }

    // RGBA output carries transparency in its alpha band
    let is_rgba = buffer.bands() == 4 && buffer.dtype() == map_common::DataType::U8;
    if let (Some(nodata), false) = (buffer.nodata(), is_rgba) {
        let text = format_nodata(nodata);
        dir.write_tag(Tag::Unknown(GDAL_NODATA), text.as_str())?;
    }

    Ok(())
}

fn build_geokey_directory(crs: CrsCode) -> Vec<u16> {
    // [KeyDirectoryVersion, KeyRevision, MinorRevision, NumberOfKeys,
    //  KeyID, TIFFTagLocation, Count, Value_Offset, ...]
    let mut keys = vec![1, 1, 0, 3];

    let (model_type, crs_key) = if crs.is_geographic() {
        (MODEL_TYPE_GEOGRAPHIC, GEOGRAPHIC_TYPE_GEO_KEY)
    } else {
        (MODEL_TYPE_PROJECTED, PROJECTED_CS_TYPE_GEO_KEY)
    };

    keys.extend_from_slice(&[GT_MODEL_TYPE_GEO_KEY, 0, 1, model_type]);
    keys.extend_from_slice(&[GT_RASTER_TYPE_GEO_KEY, 0, 1, RASTER_PIXEL_IS_AREA]);
    keys.extend_from_slice(&[crs_key, 0, 1, crs.epsg() as u16]);

    keys
}

fn format_nodata(value: f64) -> String {
    if value.is_nan() {
        "nan".to_string()
    } else {
        format!("{}", value)
    }
}

/// Read a GeoTIFF file into a band-major buffer.
pub fn read_raster(path: impl AsRef<Path>) -> MapResult<RasterBuffer> {
    let path = path.as_ref();
    let label = path.display().to_string();
    let file = File::open(path).map_err(|e| MapError::io(&label, e))?;
    let raster = read_geotiff(BufReader::new(file), &label)?;

    debug!(
        path = %label,
        width = raster.width(),
        height = raster.height(),
        bands = raster.bands(),
        dtype = %raster.dtype(),
        crs = ?raster.crs(),
        "Read GeoTIFF"
    );
    Ok(raster)
}

/// Read a GeoTIFF from any seekable reader.
pub fn read_raster_from<R: Read + Seek>(reader: R) -> MapResult<RasterBuffer> {
    read_geotiff(reader, "<stream>")
}

fn read_geotiff<R: Read + Seek>(reader: R, label: &str) -> MapResult<RasterBuffer> {
    let err = tiff_error(label);
    let mut decoder = Decoder::new(reader).map_err(&err)?;
    let (width, height) = decoder.dimensions().map_err(&err)?;
    let (width, height) = (width as usize, height as usize);

    let planar = decoder.find_tag(Tag::PlanarConfiguration).map_err(&err)?
        .map(|v| v.into_u32())
        .transpose()
        .map_err(&err)?;
    if planar == Some(PLANAR_SEPARATE) {
        return Err(MapError::InvalidRaster(format!(
            "{}: planar (band-separate) TIFF layout is not supported",
            label
        )));
    }

    let compression = decoder.find_tag(Tag::Compression).map_err(&err)?
        .map(|v| v.into_u32())
        .transpose()
        .map_err(&err)?;
    let compression = match compression {
        None | Some(COMPRESSION_NONE) => CompressionHint::None,
        Some(COMPRESSION_LZW) => CompressionHint::Lzw,
        Some(COMPRESSION_DEFLATE) | Some(COMPRESSION_ADOBE_DEFLATE) => CompressionHint::Deflate,
        Some(other) => {
            debug!(compression = other, "Unrecognised TIFF compression, defaulting hint");
            CompressionHint::default()
        }
    };

    let transform = read_geotransform(&mut decoder, label)?;
    let crs = read_crs(&mut decoder, label)?;
    let nodata = match decoder.find_tag(tag(GDAL_NODATA)).map_err(&err)? {
        Some(value) => parse_nodata(&value.into_string().map_err(&err)?, label),
        None => None,
    };

    let pixels = width * height;
    let interleaved = match decoder.read_image().map_err(&err)? {
        DecodingResult::U8(d) => PixelData::U8(d),
        DecodingResult::I8(d) => PixelData::I8(d),
        DecodingResult::U16(d) => PixelData::U16(d),
        DecodingResult::I16(d) => PixelData::I16(d),
        DecodingResult::I32(d) => PixelData::I32(d),
        DecodingResult::F32(d) => PixelData::F32(d),
        DecodingResult::F64(d) => PixelData::F64(d),
        _ => {
            return Err(MapError::InvalidRaster(format!(
                "{}: unsupported TIFF sample type",
                label
            )))
        }
    };

    let total = interleaved.len();
    if pixels == 0 || total % pixels != 0 {
        return Err(MapError::InvalidRaster(format!(
            "{}: {} samples do not fill a {}x{} grid",
            label, total, width, height
        )));
    }
    let bands = total / pixels;

    let data = match interleaved {
        PixelData::U8(d) => PixelData::U8(deinterleave(&d, bands)),
        PixelData::I8(d) => PixelData::I8(deinterleave(&d, bands)),
        PixelData::U16(d) => PixelData::U16(deinterleave(&d, bands)),
        PixelData::I16(d) => PixelData::I16(deinterleave(&d, bands)),
        PixelData::I32(d) => PixelData::I32(deinterleave(&d, bands)),
        PixelData::F32(d) => PixelData::F32(deinterleave(&d, bands)),
        PixelData::F64(d) => PixelData::F64(deinterleave(&d, bands)),
    };

    RasterBuffer::new(width, height, bands, data, transform, crs)?
        .with_nodata(nodata)
        .map(|r| r.with_compression(compression))
}

/// Tag for a numeric code.
///
/// The decoder keys its directory by the crate's named variants where one
/// exists, so `Tag::Unknown(code)` would miss GeoTIFF tags it knows about.
fn tag(code: u16) -> Tag {
    Tag::from_u16_exhaustive(code)
}

fn read_geotransform<R: Read + Seek>(decoder: &mut Decoder<R>, label: &str) -> MapResult<GeoTransform> {
    let err = tiff_error(label);

    if let Some(value) = decoder.find_tag(tag(MODEL_TRANSFORMATION)).map_err(&err)? {
        let m = value.into_f64_vec().map_err(&err)?;
        if m.len() < 16 {
            return Err(MapError::InvalidRaster(format!(
                "{}: ModelTransformation has {} values",
                label,
                m.len()
            )));
        }
        return Ok(GeoTransform::from_gdal([m[3], m[0], m[1], m[7], m[4], m[5]]));
    }

    let scale = decoder
        .find_tag(tag(MODEL_PIXEL_SCALE))
        .map_err(&err)?
        .map(|v| v.into_f64_vec())
        .transpose()
        .map_err(&err)?;
    let tiepoint = decoder
        .find_tag(tag(MODEL_TIEPOINT))
        .map_err(&err)?
        .map(|v| v.into_f64_vec())
        .transpose()
        .map_err(&err)?;

    match (scale, tiepoint) {
        (Some(s), Some(t)) if s.len() >= 2 && t.len() >= 6 => {
            let (i, j, x, y) = (t[0], t[1], t[3], t[4]);
            Ok(GeoTransform::from_gdal([
                x - i * s[0],
                s[0],
                0.0,
                y + j * s[1],
                0.0,
                -s[1],
            ]))
        }
        _ => {
            warn!(path = %label, "GeoTIFF has no georeferencing, using pixel coordinates");
            Ok(GeoTransform::from_gdal([0.0, 1.0, 0.0, 0.0, 0.0, 1.0]))
        }
    }
}

fn read_crs<R: Read + Seek>(decoder: &mut Decoder<R>, label: &str) -> MapResult<Option<CrsCode>> {
    let err = tiff_error(label);
    let Some(value) = decoder.find_tag(tag(GEO_KEY_DIRECTORY)).map_err(&err)? else {
        return Ok(None);
    };
    let keys = value.into_u16_vec().map_err(&err)?;
    if keys.len() < 4 {
        return Ok(None);
    }

    let count = keys[3] as usize;
    let mut code = None;
    for entry in keys[4..].chunks_exact(4).take(count) {
        let (id, location, value) = (entry[0], entry[1], entry[3]);
        if location != 0 {
            continue;
        }
        if id == PROJECTED_CS_TYPE_GEO_KEY || (id == GEOGRAPHIC_TYPE_GEO_KEY && code.is_none()) {
            code = Some(value);
        }
    }

    match code {
        Some(USER_DEFINED) => {
            warn!(path = %label, "GeoTIFF uses a user-defined CRS, leaving CRS unset");
            Ok(None)
        }
        Some(epsg) => match CrsCode::from_epsg(epsg as u32) {
            Ok(crs) => Ok(Some(crs)),
            Err(_) => {
                warn!(path = %label, epsg = epsg, "GeoTIFF CRS is not supported, leaving CRS unset");
                Ok(None)
            }
        },
        None => Ok(None),
    }
}

fn parse_nodata(text: &str, label: &str) -> Option<f64> {
    let trimmed = text.trim_matches(|c: char| c == '\0' || c.is_whitespace());
    match trimmed.parse::<f64>() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!(path = %label, value = %trimmed, "Ignoring unparseable GDAL_NODATA");
            None
        }
    }
}

/// Band-major samples to pixel-interleaved order.
fn interleave<T: Copy>(data: &[T], bands: usize, pixels: usize) -> Vec<T> {
    let mut out = Vec::with_capacity(data.len());
    for i in 0..pixels {
        for band in 0..bands {
            out.push(data[band * pixels + i]);
        }
    }
    out
}

/// Pixel-interleaved samples to band-major order.
fn deinterleave<T: Copy>(data: &[T], bands: usize) -> Vec<T> {
    if bands == 1 {
        return data.to_vec();
    }
    let mut out = Vec::with_capacity(data.len());
    for band in 0..bands {
        out.extend(data.iter().skip(band).step_by(bands).copied());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn raster(data: PixelData, bands: usize, crs: Option<CrsCode>) -> RasterBuffer {
        let pixels = data.len() / bands;
        RasterBuffer::new(
            pixels,
            1,
            bands,
            data,
            GeoTransform::north_up(1_000_000.0, -3_600_000.0, 250.0, 250.0),
            crs,
        )
        .unwrap()
    }

    fn round_trip(buffer: &RasterBuffer) -> RasterBuffer {
        let mut bytes = Cursor::new(Vec::new());
        write_raster_to(buffer, &mut bytes).unwrap();
        bytes.set_position(0);
        read_raster_from(bytes).unwrap()
    }

    #[test]
    fn test_interleave() {
        let band_major = [1, 2, 3, 10, 20, 30];
        let interleaved = interleave(&band_major, 2, 3);
        assert_eq!(interleaved, vec![1, 10, 2, 20, 3, 30]);
        assert_eq!(deinterleave(&interleaved, 2), band_major.to_vec());
    }

    #[test]
    fn test_geokey_directory() {
        let keys = build_geokey_directory(CrsCode::Epsg3577);
        assert_eq!(keys[..4], [1, 1, 0, 3]);
        assert_eq!(keys[4..8], [1024, 0, 1, 1]);
        assert_eq!(keys[12..16], [3072, 0, 1, 3577]);

        let keys = build_geokey_directory(CrsCode::Epsg4326);
        assert_eq!(keys[7], 2);
        assert_eq!(keys[12..16], [2048, 0, 1, 4326]);
    }

    #[test]
    fn test_i8_round_trip() {
        let source = raster(PixelData::I8(vec![-128, 1, 127, 5]), 1, Some(CrsCode::Epsg3577))
            .with_nodata(Some(-128.0))
            .unwrap();
        let back = round_trip(&source);

        assert_eq!(back.data(), source.data());
        assert_eq!(back.nodata(), Some(-128.0));
        assert_eq!(back.crs(), Some(CrsCode::Epsg3577));
        assert!(back.transform().approx_eq(source.transform(), 1e-9));
        assert_eq!(back.compression(), CompressionHint::Lzw);
    }

    #[test]
    fn test_rgba_round_trip_is_band_major() {
        let data = PixelData::U8(vec![
            255, 0, // red
            0, 128, // green
            0, 64, // blue
            255, 0, // alpha
        ]);
        let source = raster(data, 4, Some(CrsCode::Epsg3857))
            .with_nodata(Some(0.0))
            .unwrap()
            .with_compression(CompressionHint::Deflate);
        let back = round_trip(&source);

        assert_eq!(back.bands(), 4);
        assert_eq!(back.data(), source.data());
        // Transparency lives in the alpha band, so no nodata tag is written
        assert_eq!(back.nodata(), None);
        assert_eq!(back.compression(), CompressionHint::Deflate);
    }

    #[test]
    fn test_float_nodata_and_geographic_crs() {
        let source = raster(PixelData::F32(vec![0.5, -9999.0]), 1, Some(CrsCode::Epsg4283))
            .with_nodata(Some(-9999.0))
            .unwrap()
            .with_compression(CompressionHint::None);
        let back = round_trip(&source);

        assert_eq!(back.data(), source.data());
        assert_eq!(back.nodata(), Some(-9999.0));
        assert_eq!(back.crs(), Some(CrsCode::Epsg4283));
    }

    #[test]
    fn test_rotated_transform_round_trip() {
        let gt = GeoTransform::from_gdal([500.0, 10.0, 2.0, 900.0, 1.5, -10.0]);
        let source = RasterBuffer::new(2, 2, 1, PixelData::I16(vec![1, 2, 3, 4]), gt, None).unwrap();
        let back = round_trip(&source);

        assert!(back.transform().approx_eq(&gt, 1e-9));
        assert_eq!(back.crs(), None);
    }

    #[test]
    fn test_unsupported_layout_rejected() {
        let source = raster(PixelData::I16(vec![1, 2, 3, 4]), 2, None);
        let mut bytes = Cursor::new(Vec::new());
        assert!(matches!(
            write_raster_to(&source, &mut bytes),
            Err(MapError::InvalidRaster(_))
        ));
    }

    #[test]
    fn test_parse_nodata() {
        assert_eq!(parse_nodata("-9999\0", "t"), Some(-9999.0));
        assert!(parse_nodata("nan", "t").unwrap().is_nan());
        assert_eq!(parse_nodata("none", "t"), None);
    }
}
