//! PNG encoding for styled rasters.
//!
//! Supports two encoding modes:
//! - **Indexed PNG (color type 3)**: Used when the image has ≤256 unique colors,
//!   which is the normal case for categorical land-use maps.
//! - **RGBA PNG (color type 6)**: Fallback for images with >256 colors.
//!
//! Use `encode_png` for a [`RasterBuffer`], or `create_png_auto` for raw
//! pixel-interleaved RGBA bytes.

use map_common::{MapError, MapResult, RasterBuffer};
use std::collections::HashMap;
use std::io::Write;

/// Maximum colors for indexed PNG (PNG8)
const MAX_PALETTE_SIZE: usize = 256;

const PNG_SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

type Palette = Vec<(u8, u8, u8, u8)>;

/// Encode a `u8` raster of 1, 3 or 4 bands as PNG.
pub fn encode_png(buffer: &RasterBuffer) -> MapResult<Vec<u8>> {
    let pixels = rgba_from_bands(buffer)?;
    create_png_auto(&pixels, buffer.width(), buffer.height())
}

/// Interleave the bands of a `u8` raster into RGBA bytes.
///
/// One band is drawn as grey, three bands get an opaque alpha, four bands
/// are copied as is. A single grey band's nodata value becomes transparent.
pub fn rgba_from_bands(buffer: &RasterBuffer) -> MapResult<Vec<u8>> {
    let data = buffer.data().as_u8().ok_or_else(|| {
        MapError::InvalidRaster(format!("PNG output requires u8 bands, got {}", buffer.dtype()))
    })?;
    let n = buffer.pixels_per_band();
    let mut pixels = Vec::with_capacity(n * 4);

    match buffer.bands() {
        1 => {
            let nodata = buffer.nodata_integer();
            for &v in data {
                let alpha = if Some(v as i64) == nodata { 0 } else { 255 };
                pixels.extend_from_slice(&[v, v, v, alpha]);
            }
        }
        3 => {
            for i in 0..n {
                pixels.extend_from_slice(&[data[i], data[n + i], data[2 * n + i], 255]);
            }
        }
        4 => {
            for i in 0..n {
                pixels.extend_from_slice(&[data[i], data[n + i], data[2 * n + i], data[3 * n + i]]);
            }
        }
        other => {
            return Err(MapError::InvalidRaster(format!(
                "PNG output supports 1, 3 or 4 bands, got {}",
                other
            )))
        }
    }

    Ok(pixels)
}

/// Create a PNG image with automatic format selection.
///
/// - If ≤256 unique colors: uses indexed PNG (smaller, faster)
/// - Otherwise: uses RGBA PNG (full color)
pub fn create_png_auto(pixels: &[u8], width: usize, height: usize) -> MapResult<Vec<u8>> {
    check_len(pixels.len(), width * height * 4)?;

    match extract_palette(pixels) {
        Some((palette, indices)) => create_png_indexed(width, height, &palette, &indices),
        None => create_png(pixels, width, height),
    }
}

fn check_len(actual: usize, expected: usize) -> MapResult<()> {
    if actual != expected {
        return Err(MapError::InvalidRaster(format!(
            "PNG pixel buffer has {} bytes, expected {}",
            actual, expected
        )));
    }
    Ok(())
}

/// Pack RGBA bytes into a u32 for faster hashing and comparison
#[inline(always)]
fn pack_color(r: u8, g: u8, b: u8, a: u8) -> u32 {
    (r as u32) | ((g as u32) << 8) | ((b as u32) << 16) | ((a as u32) << 24)
}

/// Build a palette and per-pixel indices, or None past 256 colors.
fn extract_palette(pixels: &[u8]) -> Option<(Palette, Vec<u8>)> {
    let mut color_to_index: HashMap<u32, u8> = HashMap::with_capacity(MAX_PALETTE_SIZE);
    let mut palette: Palette = Vec::with_capacity(MAX_PALETTE_SIZE);
    let mut indices: Vec<u8> = Vec::with_capacity(pixels.len() / 4);

    for chunk in pixels.chunks_exact(4) {
        let packed = pack_color(chunk[0], chunk[1], chunk[2], chunk[3]);

        let index = match color_to_index.get(&packed) {
            Some(&idx) => idx,
            None => {
                if palette.len() >= MAX_PALETTE_SIZE {
                    return None;
                }
                let idx = palette.len() as u8;
                palette.push((chunk[0], chunk[1], chunk[2], chunk[3]));
                color_to_index.insert(packed, idx);
                idx
            }
        };
        indices.push(index);
    }

    Some((palette, indices))
}

/// Create an indexed PNG (color type 3) from palette and indices.
pub fn create_png_indexed(
    width: usize,
    height: usize,
    palette: &[(u8, u8, u8, u8)],
    indices: &[u8],
) -> MapResult<Vec<u8>> {
    check_len(indices.len(), width * height)?;
    let mut png = Vec::new();
    png.extend_from_slice(&PNG_SIGNATURE);

    write_chunk(&mut png, b"IHDR", &ihdr(width, height, 3));

    // PLTE chunk (palette)
    let mut plte_data = Vec::with_capacity(palette.len() * 3);
    for (r, g, b, _) in palette {
        plte_data.extend_from_slice(&[*r, *g, *b]);
    }
    write_chunk(&mut png, b"PLTE", &plte_data);

    // tRNS chunk, only if any color has alpha < 255
    if palette.iter().any(|(_, _, _, a)| *a < 255) {
        let trns_data: Vec<u8> = palette.iter().map(|(_, _, _, a)| *a).collect();
        write_chunk(&mut png, b"tRNS", &trns_data);
    }

    let idat_data = deflate_scanlines(indices, width, height)?;
    write_chunk(&mut png, b"IDAT", &idat_data);
    write_chunk(&mut png, b"IEND", &[]);

    Ok(png)
}

/// Create a PNG image from RGBA pixel data (color type 6).
pub fn create_png(pixels: &[u8], width: usize, height: usize) -> MapResult<Vec<u8>> {
    check_len(pixels.len(), width * height * 4)?;
    let mut png = Vec::new();
    png.extend_from_slice(&PNG_SIGNATURE);

    write_chunk(&mut png, b"IHDR", &ihdr(width, height, 6));

    let idat_data = deflate_scanlines(pixels, width * 4, height)?;
    write_chunk(&mut png, b"IDAT", &idat_data);
    write_chunk(&mut png, b"IEND", &[]);

    Ok(png)
}

fn ihdr(width: usize, height: usize, color_type: u8) -> Vec<u8> {
    let mut ihdr_data = Vec::with_capacity(13);
    ihdr_data.extend_from_slice(&(width as u32).to_be_bytes());
    ihdr_data.extend_from_slice(&(height as u32).to_be_bytes());
    ihdr_data.push(8); // bit depth
    ihdr_data.push(color_type);
    ihdr_data.push(0); // compression method
    ihdr_data.push(0); // filter method
    ihdr_data.push(0); // interlace method
    ihdr_data
}

/// Write a PNG chunk
fn write_chunk(png: &mut Vec<u8>, chunk_type: &[u8; 4], data: &[u8]) {
    png.extend_from_slice(&(data.len() as u32).to_be_bytes());
    png.extend_from_slice(chunk_type);
    png.extend_from_slice(data);

    let mut hasher = crc32fast::Hasher::new();
    hasher.update(chunk_type);
    hasher.update(data);
    png.extend_from_slice(&hasher.finalize().to_be_bytes());
}

/// Deflate scanlines of `row_bytes` each for the IDAT chunk.
fn deflate_scanlines(bytes: &[u8], row_bytes: usize, height: usize) -> MapResult<Vec<u8>> {
    // Add filter byte (0 = no filter) to each scanline
    let mut uncompressed = Vec::with_capacity(height * (1 + row_bytes));
    for row in bytes.chunks_exact(row_bytes).take(height) {
        uncompressed.push(0);
        uncompressed.extend_from_slice(row);
    }

    let compress_error = |e: std::io::Error| MapError::io("png", format!("IDAT compression failed: {}", e));
    let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::fast());
    encoder.write_all(&uncompressed).map_err(compress_error)?;
    encoder.finish().map_err(compress_error)
}
