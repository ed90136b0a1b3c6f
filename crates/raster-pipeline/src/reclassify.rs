//! Category code remapping with narrowing to a signed 8-bit band.

use map_common::{MapError, MapResult, PixelData, RasterBuffer, ReclassTable};
use tracing::debug;

const STAGE: &str = "reclassify";

/// Nodata sentinel of a reclassified band.
pub const RECLASS_NODATA: i8 = i8::MIN;

/// Remap the category codes of one band through `table`.
///
/// `band` is 1-based. The result is a single `i8` band with nodata −128:
/// source nodata pixels and codes explicitly mapped to −128 become nodata,
/// every other result must fit in `-127..=127`. Codes missing from the table
/// pass through unchanged.
pub fn reclassify(buffer: &RasterBuffer, table: &ReclassTable, band: usize) -> MapResult<RasterBuffer> {
    if band == 0 {
        return Err(MapError::InvalidRaster("band numbers start at 1".to_string()));
    }
    let range = buffer.band_range(band - 1)?;
    let values = buffer.data().integers(range).ok_or_else(|| {
        MapError::InvalidRaster(format!(
            "{} requires integer category codes, got {}",
            STAGE,
            buffer.dtype()
        ))
    })?;

    let source_nodata = buffer.nodata_integer();
    let sentinel = RECLASS_NODATA as i64;

    let mut out = Vec::with_capacity(values.len());
    let mut remapped = 0usize;
    let mut absent = 0usize;
    for value in values {
        if Some(value) == source_nodata {
            out.push(RECLASS_NODATA);
            absent += 1;
            continue;
        }

        let mapped = match table.get(value) {
            Some(m) if m == sentinel => {
                out.push(RECLASS_NODATA);
                absent += 1;
                continue;
            }
            Some(m) => {
                remapped += 1;
                m
            }
            None => value,
        };

        if !(-127..=127).contains(&mapped) {
            return Err(MapError::ReclassificationOverflow {
                stage: STAGE,
                source_value: value,
                mapped,
                target: "i8",
            });
        }
        out.push(mapped as i8);
    }

    debug!(
        width = buffer.width(),
        height = buffer.height(),
        band = band,
        table_entries = table.len(),
        remapped = remapped,
        nodata = absent,
        "Reclassified band"
    );

    RasterBuffer::new(
        buffer.width(),
        buffer.height(),
        1,
        PixelData::I8(out),
        *buffer.transform(),
        buffer.crs(),
    )?
    .with_nodata(Some(RECLASS_NODATA as f64))
    .map(|r| r.with_compression(buffer.compression()))
}
