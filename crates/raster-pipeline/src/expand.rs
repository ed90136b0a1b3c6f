//! Category band to RGBA expansion.
//!
//! A single band of category codes becomes four `u8` bands (red, green,
//! blue, alpha) through a [`ColorTable`]. The buffer's nodata value is
//! always painted `(0, 0, 0, 0)`, whatever the caller's table says.

use map_common::{ColorTable, MapError, MapResult, PixelData, RasterBuffer, Rgba};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const STAGE: &str = "expand";

/// What to do with a pixel whose value has no color table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnmappedPolicy {
    /// Abort with [`MapError::UnmappedPixelValue`].
    #[default]
    Fail,
    /// Paint the pixel with this color and log a warning.
    Fallback(Rgba),
}

/// Builder for the band expansion stage.
///
/// ```ignore
/// let rgba = BandExpander::new(&colors)
///     .with_alternate(&binary_colors, use_binary)
///     .with_unmapped(UnmappedPolicy::Fail)
///     .expand(&categories)?;
/// ```
#[derive(Debug, Clone)]
pub struct BandExpander<'a> {
    table: &'a ColorTable,
    alternate: Option<&'a ColorTable>,
    use_alternate: bool,
    unmapped: UnmappedPolicy,
}

impl<'a> BandExpander<'a> {
    pub fn new(table: &'a ColorTable) -> Self {
        Self {
            table,
            alternate: None,
            use_alternate: false,
            unmapped: UnmappedPolicy::default(),
        }
    }

    /// Register an alternate table, used instead of the primary when `use_alternate` is set.
    pub fn with_alternate(mut self, alternate: &'a ColorTable, use_alternate: bool) -> Self {
        self.alternate = Some(alternate);
        self.use_alternate = use_alternate;
        self
    }

    pub fn with_unmapped(mut self, policy: UnmappedPolicy) -> Self {
        self.unmapped = policy;
        self
    }

    fn active_table(&self) -> MapResult<&'a ColorTable> {
        if !self.use_alternate {
            return Ok(self.table);
        }
        self.alternate.ok_or_else(|| {
            MapError::Config("alternate color table requested but none was supplied".to_string())
        })
    }

    /// Expand band 1 of `buffer` into an RGBA raster.
    pub fn expand(&self, buffer: &RasterBuffer) -> MapResult<RasterBuffer> {
        let values = buffer
            .data()
            .integers(buffer.band_range(0)?)
            .ok_or_else(|| {
                MapError::InvalidRaster(format!(
                    "{} requires integer category codes, got {}",
                    STAGE,
                    buffer.dtype()
                ))
            })?;

        let active = self.active_table()?;
        let working = match buffer.nodata_integer() {
            Some(nodata) => active.with_transparent(nodata),
            None => active.clone(),
        };

        let n = buffer.pixels_per_band();
        let mut out = vec![0u8; n * 4];
        let mut first_unmapped: Option<i64> = None;
        let mut unmapped_count = 0usize;

        for (i, value) in values.into_iter().enumerate() {
            let color = match working.get(value) {
                Some(color) => color,
                None => {
                    first_unmapped.get_or_insert(value);
                    unmapped_count += 1;
                    match self.unmapped {
                        UnmappedPolicy::Fail => continue,
                        UnmappedPolicy::Fallback(color) => color,
                    }
                }
            };
            out[i] = color.r;
            out[n + i] = color.g;
            out[2 * n + i] = color.b;
            out[3 * n + i] = color.a;
        }

        if let Some(value) = first_unmapped {
            match self.unmapped {
                UnmappedPolicy::Fail => {
                    return Err(MapError::UnmappedPixelValue {
                        stage: STAGE,
                        value,
                        count: unmapped_count,
                    });
                }
                UnmappedPolicy::Fallback(color) => {
                    warn!(
                        first_value = value,
                        pixels = unmapped_count,
                        fallback = %color,
                        "Pixel values missing from color table painted with fallback color"
                    );
                }
            }
        }

        debug!(
            width = buffer.width(),
            height = buffer.height(),
            table_entries = working.len(),
            alternate = self.use_alternate,
            "Expanded band to RGBA"
        );

        RasterBuffer::new(
            buffer.width(),
            buffer.height(),
            4,
            PixelData::U8(out),
            *buffer.transform(),
            buffer.crs(),
        )?
        .with_nodata(Some(0.0))
        .map(|r| r.with_compression(buffer.compression()))
    }
}

/// Expand band 1 of `buffer` with the primary or the alternate table.
///
/// Unmapped pixel values fail the stage.
pub fn expand(
    buffer: &RasterBuffer,
    color_table: &ColorTable,
    use_alternate: bool,
    alternate_table: Option<&ColorTable>,
) -> MapResult<RasterBuffer> {
    let mut expander = BandExpander::new(color_table);
    if let Some(alternate) = alternate_table {
        expander = expander.with_alternate(alternate, use_alternate);
    } else if use_alternate {
        return Err(MapError::Config(
            "alternate color table requested but none was supplied".to_string(),
        ));
    }
    expander.expand(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use map_common::{CrsCode, GeoTransform};

    const RED: Rgba = Rgba::new(255, 0, 0, 255);
    const GREEN: Rgba = Rgba::new(0, 255, 0, 255);

    fn categories(data: Vec<i16>, nodata: Option<f64>) -> RasterBuffer {
        RasterBuffer::new(
            2,
            2,
            1,
            PixelData::I16(data),
            GeoTransform::north_up(0.0, 2.0, 1.0, 1.0),
            Some(CrsCode::Epsg3577),
        )
        .unwrap()
        .with_nodata(nodata)
        .unwrap()
    }

    fn pixel(raster: &RasterBuffer, i: usize) -> [u8; 4] {
        let data = raster.data().as_u8().unwrap();
        let n = raster.pixels_per_band();
        [data[i], data[n + i], data[2 * n + i], data[3 * n + i]]
    }

    #[test]
    fn test_expand_example() {
        let table = ColorTable::new().with_entry(10, RED).with_entry(20, GREEN);
        let source = categories(vec![10, 0, 20, 10], Some(0.0));

        let out = BandExpander::new(&table).expand(&source).unwrap();
        assert_eq!(out.bands(), 4);
        assert_eq!(out.nodata(), Some(0.0));
        assert_eq!(pixel(&out, 0), [255, 0, 0, 255]);
        assert_eq!(pixel(&out, 1), [0, 0, 0, 0]);
        assert_eq!(pixel(&out, 2), [0, 255, 0, 255]);
        assert_eq!(pixel(&out, 3), [255, 0, 0, 255]);
    }

    #[test]
    fn test_nodata_override_wins_without_touching_table() {
        let table = ColorTable::new().with_entry(0, RED).with_entry(1, GREEN);
        let source = categories(vec![0, 1, 1, 0], Some(0.0));

        let out = BandExpander::new(&table).expand(&source).unwrap();
        assert_eq!(pixel(&out, 0), [0, 0, 0, 0]);
        assert_eq!(table.get(0), Some(RED));
    }

    #[test]
    fn test_unmapped_fails_by_default() {
        let table = ColorTable::new().with_entry(1, RED);
        let source = categories(vec![1, 7, 7, 9], None);

        match BandExpander::new(&table).expand(&source) {
            Err(MapError::UnmappedPixelValue { value, count, .. }) => {
                assert_eq!(value, 7);
                assert_eq!(count, 3);
            }
            other => panic!("expected unmapped error, got {:?}", other),
        }
    }

    #[test]
    fn test_unmapped_fallback_color() {
        let table = ColorTable::new().with_entry(1, RED);
        let grey = Rgba::new(128, 128, 128, 255);
        let source = categories(vec![1, 7, 1, 1], None);

        let out = BandExpander::new(&table)
            .with_unmapped(UnmappedPolicy::Fallback(grey))
            .expand(&source)
            .unwrap();
        assert_eq!(pixel(&out, 1), [128, 128, 128, 255]);
    }

    #[test]
    fn test_alternate_table() {
        let table = ColorTable::new().with_entry(1, RED);
        let binary = ColorTable::new().with_entry(1, GREEN);
        let source = categories(vec![1; 4], None);

        let out = expand(&source, &table, true, Some(&binary)).unwrap();
        assert_eq!(pixel(&out, 0), [0, 255, 0, 255]);

        let out = expand(&source, &table, false, Some(&binary)).unwrap();
        assert_eq!(pixel(&out, 0), [255, 0, 0, 255]);

        assert!(matches!(
            expand(&source, &table, true, None),
            Err(MapError::Config(_))
        ));
    }

    #[test]
    fn test_float_band_rejected() {
        let table = ColorTable::new();
        let source = RasterBuffer::new(
            1,
            1,
            1,
            PixelData::F64(vec![1.0]),
            GeoTransform::north_up(0.0, 1.0, 1.0, 1.0),
            None,
        )
        .unwrap();
        assert!(matches!(
            BandExpander::new(&table).expand(&source),
            Err(MapError::InvalidRaster(_))
        ));
    }
}
