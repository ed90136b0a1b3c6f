//! Palette and gradient definitions.
//!
//! A [`Palette`] is the finished per-category record set (code, hex color,
//! description) handed over by whoever reads the palette source. A
//! [`Gradient`] describes a continuous ramp that is sampled into the 0–100
//! categorical domain produced by the continuous normalizer.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use crate::color::{hex_to_rgba, CodecVariant, ColorTable, Rgba};
use crate::error::{MapError, MapResult};

/// Code reserved for areas where a continuous layer does not apply.
pub const NON_APPLICABLE_CODE: i64 = -100;

/// Light grey used for [`NON_APPLICABLE_CODE`].
pub const NON_APPLICABLE_COLOR: Rgba = Rgba::new(225, 225, 225, 255);

/// Named list of category colors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Palette {
    /// Human-readable name
    #[serde(default)]
    pub name: Option<String>,

    /// One record per category code
    pub entries: Vec<PaletteEntry>,
}

/// One palette record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaletteEntry {
    pub code: i64,
    pub color: String,
    #[serde(default)]
    pub description: String,
}

/// Color swatch and label for an external legend renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegendEntry {
    pub color: Rgba,
    pub hex: String,
    pub description: String,
}

impl Palette {
    /// Parse a palette from a JSON string.
    pub fn from_json(json: &str) -> MapResult<Self> {
        let palette: Palette = serde_json::from_str(json)?;
        palette.validate()?;
        Ok(palette)
    }

    /// Load a palette from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> MapResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| MapError::io(path.display().to_string(), e))?;
        Self::from_json(&content)
    }

    /// Reject duplicate codes and malformed colors.
    pub fn validate(&self) -> MapResult<()> {
        if self.entries.is_empty() {
            return Err(MapError::Config("palette has no entries".to_string()));
        }

        let mut seen = HashSet::new();
        for entry in &self.entries {
            if !seen.insert(entry.code) {
                return Err(MapError::Config(format!(
                    "palette code {} appears more than once",
                    entry.code
                )));
            }
            hex_to_rgba(&entry.color, CodecVariant::Exact)?;
        }
        Ok(())
    }

    /// Build the value → color table.
    pub fn color_table(&self, variant: CodecVariant) -> MapResult<ColorTable> {
        ColorTable::from_hex_entries(
            self.entries.iter().map(|e| (e.code, e.color.as_str())),
            variant,
        )
    }

    /// Legend swatches, one per distinct color in palette order.
    ///
    /// Codes sharing a color share a swatch; the first description is kept.
    pub fn legend(&self, variant: CodecVariant) -> MapResult<Vec<LegendEntry>> {
        let mut seen = HashSet::new();
        let mut legend = Vec::new();
        for entry in &self.entries {
            let color = hex_to_rgba(&entry.color, variant)?;
            if seen.insert(color) {
                legend.push(LegendEntry {
                    color,
                    hex: color.to_hex(),
                    description: entry.description.clone(),
                });
            }
        }
        Ok(legend)
    }
}

/// A color stop in a gradient.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradientStop {
    /// Position of the stop on the gradient's value axis
    pub value: f64,

    /// Hex color at this stop
    pub color: String,
}

/// Continuous color ramp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Gradient {
    pub stops: Vec<GradientStop>,
}

impl Gradient {
    /// The nine-class yellow-orange-red ramp used for fractional land-use layers.
    pub fn yl_or_rd() -> Self {
        let colors = [
            "#FFFFCC", "#FFEDA0", "#FED976", "#FEB24C", "#FD8D3C", "#FC4E2A", "#E31A1C",
            "#BD0026", "#800026",
        ];
        let last = (colors.len() - 1) as f64;
        Self {
            stops: colors
                .iter()
                .enumerate()
                .map(|(i, c)| GradientStop {
                    value: i as f64 / last,
                    color: c.to_string(),
                })
                .collect(),
        }
    }

    pub fn validate(&self) -> MapResult<()> {
        if self.stops.len() < 2 {
            return Err(MapError::Config(
                "Gradient must have at least 2 color stops".to_string(),
            ));
        }

        for i in 1..self.stops.len() {
            if self.stops[i].value <= self.stops[i - 1].value {
                return Err(MapError::Config(
                    "Color stops must be in ascending value order".to_string(),
                ));
            }
        }

        for stop in &self.stops {
            hex_to_rgba(&stop.color, CodecVariant::Exact)?;
        }
        Ok(())
    }

    /// Interpolate color for a given value; values outside the stops clamp.
    pub fn interpolate(&self, value: f64) -> MapResult<Rgba> {
        self.validate()?;
        let first = &self.stops[0];
        let last = &self.stops[self.stops.len() - 1];

        if value <= first.value {
            return hex_to_rgba(&first.color, CodecVariant::Exact);
        }
        if value >= last.value {
            return hex_to_rgba(&last.color, CodecVariant::Exact);
        }

        // Find bracketing stops
        for pair in self.stops.windows(2) {
            let (low, high) = (&pair[0], &pair[1]);
            if value <= high.value {
                let t = (value - low.value) / (high.value - low.value);
                let a = hex_to_rgba(&low.color, CodecVariant::Exact)?;
                let b = hex_to_rgba(&high.color, CodecVariant::Exact)?;
                return Ok(lerp(a, b, t));
            }
        }

        hex_to_rgba(&last.color, CodecVariant::Exact)
    }

    /// Sample the gradient into codes `0..=steps`, plus the non-applicable code.
    ///
    /// Code `i` takes the color at `i / steps` of the way along the stops.
    pub fn color_table(&self, steps: u32) -> MapResult<ColorTable> {
        self.validate()?;
        if steps == 0 {
            return Err(MapError::Config("gradient needs at least one step".to_string()));
        }

        let first = self.stops[0].value;
        let span = self.stops[self.stops.len() - 1].value - first;

        let mut table = ColorTable::new();
        for i in 0..=steps {
            let value = first + span * (i as f64 / steps as f64);
            table = table.with_entry(i as i64, self.interpolate(value)?);
        }
        Ok(table.with_entry(NON_APPLICABLE_CODE, NON_APPLICABLE_COLOR))
    }
}

fn lerp(a: Rgba, b: Rgba, t: f64) -> Rgba {
    let t = t.clamp(0.0, 1.0);
    let lerp_u8 = |a: u8, b: u8| -> u8 { ((a as f64) * (1.0 - t) + (b as f64) * t).round() as u8 };
    Rgba::new(
        lerp_u8(a.r, b.r),
        lerp_u8(a.g, b.g),
        lerp_u8(a.b, b.b),
        lerp_u8(a.a, b.a),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const LUMAP: &str = r##"{
        "name": "lumap",
        "entries": [
            {"code": 0, "color": "#000000", "description": "Non-agricultural land"},
            {"code": 1, "color": "#E6CE9C", "description": "Dryland cropping"},
            {"code": 2, "color": "#E6CE9C", "description": "Irrigated cropping"},
            {"code": 3, "color": "#76A665"}
        ]
    }"##;

    #[test]
    fn test_palette_color_table_uses_variant() {
        let palette = Palette::from_json(LUMAP).unwrap();
        let table = palette.color_table(CodecVariant::Categorical).unwrap();
        assert_eq!(table.get(0), Some(Rgba::new(1, 1, 1, 255)));
        assert_eq!(table.get(3), Some(Rgba::new(0x76, 0xA6, 0x65, 255)));
        assert_eq!(table.len(), 4);
    }

    #[test]
    fn test_legend_dedupes_colors() {
        let palette = Palette::from_json(LUMAP).unwrap();
        let legend = palette.legend(CodecVariant::Categorical).unwrap();
        assert_eq!(legend.len(), 3);
        assert_eq!(legend[1].description, "Dryland cropping");
        assert_eq!(legend[2].description, "");
        assert_eq!(legend[0].hex, "#010101");
    }

    #[test]
    fn test_palette_rejects_duplicates() {
        let json = r##"{"entries": [
            {"code": 1, "color": "#FF0000"},
            {"code": 1, "color": "#00FF00"}
        ]}"##;
        assert!(matches!(Palette::from_json(json), Err(MapError::Config(_))));
    }

    #[test]
    fn test_palette_rejects_bad_color() {
        let json = r##"{"entries": [{"code": 1, "color": "#FF00"}]}"##;
        assert!(matches!(
            Palette::from_json(json),
            Err(MapError::InvalidColorFormat { .. })
        ));
    }

    #[test]
    fn test_gradient_interpolation() {
        let gradient = Gradient {
            stops: vec![
                GradientStop { value: 0.0, color: "#000000".into() },
                GradientStop { value: 10.0, color: "#FF0000".into() },
            ],
        };
        assert_eq!(gradient.interpolate(-5.0).unwrap(), Rgba::new(0, 0, 0, 255));
        assert_eq!(gradient.interpolate(5.0).unwrap(), Rgba::new(128, 0, 0, 255));
        assert_eq!(gradient.interpolate(50.0).unwrap(), Rgba::new(255, 0, 0, 255));
    }

    #[test]
    fn test_continuous_table() {
        let table = Gradient::yl_or_rd().color_table(100).unwrap();
        assert_eq!(table.len(), 102);
        assert_eq!(table.get(0), Some(Rgba::new(0xFF, 0xFF, 0xCC, 255)));
        assert_eq!(table.get(100), Some(Rgba::new(0x80, 0x00, 0x26, 255)));
        assert_eq!(table.get(NON_APPLICABLE_CODE), Some(NON_APPLICABLE_COLOR));
        assert_eq!(table.get(101), None);
    }

    #[test]
    fn test_gradient_validation() {
        let gradient = Gradient {
            stops: vec![
                GradientStop { value: 1.0, color: "#000000".into() },
                GradientStop { value: 0.0, color: "#FFFFFF".into() },
            ],
        };
        assert!(gradient.validate().is_err());
    }
}
