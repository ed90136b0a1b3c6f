//! Color codec and the value lookup tables used by the pipeline.
//!
//! Colors arrive as hex strings from palette records and leave as RGBA
//! quadruples. `(0, 0, 0, 0)` is reserved for transparent nodata, so the
//! categorical codec variant never produces a zero red, green or blue channel.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{MapError, MapResult};

/// An 8-bit RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    /// Fully transparent black, the encoding of nodata.
    pub const TRANSPARENT: Rgba = Rgba::new(0, 0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Channels scaled to 0.0–1.0.
    pub fn to_float(self) -> [f32; 4] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
            self.a as f32 / 255.0,
        ]
    }

    /// Encode as `#RRGGBB`, or `#RRGGBBAA` when not fully opaque.
    pub fn to_hex(self) -> String {
        if self.a == 255 {
            format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
        } else {
            format!("#{:02X}{:02X}{:02X}{:02X}", self.r, self.g, self.b, self.a)
        }
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {}, {})", self.r, self.g, self.b, self.a)
    }
}

/// Which decoding rule to apply to a hex color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodecVariant {
    /// Channels decoded as written.
    Exact,
    /// Zero red/green/blue channels are raised to 1, keeping every legitimate
    /// color distinct from the transparent nodata encoding.
    #[default]
    Categorical,
}

/// Decode a 6- or 8-digit hex color with an optional leading `#`.
///
/// Alpha defaults to 255 when only six digits are given.
pub fn hex_to_rgba(hex: &str, variant: CodecVariant) -> MapResult<Rgba> {
    let digits = hex.strip_prefix('#').unwrap_or(hex);

    if digits.len() != 6 && digits.len() != 8 {
        return Err(MapError::invalid_color(
            hex,
            format!("expected 6 or 8 hex digits, found {}", digits.len()),
        ));
    }
    if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(MapError::invalid_color(hex, "contains non-hex characters"));
    }

    let channel = |i: usize| {
        u8::from_str_radix(&digits[i..i + 2], 16)
            .map_err(|e| MapError::invalid_color(hex, e.to_string()))
    };

    let mut r = channel(0)?;
    let mut g = channel(2)?;
    let mut b = channel(4)?;
    let a = if digits.len() == 8 { channel(6)? } else { 255 };

    if variant == CodecVariant::Categorical {
        r = r.max(1);
        g = g.max(1);
        b = b.max(1);
    }

    Ok(Rgba::new(r, g, b, a))
}

/// Immutable mapping from pixel value to RGBA color.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColorTable {
    entries: BTreeMap<i64, Rgba>,
}

impl ColorTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from `(value, hex)` pairs.
    pub fn from_hex_entries<I, S>(entries: I, variant: CodecVariant) -> MapResult<Self>
    where
        I: IntoIterator<Item = (i64, S)>,
        S: AsRef<str>,
    {
        let mut table = Self::new();
        for (value, hex) in entries {
            table.entries.insert(value, hex_to_rgba(hex.as_ref(), variant)?);
        }
        Ok(table)
    }

    /// Builder-style insert; a later entry for the same value replaces the earlier one.
    pub fn with_entry(mut self, value: i64, color: Rgba) -> Self {
        self.entries.insert(value, color);
        self
    }

    pub fn get(&self, value: i64) -> Option<Rgba> {
        self.entries.get(&value).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (i64, Rgba)> + '_ {
        self.entries.iter().map(|(k, v)| (*k, *v))
    }

    /// Working copy with `nodata` forced to transparent.
    ///
    /// The override is applied last, so it wins over any caller entry for the
    /// same value. `self` is left untouched.
    pub fn with_transparent(&self, nodata: i64) -> ColorTable {
        self.clone().with_entry(nodata, Rgba::TRANSPARENT)
    }
}

impl FromIterator<(i64, Rgba)> for ColorTable {
    fn from_iter<T: IntoIterator<Item = (i64, Rgba)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Mapping from an original category code to a replacement code.
///
/// Codes not present pass through unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReclassTable {
    entries: BTreeMap<i64, i64>,
}

impl ReclassTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(mut self, from: i64, to: i64) -> Self {
        self.entries.insert(from, to);
        self
    }

    /// Explicit replacement for `value`, if any.
    pub fn get(&self, value: i64) -> Option<i64> {
        self.entries.get(&value).copied()
    }

    /// Replacement for `value`, or `value` itself when unmapped.
    pub fn lookup(&self, value: i64) -> i64 {
        self.entries.get(&value).copied().unwrap_or(value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(i64, i64)> for ReclassTable {
    fn from_iter<T: IntoIterator<Item = (i64, i64)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
