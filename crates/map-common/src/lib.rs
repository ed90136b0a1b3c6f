//! Common types and utilities shared across the land-use map styling workspace.

pub mod bbox;
pub mod color;
pub mod crs;
pub mod error;
pub mod raster;
pub mod style;

pub use bbox::BoundingBox;
pub use color::{hex_to_rgba, CodecVariant, ColorTable, ReclassTable, Rgba};
pub use crs::CrsCode;
pub use error::{MapError, MapResult};
pub use raster::{CompressionHint, DataType, GeoTransform, PixelData, RasterBuffer};
pub use style::{Gradient, GradientStop, LegendEntry, Palette, PaletteEntry};
