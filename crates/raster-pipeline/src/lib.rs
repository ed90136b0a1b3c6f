//! Land-use raster styling pipeline.
//!
//! Turns a categorical or continuous single-band raster into a reprojected
//! RGBA GeoTIFF, a PNG image and the placement a web map needs to overlay it.
//!
//! # Stages
//!
//! - [`reclassify`]: remap category codes, narrowing to `i8`
//! - [`expand`]: category band to four RGBA bands through a color table
//! - [`normalize`]: fractions to integer classes, plus invalid-data masking
//! - [`reproject`]: warp to the target CRS
//! - [`export`]: GeoTIFF, PNG and [`DisplayPlacement`]
//!
//! [`process_categorical`] and [`process_continuous`] chain the stages.

pub mod config;
pub mod expand;
pub mod export;
pub mod geotiff;
pub mod normalize;
pub mod pipeline;
pub mod png;
pub mod reclassify;
pub mod reproject;
pub mod resampling;

pub use config::PipelineConfig;
pub use expand::{expand, BandExpander, UnmappedPolicy};
pub use export::{compute_display_bounds, write_image, write_raster, DisplayPlacement};
pub use geotiff::{read_raster, read_raster_from, write_raster_to};
pub use normalize::{mask_classes, mask_invalid, normalize, normalize_scaled, DEFAULT_MASK_SENTINEL, NORMALIZED_NODATA};
pub use pipeline::{process_categorical, process_continuous, CategoricalStyle, StyledRaster};
pub use png::encode_png;
pub use reclassify::{reclassify, RECLASS_NODATA};
pub use reproject::{default_output_grid, reproject, OutputGrid};
pub use resampling::ResamplingMethod;
