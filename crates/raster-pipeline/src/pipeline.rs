//! End-to-end composition of the pipeline stages.
//!
//! Categorical maps run reclassify → expand → reproject; continuous
//! (fractional) maps run normalize → expand → mask → reproject. Any stage
//! error aborts the run.

use std::path::Path;
use std::time::Instant;

use map_common::{ColorTable, CrsCode, MapError, MapResult, RasterBuffer, ReclassTable};
use tracing::info;

use crate::config::PipelineConfig;
use crate::expand::BandExpander;
use crate::export::{compute_display_bounds, write_image, write_raster, DisplayPlacement};
use crate::normalize::{mask_classes, mask_invalid, normalize};
use crate::reclassify::reclassify;
use crate::reproject::reproject;

/// How a categorical map is styled.
#[derive(Debug, Clone)]
pub struct CategoricalStyle {
    /// 1-based source band holding category codes.
    pub band: usize,
    /// Optional code remapping applied before coloring.
    pub reclass: Option<ReclassTable>,
    pub colors: ColorTable,
    /// Used instead of `colors` when `use_alternate` is set.
    pub alternate_colors: Option<ColorTable>,
    pub use_alternate: bool,
}

impl CategoricalStyle {
    pub fn new(colors: ColorTable) -> Self {
        Self {
            band: 1,
            reclass: None,
            colors,
            alternate_colors: None,
            use_alternate: false,
        }
    }

    pub fn with_band(mut self, band: usize) -> Self {
        self.band = band;
        self
    }

    pub fn with_reclass(mut self, table: ReclassTable) -> Self {
        self.reclass = Some(table);
        self
    }

    pub fn with_alternate(mut self, colors: ColorTable, use_alternate: bool) -> Self {
        self.alternate_colors = Some(colors);
        self.use_alternate = use_alternate;
        self
    }
}

/// A reprojected RGBA raster ready for export.
#[derive(Debug, Clone)]
pub struct StyledRaster {
    pub raster: RasterBuffer,
}

impl StyledRaster {
    /// Write the GeoTIFF and PNG and compute the display placement.
    pub fn export(
        &self,
        raster_path: impl AsRef<Path>,
        image_path: impl AsRef<Path>,
        display_crs: CrsCode,
    ) -> MapResult<DisplayPlacement> {
        write_raster(&self.raster, raster_path.as_ref())?;
        write_image(&self.raster, image_path.as_ref())?;
        let placement = compute_display_bounds(&self.raster, display_crs)?;

        info!(
            raster = %raster_path.as_ref().display(),
            image = %image_path.as_ref().display(),
            display_crs = %display_crs,
            center = ?placement.center,
            "Exported styled raster"
        );
        Ok(placement)
    }
}

fn expander<'a>(
    colors: &'a ColorTable,
    alternate: Option<&'a ColorTable>,
    use_alternate: bool,
    config: &PipelineConfig,
) -> MapResult<BandExpander<'a>> {
    let mut expander = BandExpander::new(colors).with_unmapped(config.unmapped_policy()?);
    match alternate {
        Some(alt) => expander = expander.with_alternate(alt, use_alternate),
        None if use_alternate => {
            return Err(MapError::Config(
                "alternate color table requested but none was supplied".to_string(),
            ))
        }
        None => {}
    }
    Ok(expander)
}

/// Style a categorical land-use map.
///
/// Without a reclass table the band is still narrowed to `i8` through an
/// empty table, so out-of-range codes are reported the same way.
pub fn process_categorical(
    source: &RasterBuffer,
    style: &CategoricalStyle,
    config: &PipelineConfig,
) -> MapResult<StyledRaster> {
    config.validate()?;
    let started = Instant::now();
    info!(
        width = source.width(),
        height = source.height(),
        band = style.band,
        reclass = style.reclass.is_some(),
        target_crs = %config.target_crs,
        "Styling categorical raster"
    );

    let empty = ReclassTable::new();
    let codes = reclassify(source, style.reclass.as_ref().unwrap_or(&empty), style.band)?;

    let rgba = expander(
        &style.colors,
        style.alternate_colors.as_ref(),
        style.use_alternate,
        config,
    )?
    .expand(&codes)?
    .with_compression(config.compression);

    let raster = reproject(&rgba, config.target_crs, config.resampling)?;

    info!(
        width = raster.width(),
        height = raster.height(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Categorical raster styled"
    );
    Ok(StyledRaster { raster })
}

/// Style a continuous (fractional) land-use map with a 0–100 color table.
///
/// When `mask` is given, its cells equal to `config.mask_sentinel` are made
/// transparent in the colored output, even where the data holds a class the
/// color table does not cover.
pub fn process_continuous(
    source: &RasterBuffer,
    colors: &ColorTable,
    mask: Option<&RasterBuffer>,
    config: &PipelineConfig,
) -> MapResult<StyledRaster> {
    config.validate()?;
    let started = Instant::now();
    info!(
        width = source.width(),
        height = source.height(),
        masked = mask.is_some(),
        target_crs = %config.target_crs,
        "Styling continuous raster"
    );

    let mut classes = normalize(source, 1)?;
    if let Some(mask) = mask {
        classes = mask_classes(&classes, mask, config.mask_sentinel)?;
    }
    let mut rgba = expander(colors, None, false, config)?
        .expand(&classes)?
        .with_compression(config.compression);

    if let Some(mask) = mask {
        rgba = mask_invalid(&rgba, mask, config.mask_sentinel)?;
    }

    let raster = reproject(&rgba, config.target_crs, config.resampling)?;

    info!(
        width = raster.width(),
        height = raster.height(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Continuous raster styled"
    );
    Ok(StyledRaster { raster })
}
