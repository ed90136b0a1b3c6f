//! Styling job description.
//!
//! A job is a YAML file naming the source raster, how to color it and where
//! to write the outputs:
//!
//! ```yaml
//! source: /data/clum_50m.tif
//! mode: categorical
//! palette: /styles/land_use.json
//! reclass: { 110: 1, 120: 1, 210: 2 }
//! output:
//!   raster: /out/land_use_3857.tif
//!   image: /out/land_use_3857.png
//! ```

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use map_common::{CodecVariant, ColorTable, Gradient, LegendEntry, Palette, ReclassTable};
use raster_pipeline::{
    process_categorical, process_continuous, read_raster, CategoricalStyle, DisplayPlacement,
    PipelineConfig,
};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Which pipeline a job runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Categorical,
    Continuous,
}

/// Output file locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputPaths {
    pub raster: PathBuf,
    pub image: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StyleJob {
    pub source: PathBuf,
    pub mode: Mode,

    /// 1-based band of `source` holding category codes
    #[serde(default = "default_band")]
    pub band: usize,

    /// Palette JSON file (categorical mode)
    #[serde(default)]
    pub palette: Option<PathBuf>,

    /// Palette used instead of `palette` when `use_alternate` is set
    #[serde(default)]
    pub alternate_palette: Option<PathBuf>,

    #[serde(default)]
    pub use_alternate: bool,

    #[serde(default)]
    pub reclass: Option<ReclassTable>,

    /// Color ramp for continuous mode; the yellow-orange-red ramp when unset
    #[serde(default)]
    pub gradient: Option<Gradient>,

    /// Raster whose sentinel cells are made transparent (continuous mode)
    #[serde(default)]
    pub mask: Option<PathBuf>,

    pub output: OutputPaths,

    /// Pipeline settings; environment defaults apply when omitted
    #[serde(default)]
    pub config: Option<PipelineConfig>,
}

fn default_band() -> usize {
    1
}

/// What a finished job reports back.
#[derive(Debug, Clone, Serialize)]
pub struct JobReport {
    pub raster: PathBuf,
    pub image: PathBuf,
    pub placement: DisplayPlacement,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub legend: Vec<LegendEntry>,
}

impl StyleJob {
    pub fn from_yaml(content: &str) -> Result<Self> {
        let job: StyleJob = serde_yaml::from_str(content).context("Invalid job description")?;
        job.check()?;
        Ok(job)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read job file {}", path.display()))?;
        Self::from_yaml(&content)
    }

    fn check(&self) -> Result<()> {
        match self.mode {
            Mode::Categorical if self.palette.is_none() => {
                bail!("categorical jobs need a palette")
            }
            Mode::Categorical if self.mask.is_some() => {
                bail!("mask is only supported for continuous jobs")
            }
            Mode::Continuous if self.reclass.is_some() => {
                bail!("reclass is only supported for categorical jobs")
            }
            _ => {}
        }
        if self.use_alternate && self.alternate_palette.is_none() {
            bail!("use_alternate is set but no alternate_palette is given");
        }
        if self.band == 0 {
            bail!("band numbers start at 1");
        }
        Ok(())
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        self.config.clone().unwrap_or_else(PipelineConfig::from_env)
    }

    pub fn run(&self) -> Result<JobReport> {
        let config = self.pipeline_config();
        let source = read_raster(&self.source)
            .with_context(|| format!("Failed to load source {}", self.source.display()))?;

        let (styled, legend) = match self.mode {
            Mode::Categorical => {
                let (style, legend) = self.categorical_style()?;
                (process_categorical(&source, &style, &config)?, legend)
            }
            Mode::Continuous => {
                let colors = self.continuous_colors()?;
                let mask = match &self.mask {
                    Some(path) => Some(
                        read_raster(path)
                            .with_context(|| format!("Failed to load mask {}", path.display()))?,
                    ),
                    None => None,
                };
                (process_continuous(&source, &colors, mask.as_ref(), &config)?, Vec::new())
            }
        };

        let placement = styled.export(&self.output.raster, &self.output.image, config.display_crs)?;
        info!(
            mode = ?self.mode,
            raster = %self.output.raster.display(),
            "Job complete"
        );

        Ok(JobReport {
            raster: self.output.raster.clone(),
            image: self.output.image.clone(),
            placement,
            legend,
        })
    }

    fn categorical_style(&self) -> Result<(CategoricalStyle, Vec<LegendEntry>)> {
        let palette_path = self.palette.as_ref().context("categorical jobs need a palette")?;
        let palette = Palette::from_file(palette_path)?;
        let mut style =
            CategoricalStyle::new(palette.color_table(CodecVariant::Categorical)?).with_band(self.band);
        let mut legend_palette = palette;

        if let Some(path) = &self.alternate_palette {
            let alternate = Palette::from_file(path)?;
            style = style.with_alternate(alternate.color_table(CodecVariant::Categorical)?, self.use_alternate);
            if self.use_alternate {
                legend_palette = alternate;
            }
        }
        if let Some(reclass) = &self.reclass {
            style = style.with_reclass(reclass.clone());
        }

        let legend = legend_palette.legend(CodecVariant::Categorical)?;
        Ok((style, legend))
    }

    fn continuous_colors(&self) -> Result<ColorTable> {
        let gradient = self.gradient.clone().unwrap_or_else(Gradient::yl_or_rd);
        Ok(gradient.color_table(100)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use map_common::CrsCode;

    const CATEGORICAL: &str = r##"
source: /data/clum.tif
mode: categorical
palette: /styles/land_use.json
reclass: { 110: 1, 120: 1, 210: 2 }
output:
  raster: /out/land_use.tif
  image: /out/land_use.png
config:
  target_crs: "EPSG:3857"
  unmapped_color: "#FF00FF"
"##;

    #[test]
    fn test_parse_categorical_job() {
        let job = StyleJob::from_yaml(CATEGORICAL).unwrap();
        assert_eq!(job.mode, Mode::Categorical);
        assert_eq!(job.band, 1);

        let reclass = job.reclass.as_ref().unwrap();
        assert_eq!(reclass.get(110), Some(1));
        assert_eq!(reclass.lookup(999), 999);

        let config = job.pipeline_config();
        assert_eq!(config.target_crs, CrsCode::Epsg3857);
        assert_eq!(config.display_crs, CrsCode::Epsg4326);
        assert_eq!(config.unmapped_color.as_deref(), Some("#FF00FF"));
    }

    #[test]
    fn test_categorical_job_needs_palette() {
        let yaml = r#"
source: a.tif
mode: categorical
output: { raster: b.tif, image: b.png }
"#;
        assert!(StyleJob::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_continuous_job_rejects_reclass() {
        let yaml = r#"
source: a.tif
mode: continuous
reclass: { 1: 2 }
output: { raster: b.tif, image: b.png }
"#;
        assert!(StyleJob::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_alternate_requires_palette() {
        let yaml = r#"
source: a.tif
mode: categorical
palette: p.json
use_alternate: true
output: { raster: b.tif, image: b.png }
"#;
        assert!(StyleJob::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_continuous_default_ramp_covers_percent_range() {
        let yaml = r#"
source: a.tif
mode: continuous
mask: m.tif
output: { raster: b.tif, image: b.png }
"#;
        let job = StyleJob::from_yaml(yaml).unwrap();
        let colors = job.continuous_colors().unwrap();
        assert!(colors.get(0).is_some());
        assert!(colors.get(100).is_some());
    }
}
