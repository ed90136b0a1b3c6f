//! Configuration for the styling pipeline.

use map_common::{hex_to_rgba, CodecVariant, CompressionHint, CrsCode, MapError, MapResult};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::expand::UnmappedPolicy;
use crate::normalize::DEFAULT_MASK_SENTINEL;
use crate::resampling::ResamplingMethod;

/// Configuration for one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// CRS of the styled GeoTIFF and PNG.
    pub target_crs: CrsCode,

    /// CRS of the placement descriptor handed to the map widget.
    pub display_crs: CrsCode,

    /// Resampling method for reprojection.
    pub resampling: ResamplingMethod,

    /// Mask value marking invalid cells.
    pub mask_sentinel: f64,

    /// Compression of the written GeoTIFF.
    pub compression: CompressionHint,

    /// Hex color painted on pixel values missing from the color table.
    /// Unset means such values fail the run.
    pub unmapped_color: Option<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            target_crs: CrsCode::Epsg3857,
            display_crs: CrsCode::Epsg4326,
            resampling: ResamplingMethod::Nearest,
            mask_sentinel: DEFAULT_MASK_SENTINEL,
            compression: CompressionHint::Lzw,
            unmapped_color: None,
        }
    }
}

impl PipelineConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from a variable lookup, ignoring unparseable values.
    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(val) = lookup("MAP_TARGET_CRS") {
            match CrsCode::parse(&val) {
                Ok(crs) => self.target_crs = crs,
                Err(e) => warn!(value = %val, error = %e, "Ignoring MAP_TARGET_CRS"),
            }
        }

        if let Some(val) = lookup("MAP_DISPLAY_CRS") {
            match CrsCode::parse(&val) {
                Ok(crs) => self.display_crs = crs,
                Err(e) => warn!(value = %val, error = %e, "Ignoring MAP_DISPLAY_CRS"),
            }
        }

        if let Some(val) = lookup("MAP_RESAMPLING") {
            match ResamplingMethod::from_str(&val) {
                Some(method) => self.resampling = method,
                None => warn!(value = %val, "Ignoring MAP_RESAMPLING"),
            }
        }

        if let Some(val) = lookup("MAP_MASK_SENTINEL") {
            if let Ok(sentinel) = val.parse() {
                self.mask_sentinel = sentinel;
            }
        }

        if let Some(val) = lookup("MAP_COMPRESSION") {
            if let Some(compression) = CompressionHint::from_str(&val) {
                self.compression = compression;
            }
        }

        if let Some(val) = lookup("MAP_UNMAPPED_COLOR") {
            self.unmapped_color = if val.trim().is_empty() { None } else { Some(val) };
        }

        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> MapResult<()> {
        self.unmapped_policy()?;
        Ok(())
    }

    /// Policy for pixel values missing from the color table.
    pub fn unmapped_policy(&self) -> MapResult<UnmappedPolicy> {
        match &self.unmapped_color {
            None => Ok(UnmappedPolicy::Fail),
            Some(hex) => hex_to_rgba(hex, CodecVariant::Exact)
                .map(UnmappedPolicy::Fallback)
                .map_err(|e| MapError::Config(format!("unmapped_color: {}", e))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use map_common::Rgba;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.target_crs, CrsCode::Epsg3857);
        assert_eq!(config.display_crs, CrsCode::Epsg4326);
        assert_eq!(config.resampling, ResamplingMethod::Nearest);
        assert_eq!(config.mask_sentinel, -9999.0);
        assert_eq!(config.compression, CompressionHint::Lzw);
        assert_eq!(config.unmapped_policy().unwrap(), UnmappedPolicy::Fail);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_overrides() {
        let config = PipelineConfig::default().with_overrides(lookup(&[
            ("MAP_TARGET_CRS", "EPSG:3577"),
            ("MAP_RESAMPLING", "bilinear"),
            ("MAP_MASK_SENTINEL", "-1"),
            ("MAP_COMPRESSION", "deflate"),
            ("MAP_UNMAPPED_COLOR", "#808080"),
        ]));

        assert_eq!(config.target_crs, CrsCode::Epsg3577);
        assert_eq!(config.display_crs, CrsCode::Epsg4326);
        assert_eq!(config.resampling, ResamplingMethod::Bilinear);
        assert_eq!(config.mask_sentinel, -1.0);
        assert_eq!(config.compression, CompressionHint::Deflate);
        assert_eq!(
            config.unmapped_policy().unwrap(),
            UnmappedPolicy::Fallback(Rgba::new(128, 128, 128, 255))
        );
    }

    #[test]
    fn test_bad_overrides_ignored() {
        let config = PipelineConfig::default().with_overrides(lookup(&[
            ("MAP_TARGET_CRS", "EPSG:99999"),
            ("MAP_RESAMPLING", "cubic"),
            ("MAP_MASK_SENTINEL", "lots"),
        ]));
        assert_eq!(config, PipelineConfig::default());
    }

    #[test]
    fn test_invalid_unmapped_color() {
        let config = PipelineConfig {
            unmapped_color: Some("not-a-color".to_string()),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(MapError::Config(_))));
    }

    #[test]
    fn test_yaml_partial() {
        let config: PipelineConfig = serde_yaml::from_str(
            "target_crs: EPSG:3577\nresampling: bilinear\ncompression: deflate\n",
        )
        .unwrap();
        assert_eq!(config.target_crs, CrsCode::Epsg3577);
        assert_eq!(config.resampling, ResamplingMethod::Bilinear);
        assert_eq!(config.compression, CompressionHint::Deflate);
        assert_eq!(config.display_crs, CrsCode::Epsg4326);
    }
}
