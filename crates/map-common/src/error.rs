//! Error types for the map styling pipeline.

use thiserror::Error;

/// Result type alias using MapError.
pub type MapResult<T> = Result<T, MapError>;

/// Primary error type for pipeline operations.
///
/// Every stage fails fast: a partially colored or partially reprojected
/// raster is never returned.
#[derive(Debug, Error)]
pub enum MapError {
    // === Palette Errors ===
    #[error("Invalid color '{value}': {reason}")]
    InvalidColorFormat { value: String, reason: String },

    // === Stage Errors ===
    #[error("{stage}: value {source_value} maps to {mapped}, which does not fit in {target}")]
    ReclassificationOverflow {
        stage: &'static str,
        source_value: i64,
        mapped: i64,
        target: &'static str,
    },

    #[error("{stage}: pixel value {value} has no color table entry ({count} pixels affected)")]
    UnmappedPixelValue {
        stage: &'static str,
        value: i64,
        count: usize,
    },

    #[error("{stage}: grid mismatch, expected {expected:?} (width, height) but got {actual:?}")]
    DimensionMismatch {
        stage: &'static str,
        expected: (usize, usize),
        actual: (usize, usize),
    },

    #[error("Unsupported projection: {0}")]
    UnsupportedProjection(String),

    // === Data Errors ===
    #[error("Invalid raster: {0}")]
    InvalidRaster(String),

    #[error("Invalid BBOX: {0}")]
    InvalidBbox(String),

    #[error("Configuration error: {0}")]
    Config(String),

    // === I/O Errors ===
    #[error("I/O failure on '{path}': {message}")]
    Io { path: String, message: String },
}

impl MapError {
    /// Create an Io error for a path.
    pub fn io(path: impl Into<String>, message: impl ToString) -> Self {
        Self::Io {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Create an InvalidColorFormat error.
    pub fn invalid_color(value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidColorFormat {
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Whether re-running the whole pipeline could succeed.
    ///
    /// Only I/O failures qualify; everything else is a data or programmer error.
    pub fn is_retryable(&self) -> bool {
        matches!(self, MapError::Io { .. })
    }
}

impl From<std::io::Error> for MapError {
    fn from(err: std::io::Error) -> Self {
        MapError::Io {
            path: String::from("<stream>"),
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for MapError {
    fn from(err: serde_json::Error) -> Self {
        MapError::Config(format!("JSON error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_io_is_retryable() {
        assert!(MapError::io("out.tif", "disk full").is_retryable());
        assert!(!MapError::UnsupportedProjection("EPSG:1".into()).is_retryable());
        assert!(!MapError::UnmappedPixelValue {
            stage: "expand",
            value: 7,
            count: 3
        }
        .is_retryable());
    }

    #[test]
    fn test_messages_carry_context() {
        let err = MapError::ReclassificationOverflow {
            stage: "reclassify",
            source_value: 5,
            mapped: 300,
            target: "i8",
        };
        let msg = err.to_string();
        assert!(msg.contains("reclassify"));
        assert!(msg.contains("300"));
        assert!(msg.contains("i8"));
    }
}
