//! Resampling methods for grid reprojection.
//!
//! Sample positions are fractional pixel coordinates in the source grid:
//! pixel `(col, row)` covers `[col, col + 1) × [row, row + 1)` and its
//! centre sits at `(col + 0.5, row + 0.5)`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Resampling method used when warping a grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResamplingMethod {
    /// Nearest neighbor (preserves exact values, required for categories).
    #[default]
    Nearest,
    /// Bilinear interpolation (smooth, for continuous data).
    Bilinear,
}

impl ResamplingMethod {
    /// Parse from string (case-insensitive).
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "nearest" | "near" => Some(Self::Nearest),
            "bilinear" | "linear" => Some(Self::Bilinear),
            _ => None,
        }
    }
}

impl fmt::Display for ResamplingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nearest => write!(f, "nearest"),
            Self::Bilinear => write!(f, "bilinear"),
        }
    }
}

/// Index of the source pixel containing position (`x`, `y`), if any.
pub fn nearest_index(width: usize, height: usize, x: f64, y: f64) -> Option<usize> {
    if !(x >= 0.0 && y >= 0.0) {
        return None;
    }
    let col = x.floor() as usize;
    let row = y.floor() as usize;

    if col >= width || row >= height {
        return None;
    }
    Some(row * width + col)
}

/// Bilinear interpolation between the four pixel centres around (`x`, `y`).
///
/// Positions within half a pixel of the edge clamp to the edge pixels.
/// Returns None when the position is outside the grid or any neighbour is
/// invalid according to `is_valid`.
pub fn bilinear_interpolate(
    data: &[f64],
    width: usize,
    height: usize,
    x: f64,
    y: f64,
    is_valid: impl Fn(f64) -> bool,
) -> Option<f64> {
    nearest_index(width, height, x, y)?;

    // Shift to pixel-centre coordinates
    let cx = (x - 0.5).clamp(0.0, (width - 1) as f64);
    let cy = (y - 0.5).clamp(0.0, (height - 1) as f64);

    let x0 = cx.floor() as usize;
    let y0 = cy.floor() as usize;
    let x1 = (x0 + 1).min(width - 1);
    let y1 = (y0 + 1).min(height - 1);

    let xf = cx - x0 as f64;
    let yf = cy - y0 as f64;

    let v00 = data[y0 * width + x0];
    let v10 = data[y0 * width + x1];
    let v01 = data[y1 * width + x0];
    let v11 = data[y1 * width + x1];

    if ![v00, v10, v01, v11].into_iter().all(is_valid) {
        return None;
    }

    // Bilinear interpolation formula
    let top = v00 * (1.0 - xf) + v10 * xf;
    let bottom = v01 * (1.0 - xf) + v11 * xf;
    Some(top * (1.0 - yf) + bottom * yf)
}
