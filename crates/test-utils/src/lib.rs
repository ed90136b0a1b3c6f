//! Shared test utilities for the land-use map styling workspace.
//!
//! This crate provides common testing infrastructure including:
//! - Synthetic categorical and fractional grid generators
//! - Fixture rasters on a known Australian Albers grid
//! - Approximate-equality assertion macros
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```
//!
//! Then import in your tests:
//!
//! ```ignore
//! use test_utils::{fixtures, create_class_grid};
//! ```

pub mod fixtures;
pub mod generators;

// Re-export commonly used items at the crate root
pub use fixtures::*;
pub use generators::*;

/// Macro for approximate floating-point equality assertions.
///
/// # Usage
///
/// ```ignore
/// use test_utils::assert_approx_eq;
///
/// assert_approx_eq!(1.0001_f64, 1.0_f64, 0.001_f64); // passes
/// assert_approx_eq!(1.1_f32, 1.0_f32, 0.001_f32);    // fails
/// ```
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left: f64 = $left as f64;
        let right: f64 = $right as f64;
        let epsilon: f64 = $epsilon as f64;
        let diff = (left - right).abs();
        if diff > epsilon {
            panic!(
                "assertion failed: `(left ≈ right)`\n  left: `{:?}`,\n right: `{:?}`,\n  diff: `{:?}` > epsilon `{:?}`",
                left, right, diff, epsilon
            );
        }
    }};
}

/// Assert that the first bounding box encloses the second within a tolerance.
///
/// # Usage
///
/// ```ignore
/// use test_utils::assert_bbox_covers;
///
/// assert_bbox_covers!(output.bounds(), transformed_extent, 1e-6);
/// ```
#[macro_export]
macro_rules! assert_bbox_covers {
    ($outer:expr, $inner:expr, $epsilon:expr) => {{
        let outer = $outer;
        let inner = $inner;
        if !outer.covers(&inner, $epsilon) {
            panic!(
                "assertion failed: bbox does not cover\n outer: `{:?}`,\n inner: `{:?}`",
                outer, inner
            );
        }
    }};
}
