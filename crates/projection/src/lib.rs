//! Coordinate reference system transformations.
//!
//! Implements the map projections used by the pipeline from scratch, without
//! PROJ or GDAL. Every projected CRS is reached through geographic
//! longitude/latitude on the GRS80 ellipsoid.

pub mod albers;
pub mod ellipsoid;
pub mod geographic;
pub mod lambert;
pub mod mercator;
pub mod transform;

pub use albers::AlbersEqualArea;
pub use ellipsoid::Ellipsoid;
pub use geographic::Geographic;
pub use lambert::LambertConformal;
pub use mercator::WebMercator;
pub use transform::{Projection, Transformer, DEFAULT_DENSIFY_POINTS};
