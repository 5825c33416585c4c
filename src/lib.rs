//! # densefield
//!
//! Dense displacement (disparity) field reconstruction from sparse, scattered
//! correspondence points.
//!
//! Given a set of points, each carrying a displacement vector or a local
//! transform plus a confidence metric, `densefield` computes one displacement
//! vector for every site of a regular output grid. Feature matching, raster
//! I/O and resampling belong to the surrounding pipeline; this crate only
//! produces the values.
//!
//! ## Example
//!
//! ```
//! use densefield::{
//!     CorrespondencePoint, FieldConfig, FieldGenerator, OutputGridSpec, Point2, PointSet,
//!     Strategy, Vector2,
//! };
//!
//! let mut points = PointSet::new();
//! points.push(CorrespondencePoint::with_displacement(
//!     Point2::new(10.0, 10.0),
//!     Vector2::new(1.5, -0.5),
//!     0.9,
//! ));
//! points.push(CorrespondencePoint::with_displacement(
//!     Point2::new(40.0, 25.0),
//!     Vector2::new(2.0, 0.0),
//!     0.8,
//! ));
//!
//! // 64 x 32 sites, 1 unit per cell, north-up (negative y spacing)
//! let grid = OutputGridSpec::new(64, 32, Vector2::new(1.0, -1.0), Point2::new(0.0, 31.0));
//! let config = FieldConfig {
//!     metric_threshold: 0.5,
//!     neighbor_count: 2,
//!     ..Default::default()
//! };
//!
//! let generator = FieldGenerator::new(&points, grid, config, Strategy::NearestKLinearBlend)?;
//! let field = generator.generate()?;
//! assert_eq!(field.values().len(), 64 * 32);
//! # Ok::<(), densefield::FieldError>(())
//! ```
//!
//! ## Strategies
//!
//! - **Nearest point / N-nearest blend**: inverse-distance weighting of the
//!   displacements of the nearest valid points.
//! - **Nearest transform / N-nearest transform blend**: neighbors' transforms
//!   are evaluated at the site and the displaced points blended.
//! - **N-nearest parameter blend**: transform parameters blended, then one
//!   transform evaluated; refused for angular parameters.
//! - **Spline**: one multilevel B-spline fit per channel over all valid
//!   points, with angular channels fitted through `(cos, sin)`.
//!
//! See [`strategy`] for details.

pub mod error;
pub mod generator;
pub mod grid;
pub mod point;
pub mod search;
pub mod spline;
pub mod strategy;
pub mod transform;

pub use error::{FieldError, Result};
pub use generator::{CancelToken, FieldConfig, FieldGenerator};
pub use grid::{Field, OutputGridSpec};
pub use point::{CorrespondencePoint, Payload, PointSet};
pub use search::{nearest_valid, rank_by_distance, Neighbor, ValidPointSearch};
pub use spline::{AngularChannelAdapter, SplineConfig};
pub use strategy::{PreparedStrategy, Strategy};
pub use transform::{Transform, TransformKind};

// Commonly used types. All geometry is double precision.
pub type Point2 = nalgebra::Point2<f64>;
pub type Vector2 = nalgebra::Vector2<f64>;
