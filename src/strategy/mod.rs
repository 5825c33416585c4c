//! Reconstruction strategies: how a single output site gets its value.
//!
//! A [`Strategy`] is the fieldless tag picked at configuration time. The
//! generator turns it into a [`PreparedStrategy`], which borrows the point set
//! (per-site strategies) or owns fitted surfaces (spline strategies), and is
//! then evaluated independently at every site.
//!
//! | Strategy | Search | Payload used |
//! |----------|--------|--------------|
//! | [`Strategy::NearestPoint`] | 1 nearest | displacement |
//! | [`Strategy::NearestKLinearBlend`] | N nearest | displacement, IDW blended |
//! | [`Strategy::NearestTransform`] | 1 nearest | transform evaluated at the site |
//! | [`Strategy::NearestKTransformBlend`] | N nearest | transforms evaluated at the site, IDW blended |
//! | [`Strategy::NearestKParameterBlend`] | N nearest | transform parameters IDW blended (no angles) |
//! | [`Strategy::SplineDisplacement`] | global fit | displacement components |
//! | [`Strategy::SplineTransform`] | global fit | transform parameter channels |

pub mod nearest;
pub mod spline_field;
pub mod transform_blend;

pub use nearest::{blend_weights, NearestKLinearBlendStrategy, NearestPointStrategy, DISTANCE_EPSILON};
pub use spline_field::{SplineDisplacementStrategy, SplineFieldReconstructionStrategy};
pub use transform_blend::{NearestKParameterBlendStrategy, NearestKTransformBlendStrategy};

use crate::error::{FieldError, Result};
use crate::generator::FieldConfig;
use crate::grid::OutputGridSpec;
use crate::point::PointSet;
use crate::{Point2, Vector2};

/// Reconstruction strategy selected at configuration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// Displacement of the nearest valid point, verbatim.
    NearestPoint,
    /// Inverse-distance blend of the N nearest displacements.
    NearestKLinearBlend,
    /// Nearest valid point's transform evaluated at the site.
    NearestTransform,
    /// Each of the N nearest transforms evaluated at the site, displaced
    /// points blended by inverse distance.
    NearestKTransformBlend,
    /// Parameters of the N nearest transforms blended by inverse distance,
    /// then one transform evaluated. Rejected when any parameter is angular.
    NearestKParameterBlend,
    /// Multilevel B-spline fit of the displacement components.
    SplineDisplacement,
    /// Multilevel B-spline fit of the transform parameter channels.
    SplineTransform,
}

impl Strategy {
    /// `true` when a global fit must run before evaluation.
    pub fn requires_fit(self) -> bool {
        matches!(self, Strategy::SplineDisplacement | Strategy::SplineTransform)
    }

    /// Configuration checks specific to this strategy.
    ///
    /// Spline preconditions (point count, angular index range, homogeneous
    /// transforms) are checked here so that a bad configuration fails before
    /// any fitting starts.
    pub fn validate(self, points: &PointSet, config: &FieldConfig) -> Result<()> {
        let threshold = config.metric_threshold;
        match self {
            Strategy::NearestPoint
            | Strategy::NearestKLinearBlend
            | Strategy::NearestTransform
            | Strategy::NearestKTransformBlend => Ok(()),
            Strategy::NearestKParameterBlend => {
                if let Some(&index) = config.spline.angular_parameter_indices.iter().next() {
                    return Err(FieldError::AngularParameterBlend { index });
                }
                match points.transform_kind(threshold)? {
                    Some(kind) => match kind.angular_parameters().first() {
                        Some(&index) => Err(FieldError::AngularParameterBlend { index }),
                        None => Ok(()),
                    },
                    None => Ok(()),
                }
            }
            Strategy::SplineDisplacement => {
                config.spline.validate()?;
                config.spline.check_angular_indices(0)?;
                config
                    .spline
                    .check_point_count(points.valid_indices(threshold).len())
            }
            Strategy::SplineTransform => {
                config.spline.validate()?;
                config
                    .spline
                    .check_point_count(points.valid_indices(threshold).len())?;
                if let Some(kind) = points.transform_kind(threshold)? {
                    config.spline.check_angular_indices(kind.num_parameters())?;
                }
                Ok(())
            }
        }
    }

    /// Bind the strategy to its inputs, running the global fit if needed.
    pub fn prepare<'a>(
        self,
        points: &'a PointSet,
        grid: &OutputGridSpec,
        config: &FieldConfig,
    ) -> Result<PreparedStrategy<'a>> {
        let threshold = config.metric_threshold;
        let n = config.neighbor_count;
        Ok(match self {
            Strategy::NearestPoint => {
                PreparedStrategy::NearestPoint(NearestPointStrategy::new(points, threshold))
            }
            Strategy::NearestKLinearBlend => PreparedStrategy::NearestKLinearBlend(
                NearestKLinearBlendStrategy::new(points, threshold, n),
            ),
            Strategy::NearestTransform => PreparedStrategy::NearestKTransformBlend(
                NearestKTransformBlendStrategy::new(points, threshold, 1),
            ),
            Strategy::NearestKTransformBlend => PreparedStrategy::NearestKTransformBlend(
                NearestKTransformBlendStrategy::new(points, threshold, n),
            ),
            Strategy::NearestKParameterBlend => PreparedStrategy::NearestKParameterBlend(
                NearestKParameterBlendStrategy::new(points, threshold, n),
            ),
            Strategy::SplineDisplacement => PreparedStrategy::SplineDisplacement(
                SplineDisplacementStrategy::fit(points, threshold, grid, &config.spline)?,
            ),
            Strategy::SplineTransform => PreparedStrategy::SplineTransform(
                SplineFieldReconstructionStrategy::fit(points, threshold, grid, &config.spline)?,
            ),
        })
    }
}

/// A strategy bound to its inputs and ready to evaluate sites.
#[derive(Debug, Clone)]
pub enum PreparedStrategy<'a> {
    NearestPoint(NearestPointStrategy<'a>),
    NearestKLinearBlend(NearestKLinearBlendStrategy<'a>),
    NearestKTransformBlend(NearestKTransformBlendStrategy<'a>),
    NearestKParameterBlend(NearestKParameterBlendStrategy<'a>),
    SplineDisplacement(SplineDisplacementStrategy),
    SplineTransform(SplineFieldReconstructionStrategy),
}

impl PreparedStrategy<'_> {
    /// Displacement at the physical coordinate `site`, or `None` when no
    /// valid point is available.
    pub fn evaluate(&self, site: &Point2) -> Option<Vector2> {
        match self {
            PreparedStrategy::NearestPoint(s) => s.evaluate(site),
            PreparedStrategy::NearestKLinearBlend(s) => s.evaluate(site),
            PreparedStrategy::NearestKTransformBlend(s) => s.evaluate(site),
            PreparedStrategy::NearestKParameterBlend(s) => s.evaluate(site),
            PreparedStrategy::SplineDisplacement(s) => s.evaluate(site),
            PreparedStrategy::SplineTransform(s) => s.evaluate(site),
        }
    }
}
