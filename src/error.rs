//! Error type shared by every stage of field generation.
//!
//! Almost every variant is a configuration error: it is raised while the
//! generator is being configured, before any output exists. Per-site data
//! insufficiency is not an error at all (strategies return `None` and the
//! default value is written), and zero distances are absorbed by the
//! inverse-distance ε-guard.

use crate::transform::TransformKind;

/// Errors produced while configuring or running a [`FieldGenerator`](crate::FieldGenerator).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FieldError {
    #[error("output grid must have at least one site, got {width}x{height}")]
    InvalidGridSize { width: usize, height: usize },

    #[error("grid spacing along {axis} must be finite and non-zero, got {value}")]
    InvalidSpacing { axis: char, value: f64 },

    #[error("neighbor count must be at least 1")]
    ZeroNeighborCount,

    #[error("metric threshold must not be NaN")]
    InvalidMetricThreshold,

    #[error("spline order must be in 1..=5, got {0}")]
    InvalidSplineOrder(u32),

    #[error("spline of order {order} needs more than {order} control points, got {control_points}")]
    TooFewControlPoints { order: u32, control_points: usize },

    #[error("spline level count must be at least 1")]
    ZeroLevels,

    #[error("spline fit needs at least {required} valid points for the finest level, got {available}")]
    TooFewPointsForSpline { required: usize, available: usize },

    #[error("spline fit got {positions} positions but {values} values")]
    SampleCountMismatch { positions: usize, values: usize },

    #[error("sample {index} has {got} parameters, expected {expected}")]
    SampleLength {
        index: usize,
        expected: usize,
        got: usize,
    },

    #[error("angular parameter index {index} is outside the {num_parameters}-element parameter vector")]
    AngularIndexOutOfRange { index: usize, num_parameters: usize },

    #[error("point {index} carries a displacement, but the strategy needs a transform")]
    MissingTransform { index: usize },

    #[error("valid points mix transform kinds {first:?} and {other:?}")]
    MixedTransformKinds {
        first: TransformKind,
        other: TransformKind,
    },

    #[error("parameter {index} is angular and cannot be blended linearly")]
    AngularParameterBlend { index: usize },

    #[error("{kind:?} transform takes {expected} parameters, got {got}")]
    ParameterCount {
        kind: TransformKind,
        expected: usize,
        got: usize,
    },

    #[error("field generation cancelled after {completed_tiles} of {total_tiles} tiles")]
    Cancelled {
        completed_tiles: usize,
        total_tiles: usize,
    },
}

impl FieldError {
    /// `true` for the fatal configuration taxonomy (everything except cancellation).
    pub fn is_configuration(&self) -> bool {
        !matches!(self, FieldError::Cancelled { .. })
    }
}

pub type Result<T> = std::result::Result<T, FieldError>;
