//! Parametric 2D transforms attached to correspondence points.
//!
//! Every transform exposes a fixed-length **parameter vector** plus optional
//! fixed parameters (a rotation center) that are not part of that vector.
//! Strategies that fit or blend transforms work on the parameter vector and
//! rebuild a transform of the same kind with [`Transform::with_parameters`].
//!
//! # Supported models
//!
//! | Model | Parameters | Angular |
//! |-------|------------|---------|
//! | [`Transform::Translation`] | `[tx, ty]` | none |
//! | [`Transform::Rigid`] | `[angle, tx, ty]` | 0 |
//! | [`Transform::Similarity`] | `[scale, angle, tx, ty]` | 1 |
//! | [`Transform::Affine`] | `[a00, a01, a10, a11, tx, ty]` | none |
//!
//! Angles are in radians and cyclic in `[-π, π)`.

pub mod affine;
pub mod rigid;

pub use affine::{AffineTransform, TranslationTransform};
pub use rigid::{RigidTransform, SimilarityTransform};

use std::f64::consts::{PI, TAU};

use crate::error::{FieldError, Result};
use crate::Point2;

/// Fieldless tag identifying a transform model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransformKind {
    Translation,
    Rigid,
    Similarity,
    Affine,
}

impl TransformKind {
    /// Length of the parameter vector for this model.
    pub fn num_parameters(self) -> usize {
        match self {
            TransformKind::Translation => 2,
            TransformKind::Rigid => 3,
            TransformKind::Similarity => 4,
            TransformKind::Affine => 6,
        }
    }

    /// Parameter indices the model itself defines as angles.
    pub fn angular_parameters(self) -> &'static [usize] {
        match self {
            TransformKind::Rigid => &[0],
            TransformKind::Similarity => &[1],
            TransformKind::Translation | TransformKind::Affine => &[],
        }
    }
}

/// A 2D point-to-point transform.
#[derive(Debug, Clone, PartialEq)]
pub enum Transform {
    Translation(TranslationTransform),
    Rigid(RigidTransform),
    Similarity(SimilarityTransform),
    Affine(AffineTransform),
}

impl Transform {
    /// Map a point through the transform.
    pub fn transform_point(&self, p: &Point2) -> Point2 {
        match self {
            Transform::Translation(t) => t.transform_point(p),
            Transform::Rigid(t) => t.transform_point(p),
            Transform::Similarity(t) => t.transform_point(p),
            Transform::Affine(t) => t.transform_point(p),
        }
    }

    pub fn kind(&self) -> TransformKind {
        match self {
            Transform::Translation(_) => TransformKind::Translation,
            Transform::Rigid(_) => TransformKind::Rigid,
            Transform::Similarity(_) => TransformKind::Similarity,
            Transform::Affine(_) => TransformKind::Affine,
        }
    }

    pub fn num_parameters(&self) -> usize {
        self.kind().num_parameters()
    }

    /// The parameter vector, laid out as in the module-level table.
    pub fn parameters(&self) -> Vec<f64> {
        match self {
            Transform::Translation(t) => t.parameters().to_vec(),
            Transform::Rigid(t) => t.parameters().to_vec(),
            Transform::Similarity(t) => t.parameters().to_vec(),
            Transform::Affine(t) => t.parameters().to_vec(),
        }
    }

    pub fn angular_parameters(&self) -> &'static [usize] {
        self.kind().angular_parameters()
    }

    /// Build a transform of the same kind and fixed parameters with a new
    /// parameter vector.
    pub fn with_parameters(&self, params: &[f64]) -> Result<Transform> {
        let expected = self.num_parameters();
        if params.len() != expected {
            return Err(FieldError::ParameterCount {
                kind: self.kind(),
                expected,
                got: params.len(),
            });
        }
        Ok(match self {
            Transform::Translation(_) => {
                Transform::Translation(TranslationTransform::new(params[0], params[1]))
            }
            Transform::Rigid(t) => {
                Transform::Rigid(RigidTransform::new(params[0], params[1], params[2], t.center))
            }
            Transform::Similarity(t) => Transform::Similarity(SimilarityTransform::new(
                params[0], params[1], params[2], params[3], t.center,
            )),
            Transform::Affine(t) => Transform::Affine(AffineTransform::from_parameters(
                [params[0], params[1], params[2], params[3], params[4], params[5]],
                t.center,
            )),
        })
    }
}

/// Wrap an angle into `[-π, π)`.
pub fn wrap_angle(theta_rad: f64) -> f64 {
    (theta_rad + PI).rem_euclid(TAU) - PI
}
