//! Linear-family transforms: pure translation and general affine.

use nalgebra::Matrix2;

use crate::{Point2, Vector2};

/// Translation by a constant vector, parameters `[tx, ty]`.
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationTransform {
    pub offset: Vector2,
}

impl TranslationTransform {
    pub fn new(tx: f64, ty: f64) -> Self {
        Self {
            offset: Vector2::new(tx, ty),
        }
    }

    pub fn transform_point(&self, p: &Point2) -> Point2 {
        p + self.offset
    }

    pub fn parameters(&self) -> [f64; 2] {
        [self.offset.x, self.offset.y]
    }
}

/// General affine transform about a fixed center:
///
/// ```text
/// p' = M · (p − c) + c + t
/// ```
///
/// Parameters are the row-major matrix entries followed by the translation:
/// `[a00, a01, a10, a11, tx, ty]`.
#[derive(Debug, Clone, PartialEq)]
pub struct AffineTransform {
    pub matrix: Matrix2<f64>,
    pub translation: Vector2,
    /// Fixed center; not part of the parameter vector.
    pub center: Point2,
}

impl AffineTransform {
    pub fn new(matrix: Matrix2<f64>, translation: Vector2, center: Point2) -> Self {
        Self {
            matrix,
            translation,
            center,
        }
    }

    /// Identity affine transform centered at the origin.
    pub fn identity() -> Self {
        Self::new(Matrix2::identity(), Vector2::zeros(), Point2::origin())
    }

    pub fn from_parameters(params: [f64; 6], center: Point2) -> Self {
        let [a00, a01, a10, a11, tx, ty] = params;
        Self::new(
            Matrix2::new(a00, a01, a10, a11),
            Vector2::new(tx, ty),
            center,
        )
    }

    pub fn transform_point(&self, p: &Point2) -> Point2 {
        self.center + self.matrix * (p - self.center) + self.translation
    }

    pub fn parameters(&self) -> [f64; 6] {
        let m = &self.matrix;
        [
            m[(0, 0)],
            m[(0, 1)],
            m[(1, 0)],
            m[(1, 1)],
            self.translation.x,
            self.translation.y,
        ]
    }
}
