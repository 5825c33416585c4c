//! Rotation-based transforms: rigid (rotation + translation) and similarity
//! (isotropic scale + rotation + translation).
//!
//! Both rotate about a fixed `center` that is not part of the parameter vector:
//!
//! ```text
//! p' = s · R(θ) · (p − c) + c + t
//! ```
//!
//! with `s = 1` for the rigid model.

use nalgebra::Rotation2;

use crate::{Point2, Vector2};

/// Rigid transform with parameters `[angle, tx, ty]`.
#[derive(Debug, Clone, PartialEq)]
pub struct RigidTransform {
    /// Rotation angle in radians.
    pub angle: f64,
    /// Translation applied after the rotation.
    pub translation: Vector2,
    /// Fixed rotation center.
    pub center: Point2,
}

impl RigidTransform {
    pub fn new(angle: f64, tx: f64, ty: f64, center: Point2) -> Self {
        Self {
            angle,
            translation: Vector2::new(tx, ty),
            center,
        }
    }

    pub fn transform_point(&self, p: &Point2) -> Point2 {
        let r = Rotation2::new(self.angle);
        self.center + r * (p - self.center) + self.translation
    }

    pub fn parameters(&self) -> [f64; 3] {
        [self.angle, self.translation.x, self.translation.y]
    }
}

/// Similarity transform with parameters `[scale, angle, tx, ty]`.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityTransform {
    /// Isotropic scale factor.
    pub scale: f64,
    /// Rotation angle in radians.
    pub angle: f64,
    /// Translation applied after scaling and rotation.
    pub translation: Vector2,
    /// Fixed center of rotation and scaling.
    pub center: Point2,
}

impl SimilarityTransform {
    pub fn new(scale: f64, angle: f64, tx: f64, ty: f64, center: Point2) -> Self {
        Self {
            scale,
            angle,
            translation: Vector2::new(tx, ty),
            center,
        }
    }

    pub fn transform_point(&self, p: &Point2) -> Point2 {
        let r = Rotation2::new(self.angle);
        self.center + (r * (p - self.center)) * self.scale + self.translation
    }

    pub fn parameters(&self) -> [f64; 4] {
        [
            self.scale,
            self.angle,
            self.translation.x,
            self.translation.y,
        ]
    }
}
