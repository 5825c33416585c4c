//! Scattered correspondence points: the input of field generation.
//!
//! Each point sits at a physical position, carries either a known
//! displacement or a local transform, and a confidence metric (for example a
//! registration residual score). Points whose metric falls below the
//! configured threshold are invalid and never take part in a computation.

use crate::error::{FieldError, Result};
use crate::transform::{Transform, TransformKind};
use crate::{Point2, Vector2};

/// What a correspondence point knows about the mapping at its position.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// A displacement vector measured at the point.
    Displacement(Vector2),
    /// A local transform estimated around the point.
    Transform(Transform),
}

impl Payload {
    /// Where this payload sends `site`.
    ///
    /// A displacement is treated as locally constant: `site + d`.
    pub fn displaced(&self, site: &Point2) -> Point2 {
        match self {
            Payload::Displacement(d) => site + d,
            Payload::Transform(t) => t.transform_point(site),
        }
    }

    /// The displacement at the point's own `position`.
    pub fn displacement(&self, position: &Point2) -> Vector2 {
        match self {
            Payload::Displacement(d) => *d,
            Payload::Transform(t) => t.transform_point(position) - position,
        }
    }

    pub fn transform(&self) -> Option<&Transform> {
        match self {
            Payload::Displacement(_) => None,
            Payload::Transform(t) => Some(t),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CorrespondencePoint {
    /// Physical coordinate of the sample.
    pub position: Point2,
    pub payload: Payload,
    /// Confidence; the point is valid when `metric >= threshold`.
    pub metric: f64,
}

impl CorrespondencePoint {
    pub fn with_displacement(position: Point2, displacement: Vector2, metric: f64) -> Self {
        Self {
            position,
            payload: Payload::Displacement(displacement),
            metric,
        }
    }

    pub fn with_transform(position: Point2, transform: Transform, metric: f64) -> Self {
        Self {
            position,
            payload: Payload::Transform(transform),
            metric,
        }
    }

    pub fn is_valid(&self, threshold: f64) -> bool {
        self.metric >= threshold
    }
}

/// Ordered collection of correspondence points.
///
/// The set owns every point and its transform; strategies only borrow it for
/// the duration of a generation run. Indices are insertion indices and serve
/// as the tie-break key of the neighbor search.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointSet {
    points: Vec<CorrespondencePoint>,
}

impl PointSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, point: CorrespondencePoint) {
        self.points.push(point);
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[CorrespondencePoint] {
        &self.points
    }

    pub fn get(&self, index: usize) -> Option<&CorrespondencePoint> {
        self.points.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CorrespondencePoint> {
        self.points.iter()
    }

    /// Insertion indices of all points with `metric >= threshold`.
    pub fn valid_indices(&self, threshold: f64) -> Vec<usize> {
        self.points
            .iter()
            .enumerate()
            .filter(|(_, p)| p.is_valid(threshold))
            .map(|(i, _)| i)
            .collect()
    }

    /// Common transform kind of all valid points.
    ///
    /// Returns `Ok(None)` when no point is valid. Fails if a valid point
    /// carries a plain displacement or if valid points mix transform kinds.
    pub fn transform_kind(&self, threshold: f64) -> Result<Option<TransformKind>> {
        let mut kind: Option<TransformKind> = None;
        for (index, point) in self.points.iter().enumerate() {
            if !point.is_valid(threshold) {
                continue;
            }
            let t = point
                .payload
                .transform()
                .ok_or(FieldError::MissingTransform { index })?;
            match kind {
                None => kind = Some(t.kind()),
                Some(first) if first != t.kind() => {
                    return Err(FieldError::MixedTransformKinds {
                        first,
                        other: t.kind(),
                    });
                }
                Some(_) => {}
            }
        }
        Ok(kind)
    }
}

impl FromIterator<CorrespondencePoint> for PointSet {
    fn from_iter<I: IntoIterator<Item = CorrespondencePoint>>(iter: I) -> Self {
        Self {
            points: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a PointSet {
    type Item = &'a CorrespondencePoint;
    type IntoIter = std::slice::Iter<'a, CorrespondencePoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::{RigidTransform, TranslationTransform};

    #[test]
    fn test_payload_displacement_of_transform() {
        let t = Transform::Translation(TranslationTransform::new(2.0, -1.0));
        let payload = Payload::Transform(t);
        let d = payload.displacement(&Point2::new(5.0, 5.0));
        assert_eq!(d, Vector2::new(2.0, -1.0));
        assert_eq!(
            payload.displaced(&Point2::new(0.0, 0.0)),
            Point2::new(2.0, -1.0)
        );
    }

    #[test]
    fn test_valid_indices_threshold_is_inclusive() {
        let points: PointSet = [0.2, 0.5, 0.9]
            .iter()
            .map(|&m| CorrespondencePoint::with_displacement(Point2::origin(), Vector2::zeros(), m))
            .collect();
        assert_eq!(points.valid_indices(0.5), vec![1, 2]);
        assert!(points.valid_indices(1.0).is_empty());
    }

    #[test]
    fn test_transform_kind_ignores_invalid_points() {
        let mut points = PointSet::new();
        points.push(CorrespondencePoint::with_displacement(
            Point2::origin(),
            Vector2::zeros(),
            0.0,
        ));
        points.push(CorrespondencePoint::with_transform(
            Point2::new(1.0, 1.0),
            Transform::Rigid(RigidTransform::new(0.1, 0.0, 0.0, Point2::origin())),
            1.0,
        ));
        assert_eq!(points.transform_kind(0.5).unwrap(), Some(TransformKind::Rigid));
        assert_eq!(
            points.transform_kind(-1.0).unwrap_err(),
            FieldError::MissingTransform { index: 0 }
        );
    }

    #[test]
    fn test_transform_kind_rejects_mixed_kinds() {
        let mut points = PointSet::new();
        points.push(CorrespondencePoint::with_transform(
            Point2::origin(),
            Transform::Translation(TranslationTransform::new(0.0, 0.0)),
            1.0,
        ));
        points.push(CorrespondencePoint::with_transform(
            Point2::origin(),
            Transform::Rigid(RigidTransform::new(0.0, 0.0, 0.0, Point2::origin())),
            1.0,
        ));
        assert!(matches!(
            points.transform_kind(0.0),
            Err(FieldError::MixedTransformKinds { .. })
        ));
    }
}
