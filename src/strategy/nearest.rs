//! Displacement strategies driven by the nearest valid points.

use crate::point::PointSet;
use crate::search::{Neighbor, ValidPointSearch};
use crate::{Point2, Vector2};

/// Distances at or below this are treated as coincident.
pub const DISTANCE_EPSILON: f64 = 1e-12;

/// Normalized inverse-distance weights for ranked neighbors.
///
/// `w_i = 1 / max(d_i, ε)`, normalized to sum to one. When the nearest
/// neighbor coincides with the query (`d ≤ ε`) it takes the whole weight, so
/// its value is reproduced exactly.
pub fn blend_weights(neighbors: &[Neighbor]) -> Vec<f64> {
    let Some(first) = neighbors.first() else {
        return Vec::new();
    };
    if first.distance <= DISTANCE_EPSILON {
        let mut w = vec![0.0; neighbors.len()];
        w[0] = 1.0;
        return w;
    }
    let inv: Vec<f64> = neighbors
        .iter()
        .map(|n| 1.0 / n.distance.max(DISTANCE_EPSILON))
        .collect();
    let total: f64 = inv.iter().sum();
    inv.into_iter().map(|w| w / total).collect()
}

/// `Σ w_i · v_i`, seeded with the first term so a single unit weight returns
/// its vector bit for bit.
pub(crate) fn weighted_sum<I>(terms: I) -> Option<Vector2>
where
    I: IntoIterator<Item = (f64, Vector2)>,
{
    let mut iter = terms.into_iter();
    let (w0, v0) = iter.next()?;
    let mut acc = v0 * w0;
    for (w, v) in iter {
        acc += v * w;
    }
    Some(acc)
}

/// Copies the displacement of the single nearest valid point.
#[derive(Debug, Clone, Copy)]
pub struct NearestPointStrategy<'a> {
    search: ValidPointSearch<'a>,
}

impl<'a> NearestPointStrategy<'a> {
    pub fn new(points: &'a PointSet, metric_threshold: f64) -> Self {
        Self {
            search: ValidPointSearch::new(points, metric_threshold),
        }
    }

    pub fn evaluate(&self, site: &Point2) -> Option<Vector2> {
        let nearest = self.search.nearest(site, 1);
        let point = self.search.points().get(nearest.first()?.index)?;
        Some(point.payload.displacement(&point.position))
    }
}

/// Inverse-distance blend of the displacements of the `n` nearest valid points.
#[derive(Debug, Clone, Copy)]
pub struct NearestKLinearBlendStrategy<'a> {
    search: ValidPointSearch<'a>,
    neighbor_count: usize,
}

impl<'a> NearestKLinearBlendStrategy<'a> {
    pub fn new(points: &'a PointSet, metric_threshold: f64, neighbor_count: usize) -> Self {
        Self {
            search: ValidPointSearch::new(points, metric_threshold),
            neighbor_count,
        }
    }

    pub fn evaluate(&self, site: &Point2) -> Option<Vector2> {
        let neighbors = self.search.nearest(site, self.neighbor_count);
        let weights = blend_weights(&neighbors);
        let points = self.search.points();
        weighted_sum(neighbors.iter().zip(&weights).filter_map(|(n, &w)| {
            let p = points.get(n.index)?;
            Some((w, p.payload.displacement(&p.position)))
        }))
    }
}
