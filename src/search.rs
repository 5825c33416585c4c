//! Nearest valid point search over a scattered point set.
//!
//! Query flow:
//! 1. Drop every point whose metric is below the threshold.
//! 2. Compute the Euclidean distance from the query coordinate to each survivor.
//! 3. Rank by `(distance, insertion index)` and keep the first `n`.
//!
//! The explicit index tie-break makes the ranking a strict total order, so the
//! result is reproducible no matter how points were gathered or how the
//! partial selection below happens to partition them.

use std::cmp::Ordering;

use crate::point::PointSet;
use crate::Point2;

/// A ranked search hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    /// Insertion index into the [`PointSet`].
    pub index: usize,
    /// Euclidean distance to the query coordinate.
    pub distance: f64,
}

fn rank_order(a: &Neighbor, b: &Neighbor) -> Ordering {
    a.distance
        .total_cmp(&b.distance)
        .then_with(|| a.index.cmp(&b.index))
}

/// Sort candidates nearest-first, breaking distance ties by insertion index.
pub fn rank_by_distance(candidates: &mut [Neighbor]) {
    candidates.sort_by(rank_order);
}

/// Return up to `n` nearest valid points to `query`, nearest first.
///
/// Points with `metric < metric_threshold` are excluded entirely. The result
/// is empty if no point is valid or `n == 0`.
pub fn nearest_valid(
    points: &PointSet,
    query: &Point2,
    n: usize,
    metric_threshold: f64,
) -> Vec<Neighbor> {
    if n == 0 {
        return Vec::new();
    }

    let mut candidates: Vec<Neighbor> = points
        .iter()
        .enumerate()
        .filter(|(_, p)| p.is_valid(metric_threshold))
        .map(|(index, p)| Neighbor {
            index,
            distance: (p.position - query).norm(),
        })
        .collect();

    if candidates.len() > n {
        candidates.select_nth_unstable_by(n - 1, rank_order);
        candidates.truncate(n);
    }
    rank_by_distance(&mut candidates);
    candidates
}

/// Reusable search bound to a point set and threshold.
#[derive(Debug, Clone, Copy)]
pub struct ValidPointSearch<'a> {
    points: &'a PointSet,
    metric_threshold: f64,
}

impl<'a> ValidPointSearch<'a> {
    pub fn new(points: &'a PointSet, metric_threshold: f64) -> Self {
        Self {
            points,
            metric_threshold,
        }
    }

    pub fn points(&self) -> &'a PointSet {
        self.points
    }

    /// See [`nearest_valid`].
    pub fn nearest(&self, query: &Point2, n: usize) -> Vec<Neighbor> {
        nearest_valid(self.points, query, n, self.metric_threshold)
    }
}
