//! Strategies blending the local transforms of nearby points.
//!
//! Two blending policies exist and are deliberately separate strategies:
//!
//! - [`NearestKTransformBlendStrategy`] evaluates each neighbor's transform at
//!   the site and blends the displaced points. Safe for any transform model.
//! - [`NearestKParameterBlendStrategy`] blends parameter vectors and evaluates
//!   one synthesized transform. Only valid when no parameter is angular; the
//!   generator rejects it otherwise.

use crate::point::PointSet;
use crate::search::ValidPointSearch;
use crate::{Point2, Vector2};

use super::nearest::{blend_weights, weighted_sum};

/// Inverse-distance blend of the points the `n` nearest transforms map the site to.
///
/// With `n == 1` this is the nearest-transform strategy.
#[derive(Debug, Clone, Copy)]
pub struct NearestKTransformBlendStrategy<'a> {
    search: ValidPointSearch<'a>,
    neighbor_count: usize,
}

impl<'a> NearestKTransformBlendStrategy<'a> {
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
        // Weights sum to one, so blending displaced points equals blending
        // their offsets from the site.
        weighted_sum(neighbors.iter().zip(&weights).filter_map(|(n, &w)| {
            let p = points.get(n.index)?;
            Some((w, p.payload.displaced(site) - site))
        }))
    }
}

/// Evaluates one transform whose parameters are the inverse-distance blend of
/// the `n` nearest transforms' parameters.
///
/// The nearest neighbor's transform supplies the model and its fixed
/// parameters (rotation center).
#[derive(Debug, Clone, Copy)]
pub struct NearestKParameterBlendStrategy<'a> {
    search: ValidPointSearch<'a>,
    neighbor_count: usize,
}

impl<'a> NearestKParameterBlendStrategy<'a> {
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

        let template = points.get(neighbors.first()?.index)?.payload.transform()?;
        let mut params = vec![0.0; template.num_parameters()];
        for (n, &w) in neighbors.iter().zip(&weights) {
            let t = points.get(n.index)?.payload.transform()?;
            for (acc, v) in params.iter_mut().zip(t.parameters()) {
                *acc += w * v;
            }
        }

        // `params` was sized from the template, so the rebuild cannot fail
        let blended = template.with_parameters(&params);
        debug_assert!(blended.is_ok(), "blended parameters do not fit the template: {:?}", blended);
        Some(blended.ok()?.transform_point(site) - site)
    }
}
