//! Multilevel B-spline approximation of scattered scalar data.
//!
//! Implements the BA / MBA scheme of Lee, Wolberg & Shin (1997): each level
//! is a uniform tensor-product control lattice whose coefficients are local
//! least-squares estimates accumulated over the scattered samples
//!
//! ```text
//! φ_c  = w_c · z / Σ_ab w_ab²            (per sample, per control point)
//! φ    = Σ_samples w_c² · φ_c / Σ_samples w_c²
//! ```
//!
//! Level `l + 1` doubles the number of spans and fits the residuals left by
//! levels `0..=l`. The approximation is the sum of all levels.

use nalgebra::DMatrix;
use tracing::debug;

use crate::error::{FieldError, Result};
use crate::{Point2, Vector2};

/// Highest supported spline degree.
pub const MAX_ORDER: usize = 5;

/// Uniform B-spline basis weights of degree `order` at local parameter `s ∈ [0, 1]`.
///
/// Entry `j` weights control point `i + j` of the span starting at `i`;
/// entries past `order` are zero. The weights sum to one.
pub fn basis_weights(order: usize, s: f64) -> [f64; MAX_ORDER + 1] {
    debug_assert!(order <= MAX_ORDER);
    let mut w = [0.0; MAX_ORDER + 1];
    w[0] = 1.0;
    // Cardinal B-spline recurrence:
    // M_k(x) = (x·M_{k-1}(x) + (k+1-x)·M_{k-1}(x-1)) / k, with w_j = M_k(s + k - j)
    for k in 1..=order {
        let kf = k as f64;
        let mut next = [0.0; MAX_ORDER + 1];
        for (j, slot) in next.iter_mut().enumerate().take(k + 1) {
            let left = if j >= 1 { w[j - 1] } else { 0.0 };
            let right = if j < k { w[j] } else { 0.0 };
            let jf = j as f64;
            *slot = ((s + kf - jf) * left + (jf + 1.0 - s) * right) / kf;
        }
        w = next;
    }
    w
}

/// Axis-aligned parametric domain shared by all levels and channels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplineDomain {
    pub min: Point2,
    pub extent: Vector2,
}

impl SplineDomain {
    /// Smallest box containing every point. Degenerate axes get unit extent.
    pub fn enclosing<I>(points: I) -> Self
    where
        I: IntoIterator<Item = Point2>,
    {
        let mut lo = Point2::new(f64::INFINITY, f64::INFINITY);
        let mut hi = Point2::new(f64::NEG_INFINITY, f64::NEG_INFINITY);
        for p in points {
            lo.x = lo.x.min(p.x);
            lo.y = lo.y.min(p.y);
            hi.x = hi.x.max(p.x);
            hi.y = hi.y.max(p.y);
        }
        if !lo.x.is_finite() || !hi.x.is_finite() {
            return Self {
                min: Point2::origin(),
                extent: Vector2::new(1.0, 1.0),
            };
        }
        let ext = |a: f64, b: f64| if b - a > 0.0 { b - a } else { 1.0 };
        Self {
            min: lo,
            extent: Vector2::new(ext(lo.x, hi.x), ext(lo.y, hi.y)),
        }
    }

    /// Locate `p` on a lattice with `spans` spans per axis.
    ///
    /// Returns the first control index and basis weights for each axis.
    /// Coordinates outside the domain are clamped to its border.
    fn locate(&self, p: &Point2, spans: usize, order: usize) -> (Support, Support) {
        let u = ((p.x - self.min.x) / self.extent.x).clamp(0.0, 1.0) * spans as f64;
        let v = ((p.y - self.min.y) / self.extent.y).clamp(0.0, 1.0) * spans as f64;
        (Support::new(u, spans, order), Support::new(v, spans, order))
    }
}

#[derive(Debug, Clone, Copy)]
struct Support {
    first: usize,
    weights: [f64; MAX_ORDER + 1],
}

impl Support {
    fn new(u: f64, spans: usize, order: usize) -> Self {
        let first = (u.floor() as usize).min(spans - 1);
        let s = u - first as f64;
        Self {
            first,
            weights: basis_weights(order, s),
        }
    }
}

/// One control lattice of `(spans + order)²` coefficients.
#[derive(Debug, Clone)]
struct ControlLattice {
    spans: usize,
    phi: DMatrix<f64>,
}

impl ControlLattice {
    /// Single-level BA fit of `values` sampled at `positions`.
    fn fit(
        domain: &SplineDomain,
        order: usize,
        spans: usize,
        positions: &[Point2],
        values: &[f64],
    ) -> Self {
        let n = spans + order;
        let mut delta = DMatrix::<f64>::zeros(n, n);
        let mut omega = DMatrix::<f64>::zeros(n, n);

        for (p, &z) in positions.iter().zip(values) {
            let (sx, sy) = domain.locate(p, spans, order);
            let mut sum_w2 = 0.0;
            for a in 0..=order {
                for b in 0..=order {
                    let w = sx.weights[a] * sy.weights[b];
                    sum_w2 += w * w;
                }
            }
            if sum_w2 <= 0.0 {
                continue;
            }
            for a in 0..=order {
                for b in 0..=order {
                    let w = sx.weights[a] * sy.weights[b];
                    let w2 = w * w;
                    let phi_c = w * z / sum_w2;
                    delta[(sx.first + a, sy.first + b)] += w2 * phi_c;
                    omega[(sx.first + a, sy.first + b)] += w2;
                }
            }
        }

        let phi = delta.zip_map(&omega, |d, o| if o > 0.0 { d / o } else { 0.0 });
        Self { spans, phi }
    }

    fn evaluate(&self, domain: &SplineDomain, order: usize, p: &Point2) -> f64 {
        let (sx, sy) = domain.locate(p, self.spans, order);
        let mut acc = 0.0;
        for a in 0..=order {
            let wa = sx.weights[a];
            if wa == 0.0 {
                continue;
            }
            for b in 0..=order {
                acc += wa * sy.weights[b] * self.phi[(sx.first + a, sy.first + b)];
            }
        }
        acc
    }
}

/// Hierarchy of control lattices approximating one scalar channel.
#[derive(Debug, Clone)]
pub struct MultilevelBSpline {
    domain: SplineDomain,
    order: usize,
    levels: Vec<ControlLattice>,
}

impl MultilevelBSpline {
    /// Fit `values` sampled at `positions`.
    ///
    /// `control_points` is the per-axis lattice size at level 0 and must
    /// exceed `order`; each further level doubles the number of spans.
    pub fn fit(
        domain: SplineDomain,
        order: usize,
        control_points: usize,
        levels: usize,
        positions: &[Point2],
        values: &[f64],
    ) -> Result<Self> {
        let order_tag = u32::try_from(order).unwrap_or(u32::MAX);
        if order == 0 || order > MAX_ORDER {
            return Err(FieldError::InvalidSplineOrder(order_tag));
        }
        if control_points <= order {
            return Err(FieldError::TooFewControlPoints {
                order: order_tag,
                control_points,
            });
        }
        if levels == 0 {
            return Err(FieldError::ZeroLevels);
        }
        if positions.len() != values.len() {
            return Err(FieldError::SampleCountMismatch {
                positions: positions.len(),
                values: values.len(),
            });
        }

        let base_spans = control_points - order;
        let mut residuals = values.to_vec();
        let mut lattices = Vec::with_capacity(levels);

        for level in 0..levels {
            let spans = base_spans << level;
            let lattice = ControlLattice::fit(&domain, order, spans, positions, &residuals);
            for (r, p) in residuals.iter_mut().zip(positions) {
                *r -= lattice.evaluate(&domain, order, p);
            }
            debug!(
                "B-spline level {}: {}x{} control points, residual RMS {:.3e}",
                level,
                spans + order,
                spans + order,
                rms(&residuals)
            );
            lattices.push(lattice);
        }

        Ok(Self {
            domain,
            order,
            levels: lattices,
        })
    }

    /// Evaluate the summed approximation at `p`.
    pub fn evaluate(&self, p: &Point2) -> f64 {
        self.levels
            .iter()
            .map(|lattice| lattice.evaluate(&self.domain, self.order, p))
            .sum()
    }

    pub fn domain(&self) -> &SplineDomain {
        &self.domain
    }

    pub fn num_levels(&self) -> usize {
        self.levels.len()
    }

    /// Per-axis control point count at `level`.
    pub fn control_points_at(&self, level: usize) -> Option<usize> {
        self.levels.get(level).map(|l| l.spans + self.order)
    }
}

fn rms(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = values.iter().map(|v| v * v).sum();
    (sum_sq / values.len() as f64).sqrt()
}
