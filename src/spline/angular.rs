//! Cyclic channel handling for spline fits.
//!
//! An angle cannot be fitted directly: samples at 179° and −179° are two
//! degrees apart, but a scalar fit sees 358° and averages them to ~0°. The
//! adapter maps each angle onto the unit circle, fits the cosine and sine as
//! two ordinary channels, and recombines them with `atan2`.

use super::bspline::{MultilevelBSpline, SplineDomain};
use crate::error::Result;
use crate::Point2;

/// Encodes an angle as `(cos θ, sin θ)` and decodes it back.
#[derive(Debug, Clone, Copy, Default)]
pub struct AngularChannelAdapter;

impl AngularChannelAdapter {
    pub fn encode(theta_rad: f64) -> (f64, f64) {
        let (sin, cos) = theta_rad.sin_cos();
        (cos, sin)
    }

    /// Angle in `(-π, π]`.
    pub fn decode(cos: f64, sin: f64) -> f64 {
        sin.atan2(cos)
    }
}

/// Fitted surface for one parameter channel.
#[derive(Debug, Clone)]
pub enum ChannelSurface {
    /// Ordinary scalar channel.
    Linear(MultilevelBSpline),
    /// Angular channel fitted through its cosine and sine.
    Angular {
        cos: MultilevelBSpline,
        sin: MultilevelBSpline,
    },
}

impl ChannelSurface {
    pub fn fit_linear(
        domain: SplineDomain,
        order: usize,
        control_points: usize,
        levels: usize,
        positions: &[Point2],
        values: &[f64],
    ) -> Result<Self> {
        Ok(ChannelSurface::Linear(MultilevelBSpline::fit(
            domain,
            order,
            control_points,
            levels,
            positions,
            values,
        )?))
    }

    pub fn fit_angular(
        domain: SplineDomain,
        order: usize,
        control_points: usize,
        levels: usize,
        positions: &[Point2],
        angles: &[f64],
    ) -> Result<Self> {
        let (cos, sin): (Vec<f64>, Vec<f64>) = angles
            .iter()
            .map(|&theta| AngularChannelAdapter::encode(theta))
            .unzip();
        Ok(ChannelSurface::Angular {
            cos: MultilevelBSpline::fit(domain, order, control_points, levels, positions, &cos)?,
            sin: MultilevelBSpline::fit(domain, order, control_points, levels, positions, &sin)?,
        })
    }

    pub fn evaluate(&self, p: &Point2) -> f64 {
        match self {
            ChannelSurface::Linear(s) => s.evaluate(p),
            ChannelSurface::Angular { cos, sin } => {
                AngularChannelAdapter::decode(cos.evaluate(p), sin.evaluate(p))
            }
        }
    }

    pub fn is_angular(&self) -> bool {
        matches!(self, ChannelSurface::Angular { .. })
    }
}
