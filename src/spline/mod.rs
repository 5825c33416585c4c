//! Global spline reconstruction of parameter channels.
//!
//! Unlike the nearest-neighbor strategies, spline reconstruction fits every
//! channel once over all valid points and then samples the fitted surfaces at
//! each output site.
//!
//! # Channels
//!
//! - Ordinary channels are fitted directly with a [`MultilevelBSpline`].
//! - Channels listed in [`SplineConfig::angular_parameter_indices`] always go
//!   through the [`AngularChannelAdapter`]: fitted as `(cos θ, sin θ)` and
//!   recombined with `atan2`.

pub mod angular;
pub mod bspline;

pub use angular::{AngularChannelAdapter, ChannelSurface};
pub use bspline::{basis_weights, MultilevelBSpline, SplineDomain, MAX_ORDER};

use std::collections::BTreeSet;

use tracing::debug;

use crate::error::{FieldError, Result};
use crate::Point2;

/// Settings for the multilevel B-spline fit.
///
/// The set of angular indices is fixed once the configuration is built;
/// fitted surfaces never consult it again.
#[derive(Debug, Clone, PartialEq)]
pub struct SplineConfig {
    /// Spline degree (1..=5). Default 3 (cubic).
    pub order: u32,
    /// Control points per axis at the coarsest level; must exceed `order`. Default 4.
    pub control_points: usize,
    /// Number of refinement levels, each doubling the spans per axis. Default 3.
    pub levels: usize,
    /// Parameter indices holding angles in radians. Default empty.
    pub angular_parameter_indices: BTreeSet<usize>,
}

impl Default for SplineConfig {
    fn default() -> Self {
        Self {
            order: 3,
            control_points: 4,
            levels: 3,
            angular_parameter_indices: BTreeSet::new(),
        }
    }
}

impl SplineConfig {
    /// Check order, control point count and level count.
    pub fn validate(&self) -> Result<()> {
        if self.order == 0 || self.order as usize > MAX_ORDER {
            return Err(FieldError::InvalidSplineOrder(self.order));
        }
        if self.control_points <= self.order as usize {
            return Err(FieldError::TooFewControlPoints {
                order: self.order,
                control_points: self.control_points,
            });
        }
        if self.levels == 0 {
            return Err(FieldError::ZeroLevels);
        }
        Ok(())
    }

    /// Per-axis control point count at the finest level:
    /// `(control_points − order) · 2^(levels − 1) + order`.
    pub fn finest_control_points(&self) -> usize {
        let order = self.order as usize;
        let doublings = u32::try_from(self.levels.saturating_sub(1)).unwrap_or(u32::MAX);
        self.control_points
            .saturating_sub(order)
            .saturating_mul(2usize.saturating_pow(doublings))
            .saturating_add(order)
    }

    /// Require at least as many valid points as finest-level control points.
    pub fn check_point_count(&self, available: usize) -> Result<()> {
        let required = self.finest_control_points();
        if available < required {
            return Err(FieldError::TooFewPointsForSpline {
                required,
                available,
            });
        }
        Ok(())
    }

    /// Require every angular index to address a parameter.
    pub fn check_angular_indices(&self, num_parameters: usize) -> Result<()> {
        match self
            .angular_parameter_indices
            .iter()
            .find(|&&index| index >= num_parameters)
        {
            Some(&index) => Err(FieldError::AngularIndexOutOfRange {
                index,
                num_parameters,
            }),
            None => Ok(()),
        }
    }
}

/// Fitted surfaces for every channel of a parameter vector.
#[derive(Debug, Clone)]
pub struct ParameterSurfaces {
    channels: Vec<ChannelSurface>,
}

impl ParameterSurfaces {
    /// Fit one surface per channel.
    ///
    /// `samples[i]` is the parameter vector observed at `positions[i]`; all
    /// vectors must have the same length.
    pub fn fit(
        config: &SplineConfig,
        domain: SplineDomain,
        positions: &[Point2],
        samples: &[Vec<f64>],
    ) -> Result<Self> {
        config.validate()?;
        config.check_point_count(positions.len())?;
        let num_parameters = samples.first().map_or(0, Vec::len);
        config.check_angular_indices(num_parameters)?;
        if let Some((index, sample)) = samples
            .iter()
            .enumerate()
            .find(|(_, s)| s.len() != num_parameters)
        {
            return Err(FieldError::SampleLength {
                index,
                expected: num_parameters,
                got: sample.len(),
            });
        }

        let order = config.order as usize;
        let channels = (0..num_parameters)
            .map(|c| {
                let values: Vec<f64> = samples.iter().map(|s| s[c]).collect();
                if config.angular_parameter_indices.contains(&c) {
                    ChannelSurface::fit_angular(
                        domain,
                        order,
                        config.control_points,
                        config.levels,
                        positions,
                        &values,
                    )
                } else {
                    ChannelSurface::fit_linear(
                        domain,
                        order,
                        config.control_points,
                        config.levels,
                        positions,
                        &values,
                    )
                }
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(
            "Fitted {} channel(s) ({} angular) over {} points, finest lattice {}x{}",
            channels.len(),
            channels.iter().filter(|c| c.is_angular()).count(),
            positions.len(),
            config.finest_control_points(),
            config.finest_control_points()
        );

        Ok(Self { channels })
    }

    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    pub fn channels(&self) -> &[ChannelSurface] {
        &self.channels
    }

    /// Sample every channel at `p`.
    pub fn evaluate(&self, p: &Point2) -> Vec<f64> {
        self.channels.iter().map(|c| c.evaluate(p)).collect()
    }
}
