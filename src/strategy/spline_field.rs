//! Global spline reconstruction strategies.
//!
//! Both strategies fit their surfaces once, up front, and afterwards are pure
//! functions of the site coordinate; they never report "no data".

use crate::error::{FieldError, Result};
use crate::grid::OutputGridSpec;
use crate::point::PointSet;
use crate::spline::{ParameterSurfaces, SplineConfig, SplineDomain};
use crate::transform::Transform;
use crate::{Point2, Vector2};

/// Parametric domain covering the output grid and every valid point.
fn fit_domain(grid: &OutputGridSpec, positions: &[Point2]) -> SplineDomain {
    let (lo, hi) = grid.physical_bounds();
    SplineDomain::enclosing([lo, hi].into_iter().chain(positions.iter().copied()))
}

/// Spline fit of the transform parameter channels; each site is displaced by
/// the transform rebuilt from the sampled parameters.
#[derive(Debug, Clone)]
pub struct SplineFieldReconstructionStrategy {
    surfaces: ParameterSurfaces,
    template: Transform,
}

impl SplineFieldReconstructionStrategy {
    /// Fit every parameter channel over the valid points.
    ///
    /// All valid points must carry transforms of the same kind; the first
    /// valid transform supplies the fixed parameters of the rebuilt transforms.
    /// Channels the model declares angular always use the angular adapter,
    /// in addition to those listed in `config`.
    pub fn fit(
        points: &PointSet,
        metric_threshold: f64,
        grid: &OutputGridSpec,
        config: &SplineConfig,
    ) -> Result<Self> {
        config.validate()?;
        let valid = points.valid_indices(metric_threshold);
        config.check_point_count(valid.len())?;
        let kind = points.transform_kind(metric_threshold)?;

        let mut positions = Vec::with_capacity(valid.len());
        let mut samples = Vec::with_capacity(valid.len());
        let mut template: Option<&Transform> = None;
        for &index in &valid {
            let point = &points.points()[index];
            let t = point
                .payload
                .transform()
                .ok_or(FieldError::MissingTransform { index })?;
            if template.is_none() {
                template = Some(t);
            }
            positions.push(point.position);
            samples.push(t.parameters());
        }
        let template = template
            .cloned()
            .ok_or(FieldError::TooFewPointsForSpline {
                required: config.finest_control_points(),
                available: 0,
            })?;

        // Angles the model declares are cyclic whether or not they are configured
        let mut config = config.clone();
        if let Some(kind) = kind {
            config
                .angular_parameter_indices
                .extend(kind.angular_parameters().iter().copied());
        }

        let domain = fit_domain(grid, &positions);
        let surfaces = ParameterSurfaces::fit(&config, domain, &positions, &samples)?;
        Ok(Self { surfaces, template })
    }

    /// Fitted parameter vector at `site`; angular channels are in `(-π, π]`.
    pub fn parameters_at(&self, site: &Point2) -> Vec<f64> {
        self.surfaces.evaluate(site)
    }

    pub fn surfaces(&self) -> &ParameterSurfaces {
        &self.surfaces
    }

    pub fn evaluate(&self, site: &Point2) -> Option<Vector2> {
        // One channel per template parameter, fixed at fit time
        let params = self.parameters_at(site);
        let t = self.template.with_parameters(&params);
        debug_assert!(t.is_ok(), "fitted channels do not match the template: {:?}", t);
        Some(t.ok()?.transform_point(site) - site)
    }
}

/// Spline fit of the two displacement components directly.
#[derive(Debug, Clone)]
pub struct SplineDisplacementStrategy {
    surfaces: ParameterSurfaces,
}

impl SplineDisplacementStrategy {
    /// Fit `dx` and `dy` over the valid points. Angular indices are rejected:
    /// displacement channels are never cyclic.
    pub fn fit(
        points: &PointSet,
        metric_threshold: f64,
        grid: &OutputGridSpec,
        config: &SplineConfig,
    ) -> Result<Self> {
        config.validate()?;
        config.check_angular_indices(0)?;
        let valid = points.valid_indices(metric_threshold);
        config.check_point_count(valid.len())?;

        let (positions, samples): (Vec<Point2>, Vec<Vec<f64>>) = valid
            .iter()
            .map(|&index| {
                let p = &points.points()[index];
                let d = p.payload.displacement(&p.position);
                (p.position, vec![d.x, d.y])
            })
            .unzip();

        let domain = fit_domain(grid, &positions);
        let surfaces = ParameterSurfaces::fit(config, domain, &positions, &samples)?;
        Ok(Self { surfaces })
    }

    pub fn evaluate(&self, site: &Point2) -> Option<Vector2> {
        let d = self.surfaces.evaluate(site);
        Some(Vector2::new(d[0], d[1]))
    }
}
