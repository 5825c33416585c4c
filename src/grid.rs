//! Output raster geometry and the dense field produced over it.
//!
//! # Coordinate conventions
//!
//! - **Site coordinates** `(col, row)`: integer cell indices, `(0, 0)` first.
//! - **Physical coordinates**: `origin + spacing ⊙ (col, row)`. Spacing may be
//!   negative on either axis to encode a flipped raster (north-up imagery
//!   typically has a negative y spacing).

use crate::error::{FieldError, Result};
use crate::{Point2, Vector2};

/// Geometry of the regular output grid.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputGridSpec {
    /// Number of columns.
    pub width: usize,
    /// Number of rows.
    pub height: usize,
    /// Physical size of one cell along each axis; non-zero, possibly negative.
    pub spacing: Vector2,
    /// Physical coordinate of site `(0, 0)`.
    pub origin: Point2,
}

impl OutputGridSpec {
    pub fn new(width: usize, height: usize, spacing: Vector2, origin: Point2) -> Self {
        Self {
            width,
            height,
            spacing,
            origin,
        }
    }

    /// Check size and spacing.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 || self.width.checked_mul(self.height).is_none() {
            return Err(FieldError::InvalidGridSize {
                width: self.width,
                height: self.height,
            });
        }
        for (axis, value) in [('x', self.spacing.x), ('y', self.spacing.y)] {
            if value == 0.0 || !value.is_finite() {
                return Err(FieldError::InvalidSpacing { axis, value });
            }
        }
        Ok(())
    }

    pub fn num_sites(&self) -> usize {
        self.width * self.height
    }

    /// Physical coordinate of site `(col, row)`.
    pub fn site_to_physical(&self, col: usize, row: usize) -> Point2 {
        Point2::new(
            self.origin.x + self.spacing.x * col as f64,
            self.origin.y + self.spacing.y * row as f64,
        )
    }

    /// Axis-aligned `(min, max)` corners of all site coordinates.
    pub fn physical_bounds(&self) -> (Point2, Point2) {
        let first = self.origin;
        let last = self.site_to_physical(
            self.width.saturating_sub(1),
            self.height.saturating_sub(1),
        );
        (
            Point2::new(first.x.min(last.x), first.y.min(last.y)),
            Point2::new(first.x.max(last.x), first.y.max(last.y)),
        )
    }
}

/// Dense displacement field, one vector per output site, stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    spec: OutputGridSpec,
    values: Vec<Vector2>,
    no_data_sites: usize,
}

impl Field {
    pub(crate) fn new(spec: OutputGridSpec, values: Vec<Vector2>, no_data_sites: usize) -> Self {
        debug_assert_eq!(values.len(), spec.num_sites());
        Self {
            spec,
            values,
            no_data_sites,
        }
    }

    pub fn spec(&self) -> &OutputGridSpec {
        &self.spec
    }

    pub fn width(&self) -> usize {
        self.spec.width
    }

    pub fn height(&self) -> usize {
        self.spec.height
    }

    /// Displacement at site `(col, row)`, or `None` outside the grid.
    pub fn get(&self, col: usize, row: usize) -> Option<Vector2> {
        if col >= self.spec.width || row >= self.spec.height {
            return None;
        }
        Some(self.values[row * self.spec.width + col])
    }

    /// All values in row-major order.
    pub fn values(&self) -> &[Vector2] {
        &self.values
    }

    /// One row of values.
    pub fn row(&self, row: usize) -> &[Vector2] {
        let start = row * self.spec.width;
        &self.values[start..start + self.spec.width]
    }

    /// Number of sites that received the configured default value.
    pub fn no_data_sites(&self) -> usize {
        self.no_data_sites
    }

    /// Split into planar `(dx, dy)` bands, the two-band layout a warp filter
    /// consumes.
    pub fn to_bands(&self) -> (Vec<f64>, Vec<f64>) {
        self.values.iter().map(|v| (v.x, v.y)).unzip()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_site_to_physical_corners() {
        let spec = OutputGridSpec::new(
            11,
            6,
            Vector2::new(2.5, -0.5),
            Point2::new(100.0, 40.0),
        );
        assert_eq!(spec.site_to_physical(0, 0), spec.origin);
        let last = spec.site_to_physical(10, 5);
        assert!((last.x - 125.0).abs() < 1e-12);
        assert!((last.y - 37.5).abs() < 1e-12);

        let (lo, hi) = spec.physical_bounds();
        assert_eq!(lo, Point2::new(100.0, 37.5));
        assert_eq!(hi, Point2::new(125.0, 40.0));
    }

    #[test]
    fn test_validate_rejects_zero_spacing() {
        let spec = OutputGridSpec::new(4, 4, Vector2::new(1.0, 0.0), Point2::origin());
        assert_eq!(
            spec.validate(),
            Err(FieldError::InvalidSpacing {
                axis: 'y',
                value: 0.0
            })
        );
    }

    #[test]
    fn test_validate_rejects_empty_grid() {
        let spec = OutputGridSpec::new(0, 4, Vector2::new(1.0, 1.0), Point2::origin());
        assert!(matches!(
            spec.validate(),
            Err(FieldError::InvalidGridSize { .. })
        ));
        let huge = OutputGridSpec::new(usize::MAX, 2, Vector2::new(1.0, 1.0), Point2::origin());
        assert!(matches!(
            huge.validate(),
            Err(FieldError::InvalidGridSize { .. })
        ));
    }

    #[test]
    fn test_negative_spacing_is_valid() {
        let spec = OutputGridSpec::new(4, 4, Vector2::new(-1.0, -3.0), Point2::origin());
        assert!(spec.validate().is_ok());
    }

    #[test]
    fn test_field_accessors() {
        let spec = OutputGridSpec::new(2, 2, Vector2::new(1.0, 1.0), Point2::origin());
        let values = vec![
            Vector2::new(0.0, 1.0),
            Vector2::new(2.0, 3.0),
            Vector2::new(4.0, 5.0),
            Vector2::new(6.0, 7.0),
        ];
        let field = Field::new(spec, values, 0);
        assert_eq!(field.get(1, 0), Some(Vector2::new(2.0, 3.0)));
        assert_eq!(field.get(2, 0), None);
        assert_eq!(field.row(1), &[Vector2::new(4.0, 5.0), Vector2::new(6.0, 7.0)]);
        let (dx, dy) = field.to_bands();
        assert_eq!(dx, vec![0.0, 2.0, 4.0, 6.0]);
        assert_eq!(dy, vec![1.0, 3.0, 5.0, 7.0]);
    }
}
