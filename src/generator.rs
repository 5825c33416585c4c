//! Field generation orchestrator.
//!
//! # Lifecycle
//!
//! ```text
//! Configured ──► Fitting (spline strategies only) ──► Evaluating ──► Done
//! ```
//!
//! 1. **Configured**: [`FieldGenerator::new`] validates the grid, the
//!    configuration and the strategy preconditions. Any failure is returned
//!    before anything is computed.
//! 2. **Fitting**: [`FieldGenerator::prepare`] binds the strategy to the
//!    point set and runs the global fit for spline strategies.
//! 3. **Evaluating**: the output grid is split into bands of `tile_rows`
//!    rows. Each band reads the shared, read-only prepared strategy and
//!    writes only its own cells, so bands run on the rayon pool without
//!    locking (feature `parallel`, on by default).
//! 4. **Done**: a complete [`Field`] is returned. Sites where the strategy
//!    had no valid point receive [`FieldConfig::default_value`].

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::{debug, info};

use crate::error::{FieldError, Result};
use crate::grid::{Field, OutputGridSpec};
use crate::point::PointSet;
use crate::spline::SplineConfig;
use crate::strategy::{PreparedStrategy, Strategy};
use crate::Vector2;

/// Parameters controlling field generation.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldConfig {
    /// Points with `metric < metric_threshold` are ignored. Default `-∞`
    /// (every point is valid).
    pub metric_threshold: f64,
    /// Number of neighbors for the N-nearest strategies. Must be at least 1.
    /// Default 4.
    pub neighbor_count: usize,
    /// Value written at sites without any valid point. Default zero.
    pub default_value: Vector2,
    /// Settings for the spline strategies.
    pub spline: SplineConfig,
    /// Rows per evaluation tile. Default 64.
    pub tile_rows: usize,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            metric_threshold: f64::NEG_INFINITY,
            neighbor_count: 4,
            default_value: Vector2::zeros(),
            spline: SplineConfig::default(),
            tile_rows: 64,
        }
    }
}

impl FieldConfig {
    /// Checks that do not depend on the strategy.
    pub fn validate(&self) -> Result<()> {
        if self.metric_threshold.is_nan() {
            return Err(FieldError::InvalidMetricThreshold);
        }
        if self.neighbor_count == 0 {
            return Err(FieldError::ZeroNeighborCount);
        }
        Ok(())
    }
}

/// Shared cancellation flag.
///
/// Cancelling stops new tiles from starting; tiles already running finish.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// A validated generation job: point set, grid, configuration and strategy.
#[derive(Debug, Clone)]
pub struct FieldGenerator<'a> {
    points: &'a PointSet,
    grid: OutputGridSpec,
    config: FieldConfig,
    strategy: Strategy,
}

impl<'a> FieldGenerator<'a> {
    /// Validate everything up front; no partial state exists on error.
    pub fn new(
        points: &'a PointSet,
        grid: OutputGridSpec,
        config: FieldConfig,
        strategy: Strategy,
    ) -> Result<Self> {
        grid.validate()?;
        config.validate()?;
        strategy.validate(points, &config)?;
        debug!(
            "Configured {:?} over {}x{} sites from {} points ({} valid)",
            strategy,
            grid.width,
            grid.height,
            points.len(),
            points.valid_indices(config.metric_threshold).len()
        );
        Ok(Self {
            points,
            grid,
            config,
            strategy,
        })
    }

    pub fn grid(&self) -> &OutputGridSpec {
        &self.grid
    }

    pub fn config(&self) -> &FieldConfig {
        &self.config
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Bind the strategy to the inputs, running the global fit if the
    /// strategy needs one.
    pub fn prepare(&self) -> Result<PreparedStrategy<'a>> {
        let start = Instant::now();
        let prepared = self.strategy.prepare(self.points, &self.grid, &self.config)?;
        if self.strategy.requires_fit() {
            debug!(
                "Fitted {:?} in {:.1} ms",
                self.strategy,
                start.elapsed().as_secs_f64() * 1000.0
            );
        }
        Ok(prepared)
    }

    /// Run the whole pipeline and return the dense field.
    pub fn generate(&self) -> Result<Field> {
        let prepared = self.prepare()?;
        self.evaluate(&prepared, None)
    }

    /// Like [`generate`](Self::generate), but stops scheduling tiles once
    /// `cancel` is set. A cancelled run returns [`FieldError::Cancelled`].
    pub fn generate_with_cancel(&self, cancel: &CancelToken) -> Result<Field> {
        let prepared = self.prepare()?;
        self.evaluate_tiles(&prepared, Some(cancel), &|_, _| {})
    }

    /// Like [`generate_with_cancel`](Self::generate_with_cancel), calling
    /// `progress(completed_tiles, total_tiles)` after every finished tile.
    ///
    /// With the `parallel` feature the callback runs on pool threads, in no
    /// particular tile order; the completed count is strictly increasing.
    pub fn generate_with_progress<F>(&self, cancel: &CancelToken, progress: F) -> Result<Field>
    where
        F: Fn(usize, usize) + Sync,
    {
        let prepared = self.prepare()?;
        self.evaluate_tiles(&prepared, Some(cancel), &progress)
    }

    /// Evaluate every site with an already prepared strategy.
    pub fn evaluate(
        &self,
        prepared: &PreparedStrategy<'_>,
        cancel: Option<&CancelToken>,
    ) -> Result<Field> {
        self.evaluate_tiles(prepared, cancel, &|_, _| {})
    }

    /// Rows per tile, as a flat cell count. Never zero, never past the grid.
    fn tile_len(&self) -> usize {
        self.grid
            .width
            .saturating_mul(self.config.tile_rows.max(1))
            .min(self.grid.num_sites())
            .max(1)
    }

    fn evaluate_tiles(
        &self,
        prepared: &PreparedStrategy<'_>,
        cancel: Option<&CancelToken>,
        progress: &(dyn Fn(usize, usize) + Sync),
    ) -> Result<Field> {
        let start = Instant::now();
        let width = self.grid.width;
        let tile_len = self.tile_len();
        let default_value = self.config.default_value;
        let mut values = vec![default_value; self.grid.num_sites()];
        let total_tiles = values.len().div_ceil(tile_len);
        let finished = AtomicUsize::new(0);

        // Returns the number of no-data sites, or None if the tile was skipped.
        let run_tile = |tile: usize, cells: &mut [Vector2]| -> Option<usize> {
            if cancel.is_some_and(CancelToken::is_cancelled) {
                return None;
            }
            let mut no_data = 0;
            for (offset, cell) in cells.iter_mut().enumerate() {
                let flat = tile * tile_len + offset;
                let site = self.grid.site_to_physical(flat % width, flat / width);
                *cell = match prepared.evaluate(&site) {
                    Some(v) => v,
                    None => {
                        no_data += 1;
                        default_value
                    }
                };
            }
            progress(finished.fetch_add(1, Ordering::Relaxed) + 1, total_tiles);
            Some(no_data)
        };

        #[cfg(feature = "parallel")]
        let outcomes: Vec<Option<usize>> = values
            .par_chunks_mut(tile_len)
            .enumerate()
            .map(|(tile, cells)| run_tile(tile, cells))
            .collect();
        #[cfg(not(feature = "parallel"))]
        let outcomes: Vec<Option<usize>> = values
            .chunks_mut(tile_len)
            .enumerate()
            .map(|(tile, cells)| run_tile(tile, cells))
            .collect();

        let completed_tiles = outcomes.iter().filter(|o| o.is_some()).count();
        if completed_tiles < total_tiles {
            debug!("Cancelled after {}/{} tiles", completed_tiles, total_tiles);
            return Err(FieldError::Cancelled {
                completed_tiles,
                total_tiles,
            });
        }
        let no_data_sites: usize = outcomes.into_iter().flatten().sum();

        info!(
            "Generated {}x{} field with {:?}: {} tiles, {} no-data sites, {:.1} ms",
            self.grid.width,
            self.grid.height,
            self.strategy,
            total_tiles,
            no_data_sites,
            start.elapsed().as_secs_f64() * 1000.0
        );

        Ok(Field::new(self.grid.clone(), values, no_data_sites))
    }
}
