//! End-to-end driver: extract → fit → inflate.

use serde::{Deserialize, Serialize};

use crate::boundary::{extract, BoundarySet, BoundaryStats};
use crate::config::PipelineConfig;
use crate::curve::FittedCurve;
use crate::envelope::{inflate, EnvelopeReport, SafeCurve};
use crate::error::{Error, Result};
use crate::evaluator::WalkableBoundary;
use crate::fit::{fit, rms_residual};
use crate::opacity::{OpacitySource, ScanSync};

/// Everything a run produces, from raw boundary points to the safe curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerrainFit {
    pub boundary: BoundarySet,
    pub stats: BoundaryStats,
    /// Least-squares curve before inflation.
    pub fitted: FittedCurve,
    /// RMS of `y_i - fitted(x_i)`.
    pub rms_residual: f64,
    pub safe: SafeCurve,
    pub report: EnvelopeReport,
}

impl TerrainFit {
    /// Runtime walkability surface for the inflated curve.
    pub fn walkable(&self) -> WalkableBoundary {
        WalkableBoundary::new(&self.safe)
    }
}

/// Terrain boundary fitter.
///
/// Create once, run on many opacity sources.
///
/// # Examples
///
/// ```
/// use terrain_envelope::{OpacityGrid, TerrainFitter};
///
/// let grid = OpacityGrid::from_fn(64, 48, |x, y| {
///     let surface = 24.0 + 8.0 * (std::f32::consts::TAU * x as f32 / 64.0).sin();
///     if y as f32 >= surface { 1.0 } else { 0.0 }
/// });
/// let fit = TerrainFitter::default().run(&grid).unwrap();
/// let walk = fit.walkable();
/// assert!(walk.is_below(10.0, 47.0));
/// ```
#[derive(Debug, Clone, Default)]
pub struct TerrainFitter {
    config: PipelineConfig,
}

impl TerrainFitter {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut PipelineConfig {
        &mut self.config
    }

    /// Extract the boundary from `source`, fit it and inflate the result.
    pub fn run<S>(&self, source: &S) -> Result<TerrainFit>
    where
        S: OpacitySource + ScanSync + ?Sized,
    {
        self.config.validate()?;
        let boundary = extract(source, &self.config.extract)?;
        tracing::info!(
            "{} boundary points from {}x{} grid",
            boundary.len(),
            boundary.grid_width(),
            boundary.grid_height()
        );
        self.fit_boundary(boundary)
    }

    /// Fit and inflate an already extracted boundary set.
    pub fn fit_boundary(&self, boundary: BoundarySet) -> Result<TerrainFit> {
        self.config.validate()?;
        let fitted = fit(&boundary, &self.config.fit)?;
        let rms = rms_residual(&fitted, &boundary);
        let safe = inflate(&fitted, &boundary, &self.config.envelope)?;
        let report = safe.report(&boundary);
        let stats = boundary
            .stats()
            .ok_or_else(|| Error::InvalidConfig("empty boundary set".into()))?;

        tracing::info!(
            "fitted period {:.1}: rms {:.3}, max error {:.3}, margin {:.3}, clearance {:.3}..{:.3}",
            fitted.period,
            rms,
            report.max_error,
            report.margin,
            report.min_clearance,
            report.max_clearance
        );

        Ok(TerrainFit {
            boundary,
            stats,
            fitted,
            rms_residual: rms,
            safe,
            report,
        })
    }
}
