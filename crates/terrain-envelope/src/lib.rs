//! terrain-envelope: conservative walkability boundaries from terrain alpha masks.
//!
//! Given a raster whose transparency channel separates sky from terrain, the
//! crate fits a smooth periodic curve that stays on or above the terrain
//! silhouette at every sampled column. The stages are:
//!
//! 1. **Opacity** – classify samples of any [`OpacitySource`] against a
//!    caller-chosen threshold.
//! 2. **Boundary** – one top-of-terrain point per sampled column.
//! 3. **Curve** – the three-harmonic Fourier model.
//! 4. **Fit** – least-squares coefficients (Levenberg-Marquardt or
//!    Gauss-Newton).
//! 5. **Envelope** – shift the DC term by the worst residual plus a buffer and
//!    verify the result against every point.
//! 6. **Evaluator** – runtime `safe_y(x)` queries.
//!
//! # Public API
//! - [`TerrainFitter`] runs all stages and returns a [`TerrainFit`].
//! - [`WalkableBoundary`] is the runtime surface.
//! - Stage functions ([`extract`], [`fit`], [`inflate`], [`safe_y`]) are
//!   exported for callers that drive the stages themselves.

mod boundary;
mod config;
mod curve;
mod envelope;
mod error;
mod evaluator;
mod fit;
mod opacity;
mod pipeline;

#[cfg(test)]
mod test_utils;

pub use boundary::{
    extract, BoundaryPoint, BoundaryRule, BoundarySet, BoundaryStats, ExtractConfig,
};
pub use config::PipelineConfig;
pub use curve::{basis, evaluate, CurveCoefficients, FittedCurve, N_COEFFS, N_HARMONICS};
pub use envelope::{inflate, EnvelopeConfig, EnvelopeReport, SafeCurve, DEFAULT_EPSILON};
pub use error::{Error, FitError, Result};
pub use evaluator::{safe_y, WalkableBoundary};
pub use fit::{fit, fit_samples, rms_residual, FitConfig, FitSolver, MIN_POINTS};
pub use opacity::{
    classify, Opacity, OpacityGrid, OpacitySampler, OpacitySource, ScanSync,
};
pub use pipeline::{TerrainFit, TerrainFitter};
