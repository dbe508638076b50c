//! Error types for extraction, fitting and envelope adjustment.

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that terminate a boundary-fitting run.
///
/// Degenerate columns during extraction are not errors; they resolve through
/// the fallback rule.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum Error {
    /// The opacity source has zero width or zero height.
    #[error("empty opacity grid ({width}x{height})")]
    EmptyGrid { width: u32, height: u32 },

    /// The least-squares fit failed.
    #[error("curve fit failed: {0}")]
    Fit(#[from] FitError),

    /// The inflated curve dips below a training point.
    #[error("envelope violated at x={x}: safe_y={safe_y} > y={y}")]
    EnvelopeViolation { x: u32, y: u32, safe_y: f64 },

    /// A configuration value is outside its valid domain.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A configuration file could not be read or parsed.
    #[error("failed to load configuration: {0}")]
    Config(String),
}

/// Failure modes of the curve fitter.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum FitError {
    /// Fewer boundary points than free coefficients.
    #[error("too few points: need {needed}, got {got}")]
    TooFewPoints { needed: usize, got: usize },

    /// Enough points, but not enough distinct sample positions within one period.
    #[error("degenerate samples: need {needed} distinct x positions, got {distinct}")]
    DegenerateSamples { needed: usize, distinct: usize },

    /// The period is zero, negative or non-finite.
    #[error("invalid period {0}")]
    InvalidPeriod(f64),

    /// The normal equations could not be solved.
    #[error("normal equations are singular")]
    Singular,

    /// The solver failed or produced non-finite coefficients.
    #[error("solver did not converge: {0}")]
    NotConverged(String),
}
