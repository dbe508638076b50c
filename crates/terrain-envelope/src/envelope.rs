//! Safety-margin inflation of a fitted curve.
//!
//! The fitted curve passes through the middle of the boundary points. Its DC
//! term is shifted up the image by the worst residual plus a fixed buffer.
//! That clears the boundary when residuals spread evenly around the fit, but
//! not a thin peak reaching far above it. The shifted curve is therefore
//! checked point by point, and [`inflate`] fails with
//! [`Error::EnvelopeViolation`] instead of handing out a curve that cuts
//! through the terrain.

use serde::{Deserialize, Serialize};

use crate::boundary::BoundarySet;
use crate::curve::{evaluate, CurveCoefficients, FittedCurve};
use crate::error::{Error, FitError, Result};

/// Default clearance buffer, in grid units.
pub const DEFAULT_EPSILON: f64 = 5.0;

/// Configuration for envelope inflation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvelopeConfig {
    /// Buffer added on top of the worst residual. Must be finite and non-negative.
    pub epsilon: f64,
}

impl Default for EnvelopeConfig {
    fn default() -> Self {
        Self {
            epsilon: DEFAULT_EPSILON,
        }
    }
}

impl EnvelopeConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.epsilon.is_finite() || self.epsilon < 0.0 {
            return Err(Error::InvalidConfig(format!(
                "epsilon must be finite and >= 0, got {}",
                self.epsilon
            )));
        }
        Ok(())
    }
}

/// A fitted curve shifted so that it clears every training point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SafeCurve {
    curve: FittedCurve,
    margin: f64,
    epsilon: f64,
}

impl SafeCurve {
    /// The shifted curve.
    pub fn curve(&self) -> &FittedCurve {
        &self.curve
    }

    pub fn coefficients(&self) -> &CurveCoefficients {
        &self.curve.coefficients
    }

    pub fn period(&self) -> f64 {
        self.curve.period
    }

    /// Amount subtracted from the fitted `a0`.
    pub fn margin(&self) -> f64 {
        self.margin
    }

    /// Buffer that was added to the worst residual.
    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// The curve before the shift.
    pub fn unshifted(&self) -> FittedCurve {
        FittedCurve::new(
            self.curve.coefficients.with_offset(self.margin),
            self.curve.period,
        )
    }

    /// Boundary value at `x`.
    #[inline]
    pub fn y(&self, x: f64) -> f64 {
        self.curve.eval(x)
    }

    /// Clearance statistics against `boundary`.
    pub fn report(&self, boundary: &BoundarySet) -> EnvelopeReport {
        let (min_clearance, max_clearance) = boundary
            .iter()
            .map(|p| p.y as f64 - self.y(p.x as f64))
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), c| {
                (lo.min(c), hi.max(c))
            });
        EnvelopeReport {
            max_error: self.margin - self.epsilon,
            margin: self.margin,
            epsilon: self.epsilon,
            min_clearance,
            max_clearance,
        }
    }
}

/// Diagnostics for an inflated curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnvelopeReport {
    /// Largest residual `y_i - fitted(x_i)` before the shift.
    pub max_error: f64,
    /// Total shift, `max_error + epsilon`.
    pub margin: f64,
    pub epsilon: f64,
    /// Smallest `y_i - safe_y(x_i)`; never negative for a valid envelope.
    pub min_clearance: f64,
    /// Largest `y_i - safe_y(x_i)`.
    pub max_clearance: f64,
}

/// Shift `fitted` up by the worst residual plus `config.epsilon` and verify
/// that it lies on or above every point of `boundary`.
///
/// Fails with [`Error::EnvelopeViolation`] at the first point the shifted
/// curve still cuts through.
pub fn inflate(
    fitted: &FittedCurve,
    boundary: &BoundarySet,
    config: &EnvelopeConfig,
) -> Result<SafeCurve> {
    config.validate()?;
    if boundary.is_empty() {
        return Err(Error::InvalidConfig(
            "cannot inflate against an empty boundary set".into(),
        ));
    }

    let max_error = boundary
        .iter()
        .map(|p| p.y as f64 - fitted.eval(p.x as f64))
        .fold(f64::NEG_INFINITY, f64::max);
    if !max_error.is_finite() {
        return Err(FitError::NotConverged(format!("non-finite residual {max_error}")).into());
    }

    let margin = max_error + config.epsilon;
    let shifted = FittedCurve::new(fitted.coefficients.with_offset(-margin), fitted.period);

    for p in boundary {
        let safe_y = evaluate(&shifted.coefficients, shifted.period, p.x as f64);
        if safe_y > p.y as f64 {
            return Err(Error::EnvelopeViolation {
                x: p.x,
                y: p.y,
                safe_y,
            });
        }
    }

    tracing::debug!(
        "envelope margin {:.3} (max error {:.3} + epsilon {:.3})",
        margin,
        max_error,
        config.epsilon
    );

    Ok(SafeCurve {
        curve: shifted,
        margin,
        epsilon: config.epsilon,
    })
}
