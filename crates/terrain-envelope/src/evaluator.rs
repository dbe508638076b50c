//! Runtime walkability queries against an inflated curve.
//!
//! Image coordinates: `y` grows downward, so "below the boundary" means a
//! numerically larger `y`.

use serde::{Deserialize, Serialize};

use crate::curve::{evaluate, CurveCoefficients};
use crate::envelope::SafeCurve;

/// Height of the walkable boundary at `x`.
///
/// Defined for every real `x`; the curve repeats with its period outside the
/// sampled range.
#[inline]
pub fn safe_y(safe_curve: &SafeCurve, x: f64) -> f64 {
    evaluate(safe_curve.coefficients(), safe_curve.period(), x)
}

/// Walkable boundary for characters moving over the terrain.
///
/// Only the shifted coefficients and the period are kept, so this is cheap to
/// copy into game state or serialize next to a level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WalkableBoundary {
    coefficients: CurveCoefficients,
    period: f64,
}

impl WalkableBoundary {
    pub fn new(safe_curve: &SafeCurve) -> Self {
        Self {
            coefficients: *safe_curve.coefficients(),
            period: safe_curve.period(),
        }
    }

    pub fn coefficients(&self) -> &CurveCoefficients {
        &self.coefficients
    }

    pub fn period(&self) -> f64 {
        self.period
    }

    /// Boundary height at `x`.
    #[inline]
    pub fn safe_y(&self, x: f64) -> f64 {
        evaluate(&self.coefficients, self.period, x)
    }

    /// True when `(x, y)` lies on or below the boundary.
    #[inline]
    pub fn is_below(&self, x: f64, y: f64) -> bool {
        y >= self.safe_y(x)
    }

    /// Push `y` back onto the walkable side of the boundary.
    #[inline]
    pub fn clamp_y(&self, x: f64, y: f64) -> f64 {
        y.max(self.safe_y(x))
    }
}

impl From<&SafeCurve> for WalkableBoundary {
    fn from(safe_curve: &SafeCurve) -> Self {
        Self::new(safe_curve)
    }
}
