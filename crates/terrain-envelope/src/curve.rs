//! Three-harmonic periodic curve model.
//!
//! `y(x) = a0 + Σ_{k=1..3} (a_k cos(k f x) + b_k sin(k f x))`, `f = 2π / period`.
//!
//! The model is linear in its coefficients; [`basis`] returns the design-matrix
//! row for one abscissa, which doubles as the Jacobian for the fitter.

use std::f64::consts::TAU;

use serde::{Deserialize, Serialize};

/// Number of harmonic pairs in the model.
pub const N_HARMONICS: usize = 3;
/// Number of free coefficients (DC term plus one cos/sin pair per harmonic).
pub const N_COEFFS: usize = 1 + 2 * N_HARMONICS;

/// Coefficient vector `[a0, a1, b1, a2, b2, a3, b3]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CurveCoefficients(pub [f64; N_COEFFS]);

impl CurveCoefficients {
    pub fn zeros() -> Self {
        Self([0.0; N_COEFFS])
    }

    /// DC term.
    #[inline]
    pub fn a0(&self) -> f64 {
        self.0[0]
    }

    /// `(a_k, b_k)` for harmonic `k` in `1..=3`.
    pub fn harmonic(&self, k: usize) -> Option<(f64, f64)> {
        if k == 0 || k > N_HARMONICS {
            return None;
        }
        Some((self.0[2 * k - 1], self.0[2 * k]))
    }

    /// Amplitude `hypot(a_k, b_k)` of harmonic `k`.
    pub fn amplitude(&self, k: usize) -> Option<f64> {
        self.harmonic(k).map(|(a, b)| a.hypot(b))
    }

    /// Copy with `delta` added to the DC term; harmonics untouched.
    pub fn with_offset(mut self, delta: f64) -> Self {
        self.0[0] += delta;
        self
    }

    pub fn as_array(&self) -> &[f64; N_COEFFS] {
        &self.0
    }

    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|c| c.is_finite())
    }
}

impl From<[f64; N_COEFFS]> for CurveCoefficients {
    fn from(c: [f64; N_COEFFS]) -> Self {
        Self(c)
    }
}

/// Design-matrix row `[1, cos(fx), sin(fx), cos(2fx), sin(2fx), cos(3fx), sin(3fx)]`.
///
/// `x` is reduced into `[0, period)` first, so `basis(p, x)` and
/// `basis(p, x + p)` agree exactly whenever `x + p` is representable.
#[inline]
pub fn basis(period: f64, x: f64) -> [f64; N_COEFFS] {
    let phase = TAU / period * x.rem_euclid(period);
    let mut row = [0.0; N_COEFFS];
    row[0] = 1.0;
    for k in 1..=N_HARMONICS {
        let (s, c) = (k as f64 * phase).sin_cos();
        row[2 * k - 1] = c;
        row[2 * k] = s;
    }
    row
}

/// Evaluate the model at `x`.
#[inline]
pub fn evaluate(coefficients: &CurveCoefficients, period: f64, x: f64) -> f64 {
    basis(period, x)
        .iter()
        .zip(coefficients.0.iter())
        .map(|(b, c)| b * c)
        .sum()
}

/// Coefficients bound to the period they were fitted over.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FittedCurve {
    pub coefficients: CurveCoefficients,
    /// Period in grid units, normally the image width.
    pub period: f64,
}

impl FittedCurve {
    pub fn new(coefficients: CurveCoefficients, period: f64) -> Self {
        Self {
            coefficients,
            period,
        }
    }

    /// `y(x)`.
    #[inline]
    pub fn eval(&self, x: f64) -> f64 {
        evaluate(&self.coefficients, self.period, x)
    }
}
