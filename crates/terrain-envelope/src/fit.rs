//! Least-squares fit of the periodic curve model to a boundary set.

use std::collections::HashMap;

use nalgebra::{SMatrix, SVector};
use serde::{Deserialize, Serialize};

use crate::boundary::BoundarySet;
use crate::curve::{basis, CurveCoefficients, FittedCurve, N_COEFFS};
use crate::error::FitError;

/// Minimum number of points (and distinct abscissae per period) for a fit.
pub const MIN_POINTS: usize = N_COEFFS;

const STEP_TOL: f64 = 1e-9;

/// Solver backend for the coefficient fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitSolver {
    /// Gauss-Newton iterations on the normal equations (`nalgebra` LU).
    GaussNewton,
    /// Levenberg-Marquardt backend (`tiny-solver`).
    #[default]
    Lm,
}

/// Configuration for the curve fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitConfig {
    /// Solver backend.
    pub solver: FitSolver,
    /// Iteration budget for the solver.
    pub max_iters: usize,
    /// Model period. `None` uses the boundary set's grid width.
    pub period: Option<f64>,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            solver: FitSolver::default(),
            max_iters: 100,
            period: None,
        }
    }
}

/// Fit the curve model to every point of `boundary`, starting from zero coefficients.
pub fn fit(boundary: &BoundarySet, config: &FitConfig) -> Result<FittedCurve, FitError> {
    let period = config
        .period
        .unwrap_or_else(|| boundary.grid_width() as f64);
    let samples = boundary.to_samples();
    let coefficients = fit_samples(&samples, period, config.solver, config.max_iters)?;
    let curve = FittedCurve::new(coefficients, period);
    tracing::debug!(
        "{:?} fit over {} points, period {:.1}, rms residual {:.3}",
        config.solver,
        samples.len(),
        period,
        rms_residual(&curve, boundary)
    );
    Ok(curve)
}

/// Fit coefficients to raw `[x, y]` samples.
pub fn fit_samples(
    samples: &[[f64; 2]],
    period: f64,
    solver: FitSolver,
    max_iters: usize,
) -> Result<CurveCoefficients, FitError> {
    if !period.is_finite() || period <= 0.0 {
        return Err(FitError::InvalidPeriod(period));
    }
    if samples.len() < MIN_POINTS {
        return Err(FitError::TooFewPoints {
            needed: MIN_POINTS,
            got: samples.len(),
        });
    }
    let distinct = distinct_phases(samples, period);
    if distinct < MIN_POINTS {
        return Err(FitError::DegenerateSamples {
            needed: MIN_POINTS,
            distinct,
        });
    }

    let coefficients = match solver {
        FitSolver::GaussNewton => solve_gauss_newton(samples, period, max_iters)?,
        FitSolver::Lm => solve_lm(samples, period, max_iters)?,
    };
    if !coefficients.is_finite() {
        return Err(FitError::NotConverged(
            "solver produced non-finite coefficients".into(),
        ));
    }
    Ok(coefficients)
}

/// Root-mean-square of `y_i - curve(x_i)` over the boundary set.
pub fn rms_residual(curve: &FittedCurve, boundary: &BoundarySet) -> f64 {
    if boundary.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = boundary
        .iter()
        .map(|p| {
            let r = p.y as f64 - curve.eval(p.x as f64);
            r * r
        })
        .sum();
    (sum_sq / boundary.len() as f64).sqrt()
}

fn distinct_phases(samples: &[[f64; 2]], period: f64) -> usize {
    let mut phases: Vec<f64> = samples.iter().map(|s| s[0].rem_euclid(period)).collect();
    phases.sort_by(f64::total_cmp);
    phases.dedup();
    phases.len()
}

type Normal = SMatrix<f64, N_COEFFS, N_COEFFS>;
type Coeffs = SVector<f64, N_COEFFS>;

fn solve_gauss_newton(
    samples: &[[f64; 2]],
    period: f64,
    max_iters: usize,
) -> Result<CurveCoefficients, FitError> {
    let mut c = Coeffs::zeros();
    // The first step lands on the optimum of this linear model; the second confirms it.
    let iters = max_iters.clamp(2, 200);

    for iter in 0..iters {
        let mut h = Normal::zeros();
        let mut g = Coeffs::zeros();
        for &[x, y] in samples {
            if !x.is_finite() || !y.is_finite() {
                continue;
            }
            let j = Coeffs::from(basis(period, x));
            let r = j.dot(&c) - y;
            h += j * j.transpose();
            g += j * r;
        }

        let step = h.lu().solve(&(-g)).ok_or(FitError::Singular)?;
        if !step.iter().all(|v| v.is_finite()) {
            return Err(FitError::Singular);
        }
        c += step;

        if step.norm() <= STEP_TOL * (1.0 + c.norm()) {
            tracing::trace!("Gauss-Newton converged after {} iterations", iter + 1);
            return Ok(CurveCoefficients(c.into()));
        }
    }

    Err(FitError::NotConverged(format!(
        "Gauss-Newton step still above tolerance after {iters} iterations"
    )))
}

fn solve_lm(
    samples: &[[f64; 2]],
    period: f64,
    max_iters: usize,
) -> Result<CurveCoefficients, FitError> {
    use tiny_solver::factors::na as ts_na;
    use tiny_solver::Optimizer;

    const KEY: &str = "coeffs";

    #[derive(Debug, Clone)]
    struct HarmonicFactor {
        row: [f64; N_COEFFS],
        y: f64,
    }

    impl<T: ts_na::RealField> tiny_solver::factors::Factor<T> for HarmonicFactor {
        fn residual_func(&self, params: &[ts_na::DVector<T>]) -> ts_na::DVector<T> {
            let c = &params[0];
            let mut model: T = ts_na::convert(0.0);
            for (k, b) in self.row.iter().enumerate() {
                let b: T = ts_na::convert(*b);
                model = model + c[k].clone() * b;
            }
            let y: T = ts_na::convert(self.y);
            ts_na::DVector::<T>::from_vec(vec![model - y])
        }
    }

    let mut problem = tiny_solver::Problem::new();
    for &[x, y] in samples {
        if !x.is_finite() || !y.is_finite() {
            continue;
        }
        problem.add_residual_block(
            1,
            &[KEY],
            Box::new(HarmonicFactor {
                row: basis(period, x),
                y,
            }),
            None,
        );
    }

    let mut initial_values = HashMap::<String, ts_na::DVector<f64>>::new();
    initial_values.insert(KEY.to_string(), ts_na::DVector::<f64>::zeros(N_COEFFS));

    let optimizer = tiny_solver::LevenbergMarquardtOptimizer::default();
    let options = tiny_solver::OptimizerOptions {
        max_iteration: max_iters.clamp(1, 500),
        verbosity_level: 0,
        ..Default::default()
    };
    let result = optimizer
        .optimize(&problem, &initial_values, Some(options))
        .ok_or_else(|| FitError::NotConverged("Levenberg-Marquardt returned no solution".into()))?;
    let c = result
        .get(KEY)
        .ok_or_else(|| FitError::NotConverged("solution is missing the coefficient block".into()))?;
    if c.len() != N_COEFFS {
        return Err(FitError::NotConverged(format!(
            "expected {} coefficients, got {}",
            N_COEFFS,
            c.len()
        )));
    }

    let mut out = [0.0; N_COEFFS];
    for (dst, src) in out.iter_mut().zip(c.iter()) {
        *dst = *src;
    }
    Ok(CurveCoefficients(out))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::BoundaryPoint;
    use crate::curve::evaluate;
    use crate::test_utils::{boundary_from_fn, noisy_hills};
    use approx::assert_abs_diff_eq;

    fn gauss_newton() -> FitConfig {
        FitConfig {
            solver: FitSolver::GaussNewton,
            ..Default::default()
        }
    }

    #[test]
    fn recovers_exact_harmonics() {
        let truth = CurveCoefficients([120.0, 25.0, -10.0, 6.0, 3.0, -2.0, 1.5]);
        let samples: Vec<[f64; 2]> = (0..64)
            .map(|i| {
                let x = i as f64 * 5.0;
                [x, evaluate(&truth, 320.0, x)]
            })
            .collect();
        for (solver, tol) in [(FitSolver::GaussNewton, 1e-8), (FitSolver::Lm, 1e-2)] {
            let c = fit_samples(&samples, 320.0, solver, 100).expect("fit");
            for (got, want) in c.0.iter().zip(truth.0.iter()) {
                assert_abs_diff_eq!(*got, *want, epsilon = tol);
            }
        }
    }

    #[test]
    fn sine_scenario_has_dominant_first_harmonic() {
        // 640x384 grid, surface oscillating between y=100 and y=200 once per width.
        let tau = std::f64::consts::TAU / 640.0;
        let boundary = boundary_from_fn(640, 384, 1, |x| 150.0 + 50.0 * (tau * x).cos());
        let curve = fit(&boundary, &FitConfig::default()).expect("fit");
        assert_eq!(curve.period, 640.0);
        let a1 = curve.coefficients.amplitude(1).unwrap();
        assert_abs_diff_eq!(a1, 50.0, epsilon = 0.5);
        assert!(a1 > 10.0 * curve.coefficients.amplitude(2).unwrap());
        assert!(a1 > 10.0 * curve.coefficients.amplitude(3).unwrap());
        assert_abs_diff_eq!(curve.coefficients.a0(), 150.0, epsilon = 0.5);
        assert!(rms_residual(&curve, &boundary) < 0.5);
    }

    #[test]
    fn solvers_agree_on_noisy_terrain() {
        let boundary = noisy_hills(400, 300, 3, 7);
        let gn = fit(&boundary, &gauss_newton()).expect("gauss-newton");
        let lm = fit(&boundary, &FitConfig::default()).expect("lm");
        for (a, b) in gn.coefficients.0.iter().zip(lm.coefficients.0.iter()) {
            assert_abs_diff_eq!(*a, *b, epsilon = 0.1);
        }
        assert!(rms_residual(&gn, &boundary) <= rms_residual(&lm, &boundary) + 1e-6);
    }

    #[test]
    fn fit_is_deterministic() {
        let boundary = noisy_hills(256, 200, 4, 11);
        for cfg in [gauss_newton(), FitConfig::default()] {
            let a = fit(&boundary, &cfg).unwrap();
            let b = fit(&boundary, &cfg).unwrap();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn explicit_period_overrides_grid_width() {
        let boundary = noisy_hills(200, 300, 2, 3);
        let cfg = FitConfig {
            period: Some(400.0),
            ..gauss_newton()
        };
        assert_eq!(fit(&boundary, &cfg).unwrap().period, 400.0);
    }

    #[test]
    fn too_few_points_fail() {
        let points = (0..6).map(|x| BoundaryPoint::new(x, 10)).collect();
        let boundary = BoundarySet::from_points(points, 6, 20).unwrap();
        for cfg in [gauss_newton(), FitConfig::default()] {
            assert_eq!(
                fit(&boundary, &cfg),
                Err(FitError::TooFewPoints { needed: 7, got: 6 })
            );
        }
    }

    #[test]
    fn repeated_phases_are_degenerate() {
        // Ten samples, but only five distinct positions within one period.
        let samples: Vec<[f64; 2]> = (0..10)
            .map(|i| [(i % 5) as f64 * 10.0 + if i >= 5 { 100.0 } else { 0.0 }, 3.0])
            .collect();
        assert_eq!(
            fit_samples(&samples, 100.0, FitSolver::GaussNewton, 10),
            Err(FitError::DegenerateSamples {
                needed: 7,
                distinct: 5
            })
        );
    }

    #[test]
    fn invalid_period_is_rejected() {
        let samples: Vec<[f64; 2]> = (0..10).map(|i| [i as f64, 1.0]).collect();
        for period in [0.0, -5.0, f64::NAN, f64::INFINITY] {
            let err = fit_samples(&samples, period, FitSolver::Lm, 10).unwrap_err();
            assert!(matches!(err, FitError::InvalidPeriod(_)));
        }
    }

    #[test]
    fn seven_distinct_points_are_enough() {
        let truth = CurveCoefficients([10.0, 1.0, 2.0, 0.5, -0.5, 0.25, 0.0]);
        let samples: Vec<[f64; 2]> = [0.0, 13.0, 29.0, 41.0, 55.0, 70.0, 88.0]
            .iter()
            .map(|&x| [x, evaluate(&truth, 100.0, x)])
            .collect();
        let c = fit_samples(&samples, 100.0, FitSolver::GaussNewton, 10).expect("fit");
        for (got, want) in c.0.iter().zip(truth.0.iter()) {
            assert_abs_diff_eq!(*got, *want, epsilon = 1e-6);
        }
    }
}
