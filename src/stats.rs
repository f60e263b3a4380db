//! Statistical primitives shared by the insight engine and the sleep analyzer

use ndarray::{Array1, ArrayView1};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fewest paired samples for which a correlation is defined
pub const MIN_PAIRED_SAMPLES: usize = 3;

/// Why a correlation could not be computed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UndefinedReason {
    /// Fewer paired samples than required
    InsufficientSamples { n: usize, required: usize },
    /// One of the series is constant
    ZeroVariance,
    /// A value or an intermediate result was NaN or infinite
    NonFinite,
    /// The series have different lengths
    LengthMismatch { x: usize, y: usize },
}

impl fmt::Display for UndefinedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UndefinedReason::InsufficientSamples { n, required } => {
                write!(f, "insufficient data: {n} samples, need at least {required}")
            }
            UndefinedReason::ZeroVariance => write!(f, "insufficient data: no variation"),
            UndefinedReason::NonFinite => write!(f, "undefined: non-finite values"),
            UndefinedReason::LengthMismatch { x, y } => {
                write!(f, "undefined: series lengths differ ({x} vs {y})")
            }
        }
    }
}

/// Result of a correlation computation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum CorrelationOutcome {
    Defined { r: f64, n: usize },
    Undefined(UndefinedReason),
}

impl CorrelationOutcome {
    /// The coefficient, if defined
    pub fn coefficient(&self) -> Option<f64> {
        match self {
            CorrelationOutcome::Defined { r, .. } => Some(*r),
            CorrelationOutcome::Undefined(_) => None,
        }
    }

    /// The coefficient with undefined results read as 0
    pub fn or_zero(&self) -> f64 {
        self.coefficient().unwrap_or(0.0)
    }

    pub fn is_defined(&self) -> bool {
        matches!(self, CorrelationOutcome::Defined { .. })
    }
}

/// Pearson product-moment correlation of two paired series
///
/// `r = Σ(x−x̄)(y−ȳ) / sqrt(Σ(x−x̄)² · Σ(y−ȳ)²)`, clamped to [-1, 1] against
/// round-off. Constant series, fewer than [`MIN_PAIRED_SAMPLES`] pairs and
/// non-finite inputs are reported as [`CorrelationOutcome::Undefined`].
pub fn pearson(x: &[f64], y: &[f64]) -> CorrelationOutcome {
    if x.len() != y.len() {
        return CorrelationOutcome::Undefined(UndefinedReason::LengthMismatch {
            x: x.len(),
            y: y.len(),
        });
    }
    let n = x.len();
    if n < MIN_PAIRED_SAMPLES {
        return CorrelationOutcome::Undefined(UndefinedReason::InsufficientSamples {
            n,
            required: MIN_PAIRED_SAMPLES,
        });
    }
    if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
        return CorrelationOutcome::Undefined(UndefinedReason::NonFinite);
    }
    if is_constant(x) || is_constant(y) {
        return CorrelationOutcome::Undefined(UndefinedReason::ZeroVariance);
    }

    let dx = centered(ArrayView1::from(x));
    let dy = centered(ArrayView1::from(y));
    let sxy = dx.dot(&dy);
    let sxx = dx.dot(&dx);
    let syy = dy.dot(&dy);
    if sxx <= 0.0 || syy <= 0.0 {
        return CorrelationOutcome::Undefined(UndefinedReason::ZeroVariance);
    }

    let r = sxy / (sxx * syy).sqrt();
    if !r.is_finite() {
        return CorrelationOutcome::Undefined(UndefinedReason::NonFinite);
    }
    CorrelationOutcome::Defined {
        r: r.clamp(-1.0, 1.0),
        n,
    }
}

fn is_constant(values: &[f64]) -> bool {
    values.windows(2).all(|w| w[0] == w[1])
}

fn centered(values: ArrayView1<f64>) -> Array1<f64> {
    let mean = values.mean().unwrap_or(0.0);
    values.mapv(|v| v - mean)
}

/// Ordinary least-squares fit `y = intercept + slope · x`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
}

/// Fit a straight line; `None` for fewer than two points or constant `x`
pub fn linear_regression(x: &[f64], y: &[f64]) -> Option<LinearFit> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }
    let xs = ArrayView1::from(x);
    let ys = ArrayView1::from(y);
    let x_mean = xs.mean()?;
    let y_mean = ys.mean()?;
    let dx = xs.mapv(|v| v - x_mean);
    let dy = ys.mapv(|v| v - y_mean);

    let sxx = dx.dot(&dx);
    if sxx.abs() < 1e-15 {
        return None;
    }
    let slope = dx.dot(&dy) / sxx;
    let intercept = y_mean - slope * x_mean;

    let ss_tot = dy.dot(&dy);
    let ss_res: f64 = xs
        .iter()
        .zip(ys.iter())
        .map(|(xi, yi)| (yi - (intercept + slope * xi)).powi(2))
        .sum();
    let r_squared = if ss_tot.abs() < 1e-15 {
        1.0
    } else {
        1.0 - ss_res / ss_tot
    };

    if slope.is_finite() && intercept.is_finite() {
        Some(LinearFit {
            slope,
            intercept,
            r_squared,
        })
    } else {
        None
    }
}

/// Arithmetic mean, `None` for an empty slice
pub fn mean(values: &[f64]) -> Option<f64> {
    ArrayView1::from(values).mean()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn identical_series_correlate_perfectly() {
        let x = [1.0, 3.0, 2.0, 7.5, 4.0];
        assert_relative_eq!(pearson(&x, &x).coefficient().unwrap(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn negated_series_anticorrelate_perfectly() {
        let x = [0.2, 0.9, 0.4, 1.7];
        let neg: Vec<f64> = x.iter().map(|v| -v).collect();
        assert_relative_eq!(pearson(&x, &neg).coefficient().unwrap(), -1.0, epsilon = 1e-12);
    }

    #[test]
    fn constant_series_is_undefined_not_nan() {
        let constant = [0.1, 0.1, 0.1, 0.1];
        let y = [1.0, 2.0, 3.0, 4.0];
        let outcome = pearson(&constant, &y);
        assert_eq!(outcome, CorrelationOutcome::Undefined(UndefinedReason::ZeroVariance));
        assert_eq!(outcome.or_zero(), 0.0);
    }

    #[test]
    fn too_few_pairs_is_undefined() {
        assert_eq!(
            pearson(&[1.0, 2.0], &[2.0, 1.0]),
            CorrelationOutcome::Undefined(UndefinedReason::InsufficientSamples { n: 2, required: 3 })
        );
        assert!(!pearson(&[], &[]).is_defined());
    }

    #[test]
    fn non_finite_and_mismatched_inputs_are_undefined() {
        assert_eq!(
            pearson(&[1.0, f64::NAN, 3.0], &[1.0, 2.0, 3.0]),
            CorrelationOutcome::Undefined(UndefinedReason::NonFinite)
        );
        assert!(matches!(
            pearson(&[1.0, 2.0, 3.0], &[1.0, 2.0]),
            CorrelationOutcome::Undefined(UndefinedReason::LengthMismatch { x: 3, y: 2 })
        ));
    }

    #[test]
    fn known_coefficient() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [2.0, 4.0, 5.0, 4.0, 5.0];
        // Σdxdy = 6, Σdx² = 10, Σdy² = 6
        let expected = 6.0 / (10.0_f64 * 6.0).sqrt();
        assert_relative_eq!(pearson(&x, &y).coefficient().unwrap(), expected, epsilon = 1e-12);
    }

    #[test]
    fn regression_recovers_a_line() {
        let x = [0.0, 1.0, 2.0, 3.0];
        let y = [1.0, 3.0, 5.0, 7.0];
        let fit = linear_regression(&x, &y).unwrap();
        assert_relative_eq!(fit.slope, 2.0, epsilon = 1e-12);
        assert_relative_eq!(fit.intercept, 1.0, epsilon = 1e-12);
        assert_relative_eq!(fit.r_squared, 1.0, epsilon = 1e-12);
        assert!(linear_regression(&[1.0, 1.0], &[0.0, 2.0]).is_none());
        assert!(linear_regression(&[1.0], &[0.0]).is_none());
    }
}
