//! Lag search over exposure/metric correlations

use crate::insights::exposure::Exposure;
use crate::pk::model::MS_PER_HOUR;
use crate::stats::{pearson, CorrelationOutcome};

/// Strongest correlation found over the candidate lags
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct LaggedCorrelation {
    pub outcome: CorrelationOutcome,
    pub lag_hours: f64,
}

/// Correlate `exposure`, shifted back by each candidate lag, against `samples`
///
/// `samples` are `(timestamp, value)` pairs. The lag with the largest |r| wins;
/// ties keep the earlier candidate. If no lag yields a defined correlation the
/// outcome of the first candidate is returned. An empty lag list searches lag 0.
pub(crate) fn best_lag(
    exposure: &Exposure<'_>,
    samples: &[(i64, f64)],
    lags_hours: &[f64],
) -> LaggedCorrelation {
    let values: Vec<f64> = samples.iter().map(|&(_, v)| v).collect();
    let lags: &[f64] = if lags_hours.is_empty() {
        &[0.0]
    } else {
        lags_hours
    };

    let mut best: Option<LaggedCorrelation> = None;
    let mut first_undefined: Option<LaggedCorrelation> = None;

    for &lag in lags {
        let shift = lag * MS_PER_HOUR;
        let series: Vec<f64> = samples
            .iter()
            .map(|&(t, _)| exposure.at(t as f64 - shift))
            .collect();
        let candidate = LaggedCorrelation {
            outcome: pearson(&series, &values),
            lag_hours: lag,
        };

        match (candidate.outcome.coefficient(), best) {
            (Some(r), Some(current)) => {
                if r.abs() > current.outcome.or_zero().abs() {
                    best = Some(candidate);
                }
            }
            (Some(_), None) => best = Some(candidate),
            (None, _) => {
                if first_undefined.is_none() {
                    first_undefined = Some(candidate);
                }
            }
        }
    }

    best.or(first_undefined).unwrap_or(LaggedCorrelation {
        outcome: pearson(&[], &[]),
        lag_hours: 0.0,
    })
}
