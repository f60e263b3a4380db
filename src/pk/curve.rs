//! Concentration curves sampled over a time window
//!
//! A curve is `points` evenly spaced samples over `[start, end]`, each the sum
//! of every dose's contribution at that instant. Samples below the noise floor
//! are reported as `None` so that charts do not draw near-zero artifacts.
//!
//! ```rust,ignore
//! use pharmtrack::pk::curve::build_concentration_curve;
//!
//! let curve = build_concentration_curve(&medication, &doses, start, end, Some(200), None)?;
//! let peak = pharmtrack::pk::curve::summarize(&curve, medication.therapeutic_range.as_ref());
//! ```

use crate::config::CurveOptions;
use crate::data::{Medication, MedicationDose, PkParameters, TherapeuticRange};
use crate::error::PharmtrackError;
use crate::pk::cancel::CancellationToken;
use crate::pk::model::{relevant_doses, superpose, validate_body_weight, MS_PER_HOUR};
use serde::{Deserialize, Serialize};

/// One sample of a concentration curve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConcentrationPoint {
    /// Sample time in epoch milliseconds
    pub time: f64,
    /// Concentration in mg/L, `None` below the noise floor
    pub concentration: Option<f64>,
}

impl ConcentrationPoint {
    /// Concentration with absent samples read as zero
    pub fn value(&self) -> f64 {
        self.concentration.unwrap_or(0.0)
    }
}

/// Window, resolution and body weight of a curve request
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurveRequest {
    /// Window start in epoch milliseconds
    pub start: f64,
    /// Window end in epoch milliseconds
    pub end: f64,
    /// Number of samples (None = configured default)
    pub points: Option<usize>,
    /// Body weight in kg (None = configured default)
    pub body_weight: Option<f64>,
}

impl CurveRequest {
    pub fn new(start: f64, end: f64) -> Self {
        CurveRequest {
            start,
            end,
            points: None,
            body_weight: None,
        }
    }

    pub fn with_points(mut self, points: usize) -> Self {
        self.points = Some(points);
        self
    }

    pub fn with_body_weight(mut self, body_weight: f64) -> Self {
        self.body_weight = Some(body_weight);
        self
    }

    /// Fill defaults and check the window, resolution and body weight
    pub(crate) fn resolve(&self, options: &CurveOptions) -> Result<ResolvedRequest, PharmtrackError> {
        if !(self.start.is_finite() && self.end.is_finite() && self.start < self.end) {
            return Err(PharmtrackError::InvalidWindow {
                start: self.start,
                end: self.end,
            });
        }
        let points = self.points.unwrap_or(options.default_points);
        if points < 2 {
            return Err(PharmtrackError::InvalidPoints { points });
        }
        let body_weight =
            validate_body_weight(self.body_weight.unwrap_or(options.default_body_weight_kg))?;
        Ok(ResolvedRequest {
            start: self.start,
            end: self.end,
            points,
            body_weight,
        })
    }
}

/// A request with every default filled in
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct ResolvedRequest {
    pub start: f64,
    pub end: f64,
    pub points: usize,
    pub body_weight: f64,
}

impl ResolvedRequest {
    #[inline]
    fn sample_time(&self, i: usize) -> f64 {
        if i + 1 == self.points {
            self.end
        } else {
            self.start + (self.end - self.start) * i as f64 / (self.points - 1) as f64
        }
    }
}

/// Sample validated parameters over a resolved window
pub(crate) fn sample(
    params: &PkParameters,
    sorted_doses: &[&MedicationDose],
    request: &ResolvedRequest,
    noise_floor: f64,
    cancel: Option<&CancellationToken>,
) -> Result<Vec<ConcentrationPoint>, PharmtrackError> {
    let mut curve = Vec::with_capacity(request.points);
    for i in 0..request.points {
        if cancel.is_some_and(|token| token.is_cancelled()) {
            return Err(PharmtrackError::Cancelled);
        }
        let time = request.sample_time(i);
        let c = superpose(params, sorted_doses, time, request.body_weight);
        curve.push(ConcentrationPoint {
            time,
            concentration: (c >= noise_floor && c > 0.0).then_some(c),
        });
    }
    Ok(curve)
}

/// Build a curve with explicit options and an optional cancellation token
///
/// # Errors
/// - [`PharmtrackError::InvalidParameter`] for invalid PK parameters or body weight
/// - [`PharmtrackError::InvalidWindow`] unless `start < end`
/// - [`PharmtrackError::InvalidPoints`] for fewer than two samples
/// - [`PharmtrackError::Cancelled`] if the token fires mid-computation
pub fn build_curve(
    medication: &Medication,
    doses: &[MedicationDose],
    request: &CurveRequest,
    options: &CurveOptions,
    cancel: Option<&CancellationToken>,
) -> Result<Vec<ConcentrationPoint>, PharmtrackError> {
    medication.pk.validate()?;
    let resolved = request.resolve(options)?;
    let sorted = relevant_doses(medication, doses);
    sample(&medication.pk, &sorted, &resolved, options.noise_floor, cancel)
}

/// Build a curve of `points` samples (default 100) over `[start, end]`
///
/// Body weight defaults to 70 kg. An empty dose list yields a curve of
/// absent samples.
pub fn build_concentration_curve(
    medication: &Medication,
    doses: &[MedicationDose],
    start: f64,
    end: f64,
    points: Option<usize>,
    body_weight: Option<f64>,
) -> Result<Vec<ConcentrationPoint>, PharmtrackError> {
    let request = CurveRequest {
        start,
        end,
        points,
        body_weight,
    };
    build_curve(medication, doses, &request, &CurveOptions::default(), None)
}

/// Linearly interpolate a curve at `time`
///
/// Absent samples count as zero. Returns `None` outside the sampled window
/// and for a non-finite `time`.
pub fn interpolate(curve: &[ConcentrationPoint], time: f64) -> Option<f64> {
    let first = curve.first()?;
    let last = curve.last()?;
    if !time.is_finite() || time < first.time || time > last.time {
        return None;
    }
    let idx = curve.partition_point(|p| p.time < time);
    if idx == 0 {
        return Some(first.value());
    }
    let (a, b) = (&curve[idx - 1], &curve[idx]);
    let span = b.time - a.time;
    if span <= 0.0 {
        return Some(b.value());
    }
    let u = (time - a.time) / span;
    Some(a.value() + u * (b.value() - a.value()))
}

// ============================================================================
// Curve summary
// ============================================================================

/// Exposure summary of a sampled curve
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurveSummary {
    /// Highest sampled concentration
    pub cmax: f64,
    /// Time of the highest sample (epoch ms)
    pub tmax: f64,
    /// Linear trapezoidal area in mg·h/L
    pub auc: f64,
    /// Hours below the therapeutic range (None without a range)
    pub time_below_hours: Option<f64>,
    /// Hours inside the therapeutic range
    pub time_within_hours: Option<f64>,
    /// Hours above the therapeutic range
    pub time_above_hours: Option<f64>,
}

/// Fraction of a linear segment from `c0` to `c1` whose value lies in `[lo, hi]`
fn fraction_between(c0: f64, c1: f64, lo: f64, hi: f64) -> f64 {
    let dc = c1 - c0;
    if dc == 0.0 {
        return if c0 >= lo && c0 <= hi { 1.0 } else { 0.0 };
    }
    let u_lo = (lo - c0) / dc;
    let u_hi = (hi - c0) / dc;
    let enter = u_lo.min(u_hi).max(0.0);
    let exit = u_lo.max(u_hi).min(1.0);
    (exit - enter).max(0.0)
}

/// Summarize a curve. Returns `None` for fewer than two samples.
pub fn summarize(
    curve: &[ConcentrationPoint],
    range: Option<&TherapeuticRange>,
) -> Option<CurveSummary> {
    if curve.len() < 2 {
        return None;
    }

    let (tmax, cmax) = curve
        .iter()
        .map(|p| (p.time, p.value()))
        .fold((curve[0].time, f64::NEG_INFINITY), |best, (t, c)| {
            if c > best.1 {
                (t, c)
            } else {
                best
            }
        });

    let mut auc = 0.0;
    let mut below = 0.0;
    let mut within = 0.0;
    let mut above = 0.0;
    for pair in curve.windows(2) {
        let (c0, c1) = (pair[0].value(), pair[1].value());
        let hours = (pair[1].time - pair[0].time) / MS_PER_HOUR;
        auc += (c0 + c1) / 2.0 * hours;
        if let Some(range) = range {
            within += hours * fraction_between(c0, c1, range.min, range.max);
            above += hours * fraction_between(c0, c1, range.max, f64::INFINITY);
            below += hours * fraction_between(c0, c1, f64::NEG_INFINITY, range.min);
        }
    }

    Some(CurveSummary {
        cmax,
        tmax,
        auc,
        time_below_hours: range.map(|_| below),
        time_within_hours: range.map(|_| within),
        time_above_hours: range.map(|_| above),
    })
}
