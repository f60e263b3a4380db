//! One-compartment model with first-order absorption and elimination
//!
//! A single oral dose follows the Bateman function
//!
//! ```text
//! C(t) = F·D·Ka / (Vd·BW·(Ka − Ke)) · (e^(−Ke·τ) − e^(−Ka·τ)),   τ = t − t_dose ≥ 0
//! ```
//!
//! with `Ke = ln(2) / t½`. When `Ka ≈ Ke` the limiting form
//! `F·D/(Vd·BW) · Ke·τ·e^(−Ke·τ)` is used instead. A dose contributes nothing
//! before its own timestamp, and because the model is linear in dose the
//! concentration of a dose history is the sum of the single-dose curves.

use crate::data::{Medication, MedicationDose, PkParameters};
use crate::error::PharmtrackError;

/// Milliseconds per hour, the conversion between timestamps and model time
pub const MS_PER_HOUR: f64 = 3_600_000.0;

/// Relative tolerance under which `Ka` and `Ke` are treated as equal
const RATE_TOLERANCE: f64 = 1e-9;

#[inline]
fn rates_coincide(ka: f64, ke: f64) -> bool {
    (ka - ke).abs() <= RATE_TOLERANCE * ka.max(ke)
}

/// Bateman concentration for parameters that are already validated.
///
/// `elapsed_hours` is the time since the dose; negative values yield 0.
#[inline]
pub(crate) fn bateman(params: &PkParameters, amount: f64, elapsed_hours: f64, body_weight: f64) -> f64 {
    if elapsed_hours < 0.0 {
        return 0.0;
    }
    let ke = params.ke();
    let ka = params.ka();
    let scale = params.bioavailability * amount / (params.volume_of_distribution * body_weight);

    let c = if rates_coincide(ka, ke) {
        scale * ke * elapsed_hours * (-ke * elapsed_hours).exp()
    } else {
        scale * ka / (ka - ke) * ((-ke * elapsed_hours).exp() - (-ka * elapsed_hours).exp())
    };

    // Round-off right after the dose can produce -0.0 or a tiny negative value
    if c.is_finite() {
        c.max(0.0)
    } else {
        0.0
    }
}

pub(crate) fn validate_body_weight(body_weight: f64) -> Result<f64, PharmtrackError> {
    if body_weight.is_finite() && body_weight > 0.0 {
        Ok(body_weight)
    } else {
        Err(PharmtrackError::invalid("body_weight", body_weight))
    }
}

/// Concentration (mg/L) contributed by one dose, `elapsed_hours` after it was taken
///
/// # Errors
/// [`PharmtrackError::InvalidParameter`] if any PK parameter or the body weight
/// is outside its domain.
pub fn single_dose_concentration(
    params: &PkParameters,
    amount: f64,
    elapsed_hours: f64,
    body_weight: f64,
) -> Result<f64, PharmtrackError> {
    params.validate()?;
    let body_weight = validate_body_weight(body_weight)?;
    Ok(bateman(params, amount, elapsed_hours, body_weight))
}

/// Doses of `medication` that carry information, sorted by (timestamp, id)
///
/// Sorting lets the summation stop at the first future dose; each dose still
/// contributes independently.
pub(crate) fn relevant_doses<'a>(
    medication: &Medication,
    doses: &'a [MedicationDose],
) -> Vec<&'a MedicationDose> {
    let mut selected: Vec<&MedicationDose> = doses
        .iter()
        .filter(|dose| dose.medication_id() == medication.id)
        .filter(|dose| {
            if dose.is_well_formed() {
                true
            } else {
                tracing::warn!(
                    dose_id = dose.id(),
                    amount = dose.amount(),
                    "Skipping malformed dose"
                );
                false
            }
        })
        .collect();
    selected.sort_by(|a, b| {
        a.timestamp()
            .cmp(&b.timestamp())
            .then_with(|| a.id().cmp(b.id()))
    });
    selected
}

/// Sum of single-dose contributions at `time_ms` over doses sorted by timestamp
#[inline]
pub(crate) fn superpose(
    params: &PkParameters,
    sorted_doses: &[&MedicationDose],
    time_ms: f64,
    body_weight: f64,
) -> f64 {
    let mut total = 0.0;
    for dose in sorted_doses {
        let dose_time = dose.timestamp() as f64;
        if dose_time > time_ms {
            break;
        }
        total += bateman(params, dose.amount(), (time_ms - dose_time) / MS_PER_HOUR, body_weight);
    }
    total
}

/// Total concentration (mg/L) of `medication` at `time` (epoch ms)
///
/// Doses of other medications and malformed doses are ignored. An empty dose
/// history yields 0. `body_weight` defaults to 70 kg.
pub fn compute_concentration(
    medication: &Medication,
    doses: &[MedicationDose],
    time: f64,
    body_weight: Option<f64>,
) -> Result<f64, PharmtrackError> {
    medication.pk.validate()?;
    let body_weight = validate_body_weight(body_weight.unwrap_or(DEFAULT_BODY_WEIGHT_KG))?;
    let sorted = relevant_doses(medication, doses);
    Ok(superpose(&medication.pk, &sorted, time, body_weight))
}

/// Body weight assumed when a caller does not supply one
pub const DEFAULT_BODY_WEIGHT_KG: f64 = 70.0;

/// Time from dose to peak concentration in hours
///
/// `ln(Ka/Ke) / (Ka − Ke)`, or `1/Ke` when the rates coincide.
pub fn time_to_peak(params: &PkParameters) -> Result<f64, PharmtrackError> {
    params.validate()?;
    let ke = params.ke();
    let ka = params.ka();
    if rates_coincide(ka, ke) {
        Ok(1.0 / ke)
    } else {
        Ok((ka / ke).ln() / (ka - ke))
    }
}

/// Peak concentration of a single dose
pub fn peak_concentration(
    params: &PkParameters,
    amount: f64,
    body_weight: f64,
) -> Result<f64, PharmtrackError> {
    let tmax = time_to_peak(params)?;
    single_dose_concentration(params, amount, tmax, body_weight)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const HOUR: i64 = 3_600_000;

    fn reference_medication() -> Medication {
        Medication::new("med-1", "Reference", PkParameters::new(30.0, 20.0, 0.8, 1.0))
    }

    #[test]
    fn no_concentration_before_the_dose() {
        let pk = reference_medication().pk;
        assert_eq!(bateman(&pk, 20.0, -0.5, 70.0), 0.0);
        assert_eq!(bateman(&pk, 20.0, 0.0, 70.0), 0.0);
    }

    #[test]
    fn concentration_rises_right_after_the_dose() {
        let pk = reference_medication().pk;
        let c1 = bateman(&pk, 20.0, 0.1, 70.0);
        let c2 = bateman(&pk, 20.0, 0.5, 70.0);
        assert!(c1 > 0.0);
        assert!(c2 > c1);
    }

    #[test]
    fn matches_the_closed_form() {
        let pk = reference_medication().pk;
        let ke = std::f64::consts::LN_2 / 30.0;
        let t = 6.0;
        let expected = 0.8 * 20.0 * 1.0 / (20.0 * 70.0 * (1.0 - ke)) * ((-ke * t).exp() - (-t).exp());
        assert_relative_eq!(bateman(&pk, 20.0, t, 70.0), expected, max_relative = 1e-12);
    }

    #[test]
    fn coinciding_rates_use_the_limiting_form() {
        let ke = std::f64::consts::LN_2 / 10.0;
        let equal = PkParameters::new(10.0, 1.0, 1.0, ke);
        let near = PkParameters::new(10.0, 1.0, 1.0, ke * (1.0 + 1e-6));

        for t in [0.5, 3.0, 12.0, 48.0] {
            let limit = bateman(&equal, 100.0, t, 70.0);
            assert!(limit.is_finite() && limit > 0.0);
            assert_relative_eq!(limit, bateman(&near, 100.0, t, 70.0), max_relative = 1e-4);
        }
        assert_relative_eq!(time_to_peak(&equal).unwrap(), 1.0 / ke, max_relative = 1e-12);
    }

    #[test]
    fn invalid_parameters_fail_fast() {
        let bad = PkParameters::new(-1.0, 20.0, 0.8, 1.0);
        assert!(matches!(
            single_dose_concentration(&bad, 20.0, 1.0, 70.0),
            Err(PharmtrackError::InvalidParameter { .. })
        ));
        let pk = reference_medication().pk;
        assert!(single_dose_concentration(&pk, 20.0, 1.0, 0.0).is_err());
    }

    #[test]
    fn two_doses_superpose() {
        let med = reference_medication();
        let doses = vec![
            MedicationDose::new("d2", "med-1", 24 * HOUR, 20.0),
            MedicationDose::new("d1", "med-1", 0, 20.0),
        ];
        let total = compute_concentration(&med, &doses, (30 * HOUR) as f64, Some(70.0)).unwrap();
        let first = single_dose_concentration(&med.pk, 20.0, 30.0, 70.0).unwrap();
        let second = single_dose_concentration(&med.pk, 20.0, 6.0, 70.0).unwrap();
        assert_relative_eq!(total, first + second, max_relative = 1e-12);
    }

    #[test]
    fn foreign_and_malformed_doses_are_ignored() {
        let med = reference_medication();
        let doses = vec![
            MedicationDose::new("d1", "med-1", 0, 20.0),
            MedicationDose::new("d2", "other", 0, 500.0),
            MedicationDose::new("d3", "med-1", 0, -5.0),
            MedicationDose::new("d4", "med-1", 0, f64::NAN),
        ];
        let only = vec![MedicationDose::new("d1", "med-1", 0, 20.0)];
        let t = (5 * HOUR) as f64;
        assert_eq!(
            compute_concentration(&med, &doses, t, None).unwrap(),
            compute_concentration(&med, &only, t, None).unwrap()
        );
    }

    #[test]
    fn empty_history_is_zero() {
        let med = reference_medication();
        assert_eq!(compute_concentration(&med, &[], 1.0e9, None).unwrap(), 0.0);
    }

    #[test]
    fn peak_is_the_maximum_of_the_curve() {
        let pk = reference_medication().pk;
        let tmax = time_to_peak(&pk).unwrap();
        let cmax = peak_concentration(&pk, 20.0, 70.0).unwrap();
        for dt in [-0.5, -0.1, 0.1, 0.5] {
            assert!(bateman(&pk, 20.0, tmax + dt, 70.0) < cmax);
        }
    }
}
