//! Medication exposure series aligned to mood entry timestamps

use crate::config::{ExposureKind, InsightOptions};
use crate::data::{Medication, MedicationDose, PkParameters};
use crate::pk::cache::{CachedHistory, ConcentrationCache};
use crate::pk::model::{relevant_doses, superpose, validate_body_weight, MS_PER_HOUR};

/// Evaluates a medication's exposure at arbitrary times
pub(crate) enum Exposure<'a> {
    /// Concentration computed from the dose history at each query
    Direct {
        params: PkParameters,
        doses: Vec<&'a MedicationDose>,
        body_weight: f64,
    },
    /// Concentration served from the point cache, identical to `Direct`
    Cached(CachedHistory<'a>),
    /// Dose taken within the presence window before the query
    Presence { dose_times: Vec<i64>, window_ms: f64 },
}

impl Exposure<'_> {
    pub(crate) fn kind(&self) -> ExposureKind {
        match self {
            Exposure::Direct { .. } | Exposure::Cached(_) => ExposureKind::Concentration,
            Exposure::Presence { .. } => ExposureKind::DosePresence,
        }
    }

    /// Exposure at `time_ms`; never NaN
    pub(crate) fn at(&self, time_ms: f64) -> f64 {
        match self {
            Exposure::Direct {
                params,
                doses,
                body_weight,
            } => superpose(params, doses, time_ms, *body_weight),
            Exposure::Cached(history) => history.concentration(time_ms),
            Exposure::Presence {
                dose_times,
                window_ms,
            } => {
                // Latest dose at or before the query time
                let idx = dose_times.partition_point(|&t| (t as f64) <= time_ms);
                let present = idx > 0 && time_ms - dose_times[idx - 1] as f64 <= *window_ms;
                if present {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }
}

/// Choose and prepare the exposure representation for one medication
///
/// Medications whose PK parameters are invalid fall back to dose presence.
pub(crate) fn prepare<'a>(
    medication: &'a Medication,
    doses: &'a [MedicationDose],
    options: &InsightOptions,
    cache: Option<&'a ConcentrationCache>,
) -> Exposure<'a> {
    let sorted = relevant_doses(medication, doses);

    let presence = |sorted: &[&MedicationDose]| Exposure::Presence {
        dose_times: sorted.iter().map(|d| d.timestamp()).collect(),
        window_ms: options.dose_presence_window_hours * MS_PER_HOUR,
    };

    if options.exposure == ExposureKind::DosePresence {
        return presence(&sorted);
    }

    if let Err(err) = medication.pk.validate() {
        tracing::warn!(
            medication_id = medication.id.as_str(),
            error = %err,
            "Invalid PK parameters, correlating dose presence instead"
        );
        return presence(&sorted);
    }
    let body_weight = match validate_body_weight(options.body_weight_kg) {
        Ok(bw) => bw,
        Err(err) => {
            tracing::warn!(error = %err, "Invalid body weight, correlating dose presence instead");
            return presence(&sorted);
        }
    };

    if let Some(cache) = cache {
        match cache.history(medication, doses, Some(body_weight)) {
            Ok(history) => return Exposure::Cached(history),
            Err(err) => tracing::debug!(
                medication_id = medication.id.as_str(),
                error = %err,
                "Cache unavailable, computing exposure directly"
            ),
        }
    }

    Exposure::Direct {
        params: medication.pk,
        doses: sorted,
        body_weight,
    }
}
