//! Insight report generation
//!
//! For every (medication, mood metric) pair the engine aligns the medication's
//! exposure to the mood entry timestamps, searches the configured lags for the
//! strongest Pearson correlation and classifies the result.

use crate::config::InsightOptions;
use crate::data::{Medication, MedicationDose, MoodEntry, MoodMetric};
use crate::insights::correlation::best_lag;
use crate::insights::exposure::{prepare, Exposure};
use crate::insights::report::{
    DataQuality, InsightsReport, MetricCorrelation, RedFlag, Severity, SkippedPair, Strength,
};
use crate::pk::cache::ConcentrationCache;
use crate::stats::{CorrelationOutcome, UndefinedReason};
use rayon::prelude::*;
use std::cmp::Ordering;
use std::collections::HashSet;

const MS_PER_DAY: i64 = 86_400_000;

/// Adverse |r| from which a red flag is rated [`Severity::High`]
const HIGH_SEVERITY: f64 = 0.7;

enum PairResult {
    Correlated(MetricCorrelation),
    Skipped(SkippedPair),
}

/// Configurable insight engine
///
/// ```rust,ignore
/// let cache = ConcentrationCache::default();
/// let report = InsightEngine::new(InsightOptions::default())
///     .with_cache(&cache)
///     .generate(&medications, &doses, &mood_entries, 30);
/// ```
pub struct InsightEngine<'c> {
    options: InsightOptions,
    cache: Option<&'c ConcentrationCache>,
    reference_time: Option<i64>,
}

impl<'c> InsightEngine<'c> {
    pub fn new(options: InsightOptions) -> Self {
        InsightEngine {
            options,
            cache: None,
            reference_time: None,
        }
    }

    /// Serve concentration exposure from the point cache; the report is unchanged
    pub fn with_cache(mut self, cache: &'c ConcentrationCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// End the window at `time` (epoch ms) instead of the latest data point
    pub fn with_reference_time(mut self, time: i64) -> Self {
        self.reference_time = Some(time);
        self
    }

    pub fn options(&self) -> &InsightOptions {
        &self.options
    }

    /// Build the report for the last `timeframe_days` days
    ///
    /// Never fails: missing or sparse data shows up in
    /// [`InsightsReport::insufficient`] and [`InsightsReport::data_quality`].
    pub fn generate(
        &self,
        medications: &[Medication],
        doses: &[MedicationDose],
        mood_entries: &[MoodEntry],
        timeframe_days: u32,
    ) -> InsightsReport {
        let now = self.reference_time.unwrap_or_else(|| {
            mood_entries
                .iter()
                .map(|e| e.timestamp)
                .chain(doses.iter().map(|d| d.timestamp()))
                .max()
                .unwrap_or(0)
        });
        let window_start =
            now.saturating_sub(i64::from(timeframe_days).saturating_mul(MS_PER_DAY));
        let in_window = |t: i64| t >= window_start && t <= now;

        let mut entries: Vec<&MoodEntry> =
            mood_entries.iter().filter(|e| in_window(e.timestamp)).collect();
        entries.sort_by_key(|e| e.timestamp);

        let medication_ids: HashSet<&str> = medications.iter().map(|m| m.id.as_str()).collect();
        let data_quality = DataQuality {
            mood_entries: entries.len(),
            doses: doses
                .iter()
                .filter(|d| medication_ids.contains(d.medication_id()) && in_window(d.timestamp()))
                .count(),
            medications: medications.len(),
            sufficient: false,
        };
        let data_quality = DataQuality {
            sufficient: data_quality.mood_entries >= self.options.min_sample_size
                && data_quality.doses > 0,
            ..data_quality
        };

        let exposures: Vec<(&Medication, Exposure<'_>)> = medications
            .par_iter()
            .map(|medication| {
                let exposure = prepare(medication, doses, &self.options, self.cache);
                (medication, exposure)
            })
            .collect();

        let metric_samples: Vec<(MoodMetric, Vec<(i64, f64)>)> = MoodMetric::ALL
            .iter()
            .map(|&metric| {
                let samples = entries
                    .iter()
                    .filter_map(|e| e.value(metric).map(|v| (e.timestamp, v)))
                    .collect::<Vec<_>>();
                (metric, samples)
            })
            .filter(|(_, samples)| !samples.is_empty())
            .collect();

        let pairs: Vec<(usize, usize)> = (0..exposures.len())
            .flat_map(|m| (0..metric_samples.len()).map(move |k| (m, k)))
            .collect();

        let results: Vec<PairResult> = pairs
            .par_iter()
            .map(|&(m, k)| {
                let (medication, exposure) = &exposures[m];
                let (metric, samples) = &metric_samples[k];
                self.evaluate_pair(medication, exposure, *metric, samples)
            })
            .collect();

        let mut correlations = Vec::new();
        let mut insufficient = Vec::new();
        for result in results {
            match result {
                PairResult::Correlated(c) => correlations.push(c),
                PairResult::Skipped(s) => insufficient.push(s),
            }
        }

        let report = self.rank(
            now,
            window_start,
            timeframe_days,
            correlations,
            insufficient,
            data_quality,
        );
        tracing::debug!(
            correlations = report.correlations.len(),
            red_flags = report.red_flags.len(),
            insufficient = report.insufficient.len(),
            "Generated insights report"
        );
        report
    }

    fn evaluate_pair(
        &self,
        medication: &Medication,
        exposure: &Exposure<'_>,
        metric: MoodMetric,
        samples: &[(i64, f64)],
    ) -> PairResult {
        let lagged = best_lag(exposure, samples, &self.options.lag_hours);
        tracing::trace!(
            medication_id = medication.id.as_str(),
            metric = metric.name(),
            outcome = ?lagged.outcome,
            lag_hours = lagged.lag_hours,
            "Evaluated correlation"
        );

        let skipped = |reason: UndefinedReason| {
            PairResult::Skipped(SkippedPair {
                medication_id: medication.id.clone(),
                metric,
                reason,
            })
        };

        match lagged.outcome {
            CorrelationOutcome::Undefined(reason) => skipped(reason),
            CorrelationOutcome::Defined { n, .. } if n < self.options.min_sample_size => {
                skipped(UndefinedReason::InsufficientSamples {
                    n,
                    required: self.options.min_sample_size,
                })
            }
            CorrelationOutcome::Defined { r, n } => PairResult::Correlated(MetricCorrelation {
                medication_id: medication.id.clone(),
                medication_name: medication.name.clone(),
                metric,
                correlation: r,
                lag_hours: lagged.lag_hours,
                sample_size: n,
                strength: Strength::from_coefficient(r),
                exposure: exposure.kind(),
            }),
        }
    }

    fn rank(
        &self,
        now: i64,
        window_start: i64,
        timeframe_days: u32,
        mut correlations: Vec<MetricCorrelation>,
        insufficient: Vec<SkippedPair>,
        data_quality: DataQuality,
    ) -> InsightsReport {
        correlations.sort_by(|a, b| {
            b.correlation
                .abs()
                .partial_cmp(&a.correlation.abs())
                .unwrap_or(Ordering::Equal)
                .then_with(|| tie_break(a, b))
        });

        let floor = self.options.min_correlation;
        let mut top_positive: Vec<MetricCorrelation> = correlations
            .iter()
            .filter(|c| c.correlation > 0.0 && c.correlation.abs() > floor)
            .cloned()
            .collect();
        top_positive.sort_by(|a, b| {
            b.correlation
                .partial_cmp(&a.correlation)
                .unwrap_or(Ordering::Equal)
                .then_with(|| tie_break(a, b))
        });
        top_positive.truncate(self.options.top_n);

        let mut top_negative: Vec<MetricCorrelation> = correlations
            .iter()
            .filter(|c| c.correlation < 0.0 && c.correlation.abs() > floor)
            .cloned()
            .collect();
        top_negative.sort_by(|a, b| {
            a.correlation
                .partial_cmp(&b.correlation)
                .unwrap_or(Ordering::Equal)
                .then_with(|| tie_break(a, b))
        });
        top_negative.truncate(self.options.top_n);

        let mut flagged: Vec<&MetricCorrelation> = correlations
            .iter()
            .filter(|c| c.adverse_strength() >= self.options.red_flag_threshold)
            .collect();
        flagged.sort_by(|a, b| {
            b.adverse_strength()
                .partial_cmp(&a.adverse_strength())
                .unwrap_or(Ordering::Equal)
                .then_with(|| tie_break(a, b))
        });
        let red_flags = flagged.into_iter().map(red_flag).collect();

        InsightsReport {
            generated_at: now,
            timeframe_days,
            window_start,
            correlations,
            top_positive_impacts: top_positive,
            top_negative_impacts: top_negative,
            red_flags,
            insufficient,
            data_quality,
        }
    }
}

fn tie_break(a: &MetricCorrelation, b: &MetricCorrelation) -> Ordering {
    a.medication_id
        .cmp(&b.medication_id)
        .then_with(|| a.metric.cmp(&b.metric))
}

fn red_flag(c: &MetricCorrelation) -> RedFlag {
    let adverse = c.adverse_strength();
    let direction = if c.metric.higher_is_better() {
        "lower"
    } else {
        "higher"
    };
    RedFlag {
        medication_id: c.medication_id.clone(),
        medication_name: c.medication_name.clone(),
        metric: c.metric,
        correlation: c.correlation,
        lag_hours: c.lag_hours,
        severity: if adverse >= HIGH_SEVERITY {
            Severity::High
        } else {
            Severity::Moderate
        },
        message: format!(
            "{} is associated with {} {} (r = {:.2}, lag {} h, n = {})",
            c.medication_name, direction, c.metric, c.correlation, c.lag_hours, c.sample_size
        ),
    }
}

/// Generate a report with default options
pub fn generate_insights_report(
    medications: &[Medication],
    doses: &[MedicationDose],
    mood_entries: &[MoodEntry],
    timeframe_days: u32,
) -> InsightsReport {
    InsightEngine::new(InsightOptions::default()).generate(
        medications,
        doses,
        mood_entries,
        timeframe_days,
    )
}
