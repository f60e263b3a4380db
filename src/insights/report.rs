//! Insight report types

use crate::config::ExposureKind;
use crate::data::MoodMetric;
use crate::stats::UndefinedReason;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Qualitative strength of a correlation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strength {
    Weak,
    Moderate,
    Strong,
}

impl Strength {
    /// `Strong` from |r| ≥ 0.7, `Moderate` from 0.4
    pub fn from_coefficient(r: f64) -> Self {
        let r = r.abs();
        if r >= 0.7 {
            Strength::Strong
        } else if r >= 0.4 {
            Strength::Moderate
        } else {
            Strength::Weak
        }
    }
}

impl fmt::Display for Strength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strength::Weak => write!(f, "weak"),
            Strength::Moderate => write!(f, "moderate"),
            Strength::Strong => write!(f, "strong"),
        }
    }
}

/// A defined correlation between one medication and one mood metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricCorrelation {
    pub medication_id: String,
    pub medication_name: String,
    pub metric: MoodMetric,
    /// Pearson coefficient at the winning lag
    pub correlation: f64,
    /// Hours by which exposure precedes the mood entry
    pub lag_hours: f64,
    /// Number of paired samples
    pub sample_size: usize,
    pub strength: Strength,
    pub exposure: ExposureKind,
}

impl MetricCorrelation {
    /// Correlation expressed in the harmful direction of the metric
    ///
    /// Positive when the medication goes along with a worse rating.
    pub fn adverse_strength(&self) -> f64 {
        if self.metric.higher_is_better() {
            -self.correlation
        } else {
            self.correlation
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Moderate,
    High,
}

/// A correlation suggesting a harmful association worth reviewing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedFlag {
    pub medication_id: String,
    pub medication_name: String,
    pub metric: MoodMetric,
    pub correlation: f64,
    pub lag_hours: f64,
    pub severity: Severity,
    pub message: String,
}

/// A (medication, metric) pair that could not be evaluated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedPair {
    pub medication_id: String,
    pub metric: MoodMetric,
    pub reason: UndefinedReason,
}

/// Amount of data behind a report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataQuality {
    /// Mood entries inside the window
    pub mood_entries: usize,
    /// Doses of the analysed medications inside the window
    pub doses: usize,
    /// Medications analysed
    pub medications: usize,
    /// Enough mood entries and at least one dose to trust the report
    pub sufficient: bool,
}

/// Ranked medication/mood insights over a look-back window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightsReport {
    /// End of the analysed window (epoch ms)
    pub generated_at: i64,
    pub timeframe_days: u32,
    /// Start of the analysed window (epoch ms)
    pub window_start: i64,
    /// Every defined correlation, strongest first
    pub correlations: Vec<MetricCorrelation>,
    /// Positive correlations above the noise floor, descending
    pub top_positive_impacts: Vec<MetricCorrelation>,
    /// Negative correlations above the noise floor, ascending
    pub top_negative_impacts: Vec<MetricCorrelation>,
    /// Harmful associations, most severe first
    pub red_flags: Vec<RedFlag>,
    /// Pairs reported as insufficient data
    pub insufficient: Vec<SkippedPair>,
    pub data_quality: DataQuality,
}

impl InsightsReport {
    /// True when no correlation could be established
    pub fn is_empty(&self) -> bool {
        self.correlations.is_empty()
    }
}
