//! Mood journal entries
//!
//! Every rating lives in an explicit field; the set of metrics is the closed
//! enumeration [`MoodMetric`]. Only the overall mood score is mandatory.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A self-reported mood entry, ratings typically on a 0-10 scale
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodEntry {
    /// Entry time in epoch milliseconds
    pub timestamp: i64,
    pub mood: f64,
    #[serde(default)]
    pub anxiety: Option<f64>,
    #[serde(default)]
    pub energy: Option<f64>,
    #[serde(default)]
    pub focus: Option<f64>,
    #[serde(default)]
    pub motivation: Option<f64>,
    #[serde(default)]
    pub irritability: Option<f64>,
    #[serde(default)]
    pub stress: Option<f64>,
}

impl MoodEntry {
    pub fn new(timestamp: i64, mood: f64) -> Self {
        MoodEntry {
            timestamp,
            mood,
            anxiety: None,
            energy: None,
            focus: None,
            motivation: None,
            irritability: None,
            stress: None,
        }
    }

    /// Set a rating. Setting [`MoodMetric::Mood`] replaces the overall score.
    pub fn with(mut self, metric: MoodMetric, value: f64) -> Self {
        match metric {
            MoodMetric::Mood => self.mood = value,
            MoodMetric::Anxiety => self.anxiety = Some(value),
            MoodMetric::Energy => self.energy = Some(value),
            MoodMetric::Focus => self.focus = Some(value),
            MoodMetric::Motivation => self.motivation = Some(value),
            MoodMetric::Irritability => self.irritability = Some(value),
            MoodMetric::Stress => self.stress = Some(value),
        }
        self
    }

    /// Rating for a metric, `None` when absent or not a finite number
    pub fn value(&self, metric: MoodMetric) -> Option<f64> {
        let value = match metric {
            MoodMetric::Mood => Some(self.mood),
            MoodMetric::Anxiety => self.anxiety,
            MoodMetric::Energy => self.energy,
            MoodMetric::Focus => self.focus,
            MoodMetric::Motivation => self.motivation,
            MoodMetric::Irritability => self.irritability,
            MoodMetric::Stress => self.stress,
        };
        value.filter(|v| v.is_finite())
    }
}

/// Closed set of mood ratings analysed by the insight engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoodMetric {
    Mood,
    Anxiety,
    Energy,
    Focus,
    Motivation,
    Irritability,
    Stress,
}

impl MoodMetric {
    pub const ALL: [MoodMetric; 7] = [
        MoodMetric::Mood,
        MoodMetric::Anxiety,
        MoodMetric::Energy,
        MoodMetric::Focus,
        MoodMetric::Motivation,
        MoodMetric::Irritability,
        MoodMetric::Stress,
    ];

    /// Whether a higher rating is the desirable direction
    pub fn higher_is_better(&self) -> bool {
        !matches!(
            self,
            MoodMetric::Anxiety | MoodMetric::Irritability | MoodMetric::Stress
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            MoodMetric::Mood => "mood",
            MoodMetric::Anxiety => "anxiety",
            MoodMetric::Energy => "energy",
            MoodMetric::Focus => "focus",
            MoodMetric::Motivation => "motivation",
            MoodMetric::Irritability => "irritability",
            MoodMetric::Stress => "stress",
        }
    }
}

impl fmt::Display for MoodMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_metrics_default_to_absent() {
        let entry = MoodEntry::new(0, 6.0);
        assert_eq!(entry.value(MoodMetric::Mood), Some(6.0));
        assert_eq!(entry.value(MoodMetric::Anxiety), None);
    }

    #[test]
    fn non_finite_ratings_read_as_absent() {
        let entry = MoodEntry::new(0, f64::NAN).with(MoodMetric::Focus, 4.0);
        assert_eq!(entry.value(MoodMetric::Mood), None);
        assert_eq!(entry.value(MoodMetric::Focus), Some(4.0));
    }

    #[test]
    fn polarity_marks_distress_metrics() {
        assert!(MoodMetric::Mood.higher_is_better());
        assert!(!MoodMetric::Anxiety.higher_is_better());
        assert!(!MoodMetric::Stress.higher_is_better());
    }

    #[test]
    fn missing_optional_fields_deserialize() {
        let entry: MoodEntry =
            serde_json::from_str(r#"{ "timestamp": 1000, "mood": 7.0, "energy": 5.0 }"#).unwrap();
        assert_eq!(entry.value(MoodMetric::Energy), Some(5.0));
        assert_eq!(entry.value(MoodMetric::Stress), None);
    }
}
