//! Engine configuration
//!
//! All tunable constants of the engine live here so they can be reviewed and
//! overridden without touching the algorithms. Every group implements
//! [`Default`] with the values the engine ships with, and every field is
//! optional when loading from JSON.
//!
//! ```rust,ignore
//! use pharmtrack::config::EngineConfig;
//!
//! let config = EngineConfig::from_json_str(r#"{ "curve": { "noise_floor": 0.0005 } }"#)?;
//! assert_eq!(config.curve.default_points, 100);
//! ```

use crate::error::PharmtrackError;
use serde::{Deserialize, Serialize};
use std::path::Path;

// ============================================================================
// Top-level configuration
// ============================================================================

/// Complete engine configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Curve sampling options
    pub curve: CurveOptions,
    /// Concentration cache options
    pub cache: CacheOptions,
    /// Correlation and insight options
    pub insights: InsightOptions,
}

impl EngineConfig {
    /// Parse a configuration from a JSON string. Missing fields use defaults.
    pub fn from_json_str(json: &str) -> Result<Self, PharmtrackError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a JSON configuration file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, PharmtrackError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn with_curve(mut self, curve: CurveOptions) -> Self {
        self.curve = curve;
        self
    }

    pub fn with_cache(mut self, cache: CacheOptions) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_insights(mut self, insights: InsightOptions) -> Self {
        self.insights = insights;
        self
    }
}

// ============================================================================
// Curve options
// ============================================================================

/// Options for sampling concentration curves
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurveOptions {
    /// Concentrations below this value are reported as absent (default: 0.001)
    ///
    /// Pending clinical review; kept configurable.
    pub noise_floor: f64,
    /// Number of samples when a request does not specify one (default: 100)
    pub default_points: usize,
    /// Body weight in kg when a request does not specify one (default: 70.0)
    pub default_body_weight_kg: f64,
}

impl Default for CurveOptions {
    fn default() -> Self {
        Self {
            noise_floor: 0.001,
            default_points: 100,
            default_body_weight_kg: 70.0,
        }
    }
}

impl CurveOptions {
    pub fn with_noise_floor(mut self, noise_floor: f64) -> Self {
        self.noise_floor = noise_floor;
        self
    }

    pub fn with_default_points(mut self, points: usize) -> Self {
        self.default_points = points;
        self
    }

    pub fn with_default_body_weight(mut self, body_weight_kg: f64) -> Self {
        self.default_body_weight_kg = body_weight_kg;
        self
    }
}

// ============================================================================
// Cache options
// ============================================================================

/// Options for the in-memory concentration cache
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheOptions {
    /// Maximum number of entries kept per map before LRU eviction (default: 1024)
    pub capacity: usize,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self { capacity: 1024 }
    }
}

impl CacheOptions {
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }
}

// ============================================================================
// Insight options
// ============================================================================

/// How medication exposure is represented when correlating against mood
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExposureKind {
    /// Modelled plasma concentration at the mood entry time
    #[default]
    Concentration,
    /// 1.0 if a dose was taken within the presence window, else 0.0
    DosePresence,
}

/// Options for the correlation and insight engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InsightOptions {
    /// Minimum paired samples before a correlation is reported (default: 3)
    ///
    /// Pending clinical review; kept configurable.
    pub min_sample_size: usize,
    /// Minimum |r| for a correlation to rank as an impact (default: 0.3)
    pub min_correlation: f64,
    /// Minimum adverse |r| to raise a red flag (default: 0.5)
    pub red_flag_threshold: f64,
    /// Candidate lags in hours searched for the strongest correlation
    pub lag_hours: Vec<f64>,
    /// Maximum entries in each ranked impact list (default: 5)
    pub top_n: usize,
    /// Exposure representation (default: concentration)
    pub exposure: ExposureKind,
    /// Look-back window for [`ExposureKind::DosePresence`] in hours (default: 24)
    pub dose_presence_window_hours: f64,
    /// Body weight used for concentration exposure in kg (default: 70.0)
    pub body_weight_kg: f64,
}

impl Default for InsightOptions {
    fn default() -> Self {
        Self {
            min_sample_size: 3,
            min_correlation: 0.3,
            red_flag_threshold: 0.5,
            lag_hours: vec![0.0, 2.0, 4.0, 8.0, 12.0, 24.0],
            top_n: 5,
            exposure: ExposureKind::Concentration,
            dose_presence_window_hours: 24.0,
            body_weight_kg: 70.0,
        }
    }
}

impl InsightOptions {
    pub fn with_min_sample_size(mut self, n: usize) -> Self {
        self.min_sample_size = n;
        self
    }

    pub fn with_min_correlation(mut self, r: f64) -> Self {
        self.min_correlation = r;
        self
    }

    pub fn with_red_flag_threshold(mut self, r: f64) -> Self {
        self.red_flag_threshold = r;
        self
    }

    /// Set the candidate lags. An empty list means "no lag search" (lag 0 only).
    pub fn with_lag_hours(mut self, lags: Vec<f64>) -> Self {
        self.lag_hours = lags;
        self
    }

    pub fn with_top_n(mut self, n: usize) -> Self {
        self.top_n = n;
        self
    }

    pub fn with_exposure(mut self, exposure: ExposureKind) -> Self {
        self.exposure = exposure;
        self
    }

    pub fn with_body_weight(mut self, body_weight_kg: f64) -> Self {
        self.body_weight_kg = body_weight_kg;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_hold_documented_constants() {
        let config = EngineConfig::default();
        assert_eq!(config.curve.noise_floor, 0.001);
        assert_eq!(config.curve.default_points, 100);
        assert_eq!(config.curve.default_body_weight_kg, 70.0);
        assert_eq!(config.insights.min_sample_size, 3);
        assert_eq!(config.insights.exposure, ExposureKind::Concentration);
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config = EngineConfig::from_json_str(
            r#"{ "curve": { "noise_floor": 0.01 }, "insights": { "exposure": "dose_presence" } }"#,
        )
        .unwrap();
        assert_eq!(config.curve.noise_floor, 0.01);
        assert_eq!(config.curve.default_points, 100);
        assert_eq!(config.cache.capacity, 1024);
        assert_eq!(config.insights.exposure, ExposureKind::DosePresence);
        assert_eq!(config.insights.lag_hours.len(), 6);
    }

    #[test]
    fn malformed_json_is_a_config_error() {
        let err = EngineConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, PharmtrackError::Config(_)));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = EngineConfig::from_path("/nonexistent/pharmtrack.json").unwrap_err();
        assert!(matches!(err, PharmtrackError::Io(_)));
    }
}
