//! Multi-session sleep trends and recommendations

use crate::data::SleepSession;
use crate::sleep::metrics::{analyze_sleep_session, SleepMetrics};
use crate::stats::{linear_regression, mean};
use serde::{Deserialize, Serialize};

const MS_PER_DAY: i64 = 86_400_000;
const WEEK_DAYS: i64 = 7;
const MONTH_DAYS: i64 = 30;
const TREND_DAYS: i64 = 14;
const MIN_TREND_SESSIONS: usize = 3;
/// Score points per day beyond which a trend is not flat
const TREND_SLOPE_THRESHOLD: f64 = 0.5;

/// Metrics of one analysed session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: String,
    /// Earliest record timestamp (epoch ms)
    pub start_time: i64,
    pub metrics: SleepMetrics,
}

/// Averages over a set of sessions
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SleepAverages {
    pub sessions: usize,
    pub score: f64,
    pub efficiency: f64,
    pub total_sleep_hours: f64,
    pub deep_percentage: f64,
    pub rem_percentage: f64,
    pub awakenings: f64,
}

impl SleepAverages {
    fn of(summaries: &[&SessionSummary]) -> Option<Self> {
        let avg = |f: fn(&SleepMetrics) -> f64| {
            let values: Vec<f64> = summaries.iter().map(|s| f(&s.metrics)).collect();
            mean(&values)
        };
        Some(SleepAverages {
            sessions: summaries.len(),
            score: avg(|m| m.score.total)?,
            efficiency: avg(|m| m.efficiency)?,
            total_sleep_hours: avg(|m| m.total_sleep_hours())?,
            deep_percentage: avg(|m| m.deep.percentage)?,
            rem_percentage: avg(|m| m.rem.percentage)?,
            awakenings: avg(|m| m.awakenings as f64)?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Improving,
    Stable,
    Declining,
    InsufficientData,
}

/// Direction of the sleep score over the recent sessions
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SleepTrend {
    pub direction: TrendDirection,
    /// Score points per day, when a line could be fitted
    pub slope_per_day: Option<f64>,
    /// Sessions in the trend window
    pub sessions: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationCategory {
    Efficiency,
    DeepSleep,
    RemSleep,
    Duration,
    Continuity,
    Trend,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub category: RecommendationCategory,
    pub priority: Priority,
    pub message: String,
}

/// Sleep analysis across sessions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SleepAnalytics {
    /// Non-empty sessions, oldest first
    pub sessions: Vec<SessionSummary>,
    /// Sessions starting within 7 days of the latest one
    pub weekly: Option<SleepAverages>,
    /// Sessions starting within 30 days of the latest one
    pub monthly: Option<SleepAverages>,
    pub trend: SleepTrend,
    /// Highest priority first
    pub recommendations: Vec<Recommendation>,
}

fn within_days(summaries: &[SessionSummary], latest: i64, days: i64) -> Vec<&SessionSummary> {
    let cutoff = latest.saturating_sub(days.saturating_mul(MS_PER_DAY));
    summaries.iter().filter(|s| s.start_time > cutoff).collect()
}

fn trend(recent: &[&SessionSummary]) -> SleepTrend {
    let sessions = recent.len();
    let insufficient = SleepTrend {
        direction: TrendDirection::InsufficientData,
        slope_per_day: None,
        sessions,
    };
    let Some(first) = recent.first() else {
        return insufficient;
    };
    if sessions < MIN_TREND_SESSIONS {
        return insufficient;
    }

    let days: Vec<f64> = recent
        .iter()
        .map(|s| (s.start_time - first.start_time) as f64 / MS_PER_DAY as f64)
        .collect();
    let scores: Vec<f64> = recent.iter().map(|s| s.metrics.score.total).collect();
    let Some(fit) = linear_regression(&days, &scores) else {
        return insufficient;
    };

    let direction = if fit.slope > TREND_SLOPE_THRESHOLD {
        TrendDirection::Improving
    } else if fit.slope < -TREND_SLOPE_THRESHOLD {
        TrendDirection::Declining
    } else {
        TrendDirection::Stable
    };
    SleepTrend {
        direction,
        slope_per_day: Some(fit.slope),
        sessions,
    }
}

fn recommendations(weekly: Option<&SleepAverages>, trend: &SleepTrend) -> Vec<Recommendation> {
    let mut out = Vec::new();
    let mut push = |category, priority, message: String| {
        out.push(Recommendation {
            category,
            priority,
            message,
        })
    };

    if let Some(avg) = weekly {
        if avg.efficiency < 85.0 {
            let priority = if avg.efficiency < 75.0 {
                Priority::High
            } else {
                Priority::Medium
            };
            push(
                RecommendationCategory::Efficiency,
                priority,
                format!(
                    "Sleep efficiency averaged {:.0}%; keep a consistent bedtime and limit time awake in bed",
                    avg.efficiency
                ),
            );
        }
        if avg.deep_percentage < 13.0 {
            push(
                RecommendationCategory::DeepSleep,
                Priority::Medium,
                format!(
                    "Deep sleep averaged {:.0}% of the night; avoid late caffeine and alcohol",
                    avg.deep_percentage
                ),
            );
        }
        if avg.rem_percentage < 20.0 {
            push(
                RecommendationCategory::RemSleep,
                Priority::Medium,
                format!(
                    "REM sleep averaged {:.0}% of the night; a regular wake time helps REM recovery",
                    avg.rem_percentage
                ),
            );
        }
        if avg.total_sleep_hours < 7.0 {
            let priority = if avg.total_sleep_hours < 6.0 {
                Priority::High
            } else {
                Priority::Medium
            };
            push(
                RecommendationCategory::Duration,
                priority,
                format!(
                    "Averaging {:.1} h of sleep; aim for 7 to 9 hours",
                    avg.total_sleep_hours
                ),
            );
        }
        if avg.awakenings > 3.0 {
            push(
                RecommendationCategory::Continuity,
                Priority::Medium,
                format!(
                    "Averaging {:.1} awakenings per night; check the bedroom for noise, light and temperature",
                    avg.awakenings
                ),
            );
        }
    }

    if trend.direction == TrendDirection::Declining {
        push(
            RecommendationCategory::Trend,
            Priority::High,
            format!(
                "Sleep score has been declining by {:.1} points per day over the last two weeks",
                trend.slope_per_day.unwrap_or(0.0).abs()
            ),
        );
    }

    out.sort_by(|a, b| b.priority.cmp(&a.priority));
    out
}

/// Analyze a set of sessions: per-session metrics, averages, trend and advice
///
/// Averages and the trend window are anchored at the latest session. Sessions
/// without records are ignored.
pub fn analyze_sleep_trends(sessions: &[SleepSession]) -> SleepAnalytics {
    let mut summaries: Vec<SessionSummary> = sessions
        .iter()
        .filter_map(|session| {
            let start_time = session.start_time()?;
            Some(SessionSummary {
                session_id: session.id.clone(),
                start_time,
                metrics: analyze_sleep_session(&session.records),
            })
        })
        .collect();
    summaries.sort_by_key(|s| s.start_time);

    let Some(latest) = summaries.last().map(|s| s.start_time) else {
        return SleepAnalytics {
            sessions: Vec::new(),
            weekly: None,
            monthly: None,
            trend: trend(&[]),
            recommendations: Vec::new(),
        };
    };

    let weekly = SleepAverages::of(&within_days(&summaries, latest, WEEK_DAYS));
    let monthly = SleepAverages::of(&within_days(&summaries, latest, MONTH_DAYS));
    let trend = trend(&within_days(&summaries, latest, TREND_DAYS));
    tracing::debug!(
        sessions = summaries.len(),
        direction = ?trend.direction,
        "Analyzed sleep trends"
    );
    let recommendations = recommendations(weekly.as_ref(), &trend);

    SleepAnalytics {
        sessions: summaries,
        weekly,
        monthly,
        trend,
        recommendations,
    }
}
