//! Sleep session metrics, scoring and multi-night trends

pub mod metrics;
pub mod score;
pub mod trends;

pub use metrics::{analyze_sleep_session, SleepMetrics, StageBreakdown};
pub use score::{sleep_score, SleepQuality, SleepScore};
pub use trends::{
    analyze_sleep_trends, Priority, Recommendation, RecommendationCategory, SessionSummary,
    SleepAnalytics, SleepAverages, SleepTrend, TrendDirection,
};
