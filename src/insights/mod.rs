//! Correlation of medication exposure with mood ratings
//!
//! [`generate_insights_report`] relates each medication's exposure series to
//! each recorded mood metric and ranks the results into positive impacts,
//! negative impacts and red flags. Sparse data is reported, never raised.

mod correlation;
mod engine;
mod exposure;
mod report;

pub use engine::{generate_insights_report, InsightEngine};
pub use report::{
    DataQuality, InsightsReport, MetricCorrelation, RedFlag, Severity, SkippedPair, Strength,
};
