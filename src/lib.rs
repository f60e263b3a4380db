pub mod config;
pub mod data;
pub mod error;
pub mod insights;
pub mod pk;
pub mod sleep;
pub mod stats;

pub use crate::config::{CacheOptions, CurveOptions, EngineConfig, ExposureKind, InsightOptions};
pub use crate::data::*;
pub use crate::insights::{generate_insights_report, InsightEngine, InsightsReport};
pub use crate::pk::{
    build_concentration_curve, build_curve, compute_concentration, ConcentrationCache,
    ConcentrationPoint, CurveRequest,
};
pub use crate::sleep::{analyze_sleep_session, analyze_sleep_trends, SleepAnalytics, SleepMetrics};
pub use crate::stats::{pearson, CorrelationOutcome};
pub use error::PharmtrackError;

pub mod prelude {
    pub mod data {
        pub use crate::data::{
            Medication, MedicationDose, MoodEntry, MoodMetric, PkParameters, SleepRecord,
            SleepSession, SleepStage, TherapeuticRange, TherapeuticStatus,
        };
    }
    pub mod pk {
        pub use crate::pk::{
            build_concentration_curve, build_curve, compute_concentration, interpolate,
            peak_concentration, summarize, time_to_peak, CancellationToken, ConcentrationCache,
            ConcentrationPoint, CurveRequest, CurveSummary, RequestGeneration, SharedCurve,
        };
    }
    pub mod insights {
        pub use crate::insights::*;
    }
    pub mod sleep {
        pub use crate::sleep::*;
    }

    pub use crate::config::*;
    pub use crate::data::*;
    pub use crate::error::PharmtrackError;
    pub use crate::pk::{compute_concentration, ConcentrationCache, CurveRequest};
}
