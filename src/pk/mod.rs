//! Pharmacokinetic concentration engine
//!
//! - [`model`]: the one-compartment Bateman model and point concentrations
//! - [`curve`]: sampled curves, interpolation and exposure summaries
//! - [`cache`]: memoization of curves and points keyed by input fingerprints
//! - [`cancel`]: cooperative cancellation of superseded requests

pub mod cache;
pub mod cancel;
pub mod curve;
pub mod model;

pub use cache::{CacheStats, ConcentrationCache, SharedCurve};
pub use cancel::{CancellationToken, RequestGeneration, Ticket};
pub use curve::{
    build_concentration_curve, build_curve, interpolate, summarize, ConcentrationPoint,
    CurveRequest, CurveSummary,
};
pub use model::{
    compute_concentration, peak_concentration, single_dose_concentration, time_to_peak,
    DEFAULT_BODY_WEIGHT_KG, MS_PER_HOUR,
};
