//! In-memory memoization of concentration curves and point concentrations
//!
//! Entries are keyed by a fingerprint of everything the result depends on:
//! the medication id and PK parameters, every dose as `id:timestamp:amount`
//! in canonical order, the window, the resolution and the body weight. Any
//! mutation of a dose or medication therefore produces a new key, and the
//! explicit [`ConcentrationCache::invalidate_cache`] hook drops the entries
//! orphaned by that churn.
//!
//! Both maps are bounded `moka` caches with a least-recently-used policy.
//! Concurrent callers for the same missing key are coalesced into one
//! computation. A computation that fails (cancellation) is not stored, so the
//! next caller recomputes.
//!
//! The cache is an explicit object: construct one per process (or per test)
//! and pass it by reference.

use crate::config::{CacheOptions, CurveOptions, EngineConfig};
use crate::data::{Medication, MedicationDose};
use crate::error::PharmtrackError;
use crate::pk::cancel::CancellationToken;
use crate::pk::curve::{sample, ConcentrationPoint, CurveRequest, ResolvedRequest};
use crate::pk::model::{relevant_doses, superpose, validate_body_weight};
use moka::notification::RemovalCause;
use moka::policy::EvictionPolicy;
use moka::sync::Cache;
use serde::Serialize;
use std::fmt::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Shared handle to a cached curve
pub type SharedCurve = Arc<Vec<ConcentrationPoint>>;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct CacheKey {
    medication_id: String,
    fingerprint: String,
}

/// Counters describing cache behaviour since construction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Lookups served by an existing entry, including waiters on an in-flight computation
    pub hits: u64,
    /// Lookups that stored a new entry
    pub misses: u64,
    /// Computations actually executed, cancelled ones included
    pub computations: u64,
    /// Entries dropped to stay within capacity
    pub evictions: u64,
    /// Entries dropped by explicit invalidation
    pub invalidations: u64,
}

#[derive(Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    computations: AtomicU64,
    evictions: AtomicU64,
    invalidations: AtomicU64,
}

/// Memory-bounded cache of concentration results
pub struct ConcentrationCache {
    curve_options: CurveOptions,
    curves: Cache<CacheKey, SharedCurve>,
    points: Cache<CacheKey, f64>,
    counters: Arc<Counters>,
}

impl Default for ConcentrationCache {
    fn default() -> Self {
        Self::new(CurveOptions::default(), CacheOptions::default())
    }
}

fn bounded<V>(capacity: usize, counters: &Arc<Counters>) -> Cache<CacheKey, V>
where
    V: Clone + Send + Sync + 'static,
{
    let counters = Arc::clone(counters);
    Cache::builder()
        .max_capacity(capacity as u64)
        .eviction_policy(EvictionPolicy::lru())
        .eviction_listener(move |key: Arc<CacheKey>, _value: V, cause: RemovalCause| {
            if matches!(cause, RemovalCause::Size) {
                counters.evictions.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(
                    medication_id = key.medication_id.as_str(),
                    "Evicted least recently used concentration entry"
                );
            }
        })
        .build()
}

impl ConcentrationCache {
    pub fn new(curve_options: CurveOptions, cache_options: CacheOptions) -> Self {
        let counters = Arc::new(Counters::default());
        ConcentrationCache {
            curve_options,
            curves: bounded(cache_options.capacity, &counters),
            points: bounded(cache_options.capacity, &counters),
            counters,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.curve.clone(), config.cache.clone())
    }

    /// Curve options used for every computation of this cache
    pub fn curve_options(&self) -> &CurveOptions {
        &self.curve_options
    }

    /// Apply pending recency updates and capacity evictions now
    ///
    /// Bookkeeping otherwise runs in batches during later lookups.
    pub fn run_pending_tasks(&self) {
        self.curves.run_pending_tasks();
        self.points.run_pending_tasks();
    }

    /// Number of cached curves and point concentrations
    pub fn len(&self) -> usize {
        self.run_pending_tasks();
        (self.curves.entry_count() + self.points.entry_count()) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        self.run_pending_tasks();
        CacheStats {
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            computations: self.counters.computations.load(Ordering::Relaxed),
            evictions: self.counters.evictions.load(Ordering::Relaxed),
            invalidations: self.counters.invalidations.load(Ordering::Relaxed),
        }
    }

    /// Cached equivalent of [`build_curve`](crate::pk::curve::build_curve)
    ///
    /// Repeated calls with identical inputs return the same shared curve and
    /// compute it once.
    pub fn get_cached_curve(
        &self,
        medication: &Medication,
        doses: &[MedicationDose],
        request: &CurveRequest,
    ) -> Result<SharedCurve, PharmtrackError> {
        self.cached_curve(medication, doses, request, None)
    }

    /// [`get_cached_curve`](Self::get_cached_curve) honouring a cancellation token
    ///
    /// The token is checked before the lookup, between samples of a
    /// computation this call owns, and once the result is available. A
    /// cancelled computation is not stored. Callers waiting on a computation
    /// cancelled by another caller's token retry with their own.
    pub fn get_cached_curve_cancellable(
        &self,
        medication: &Medication,
        doses: &[MedicationDose],
        request: &CurveRequest,
        token: &CancellationToken,
    ) -> Result<SharedCurve, PharmtrackError> {
        self.cached_curve(medication, doses, request, Some(token))
    }

    fn cached_curve(
        &self,
        medication: &Medication,
        doses: &[MedicationDose],
        request: &CurveRequest,
        token: Option<&CancellationToken>,
    ) -> Result<SharedCurve, PharmtrackError> {
        medication.pk.validate()?;
        let resolved = request.resolve(&self.curve_options)?;
        let sorted = relevant_doses(medication, doses);
        let key = CacheKey {
            medication_id: medication.id.clone(),
            fingerprint: curve_fingerprint(medication, &sorted, &resolved),
        };
        let noise_floor = self.curve_options.noise_floor;
        self.lookup(&self.curves, key, token, || {
            sample(&medication.pk, &sorted, &resolved, noise_floor, token).map(Arc::new)
        })
    }

    /// Cached equivalent of [`compute_concentration`](crate::pk::model::compute_concentration)
    pub fn get_cached_concentration(
        &self,
        medication: &Medication,
        doses: &[MedicationDose],
        time: f64,
        body_weight: Option<f64>,
    ) -> Result<f64, PharmtrackError> {
        self.history(medication, doses, body_weight)?.lookup(time, None)
    }

    /// [`get_cached_concentration`](Self::get_cached_concentration) honouring a cancellation token
    pub fn get_cached_concentration_cancellable(
        &self,
        medication: &Medication,
        doses: &[MedicationDose],
        time: f64,
        body_weight: Option<f64>,
        token: &CancellationToken,
    ) -> Result<f64, PharmtrackError> {
        if token.is_cancelled() {
            return Err(PharmtrackError::Cancelled);
        }
        self.history(medication, doses, body_weight)?.lookup(time, Some(token))
    }

    /// Validate and fingerprint a dose history once for repeated point lookups
    pub(crate) fn history<'a>(
        &'a self,
        medication: &'a Medication,
        doses: &'a [MedicationDose],
        body_weight: Option<f64>,
    ) -> Result<CachedHistory<'a>, PharmtrackError> {
        medication.pk.validate()?;
        let body_weight = validate_body_weight(
            body_weight.unwrap_or(self.curve_options.default_body_weight_kg),
        )?;
        let sorted = relevant_doses(medication, doses);
        let mut prefix = String::with_capacity(64 + sorted.len() * 32);
        medication_fingerprint(&mut prefix, medication, &sorted);
        Ok(CachedHistory {
            cache: self,
            medication,
            sorted,
            prefix,
            body_weight,
        })
    }

    /// Drop every entry, or only the entries of one medication
    ///
    /// Returns the number of entries removed. Computations already running
    /// finish for their current waiters and are stored afterwards under
    /// their own key.
    pub fn invalidate_cache(&self, medication_id: Option<&str>) -> usize {
        let matches = |key: &CacheKey| medication_id.map_or(true, |id| key.medication_id == id);
        let removed =
            remove_matching(&self.curves, &matches) + remove_matching(&self.points, &matches);
        self.run_pending_tasks();
        self.counters
            .invalidations
            .fetch_add(removed as u64, Ordering::Relaxed);
        tracing::debug!(medication_id, removed, "Invalidated concentration cache");
        removed
    }

    /// Single-flight lookup of `key`, computing it on a miss
    ///
    /// A computation cancelled by another caller's token is retried as long
    /// as this caller's own token is live.
    fn lookup<V>(
        &self,
        map: &Cache<CacheKey, V>,
        key: CacheKey,
        token: Option<&CancellationToken>,
        compute: impl Fn() -> Result<V, PharmtrackError>,
    ) -> Result<V, PharmtrackError>
    where
        V: Clone + Send + Sync + 'static,
    {
        let cancelled = || token.is_some_and(|t| t.is_cancelled());
        loop {
            if cancelled() {
                return Err(PharmtrackError::Cancelled);
            }
            let result = map.entry(key.clone()).or_try_insert_with(|| {
                self.counters.computations.fetch_add(1, Ordering::Relaxed);
                compute()
            });
            match result {
                Ok(entry) => {
                    let counter = if entry.is_fresh() {
                        &self.counters.misses
                    } else {
                        &self.counters.hits
                    };
                    counter.fetch_add(1, Ordering::Relaxed);
                    tracing::debug!(
                        medication_id = key.medication_id.as_str(),
                        fresh = entry.is_fresh(),
                        "Concentration cache lookup"
                    );
                    if cancelled() {
                        return Err(PharmtrackError::Cancelled);
                    }
                    return Ok(entry.into_value());
                }
                // Inputs are validated before the lookup, so a computation
                // can only fail by cancellation
                Err(_) if cancelled() => return Err(PharmtrackError::Cancelled),
                Err(_) => tracing::debug!(
                    medication_id = key.medication_id.as_str(),
                    "Shared computation was cancelled, retrying"
                ),
            }
        }
    }
}

fn remove_matching<V>(map: &Cache<CacheKey, V>, matches: impl Fn(&CacheKey) -> bool) -> usize
where
    V: Clone + Send + Sync + 'static,
{
    let keys: Vec<Arc<CacheKey>> = map
        .iter()
        .filter(|entry| matches(&entry.0))
        .map(|(key, _)| key)
        .collect();
    let mut removed = 0;
    for key in keys {
        if map.remove(&*key).is_some() {
            removed += 1;
        }
    }
    removed
}

/// A validated dose history bound to a cache for repeated point lookups
pub(crate) struct CachedHistory<'a> {
    cache: &'a ConcentrationCache,
    medication: &'a Medication,
    sorted: Vec<&'a MedicationDose>,
    prefix: String,
    body_weight: f64,
}

impl CachedHistory<'_> {
    /// Concentration at `time`, served from the point cache
    ///
    /// Returns exactly what [`superpose`] computes for the same history.
    pub(crate) fn concentration(&self, time: f64) -> f64 {
        self.lookup(time, None)
            .unwrap_or_else(|_| superpose(&self.medication.pk, &self.sorted, time, self.body_weight))
    }

    fn lookup(&self, time: f64, token: Option<&CancellationToken>) -> Result<f64, PharmtrackError> {
        let mut fingerprint = String::with_capacity(self.prefix.len() + 48);
        fingerprint.push_str(&self.prefix);
        point_suffix(&mut fingerprint, time, self.body_weight);
        let key = CacheKey {
            medication_id: self.medication.id.clone(),
            fingerprint,
        };
        self.cache.lookup(&self.cache.points, key, token, || {
            if token.is_some_and(|t| t.is_cancelled()) {
                return Err(PharmtrackError::Cancelled);
            }
            Ok(superpose(&self.medication.pk, &self.sorted, time, self.body_weight))
        })
    }
}

// ============================================================================
// Fingerprints
// ============================================================================

fn medication_fingerprint(out: &mut String, medication: &Medication, sorted: &[&MedicationDose]) {
    let pk = &medication.pk;
    // f64 Display is round-trip exact, so equal strings mean equal inputs
    let _ = write!(
        out,
        "{}|{}:{}:{}:{}|",
        medication.id, pk.half_life, pk.volume_of_distribution, pk.bioavailability, pk.absorption_rate
    );
    for (i, dose) in sorted.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        let _ = write!(out, "{}:{}:{}", dose.id(), dose.timestamp(), dose.amount());
    }
}

fn curve_fingerprint(
    medication: &Medication,
    sorted: &[&MedicationDose],
    request: &ResolvedRequest,
) -> String {
    let mut out = String::with_capacity(64 + sorted.len() * 32);
    medication_fingerprint(&mut out, medication, sorted);
    let _ = write!(
        out,
        "|curve:{}:{}:{}|bw:{}",
        request.start, request.end, request.points, request.body_weight
    );
    out
}

fn point_suffix(out: &mut String, time: f64, body_weight: f64) {
    let _ = write!(out, "|point:{}|bw:{}", time, body_weight);
}
