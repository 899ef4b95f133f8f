//! Time-bounded cache of population summaries.
//!
//! [`StatsCache`] keeps at most one [`PercentileSummary`] per modality in a
//! [`SummaryStore`]. Staleness is checked when a summary is read; there is no
//! background refresh. A stale or missing summary is recomputed synchronously
//! from the measurement store's latest-per-user rows.
//!
//! Two requests that observe staleness at the same time both recompute. The
//! recomputation is a pure function of the store contents, so the second
//! write just replaces an equivalent summary.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use log::{debug, info};

use crate::error::{RankError, StoreError};
use crate::measurement::MeasurementStore;
use crate::modality::Modality;
use crate::summary::{PercentileSummary, compute_summary};

/// Default summary lifetime: ten minutes.
pub const DEFAULT_TTL: Duration = Duration::from_secs(10 * 60);

// ---------------------------------------------------------------------------
// Clock
// ---------------------------------------------------------------------------

/// Source of wall-clock time in Unix milliseconds.
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> u64;
}

/// [`Clock`] backed by [`SystemTime`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }
}

// ---------------------------------------------------------------------------
// Backing store
// ---------------------------------------------------------------------------

/// Storage for the single summary slot of each modality.
pub trait SummaryStore: Send + Sync {
    /// Current summary for `modality`, if one has been saved.
    fn load(&self, modality: Modality) -> Result<Option<Arc<PercentileSummary>>, StoreError>;

    /// Replace the summary for `summary.modality`.
    fn save(&self, summary: Arc<PercentileSummary>) -> Result<(), StoreError>;

    /// Drop the summary for `modality`.
    fn clear(&self, modality: Modality) -> Result<(), StoreError>;
}

/// In-memory [`SummaryStore`]. A save swaps the whole `Arc`, so readers see
/// either the old summary or the new one.
#[derive(Default)]
pub struct InMemorySummaryStore {
    slots: RwLock<HashMap<Modality, Arc<PercentileSummary>>>,
}

impl InMemorySummaryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned() -> StoreError {
    StoreError::Unavailable("summary lock poisoned".to_string())
}

impl SummaryStore for InMemorySummaryStore {
    fn load(&self, modality: Modality) -> Result<Option<Arc<PercentileSummary>>, StoreError> {
        let slots = self.slots.read().map_err(|_| poisoned())?;
        Ok(slots.get(&modality).cloned())
    }

    fn save(&self, summary: Arc<PercentileSummary>) -> Result<(), StoreError> {
        let mut slots = self.slots.write().map_err(|_| poisoned())?;
        slots.insert(summary.modality, summary);
        Ok(())
    }

    fn clear(&self, modality: Modality) -> Result<(), StoreError> {
        let mut slots = self.slots.write().map_err(|_| poisoned())?;
        slots.remove(&modality);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Cache
// ---------------------------------------------------------------------------

/// Serves fresh-or-cached summaries, recomputing on expiry.
pub struct StatsCache {
    measurements: Arc<dyn MeasurementStore>,
    summaries: Arc<dyn SummaryStore>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl StatsCache {
    pub fn new(
        measurements: Arc<dyn MeasurementStore>,
        summaries: Arc<dyn SummaryStore>,
        clock: Arc<dyn Clock>,
        ttl: Duration,
    ) -> Self {
        Self {
            measurements,
            summaries,
            clock,
            ttl,
        }
    }

    /// Cache over `measurements` with an in-memory slot store, the system clock
    /// and [`DEFAULT_TTL`].
    pub fn with_defaults(measurements: Arc<dyn MeasurementStore>) -> Self {
        Self::new(
            measurements,
            Arc::new(InMemorySummaryStore::new()),
            Arc::new(SystemClock),
            DEFAULT_TTL,
        )
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Whether `summary` has outlived the TTL at `now`.
    ///
    /// A summary exactly `ttl` old is still fresh.
    pub fn is_stale(&self, summary: &PercentileSummary, now: u64) -> bool {
        let ttl_ms = u64::try_from(self.ttl.as_millis()).unwrap_or(u64::MAX);
        now.saturating_sub(summary.computed_at) > ttl_ms
    }

    /// Summary for `modality`, recomputed first if missing or stale.
    pub fn summary(&self, modality: Modality) -> Result<Arc<PercentileSummary>, RankError> {
        let now = self.clock.now_millis();
        if let Some(cached) = self.summaries.load(modality)? {
            if !self.is_stale(&cached, now) {
                debug!(
                    "{modality} summary cache hit (age {} ms, n={})",
                    now.saturating_sub(cached.computed_at),
                    cached.sample_count
                );
                return Ok(cached);
            }
            debug!("{modality} summary stale (computed at {})", cached.computed_at);
        }
        self.recompute(modality, now)
    }

    /// Currently cached summary for `modality`, without refreshing it.
    pub fn peek(&self, modality: Modality) -> Result<Option<Arc<PercentileSummary>>, RankError> {
        Ok(self.summaries.load(modality)?)
    }

    /// Forget the cached summary so the next read recomputes.
    pub fn invalidate(&self, modality: Modality) -> Result<(), RankError> {
        self.summaries.clear(modality)?;
        Ok(())
    }

    fn recompute(&self, modality: Modality, now: u64) -> Result<Arc<PercentileSummary>, RankError> {
        let latest = self.measurements.latest_per_user(modality)?;
        let values: Vec<f64> = latest.into_iter().map(|(_, value)| value).collect();
        let summary = Arc::new(compute_summary(modality, &values, now));
        self.summaries.save(Arc::clone(&summary))?;
        info!(
            "recomputed {modality} summary from {} users",
            summary.sample_count
        );
        Ok(summary)
    }
}
