//! Request-level orchestration over the store, cache and calculator.

use std::sync::Arc;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::cache::{Clock, InMemorySummaryStore, StatsCache, SystemClock};
use crate::config::RankingConfig;
use crate::error::RankError;
use crate::measurement::{Measurement, MeasurementStore, Stimulus, UserProfile};
use crate::modality::{Modality, UserId};
use crate::rank::{RankResult, rank};
use crate::statistics::{StatisticsReport, statistics_report};

/// Rank of one user across every modality.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankReport {
    pub visual: RankResult,
    pub auditory: RankResult,
    /// Oldest `stats_updated_at` of the per-modality results.
    pub stats_updated_at: u64,
}

/// Latest run of one user for every modality.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatestResults {
    pub visual: Measurement,
    pub auditory: Measurement,
}

/// A test result as submitted by a client, before timestamping.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestSubmission {
    /// Scalar result. When absent, the mean of `samples` is used.
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub samples: Vec<f64>,
    #[serde(default)]
    pub stimulus: Option<Stimulus>,
}

pub struct RankService {
    store: Arc<dyn MeasurementStore>,
    cache: StatsCache,
    clock: Arc<dyn Clock>,
    exclude_percent: f64,
}

impl RankService {
    pub fn new(
        store: Arc<dyn MeasurementStore>,
        cache: StatsCache,
        clock: Arc<dyn Clock>,
        exclude_percent: f64,
    ) -> Self {
        Self {
            store,
            cache,
            clock,
            exclude_percent,
        }
    }

    /// Service over `store` with an in-memory summary cache and the system clock.
    pub fn from_config(store: Arc<dyn MeasurementStore>, config: &RankingConfig) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let cache = StatsCache::new(
            Arc::clone(&store),
            Arc::new(InMemorySummaryStore::new()),
            Arc::clone(&clock),
            config.stats_ttl(),
        );
        Self::new(store, cache, clock, config.exclude_percent)
    }

    pub fn cache(&self) -> &StatsCache {
        &self.cache
    }

    pub fn store(&self) -> &Arc<dyn MeasurementStore> {
        &self.store
    }

    /// Percentile rank of `user` for every modality.
    ///
    /// Fails with [`RankError::NotFound`] before touching the cache if the user
    /// lacks a result for any modality.
    pub fn rank(&self, user: &UserId) -> Result<RankReport, RankError> {
        let visual_value = self.latest_value(user, Modality::Visual)?;
        let auditory_value = self.latest_value(user, Modality::Auditory)?;

        let visual_summary = self.cache.summary(Modality::Visual)?;
        let auditory_summary = self.cache.summary(Modality::Auditory)?;
        let visual = rank(visual_value, &visual_summary);
        let auditory = rank(auditory_value, &auditory_summary);
        debug!(
            "ranked {user}: visual p{} auditory p{}",
            visual.percentile, auditory.percentile
        );

        let stats_updated_at = visual.stats_updated_at.min(auditory.stats_updated_at);
        Ok(RankReport {
            visual,
            auditory,
            stats_updated_at,
        })
    }

    /// Record a test result for `user`, timestamped now.
    pub fn record(
        &self,
        user: UserId,
        modality: Modality,
        submission: TestSubmission,
    ) -> Result<Measurement, RankError> {
        let recorded_at = self.clock.now_millis();
        let TestSubmission {
            value,
            samples,
            stimulus,
        } = submission;

        let mut measurement = match value {
            Some(v) if !v.is_finite() => {
                return Err(RankError::InvalidInput("value must be a finite number".to_string()));
            }
            Some(v) => {
                if samples.iter().any(|s| !s.is_finite()) {
                    return Err(RankError::InvalidInput(
                        "samples must be finite numbers".to_string(),
                    ));
                }
                Measurement::new(user, modality, recorded_at, v).with_samples(samples)
            }
            None => Measurement::from_samples(user, modality, recorded_at, samples)?,
        };
        if let Some(stimulus) = stimulus.filter(|s| !s.is_empty()) {
            measurement = measurement.with_stimulus(stimulus);
        }

        self.store.insert(measurement.clone())?;
        debug!(
            "recorded {modality} result {:.1} for {}",
            measurement.value, measurement.user
        );
        Ok(measurement)
    }

    /// Register a user profile.
    pub fn register(&self, profile: UserProfile) -> Result<(), RankError> {
        self.store.register_user(profile)?;
        Ok(())
    }

    /// Latest run, including raw samples, for every modality.
    pub fn latest_results(&self, user: &UserId) -> Result<LatestResults, RankError> {
        Ok(LatestResults {
            visual: self.latest_measurement(user, Modality::Visual)?,
            auditory: self.latest_measurement(user, Modality::Auditory)?,
        })
    }

    /// Trimmed statistics, global or for one user.
    pub fn statistics(&self, user: Option<&UserId>) -> Result<StatisticsReport, RankError> {
        statistics_report(self.store.as_ref(), user, self.exclude_percent)
    }

    fn latest_value(&self, user: &UserId, modality: Modality) -> Result<f64, RankError> {
        self.store
            .latest_for_user(user, modality)?
            .ok_or_else(|| RankError::NotFound {
                user: user.clone(),
                modality,
            })
    }

    fn latest_measurement(&self, user: &UserId, modality: Modality) -> Result<Measurement, RankError> {
        self.store
            .latest_measurement(user, modality)?
            .ok_or_else(|| RankError::NotFound {
                user: user.clone(),
                modality,
            })
    }
}
