//! Recorded test results and the store abstraction the ranking core reads from.
//!
//! The core never owns persistence. It talks to a [`MeasurementStore`], which
//! a deployment backs with whatever database it has. [`InMemoryMeasurementStore`]
//! is the default used by the server, the CLI and the tests.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};

use crate::error::{RankError, StoreError};
use crate::modality::{Modality, UserId};

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// Stimulus parameters a test run was performed with.
///
/// Visual runs fill the colour fields, auditory runs fill `frequency`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Stimulus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lightness: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chroma: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hue: Option<f64>,
    /// Tone frequency in Hz.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<f64>,
}

impl Stimulus {
    /// True when no parameter is set.
    pub fn is_empty(&self) -> bool {
        self.lightness.is_none()
            && self.chroma.is_none()
            && self.hue.is_none()
            && self.frequency.is_none()
    }
}

/// One completed test run. Immutable once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub user: UserId,
    pub modality: Modality,
    /// Unix time in milliseconds.
    pub recorded_at: u64,
    /// Scalar summary of the run (mean reaction time in ms).
    pub value: f64,
    /// Individual trial reaction times.
    #[serde(default)]
    pub samples: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stimulus: Option<Stimulus>,
}

impl Measurement {
    pub fn new(user: UserId, modality: Modality, recorded_at: u64, value: f64) -> Self {
        Self {
            user,
            modality,
            recorded_at,
            value,
            samples: Vec::new(),
            stimulus: None,
        }
    }

    /// Build a measurement whose value is the mean of `samples`.
    pub fn from_samples(
        user: UserId,
        modality: Modality,
        recorded_at: u64,
        samples: Vec<f64>,
    ) -> Result<Self, RankError> {
        if samples.is_empty() {
            return Err(RankError::InvalidInput(
                "either a value or at least one sample is required".to_string(),
            ));
        }
        if samples.iter().any(|s| !s.is_finite()) {
            return Err(RankError::InvalidInput(
                "samples must be finite numbers".to_string(),
            ));
        }
        let value = samples.iter().sum::<f64>() / samples.len() as f64;
        Ok(Self {
            samples,
            ..Self::new(user, modality, recorded_at, value)
        })
    }

    pub fn with_samples(mut self, samples: Vec<f64>) -> Self {
        self.samples = samples;
        self
    }

    pub fn with_stimulus(mut self, stimulus: Stimulus) -> Self {
        self.stimulus = Some(stimulus);
        self
    }
}

/// Demographic profile captured at registration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub nickname: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sex: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

// ---------------------------------------------------------------------------
// Store trait
// ---------------------------------------------------------------------------

/// Backing store for measurements and user profiles.
///
/// Append-only from the core's point of view. Reads need not be isolated from
/// concurrent inserts.
pub trait MeasurementStore: Send + Sync {
    /// Append a measurement.
    fn insert(&self, measurement: Measurement) -> Result<(), StoreError>;

    /// Latest value per user for `modality`, one row per user.
    fn latest_per_user(&self, modality: Modality) -> Result<Vec<(UserId, f64)>, StoreError>;

    /// Most recent measurement of `user` for `modality`.
    fn latest_measurement(
        &self,
        user: &UserId,
        modality: Modality,
    ) -> Result<Option<Measurement>, StoreError>;

    /// Value of the most recent measurement of `user` for `modality`.
    fn latest_for_user(&self, user: &UserId, modality: Modality) -> Result<Option<f64>, StoreError> {
        Ok(self.latest_measurement(user, modality)?.map(|m| m.value))
    }

    /// Every recorded value for `modality`, all users, all runs.
    fn all_values(&self, modality: Modality) -> Result<Vec<f64>, StoreError>;

    /// Every recorded value of `user` for `modality`, newest first.
    fn values_for_user(&self, user: &UserId, modality: Modality) -> Result<Vec<f64>, StoreError>;

    /// Register a user profile. Fails with [`StoreError::Conflict`] if the id exists.
    fn register_user(&self, profile: UserProfile) -> Result<(), StoreError>;

    /// Look up a registered profile.
    fn user(&self, id: &UserId) -> Result<Option<UserProfile>, StoreError>;
}

// ---------------------------------------------------------------------------
// In-memory implementation
// ---------------------------------------------------------------------------

/// Thread-safe in-memory [`MeasurementStore`].
#[derive(Default)]
pub struct InMemoryMeasurementStore {
    measurements: RwLock<Vec<Measurement>>,
    users: RwLock<HashMap<UserId, UserProfile>>,
}

impl InMemoryMeasurementStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `measurements`.
    pub fn from_measurements(measurements: Vec<Measurement>) -> Self {
        Self {
            measurements: RwLock::new(measurements),
            users: RwLock::new(HashMap::new()),
        }
    }

    /// Total number of stored measurements across modalities.
    pub fn len(&self) -> Result<usize, StoreError> {
        Ok(self.read()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.read()?.is_empty())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Vec<Measurement>>, StoreError> {
        self.measurements
            .read()
            .map_err(|_| StoreError::Unavailable("measurement lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Vec<Measurement>>, StoreError> {
        self.measurements
            .write()
            .map_err(|_| StoreError::Unavailable("measurement lock poisoned".to_string()))
    }
}

/// Pick the latest measurement per user. Later inserts win timestamp ties.
fn latest_by_user<'a>(
    measurements: impl Iterator<Item = &'a Measurement>,
) -> HashMap<&'a UserId, &'a Measurement> {
    let mut latest: HashMap<&UserId, &Measurement> = HashMap::new();
    for m in measurements {
        let newer = latest
            .get(&m.user)
            .is_none_or(|current| m.recorded_at >= current.recorded_at);
        if newer {
            latest.insert(&m.user, m);
        }
    }
    latest
}

impl MeasurementStore for InMemoryMeasurementStore {
    fn insert(&self, measurement: Measurement) -> Result<(), StoreError> {
        self.write()?.push(measurement);
        Ok(())
    }

    fn latest_per_user(&self, modality: Modality) -> Result<Vec<(UserId, f64)>, StoreError> {
        let measurements = self.read()?;
        let latest = latest_by_user(measurements.iter().filter(|m| m.modality == modality));
        let mut rows: Vec<(UserId, f64)> = latest
            .into_iter()
            .map(|(user, m)| (user.clone(), m.value))
            .collect();
        rows.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(rows)
    }

    fn latest_measurement(
        &self,
        user: &UserId,
        modality: Modality,
    ) -> Result<Option<Measurement>, StoreError> {
        let measurements = self.read()?;
        let latest = latest_by_user(
            measurements
                .iter()
                .filter(|m| m.modality == modality && &m.user == user),
        );
        Ok(latest.get(user).map(|m| (*m).clone()))
    }

    fn all_values(&self, modality: Modality) -> Result<Vec<f64>, StoreError> {
        Ok(self
            .read()?
            .iter()
            .filter(|m| m.modality == modality)
            .map(|m| m.value)
            .collect())
    }

    fn values_for_user(&self, user: &UserId, modality: Modality) -> Result<Vec<f64>, StoreError> {
        let measurements = self.read()?;
        let mut runs: Vec<&Measurement> = measurements
            .iter()
            .filter(|m| m.modality == modality && &m.user == user)
            .collect();
        runs.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at));
        Ok(runs.into_iter().map(|m| m.value).collect())
    }

    fn register_user(&self, profile: UserProfile) -> Result<(), StoreError> {
        let mut users = self
            .users
            .write()
            .map_err(|_| StoreError::Unavailable("user lock poisoned".to_string()))?;
        if users.contains_key(&profile.id) {
            return Err(StoreError::Conflict(format!(
                "user {} is already registered",
                profile.id
            )));
        }
        users.insert(profile.id.clone(), profile);
        Ok(())
    }

    fn user(&self, id: &UserId) -> Result<Option<UserProfile>, StoreError> {
        let users = self
            .users
            .read()
            .map_err(|_| StoreError::Unavailable("user lock poisoned".to_string()))?;
        Ok(users.get(id).cloned())
    }
}
