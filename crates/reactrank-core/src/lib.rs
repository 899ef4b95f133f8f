//! # reactrank-core
//!
//! Percentile ranking engine for reaction-time tests.
//!
//! Users submit visual and auditory test results. For each modality the
//! engine keeps a small [`PercentileSummary`] of the population (the latest
//! result of every user) and places an individual user on that scale.
//!
//! ## Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use reactrank_core::{
//!     InMemoryMeasurementStore, Modality, RankService, RankingConfig, TestSubmission, UserId,
//! };
//!
//! let store = Arc::new(InMemoryMeasurementStore::new());
//! let service = RankService::from_config(store, &RankingConfig::default());
//!
//! let user = UserId::parse("alice").unwrap();
//! for (modality, value) in [(Modality::Visual, 240.0), (Modality::Auditory, 190.0)] {
//!     let submission = TestSubmission { value: Some(value), ..Default::default() };
//!     service.record(user.clone(), modality, submission).unwrap();
//! }
//!
//! let report = service.rank(&user).unwrap();
//! assert_eq!(report.visual.total_users, 1);
//! ```
//!
//! ## Architecture
//!
//! RankService → StatsCache (fresh? serve : recompute via `compute_summary`)
//! → `rank` (interpolate against breakpoints) → RankReport
//!
//! Persistence is a collaborator: the core reads through the
//! [`MeasurementStore`] and [`SummaryStore`] traits.

pub mod cache;
pub mod config;
pub mod error;
pub mod measurement;
pub mod modality;
pub mod rank;
pub mod service;
pub mod statistics;
pub mod summary;

pub use cache::{
    Clock, DEFAULT_TTL, InMemorySummaryStore, StatsCache, SummaryStore, SystemClock,
};
pub use config::{Config, ConfigError, MAX_STATS_TTL_SECS, RankingConfig, ServerConfig};
pub use error::{RankError, StoreError};
pub use measurement::{
    InMemoryMeasurementStore, Measurement, MeasurementStore, Stimulus, UserProfile,
};
pub use modality::{Modality, UserId};
pub use rank::{EMPTY_POPULATION_PERCENTILE, RankResult, interpolate_percentile, rank};
pub use service::{LatestResults, RankReport, RankService, TestSubmission};
pub use statistics::{
    DEFAULT_EXCLUDE_PERCENT, StatisticsReport, TrimmedStats, statistics_report, trimmed_stats,
};
pub use summary::{Breakpoint, PERCENTILE_POINTS, PercentileSummary, compute_summary};

/// Library version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
