//! Trimmed descriptive statistics over raw measurement values.
//!
//! Independent of ranking: this reports mean/median/spread over every run
//! (or every run of one user) after dropping the top and bottom
//! `exclude_percent` of values.

use serde::{Deserialize, Serialize};

use crate::error::RankError;
use crate::measurement::MeasurementStore;
use crate::modality::{Modality, UserId};

/// Default share trimmed from each end, in percent.
pub const DEFAULT_EXCLUDE_PERCENT: f64 = 10.0;

/// Descriptive statistics after trimming. Numeric fields are rounded to the
/// nearest integer and absent when there is no data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrimmedStats {
    /// Values before trimming.
    pub count: usize,
    /// Values the statistics were computed over.
    pub filtered_count: usize,
    pub mean: Option<f64>,
    pub median: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    /// Population standard deviation.
    pub std_dev: Option<f64>,
    /// `count - filtered_count`.
    pub excluded: usize,
}

/// Statistics for both modalities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticsReport {
    pub visual: TrimmedStats,
    pub auditory: TrimmedStats,
}

/// Compute [`TrimmedStats`] over `values`.
///
/// `floor(n * exclude_percent / 100)` values are dropped from each end of the
/// sorted data. If that leaves nothing, the untrimmed data is used.
pub fn trimmed_stats(values: &[f64], exclude_percent: f64) -> TrimmedStats {
    let count = values.len();
    if count == 0 {
        return TrimmedStats {
            count: 0,
            filtered_count: 0,
            mean: None,
            median: None,
            min: None,
            max: None,
            std_dev: None,
            excluded: 0,
        };
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let exclude = (count as f64 * exclude_percent / 100.0).floor().max(0.0) as usize;
    let kept = if exclude > 0 && 2 * exclude < count {
        &sorted[exclude..count - exclude]
    } else {
        &sorted[..]
    };
    let n = kept.len();

    let mean = kept.iter().sum::<f64>() / n as f64;
    let median = if n % 2 == 0 {
        (kept[n / 2 - 1] + kept[n / 2]) / 2.0
    } else {
        kept[n / 2]
    };
    let variance = kept.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n as f64;

    TrimmedStats {
        count,
        filtered_count: n,
        mean: Some(mean.round()),
        median: Some(median.round()),
        min: Some(kept[0].round()),
        max: Some(kept[n - 1].round()),
        std_dev: Some(variance.sqrt().round()),
        excluded: count - n,
    }
}

/// Statistics over every run of every user, or every run of `user`.
pub fn statistics_report(
    store: &dyn MeasurementStore,
    user: Option<&UserId>,
    exclude_percent: f64,
) -> Result<StatisticsReport, RankError> {
    let values = |modality: Modality| -> Result<Vec<f64>, RankError> {
        Ok(match user {
            Some(user) => store.values_for_user(user, modality)?,
            None => store.all_values(modality)?,
        })
    };
    Ok(StatisticsReport {
        visual: trimmed_stats(&values(Modality::Visual)?, exclude_percent),
        auditory: trimmed_stats(&values(Modality::Auditory)?, exclude_percent),
    })
}
