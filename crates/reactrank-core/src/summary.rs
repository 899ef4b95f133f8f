//! Population summaries: nearest-rank percentile breakpoints.
//!
//! A [`PercentileSummary`] condenses the latest value of every user into nine
//! breakpoints. Breakpoints use the nearest-rank method
//! (`index = ceil(p/100 * n) - 1`), not interpolation, so with very small
//! populations several low percentiles share the first sample.

use serde::{Deserialize, Serialize};

use crate::modality::Modality;

/// Percentile points every summary reports, ascending.
pub const PERCENTILE_POINTS: [u32; 9] = [1, 5, 10, 25, 50, 75, 90, 95, 99];

/// One percentile point and the population value at it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Breakpoint {
    pub percentile: u32,
    /// `None` when the population is empty.
    pub value: Option<f64>,
}

/// Percentile breakpoints for one modality at one point in time.
///
/// Values are non-decreasing as the percentile point increases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PercentileSummary {
    pub modality: Modality,
    /// One entry per [`PERCENTILE_POINTS`] element, same order.
    pub breakpoints: Vec<Breakpoint>,
    /// Number of users that contributed a value.
    pub sample_count: usize,
    /// Unix time in milliseconds.
    pub computed_at: u64,
}

impl PercentileSummary {
    /// Summary of an empty population.
    pub fn empty(modality: Modality, computed_at: u64) -> Self {
        Self {
            modality,
            breakpoints: PERCENTILE_POINTS
                .iter()
                .map(|&percentile| Breakpoint {
                    percentile,
                    value: None,
                })
                .collect(),
            sample_count: 0,
            computed_at,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.sample_count == 0
    }

    /// Breakpoint value at percentile point `p`, if `p` is one of the fixed points.
    pub fn value_at(&self, p: u32) -> Option<f64> {
        self.breakpoints
            .iter()
            .find(|b| b.percentile == p)
            .and_then(|b| b.value)
    }

    /// `(percentile, value)` pairs ordered by percentile. Empty for an empty population.
    pub fn points(&self) -> Vec<(f64, f64)> {
        let mut points: Vec<(f64, f64)> = self
            .breakpoints
            .iter()
            .filter_map(|b| b.value.map(|v| (f64::from(b.percentile), v)))
            .collect();
        points.sort_by(|a, b| a.0.total_cmp(&b.0));
        points
    }
}

/// Nearest-rank index for percentile point `p` in a sorted slice of length `n`.
fn nearest_rank_index(p: u32, n: usize) -> usize {
    let rank = (f64::from(p) / 100.0 * n as f64).ceil() as usize;
    rank.saturating_sub(1).min(n.saturating_sub(1))
}

/// Compute the breakpoints of `values` for `modality`.
///
/// `values` holds one latest value per user, in any order.
pub fn compute_summary(modality: Modality, values: &[f64], computed_at: u64) -> PercentileSummary {
    debug_assert!(
        values.iter().all(|v| v.is_finite()),
        "population values must be finite"
    );
    if values.is_empty() {
        return PercentileSummary::empty(modality, computed_at);
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let n = sorted.len();

    let breakpoints = PERCENTILE_POINTS
        .iter()
        .map(|&percentile| Breakpoint {
            percentile,
            value: Some(sorted[nearest_rank_index(percentile, n)]),
        })
        .collect();

    PercentileSummary {
        modality,
        breakpoints,
        sample_count: n,
        computed_at,
    }
}
