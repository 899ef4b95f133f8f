//! Map a single value onto the population's percentile scale.
//!
//! The percentile is piecewise-linear between the summary's breakpoints and
//! clamped to the first and last percentile points outside them. A lower raw
//! value gives a lower percentile; callers that want "higher is better"
//! invert it for display.

use serde::{Deserialize, Serialize};

use crate::summary::PercentileSummary;

/// Percentile reported against an empty population.
pub const EMPTY_POPULATION_PERCENTILE: f64 = 50.0;

/// Rank of one user for one modality.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankResult {
    /// The user's latest measurement.
    pub value: f64,
    /// Interpolated percentile, rounded to one decimal.
    pub percentile: f64,
    /// Number of users this user outperforms.
    pub better_than: u64,
    /// Population size when the summary was computed.
    pub total_users: u64,
    /// `computed_at` of the summary the rank was computed against.
    pub stats_updated_at: u64,
}

/// Continuous percentile of `value` against `summary`.
///
/// Returns [`EMPTY_POPULATION_PERCENTILE`] when the summary has no samples.
/// Where two adjacent breakpoints are equal the lower percentile is used.
pub fn interpolate_percentile(value: f64, summary: &PercentileSummary) -> f64 {
    let points = summary.points();
    let (Some(&(first_p, first_v)), Some(&(last_p, last_v))) = (points.first(), points.last())
    else {
        return EMPTY_POPULATION_PERCENTILE;
    };

    if value <= first_v {
        return first_p;
    }
    if value >= last_v {
        return last_p;
    }

    for pair in points.windows(2) {
        let (p0, v0) = pair[0];
        let (p1, v1) = pair[1];
        if v0 <= value && value <= v1 {
            if v1 == v0 {
                return p0;
            }
            return p0 + (value - v0) / (v1 - v0) * (p1 - p0);
        }
    }

    // Unreachable for a sorted summary and a finite value strictly inside it.
    EMPTY_POPULATION_PERCENTILE
}

/// Round to one decimal place.
pub fn round_percentile(percentile: f64) -> f64 {
    (percentile * 10.0).round() / 10.0
}

/// Users outperformed at `percentile` in a population of `sample_count`.
pub fn better_than(percentile: f64, sample_count: usize) -> u64 {
    (percentile / 100.0 * sample_count as f64).round().max(0.0) as u64
}

/// Full rank of `value` against `summary`.
pub fn rank(value: f64, summary: &PercentileSummary) -> RankResult {
    let percentile = interpolate_percentile(value, summary);
    RankResult {
        value,
        percentile: round_percentile(percentile),
        better_than: better_than(percentile, summary.sample_count),
        total_users: summary.sample_count as u64,
        stats_updated_at: summary.computed_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modality::Modality;
    use crate::summary::{Breakpoint, compute_summary};

    fn ten() -> PercentileSummary {
        let values: Vec<f64> = (0..10).map(|i| 100.0 + 20.0 * i as f64).collect();
        compute_summary(Modality::Visual, &values, 7)
    }

    #[test]
    fn test_value_on_p50_breakpoint() {
        assert_eq!(interpolate_percentile(180.0, &ten()), 50.0);
    }

    #[test]
    fn test_interpolates_between_p50_and_p75() {
        let p = interpolate_percentile(190.0, &ten());
        assert!((p - (50.0 + 10.0 / 60.0 * 25.0)).abs() < 1e-9);
        assert_eq!(round_percentile(p), 54.2);
    }

    #[test]
    fn test_clamps_at_edges() {
        let s = ten();
        assert_eq!(interpolate_percentile(100.0, &s), 1.0);
        assert_eq!(interpolate_percentile(50.0, &s), 1.0);
        assert_eq!(interpolate_percentile(280.0, &s), 99.0);
        assert_eq!(interpolate_percentile(1_000.0, &s), 99.0);
    }

    #[test]
    fn test_flat_segment_uses_lower_point() {
        // p90 = 260, p95 = p99 = 280: a value in (260, 280) interpolates
        // between p90 and p95, never into the flat p95..p99 run.
        let p = interpolate_percentile(270.0, &ten());
        assert!((p - 92.5).abs() < 1e-9);
    }

    #[test]
    fn test_flat_interior_segment_does_not_divide_by_zero() {
        let summary = PercentileSummary {
            modality: Modality::Visual,
            breakpoints: vec![
                Breakpoint { percentile: 1, value: Some(10.0) },
                Breakpoint { percentile: 50, value: Some(20.0) },
                Breakpoint { percentile: 75, value: Some(20.0) },
                Breakpoint { percentile: 99, value: Some(30.0) },
            ],
            sample_count: 4,
            computed_at: 0,
        };
        assert_eq!(interpolate_percentile(20.0, &summary), 50.0);
        assert!(interpolate_percentile(25.0, &summary).is_finite());
    }

    #[test]
    fn test_single_value_population_clamps_low() {
        let s = compute_summary(Modality::Visual, &[80.0], 0);
        assert_eq!(interpolate_percentile(80.0, &s), 1.0);
        let r = rank(80.0, &s);
        assert_eq!(r.percentile, 1.0);
        assert_eq!(r.better_than, 0);
        assert_eq!(r.total_users, 1);
    }

    #[test]
    fn test_empty_population_convention() {
        let empty = compute_summary(Modality::Auditory, &[], 3);
        let r = rank(250.0, &empty);
        assert_eq!(r.percentile, EMPTY_POPULATION_PERCENTILE);
        assert_eq!(r.better_than, 0);
        assert_eq!(r.total_users, 0);
        assert_eq!(r.stats_updated_at, 3);
    }

    #[test]
    fn test_better_than_derivation() {
        assert_eq!(better_than(54.2, 10), 5);
        assert_eq!(better_than(55.0, 10), 6);
        assert_eq!(better_than(1.0, 10), 0);
        assert_eq!(better_than(99.0, 10), 10);
    }

    #[test]
    fn test_rank_assembles_result() {
        let r = rank(190.0, &ten());
        assert_eq!(r.value, 190.0);
        assert_eq!(r.percentile, 54.2);
        assert_eq!(r.better_than, 5);
        assert_eq!(r.total_users, 10);
        assert_eq!(r.stats_updated_at, 7);
    }
}
