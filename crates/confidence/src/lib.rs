//! Confidence Scoring
//!
//! Assigns a 0-1 confidence to a candidate drift event from sample size,
//! statistical significance, baseline stability, temporal persistence, and
//! historical operator accuracy. Pure functions; all state comes in through
//! the inputs.

use alert_model::ConfidenceBreakdown;
use serde::{Deserialize, Serialize};

/// Canonical factor weights: sample / significance / stability /
/// persistence / historical.
pub const WEIGHTS: [f64; 5] = [0.3, 0.3, 0.2, 0.1, 0.1];

/// Consecutive-day count at which persistence saturates
const PERSISTENCE_SATURATION_DAYS: u32 = 5;

/// Inputs to the scorer
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ConfidenceInputs {
    pub sample_count: u64,
    pub baseline_mean: f64,
    pub current_mean: f64,
    pub baseline_std: f64,
    /// Consecutive days the same fingerprint has triggered
    pub consecutive_days: u32,
    /// Fraction of prior same-fingerprint alerts operators marked "real";
    /// None with zero history
    pub historical_real_ratio: Option<f64>,
}

/// Score a candidate, returning the per-factor breakdown plus the
/// weighted aggregate. Both are stored on the alert payload.
pub fn score(inputs: &ConfidenceInputs) -> ConfidenceBreakdown {
    let sample_size = sample_size_component(inputs.sample_count);
    let significance = significance_component(
        inputs.sample_count,
        inputs.baseline_mean,
        inputs.current_mean,
        inputs.baseline_std,
    );
    let stability = stability_component(inputs.baseline_mean, inputs.baseline_std);
    let persistence = persistence_component(inputs.consecutive_days);
    let historical = inputs.historical_real_ratio.unwrap_or(0.5).clamp(0.0, 1.0);

    let score = WEIGHTS[0] * sample_size
        + WEIGHTS[1] * significance
        + WEIGHTS[2] * stability
        + WEIGHTS[3] * persistence
        + WEIGHTS[4] * historical;

    ConfidenceBreakdown {
        sample_size,
        significance,
        stability,
        persistence,
        historical,
        score,
    }
}

/// Step function over sample count, saturating at 100 samples
fn sample_size_component(count: u64) -> f64 {
    match count {
        n if n >= 100 => 1.0,
        n if n >= 50 => 0.85,
        n if n >= 30 => 0.7,
        n if n >= 15 => 0.55,
        n if n >= 10 => 0.4,
        _ => 0.3,
    }
}

/// Approximate one-sample t-statistic mapped through fixed breakpoints.
///
/// With zero baseline variance or fewer than two samples the statistic
/// cannot be computed; return a neutral 0.5 rather than biasing the
/// decision either way.
fn significance_component(count: u64, baseline: f64, current: f64, std: f64) -> f64 {
    if std <= 0.0 || count < 2 {
        return 0.5;
    }
    let t = (current - baseline).abs() / (std / (count as f64).sqrt());
    match t {
        t if t >= 3.0 => 1.0,
        t if t >= 2.5 => 0.9,
        t if t >= 2.0 => 0.8,
        t if t >= 1.5 => 0.6,
        _ => 0.4,
    }
}

/// Coefficient of variation of the baseline; lower CV, higher confidence
fn stability_component(mean: f64, std: f64) -> f64 {
    if mean.abs() < f64::EPSILON {
        return 0.5;
    }
    let cv = std / mean.abs();
    match cv {
        cv if cv <= 0.1 => 1.0,
        cv if cv <= 0.25 => 0.8,
        cv if cv <= 0.5 => 0.6,
        cv if cv <= 1.0 => 0.4,
        _ => 0.2,
    }
}

/// Linear ramp saturating at [`PERSISTENCE_SATURATION_DAYS`]
fn persistence_component(days: u32) -> f64 {
    (days as f64 / PERSISTENCE_SATURATION_DAYS as f64).min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs() -> ConfidenceInputs {
        ConfidenceInputs {
            sample_count: 30,
            baseline_mean: 0.10,
            current_mean: 0.28,
            baseline_std: 0.05,
            consecutive_days: 2,
            historical_real_ratio: None,
        }
    }

    #[test]
    fn test_zero_std_returns_neutral_significance() {
        let breakdown = score(&ConfidenceInputs {
            baseline_std: 0.0,
            ..inputs()
        });
        assert_eq!(breakdown.significance, 0.5);
    }

    #[test]
    fn test_single_sample_returns_neutral_significance() {
        let breakdown = score(&ConfidenceInputs {
            sample_count: 1,
            ..inputs()
        });
        assert_eq!(breakdown.significance, 0.5);
    }

    #[test]
    fn test_strong_shift_saturates_significance() {
        // t = 0.18 / (0.05 / sqrt(30)) ~= 19.7
        let breakdown = score(&inputs());
        assert_eq!(breakdown.significance, 1.0);
    }

    #[test]
    fn test_sample_size_steps() {
        assert_eq!(sample_size_component(150), 1.0);
        assert_eq!(sample_size_component(100), 1.0);
        assert_eq!(sample_size_component(9), 0.3);
        assert!(sample_size_component(30) > sample_size_component(10));
    }

    #[test]
    fn test_persistence_saturates() {
        assert_eq!(persistence_component(5), 1.0);
        assert_eq!(persistence_component(10), 1.0);
        assert!((persistence_component(2) - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_zero_history_is_unbiased() {
        let breakdown = score(&inputs());
        assert_eq!(breakdown.historical, 0.5);
    }

    #[test]
    fn test_weighted_aggregate() {
        let breakdown = score(&inputs());
        let expected = 0.3 * breakdown.sample_size
            + 0.3 * breakdown.significance
            + 0.2 * breakdown.stability
            + 0.1 * breakdown.persistence
            + 0.1 * breakdown.historical;
        assert!((breakdown.score - expected).abs() < 1e-12);
        assert!(breakdown.score > 0.0 && breakdown.score <= 1.0);
    }

    proptest::proptest! {
        /// Every factor and the aggregate stay in [0, 1] for any input,
        /// including degenerate statistics.
        #[test]
        fn prop_score_bounded(
            sample_count in 0u64..100_000,
            baseline_mean in -1000.0f64..1000.0,
            current_mean in -1000.0f64..1000.0,
            baseline_std in 0.0f64..1000.0,
            consecutive_days in 0u32..365,
            ratio in proptest::option::of(0.0f64..=1.0),
        ) {
            let breakdown = score(&ConfidenceInputs {
                sample_count,
                baseline_mean,
                current_mean,
                baseline_std,
                consecutive_days,
                historical_real_ratio: ratio,
            });
            for factor in [
                breakdown.sample_size,
                breakdown.significance,
                breakdown.stability,
                breakdown.persistence,
                breakdown.historical,
                breakdown.score,
            ] {
                proptest::prop_assert!((0.0..=1.0).contains(&factor));
            }
        }
    }
}
