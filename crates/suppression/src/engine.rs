//! Suppression decision logic
//!
//! Rule chain, checked in order:
//! 1. Escalating severity relative to the most recent similar alert:
//!    never suppress. Escalation overrides learned noise.
//! 2. Regression (most recent similar alert resolved days ago, drift is
//!    back): never suppress.
//! 3. Learned noise: if enough judgments on similar alerts said "noise",
//!    suppress for a severity-specific window from the last occurrence.
//! 4. Standard short deduplication window since the last same-fingerprint
//!    alert.
//!
//! No rule matching means deliver: the engine fails open on novel
//! signals rather than silencing them.

use alert_model::{AlertEvent, OperatorJudgment, Severity, Verdict};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Outcome of a suppression check
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    Deliver,
    Suppress {
        reason: String,
        until: DateTime<Utc>,
    },
    /// Delivery that must not be withheld even by learned noise
    ForceDeliver { reason: String },
}

impl Decision {
    pub fn is_suppressed(&self) -> bool {
        matches!(self, Decision::Suppress { .. })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuppressionConfig {
    /// Fraction of "noise" judgments that activates learned suppression
    pub noise_ratio_threshold: f64,
    /// Learned-noise window per severity, in days
    pub noise_window_days_emergency: i64,
    pub noise_window_days_critical: i64,
    pub noise_window_days_warning: i64,
    pub noise_window_days_info: i64,
    /// Standard deduplication window
    pub dedup_window_hours: i64,
    /// Gap after resolution that turns a repeat into a regression
    pub regression_gap_days: i64,
}

impl Default for SuppressionConfig {
    fn default() -> Self {
        Self {
            noise_ratio_threshold: 0.8,
            noise_window_days_emergency: 30,
            noise_window_days_critical: 14,
            noise_window_days_warning: 7,
            noise_window_days_info: 3,
            dedup_window_hours: 4,
            regression_gap_days: 3,
        }
    }
}

impl SuppressionConfig {
    fn noise_window(&self, severity: Severity) -> Duration {
        let days = match severity {
            Severity::Emergency => self.noise_window_days_emergency,
            Severity::Critical => self.noise_window_days_critical,
            Severity::Warning => self.noise_window_days_warning,
            Severity::Info => self.noise_window_days_info,
        };
        Duration::days(days)
    }
}

pub struct SuppressionEngine {
    config: SuppressionConfig,
}

impl SuppressionEngine {
    pub fn new(config: SuppressionConfig) -> Self {
        Self { config }
    }

    /// Decide the fate of a newly created alert.
    ///
    /// `similar` holds recent same-fingerprint alerts, newest first
    /// (already lookback-bounded and capped by the store). `judgments`
    /// are the operator verdicts on those alerts.
    pub fn should_suppress(
        &self,
        alert: &AlertEvent,
        similar: &[AlertEvent],
        judgments: &[OperatorJudgment],
        now: DateTime<Utc>,
    ) -> Decision {
        let most_recent = match similar.first() {
            Some(recent) => recent,
            None => {
                debug!(alert = %alert.id, "no similar history, delivering");
                return Decision::Deliver;
            }
        };

        // Escalation overrides everything learned
        if alert.payload.severity > most_recent.payload.severity {
            info!(
                alert = %alert.id,
                from = %most_recent.payload.severity,
                to = %alert.payload.severity,
                "escalating severity, forcing delivery"
            );
            return Decision::ForceDeliver {
                reason: format!(
                    "severity escalated from {} to {}",
                    most_recent.payload.severity, alert.payload.severity
                ),
            };
        }

        // A resolved problem coming back is a regression, not a duplicate
        if let Some(resolved_at) = most_recent.resolved_at {
            if now - resolved_at >= Duration::days(self.config.regression_gap_days) {
                info!(alert = %alert.id, "regression after resolution, forcing delivery");
                return Decision::ForceDeliver {
                    reason: format!(
                        "regression: prior alert resolved {} days ago",
                        (now - resolved_at).num_days()
                    ),
                };
            }
        }

        // Learned noise
        if let Some(ratio) = noise_ratio(judgments) {
            if ratio >= self.config.noise_ratio_threshold {
                let until = most_recent.created_at + self.config.noise_window(alert.payload.severity);
                if now < until {
                    debug!(alert = %alert.id, ratio, "suppressed as learned noise");
                    return Decision::Suppress {
                        reason: format!(
                            "{:.0}% of recent operator judgments marked this pattern noise",
                            ratio * 100.0
                        ),
                        until,
                    };
                }
            }
        }

        // Standard dedup window
        let dedup_until = most_recent.created_at + Duration::hours(self.config.dedup_window_hours);
        if now < dedup_until {
            return Decision::Suppress {
                reason: format!(
                    "duplicate within {}h deduplication window",
                    self.config.dedup_window_hours
                ),
                until: dedup_until,
            };
        }

        Decision::Deliver
    }
}

/// Fraction of judgments marked noise; `None` with no judgments at all
fn noise_ratio(judgments: &[OperatorJudgment]) -> Option<f64> {
    if judgments.is_empty() {
        return None;
    }
    let noise = judgments
        .iter()
        .filter(|j| j.verdict == Verdict::Noise)
        .count();
    Some(noise as f64 / judgments.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alert_model::{AlertPayload, ConfidenceBreakdown, SignalEvidence};
    use proptest::prelude::*;
    use uuid::Uuid;

    fn alert(severity: Severity, created_at: DateTime<Utc>) -> AlertEvent {
        let mut alert = AlertEvent::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4(),
            AlertPayload {
                entity: "Acme Health".to_string(),
                severity,
                evidence: SignalEvidence::DenialRate {
                    baseline_rate: 0.1,
                    current_rate: 0.3,
                    delta: 0.2,
                    sample_count: 30,
                },
                confidence: ConfidenceBreakdown {
                    sample_size: 0.7,
                    significance: 1.0,
                    stability: 0.6,
                    persistence: 0.2,
                    historical: 0.5,
                    score: 0.71,
                },
            },
        );
        alert.created_at = created_at;
        alert
    }

    fn judgments(noise: usize, real: usize, target: &AlertEvent) -> Vec<OperatorJudgment> {
        let mut out = Vec::new();
        for _ in 0..noise {
            out.push(OperatorJudgment::new(
                target.id,
                target.tenant_id,
                Uuid::new_v4(),
                Verdict::Noise,
                None,
            ));
        }
        for _ in 0..real {
            out.push(OperatorJudgment::new(
                target.id,
                target.tenant_id,
                Uuid::new_v4(),
                Verdict::Real,
                None,
            ));
        }
        out
    }

    #[test]
    fn test_no_history_fails_open() {
        let engine = SuppressionEngine::new(SuppressionConfig::default());
        let now = Utc::now();
        let fresh = alert(Severity::Warning, now);
        assert_eq!(engine.should_suppress(&fresh, &[], &[], now), Decision::Deliver);
    }

    #[test]
    fn test_learned_noise_warning_window() {
        // 9 of 10 recent judgments say noise, severity warning:
        // suppressed for 7 days from the last occurrence.
        let engine = SuppressionEngine::new(SuppressionConfig::default());
        let now = Utc::now();
        let recent = alert(Severity::Warning, now - Duration::days(2));
        let verdicts = judgments(9, 1, &recent);
        let fresh = alert(Severity::Warning, now);

        match engine.should_suppress(&fresh, &[recent.clone()], &verdicts, now) {
            Decision::Suppress { until, .. } => {
                assert_eq!(until, recent.created_at + Duration::days(7));
            }
            other => panic!("expected suppression, got {other:?}"),
        }
    }

    #[test]
    fn test_noise_window_expires() {
        let engine = SuppressionEngine::new(SuppressionConfig::default());
        let now = Utc::now();
        // Last occurrence 8 days back: outside the 7-day warning window
        let recent = alert(Severity::Warning, now - Duration::days(8));
        let verdicts = judgments(10, 0, &recent);
        let fresh = alert(Severity::Warning, now);

        assert_eq!(
            engine.should_suppress(&fresh, &[recent], &verdicts, now),
            Decision::Deliver
        );
    }

    #[test]
    fn test_escalation_beats_learned_noise() {
        let engine = SuppressionEngine::new(SuppressionConfig::default());
        let now = Utc::now();
        let recent = alert(Severity::Warning, now - Duration::hours(1));
        let verdicts = judgments(10, 0, &recent);
        let fresh = alert(Severity::Critical, now);

        assert!(matches!(
            engine.should_suppress(&fresh, &[recent], &verdicts, now),
            Decision::ForceDeliver { .. }
        ));
    }

    #[test]
    fn test_regression_forces_delivery() {
        let engine = SuppressionEngine::new(SuppressionConfig::default());
        let now = Utc::now();
        let mut recent = alert(Severity::Warning, now - Duration::days(10));
        recent.resolved_at = Some(now - Duration::days(5));
        let fresh = alert(Severity::Warning, now);

        assert!(matches!(
            engine.should_suppress(&fresh, &[recent], &[], now),
            Decision::ForceDeliver { .. }
        ));
    }

    #[test]
    fn test_dedup_window() {
        let engine = SuppressionEngine::new(SuppressionConfig::default());
        let now = Utc::now();
        let recent = alert(Severity::Warning, now - Duration::hours(1));
        let fresh = alert(Severity::Warning, now);

        assert!(engine
            .should_suppress(&fresh, &[recent.clone()], &[], now)
            .is_suppressed());

        // Past the 4-hour window the duplicate delivers again
        let later = now + Duration::hours(4);
        let fresh = alert(Severity::Warning, later);
        assert_eq!(
            engine.should_suppress(&fresh, &[recent], &[], later),
            Decision::Deliver
        );
    }

    fn severity_strategy() -> impl Strategy<Value = Severity> {
        prop_oneof![
            Just(Severity::Info),
            Just(Severity::Warning),
            Just(Severity::Critical),
            Just(Severity::Emergency),
        ]
    }

    proptest! {
        /// An escalating severity is never suppressed, whatever the
        /// judgment history looks like.
        #[test]
        fn prop_escalation_never_suppressed(
            prior in severity_strategy(),
            current in severity_strategy(),
            noise in 0usize..12,
            real in 0usize..12,
            hours_ago in 0i64..72,
        ) {
            prop_assume!(current > prior);

            let engine = SuppressionEngine::new(SuppressionConfig::default());
            let now = Utc::now();
            let recent = alert(prior, now - Duration::hours(hours_ago));
            let verdicts = judgments(noise, real, &recent);
            let fresh = alert(current, now);

            let decision = engine.should_suppress(&fresh, &[recent], &verdicts, now);
            prop_assert!(!decision.is_suppressed());
        }
    }
}
