//! Per-signal detectors
//!
//! Deltas are signed and preserved in the evidence: a denial-rate increase
//! is bad, a payment-amount increase is good. Each detector applies its own
//! threshold policy (absolute, relative, or both).

use crate::config::SignalThresholds;
use crate::detector::{delta_severity, pair_windows, SignalDetector};
use crate::source::WindowAggregate;
use alert_model::{DriftEvent, SignalEvidence, SignalType};
use tracing::debug;
use uuid::Uuid;

/// Share of claims denied. Fires on absolute increases only; a falling
/// denial rate is an improvement, not drift worth alerting on.
pub struct DenialRateDetector {
    thresholds: SignalThresholds,
}

impl DenialRateDetector {
    pub fn new(thresholds: SignalThresholds) -> Self {
        Self { thresholds }
    }
}

impl SignalDetector for DenialRateDetector {
    fn signal(&self) -> SignalType {
        SignalType::DenialRate
    }

    fn detect(
        &self,
        tenant_id: Uuid,
        baseline: &[WindowAggregate],
        current: &[WindowAggregate],
    ) -> Vec<DriftEvent> {
        let threshold = self.thresholds.absolute.unwrap_or(0.15);
        pair_windows(baseline, current)
            .into_iter()
            .filter(|(b, c)| {
                b.count >= self.thresholds.min_samples && c.count >= self.thresholds.min_samples
            })
            .filter_map(|(b, c)| {
                let delta = c.mean - b.mean;
                if delta < threshold {
                    return None;
                }
                debug!(
                    entity = %c.entity,
                    baseline = b.mean,
                    current = c.mean,
                    "denial rate drift"
                );
                Some(DriftEvent::new(
                    tenant_id,
                    c.entity.clone(),
                    c.sub_dimension.clone(),
                    SignalType::DenialRate,
                    b.mean,
                    c.mean,
                    c.count,
                    b.std_dev,
                    delta_severity(delta, threshold),
                    SignalEvidence::DenialRate {
                        baseline_rate: b.mean,
                        current_rate: c.mean,
                        delta,
                        sample_count: c.count,
                    },
                ))
            })
            .collect()
    }
}

/// Mean paid amount per claim. Fires on relative drops; the signed delta
/// stays negative in the evidence.
pub struct UnderpaymentDetector {
    thresholds: SignalThresholds,
}

impl UnderpaymentDetector {
    pub fn new(thresholds: SignalThresholds) -> Self {
        Self { thresholds }
    }
}

impl SignalDetector for UnderpaymentDetector {
    fn signal(&self) -> SignalType {
        SignalType::Underpayment
    }

    fn detect(
        &self,
        tenant_id: Uuid,
        baseline: &[WindowAggregate],
        current: &[WindowAggregate],
    ) -> Vec<DriftEvent> {
        let rel_threshold = self.thresholds.relative.unwrap_or(0.15);
        pair_windows(baseline, current)
            .into_iter()
            .filter(|(b, c)| {
                b.count >= self.thresholds.min_samples && c.count >= self.thresholds.min_samples
            })
            .filter_map(|(b, c)| {
                if b.mean <= 0.0 {
                    return None;
                }
                let delta = c.mean - b.mean;
                let drop_pct = -delta / b.mean;
                if drop_pct < rel_threshold {
                    return None;
                }
                Some(DriftEvent::new(
                    tenant_id,
                    c.entity.clone(),
                    c.sub_dimension.clone(),
                    SignalType::Underpayment,
                    b.mean,
                    c.mean,
                    c.count,
                    b.std_dev,
                    delta_severity(drop_pct, rel_threshold),
                    SignalEvidence::Underpayment {
                        baseline_paid: b.mean,
                        current_paid: c.mean,
                        delta,
                        sample_count: c.count,
                    },
                ))
            })
            .collect()
    }
}

/// Days from submission to payment. Fires when the delay grows by more
/// than the absolute day threshold OR the relative fraction, whichever
/// trips first.
pub struct PaymentDelayDetector {
    thresholds: SignalThresholds,
}

impl PaymentDelayDetector {
    pub fn new(thresholds: SignalThresholds) -> Self {
        Self { thresholds }
    }
}

impl SignalDetector for PaymentDelayDetector {
    fn signal(&self) -> SignalType {
        SignalType::PaymentDelay
    }

    fn detect(
        &self,
        tenant_id: Uuid,
        baseline: &[WindowAggregate],
        current: &[WindowAggregate],
    ) -> Vec<DriftEvent> {
        let abs_days = self.thresholds.absolute.unwrap_or(7.0);
        let rel_pct = self.thresholds.relative.unwrap_or(0.3);
        pair_windows(baseline, current)
            .into_iter()
            .filter(|(b, c)| {
                b.count >= self.thresholds.min_samples && c.count >= self.thresholds.min_samples
            })
            .filter_map(|(b, c)| {
                let delta_days = c.mean - b.mean;
                let delta_pct = if b.mean > 0.0 { delta_days / b.mean } else { 0.0 };
                if delta_days <= abs_days && delta_pct <= rel_pct {
                    return None;
                }
                // Severity keyed off whichever ratio tripped harder
                let magnitude = (delta_days / abs_days).max(delta_pct / rel_pct);
                Some(DriftEvent::new(
                    tenant_id,
                    c.entity.clone(),
                    c.sub_dimension.clone(),
                    SignalType::PaymentDelay,
                    b.mean,
                    c.mean,
                    c.count,
                    b.std_dev,
                    delta_severity(magnitude, 1.0),
                    SignalEvidence::PaymentDelay {
                        baseline_days: b.mean,
                        current_days: c.mean,
                        delta_days,
                        delta_pct,
                        sample_count: c.count,
                    },
                ))
            })
            .collect()
    }
}

/// Prior-authorization failure rate. Fires on an absolute increase or a
/// relative jump over the baseline rate.
pub struct AuthFailureDetector {
    thresholds: SignalThresholds,
}

impl AuthFailureDetector {
    pub fn new(thresholds: SignalThresholds) -> Self {
        Self { thresholds }
    }
}

impl SignalDetector for AuthFailureDetector {
    fn signal(&self) -> SignalType {
        SignalType::AuthFailure
    }

    fn detect(
        &self,
        tenant_id: Uuid,
        baseline: &[WindowAggregate],
        current: &[WindowAggregate],
    ) -> Vec<DriftEvent> {
        let abs = self.thresholds.absolute.unwrap_or(0.10);
        let rel = self.thresholds.relative.unwrap_or(0.5);
        pair_windows(baseline, current)
            .into_iter()
            .filter(|(b, c)| {
                b.count >= self.thresholds.min_samples && c.count >= self.thresholds.min_samples
            })
            .filter_map(|(b, c)| {
                let delta = c.mean - b.mean;
                let rel_delta = if b.mean > 0.0 { delta / b.mean } else { 0.0 };
                if delta < abs && rel_delta < rel {
                    return None;
                }
                Some(DriftEvent::new(
                    tenant_id,
                    c.entity.clone(),
                    c.sub_dimension.clone(),
                    SignalType::AuthFailure,
                    b.mean,
                    c.mean,
                    c.count,
                    b.std_dev,
                    delta_severity(delta.max(0.0), abs),
                    SignalEvidence::AuthFailure {
                        baseline_rate: b.mean,
                        current_rate: c.mean,
                        delta,
                        sample_count: c.count,
                    },
                ))
            })
            .collect()
    }
}
