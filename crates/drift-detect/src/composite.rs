//! Composite payer-drift score
//!
//! Combines denial-rate, payment-amount, approval-rate, and
//! processing-time deltas into one score in [0, 1]. Weights and the
//! firing threshold come from configuration.

use crate::config::{CompositeWeights, DetectorConfig};
use crate::detector::pair_windows;
use crate::source::WindowAggregate;
use alert_model::{DriftEvent, Severity, SignalEvidence, SignalType};
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

/// Window aggregates for each input dimension, baseline and current
#[derive(Debug, Default)]
pub struct CompositeInputs {
    pub denial_baseline: Vec<WindowAggregate>,
    pub denial_current: Vec<WindowAggregate>,
    pub payment_baseline: Vec<WindowAggregate>,
    pub payment_current: Vec<WindowAggregate>,
    pub approval_baseline: Vec<WindowAggregate>,
    pub approval_current: Vec<WindowAggregate>,
    pub processing_baseline: Vec<WindowAggregate>,
    pub processing_current: Vec<WindowAggregate>,
}

pub struct CompositeDetector {
    weights: CompositeWeights,
    threshold: f64,
    min_samples: u64,
}

/// Normalized per-dimension deltas for one entity, each in [0, 1]
/// with 0 meaning "no adverse movement"
#[derive(Debug, Clone, Copy, Default)]
struct EntityDeltas {
    denial: f64,
    payment: f64,
    approval: f64,
    processing: f64,
}

impl CompositeDetector {
    pub fn new(config: &DetectorConfig) -> Self {
        Self {
            weights: config.composite_weights.clone(),
            threshold: config.composite_threshold,
            min_samples: config.composite_min_samples,
        }
    }

    pub fn signal(&self) -> SignalType {
        SignalType::PayerComposite
    }

    /// One candidate per entity whose weighted composite exceeds the
    /// threshold. Entities lacking a dimension simply contribute 0 for it.
    pub fn detect(&self, tenant_id: Uuid, inputs: &CompositeInputs) -> Vec<DriftEvent> {
        let mut deltas: HashMap<String, EntityDeltas> = HashMap::new();

        for (base, cur) in pair_windows(&inputs.denial_baseline, &inputs.denial_current) {
            if base.count < self.min_samples || cur.count < self.min_samples {
                continue;
            }
            // Rates live in [0, 1] already; only increases are adverse
            deltas.entry(cur.entity.clone()).or_default().denial =
                (cur.mean - base.mean).clamp(0.0, 1.0);
        }
        for (base, cur) in pair_windows(&inputs.payment_baseline, &inputs.payment_current) {
            if base.count < self.min_samples || cur.count < self.min_samples || base.mean <= 0.0 {
                continue;
            }
            // Fractional payment drop
            deltas.entry(cur.entity.clone()).or_default().payment =
                ((base.mean - cur.mean) / base.mean).clamp(0.0, 1.0);
        }
        for (base, cur) in pair_windows(&inputs.approval_baseline, &inputs.approval_current) {
            if base.count < self.min_samples || cur.count < self.min_samples {
                continue;
            }
            // Approval-rate drop
            deltas.entry(cur.entity.clone()).or_default().approval =
                (base.mean - cur.mean).clamp(0.0, 1.0);
        }
        for (base, cur) in pair_windows(&inputs.processing_baseline, &inputs.processing_current) {
            if base.count < self.min_samples || cur.count < self.min_samples || base.mean <= 0.0 {
                continue;
            }
            // Fractional processing-time growth
            deltas.entry(cur.entity.clone()).or_default().processing =
                ((cur.mean - base.mean) / base.mean).clamp(0.0, 1.0);
        }

        deltas
            .into_iter()
            .filter_map(|(entity, d)| {
                let score = self.weights.denial * d.denial
                    + self.weights.payment * d.payment
                    + self.weights.approval * d.approval
                    + self.weights.processing * d.processing;
                if score <= self.threshold {
                    return None;
                }
                debug!(entity = %entity, score, "composite payer drift");
                let sample_count = inputs
                    .denial_current
                    .iter()
                    .find(|a| a.entity == entity)
                    .map(|a| a.count)
                    .unwrap_or(0);
                Some(DriftEvent::new(
                    tenant_id,
                    entity,
                    None,
                    SignalType::PayerComposite,
                    0.0,
                    score,
                    sample_count,
                    0.0,
                    self.severity_for(score),
                    SignalEvidence::PayerComposite {
                        composite_score: score,
                        denial_delta: d.denial,
                        payment_delta: d.payment,
                        approval_delta: d.approval,
                        processing_delta: d.processing,
                    },
                ))
            })
            .collect()
    }

    /// Composite scores just over threshold stay informational; the
    /// per-signal detectors carry the sharper severities.
    fn severity_for(&self, score: f64) -> Severity {
        let ratio = score / self.threshold;
        if ratio >= 3.0 {
            Severity::Emergency
        } else if ratio >= 2.0 {
            Severity::Critical
        } else if ratio >= 1.5 {
            Severity::Warning
        } else {
            Severity::Info
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DetectorConfig;

    fn aggs(entity: &str, mean: f64) -> Vec<WindowAggregate> {
        vec![WindowAggregate::new(entity, mean, 30, 0.05)]
    }

    #[test]
    fn test_weighted_composite_fires() {
        let detector = CompositeDetector::new(&DetectorConfig::default());
        let inputs = CompositeInputs {
            denial_baseline: aggs("acme", 0.10),
            denial_current: aggs("acme", 0.40), // 0.30 * 0.4 = 0.12
            payment_baseline: aggs("acme", 100.0),
            payment_current: aggs("acme", 80.0), // 0.20 * 0.3 = 0.06
            ..Default::default()
        };
        let events = detector.detect(Uuid::new_v4(), &inputs);
        assert_eq!(events.len(), 1);
        match &events[0].evidence {
            SignalEvidence::PayerComposite { composite_score, .. } => {
                assert!((composite_score - 0.18).abs() < 1e-9);
            }
            other => panic!("wrong evidence variant: {other:?}"),
        }
    }

    #[test]
    fn test_below_threshold_is_silent() {
        let detector = CompositeDetector::new(&DetectorConfig::default());
        let inputs = CompositeInputs {
            denial_baseline: aggs("acme", 0.10),
            denial_current: aggs("acme", 0.20), // 0.10 * 0.4 = 0.04
            ..Default::default()
        };
        assert!(detector.detect(Uuid::new_v4(), &inputs).is_empty());
    }

    #[test]
    fn test_good_movement_contributes_nothing() {
        let detector = CompositeDetector::new(&DetectorConfig::default());
        let inputs = CompositeInputs {
            denial_baseline: aggs("acme", 0.40),
            denial_current: aggs("acme", 0.10), // improvement clamps to 0
            payment_baseline: aggs("acme", 80.0),
            payment_current: aggs("acme", 120.0), // improvement clamps to 0
            ..Default::default()
        };
        assert!(detector.detect(Uuid::new_v4(), &inputs).is_empty());
    }

    #[test]
    fn test_tunable_weights() {
        let mut config = DetectorConfig::default();
        config.composite_weights.denial = 1.0;
        config.composite_weights.payment = 0.0;
        let detector = CompositeDetector::new(&config);
        let inputs = CompositeInputs {
            denial_baseline: aggs("acme", 0.10),
            denial_current: aggs("acme", 0.30),
            ..Default::default()
        };
        let events = detector.detect(Uuid::new_v4(), &inputs);
        assert_eq!(events.len(), 1);
    }
}
