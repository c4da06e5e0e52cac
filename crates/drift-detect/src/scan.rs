//! Detection run orchestration
//!
//! Queries the claim source once per signal and window, feeds the
//! aggregates through every detector, and isolates per-signal failures so
//! one broken query cannot abort the rest of the run.

use crate::composite::{CompositeDetector, CompositeInputs};
use crate::config::DetectorConfig;
use crate::detector::SignalDetector;
use crate::detectors::{
    AuthFailureDetector, DenialRateDetector, PaymentDelayDetector, UnderpaymentDetector,
};
use crate::source::{ClaimSource, SourceError, TimeWindow, WindowAggregate};
use crate::DetectError;
use alert_model::{DriftEvent, SignalType};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Result of one detection run
#[derive(Debug, Default)]
pub struct ScanOutcome {
    pub events: Vec<DriftEvent>,
    /// Signals whose source query failed; retryable, and distinct from
    /// signals that simply found no drift
    pub failed_signals: Vec<(SignalType, SourceError)>,
}

pub struct DriftScanner {
    source: Arc<dyn ClaimSource>,
    config: DetectorConfig,
}

impl DriftScanner {
    pub fn new(source: Arc<dyn ClaimSource>, config: DetectorConfig) -> Self {
        Self { source, config }
    }

    /// Run every detector for one tenant over one window pair.
    ///
    /// Returns `Err` only when the source was unreachable for every
    /// signal; partial failures land in [`ScanOutcome::failed_signals`].
    pub async fn scan(
        &self,
        tenant_id: Uuid,
        baseline: TimeWindow,
        current: TimeWindow,
    ) -> Result<ScanOutcome, DetectError> {
        let mut outcome = ScanOutcome::default();
        let mut composite = CompositeInputs::default();
        let mut any_query_ok = false;

        let detectors: Vec<Box<dyn SignalDetector>> = vec![
            Box::new(DenialRateDetector::new(self.config.denial_rate.clone())),
            Box::new(UnderpaymentDetector::new(self.config.underpayment.clone())),
            Box::new(PaymentDelayDetector::new(self.config.payment_delay.clone())),
            Box::new(AuthFailureDetector::new(self.config.auth_failure.clone())),
        ];

        for detector in &detectors {
            let signal = detector.signal();
            let pair = match self.fetch_pair(tenant_id, signal, baseline, current).await {
                Ok(pair) => pair,
                Err(e) => {
                    warn!(signal = %signal, error = %e, "claim source query failed");
                    outcome.failed_signals.push((signal, e));
                    continue;
                }
            };
            any_query_ok = true;

            outcome
                .events
                .extend(detector.detect(tenant_id, &pair.0, &pair.1));

            match signal {
                SignalType::DenialRate => {
                    // Approval rate mirrors the denial rate
                    composite.approval_baseline = invert_rates(&pair.0);
                    composite.approval_current = invert_rates(&pair.1);
                    composite.denial_baseline = pair.0;
                    composite.denial_current = pair.1;
                }
                SignalType::Underpayment => {
                    composite.payment_baseline = pair.0;
                    composite.payment_current = pair.1;
                }
                SignalType::PaymentDelay => {
                    composite.processing_baseline = pair.0;
                    composite.processing_current = pair.1;
                }
                _ => {}
            }
        }

        if !any_query_ok {
            let (signal, err) = outcome.failed_signals.swap_remove(0);
            warn!(signal = %signal, "claim source unreachable for every signal");
            return Err(DetectError::Source(err));
        }

        let composite_detector = CompositeDetector::new(&self.config);
        outcome
            .events
            .extend(composite_detector.detect(tenant_id, &composite));

        info!(
            tenant = %tenant_id,
            candidates = outcome.events.len(),
            failed_signals = outcome.failed_signals.len(),
            "detection run complete"
        );
        Ok(outcome)
    }

    async fn fetch_pair(
        &self,
        tenant_id: Uuid,
        signal: SignalType,
        baseline: TimeWindow,
        current: TimeWindow,
    ) -> Result<(Vec<WindowAggregate>, Vec<WindowAggregate>), SourceError> {
        let base = self.source.aggregates(tenant_id, signal, baseline).await?;
        let cur = self.source.aggregates(tenant_id, signal, current).await?;
        Ok((base, cur))
    }
}

fn invert_rates(aggs: &[WindowAggregate]) -> Vec<WindowAggregate> {
    aggs.iter()
        .map(|a| WindowAggregate {
            entity: a.entity.clone(),
            sub_dimension: a.sub_dimension.clone(),
            mean: (1.0 - a.mean).clamp(0.0, 1.0),
            count: a.count,
            std_dev: a.std_dev,
        })
        .collect()
}
