//! Pipeline orchestration
//!
//! One detection run flows strictly top to bottom: detectors emit drift
//! events, each event is matched against the tenant's rules, matched
//! pairs become idempotently created alert events, suppression filters
//! them, and survivors go to the delivery engine as one batch.

use alert_model::{
    AlertEvent, AlertPayload, AlertRule, AlertStatus, DriftEvent, Fingerprint, OperatorJudgment,
    SignalType, Verdict,
};
use chrono::Utc;
use confidence::ConfidenceInputs;
use delivery::{BatchOutcome, ChannelRegistry, DeliveryEngine};
use drift_detect::{ClaimSource, DriftScanner, TimeWindow};
use std::sync::Arc;
use storage::AlertStore;
use suppression::{Decision, SuppressionEngine};
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::PipelineError;

/// Summary of one detection-and-delivery run
#[derive(Debug, Default)]
pub struct ScanReport {
    pub candidates: usize,
    pub alerts_created: usize,
    /// (drift event, rule) pairs that already had an alert
    pub duplicates: usize,
    pub suppressed: usize,
    pub batch: BatchOutcome,
    pub failed_signals: usize,
}

pub struct AlertPipeline {
    store: Arc<AlertStore>,
    scanner: DriftScanner,
    suppression: SuppressionEngine,
    delivery: DeliveryEngine,
    product: String,
}

impl AlertPipeline {
    pub fn new(
        store: Arc<AlertStore>,
        source: Arc<dyn ClaimSource>,
        channels: ChannelRegistry,
        config: EngineConfig,
    ) -> Self {
        let scanner = DriftScanner::new(source, config.detectors.0.clone());
        let suppression = SuppressionEngine::new(config.suppression.clone());
        let delivery = DeliveryEngine::new(Arc::clone(&store), channels, config.delivery.clone());
        Self {
            store,
            scanner,
            suppression,
            delivery,
            product: config.product,
        }
    }

    /// Full run for one tenant: detect, evaluate, create, suppress,
    /// deliver.
    pub async fn run_scan(
        &self,
        tenant_id: Uuid,
        baseline: TimeWindow,
        current: TimeWindow,
    ) -> Result<ScanReport, PipelineError> {
        let outcome = self.scanner.scan(tenant_id, baseline, current).await?;
        let mut report = ScanReport {
            candidates: outcome.events.len(),
            failed_signals: outcome.failed_signals.len(),
            ..Default::default()
        };

        let rules = self.store.rules_for_tenant(tenant_id)?;
        let mut approved = Vec::new();

        for drift in outcome.events {
            self.store.insert_drift_event(drift.clone())?;
            for rule in &rules {
                if !rule.matches(drift.signal, delta_magnitude(&drift)) {
                    continue;
                }
                match self.evaluate_pair(&drift, rule)? {
                    PairOutcome::Created(alert) => {
                        report.alerts_created += 1;
                        approved.push(alert);
                    }
                    PairOutcome::Suppressed => {
                        report.alerts_created += 1;
                        report.suppressed += 1;
                    }
                    PairOutcome::Duplicate => report.duplicates += 1,
                }
            }
        }

        report.batch = self.delivery.process_batch(approved).await;
        info!(
            tenant = %tenant_id,
            candidates = report.candidates,
            created = report.alerts_created,
            suppressed = report.suppressed,
            delivered = report.batch.delivered.len(),
            "scan complete"
        );
        Ok(report)
    }

    /// Evaluate one (drift event, rule) pair: score, create-or-get,
    /// suppression check. Safe under concurrent evaluation of the same
    /// pair; exactly one alert event survives.
    pub fn evaluate_pair(
        &self,
        drift: &DriftEvent,
        rule: &AlertRule,
    ) -> Result<PairOutcome, PipelineError> {
        let now = Utc::now();
        let fingerprint = Fingerprint::new(
            &self.product,
            drift.signal,
            &drift.entity,
            drift.sub_dimension.as_deref(),
        );

        let breakdown = confidence::score(&ConfidenceInputs {
            sample_count: drift.sample_count,
            baseline_mean: drift.baseline_value,
            current_mean: drift.current_value,
            baseline_std: drift.baseline_std,
            consecutive_days: self.store.consecutive_trigger_days(&fingerprint, now)?,
            historical_real_ratio: self.store.historical_real_ratio(&fingerprint)?,
        });

        let payload = AlertPayload {
            entity: drift.entity.clone(),
            // The rule's configured severity acts as a floor under the
            // detector's magnitude-derived one
            severity: drift.severity.max(rule.severity),
            evidence: drift.evidence.clone(),
            confidence: breakdown,
        };

        let (alert, created) = self
            .store
            .create_or_get(drift, rule, payload, &fingerprint)?;
        if !created {
            debug!(alert = %alert.id, "pair already evaluated elsewhere");
            return Ok(PairOutcome::Duplicate);
        }

        let mut similar = self.store.recent_similar(&fingerprint, now)?;
        similar.retain(|a| a.id != alert.id);
        let similar_ids: Vec<Uuid> = similar.iter().map(|a| a.id).collect();
        let judgments = self.store.judgments_for(&similar_ids)?;

        match self.suppression.should_suppress(&alert, &similar, &judgments, now) {
            Decision::Suppress { reason, until } => {
                info!(alert = %alert.id, %reason, until = %until, "alert suppressed");
                self.store.update_status(alert.id, AlertStatus::Suppressed)?;
                Ok(PairOutcome::Suppressed)
            }
            Decision::ForceDeliver { reason } => {
                info!(alert = %alert.id, %reason, "forced delivery");
                Ok(PairOutcome::Created(alert))
            }
            Decision::Deliver => Ok(PairOutcome::Created(alert)),
        }
    }

    /// Operator feedback intake. The store rejects verdicts for alerts
    /// outside the caller's tenant, unknown alerts, and duplicate
    /// (operator, alert) submissions.
    pub fn submit_judgment(
        &self,
        tenant_id: Uuid,
        operator_id: Uuid,
        alert_event_id: Uuid,
        verdict: Verdict,
        recovered_amount: Option<f64>,
    ) -> Result<(), PipelineError> {
        let judgment = OperatorJudgment::new(
            alert_event_id,
            tenant_id,
            operator_id,
            verdict,
            recovered_amount,
        );
        self.store.add_judgment(judgment)?;
        if verdict == Verdict::Noise {
            debug!(alert = %alert_event_id, "noise verdict recorded for suppression learning");
        }
        Ok(())
    }

    /// Re-drive dead-lettered deliveries whose backoff has elapsed
    pub async fn sweep_dead_letters(&self) -> delivery::SweepOutcome {
        self.delivery.sweep_dead_letters().await
    }

    /// Re-batch alerts still `pending`: deliveries deferred by a rate
    /// limit or an open circuit never reach the dead-letter path, so
    /// this is their scheduled retry. Run it alongside the dead-letter
    /// sweep.
    pub async fn redrive_pending(&self) -> Result<BatchOutcome, PipelineError> {
        let pending = self.store.alerts_by_status(AlertStatus::Pending)?;
        if pending.is_empty() {
            return Ok(BatchOutcome::default());
        }
        info!(count = pending.len(), "re-driving pending alerts");
        Ok(self.delivery.process_batch(pending).await)
    }

    pub fn store(&self) -> &Arc<AlertStore> {
        &self.store
    }

    pub fn delivery(&self) -> &DeliveryEngine {
        &self.delivery
    }
}

/// Result of evaluating one (drift event, rule) pair
#[derive(Debug)]
pub enum PairOutcome {
    Created(AlertEvent),
    Suppressed,
    Duplicate,
}

/// Magnitude compared against rule thresholds. Composite scores are
/// already a decision value; other signals use the absolute delta.
fn delta_magnitude(drift: &DriftEvent) -> f64 {
    match drift.signal {
        SignalType::PayerComposite => drift.current_value,
        _ => drift.delta.abs(),
    }
}
