//! Batch delivery engine
//!
//! A bounded worker pool processes pending alerts concurrently. Each
//! alert is isolated: its own rate-limit check, circuit-breaker check,
//! delivery timeout, and failure handling. The batch returns a partition
//! of outcomes rather than a single pass/fail.

use crate::backoff::RetryPolicy;
use crate::breaker::CircuitBreaker;
use crate::channel::ChannelRegistry;
use crate::limiter::{LimitDimension, RateLimitConfig, RateLimiter};
use alert_model::{AlertEvent, AlertStatus, ChannelBinding, DeadLetterEntry, DeadLetterStatus};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use storage::AlertStore;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryConfig {
    /// Worker pool size for batch processing
    pub max_concurrency: usize,
    /// Per-alert delivery timeout; one slow channel call cannot stall
    /// the rest of the batch
    pub per_alert_timeout_ms: u64,
    pub breaker_failure_threshold: u32,
    pub breaker_cooldown_secs: u64,
    pub retry: RetryPolicy,
    pub rate_limit: RateLimitConfig,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 8,
            per_alert_timeout_ms: 30_000,
            breaker_failure_threshold: 5,
            breaker_cooldown_secs: 300,
            retry: RetryPolicy::default(),
            rate_limit: RateLimitConfig::default(),
        }
    }
}

/// Outcome for one alert
#[derive(Debug, Clone, PartialEq)]
pub enum DeliveryOutcome {
    Delivered,
    Failed(String),
    RateLimited(LimitDimension),
    CircuitOpen(ChannelBinding),
}

/// Partition of a processed batch
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub delivered: Vec<Uuid>,
    pub failed: Vec<(Uuid, String)>,
    pub rate_limited: Vec<(Uuid, LimitDimension)>,
    pub circuit_open: Vec<Uuid>,
}

/// Result of one dead-letter sweep
#[derive(Debug, Default)]
pub struct SweepOutcome {
    pub recovered: Vec<Uuid>,
    pub still_failing: Vec<Uuid>,
    pub exhausted: Vec<Uuid>,
}

/// Cheap-to-clone handle; workers share the breakers, limiter, and
/// store through the inner state
#[derive(Clone)]
pub struct DeliveryEngine {
    inner: Arc<EngineInner>,
}

struct EngineInner {
    store: Arc<AlertStore>,
    channels: ChannelRegistry,
    /// One breaker per channel type, shared across workers
    breakers: HashMap<ChannelBinding, Arc<CircuitBreaker>>,
    limiter: RateLimiter,
    config: DeliveryConfig,
}

impl DeliveryEngine {
    pub fn new(store: Arc<AlertStore>, channels: ChannelRegistry, config: DeliveryConfig) -> Self {
        let breakers = channels
            .bindings()
            .map(|binding| {
                (
                    binding.clone(),
                    Arc::new(CircuitBreaker::new(
                        config.breaker_failure_threshold,
                        Duration::from_secs(config.breaker_cooldown_secs),
                    )),
                )
            })
            .collect();
        let limiter = RateLimiter::new(config.rate_limit.clone());
        Self {
            inner: Arc::new(EngineInner {
                store,
                channels,
                breakers,
                limiter,
                config,
            }),
        }
    }

    pub fn breaker(&self, binding: &ChannelBinding) -> Option<Arc<CircuitBreaker>> {
        self.inner.breakers.get(binding).cloned()
    }

    /// Process a batch of alerts with bounded concurrency. No ordering
    /// is guaranteed across alerts; each one succeeds or fails alone.
    pub async fn process_batch(&self, alerts: Vec<AlertEvent>) -> BatchOutcome {
        let semaphore = Arc::new(Semaphore::new(self.inner.config.max_concurrency));
        let mut tasks = JoinSet::new();

        for alert in alerts {
            let engine = self.clone();
            let semaphore = Arc::clone(&semaphore);
            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await;
                let id = alert.id;
                (id, engine.deliver_one(&alert).await)
            });
        }

        let mut outcome = BatchOutcome::default();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((id, DeliveryOutcome::Delivered)) => outcome.delivered.push(id),
                Ok((id, DeliveryOutcome::Failed(reason))) => outcome.failed.push((id, reason)),
                Ok((id, DeliveryOutcome::RateLimited(dim))) => {
                    outcome.rate_limited.push((id, dim))
                }
                Ok((id, DeliveryOutcome::CircuitOpen(_))) => outcome.circuit_open.push(id),
                Err(e) => error!(error = %e, "delivery task panicked"),
            }
        }

        info!(
            delivered = outcome.delivered.len(),
            failed = outcome.failed.len(),
            rate_limited = outcome.rate_limited.len(),
            circuit_open = outcome.circuit_open.len(),
            "batch processed"
        );
        outcome
    }

    /// Deliver a single alert. Re-processing an already-sent alert is a
    /// successful no-op, never a duplicate send.
    pub async fn deliver_one(&self, alert: &AlertEvent) -> DeliveryOutcome {
        let current = match self.inner.store.get_alert(alert.id) {
            Ok(current) => current,
            Err(e) => return DeliveryOutcome::Failed(format!("alert lookup failed: {e}")),
        };
        if matches!(
            current.status,
            AlertStatus::Sent | AlertStatus::Acknowledged | AlertStatus::Resolved
        ) {
            debug!(alert = %alert.id, "already delivered, no-op");
            return DeliveryOutcome::Delivered;
        }

        let rule = match self.inner.store.get_rule(current.rule_id) {
            Ok(rule) => rule,
            Err(e) => return DeliveryOutcome::Failed(format!("rule lookup failed: {e}")),
        };

        let channel = match self.inner.channels.get(&rule.channel) {
            Some(channel) => channel,
            None => {
                return DeliveryOutcome::Failed(format!(
                    "no channel registered for {:?}",
                    rule.channel
                ))
            }
        };
        let breaker = match self.inner.breakers.get(&rule.channel) {
            Some(breaker) => breaker,
            None => return DeliveryOutcome::Failed("breaker missing for channel".to_string()),
        };

        // Checked before the limiter: an open circuit rejects without
        // consuming any of the tenant's rate budget
        if breaker.try_acquire().is_err() {
            debug!(alert = %alert.id, channel = ?rule.channel, "circuit open, delivery deferred");
            return DeliveryOutcome::CircuitOpen(rule.channel.clone());
        }

        let signal = current.payload.evidence.signal_type();
        if let Err(dimension) =
            self.inner.limiter
                .try_acquire(current.tenant_id, current.payload.severity, signal)
        {
            return DeliveryOutcome::RateLimited(dimension);
        }

        let attempt = timeout(
            Duration::from_millis(self.inner.config.per_alert_timeout_ms),
            channel.deliver(&current),
        )
        .await;

        match attempt {
            Ok(Ok(())) => {
                breaker.record_success();
                if let Err(e) = self.inner.store.update_status(current.id, AlertStatus::Sent) {
                    return DeliveryOutcome::Failed(format!("status update failed: {e}"));
                }
                debug!(alert = %alert.id, "delivered");
                DeliveryOutcome::Delivered
            }
            Ok(Err(e)) => {
                breaker.record_failure();
                self.handle_failure(&current, e.to_string())
            }
            Err(_) => {
                breaker.record_failure();
                self.handle_failure(
                    &current,
                    format!("timed out after {}ms", self.inner.config.per_alert_timeout_ms),
                )
            }
        }
    }

    /// Record the failure, move the alert to `failed`, and create or
    /// advance its dead-letter entry with exponential backoff.
    fn handle_failure(&self, alert: &AlertEvent, reason: String) -> DeliveryOutcome {
        let now = Utc::now();
        if let Err(e) = self.inner.store.record_delivery_error(alert.id, reason.clone()) {
            return DeliveryOutcome::Failed(format!("error bookkeeping failed: {e}"));
        }
        if alert.status == AlertStatus::Pending {
            if let Err(e) = self.inner.store.update_status(alert.id, AlertStatus::Failed) {
                return DeliveryOutcome::Failed(format!("status update failed: {e}"));
            }
        }

        let result = match self.inner.store.dead_letter_for_alert(alert.id) {
            Ok(Some(mut entry)) => {
                entry.retry_count += 1;
                entry.failure_reason = reason.clone();
                entry.updated_at = now;
                if self.inner.config.retry.is_exhausted(entry.retry_count) {
                    warn!(
                        alert = %alert.id,
                        attempts = entry.retry_count + 1,
                        "delivery retries exhausted, manual intervention required"
                    );
                    entry.status = DeadLetterStatus::Exhausted;
                } else {
                    entry.status = DeadLetterStatus::Retrying;
                    entry.next_retry_at = now + self.inner.config.retry.delay_for(entry.retry_count);
                }
                self.inner.store.update_dead_letter(entry)
            }
            Ok(None) => {
                let entry = DeadLetterEntry::new(
                    alert.id,
                    alert.tenant_id,
                    reason.clone(),
                    now + self.inner.config.retry.delay_for(0),
                );
                self.inner.store.push_dead_letter(entry)
            }
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            return DeliveryOutcome::Failed(format!("dead-letter bookkeeping failed: {e}"));
        }

        DeliveryOutcome::Failed(reason)
    }

    /// Re-attempt dead-letter entries whose retry time has passed.
    /// Exhausting retries marks the entry, never discards it.
    pub async fn sweep_dead_letters(&self) -> SweepOutcome {
        let now = Utc::now();
        let due = match self.inner.store.due_dead_letters(now) {
            Ok(due) => due,
            Err(e) => {
                error!(error = %e, "dead-letter sweep query failed");
                return SweepOutcome::default();
            }
        };

        let mut outcome = SweepOutcome::default();
        for mut entry in due {
            let alert = match self.inner.store.get_alert(entry.alert_event_id) {
                Ok(alert) => alert,
                Err(e) => {
                    error!(entry = %entry.id, error = %e, "dead-letter points at missing alert");
                    continue;
                }
            };

            // Someone else already delivered it
            if matches!(
                alert.status,
                AlertStatus::Sent | AlertStatus::Acknowledged | AlertStatus::Resolved
            ) {
                entry.status = DeadLetterStatus::Recovered;
                entry.updated_at = now;
                if let Err(e) = self.inner.store.update_dead_letter(entry.clone()) {
                    error!(entry = %entry.id, error = %e, "dead-letter update failed");
                }
                outcome.recovered.push(entry.alert_event_id);
                continue;
            }

            match self.deliver_one(&alert).await {
                DeliveryOutcome::Delivered => {
                    entry.status = DeadLetterStatus::Recovered;
                    entry.updated_at = now;
                    if let Err(e) = self.inner.store.update_dead_letter(entry.clone()) {
                        error!(entry = %entry.id, error = %e, "dead-letter update failed");
                    }
                    info!(alert = %entry.alert_event_id, "dead-letter recovered");
                    outcome.recovered.push(entry.alert_event_id);
                }
                DeliveryOutcome::Failed(_) => {
                    // handle_failure already advanced the entry
                    match self.inner.store.dead_letter_for_alert(entry.alert_event_id) {
                        Ok(Some(updated)) if updated.status == DeadLetterStatus::Exhausted => {
                            outcome.exhausted.push(entry.alert_event_id)
                        }
                        _ => outcome.still_failing.push(entry.alert_event_id),
                    }
                }
                DeliveryOutcome::RateLimited(_) | DeliveryOutcome::CircuitOpen(_) => {
                    // Deferred, picked up by a later sweep
                    outcome.still_failing.push(entry.alert_event_id);
                }
            }
        }
        outcome
    }
}
