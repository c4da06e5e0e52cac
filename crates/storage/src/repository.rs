//! Repository Implementation
//!
//! In-memory store behind the abstract-store boundary. A single mutex
//! guards all tables, so the get-or-create path is atomic by
//! construction; the `(drift_event_id, rule_id)` index is the uniqueness
//! constraint on alert events.

use crate::StorageError;
use alert_model::{
    AlertEvent, AlertPayload, AlertRule, AlertStatus, DeadLetterEntry, DeadLetterStatus,
    DriftEvent, Fingerprint, OperatorJudgment, Verdict,
};
use chrono::{DateTime, Duration, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Suppression lookback horizon for "similar" alerts
const SIMILAR_LOOKBACK_DAYS: i64 = 30;
/// Bounded cost: only the most recent similar alerts are consulted
const SIMILAR_CAP: usize = 10;

#[derive(Default)]
struct Inner {
    drift_events: HashMap<Uuid, DriftEvent>,
    rules: HashMap<Uuid, AlertRule>,
    alerts: HashMap<Uuid, AlertEvent>,
    /// Uniqueness constraint: (drift_event_id, rule_id) -> alert id
    pair_index: HashMap<(Uuid, Uuid), Uuid>,
    /// Fingerprint key -> alert ids in creation order
    by_fingerprint: HashMap<String, Vec<Uuid>>,
    judgments: Vec<OperatorJudgment>,
    /// One judgment per operator per alert
    judged: HashSet<(Uuid, Uuid)>,
    dead_letters: HashMap<Uuid, DeadLetterEntry>,
}

/// Repository for the alert lifecycle
pub struct AlertStore {
    inner: Mutex<Inner>,
}

impl AlertStore {
    pub fn new() -> Self {
        info!("creating in-memory alert store");
        Self {
            inner: Mutex::new(Inner::default()),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Inner>, StorageError> {
        self.inner
            .lock()
            .map_err(|e| StorageError::DatabaseError(format!("lock poisoned: {e}")))
    }

    // ---- drift events & rules ----

    pub fn insert_drift_event(&self, event: DriftEvent) -> Result<(), StorageError> {
        self.lock()?.drift_events.insert(event.id, event);
        Ok(())
    }

    pub fn get_drift_event(&self, id: Uuid) -> Result<DriftEvent, StorageError> {
        self.lock()?
            .drift_events
            .get(&id)
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    pub fn upsert_rule(&self, rule: AlertRule) -> Result<(), StorageError> {
        self.lock()?.rules.insert(rule.id, rule);
        Ok(())
    }

    pub fn get_rule(&self, id: Uuid) -> Result<AlertRule, StorageError> {
        self.lock()?
            .rules
            .get(&id)
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    /// Enabled rules for one tenant, all signals
    pub fn rules_for_tenant(&self, tenant_id: Uuid) -> Result<Vec<AlertRule>, StorageError> {
        Ok(self
            .lock()?
            .rules
            .values()
            .filter(|r| r.tenant_id == tenant_id && r.enabled)
            .cloned()
            .collect())
    }

    // ---- alert events ----

    /// Atomic get-or-create for the (drift event, rule) pair.
    ///
    /// Returns the alert plus `created = true` when this call inserted
    /// it. A caller losing the race gets the winner's row back, never an
    /// error.
    pub fn create_or_get(
        &self,
        drift: &DriftEvent,
        rule: &AlertRule,
        payload: AlertPayload,
        fingerprint: &Fingerprint,
    ) -> Result<(AlertEvent, bool), StorageError> {
        let mut inner = self.lock()?;
        let key = (drift.id, rule.id);

        if let Some(existing_id) = inner.pair_index.get(&key) {
            let existing = inner
                .alerts
                .get(existing_id)
                .cloned()
                .ok_or_else(|| {
                    StorageError::DatabaseError("pair index points at missing alert".into())
                })?;
            debug!(alert = %existing.id, "alert already exists for pair");
            return Ok((existing, false));
        }

        let alert = AlertEvent::new(drift.tenant_id, drift.id, rule.id, payload);
        inner.pair_index.insert(key, alert.id);
        inner
            .by_fingerprint
            .entry(fingerprint.key())
            .or_default()
            .push(alert.id);
        inner.alerts.insert(alert.id, alert.clone());
        debug!(alert = %alert.id, fingerprint = %fingerprint, "alert created");
        Ok((alert, true))
    }

    pub fn get_alert(&self, id: Uuid) -> Result<AlertEvent, StorageError> {
        self.lock()?
            .alerts
            .get(&id)
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    /// Apply a status transition under the store lock. Invalid
    /// transitions are rejected and leave the row untouched.
    pub fn update_status(
        &self,
        id: Uuid,
        to: AlertStatus,
    ) -> Result<AlertEvent, StorageError> {
        let mut inner = self.lock()?;
        let alert = inner.alerts.get_mut(&id).ok_or(StorageError::NotFound)?;
        alert.transition(to)?;
        Ok(alert.clone())
    }

    pub fn record_delivery_error(
        &self,
        id: Uuid,
        error: impl Into<String>,
    ) -> Result<(), StorageError> {
        let mut inner = self.lock()?;
        let alert = inner.alerts.get_mut(&id).ok_or(StorageError::NotFound)?;
        alert.last_error = Some(error.into());
        Ok(())
    }

    /// Alert events are an audit trail. Always rejected.
    pub fn delete_alert(&self, id: Uuid) -> Result<(), StorageError> {
        warn!(alert = %id, "rejected attempt to delete alert event");
        Err(StorageError::DeletionRejected)
    }

    pub fn alerts_by_status(&self, status: AlertStatus) -> Result<Vec<AlertEvent>, StorageError> {
        let mut alerts: Vec<_> = self
            .lock()?
            .alerts
            .values()
            .filter(|a| a.status == status)
            .cloned()
            .collect();
        alerts.sort_by_key(|a| a.created_at);
        Ok(alerts)
    }

    /// Recent alerts sharing a fingerprint, newest first, capped for
    /// bounded lookup cost
    pub fn recent_similar(
        &self,
        fingerprint: &Fingerprint,
        now: DateTime<Utc>,
    ) -> Result<Vec<AlertEvent>, StorageError> {
        let inner = self.lock()?;
        let cutoff = now - Duration::days(SIMILAR_LOOKBACK_DAYS);
        let ids = match inner.by_fingerprint.get(&fingerprint.key()) {
            Some(ids) => ids,
            None => return Ok(Vec::new()),
        };
        let mut similar: Vec<_> = ids
            .iter()
            .filter_map(|id| inner.alerts.get(id))
            .filter(|a| a.created_at >= cutoff)
            .cloned()
            .collect();
        similar.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        similar.truncate(SIMILAR_CAP);
        Ok(similar)
    }

    /// Consecutive calendar days (ending today) on which this
    /// fingerprint produced an alert
    pub fn consecutive_trigger_days(
        &self,
        fingerprint: &Fingerprint,
        now: DateTime<Utc>,
    ) -> Result<u32, StorageError> {
        let inner = self.lock()?;
        let days: HashSet<_> = inner
            .by_fingerprint
            .get(&fingerprint.key())
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| inner.alerts.get(id))
                    .map(|a| a.created_at.date_naive())
                    .collect()
            })
            .unwrap_or_default();

        let mut streak = 0u32;
        let mut day = now.date_naive();
        while days.contains(&day) {
            streak += 1;
            day -= Duration::days(1);
        }
        Ok(streak)
    }

    // ---- operator judgments ----

    /// Append a judgment. Rejects cross-tenant submissions, unknown
    /// alerts, and duplicate (operator, alert) pairs.
    pub fn add_judgment(&self, judgment: OperatorJudgment) -> Result<(), StorageError> {
        let mut inner = self.lock()?;
        let alert = inner
            .alerts
            .get(&judgment.alert_event_id)
            .ok_or(StorageError::NotFound)?;
        if alert.tenant_id != judgment.tenant_id {
            return Err(StorageError::TenantMismatch);
        }
        let key = (judgment.operator_id, judgment.alert_event_id);
        if !inner.judged.insert(key) {
            return Err(StorageError::DuplicateJudgment);
        }
        inner.judgments.push(judgment);
        Ok(())
    }

    /// Judgments attached to any of the given alerts
    pub fn judgments_for(&self, alert_ids: &[Uuid]) -> Result<Vec<OperatorJudgment>, StorageError> {
        let wanted: HashSet<_> = alert_ids.iter().collect();
        Ok(self
            .lock()?
            .judgments
            .iter()
            .filter(|j| wanted.contains(&j.alert_event_id))
            .cloned()
            .collect())
    }

    /// Fraction of judged same-fingerprint alerts marked "real".
    /// `None` with zero history, so the scorer keeps its unbiased prior.
    pub fn historical_real_ratio(
        &self,
        fingerprint: &Fingerprint,
    ) -> Result<Option<f64>, StorageError> {
        let inner = self.lock()?;
        let ids: HashSet<_> = match inner.by_fingerprint.get(&fingerprint.key()) {
            Some(ids) => ids.iter().collect(),
            None => return Ok(None),
        };
        let mut total = 0u32;
        let mut real = 0u32;
        for j in &inner.judgments {
            if ids.contains(&j.alert_event_id) {
                total += 1;
                if j.verdict == Verdict::Real {
                    real += 1;
                }
            }
        }
        if total == 0 {
            return Ok(None);
        }
        Ok(Some(real as f64 / total as f64))
    }

    /// Total recovered dollars across a tenant's judgments
    pub fn recovered_total(&self, tenant_id: Uuid) -> Result<f64, StorageError> {
        Ok(self
            .lock()?
            .judgments
            .iter()
            .filter(|j| j.tenant_id == tenant_id)
            .filter_map(|j| j.recovered_amount)
            .sum())
    }

    // ---- dead letters ----

    pub fn push_dead_letter(&self, entry: DeadLetterEntry) -> Result<(), StorageError> {
        self.lock()?.dead_letters.insert(entry.id, entry);
        Ok(())
    }

    pub fn update_dead_letter(&self, entry: DeadLetterEntry) -> Result<(), StorageError> {
        let mut inner = self.lock()?;
        if !inner.dead_letters.contains_key(&entry.id) {
            return Err(StorageError::NotFound);
        }
        inner.dead_letters.insert(entry.id, entry);
        Ok(())
    }

    pub fn dead_letter_for_alert(
        &self,
        alert_id: Uuid,
    ) -> Result<Option<DeadLetterEntry>, StorageError> {
        Ok(self
            .lock()?
            .dead_letters
            .values()
            .find(|d| d.alert_event_id == alert_id)
            .cloned())
    }

    /// Entries whose next retry time has passed
    pub fn due_dead_letters(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<DeadLetterEntry>, StorageError> {
        let mut due: Vec<_> = self
            .lock()?
            .dead_letters
            .values()
            .filter(|d| d.is_due(now))
            .cloned()
            .collect();
        due.sort_by_key(|d| d.next_retry_at);
        Ok(due)
    }

    pub fn dead_letters_by_status(
        &self,
        status: DeadLetterStatus,
    ) -> Result<Vec<DeadLetterEntry>, StorageError> {
        Ok(self
            .lock()?
            .dead_letters
            .values()
            .filter(|d| d.status == status)
            .cloned()
            .collect())
    }
}

impl Default for AlertStore {
    fn default() -> Self {
        Self::new()
    }
}
