//! Dead-letter entries
//!
//! Snapshot of a failed delivery attempt. Mutated on each retry, never
//! deleted (forensics).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeadLetterStatus {
    Pending,
    Retrying,
    /// Retries used up; requires manual intervention
    Exhausted,
    /// A later retry succeeded
    Recovered,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeadLetterEntry {
    pub id: Uuid,
    pub alert_event_id: Uuid,
    pub tenant_id: Uuid,
    pub failure_reason: String,
    pub retry_count: u32,
    pub next_retry_at: DateTime<Utc>,
    pub status: DeadLetterStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DeadLetterEntry {
    pub fn new(
        alert_event_id: Uuid,
        tenant_id: Uuid,
        failure_reason: impl Into<String>,
        next_retry_at: DateTime<Utc>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            alert_event_id,
            tenant_id,
            failure_reason: failure_reason.into(),
            retry_count: 0,
            next_retry_at,
            status: DeadLetterStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        matches!(
            self.status,
            DeadLetterStatus::Pending | DeadLetterStatus::Retrying
        ) && self.next_retry_at <= now
    }
}
