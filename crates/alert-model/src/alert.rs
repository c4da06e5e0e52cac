//! Alert events and their lifecycle state machine

use crate::payload::AlertPayload;
use crate::ModelError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Alert lifecycle states
///
/// ```text
/// pending -> sent | failed | suppressed
/// sent    -> acknowledged -> resolved
/// failed  -> pending (retry) | sent (recovered via DLQ)
/// ```
/// `suppressed` and `resolved` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertStatus {
    Pending,
    Sent,
    Failed,
    Suppressed,
    Acknowledged,
    Resolved,
}

impl AlertStatus {
    pub fn can_transition_to(&self, to: AlertStatus) -> bool {
        use AlertStatus::*;
        matches!(
            (*self, to),
            (Pending, Sent)
                | (Pending, Failed)
                | (Pending, Suppressed)
                | (Sent, Acknowledged)
                | (Acknowledged, Resolved)
                | (Failed, Pending)
                | (Failed, Sent)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, AlertStatus::Suppressed | AlertStatus::Resolved)
    }
}

impl fmt::Display for AlertStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AlertStatus::Pending => "pending",
            AlertStatus::Sent => "sent",
            AlertStatus::Failed => "failed",
            AlertStatus::Suppressed => "suppressed",
            AlertStatus::Acknowledged => "acknowledged",
            AlertStatus::Resolved => "resolved",
        };
        f.write_str(s)
    }
}

/// The unit of delivery. Exactly one exists per (drift event, rule) pair;
/// the storage layer enforces that invariant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertEvent {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub drift_event_id: Uuid,
    pub rule_id: Uuid,
    pub status: AlertStatus,
    pub payload: AlertPayload,
    pub created_at: DateTime<Utc>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl AlertEvent {
    pub fn new(tenant_id: Uuid, drift_event_id: Uuid, rule_id: Uuid, payload: AlertPayload) -> Self {
        Self {
            id: Uuid::new_v4(),
            tenant_id,
            drift_event_id,
            rule_id,
            status: AlertStatus::Pending,
            payload,
            created_at: Utc::now(),
            delivered_at: None,
            last_error: None,
            resolved_at: None,
        }
    }

    /// Apply a status transition, rejecting invalid ones and keeping
    /// prior state on rejection.
    pub fn transition(&mut self, to: AlertStatus) -> Result<(), ModelError> {
        if !self.status.can_transition_to(to) {
            return Err(ModelError::InvalidTransition {
                from: self.status,
                to,
            });
        }
        if to == AlertStatus::Sent {
            self.delivered_at = Some(Utc::now());
            self.last_error = None;
        }
        if to == AlertStatus::Resolved {
            self.resolved_at = Some(Utc::now());
        }
        self.status = to;
        Ok(())
    }
}
