//! Operator judgments
//!
//! Human verdicts on delivered alerts. Append-only: never mutated after
//! creation, one judgment per operator per alert.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// False positive, learned by the suppression engine
    Noise,
    /// Confirmed real payer behavior change
    Real,
    /// Inconclusive, needs investigation
    FollowUp,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperatorJudgment {
    pub id: Uuid,
    pub alert_event_id: Uuid,
    pub tenant_id: Uuid,
    pub operator_id: Uuid,
    pub verdict: Verdict,
    /// Dollars recovered as a result of acting on the alert
    pub recovered_amount: Option<f64>,
    pub created_at: DateTime<Utc>,
}

impl OperatorJudgment {
    pub fn new(
        alert_event_id: Uuid,
        tenant_id: Uuid,
        operator_id: Uuid,
        verdict: Verdict,
        recovered_amount: Option<f64>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            alert_event_id,
            tenant_id,
            operator_id,
            verdict,
            recovered_amount,
            created_at: Utc::now(),
        }
    }
}
