//! Drift events
//!
//! One detected shift for one tenant, one payer/entity, one signal
//! dimension, one window pair. Immutable once created.

use crate::payload::SignalEvidence;
use crate::signal::{Severity, SignalType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriftEvent {
    pub id: Uuid,
    pub tenant_id: Uuid,
    /// Payer or entity label, e.g. "Aetna"
    pub entity: String,
    /// Optional sub-dimension, e.g. a CPT code group
    pub sub_dimension: Option<String>,
    pub signal: SignalType,
    pub baseline_value: f64,
    pub current_value: f64,
    /// Signed delta: direction matters for severity mapping
    pub delta: f64,
    pub sample_count: u64,
    pub baseline_std: f64,
    pub severity: Severity,
    pub evidence: SignalEvidence,
    pub detected_at: DateTime<Utc>,
}

impl DriftEvent {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        tenant_id: Uuid,
        entity: impl Into<String>,
        sub_dimension: Option<String>,
        signal: SignalType,
        baseline_value: f64,
        current_value: f64,
        sample_count: u64,
        baseline_std: f64,
        severity: Severity,
        evidence: SignalEvidence,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            tenant_id,
            entity: entity.into(),
            sub_dimension,
            signal,
            baseline_value,
            current_value,
            delta: current_value - baseline_value,
            sample_count,
            baseline_std,
            severity,
            evidence,
            detected_at: Utc::now(),
        }
    }
}
