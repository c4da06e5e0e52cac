//! Structured alert payloads
//!
//! Each detector emits one evidence variant, so downstream code gets
//! compile-time guarantees about which fields exist instead of runtime
//! lookups into loose JSON.

use crate::signal::{Severity, SignalType};
use serde::{Deserialize, Serialize};

/// Evidence attached to an alert, tagged by originating signal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "signal", rename_all = "snake_case")]
pub enum SignalEvidence {
    DenialRate {
        baseline_rate: f64,
        current_rate: f64,
        /// Signed: positive means denials went up
        delta: f64,
        sample_count: u64,
    },
    Underpayment {
        baseline_paid: f64,
        current_paid: f64,
        /// Signed: negative means payments shrank
        delta: f64,
        sample_count: u64,
    },
    PaymentDelay {
        baseline_days: f64,
        current_days: f64,
        delta_days: f64,
        delta_pct: f64,
        sample_count: u64,
    },
    AuthFailure {
        baseline_rate: f64,
        current_rate: f64,
        delta: f64,
        sample_count: u64,
    },
    PayerComposite {
        composite_score: f64,
        denial_delta: f64,
        payment_delta: f64,
        approval_delta: f64,
        processing_delta: f64,
    },
}

impl SignalEvidence {
    pub fn signal_type(&self) -> SignalType {
        match self {
            SignalEvidence::DenialRate { .. } => SignalType::DenialRate,
            SignalEvidence::Underpayment { .. } => SignalType::Underpayment,
            SignalEvidence::PaymentDelay { .. } => SignalType::PaymentDelay,
            SignalEvidence::AuthFailure { .. } => SignalType::AuthFailure,
            SignalEvidence::PayerComposite { .. } => SignalType::PayerComposite,
        }
    }
}

/// Per-factor confidence breakdown, stored alongside the aggregate
/// so decisions stay auditable
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceBreakdown {
    pub sample_size: f64,
    pub significance: f64,
    pub stability: f64,
    pub persistence: f64,
    pub historical: f64,
    /// Weighted average of the five factors
    pub score: f64,
}

/// Full payload carried by an alert event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertPayload {
    pub entity: String,
    pub severity: Severity,
    pub evidence: SignalEvidence,
    pub confidence: ConfidenceBreakdown,
}
