//! Core Data Model
//!
//! Shared types for the payer drift engine:
//! - Signal types, severities, and detected drift events
//! - Tenant alert rules and the alert event lifecycle
//! - Structured signal payloads with confidence breakdowns
//! - Fingerprints for suppression and historical learning
//! - Operator judgments and dead-letter entries

mod alert;
mod deadletter;
mod drift;
mod fingerprint;
mod judgment;
mod payload;
mod rule;
mod signal;

pub use alert::{AlertEvent, AlertStatus};
pub use deadletter::{DeadLetterEntry, DeadLetterStatus};
pub use drift::DriftEvent;
pub use fingerprint::Fingerprint;
pub use judgment::{OperatorJudgment, Verdict};
pub use payload::{AlertPayload, ConfidenceBreakdown, SignalEvidence};
pub use rule::{AlertRule, ChannelBinding};
pub use signal::{Severity, SignalType};

use thiserror::Error;

/// Model-level errors
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("invalid status transition: {from} -> {to}")]
    InvalidTransition { from: AlertStatus, to: AlertStatus },
    #[error("validation failed: {0}")]
    Validation(String),
}
