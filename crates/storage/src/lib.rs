//! Storage Layer
//!
//! Repository over the engine's persisted state: drift events, rules,
//! alert events, operator judgments, and dead letters. The
//! `(drift_event, rule)` uniqueness constraint on alert events lives
//! here and is load-bearing for correctness, not an optimization.

mod repository;

pub use repository::AlertStore;

use alert_model::ModelError;
use thiserror::Error;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    DatabaseError(String),
    #[error("record not found")]
    NotFound,
    #[error("alert events are append-only; deletion rejected")]
    DeletionRejected,
    #[error("judgment already recorded for this operator and alert")]
    DuplicateJudgment,
    #[error("alert does not belong to the caller's tenant")]
    TenantMismatch,
    #[error(transparent)]
    Model(#[from] ModelError),
}
