//! Claim data source interface
//!
//! The engine consumes read-only aggregated query results, grouped per
//! entity per time window. It never touches raw claim records.

use alert_model::SignalType;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Half-open time window `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }
}

/// Aggregate statistics for one (entity, sub-dimension) in one window.
/// Records with missing fields are excluded upstream; `count` reflects
/// only the records that contributed to `mean`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowAggregate {
    pub entity: String,
    pub sub_dimension: Option<String>,
    pub mean: f64,
    pub count: u64,
    pub std_dev: f64,
}

impl WindowAggregate {
    pub fn new(entity: impl Into<String>, mean: f64, count: u64, std_dev: f64) -> Self {
        Self {
            entity: entity.into(),
            sub_dimension: None,
            mean,
            count,
            std_dev,
        }
    }

    pub fn with_sub_dimension(mut self, sub: impl Into<String>) -> Self {
        self.sub_dimension = Some(sub.into());
        self
    }
}

/// Claim source errors
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("source unavailable: {0}")]
    Unavailable(String),
    #[error("query failed: {0}")]
    Query(String),
}

/// Read-only window-aggregate provider backed by the claim store
#[async_trait]
pub trait ClaimSource: Send + Sync {
    /// Aggregates for one signal over one window, one row per
    /// (entity, sub-dimension). An unreachable source returns an error;
    /// an empty result means no data, not failure.
    async fn aggregates(
        &self,
        tenant_id: Uuid,
        signal: SignalType,
        window: TimeWindow,
    ) -> Result<Vec<WindowAggregate>, SourceError>;
}
