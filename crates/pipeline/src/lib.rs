//! Alert Pipeline
//!
//! Wires the engine together: detection runs produce drift events, rules
//! turn them into idempotently created alert events, the suppression
//! engine filters learned noise, and the delivery engine ships what
//! remains. Operator feedback enters here and flows back into
//! suppression and confidence scoring.

mod config;
mod orchestrator;

pub use config::EngineConfig;
pub use orchestrator::{AlertPipeline, PairOutcome, ScanReport};

use drift_detect::DetectError;
use storage::StorageError;
use thiserror::Error;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Install the global tracing subscriber. Call once at startup.
pub fn init_logging() -> Result<(), PipelineError> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(true)
        .json()
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| PipelineError::Config(format!("tracing init failed: {e}")))
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Detect(#[from] DetectError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("configuration error: {0}")]
    Config(String),
}
