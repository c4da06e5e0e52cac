//! Signal Detection
//!
//! Compares a rolling baseline window against a current window per payer
//! and behavioral dimension, emitting candidate drift events when a
//! threshold is crossed. Detectors are pure given window aggregates; the
//! claim data source sits behind the [`ClaimSource`] trait.

mod composite;
mod config;
mod detector;
mod detectors;
mod scan;
mod source;

pub use composite::{CompositeDetector, CompositeInputs};
pub use config::{CompositeWeights, DetectorConfig, SignalThresholds};
pub use detector::{delta_severity, SignalDetector};
pub use detectors::{
    AuthFailureDetector, DenialRateDetector, PaymentDelayDetector, UnderpaymentDetector,
};
pub use scan::{DriftScanner, ScanOutcome};
pub use source::{ClaimSource, SourceError, TimeWindow, WindowAggregate};

use thiserror::Error;

/// Detection-run errors. Insufficient data is not an error; detectors
/// silently produce no candidates for thin windows.
#[derive(Debug, Error)]
pub enum DetectError {
    /// The claim source could not be reached at all. Retryable, and
    /// distinct from "no drift found".
    #[error("claim source unavailable: {0}")]
    Source(#[from] SourceError),
}
