//! Detector configuration
//!
//! Thresholds and weights are tenant-tunable configuration, not hardcoded
//! constants.

use serde::{Deserialize, Serialize};

/// Thresholds for one signal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalThresholds {
    /// Minimum samples required in each window before the detector
    /// produces any candidate
    pub min_samples: u64,
    /// Absolute delta threshold, in the signal's own unit
    pub absolute: Option<f64>,
    /// Relative delta threshold, as a fraction of the baseline mean
    pub relative: Option<f64>,
}

/// Weights for the composite payer-drift score
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompositeWeights {
    pub denial: f64,
    pub payment: f64,
    pub approval: f64,
    pub processing: f64,
}

impl Default for CompositeWeights {
    fn default() -> Self {
        Self {
            denial: 0.4,
            payment: 0.3,
            approval: 0.2,
            processing: 0.1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorConfig {
    pub denial_rate: SignalThresholds,
    pub underpayment: SignalThresholds,
    pub payment_delay: SignalThresholds,
    pub auth_failure: SignalThresholds,
    pub composite_weights: CompositeWeights,
    pub composite_threshold: f64,
    pub composite_min_samples: u64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            denial_rate: SignalThresholds {
                min_samples: 20,
                absolute: Some(0.15),
                relative: None,
            },
            underpayment: SignalThresholds {
                min_samples: 20,
                absolute: None,
                relative: Some(0.15),
            },
            // Alerts on delta_days > 7 OR delta_pct > 0.3
            payment_delay: SignalThresholds {
                min_samples: 20,
                absolute: Some(7.0),
                relative: Some(0.3),
            },
            auth_failure: SignalThresholds {
                min_samples: 15,
                absolute: Some(0.10),
                relative: Some(0.5),
            },
            composite_weights: CompositeWeights::default(),
            composite_threshold: 0.15,
            composite_min_samples: 20,
        }
    }
}
