//! Engine configuration
//!
//! Layered loading: optional TOML file, then `PAYERWATCH__*` environment
//! overrides (double underscore separates nesting levels). Every section
//! falls back to its crate-level defaults so a bare deployment runs with
//! sane tuning.

use crate::PipelineError;
use delivery::DeliveryConfig;
use drift_detect::DetectorConfig;
use serde::{Deserialize, Serialize};
use suppression::SuppressionConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Product label baked into alert fingerprints
    pub product: String,
    pub detectors: DetectorConfigSection,
    pub suppression: SuppressionConfig,
    pub delivery: DeliveryConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            product: "claims".to_string(),
            detectors: DetectorConfigSection::default(),
            suppression: SuppressionConfig::default(),
            delivery: DeliveryConfig::default(),
        }
    }
}

/// Wrapper so `DetectorConfig` keeps serde defaults at the section level
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorConfigSection(pub DetectorConfig);

impl Default for DetectorConfigSection {
    fn default() -> Self {
        Self(DetectorConfig::default())
    }
}

impl EngineConfig {
    /// Load from `path` (optional) plus environment overrides
    pub fn load(path: Option<&str>) -> Result<Self, PipelineError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }
        builder
            .add_source(
                config::Environment::with_prefix("PAYERWATCH")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| PipelineError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_file() {
        let config = EngineConfig::load(None).unwrap();
        assert_eq!(config.product, "claims");
        assert_eq!(config.delivery.breaker_failure_threshold, 5);
        assert_eq!(config.suppression.dedup_window_hours, 4);
        assert!((config.detectors.0.composite_threshold - 0.15).abs() < 1e-9);
    }
}
