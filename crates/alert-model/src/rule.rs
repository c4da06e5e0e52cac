//! Tenant alert rules
//!
//! Created and edited by tenant operators; read-only to the engine.

use crate::signal::{Severity, SignalType};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Notification channel binding for a rule
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelBinding {
    Email,
    Webhook,
    Chat,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertRule {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub signal: SignalType,
    /// Minimum |delta| (or composite score) that fires this rule
    pub threshold: f64,
    pub enabled: bool,
    pub severity: Severity,
    pub channel: ChannelBinding,
}

impl AlertRule {
    pub fn new(
        tenant_id: Uuid,
        signal: SignalType,
        threshold: f64,
        severity: Severity,
        channel: ChannelBinding,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            tenant_id,
            signal,
            threshold,
            enabled: true,
            severity,
            channel,
        }
    }

    /// Does this rule fire for the given drift magnitude?
    pub fn matches(&self, signal: SignalType, delta_magnitude: f64) -> bool {
        self.enabled && self.signal == signal && delta_magnitude >= self.threshold
    }
}
