//! Signal types and severity levels

use serde::{Deserialize, Serialize};
use std::fmt;

/// Behavioral dimension a detector watches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalType {
    /// Share of claims denied by the payer
    DenialRate,
    /// Paid amount relative to billed/expected amount
    Underpayment,
    /// Days from submission to payment
    PaymentDelay,
    /// Share of prior-authorization requests rejected
    AuthFailure,
    /// Weighted combination of the above per payer
    PayerComposite,
}

impl SignalType {
    pub fn all() -> [SignalType; 5] {
        [
            SignalType::DenialRate,
            SignalType::Underpayment,
            SignalType::PaymentDelay,
            SignalType::AuthFailure,
            SignalType::PayerComposite,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SignalType::DenialRate => "denial_rate",
            SignalType::Underpayment => "underpayment",
            SignalType::PaymentDelay => "payment_delay",
            SignalType::AuthFailure => "auth_failure",
            SignalType::PayerComposite => "payer_composite",
        }
    }
}

impl fmt::Display for SignalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Alert severity, ordered from least to most urgent
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Critical,
    Emergency,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Critical => "critical",
            Severity::Emergency => "emergency",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Emergency > Severity::Critical);
        assert!(Severity::Critical > Severity::Warning);
        assert!(Severity::Warning > Severity::Info);
    }

    #[test]
    fn test_signal_type_serde() {
        let json = serde_json::to_string(&SignalType::DenialRate).unwrap();
        assert_eq!(json, "\"denial_rate\"");
    }
}
