//! Alert fingerprints
//!
//! A fingerprint groups "similar" alerts for suppression and historical
//! learning. Fields are sanitized and length-capped before use because
//! fingerprints double as lookup keys.

use crate::signal::SignalType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Max length per fingerprint component after sanitization
const MAX_COMPONENT_LEN: usize = 120;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint {
    pub product: String,
    pub signal: SignalType,
    pub entity: String,
    pub sub_dimension: Option<String>,
}

impl Fingerprint {
    pub fn new(
        product: &str,
        signal: SignalType,
        entity: &str,
        sub_dimension: Option<&str>,
    ) -> Self {
        Self {
            product: sanitize(product),
            signal,
            entity: sanitize(entity),
            sub_dimension: sub_dimension.map(sanitize).filter(|s| !s.is_empty()),
        }
    }

    /// Stable key form used for lookups and log correlation
    pub fn key(&self) -> String {
        match &self.sub_dimension {
            Some(sub) => format!("{}:{}:{}:{}", self.product, self.signal, self.entity, sub),
            None => format!("{}:{}:{}", self.product, self.signal, self.entity),
        }
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

/// Lowercase, strip control characters and the key separator, collapse
/// whitespace to single underscores, cap the length.
fn sanitize(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len().min(MAX_COMPONENT_LEN));
    let mut last_was_sep = true;
    for c in raw.trim().chars() {
        if out.len() >= MAX_COMPONENT_LEN {
            break;
        }
        if c.is_control() || c == ':' {
            continue;
        }
        if c.is_whitespace() {
            if !last_was_sep {
                out.push('_');
                last_was_sep = true;
            }
            continue;
        }
        for lc in c.to_lowercase() {
            out.push(lc);
        }
        last_was_sep = false;
    }
    while out.ends_with('_') {
        out.pop();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_whitespace_and_case() {
        let fp = Fingerprint::new("claims", SignalType::DenialRate, "Acme  Health\tPlan", None);
        assert_eq!(fp.entity, "acme_health_plan");
        assert_eq!(fp.key(), "claims:denial_rate:acme_health_plan");
    }

    #[test]
    fn test_sanitize_strips_control_and_separator() {
        let fp = Fingerprint::new("claims", SignalType::AuthFailure, "bad\u{0}:entity", None);
        assert_eq!(fp.entity, "badentity");
    }

    #[test]
    fn test_length_cap() {
        let long = "x".repeat(500);
        let fp = Fingerprint::new("claims", SignalType::DenialRate, &long, Some(&long));
        assert_eq!(fp.entity.len(), MAX_COMPONENT_LEN);
        assert_eq!(fp.sub_dimension.as_ref().unwrap().len(), MAX_COMPONENT_LEN);
    }

    #[test]
    fn test_sub_dimension_in_key() {
        let fp = Fingerprint::new(
            "claims",
            SignalType::DenialRate,
            "Acme",
            Some("CPT 99213"),
        );
        assert_eq!(fp.key(), "claims:denial_rate:acme:cpt_99213");
    }

    #[test]
    fn test_empty_sub_dimension_dropped() {
        let fp = Fingerprint::new("claims", SignalType::DenialRate, "Acme", Some("  "));
        assert!(fp.sub_dimension.is_none());
    }
}
