//! Detector contract and shared helpers

use crate::source::WindowAggregate;
use alert_model::{DriftEvent, Severity, SignalType};
use std::collections::HashMap;
use uuid::Uuid;

/// One behavioral-dimension detector. Pure: all inputs arrive as window
/// aggregates, all outputs are candidate drift events.
pub trait SignalDetector: Send + Sync {
    fn signal(&self) -> SignalType;

    /// Compare baseline and current aggregates, one candidate per
    /// (entity, sub-dimension) whose delta crosses the threshold.
    /// Entities missing from either window or below the minimum sample
    /// count are skipped, not errors.
    fn detect(
        &self,
        tenant_id: Uuid,
        baseline: &[WindowAggregate],
        current: &[WindowAggregate],
    ) -> Vec<DriftEvent>;
}

/// Pair baseline and current aggregates by (entity, sub-dimension)
pub(crate) fn pair_windows<'a>(
    baseline: &'a [WindowAggregate],
    current: &'a [WindowAggregate],
) -> Vec<(&'a WindowAggregate, &'a WindowAggregate)> {
    let by_key: HashMap<(&str, Option<&str>), &WindowAggregate> = baseline
        .iter()
        .map(|a| ((a.entity.as_str(), a.sub_dimension.as_deref()), a))
        .collect();

    current
        .iter()
        .filter_map(|cur| {
            by_key
                .get(&(cur.entity.as_str(), cur.sub_dimension.as_deref()))
                .map(|base| (*base, cur))
        })
        .collect()
}

/// Map delta magnitude relative to the firing threshold onto a severity
/// band. Ratio 1.0 is the firing point.
pub fn delta_severity(delta_magnitude: f64, threshold: f64) -> Severity {
    let ratio = if threshold > 0.0 {
        delta_magnitude / threshold
    } else {
        1.0
    };
    if ratio >= 2.5 {
        Severity::Emergency
    } else if ratio >= 1.5 {
        Severity::Critical
    } else {
        Severity::Warning
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_windows_matches_sub_dimension() {
        let baseline = vec![
            WindowAggregate::new("acme", 0.1, 30, 0.05),
            WindowAggregate::new("acme", 0.2, 30, 0.05).with_sub_dimension("cpt_99213"),
        ];
        let current = vec![
            WindowAggregate::new("acme", 0.3, 20, 0.05).with_sub_dimension("cpt_99213"),
            WindowAggregate::new("unmatched", 0.3, 20, 0.05),
        ];
        let pairs = pair_windows(&baseline, &current);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].0.mean, 0.2);
        assert_eq!(pairs[0].1.mean, 0.3);
    }

    #[test]
    fn test_delta_severity_bands() {
        assert_eq!(delta_severity(0.18, 0.15), Severity::Warning);
        assert_eq!(delta_severity(0.30, 0.15), Severity::Critical);
        assert_eq!(delta_severity(0.40, 0.15), Severity::Emergency);
    }
}
