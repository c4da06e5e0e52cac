//! Multi-dimensional rate limiter
//!
//! Rolling-window counters over three dimensions: per-tenant ceiling,
//! per-severity ceiling, and per-signal-type ceiling. A request exceeding
//! any dimension is rejected with the dimension named, never silently
//! dropped. Counters live behind one mutex so check-then-increment is
//! atomic across all dimensions.

use alert_model::{Severity, SignalType};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::warn;
use uuid::Uuid;

/// Which ceiling rejected the request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitDimension {
    Tenant,
    Severity(Severity),
    Signal(SignalType),
}

impl std::fmt::Display for LimitDimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LimitDimension::Tenant => write!(f, "tenant"),
            LimitDimension::Severity(s) => write!(f, "severity:{s}"),
            LimitDimension::Signal(s) => write!(f, "signal:{s}"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Rolling window length in seconds
    pub window_secs: u64,
    /// Global per-tenant ceiling within the window
    pub tenant_max: u32,
    /// Per-(tenant, severity) ceiling
    pub severity_max: u32,
    /// Per-(tenant, signal type) ceiling
    pub signal_max: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window_secs: 3600,
            tenant_max: 50,
            severity_max: 25,
            signal_max: 25,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum CounterKey {
    Tenant(Uuid),
    Severity(Uuid, Severity),
    Signal(Uuid, SignalType),
}

struct WindowCounter {
    window_start: Instant,
    count: u32,
}

pub struct RateLimiter {
    config: RateLimitConfig,
    counters: Mutex<HashMap<CounterKey, WindowCounter>>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            counters: Mutex::new(HashMap::new()),
        }
    }

    /// Reserve one delivery slot across all dimensions, or name the
    /// dimension that is over its ceiling. Nothing is consumed on
    /// rejection.
    pub fn try_acquire(
        &self,
        tenant_id: Uuid,
        severity: Severity,
        signal: SignalType,
    ) -> Result<(), LimitDimension> {
        let now = Instant::now();
        let window = Duration::from_secs(self.config.window_secs);
        let mut counters = match self.counters.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        let checks = [
            (CounterKey::Tenant(tenant_id), self.config.tenant_max, LimitDimension::Tenant),
            (
                CounterKey::Severity(tenant_id, severity),
                self.config.severity_max,
                LimitDimension::Severity(severity),
            ),
            (
                CounterKey::Signal(tenant_id, signal),
                self.config.signal_max,
                LimitDimension::Signal(signal),
            ),
        ];

        for (key, max, dimension) in &checks {
            let current = counters
                .get(key)
                .filter(|c| now.duration_since(c.window_start) < window)
                .map(|c| c.count)
                .unwrap_or(0);
            if current >= *max {
                warn!(tenant = %tenant_id, dimension = %dimension, "rate limit exceeded");
                return Err(*dimension);
            }
        }

        for (key, _, _) in checks {
            let counter = counters.entry(key).or_insert(WindowCounter {
                window_start: now,
                count: 0,
            });
            // Expired windows reset rather than carry stale counts
            if now.duration_since(counter.window_start) >= window {
                counter.window_start = now;
                counter.count = 0;
            }
            counter.count += 1;
        }
        Ok(())
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RateLimitConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(tenant_max: u32, severity_max: u32, signal_max: u32) -> RateLimiter {
        RateLimiter::new(RateLimitConfig {
            window_secs: 3600,
            tenant_max,
            severity_max,
            signal_max,
        })
    }

    #[test]
    fn test_tenant_ceiling_names_dimension() {
        let limiter = limiter(2, 10, 10);
        let tenant = Uuid::new_v4();
        for _ in 0..2 {
            limiter
                .try_acquire(tenant, Severity::Warning, SignalType::DenialRate)
                .unwrap();
        }
        let err = limiter
            .try_acquire(tenant, Severity::Critical, SignalType::AuthFailure)
            .unwrap_err();
        assert_eq!(err, LimitDimension::Tenant);
    }

    #[test]
    fn test_severity_ceiling_is_per_severity() {
        let limiter = limiter(100, 1, 100);
        let tenant = Uuid::new_v4();
        limiter
            .try_acquire(tenant, Severity::Warning, SignalType::DenialRate)
            .unwrap();
        assert_eq!(
            limiter
                .try_acquire(tenant, Severity::Warning, SignalType::Underpayment)
                .unwrap_err(),
            LimitDimension::Severity(Severity::Warning)
        );
        // A different severity still has room
        limiter
            .try_acquire(tenant, Severity::Critical, SignalType::Underpayment)
            .unwrap();
    }

    #[test]
    fn test_rejection_consumes_nothing() {
        let limiter = limiter(100, 100, 1);
        let tenant = Uuid::new_v4();
        limiter
            .try_acquire(tenant, Severity::Warning, SignalType::DenialRate)
            .unwrap();
        for _ in 0..5 {
            assert!(limiter
                .try_acquire(tenant, Severity::Warning, SignalType::DenialRate)
                .is_err());
        }
        // Other signals were never charged by the rejected calls
        limiter
            .try_acquire(tenant, Severity::Warning, SignalType::AuthFailure)
            .unwrap();
    }

    #[test]
    fn test_tenants_are_isolated() {
        let limiter = limiter(1, 10, 10);
        limiter
            .try_acquire(Uuid::new_v4(), Severity::Warning, SignalType::DenialRate)
            .unwrap();
        limiter
            .try_acquire(Uuid::new_v4(), Severity::Warning, SignalType::DenialRate)
            .unwrap();
    }
}
