//! Shared retry/backoff policy
//!
//! One primitive for every retry loop in the engine: exponential
//! `2^retry_count` minutes with a retry cap and optional jitter.

use chrono::Duration;
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub max_retries: u32,
    /// Base delay unit; the default is one minute
    pub base_secs: i64,
    /// Add up to 50% random jitter on top of the computed delay
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            base_secs: 60,
            jitter: false,
        }
    }
}

impl RetryPolicy {
    /// Delay before the attempt following `retry_count` failures.
    /// Exponent saturates at `max_retries` so the delay stays bounded.
    pub fn delay_for(&self, retry_count: u32) -> Duration {
        let exponent = retry_count.min(self.max_retries);
        let secs = self.base_secs.saturating_mul(1i64 << exponent);
        let secs = if self.jitter {
            let extra = rand::thread_rng().gen_range(0..=secs / 2);
            secs + extra
        } else {
            secs
        };
        Duration::seconds(secs)
    }

    pub fn is_exhausted(&self, retry_count: u32) -> bool {
        retry_count >= self.max_retries
    }
}
