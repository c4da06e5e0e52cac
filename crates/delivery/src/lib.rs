//! Delivery Engine
//!
//! Dispatches approved alerts through notification channels with circuit
//! breaking, multi-dimensional rate limiting, bounded-concurrency batch
//! processing, and dead-letter retries with exponential backoff. One
//! alert's failure never aborts or corrupts the rest of its batch.

mod backoff;
mod breaker;
mod channel;
mod engine;
mod limiter;
mod webhook;

pub use backoff::RetryPolicy;
pub use breaker::{BreakerState, CircuitBreaker};
pub use channel::{ChannelError, ChannelRegistry, NotificationChannel};
pub use engine::{BatchOutcome, DeliveryConfig, DeliveryEngine, DeliveryOutcome, SweepOutcome};
pub use limiter::{LimitDimension, RateLimitConfig, RateLimiter};
pub use webhook::{
    SignedWebhook, WebhookChannel, WebhookEnvelope, WebhookError, WebhookSigner, WebhookTransport,
    WebhookVerifier, MAX_TIMESTAMP_SKEW_SECS, SIGNATURE_HEADER,
};
