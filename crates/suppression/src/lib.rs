//! Suppression Engine
//!
//! Decides whether a newly created alert should be delivered now,
//! suppressed as learned noise, or force-delivered because the situation
//! is escalating or regressing. Learns from operator judgments on alerts
//! that share a fingerprint.

mod engine;

pub use engine::{Decision, SuppressionConfig, SuppressionEngine};
