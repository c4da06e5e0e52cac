//! Notification channel interface

use alert_model::{AlertEvent, ChannelBinding};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("delivery failed: {0}")]
    Failed(String),
    #[error("channel timed out")]
    Timeout,
}

/// One outbound channel type (email, webhook, chat). Implementations own
/// their transport; the engine only sees success or failure.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    fn kind(&self) -> ChannelBinding;

    async fn deliver(&self, alert: &AlertEvent) -> Result<(), ChannelError>;
}

/// Channels by binding, shared across workers
#[derive(Default, Clone)]
pub struct ChannelRegistry {
    channels: HashMap<ChannelBinding, Arc<dyn NotificationChannel>>,
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, channel: Arc<dyn NotificationChannel>) {
        self.channels.insert(channel.kind(), channel);
    }

    pub fn get(&self, binding: &ChannelBinding) -> Option<Arc<dyn NotificationChannel>> {
        self.channels.get(binding).cloned()
    }

    pub fn bindings(&self) -> impl Iterator<Item = &ChannelBinding> {
        self.channels.keys()
    }
}
