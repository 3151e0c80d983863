use async_trait::async_trait;
use secrecy::Secret;
use thiserror::Error;

use crate::domain::outbox::OutboxMessage;

#[derive(Debug, Error)]
pub enum MessageBusError {
    #[error("Message bus unavailable: {0}")]
    Unavailable(String),
    #[error("Message bus rejected batch: {0}")]
    Rejected(String),
}

/// Downstream transport that outbox batches are forwarded to.
#[async_trait]
pub trait MessageBus: Send + Sync {
    async fn send_batch(&self, messages: &[OutboxMessage]) -> Result<(), MessageBusError>;
}

/// Source of the key used to sign access tokens.
pub trait SecretProvider: Send + Sync {
    fn signing_key(&self) -> Secret<String>;
}

/// Counter sink handed to components that report activity.
pub trait MetricsSink: Send + Sync {
    fn increment(&self, counter: &'static str, by: u64);
}

/// Discards every measurement.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMetrics;

impl MetricsSink for NoopMetrics {
    fn increment(&self, _counter: &'static str, _by: u64) {}
}
