use std::time::Duration;

use chrono::{DateTime, Utc};
use keystone_core::{MessageBus, MessageBusError, OutboxMessage};
use reqwest::Client;
use serde::Serialize;
use uuid::Uuid;

/// Delivers outbox batches to a webhook as one JSON POST per batch.
pub struct HttpMessageBus {
    http_client: Client,
    url: String,
}

impl HttpMessageBus {
    pub fn new(url: String, http_client: Client) -> Self {
        Self { http_client, url }
    }

    pub fn with_timeout(url: String, timeout: Duration) -> Result<Self, MessageBusError> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MessageBusError::Unavailable(e.to_string()))?;
        Ok(Self::new(url, http_client))
    }
}

#[async_trait::async_trait]
impl MessageBus for HttpMessageBus {
    #[tracing::instrument(name = "Publishing message batch", skip_all, fields(count = messages.len()))]
    async fn send_batch(&self, messages: &[OutboxMessage]) -> Result<(), MessageBusError> {
        let body = PublishBatchRequest {
            messages: messages.iter().map(PublishedMessage::from).collect(),
        };

        let response = self
            .http_client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| MessageBusError::Unavailable(e.to_string()))?;

        let status = response.status();
        if status.is_server_error() {
            return Err(MessageBusError::Unavailable(status.to_string()));
        }
        if !status.is_success() {
            return Err(MessageBusError::Rejected(status.to_string()));
        }

        Ok(())
    }
}

#[derive(Serialize, Debug)]
struct PublishBatchRequest<'a> {
    messages: Vec<PublishedMessage<'a>>,
}

#[derive(Serialize, Debug)]
struct PublishedMessage<'a> {
    key: Uuid,
    topic: &'a str,
    value: serde_json::Value,
    created_at: DateTime<Utc>,
}

impl<'a> From<&'a OutboxMessage> for PublishedMessage<'a> {
    fn from(message: &'a OutboxMessage) -> Self {
        let value = serde_json::from_slice(&message.value).unwrap_or_else(|_| {
            serde_json::Value::String(String::from_utf8_lossy(&message.value).into_owned())
        });
        Self {
            key: message.key,
            topic: message.topic.as_str(),
            value,
            created_at: message.created_at,
        }
    }
}
