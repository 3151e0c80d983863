use std::sync::{
    Arc, Mutex,
    atomic::{AtomicU32, Ordering},
};

use keystone_core::{MessageBus, MessageBusError, OutboxMessage};

/// Records every accepted batch. Failures can be queued up front.
#[derive(Clone, Default)]
pub struct InMemoryMessageBus {
    batches: Arc<Mutex<Vec<Vec<OutboxMessage>>>>,
    pending_failures: Arc<AtomicU32>,
}

impl InMemoryMessageBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject the next `count` batches.
    pub fn fail_next(&self, count: u32) {
        self.pending_failures.store(count, Ordering::SeqCst);
    }

    pub fn batches(&self) -> Vec<Vec<OutboxMessage>> {
        self.batches
            .lock()
            .map(|batches| batches.clone())
            .unwrap_or_default()
    }

    pub fn delivered(&self) -> Vec<OutboxMessage> {
        self.batches().into_iter().flatten().collect()
    }
}

#[async_trait::async_trait]
impl MessageBus for InMemoryMessageBus {
    async fn send_batch(&self, messages: &[OutboxMessage]) -> Result<(), MessageBusError> {
        let failing = self
            .pending_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(MessageBusError::Unavailable(
                "injected message bus failure".to_string(),
            ));
        }

        tracing::debug!(count = messages.len(), "Recording message batch");
        self.batches
            .lock()
            .map_err(|e| MessageBusError::Unavailable(e.to_string()))?
            .push(messages.to_vec());
        Ok(())
    }
}
