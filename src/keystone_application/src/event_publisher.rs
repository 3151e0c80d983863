use keystone_core::{DomainEvent, NewOutboxMessage, OutboxStore, OutboxStoreError, TxScope};

/// Stages domain events in the outbox, inside the caller's transaction.
pub struct OutboxPublisher<O> {
    outbox: O,
}

impl<O: OutboxStore> OutboxPublisher<O> {
    pub fn new(outbox: O) -> Self {
        Self { outbox }
    }

    pub fn outbox(&self) -> &O {
        &self.outbox
    }

    #[tracing::instrument(name = "OutboxPublisher::publish", skip_all, fields(topic = %E::TOPIC))]
    pub async fn publish<E: DomainEvent>(
        &self,
        scope: &TxScope<O::Handle>,
        event: &E,
    ) -> Result<(), OutboxStoreError> {
        self.outbox.append(scope, encode(event)?).await
    }

    #[tracing::instrument(name = "OutboxPublisher::publish_all", skip_all, fields(topic = %E::TOPIC, count = events.len()))]
    pub async fn publish_all<E: DomainEvent>(
        &self,
        scope: &TxScope<O::Handle>,
        events: &[E],
    ) -> Result<(), OutboxStoreError> {
        let messages = events.iter().map(encode).collect::<Result<Vec<_>, _>>()?;
        self.outbox.append_batch(scope, messages).await
    }
}

fn encode<E: DomainEvent>(event: &E) -> Result<NewOutboxMessage, OutboxStoreError> {
    let value = serde_json::to_vec(event).map_err(|e| OutboxStoreError::Encoding(e.to_string()))?;
    Ok(NewOutboxMessage::new(E::TOPIC, value))
}
