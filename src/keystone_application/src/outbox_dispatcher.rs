use std::{sync::Arc, time::Duration};

use keystone_core::{
    ConflictAware, MessageBus, MessageBusError, MetricsSink, OutboxStore, OutboxStoreError, Topic,
    TransactionError, TransactionManager, TxScope,
};
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;

use crate::transaction_coordinator::TransactionCoordinator;

/// Default delay between dispatch passes.
pub const DISPATCH_INTERVAL: Duration = Duration::from_secs(30);

/// Maximum rows claimed per topic and pass.
pub const DISPATCH_BATCH_SIZE: u32 = 100;

pub const MESSAGES_DISPATCHED: &str = "outbox_messages_dispatched";
pub const DISPATCH_FAILURES: &str = "outbox_dispatch_failures";

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error(transparent)]
    Outbox(#[from] OutboxStoreError),
    #[error(transparent)]
    Bus(#[from] MessageBusError),
    #[error(transparent)]
    Transaction(#[from] TransactionError),
}

impl ConflictAware for DispatchError {
    fn is_serialization_conflict(&self) -> bool {
        match self {
            DispatchError::Outbox(e) => e.is_serialization_conflict(),
            DispatchError::Transaction(e) => e.is_serialization_conflict(),
            DispatchError::Bus(_) => false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DispatcherSettings {
    pub topics: Vec<Topic>,
    pub batch_size: u32,
    pub interval: Duration,
}

impl Default for DispatcherSettings {
    fn default() -> Self {
        Self {
            topics: vec![Topic::LOGINS, Topic::REGISTERS],
            batch_size: DISPATCH_BATCH_SIZE,
            interval: DISPATCH_INTERVAL,
        }
    }
}

/// Forwards staged outbox rows to the message bus.
///
/// Each topic is claimed and sent inside its own transaction: rows are
/// marked delivered only if the bus accepted the batch, otherwise the
/// rollback leaves them pending for the next pass.
pub struct OutboxDispatcher<M, O, B>
where
    M: TransactionManager,
{
    coordinator: TransactionCoordinator<M>,
    outbox: O,
    bus: B,
    settings: DispatcherSettings,
    metrics: Arc<dyn MetricsSink>,
}

impl<M, O, B> OutboxDispatcher<M, O, B>
where
    M: TransactionManager + 'static,
    O: OutboxStore<Handle = M::Handle> + 'static,
    B: MessageBus + 'static,
{
    pub fn new(
        coordinator: TransactionCoordinator<M>,
        outbox: O,
        bus: B,
        settings: DispatcherSettings,
        metrics: Arc<dyn MetricsSink>,
    ) -> Self {
        Self {
            coordinator,
            outbox,
            bus,
            settings,
            metrics,
        }
    }

    pub fn settings(&self) -> &DispatcherSettings {
        &self.settings
    }

    /// Claim one batch of `topic` and hand it to the bus.
    ///
    /// Returns the number of messages delivered.
    #[tracing::instrument(name = "OutboxDispatcher::dispatch_topic", skip(self), fields(topic = %topic))]
    pub async fn dispatch_topic(&self, topic: &Topic) -> Result<usize, DispatchError> {
        let batch_size = self.settings.batch_size;

        self.coordinator
            .run(&TxScope::root(), move |scope| async move {
                let messages = self.outbox.claim_batch(&scope, topic, batch_size).await?;
                if messages.is_empty() {
                    return Ok(0);
                }

                self.bus.send_batch(&messages).await?;
                Ok(messages.len())
            })
            .await
    }

    /// One pass over every configured topic. Failures are logged and the
    /// remaining topics still run.
    pub async fn dispatch_once(&self) -> usize {
        let mut delivered = 0;
        for topic in &self.settings.topics {
            match self.dispatch_topic(topic).await {
                Ok(0) => {}
                Ok(count) => {
                    tracing::debug!(%topic, count, "Dispatched outbox messages");
                    self.metrics.increment(MESSAGES_DISPATCHED, count as u64);
                    delivered += count;
                }
                Err(e) => {
                    tracing::error!(%topic, error = %e, "Outbox dispatch failed");
                    self.metrics.increment(DISPATCH_FAILURES, 1);
                }
            }
        }
        delivered
    }

    /// Dispatch on a fixed timer until `shutdown` fires.
    ///
    /// A pass interrupted by shutdown is dropped along with its open
    /// transaction, so nothing it claimed is marked delivered.
    pub async fn run(self, shutdown: CancellationToken) {
        let period = self.settings.interval;
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            topics = ?self.settings.topics,
            batch_size = self.settings.batch_size,
            interval = ?period,
            "Outbox dispatcher started"
        );

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {}
            }

            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                _ = self.dispatch_once() => {}
            }
        }

        tracing::info!("Outbox dispatcher stopped");
    }

    /// Spawn [`Self::run`] as a background task.
    pub fn start(self, shutdown: CancellationToken) -> tokio::task::JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }
}
