use async_trait::async_trait;
use chrono::{DateTime, Utc};
use keystone_core::{NewOutboxMessage, OutboxMessage, OutboxStore, OutboxStoreError, Topic, TxScope};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::postgres_transaction::{PgExecutor, PgTransaction, is_serialization_failure};

#[derive(Debug, sqlx::FromRow)]
struct OutboxRow {
    id: i64,
    key: Uuid,
    value: Vec<u8>,
    topic: String,
    delivered: bool,
    created_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl From<OutboxRow> for OutboxMessage {
    fn from(row: OutboxRow) -> Self {
        OutboxMessage {
            id: row.id,
            key: row.key,
            value: row.value,
            topic: Topic::new(row.topic),
            delivered: row.delivered,
            created_at: row.created_at,
            deleted_at: row.deleted_at,
        }
    }
}

#[derive(Clone)]
pub struct PostgresOutboxStore {
    pool: PgPool,
}

impl PostgresOutboxStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OutboxStore for PostgresOutboxStore {
    type Handle = PgTransaction;

    #[tracing::instrument(name = "Appending outbox message", skip_all, fields(topic = %message.topic))]
    async fn append(
        &self,
        scope: &TxScope<PgTransaction>,
        message: NewOutboxMessage,
    ) -> Result<(), OutboxStoreError> {
        let mut executor = PgExecutor::acquire(&self.pool, scope)
            .await
            .map_err(store_error)?;

        sqlx::query("INSERT INTO outbox (key, value, topic) VALUES ($1, $2, $3)")
            .bind(message.key)
            .bind(message.value)
            .bind(message.topic.as_str())
            .execute(executor.connection().map_err(store_error)?)
            .await
            .map_err(store_error)?;

        Ok(())
    }

    #[tracing::instrument(name = "Appending outbox batch", skip_all, fields(count = messages.len()))]
    async fn append_batch(
        &self,
        scope: &TxScope<PgTransaction>,
        messages: Vec<NewOutboxMessage>,
    ) -> Result<(), OutboxStoreError> {
        if messages.is_empty() {
            return Ok(());
        }
        let mut executor = PgExecutor::acquire(&self.pool, scope)
            .await
            .map_err(store_error)?;

        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new("INSERT INTO outbox (key, value, topic) ");
        builder.push_values(messages, |mut row, message| {
            row.push_bind(message.key)
                .push_bind(message.value)
                .push_bind(message.topic.as_str().to_string());
        });

        builder
            .build()
            .execute(executor.connection().map_err(store_error)?)
            .await
            .map_err(store_error)?;

        Ok(())
    }

    #[tracing::instrument(name = "Claiming outbox batch", skip(self, scope), fields(topic = %topic))]
    async fn claim_batch(
        &self,
        scope: &TxScope<PgTransaction>,
        topic: &Topic,
        limit: u32,
    ) -> Result<Vec<OutboxMessage>, OutboxStoreError> {
        let mut executor = PgExecutor::acquire(&self.pool, scope)
            .await
            .map_err(store_error)?;

        let rows = sqlx::query_as::<_, OutboxRow>(
            r#"
                WITH next AS (
                    SELECT id
                    FROM outbox
                    WHERE topic = $1 AND delivered = FALSE AND deleted_at IS NULL
                    ORDER BY created_at, id
                    LIMIT $2
                    FOR UPDATE SKIP LOCKED
                )
                UPDATE outbox
                SET delivered = TRUE
                FROM next
                WHERE outbox.id = next.id
                RETURNING outbox.id, outbox.key, outbox.value, outbox.topic,
                          outbox.delivered, outbox.created_at, outbox.deleted_at
            "#,
        )
        .bind(topic.as_str())
        .bind(i64::from(limit))
        .fetch_all(executor.connection().map_err(store_error)?)
        .await
        .map_err(store_error)?;

        let mut messages: Vec<OutboxMessage> = rows.into_iter().map(OutboxMessage::from).collect();
        messages.sort_by_key(|m| (m.created_at, m.id));
        Ok(messages)
    }

    #[tracing::instrument(name = "Discarding outbox message", skip(self, scope))]
    async fn discard(
        &self,
        scope: &TxScope<PgTransaction>,
        key: Uuid,
    ) -> Result<bool, OutboxStoreError> {
        let mut executor = PgExecutor::acquire(&self.pool, scope)
            .await
            .map_err(store_error)?;

        let result = sqlx::query(
            "UPDATE outbox SET deleted_at = now() WHERE key = $1 AND deleted_at IS NULL",
        )
        .bind(key)
        .execute(executor.connection().map_err(store_error)?)
        .await
        .map_err(store_error)?;

        Ok(result.rows_affected() > 0)
    }
}

fn store_error(error: sqlx::Error) -> OutboxStoreError {
    if is_serialization_failure(&error) {
        OutboxStoreError::SerializationConflict
    } else {
        OutboxStoreError::UnexpectedError(error.to_string())
    }
}
