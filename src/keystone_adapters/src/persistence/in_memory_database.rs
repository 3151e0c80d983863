use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU32, Ordering},
    },
};

use async_trait::async_trait;
use chrono::Utc;
use keystone_core::{
    CurrentHandle, Email, NewOutboxMessage, OutboxMessage, OutboxStore, OutboxStoreError, Topic,
    TransactionError, TransactionManager, TxScope, User, UserId, UserStore, UserStoreError,
};
use secrecy::ExposeSecret;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use super::user_record::UserRecord;

#[derive(Debug, Clone, Default)]
struct Tables {
    users: HashMap<Uuid, UserRecord>,
    outbox: Vec<OutboxMessage>,
    next_outbox_id: i64,
}

struct OpenTransaction {
    committed: OwnedMutexGuard<Tables>,
    staged: Tables,
}

/// Handle to an open in-memory transaction.
///
/// The transaction owns the database lock until it is committed, rolled back
/// or dropped, so transactions never interleave. Writes go to a staged copy
/// that replaces the committed tables on commit.
#[derive(Clone)]
pub struct InMemoryTransaction {
    inner: Arc<Mutex<Option<OpenTransaction>>>,
}

#[derive(Default)]
struct Faults {
    serialization_failures: AtomicU32,
    fail_next_outbox_append: AtomicBool,
}

#[derive(Default)]
struct Stats {
    begun: AtomicU32,
    committed: AtomicU32,
    rolled_back: AtomicU32,
}

/// Process-local database backing the user and outbox stores.
///
/// Used for development and tests. Supports injecting serialization
/// conflicts at commit and a failing outbox append.
#[derive(Clone, Default)]
pub struct InMemoryDatabase {
    tables: Arc<Mutex<Tables>>,
    faults: Arc<Faults>,
    stats: Arc<Stats>,
}

impl InMemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user_store(&self) -> InMemoryUserStore {
        InMemoryUserStore { db: self.clone() }
    }

    pub fn outbox_store(&self) -> InMemoryOutboxStore {
        InMemoryOutboxStore { db: self.clone() }
    }

    /// The next `count` commits fail with a serialization conflict.
    pub fn inject_serialization_failures(&self, count: u32) {
        self.faults
            .serialization_failures
            .store(count, Ordering::SeqCst);
    }

    /// The next outbox append fails with an unexpected error.
    pub fn fail_next_outbox_append(&self) {
        self.faults
            .fail_next_outbox_append
            .store(true, Ordering::SeqCst);
    }

    pub fn transactions_begun(&self) -> u32 {
        self.stats.begun.load(Ordering::SeqCst)
    }

    pub fn transactions_committed(&self) -> u32 {
        self.stats.committed.load(Ordering::SeqCst)
    }

    pub fn transactions_rolled_back(&self) -> u32 {
        self.stats.rolled_back.load(Ordering::SeqCst)
    }

    /// Committed users.
    pub async fn users(&self) -> Vec<User> {
        let tables = self.tables.lock().await;
        tables
            .users
            .values()
            .cloned()
            .filter_map(|record| User::try_from(record).ok())
            .collect()
    }

    /// Committed outbox rows in insertion order.
    pub async fn outbox_messages(&self) -> Vec<OutboxMessage> {
        self.tables.lock().await.outbox.clone()
    }

    async fn with_tables<R>(
        &self,
        scope: &TxScope<InMemoryTransaction>,
        operation: impl FnOnce(&mut Tables) -> R,
    ) -> Result<R, String> {
        match scope.current() {
            CurrentHandle::Transaction(tx) => {
                let mut open = tx.inner.lock().await;
                let open = open
                    .as_mut()
                    .ok_or_else(|| "transaction already finished".to_string())?;
                Ok(operation(&mut open.staged))
            }
            CurrentHandle::Default => {
                let mut tables = self.tables.lock().await;
                Ok(operation(&mut tables))
            }
        }
    }
}

#[async_trait]
impl TransactionManager for InMemoryDatabase {
    type Handle = InMemoryTransaction;

    async fn begin(&self) -> Result<InMemoryTransaction, TransactionError> {
        let committed = self.tables.clone().lock_owned().await;
        let staged = committed.clone();
        self.stats.begun.fetch_add(1, Ordering::SeqCst);

        Ok(InMemoryTransaction {
            inner: Arc::new(Mutex::new(Some(OpenTransaction { committed, staged }))),
        })
    }

    async fn commit(&self, handle: InMemoryTransaction) -> Result<(), TransactionError> {
        let Some(mut open) = handle.inner.lock().await.take() else {
            return Err(TransactionError::UnexpectedError(
                "transaction already finished".to_string(),
            ));
        };

        let injected = self
            .faults
            .serialization_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if injected {
            self.stats.rolled_back.fetch_add(1, Ordering::SeqCst);
            return Err(TransactionError::SerializationConflict);
        }

        *open.committed = open.staged;
        self.stats.committed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn rollback(&self, handle: InMemoryTransaction) -> Result<(), TransactionError> {
        if handle.inner.lock().await.take().is_some() {
            self.stats.rolled_back.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }
}

#[derive(Clone)]
pub struct InMemoryUserStore {
    db: InMemoryDatabase,
}

impl InMemoryUserStore {
    async fn find(
        &self,
        scope: &TxScope<InMemoryTransaction>,
        predicate: impl Fn(&UserRecord) -> bool,
    ) -> Result<User, UserStoreError> {
        let record = self
            .db
            .with_tables(scope, |tables| {
                tables.users.values().find(|r| predicate(r)).cloned()
            })
            .await
            .map_err(UserStoreError::UnexpectedError)?
            .ok_or(UserStoreError::UserNotFound)?;
        User::try_from(record)
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    type Handle = InMemoryTransaction;

    async fn create(
        &self,
        scope: &TxScope<InMemoryTransaction>,
        user: &User,
    ) -> Result<(), UserStoreError> {
        let record = UserRecord::from(user);
        self.db
            .with_tables(scope, |tables| {
                let taken = tables.users.contains_key(&record.id)
                    || tables.users.values().any(|r| r.email == record.email);
                if taken {
                    return Err(UserStoreError::UserAlreadyExists);
                }
                tables.users.insert(record.id, record);
                Ok(())
            })
            .await
            .map_err(UserStoreError::UnexpectedError)?
    }

    async fn update(
        &self,
        scope: &TxScope<InMemoryTransaction>,
        user: &User,
    ) -> Result<(), UserStoreError> {
        let record = UserRecord::from(user);
        self.db
            .with_tables(scope, |tables| match tables.users.get_mut(&record.id) {
                Some(slot) => {
                    *slot = record;
                    Ok(())
                }
                None => Err(UserStoreError::UserNotFound),
            })
            .await
            .map_err(UserStoreError::UnexpectedError)?
    }

    async fn get_by_id(
        &self,
        scope: &TxScope<InMemoryTransaction>,
        id: UserId,
    ) -> Result<User, UserStoreError> {
        self.find(scope, |r| r.id == id.as_uuid()).await
    }

    async fn get_by_email(
        &self,
        scope: &TxScope<InMemoryTransaction>,
        email: &Email,
    ) -> Result<User, UserStoreError> {
        let email = email.as_ref().expose_secret();
        self.find(scope, |r| &r.email == email).await
    }

    async fn get_by_refresh_token(
        &self,
        scope: &TxScope<InMemoryTransaction>,
        refresh_token: &str,
    ) -> Result<User, UserStoreError> {
        self.find(scope, |r| r.refresh_token.as_deref() == Some(refresh_token))
            .await
    }
}

#[derive(Clone)]
pub struct InMemoryOutboxStore {
    db: InMemoryDatabase,
}

fn insert(tables: &mut Tables, message: NewOutboxMessage) -> Result<(), OutboxStoreError> {
    if tables.outbox.iter().any(|m| m.key == message.key) {
        return Err(OutboxStoreError::UnexpectedError(format!(
            "duplicate outbox key {}",
            message.key
        )));
    }

    tables.next_outbox_id += 1;
    tables.outbox.push(OutboxMessage {
        id: tables.next_outbox_id,
        key: message.key,
        value: message.value,
        topic: message.topic,
        delivered: false,
        created_at: Utc::now(),
        deleted_at: None,
    });
    Ok(())
}

impl InMemoryOutboxStore {
    fn take_injected_failure(&self) -> Result<(), OutboxStoreError> {
        if self
            .db
            .faults
            .fail_next_outbox_append
            .swap(false, Ordering::SeqCst)
        {
            return Err(OutboxStoreError::UnexpectedError(
                "injected outbox append failure".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl OutboxStore for InMemoryOutboxStore {
    type Handle = InMemoryTransaction;

    async fn append(
        &self,
        scope: &TxScope<InMemoryTransaction>,
        message: NewOutboxMessage,
    ) -> Result<(), OutboxStoreError> {
        self.take_injected_failure()?;
        self.db
            .with_tables(scope, |tables| insert(tables, message))
            .await
            .map_err(OutboxStoreError::UnexpectedError)?
    }

    async fn append_batch(
        &self,
        scope: &TxScope<InMemoryTransaction>,
        messages: Vec<NewOutboxMessage>,
    ) -> Result<(), OutboxStoreError> {
        self.take_injected_failure()?;
        self.db
            .with_tables(scope, |tables| {
                let mut staged = tables.clone();
                for message in messages {
                    insert(&mut staged, message)?;
                }
                *tables = staged;
                Ok(())
            })
            .await
            .map_err(OutboxStoreError::UnexpectedError)?
    }

    async fn claim_batch(
        &self,
        scope: &TxScope<InMemoryTransaction>,
        topic: &Topic,
        limit: u32,
    ) -> Result<Vec<OutboxMessage>, OutboxStoreError> {
        self.db
            .with_tables(scope, |tables| {
                let mut pending: Vec<&mut OutboxMessage> = tables
                    .outbox
                    .iter_mut()
                    .filter(|m| &m.topic == topic && m.is_pending())
                    .collect();
                pending.sort_by_key(|m| (m.created_at, m.id));

                pending
                    .into_iter()
                    .take(limit as usize)
                    .map(|m| {
                        m.delivered = true;
                        m.clone()
                    })
                    .collect()
            })
            .await
            .map_err(OutboxStoreError::UnexpectedError)
    }

    async fn discard(
        &self,
        scope: &TxScope<InMemoryTransaction>,
        key: Uuid,
    ) -> Result<bool, OutboxStoreError> {
        self.db
            .with_tables(scope, |tables| {
                match tables
                    .outbox
                    .iter_mut()
                    .find(|m| m.key == key && m.deleted_at.is_none())
                {
                    Some(message) => {
                        message.deleted_at = Some(Utc::now());
                        true
                    }
                    None => false,
                }
            })
            .await
            .map_err(OutboxStoreError::UnexpectedError)
    }
}
