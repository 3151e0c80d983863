use std::sync::{
    Mutex,
    atomic::{AtomicBool, AtomicU32, Ordering},
};

use async_trait::async_trait;
use keystone_core::{
    Email, NewOutboxMessage, OutboxMessage, OutboxStore, OutboxStoreError, SecretProvider,
    TokenPolicy, Topic, TransactionError, TransactionManager, TxScope, User, UserId, UserStore,
    UserStoreError,
};
use secrecy::Secret;
use uuid::Uuid;

use crate::{
    confirm_link::ConfirmLinkBuilder, event_publisher::OutboxPublisher,
    token_issuer::TokenIssuer, transaction_coordinator::TransactionCoordinator,
};

pub const BASE_URL: &str = "http://localhost:8080";

#[derive(Default)]
pub struct MockTransactions {
    pub begun: AtomicU32,
    pub committed: AtomicU32,
    pub rolled_back: AtomicU32,
}

#[async_trait]
impl TransactionManager for MockTransactions {
    type Handle = ();

    async fn begin(&self) -> Result<(), TransactionError> {
        self.begun.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn commit(&self, _handle: ()) -> Result<(), TransactionError> {
        self.committed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn rollback(&self, _handle: ()) -> Result<(), TransactionError> {
        self.rolled_back.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Unversioned user table; enough to drive a single use case.
#[derive(Default)]
pub struct MockUserStore {
    pub users: Mutex<Vec<User>>,
}

impl MockUserStore {
    pub fn find(&self, email: &str) -> Option<User> {
        let email = Email::try_from(email).ok()?;
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email() == &email)
            .cloned()
    }
}

#[async_trait]
impl UserStore for MockUserStore {
    type Handle = ();

    async fn create(&self, _scope: &TxScope<()>, user: &User) -> Result<(), UserStoreError> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.email() == user.email()) {
            return Err(UserStoreError::UserAlreadyExists);
        }
        users.push(user.clone());
        Ok(())
    }

    async fn update(&self, _scope: &TxScope<()>, user: &User) -> Result<(), UserStoreError> {
        let mut users = self.users.lock().unwrap();
        let slot = users
            .iter_mut()
            .find(|u| u.id() == user.id())
            .ok_or(UserStoreError::UserNotFound)?;
        *slot = user.clone();
        Ok(())
    }

    async fn get_by_id(&self, _scope: &TxScope<()>, id: UserId) -> Result<User, UserStoreError> {
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id() == id)
            .cloned()
            .ok_or(UserStoreError::UserNotFound)
    }

    async fn get_by_email(
        &self,
        _scope: &TxScope<()>,
        email: &Email,
    ) -> Result<User, UserStoreError> {
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email() == email)
            .cloned()
            .ok_or(UserStoreError::UserNotFound)
    }

    async fn get_by_refresh_token(
        &self,
        _scope: &TxScope<()>,
        refresh_token: &str,
    ) -> Result<User, UserStoreError> {
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.refresh_token().is_some_and(|t| t.as_str() == refresh_token))
            .cloned()
            .ok_or(UserStoreError::UserNotFound)
    }
}

#[derive(Default)]
pub struct MockOutbox {
    pub messages: Mutex<Vec<NewOutboxMessage>>,
    pub fail_appends: AtomicBool,
}

impl MockOutbox {
    pub fn topics(&self) -> Vec<Topic> {
        self.messages
            .lock()
            .unwrap()
            .iter()
            .map(|m| m.topic.clone())
            .collect()
    }

    pub fn last_value(&self) -> serde_json::Value {
        let messages = self.messages.lock().unwrap();
        let last = messages.last().expect("no message staged");
        serde_json::from_slice(&last.value).unwrap()
    }
}

#[async_trait]
impl OutboxStore for MockOutbox {
    type Handle = ();

    async fn append(
        &self,
        _scope: &TxScope<()>,
        message: NewOutboxMessage,
    ) -> Result<(), OutboxStoreError> {
        if self.fail_appends.load(Ordering::SeqCst) {
            return Err(OutboxStoreError::UnexpectedError("outbox offline".to_string()));
        }
        self.messages.lock().unwrap().push(message);
        Ok(())
    }

    async fn append_batch(
        &self,
        scope: &TxScope<()>,
        messages: Vec<NewOutboxMessage>,
    ) -> Result<(), OutboxStoreError> {
        for message in messages {
            self.append(scope, message).await?;
        }
        Ok(())
    }

    async fn claim_batch(
        &self,
        _scope: &TxScope<()>,
        _topic: &Topic,
        _limit: u32,
    ) -> Result<Vec<OutboxMessage>, OutboxStoreError> {
        unimplemented!()
    }

    async fn discard(&self, _scope: &TxScope<()>, _key: Uuid) -> Result<bool, OutboxStoreError> {
        unimplemented!()
    }
}

pub struct FixedSecret;

impl SecretProvider for FixedSecret {
    fn signing_key(&self) -> Secret<String> {
        Secret::new("use-case-test-key".to_string())
    }
}

pub struct Fixture {
    pub coordinator: TransactionCoordinator<MockTransactions>,
    pub users: MockUserStore,
    pub publisher: OutboxPublisher<MockOutbox>,
    pub tokens: TokenIssuer<FixedSecret>,
    pub links: ConfirmLinkBuilder,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            coordinator: TransactionCoordinator::new(MockTransactions::default()),
            users: MockUserStore::default(),
            publisher: OutboxPublisher::new(MockOutbox::default()),
            tokens: TokenIssuer::new(TokenPolicy::default(), FixedSecret),
            links: ConfirmLinkBuilder::new(BASE_URL),
        }
    }

    pub fn outbox(&self) -> &MockOutbox {
        self.publisher.outbox()
    }

    pub fn transactions(&self) -> &MockTransactions {
        self.coordinator.manager()
    }
}
