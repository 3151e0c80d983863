use std::borrow::Cow;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Logical event channel an outbox row is published to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Topic(Cow<'static, str>);

impl Topic {
    pub const LOGINS: Topic = Topic(Cow::Borrowed("logins"));
    pub const REGISTERS: Topic = Topic(Cow::Borrowed("registers"));

    pub fn new(name: impl Into<String>) -> Self {
        Self(Cow::Owned(name.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A row about to be appended to the outbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOutboxMessage {
    pub key: Uuid,
    pub value: Vec<u8>,
    pub topic: Topic,
}

impl NewOutboxMessage {
    pub fn new(topic: Topic, value: Vec<u8>) -> Self {
        Self {
            key: Uuid::new_v4(),
            value,
            topic,
        }
    }
}

/// A persisted outbox row as returned by a claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutboxMessage {
    pub id: i64,
    pub key: Uuid,
    pub value: Vec<u8>,
    pub topic: Topic,
    pub delivered: bool,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl OutboxMessage {
    /// Eligible for the next claim of its topic.
    pub fn is_pending(&self) -> bool {
        !self.delivered && self.deleted_at.is_none()
    }
}
