use serde::{Deserialize, Serialize};

use super::outbox::Topic;

/// A payload published through the outbox on a fixed topic.
pub trait DomainEvent: Serialize + Send + Sync {
    const TOPIC: Topic;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterEvent {
    pub email: String,
    pub confirm_link: String,
}

impl DomainEvent for RegisterEvent {
    const TOPIC: Topic = Topic::REGISTERS;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginEvent {
    pub email: String,
}

impl DomainEvent for LoginEvent {
    const TOPIC: Topic = Topic::LOGINS;
}
