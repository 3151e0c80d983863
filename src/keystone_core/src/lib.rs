pub mod domain;
pub mod ports;

// Re-export commonly used types for convenience
pub use domain::{
    email::Email,
    events::{DomainEvent, LoginEvent, RegisterEvent},
    outbox::{NewOutboxMessage, OutboxMessage, Topic},
    password::{HashedPassword, Password},
    tokens::{
        AccessToken, AccessTokenClaims, AccessTokenError, AccessTokenPayload, RefreshToken,
        RegisterToken, TokenPair, TokenPolicy, generate_random_string,
    },
    user::{User, UserError, UserId},
};

pub use ports::{
    repositories::{OutboxStore, OutboxStoreError, UserStore, UserStoreError},
    services::{MessageBus, MessageBusError, MetricsSink, NoopMetrics, SecretProvider},
    transaction::{ConflictAware, CurrentHandle, TransactionError, TransactionManager, TxScope},
};
