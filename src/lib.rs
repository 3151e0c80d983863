//! # Keystone - Transactional Outbox Authentication Service
//!
//! Facade crate that re-exports the public APIs of the keystone components.
//!
//! ## Structure
//!
//! - **Core domain types**: `Email`, `Password`, `User`, tokens, outbox rows
//! - **Ports**: `UserStore`, `OutboxStore`, `TransactionManager`, `MessageBus`
//! - **Application**: use cases, `TransactionCoordinator`, `OutboxDispatcher`
//! - **Adapters**: Postgres and in-memory persistence, message buses, HTTP routes
//! - **Service**: `AuthService` and `Application`, the runnable entry points

/// Core domain types and value objects
pub mod core {
    pub use keystone_core::*;
}

pub use keystone_core::{
    DomainEvent, Email, HashedPassword, LoginEvent, OutboxMessage, Password, RegisterEvent,
    TokenPair, TokenPolicy, Topic, User, UserError, UserId,
};

/// Port definitions implemented by the adapters
pub mod ports {
    pub use keystone_core::{
        ConflictAware, CurrentHandle, MessageBus, MessageBusError, MetricsSink, OutboxStore,
        OutboxStoreError, SecretProvider, TransactionError, TransactionManager, TxScope,
        UserStore, UserStoreError,
    };
}

/// Use cases and orchestration
pub mod application {
    pub use keystone_application::*;
}

pub use keystone_application::{
    AuthApi, AuthError, AuthOrchestrator, OutboxDispatcher, TransactionCoordinator,
};

/// Infrastructure adapters
pub mod adapters {
    pub use keystone_adapters::*;
}

pub use keystone_adapters::{
    HttpMessageBus, InMemoryDatabase, InMemoryMessageBus, PostgresOutboxStore,
    PostgresTransactionManager, PostgresUserStore, PrometheusMetrics, config::KeystoneSettings,
};

pub use keystone_auth_service::{Application, AuthService};

/// Re-export async-trait for implementing the ports
pub use async_trait::async_trait;

/// Re-export secrecy for working with secrets
pub use secrecy::{ExposeSecret, Secret};

/// Cancels the server and the outbox dispatcher
pub use tokio_util::sync::CancellationToken;
