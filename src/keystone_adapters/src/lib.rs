pub mod config;
pub mod http;
pub mod messaging;
pub mod metrics;
pub mod persistence;
pub mod secrets;

pub use http::{auth_routes, metrics_routes};
pub use messaging::{HttpMessageBus, InMemoryMessageBus};
pub use metrics::{InMemoryMetrics, PrometheusMetrics};
pub use persistence::{
    InMemoryDatabase, InMemoryOutboxStore, InMemoryTransaction, InMemoryUserStore, PgTransaction,
    PostgresOutboxStore, PostgresTransactionManager, PostgresUserStore,
};
pub use secrets::StaticSecretProvider;
