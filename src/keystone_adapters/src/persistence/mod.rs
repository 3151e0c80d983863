pub mod in_memory_database;
pub mod postgres_outbox_store;
pub mod postgres_transaction;
pub mod postgres_user_store;
pub mod user_record;

pub use in_memory_database::{
    InMemoryDatabase, InMemoryOutboxStore, InMemoryTransaction, InMemoryUserStore,
};
pub use postgres_outbox_store::PostgresOutboxStore;
pub use postgres_transaction::{PgTransaction, PostgresTransactionManager};
pub use postgres_user_store::PostgresUserStore;
pub use user_record::UserRecord;
