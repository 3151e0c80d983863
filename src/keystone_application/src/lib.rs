pub mod auth_orchestrator;
pub mod confirm_link;
pub mod error;
pub mod event_publisher;
pub mod hashing;
pub mod outbox_dispatcher;
pub mod token_issuer;
pub mod transaction_coordinator;
pub mod use_cases;

pub use auth_orchestrator::{AuthApi, AuthOrchestrator};
pub use confirm_link::ConfirmLinkBuilder;
pub use error::AuthError;
pub use event_publisher::OutboxPublisher;
pub use outbox_dispatcher::{DispatchError, DispatcherSettings, OutboxDispatcher};
pub use token_issuer::TokenIssuer;
pub use transaction_coordinator::{DEFAULT_MAX_ATTEMPTS, TransactionCoordinator};
pub use use_cases::OAuthLogin;
