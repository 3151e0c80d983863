pub mod auth_service;
pub mod shutdown;
pub mod startup;
pub mod telemetry;

pub use auth_service::AuthService;
pub use shutdown::shutdown_signal;
pub use startup::{Application, StartupError, configure_postgresql};
