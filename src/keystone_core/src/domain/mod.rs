pub mod email;
pub mod events;
pub mod outbox;
pub mod password;
pub mod tokens;
pub mod user;
