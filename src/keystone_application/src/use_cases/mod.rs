pub mod confirm;
pub mod login;
pub mod oauth_login;
pub mod refresh;
pub mod register;
pub mod resend_confirmation;
pub mod verify_access_token;

#[cfg(test)]
pub(crate) mod test_support;

pub use confirm::ConfirmUseCase;
pub use login::LoginUseCase;
pub use oauth_login::{OAuthLogin, OAuthLoginUseCase};
pub use refresh::RefreshUseCase;
pub use register::RegisterUseCase;
pub use resend_confirmation::ResendConfirmationUseCase;
pub use verify_access_token::VerifyAccessTokenUseCase;
