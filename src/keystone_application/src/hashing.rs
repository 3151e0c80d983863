use keystone_core::{HashedPassword, Password};

use crate::error::AuthError;

/// Hash `password` on the blocking pool, keeping the caller's span.
#[tracing::instrument(name = "Computing password hash", skip_all)]
pub async fn compute_password_hash(password: Password) -> Result<HashedPassword, AuthError> {
    let current_span: tracing::Span = tracing::Span::current();
    let hash = tokio::task::spawn_blocking(move || {
        current_span.in_scope(|| HashedPassword::compute(&password))
    })
    .await
    .map_err(|e| AuthError::Unexpected(e.to_string()))??;

    Ok(hash)
}

#[tracing::instrument(name = "Verify password hash", skip_all)]
pub async fn verify_password_hash(
    expected: HashedPassword,
    candidate: Password,
) -> Result<bool, AuthError> {
    let current_span: tracing::Span = tracing::Span::current();
    tokio::task::spawn_blocking(move || current_span.in_scope(|| expected.verify(&candidate)))
        .await
        .map_err(|e| AuthError::Unexpected(e.to_string()))
}
