use argon2::{
    Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version,
    password_hash::{SaltString, rand_core::OsRng},
};
use secrecy::{ExposeSecret, Secret};

use super::user::UserError;

/// A plaintext password candidate as received from the caller.
#[derive(Debug, Clone)]
pub struct Password(Secret<String>);

impl TryFrom<Secret<String>> for Password {
    type Error = UserError;

    fn try_from(value: Secret<String>) -> Result<Self, Self::Error> {
        if value.expose_secret().is_empty() {
            return Err(UserError::InvalidPassword);
        }
        Ok(Self(value))
    }
}

impl TryFrom<&str> for Password {
    type Error = UserError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::try_from(Secret::new(value.to_owned()))
    }
}

impl AsRef<Secret<String>> for Password {
    fn as_ref(&self) -> &Secret<String> {
        &self.0
    }
}

/// Argon2id hash of a password in PHC string format.
#[derive(Debug, Clone)]
pub struct HashedPassword(Secret<String>);

impl HashedPassword {
    /// Wrap a hash loaded from storage, checking it is a well-formed PHC string.
    pub fn parse(hash: Secret<String>) -> Result<Self, UserError> {
        PasswordHash::new(hash.expose_secret())
            .map_err(|e| UserError::PasswordHash(e.to_string()))?;
        Ok(Self(hash))
    }

    /// Hash `password` with a fresh salt. CPU bound; call from a blocking context.
    pub fn compute(password: &Password) -> Result<Self, UserError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = hasher()?
            .hash_password(password.as_ref().expose_secret().as_bytes(), &salt)
            .map_err(|e| UserError::PasswordHash(e.to_string()))?;
        Ok(Self(Secret::new(hash.to_string())))
    }

    /// One-way comparison of `candidate` against this hash. CPU bound.
    pub fn verify(&self, candidate: &Password) -> bool {
        let Ok(expected) = PasswordHash::new(self.0.expose_secret()) else {
            return false;
        };
        let Ok(hasher) = hasher() else {
            return false;
        };
        hasher
            .verify_password(candidate.as_ref().expose_secret().as_bytes(), &expected)
            .is_ok()
    }
}

impl AsRef<Secret<String>> for HashedPassword {
    fn as_ref(&self) -> &Secret<String> {
        &self.0
    }
}

fn hasher() -> Result<Argon2<'static>, UserError> {
    let params =
        Params::new(15000, 2, 1, None).map_err(|e| UserError::PasswordHash(e.to_string()))?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}
