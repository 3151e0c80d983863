use std::hash::{Hash, Hasher};
use std::sync::LazyLock;

use regex::Regex;
use secrecy::{ExposeSecret, Secret};

use super::user::UserError;

static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email regex is valid")
});

/// A syntactically valid email address.
///
/// The address is kept behind a [`Secret`] so it never ends up in `Debug`
/// output or tracing fields by accident.
#[derive(Debug, Clone)]
pub struct Email(Secret<String>);

impl Email {
    /// Lowercased, trimmed form used for uniqueness checks.
    fn normalize(raw: &str) -> String {
        raw.trim().to_lowercase()
    }
}

impl TryFrom<Secret<String>> for Email {
    type Error = UserError;

    fn try_from(value: Secret<String>) -> Result<Self, Self::Error> {
        let normalized = Self::normalize(value.expose_secret());
        if EMAIL_REGEX.is_match(&normalized) {
            Ok(Self(Secret::new(normalized)))
        } else {
            Err(UserError::InvalidEmail)
        }
    }
}

impl TryFrom<&str> for Email {
    type Error = UserError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::try_from(Secret::new(value.to_owned()))
    }
}

impl AsRef<Secret<String>> for Email {
    fn as_ref(&self) -> &Secret<String> {
        &self.0
    }
}

impl PartialEq for Email {
    fn eq(&self, other: &Self) -> bool {
        self.0.expose_secret() == other.0.expose_secret()
    }
}

impl Eq for Email {}

impl Hash for Email {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.expose_secret().hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fake::Fake;
    use fake::faker::internet::en::SafeEmail;
    use quickcheck::Gen;
    use quickcheck_macros::quickcheck;

    #[derive(Debug, Clone)]
    struct ValidEmailFixture(pub String);

    impl quickcheck::Arbitrary for ValidEmailFixture {
        fn arbitrary(_g: &mut Gen) -> Self {
            let email = SafeEmail().fake();
            Self(email)
        }
    }

    #[quickcheck]
    fn valid_emails_are_parsed_successfully(valid_email: ValidEmailFixture) -> bool {
        Email::try_from(valid_email.0.as_str()).is_ok()
    }

    #[test]
    fn empty_string_is_rejected() {
        assert!(matches!(Email::try_from(""), Err(UserError::InvalidEmail)));
    }

    #[test]
    fn email_missing_at_symbol_is_rejected() {
        assert!(Email::try_from("ursuladomain.com").is_err());
    }

    #[test]
    fn email_missing_subject_is_rejected() {
        assert!(Email::try_from("@domain.com").is_err());
    }

    #[test]
    fn emails_compare_case_insensitively() {
        let lower = Email::try_from("a@x.com").unwrap();
        let upper = Email::try_from("  A@X.COM ").unwrap();
        assert_eq!(lower, upper);
        assert_eq!(upper.as_ref().expose_secret(), "a@x.com");
    }
}
