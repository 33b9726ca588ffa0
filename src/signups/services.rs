use lazy_static::lazy_static;
use regex::Regex;

use super::SignupError;

pub const DEFAULT_SOURCE: &str = "landing_page";

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Validated signup input: email normalized, source defaulted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSignup {
    email: String,
    source: String,
}

impl NewSignup {
    pub fn new(email: &str, source: Option<&str>) -> Result<Self, SignupError> {
        let email = normalize_email(email);
        if !is_valid_email(&email) {
            return Err(SignupError::InvalidEmail(email));
        }
        let source = source
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_SOURCE)
            .to_owned();
        Ok(Self { email, source })
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}
