//! Errors surfaced by the auth facade and the form submitters.
//!
//! Every variant renders a message fit to show the user as-is. None of them
//! is fatal to the process.

use store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    /// A required input was blank. Carries the field's display name.
    #[error("Please fill in all required fields ({0} is missing)")]
    MissingField(&'static str),

    #[error("Please enter a valid email address")]
    InvalidEmail,

    #[error("An account with this email already exists. Please log in instead.")]
    DuplicateAccount,

    #[error("No account found with that email address. Please create an account first.")]
    AccountNotFound,

    #[error("The password you entered is incorrect")]
    InvalidCredential,

    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("Not authenticated")]
    NotAuthenticated,

    /// The selected directory strategy cannot perform this operation.
    #[error("{0} is not available for this account directory")]
    Unsupported(&'static str),

    #[error("External service failed: {0}")]
    ExternalServiceFailure(String),

    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl AuthError {
    pub fn external<T: Into<String>>(msg: T) -> Self {
        Self::ExternalServiceFailure(msg.into())
    }
}

impl From<reqwest::Error> for AuthError {
    fn from(e: reqwest::Error) -> Self {
        Self::ExternalServiceFailure(e.to_string())
    }
}

/// Result type alias for convenience
pub type Result<T, E = AuthError> = std::result::Result<T, E>;

/// Reject blank values; returns the trimmed input.
pub(crate) fn require<'a>(value: &'a str, field: &'static str) -> Result<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        Err(AuthError::MissingField(field))
    } else {
        Ok(value)
    }
}

/// Require a non-blank email with an `@` in it.
pub(crate) fn require_email(email: &str) -> Result<&str> {
    let email = require(email, "Email")?;
    if email.contains('@') {
        Ok(email)
    } else {
        Err(AuthError::InvalidEmail)
    }
}
