//! The hosted identity provider contract.
//!
//! The provider owns credentials: it creates accounts, checks passwords, and
//! sends the verification and password-reset emails. Profile data is not its
//! concern; the hosted directory mirrors that into a document table.

use std::future::Future;

use thiserror::Error;

use crate::error::AuthError;

/// An identity as the provider reports it after signup or sign-in.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderAccount {
    /// Provider-generated stable user id
    pub uid: String,
    pub email: String,
    /// Short-lived token authorizing follow-up calls for this user
    pub id_token: String,
}

/// Provider-specific failure reasons.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProviderError {
    #[error("email already registered")]
    EmailExists,
    #[error("email not registered")]
    EmailNotFound,
    #[error("invalid password")]
    InvalidPassword,
    /// Any other refusal, with the provider's reason code.
    #[error("provider rejected request: {0}")]
    Rejected(String),
    #[error("provider unreachable: {0}")]
    Transport(String),
}

impl From<ProviderError> for AuthError {
    fn from(e: ProviderError) -> Self {
        match e {
            ProviderError::EmailExists => AuthError::DuplicateAccount,
            ProviderError::EmailNotFound => AuthError::AccountNotFound,
            ProviderError::InvalidPassword => AuthError::InvalidCredential,
            other => AuthError::ExternalServiceFailure(other.to_string()),
        }
    }
}

/// Async trait for a hosted identity provider.
pub trait IdentityProvider {
    /// Short name recorded on external credentials.
    fn name(&self) -> &str;

    fn create_account(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<ProviderAccount, ProviderError>>;

    fn verify_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<ProviderAccount, ProviderError>>;

    fn send_verification_email(
        &self,
        account: &ProviderAccount,
    ) -> impl Future<Output = Result<(), ProviderError>>;

    fn send_password_reset(&self, email: &str) -> impl Future<Output = Result<(), ProviderError>>;

    fn apply_verification_code(&self, code: &str)
        -> impl Future<Output = Result<(), ProviderError>>;

    fn confirm_password_reset(
        &self,
        code: &str,
        new_password: &str,
    ) -> impl Future<Output = Result<(), ProviderError>>;
}
