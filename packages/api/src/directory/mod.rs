//! # Account directory — one capability, two strategies
//!
//! [`AccountDirectory`] is the set of all registered accounts plus the
//! credential operations that go with it. Two implementations exist and they
//! are never mixed:
//!
//! | Strategy | Accounts | Credentials |
//! |----------|----------|-------------|
//! | [`LocalDirectory`] | JSON list in a key-value store | Argon2 hashes stored on the account |
//! | [`HostedDirectory`] | Profile documents keyed by provider uid | Held by an [`IdentityProvider`](crate::auth::IdentityProvider) |
//!
//! [`DirectoryBackend`] picks one at composition time from settings.
//!
//! `upsert` always replaces the stored record with the one given. Callers
//! that change a few fields load, merge (see `store::ProfileUpdate::apply`)
//! and upsert the result.

use std::future::Future;

use store::{Account, KeyValueStore, Profile};

use crate::auth::{FirebaseIdentity, IdentityProvider};
use crate::error::Result;

mod hosted;
mod local;

pub use hosted::HostedDirectory;
pub use local::LocalDirectory;

/// Async trait over the registered-account set.
pub trait AccountDirectory {
    fn find_by_email(&self, email: &str) -> impl Future<Output = Result<Option<Account>>>;

    fn upsert(&self, account: &Account) -> impl Future<Output = Result<()>>;

    /// Create a new account; `DuplicateAccount` when the email is taken.
    fn create_account(
        &self,
        email: &str,
        password: &str,
        profile: &Profile,
    ) -> impl Future<Output = Result<Account>>;

    /// `AccountNotFound` for an unknown email, `InvalidCredential` on mismatch.
    fn verify_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<Account>>;

    fn send_password_reset(&self, email: &str) -> impl Future<Output = Result<()>>;

    fn send_verification_email(&self, account: &Account) -> impl Future<Output = Result<()>>;

    fn apply_verification_code(&self, code: &str) -> impl Future<Output = Result<()>>;

    fn confirm_password_reset(
        &self,
        code: &str,
        new_password: &str,
    ) -> impl Future<Output = Result<()>>;

    /// Drop anything held in memory for a signed-out account.
    fn sign_out(&self, account_id: &str);
}

/// The directory strategy selected at startup.
pub enum DirectoryBackend<S: KeyValueStore, P: IdentityProvider = FirebaseIdentity> {
    Local(LocalDirectory<S>),
    Hosted(HostedDirectory<P, S>),
}

impl<S: KeyValueStore, P: IdentityProvider> AccountDirectory for DirectoryBackend<S, P> {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>> {
        match self {
            Self::Local(d) => d.find_by_email(email).await,
            Self::Hosted(d) => d.find_by_email(email).await,
        }
    }

    async fn upsert(&self, account: &Account) -> Result<()> {
        match self {
            Self::Local(d) => d.upsert(account).await,
            Self::Hosted(d) => d.upsert(account).await,
        }
    }

    async fn create_account(&self, email: &str, password: &str, profile: &Profile) -> Result<Account> {
        match self {
            Self::Local(d) => d.create_account(email, password, profile).await,
            Self::Hosted(d) => d.create_account(email, password, profile).await,
        }
    }

    async fn verify_credentials(&self, email: &str, password: &str) -> Result<Account> {
        match self {
            Self::Local(d) => d.verify_credentials(email, password).await,
            Self::Hosted(d) => d.verify_credentials(email, password).await,
        }
    }

    async fn send_password_reset(&self, email: &str) -> Result<()> {
        match self {
            Self::Local(d) => d.send_password_reset(email).await,
            Self::Hosted(d) => d.send_password_reset(email).await,
        }
    }

    async fn send_verification_email(&self, account: &Account) -> Result<()> {
        match self {
            Self::Local(d) => d.send_verification_email(account).await,
            Self::Hosted(d) => d.send_verification_email(account).await,
        }
    }

    async fn apply_verification_code(&self, code: &str) -> Result<()> {
        match self {
            Self::Local(d) => d.apply_verification_code(code).await,
            Self::Hosted(d) => d.apply_verification_code(code).await,
        }
    }

    async fn confirm_password_reset(&self, code: &str, new_password: &str) -> Result<()> {
        match self {
            Self::Local(d) => d.confirm_password_reset(code, new_password).await,
            Self::Hosted(d) => d.confirm_password_reset(code, new_password).await,
        }
    }

    fn sign_out(&self, account_id: &str) {
        match self {
            Self::Local(d) => d.sign_out(account_id),
            Self::Hosted(d) => d.sign_out(account_id),
        }
    }
}
