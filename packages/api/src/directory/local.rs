//! Accounts and password hashes kept in the local key-value store.

use chrono::Utc;
use store::{Account, AccountTable, Credential, KeyValueStore, Profile, StoreConfig, Upserted};
use uuid::Uuid;

use super::AccountDirectory;
use crate::auth::{hash_password, verify_password};
use crate::error::{AuthError, Result};

pub struct LocalDirectory<S: KeyValueStore> {
    accounts: AccountTable<S>,
}

impl<S: KeyValueStore> LocalDirectory<S> {
    pub fn new(store: S) -> Self {
        Self::with_config(store, &StoreConfig::default())
    }

    pub fn with_config(store: S, config: &StoreConfig) -> Self {
        Self {
            accounts: AccountTable::with_config(store, config),
        }
    }

    /// Every registered account.
    pub async fn all(&self) -> Result<Vec<Account>> {
        Ok(self.accounts.all().await?)
    }
}

impl<S: KeyValueStore> AccountDirectory for LocalDirectory<S> {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>> {
        Ok(self.accounts.find_by_email(email).await?)
    }

    async fn upsert(&self, account: &Account) -> Result<()> {
        if self.accounts.upsert(account).await? == Upserted::Inserted {
            tracing::debug!(account_id = %account.id, "Inserted account record");
        }
        Ok(())
    }

    async fn create_account(&self, email: &str, password: &str, profile: &Profile) -> Result<Account> {
        if self.accounts.find_by_email(email).await?.is_some() {
            return Err(AuthError::DuplicateAccount);
        }

        let hash = hash_password(password).map_err(AuthError::external)?;
        let account = Account::new(
            Uuid::new_v4().to_string(),
            email,
            profile,
            Credential::Password { hash },
            Utc::now(),
        );
        self.accounts.upsert(&account).await?;
        Ok(account)
    }

    async fn verify_credentials(&self, email: &str, password: &str) -> Result<Account> {
        let account = self
            .accounts
            .find_by_email(email)
            .await?
            .ok_or(AuthError::AccountNotFound)?;

        let Credential::Password { hash } = &account.credential else {
            return Err(AuthError::InvalidCredential);
        };
        match verify_password(password, hash) {
            Ok(true) => Ok(account),
            Ok(false) => Err(AuthError::InvalidCredential),
            Err(e) => {
                tracing::warn!(account_id = %account.id, "Stored credential unreadable: {}", e);
                Err(AuthError::InvalidCredential)
            }
        }
    }

    async fn send_password_reset(&self, email: &str) -> Result<()> {
        tracing::debug!(%email, "Local directory has no reset mail, ignoring request");
        Ok(())
    }

    async fn send_verification_email(&self, _account: &Account) -> Result<()> {
        Err(AuthError::Unsupported("Email verification"))
    }

    async fn apply_verification_code(&self, _code: &str) -> Result<()> {
        Err(AuthError::Unsupported("Email verification"))
    }

    async fn confirm_password_reset(&self, _code: &str, _new_password: &str) -> Result<()> {
        Err(AuthError::Unsupported("Password reset"))
    }

    fn sign_out(&self, _account_id: &str) {}
}
