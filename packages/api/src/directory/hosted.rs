//! Accounts whose credentials live with a hosted identity provider.
//!
//! The provider creates and verifies identities; profile fields are mirrored
//! into a [`DocumentTable`] keyed by the provider's uid. ID tokens returned by
//! signup and sign-in are kept in memory until sign-out so a verification
//! email can be re-sent for the signed-in account. A session restored after a
//! restart holds no token; resending then asks the user to sign in again.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use store::{normalize_email, Account, Credential, DocumentTable, KeyValueStore, Profile, StoreConfig};

use super::AccountDirectory;
use crate::auth::{IdentityProvider, ProviderAccount};
use crate::error::{AuthError, Result};

pub struct HostedDirectory<P: IdentityProvider, S: KeyValueStore> {
    provider: P,
    documents: DocumentTable<S>,
    tokens: Mutex<HashMap<String, ProviderAccount>>,
}

impl<P: IdentityProvider, S: KeyValueStore> HostedDirectory<P, S> {
    pub fn new(provider: P, documents: S) -> Self {
        Self::with_config(provider, documents, &StoreConfig::default())
    }

    pub fn with_config(provider: P, documents: S, config: &StoreConfig) -> Self {
        Self {
            provider,
            documents: DocumentTable::with_config(documents, config),
            tokens: Mutex::new(HashMap::new()),
        }
    }

    fn tokens(&self) -> MutexGuard<'_, HashMap<String, ProviderAccount>> {
        self.tokens.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn remember(&self, identity: ProviderAccount) {
        self.tokens().insert(identity.uid.clone(), identity);
    }
}

impl<P: IdentityProvider, S: KeyValueStore> AccountDirectory for HostedDirectory<P, S> {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>> {
        Ok(self.documents.find_by_email(email).await?)
    }

    async fn upsert(&self, account: &Account) -> Result<()> {
        Ok(self.documents.put(account).await?)
    }

    async fn create_account(&self, email: &str, password: &str, profile: &Profile) -> Result<Account> {
        let email = normalize_email(email);
        let identity = self.provider.create_account(&email, password).await?;

        // The account exists at the provider now; a missing verification
        // mail must not abort the mirror write.
        if let Err(e) = self.provider.send_verification_email(&identity).await {
            tracing::warn!(uid = %identity.uid, "Failed to send verification email: {}", e);
        }

        let account = Account::new(
            identity.uid.clone(),
            &email,
            profile,
            Credential::External {
                provider: self.provider.name().to_string(),
                subject: identity.uid.clone(),
            },
            Utc::now(),
        );
        self.documents.put(&account).await?;
        self.remember(identity);
        Ok(account)
    }

    async fn verify_credentials(&self, email: &str, password: &str) -> Result<Account> {
        let identity = self
            .provider
            .verify_credentials(&normalize_email(email), password)
            .await?;

        let Some(account) = self.documents.get(&identity.uid).await? else {
            tracing::warn!(uid = %identity.uid, "Provider identity has no profile document");
            return Err(AuthError::AccountNotFound);
        };
        self.remember(identity);
        Ok(account)
    }

    async fn send_password_reset(&self, email: &str) -> Result<()> {
        Ok(self
            .provider
            .send_password_reset(&normalize_email(email))
            .await?)
    }

    async fn send_verification_email(&self, account: &Account) -> Result<()> {
        let identity = self
            .tokens()
            .get(&account.id)
            .cloned()
            .ok_or_else(|| {
                AuthError::external("Please sign in again to resend the verification email")
            })?;
        Ok(self.provider.send_verification_email(&identity).await?)
    }

    async fn apply_verification_code(&self, code: &str) -> Result<()> {
        Ok(self.provider.apply_verification_code(code).await?)
    }

    async fn confirm_password_reset(&self, code: &str, new_password: &str) -> Result<()> {
        Ok(self
            .provider
            .confirm_password_reset(code, new_password)
            .await?)
    }

    fn sign_out(&self, account_id: &str) {
        if self.tokens().remove(account_id).is_some() {
            tracing::debug!(uid = %account_id, "Dropped provider token");
        }
    }
}
