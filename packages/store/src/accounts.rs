//! # Account table — the persisted account list
//!
//! [`AccountTable`] keeps every registered [`Account`] as one JSON array under
//! the `keys.accounts` name of [`StoreConfig`] (default `registeredUsers`).
//! Lookups read the whole list; writes read-modify-write it. There is no
//! locking: two writers racing on the same backend (two browser tabs) resolve
//! as last write wins.
//!
//! | Method | Description |
//! |--------|-------------|
//! | [`all`](AccountTable::all) | Every stored account, in insertion order. |
//! | [`find_by_email`](AccountTable::find_by_email) | Case- and whitespace-insensitive email lookup. |
//! | [`upsert`](AccountTable::upsert) | Replace the record with the same email in place, or append. |

use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::kv::{get_json, set_json, KeyValueStore};
use crate::models::{normalize_email, Account};

/// Whether an upsert created a new record or replaced one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Upserted {
    Inserted,
    Replaced,
}

/// The list of registered accounts, stored under a single key.
pub struct AccountTable<S: KeyValueStore> {
    store: S,
    key: String,
}

impl<S: KeyValueStore> AccountTable<S> {
    pub fn new(store: S) -> Self {
        Self::with_config(store, &StoreConfig::default())
    }

    pub fn with_config(store: S, config: &StoreConfig) -> Self {
        Self {
            store,
            key: config.keys.accounts.clone(),
        }
    }

    /// All stored accounts; empty when nothing has been written yet.
    pub async fn all(&self) -> Result<Vec<Account>, StoreError> {
        Ok(get_json(&self.store, &self.key).await?.unwrap_or_default())
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        let email = normalize_email(email);
        Ok(self.all().await?.into_iter().find(|a| a.email == email))
    }

    /// Insert `account`, or replace the stored record with the same email.
    ///
    /// The stored record is replaced wholesale; callers that want to change a
    /// few fields load the account, merge, and upsert the result.
    pub async fn upsert(&self, account: &Account) -> Result<Upserted, StoreError> {
        let mut accounts = self.all().await?;
        let email = normalize_email(&account.email);
        let outcome = match accounts.iter_mut().find(|a| a.email == email) {
            Some(existing) => {
                *existing = account.clone();
                existing.email = email;
                Upserted::Replaced
            }
            None => {
                let mut account = account.clone();
                account.email = email;
                accounts.push(account);
                Upserted::Inserted
            }
        };
        set_json(&self.store, &self.key, &accounts).await?;
        Ok(outcome)
    }
}
