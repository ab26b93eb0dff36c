//! # Session store — the persisted active-account slot
//!
//! Persists which account is signed in so the UI can reload without asking
//! for credentials again. Two keys are used:
//!
//! | Key (default) | Value |
//! |---------------|-------|
//! | `currentUser` | JSON [`SessionRecord`]: the [`AccountInfo`] plus the sign-in time |
//! | `rememberMe` | `"true"` when the user ticked "remember me", absent otherwise |
//!
//! The store only reads and writes. It does not decide whether a loaded
//! record is still trustworthy; the auth service re-validates it against the
//! account directory before treating anyone as signed in.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::kv::{set_json, KeyValueStore};
use crate::models::AccountInfo;

const REMEMBER_ME_VALUE: &str = "true";

/// Session data stored in the session store.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub account: AccountInfo,
    pub signed_in_at: DateTime<Utc>,
}

/// What [`SessionStore::load`] found on disk.
#[derive(Clone, Debug, PartialEq)]
pub struct PersistedSession {
    pub record: SessionRecord,
    pub remember_me: bool,
}

pub struct SessionStore<S: KeyValueStore> {
    store: S,
    current_user: String,
    remember_me: String,
}

impl<S: KeyValueStore> SessionStore<S> {
    pub fn new(store: S) -> Self {
        Self::with_config(store, &StoreConfig::default())
    }

    pub fn with_config(store: S, config: &StoreConfig) -> Self {
        Self {
            store,
            current_user: config.keys.current_user.clone(),
            remember_me: config.keys.remember_me.clone(),
        }
    }

    /// Read the persisted session, if any.
    ///
    /// A record that no longer parses is removed and reported as absent.
    pub async fn load(&self) -> Result<Option<PersistedSession>, StoreError> {
        let Some(raw) = self.store.get(&self.current_user).await? else {
            return Ok(None);
        };
        let record: SessionRecord = match serde_json::from_str(&raw) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!("Discarding unreadable session record: {}", e);
                self.clear().await?;
                return Ok(None);
            }
        };
        let remember_me =
            self.store.get(&self.remember_me).await?.as_deref() == Some(REMEMBER_ME_VALUE);
        Ok(Some(PersistedSession {
            record,
            remember_me,
        }))
    }

    /// Overwrite the persisted session.
    pub async fn save(&self, record: &SessionRecord, remember_me: bool) -> Result<(), StoreError> {
        set_json(&self.store, &self.current_user, record).await?;
        if remember_me {
            self.store
                .set(&self.remember_me, REMEMBER_ME_VALUE.to_string())
                .await
        } else {
            self.store.remove(&self.remember_me).await
        }
    }

    /// Remove the persisted session and the remember-me flag.
    pub async fn clear(&self) -> Result<(), StoreError> {
        self.store.remove(&self.current_user).await?;
        self.store.remove(&self.remember_me).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use crate::models::{Account, Credential, Profile};

    fn record() -> SessionRecord {
        let account = Account::new(
            "id-1",
            "a@x.com",
            &Profile::default(),
            Credential::Password { hash: "h".into() },
            Utc::now(),
        );
        SessionRecord {
            account: account.to_info(),
            signed_in_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_load_empty() {
        let sessions = SessionStore::new(MemoryStore::new());
        assert!(sessions.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_load_clear() {
        let store = MemoryStore::new();
        let sessions = SessionStore::new(store.clone());
        let record = record();

        sessions.save(&record, true).await.unwrap();
        let loaded = sessions.load().await.unwrap().unwrap();
        assert_eq!(loaded.record, record);
        assert!(loaded.remember_me);

        // Saving without remember-me drops a stale flag
        sessions.save(&record, false).await.unwrap();
        assert!(!sessions.load().await.unwrap().unwrap().remember_me);

        sessions.save(&record, true).await.unwrap();
        sessions.clear().await.unwrap();
        assert!(sessions.load().await.unwrap().is_none());
        assert!(store.keys().is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_record_is_discarded() {
        let store = MemoryStore::new();
        store.set("currentUser", "{not json".into()).await.unwrap();
        store.set("rememberMe", "true".into()).await.unwrap();

        let sessions = SessionStore::new(store.clone());
        assert!(sessions.load().await.unwrap().is_none());
        assert!(store.keys().is_empty());
    }
}
