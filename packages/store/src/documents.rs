//! Profile documents mirrored for accounts held by a hosted identity provider.
//!
//! Each account is one JSON document at `<documents>/<uid>`. A second key,
//! `<email_index>/<email>`, maps the normalized email back to the uid so the
//! directory can answer email lookups without a query engine.

use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::kv::{get_json, set_json, KeyValueStore};
use crate::models::{normalize_email, Account};

pub struct DocumentTable<S: KeyValueStore> {
    store: S,
    documents: String,
    email_index: String,
}

impl<S: KeyValueStore> DocumentTable<S> {
    pub fn new(store: S) -> Self {
        Self::with_config(store, &StoreConfig::default())
    }

    pub fn with_config(store: S, config: &StoreConfig) -> Self {
        Self {
            store,
            documents: config.keys.documents.clone(),
            email_index: config.keys.email_index.clone(),
        }
    }

    fn document_key(&self, uid: &str) -> String {
        format!("{}/{}", self.documents, uid)
    }

    fn index_key(&self, email: &str) -> String {
        format!("{}/{}", self.email_index, normalize_email(email))
    }

    pub async fn get(&self, uid: &str) -> Result<Option<Account>, StoreError> {
        get_json(&self.store, &self.document_key(uid)).await
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        match self.store.get(&self.index_key(email)).await? {
            Some(uid) => self.get(&uid).await,
            None => Ok(None),
        }
    }

    /// Write the whole document for `account.id` and point its email at it.
    pub async fn put(&self, account: &Account) -> Result<(), StoreError> {
        if let Some(previous) = self.get(&account.id).await? {
            if normalize_email(&previous.email) != normalize_email(&account.email) {
                self.store.remove(&self.index_key(&previous.email)).await?;
            }
        }
        set_json(&self.store, &self.document_key(&account.id), account).await?;
        self.store
            .set(&self.index_key(&account.email), account.id.clone())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use crate::models::{Credential, Profile};
    use chrono::Utc;

    fn hosted(uid: &str, email: &str) -> Account {
        Account::new(
            uid,
            email,
            &Profile::default(),
            Credential::External {
                provider: "firebase".into(),
                subject: uid.into(),
            },
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn test_put_and_lookup() {
        let store = MemoryStore::new();
        let table = DocumentTable::new(store.clone());
        table.put(&hosted("uid-1", "a@x.com")).await.unwrap();

        assert_eq!(table.get("uid-1").await.unwrap().unwrap().email, "a@x.com");
        assert_eq!(
            table.find_by_email("A@x.com").await.unwrap().unwrap().id,
            "uid-1"
        );
        assert_eq!(
            store.keys(),
            vec!["users-by-email/a@x.com".to_string(), "users/uid-1".to_string()]
        );
    }

    #[tokio::test]
    async fn test_email_change_moves_index() {
        let table = DocumentTable::new(MemoryStore::new());
        let mut account = hosted("uid-1", "a@x.com");
        table.put(&account).await.unwrap();

        account.email = "b@x.com".into();
        table.put(&account).await.unwrap();

        assert!(table.find_by_email("a@x.com").await.unwrap().is_none());
        assert!(table.find_by_email("b@x.com").await.unwrap().is_some());
    }
}
