//! # Key-value persistence — the seam every backend implements
//!
//! All persisted state (the account list, the active session, the remember-me
//! flag, hosted profile documents) is written as UTF-8 strings under string
//! keys. [`KeyValueStore`] is the async interface over that shape; the same
//! tables work against an in-memory map ([`crate::MemoryStore`]), a directory
//! of files ([`crate::FileStore`]) or the browser's `localStorage`
//! (`LocalStorageStore`, `web` feature on wasm32).
//!
//! The JSON helpers [`get_json`] and [`set_json`] are what the tables actually
//! call; backends only ever see opaque strings.

use std::future::Future;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::StoreError;

/// Async trait for storing and retrieving string values by key.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>, StoreError>>;
    fn set(&self, key: &str, value: String) -> impl Future<Output = Result<(), StoreError>>;
    fn remove(&self, key: &str) -> impl Future<Output = Result<(), StoreError>>;
}

/// Read and deserialize a JSON value stored under `key`.
pub async fn get_json<S, T>(store: &S, key: &str) -> Result<Option<T>, StoreError>
where
    S: KeyValueStore,
    T: DeserializeOwned,
{
    match store.get(key).await? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

/// Serialize `value` as JSON and store it under `key`.
pub async fn set_json<S, T>(store: &S, key: &str, value: &T) -> Result<(), StoreError>
where
    S: KeyValueStore,
    T: Serialize + ?Sized,
{
    let raw = serde_json::to_string(value)?;
    store.set(key, raw).await
}
