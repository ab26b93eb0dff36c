//! # Browser `localStorage` store — web persistence
//!
//! [`LocalStorageStore`] is the [`KeyValueStore`] used on the **web platform**.
//! It writes through `window.localStorage` via [`web_sys::Storage`], which is
//! where the site has always kept `registeredUsers`, `currentUser` and
//! `rememberMe`.
//!
//! ## Namespacing
//!
//! Keys are written exactly as given. Namespacing is done by the tables via
//! [`StoreConfig::with_prefix`](crate::StoreConfig::with_prefix), the same as
//! on every other backend, so `polymr.currentUser` names the same record
//! everywhere.
//!
//! ## Connection management
//!
//! The `Storage` handle is looked up on every operation. `web_sys::Storage`
//! is not `Send` and the lookup is a cheap property read.

use wasm_bindgen::JsValue;
use web_sys::Storage;

use crate::error::StoreError;
use crate::kv::KeyValueStore;

/// `localStorage`-backed KeyValueStore for the web platform.
#[derive(Clone, Debug, Default)]
pub struct LocalStorageStore;

impl LocalStorageStore {
    pub fn new() -> Self {
        Self
    }

    fn storage(&self) -> Result<Storage, StoreError> {
        let window = web_sys::window()
            .ok_or_else(|| StoreError::Unavailable("no window".to_string()))?;
        window
            .local_storage()
            .map_err(js_error)?
            .ok_or_else(|| StoreError::Unavailable("localStorage disabled".to_string()))
    }
}

fn js_error(value: JsValue) -> StoreError {
    StoreError::Unavailable(format!("{value:?}"))
}

impl KeyValueStore for LocalStorageStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.storage()?.get_item(key).map_err(js_error)
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        self.storage()?.set_item(key, &value).map_err(js_error)
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.storage()?.remove_item(key).map_err(js_error)
    }
}
