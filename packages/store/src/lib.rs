pub mod accounts;
pub mod config;
pub mod documents;
pub mod error;
pub mod kv;
pub mod models;
pub mod session;

mod file_store;
mod memory;
pub use file_store::FileStore;
pub use memory::MemoryStore;

#[cfg(all(target_arch = "wasm32", feature = "web"))]
mod local_storage;
#[cfg(all(target_arch = "wasm32", feature = "web"))]
pub use local_storage::LocalStorageStore;

pub use accounts::{AccountTable, Upserted};
pub use config::StoreConfig;
pub use documents::DocumentTable;
pub use error::StoreError;
pub use kv::KeyValueStore;
pub use models::{
    normalize_email, Account, AccountInfo, ConnectionStatus, Credential, ErpConnection, MrpRun,
    Profile, ProfileUpdate, RunStatus,
};
pub use session::{PersistedSession, SessionRecord, SessionStore};
