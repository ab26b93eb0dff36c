//! # Application context — construction and teardown
//!
//! The host UI builds one [`AppContext`] at startup and drops it (via
//! [`AppContext::shutdown`]) on exit. Everything the account flows need is
//! owned here and selected from [`Settings`]:
//!
//! | Setting | Effect |
//! |---------|--------|
//! | `directory = "local"` | [`LocalDirectory`] over the key-value store |
//! | `directory = "hosted"` | [`HostedDirectory`] backed by [`FirebaseIdentity`]; requires `provider.api_key` |
//! | `storage.prefix` | Namespaces every persisted key |
//! | `notifications.*` | [`FormSink`] endpoint and operator recipient |
//! | `session.*` | Maximum age of a restored session |
//!
//! Starting the context restores any persisted session.

use store::{KeyValueStore, StoreConfig};

use crate::auth::{FirebaseIdentity, IdentityConfig};
use crate::directory::{DirectoryBackend, HostedDirectory, LocalDirectory};
use crate::error::{AuthError, Result};
use crate::forms::{self, ContactMessage, ContactOutcome, DemoRequest};
use crate::notify::FormSink;
use crate::service::{AuthService, AuthState, ServiceOptions};
use crate::settings::{DirectoryKind, Settings};

/// The auth facade as composed by [`AppContext`].
pub type AppAuth<S> = AuthService<DirectoryBackend<S>, S, FormSink>;

pub struct AppContext<S: KeyValueStore + Clone> {
    auth: AppAuth<S>,
    recipient: String,
}

/// Key names for `settings`, before any on-disk override.
fn store_config(settings: &Settings) -> StoreConfig {
    match &settings.storage.prefix {
        Some(prefix) => StoreConfig::default().with_prefix(prefix),
        None => StoreConfig::default(),
    }
}

impl<S: KeyValueStore + Clone> AppContext<S> {
    /// Compose the context over `store` and restore any persisted session.
    pub async fn start(settings: &Settings, store: S) -> Result<Self> {
        Self::start_with_config(settings, store, store_config(settings)).await
    }

    pub async fn start_with_config(settings: &Settings, store: S, config: StoreConfig) -> Result<Self> {
        let directory = match settings.directory {
            DirectoryKind::Local => {
                DirectoryBackend::Local(LocalDirectory::with_config(store.clone(), &config))
            }
            DirectoryKind::Hosted => {
                let identity =
                    IdentityConfig::from_settings(&settings.provider).map_err(AuthError::external)?;
                DirectoryBackend::Hosted(HostedDirectory::with_config(
                    FirebaseIdentity::new(identity),
                    store.clone(),
                    &config,
                ))
            }
        };

        let auth = AuthService::new(
            directory,
            store::SessionStore::with_config(store, &config),
            FormSink::from_settings(&settings.notifications),
            ServiceOptions::from_settings(settings),
        );

        // An unreadable session store should not keep the app from starting.
        let state = match auth.restore().await {
            Ok(state) => state,
            Err(e) => {
                tracing::warn!("Failed to restore session: {}", e);
                AuthState::Anonymous
            }
        };
        tracing::info!(
            directory = ?settings.directory,
            authenticated = state.account().is_some(),
            notifications = auth.notifier().is_enabled(),
            "Application context started"
        );

        Ok(Self {
            auth,
            recipient: settings.notifications.recipient.clone(),
        })
    }

    pub fn auth(&self) -> &AppAuth<S> {
        &self.auth
    }

    pub async fn submit_demo_request(&self, request: &DemoRequest) -> Result<()> {
        forms::submit_demo_request(self.auth.notifier(), request, &self.recipient).await
    }

    pub async fn submit_contact(&self, message: &ContactMessage) -> Result<ContactOutcome> {
        forms::submit_contact(self.auth.notifier(), message, &self.recipient).await
    }

    /// Tear the context down. The persisted session is left in place so the
    /// next start can restore it.
    pub fn shutdown(self) {
        tracing::info!(
            authenticated = self.auth.is_authenticated(),
            "Application context stopped"
        );
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl AppContext<store::FileStore> {
    /// Start over a [`FileStore`](store::FileStore) rooted at
    /// `storage.dir`, honouring a `store.toml` found there.
    pub async fn open(settings: &Settings) -> Result<Self> {
        use std::io::ErrorKind;
        use store::StoreError;

        let dir = settings.storage.dir.clone();
        let path = dir.join(StoreConfig::filename());
        let mut config = match std::fs::read_to_string(&path) {
            Ok(raw) => StoreConfig::from_toml(&raw)
                .map_err(|e| StoreError::Unavailable(format!("{}: {}", path.display(), e)))?,
            Err(e) if e.kind() == ErrorKind::NotFound => StoreConfig::default(),
            Err(e) => return Err(StoreError::from(e).into()),
        };
        if let Some(prefix) = &settings.storage.prefix {
            config = config.with_prefix(prefix);
        }

        let store = store::FileStore::new(dir);
        tracing::debug!(dir = %store.base().display(), "Opening file store");
        Self::start_with_config(settings, store, config).await
    }
}

#[cfg(all(target_arch = "wasm32", feature = "web"))]
impl AppContext<store::LocalStorageStore> {
    /// Start over `window.localStorage`, namespaced by `storage.prefix` like
    /// every other backend.
    pub async fn open(settings: &Settings) -> Result<Self> {
        Self::start(settings, store::LocalStorageStore::new()).await
    }
}
