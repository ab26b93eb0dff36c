//! # Application settings
//!
//! Layered with the `config` crate, lowest precedence first:
//!
//! 1. built-in defaults (below),
//! 2. an optional `polymr.toml` in the working directory,
//! 3. environment variables prefixed `POLYMR_`, with `__` between nested keys
//!    (`POLYMR_SESSION__MAX_AGE_SECS=3600`, `POLYMR_PROVIDER__API_KEY=...`).
//!
//! A `.env` file is loaded into the environment first via `dotenvy`.

use std::path::{Path, PathBuf};

use chrono::Duration;
use config::{Config, ConfigError, Environment, File, FileFormat, FileSourceFile};
use serde::Deserialize;

/// Which account directory strategy the app is composed with.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DirectoryKind {
    /// Accounts live in the local key-value store.
    Local,
    /// Accounts live with a hosted identity provider.
    Hosted,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Storage {
    pub dir: PathBuf,
    /// Optional namespace for every persisted key
    #[serde(default)]
    pub prefix: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Session {
    pub max_age_secs: u64,
    pub remember_max_age_secs: u64,
}

impl Session {
    /// How long a persisted session stays valid.
    pub fn max_age(&self, remember_me: bool) -> Duration {
        let secs = if remember_me {
            self.remember_max_age_secs
        } else {
            self.max_age_secs
        };
        // Clamp to what chrono can represent.
        Duration::seconds(secs.min((i64::MAX / 1_000) as u64) as i64)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Notifications {
    /// Form endpoint receiving operator notifications; unset disables sending
    #[serde(default)]
    pub endpoint: Option<String>,
    pub recipient: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Provider {
    pub name: String,
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub directory: DirectoryKind,
    pub storage: Storage,
    pub session: Session,
    pub notifications: Notifications,
    pub provider: Provider,
}

impl Settings {
    /// Load settings from defaults, `polymr.toml` (if present) and the environment.
    pub fn new() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::build(
            File::with_name("polymr")
                .format(FileFormat::Toml)
                .required(false),
        )
    }

    /// Load settings with `path` as the (required) TOML file layer.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        Self::build(File::from(path).format(FileFormat::Toml).required(true))
    }

    fn build(file: File<FileSourceFile, FileFormat>) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .set_default("directory", "local")?
            .set_default("storage.dir", default_storage_dir())?
            .set_default("session.max_age_secs", 60 * 60 * 24 * 7)?
            .set_default("session.remember_max_age_secs", 60 * 60 * 24 * 30)?
            .set_default("notifications.recipient", "polymrai.business@gmail.com")?
            .set_default("provider.name", "firebase")?
            .set_default(
                "provider.base_url",
                "https://identitytoolkit.googleapis.com/v1",
            )?
            .add_source(file)
            .add_source(
                Environment::with_prefix("POLYMR")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn default_storage_dir() -> String {
    dirs::data_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("polymr")
        .to_string_lossy()
        .into_owned()
}

#[cfg(target_arch = "wasm32")]
fn default_storage_dir() -> String {
    String::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env::set_var;

    #[test]
    fn test_settings_defaults_and_env() {
        set_var("POLYMR_SESSION__REMEMBER_MAX_AGE_SECS", "120");
        let settings = Settings::new().unwrap();
        assert_eq!(settings.session.max_age_secs, 60 * 60 * 24 * 7);
        assert_eq!(settings.session.remember_max_age_secs, 120);
        assert_eq!(settings.session.max_age(true), Duration::seconds(120));
        assert_eq!(settings.provider.name, "firebase");
        assert!(settings.storage.dir.ends_with("polymr"));
    }

    #[test]
    fn test_settings_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("polymr.toml");
        std::fs::write(
            &path,
            r#"
directory = "hosted"

[notifications]
endpoint = "https://formspree.io/f/test"
recipient = "ops@example.com"

[provider]
api_key = "key-123"
"#,
        )
        .unwrap();

        let settings = Settings::from_file(&path).unwrap();
        assert_eq!(settings.directory, DirectoryKind::Hosted);
        assert_eq!(
            settings.notifications.endpoint.as_deref(),
            Some("https://formspree.io/f/test")
        );
        assert_eq!(settings.notifications.recipient, "ops@example.com");
        assert_eq!(settings.provider.api_key, "key-123");
        assert_eq!(
            settings.provider.base_url,
            "https://identitytoolkit.googleapis.com/v1"
        );
    }
}
