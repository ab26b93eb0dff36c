//! # Store configuration — `store.toml`
//!
//! Names the keys under which the tables persist their records. The defaults
//! match the layout the web front end has always used in `localStorage`, so a
//! missing or empty config file is equivalent to the default configuration.
//!
//! ## Structure
//!
//! ```toml
//! [keys]
//! accounts = "registeredUsers"
//! current_user = "currentUser"
//! remember_me = "rememberMe"
//! documents = "users"
//! email_index = "users-by-email"
//! ```
//!
//! [`StoreConfig::with_prefix`] namespaces every key (`"polymr"` turns
//! `registeredUsers` into `polymr.registeredUsers`).

use serde::{Deserialize, Serialize};

/// Top-level configuration stored in `store.toml`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub keys: KeyNames,
}

/// Key names used by the tables.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KeyNames {
    #[serde(default = "default_accounts")]
    pub accounts: String,
    #[serde(default = "default_current_user")]
    pub current_user: String,
    #[serde(default = "default_remember_me")]
    pub remember_me: String,
    /// Prefix for hosted profile documents: `<documents>/<uid>`
    #[serde(default = "default_documents")]
    pub documents: String,
    /// Prefix for the hosted email → uid index: `<email_index>/<email>`
    #[serde(default = "default_email_index")]
    pub email_index: String,
}

fn default_accounts() -> String {
    "registeredUsers".to_string()
}

fn default_current_user() -> String {
    "currentUser".to_string()
}

fn default_remember_me() -> String {
    "rememberMe".to_string()
}

fn default_documents() -> String {
    "users".to_string()
}

fn default_email_index() -> String {
    "users-by-email".to_string()
}

impl Default for KeyNames {
    fn default() -> Self {
        Self {
            accounts: default_accounts(),
            current_user: default_current_user(),
            remember_me: default_remember_me(),
            documents: default_documents(),
            email_index: default_email_index(),
        }
    }
}

impl StoreConfig {
    /// Builder method to namespace every key with `"<prefix>."`.
    pub fn with_prefix(mut self, prefix: &str) -> Self {
        let keys = &mut self.keys;
        for key in [
            &mut keys.accounts,
            &mut keys.current_user,
            &mut keys.remember_me,
            &mut keys.documents,
            &mut keys.email_index,
        ] {
            *key = format!("{prefix}.{key}");
        }
        self
    }

    /// The well-known filename for the config file.
    pub fn filename() -> &'static str {
        "store.toml"
    }

    /// Parse from TOML string.
    pub fn from_toml(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    /// Serialize to TOML string.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}
