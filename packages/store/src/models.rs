//! # Domain models for accounts and their dashboard records
//!
//! These are the records persisted by the account table and the hosted
//! document table, and returned by the auth facade. Field names serialize in
//! camelCase (`fullName`, `erpConnections`, `lastLogin`, ...) so persisted
//! state matches what the web front end reads.
//!
//! ## Types
//!
//! | Struct | Represents |
//! |--------|-----------|
//! | [`Account`] | A registered user, credential included. Only the directory ever sees this. |
//! | [`AccountInfo`] | The credential-free projection held by the session and handed to the UI. |
//! | [`Credential`] | Either an Argon2 PHC hash (local directory) or a reference to a hosted identity. |
//! | [`Profile`] | The profile fields collected at signup. |
//! | [`ProfileUpdate`] | A partial update; `None` fields keep their stored value. |
//! | [`ErpConnection`] / [`MrpRun`] | Dashboard records appended by the user. |

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Normalize an email address for use as the directory key.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// How an account proves its identity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Credential {
    /// Argon2id hash in PHC string format.
    Password { hash: String },
    /// Identity held by an external provider.
    External { provider: String, subject: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionStatus {
    Connected,
    Pending,
    Disconnected,
}

/// A link between the account and one ERP system.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ErpConnection {
    /// ERP product tag, e.g. "NetSuite"
    #[serde(rename = "type")]
    pub kind: String,
    pub status: ConnectionStatus,
    pub date: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

/// A saved material-requirements-planning run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MrpRun {
    pub date: DateTime<Utc>,
    pub status: RunStatus,
    /// Free-text summary of the run output
    pub results: String,
}

/// Profile fields supplied at signup.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub full_name: String,
    pub company_name: String,
    pub job_title: String,
}

/// Full account record as persisted by a directory.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: String,
    pub full_name: String,
    pub company_name: String,
    pub job_title: String,
    pub email: String,
    pub credential: Credential,
    pub created_at: DateTime<Utc>,
    pub last_login: DateTime<Utc>,
    #[serde(default)]
    pub erp_connections: Vec<ErpConnection>,
    #[serde(default)]
    pub saved_mrp_runs: Vec<MrpRun>,
}

impl Account {
    /// Build a fresh account with empty connection and run lists.
    pub fn new(
        id: impl Into<String>,
        email: &str,
        profile: &Profile,
        credential: Credential,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            full_name: profile.full_name.trim().to_string(),
            company_name: profile.company_name.trim().to_string(),
            job_title: profile.job_title.trim().to_string(),
            email: normalize_email(email),
            credential,
            created_at: now,
            last_login: now,
            erp_connections: Vec::new(),
            saved_mrp_runs: Vec::new(),
        }
    }

    /// Stamp a login at `now`, keeping `last_login` strictly increasing even
    /// when the clock has not advanced since the previous one.
    pub fn touch_login(&mut self, now: DateTime<Utc>) {
        self.last_login = if now > self.last_login {
            now
        } else {
            self.last_login + Duration::microseconds(1)
        };
    }

    /// Convert to AccountInfo for client consumption.
    pub fn to_info(&self) -> AccountInfo {
        AccountInfo {
            id: self.id.clone(),
            full_name: self.full_name.clone(),
            company_name: self.company_name.clone(),
            job_title: self.job_title.clone(),
            email: self.email.clone(),
            created_at: self.created_at,
            last_login: self.last_login,
            erp_connections: self.erp_connections.clone(),
            saved_mrp_runs: self.saved_mrp_runs.clone(),
        }
    }
}

/// Account information safe to keep in the session and show in the UI.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountInfo {
    pub id: String,
    pub full_name: String,
    pub company_name: String,
    pub job_title: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub last_login: DateTime<Utc>,
    #[serde(default)]
    pub erp_connections: Vec<ErpConnection>,
    #[serde(default)]
    pub saved_mrp_runs: Vec<MrpRun>,
}

impl AccountInfo {
    /// Get display name, falling back to email if name is not set.
    pub fn display_name(&self) -> &str {
        if self.full_name.trim().is_empty() {
            &self.email
        } else {
            &self.full_name
        }
    }
}

/// Partial profile update. Only `Some` fields are written.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub full_name: Option<String>,
    pub company_name: Option<String>,
    pub job_title: Option<String>,
    pub erp_connections: Option<Vec<ErpConnection>>,
    pub saved_mrp_runs: Option<Vec<MrpRun>>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.full_name.is_none()
            && self.company_name.is_none()
            && self.job_title.is_none()
            && self.erp_connections.is_none()
            && self.saved_mrp_runs.is_none()
    }

    /// Merge the supplied fields into `account`, leaving the rest untouched.
    ///
    /// Identity fields (id, email, credential, timestamps) are never part of
    /// an update.
    pub fn apply(self, account: &mut Account) {
        if let Some(full_name) = self.full_name {
            account.full_name = full_name.trim().to_string();
        }
        if let Some(company_name) = self.company_name {
            account.company_name = company_name.trim().to_string();
        }
        if let Some(job_title) = self.job_title {
            account.job_title = job_title.trim().to_string();
        }
        if let Some(connections) = self.erp_connections {
            account.erp_connections = connections;
        }
        if let Some(runs) = self.saved_mrp_runs {
            account.saved_mrp_runs = runs;
        }
    }
}
