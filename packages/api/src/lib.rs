//! # API crate — account, session and notification core for polymr.ai
//!
//! This crate is what the marketing site's UI talks to. It owns the signed-in
//! session, the registered-account directory, and the operator notifications
//! sent on signup, login, demo requests and contact messages. Persistence is
//! delegated to the `store` crate.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`auth`] | Argon2 password hashing and the hosted identity provider client (Identity Toolkit REST API) |
//! | [`context`] | [`AppContext`]: composes everything from [`Settings`] at startup, torn down on exit |
//! | [`directory`] | [`AccountDirectory`] with its local and hosted strategies |
//! | [`error`] | [`AuthError`], the user-facing error taxonomy |
//! | [`forms`] | Signup, demo request and contact forms |
//! | [`notify`] | [`Notification`] and the form-endpoint [`FormSink`] |
//! | [`service`] | [`AuthService`], the Anonymous/Authenticated state machine |
//! | [`settings`] | Layered configuration (`polymr.toml`, `POLYMR_*` env vars) |
//! | [`telemetry`] | `tracing` subscriber setup |
//!
//! ## Typical use
//!
//! ```no_run
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! api::telemetry::init_tracing();
//! let settings = api::Settings::new()?;
//! let context = api::AppContext::open(&settings).await?;
//! if !context.auth().is_authenticated() {
//!     context.auth().login("a@x.com", "pw1", true).await?;
//! }
//! context.shutdown();
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod context;
pub mod directory;
pub mod error;
pub mod forms;
pub mod notify;
pub mod service;
pub mod settings;
pub mod telemetry;

#[cfg(test)]
mod testing;

pub use context::{AppAuth, AppContext};
pub use directory::{AccountDirectory, DirectoryBackend, HostedDirectory, LocalDirectory};
pub use error::{AuthError, Result};
pub use forms::{
    submit_contact, submit_demo_request, ContactMessage, ContactOutcome, DemoRequest, SignupForm,
};
pub use notify::{FormSink, Notification, NotificationKind, NotificationSink};
pub use service::{AuthService, AuthState, ServiceOptions};
pub use settings::{DirectoryKind, Settings};

pub use store::{AccountInfo, ErpConnection, MrpRun, Profile, ProfileUpdate};
