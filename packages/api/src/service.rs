//! # Auth service facade
//!
//! [`AuthService`] owns the single session slot of a client and drives it
//! through **Anonymous → Authenticated → Anonymous**. It composes three
//! collaborators chosen by the caller:
//!
//! | Parameter | Trait | Role |
//! |-----------|-------|------|
//! | `D` | [`AccountDirectory`] | Registered accounts and credential checks |
//! | `S` | [`KeyValueStore`] | Backing store of the [`SessionStore`] |
//! | `N` | [`NotificationSink`] | Operator emails on signup and login |
//!
//! ## Restoring a session
//!
//! A persisted session is only a claim. [`AuthService::restore`] accepts it
//! when it is younger than the configured maximum age and the directory still
//! holds an account with the same email *and* id; the directory's copy then
//! becomes the session. Anything else clears the persisted session.
//!
//! ## Profile updates
//!
//! Updates merge: only the supplied fields of a [`ProfileUpdate`] change. The
//! merged account is written back with [`AccountDirectory::upsert`], which
//! replaces the stored record wholesale.

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{Duration, Utc};
use store::{
    Account, AccountInfo, ConnectionStatus, ErpConnection, KeyValueStore, MrpRun,
    PersistedSession, Profile, ProfileUpdate, RunStatus, SessionRecord, SessionStore,
};

use crate::directory::AccountDirectory;
use crate::error::{require, require_email, AuthError, Result};
use crate::forms::SignupForm;
use crate::notify::{notify, Notification, NotificationSink};
use crate::settings::{self, Settings};

/// What the UI sees of the session slot.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum AuthState {
    #[default]
    Anonymous,
    Authenticated(AccountInfo),
}

impl AuthState {
    pub fn account(&self) -> Option<&AccountInfo> {
        match self {
            Self::Anonymous => None,
            Self::Authenticated(info) => Some(info),
        }
    }
}

/// Tunables for [`AuthService`].
#[derive(Clone, Debug)]
pub struct ServiceOptions {
    pub session: settings::Session,
    /// Operator address that receives signup and login notifications
    pub recipient: String,
}

impl ServiceOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            session: settings.session.clone(),
            recipient: settings.notifications.recipient.clone(),
        }
    }
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self {
            session: settings::Session {
                max_age_secs: 60 * 60 * 24 * 7,
                remember_max_age_secs: 60 * 60 * 24 * 30,
            },
            recipient: "polymrai.business@gmail.com".to_string(),
        }
    }
}

#[derive(Clone, Debug)]
struct Active {
    record: SessionRecord,
    remember_me: bool,
}

pub struct AuthService<D, S, N>
where
    D: AccountDirectory,
    S: KeyValueStore,
    N: NotificationSink,
{
    directory: D,
    sessions: SessionStore<S>,
    notifier: N,
    options: ServiceOptions,
    active: RwLock<Option<Active>>,
}

impl<D, S, N> AuthService<D, S, N>
where
    D: AccountDirectory,
    S: KeyValueStore,
    N: NotificationSink,
{
    /// Build an Anonymous service. Call [`restore`](Self::restore) to pick up
    /// a persisted session.
    pub fn new(directory: D, sessions: SessionStore<S>, notifier: N, options: ServiceOptions) -> Self {
        Self {
            directory,
            sessions,
            notifier,
            options,
            active: RwLock::new(None),
        }
    }

    pub fn directory(&self) -> &D {
        &self.directory
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    fn active(&self) -> RwLockReadGuard<'_, Option<Active>> {
        self.active.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn active_mut(&self) -> RwLockWriteGuard<'_, Option<Active>> {
        self.active.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> AuthState {
        match self.current_user() {
            Some(info) => AuthState::Authenticated(info),
            None => AuthState::Anonymous,
        }
    }

    pub fn current_user(&self) -> Option<AccountInfo> {
        self.active().as_ref().map(|a| a.record.account.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.active().is_some()
    }

    /// Rehydrate the session slot from the session store.
    pub async fn restore(&self) -> Result<AuthState> {
        let Some(persisted) = self.sessions.load().await? else {
            *self.active_mut() = None;
            return Ok(AuthState::Anonymous);
        };

        let Some(account) = self.revalidate(&persisted).await? else {
            self.sessions.clear().await?;
            *self.active_mut() = None;
            return Ok(AuthState::Anonymous);
        };

        let record = SessionRecord {
            account: account.to_info(),
            signed_in_at: persisted.record.signed_in_at,
        };
        self.sessions.save(&record, persisted.remember_me).await?;
        tracing::info!(account_id = %account.id, "Restored session");
        self.set_active(record, persisted.remember_me);
        Ok(self.state())
    }

    /// The directory's account for a persisted session, if the session
    /// still holds up.
    async fn revalidate(&self, persisted: &PersistedSession) -> Result<Option<Account>> {
        let claimed = &persisted.record.account;
        let age = Utc::now() - persisted.record.signed_in_at;
        if age < Duration::zero() {
            tracing::warn!(account_id = %claimed.id, "Session signed in the future, discarding");
            return Ok(None);
        }
        if age > self.options.session.max_age(persisted.remember_me) {
            tracing::info!(account_id = %claimed.id, "Session expired");
            return Ok(None);
        }

        match self.directory.find_by_email(&claimed.email).await? {
            Some(account) if account.id == claimed.id => Ok(Some(account)),
            Some(_) => {
                tracing::warn!(account_id = %claimed.id, "Session does not match the stored account, discarding");
                Ok(None)
            }
            None => {
                tracing::warn!(account_id = %claimed.id, "Session account no longer exists, discarding");
                Ok(None)
            }
        }
    }

    fn set_active(&self, record: SessionRecord, remember_me: bool) {
        *self.active_mut() = Some(Active {
            record,
            remember_me,
        });
    }

    async fn begin_session(&self, account: &Account, remember_me: bool) -> Result<AccountInfo> {
        let record = SessionRecord {
            account: account.to_info(),
            signed_in_at: Utc::now(),
        };
        self.sessions.save(&record, remember_me).await?;
        let info = record.account.clone();
        self.set_active(record, remember_me);
        Ok(info)
    }

    /// Create an account, sign it in and notify the operator.
    pub async fn signup(&self, email: &str, password: &str, profile: &Profile) -> Result<AccountInfo> {
        self.signup_with(email, password, profile, false).await
    }

    /// [`signup`](Self::signup) from the signup form, honouring its
    /// confirmation field and remember-me flag.
    pub async fn register(&self, form: &SignupForm) -> Result<AccountInfo> {
        form.validate()?;
        self.signup_with(&form.email, &form.password, &form.profile(), form.remember_me)
            .await
    }

    async fn signup_with(
        &self,
        email: &str,
        password: &str,
        profile: &Profile,
        remember_me: bool,
    ) -> Result<AccountInfo> {
        let email = require_email(email)?;
        require(password, "Password")?;
        require(&profile.full_name, "Full name")?;
        require(&profile.company_name, "Company name")?;
        require(&profile.job_title, "Job title")?;

        if self.directory.find_by_email(email).await?.is_some() {
            return Err(AuthError::DuplicateAccount);
        }

        let account = self.directory.create_account(email, password, profile).await?;
        let info = self.begin_session(&account, remember_me).await?;
        tracing::info!(account_id = %info.id, "Account created");

        let notification = Notification::signup(&info, &self.options.recipient, Utc::now());
        notify(&self.notifier, &notification).await;
        Ok(info)
    }

    /// Check credentials, stamp the login and sign the account in.
    pub async fn login(&self, email: &str, password: &str, remember_me: bool) -> Result<AccountInfo> {
        let email = require(email, "Email")?;
        require(password, "Password")?;

        let mut account = match self.directory.verify_credentials(email, password).await {
            Ok(account) => account,
            Err(e) => {
                tracing::info!("Login rejected: {}", e);
                return Err(e);
            }
        };
        account.touch_login(Utc::now());
        self.directory.upsert(&account).await?;

        let info = self.begin_session(&account, remember_me).await?;
        tracing::info!(account_id = %info.id, remember_me, "Logged in");

        let notification = Notification::login(&info, &self.options.recipient, Utc::now());
        notify(&self.notifier, &notification).await;
        Ok(info)
    }

    /// Clear the session slot and the persisted session.
    pub async fn logout(&self) -> Result<()> {
        let previous = self.active_mut().take();
        if let Some(active) = &previous {
            self.directory.sign_out(&active.record.account.id);
        }
        self.sessions.clear().await?;
        if let Some(active) = previous {
            tracing::info!(account_id = %active.record.account.id, "Logged out");
        }
        Ok(())
    }

    /// Ask the directory to send a reset email. Never fails from the
    /// caller's point of view.
    pub async fn send_password_reset(&self, email: &str) {
        let Ok(email) = require(email, "Email") else {
            tracing::debug!("Password reset requested without an email");
            return;
        };
        match self.directory.send_password_reset(email).await {
            Ok(()) => tracing::info!("Password reset requested"),
            Err(e) => tracing::warn!("Failed to send password reset: {}", e),
        }
    }

    /// Merge `update` into the signed-in account.
    ///
    /// Supplied profile fields follow the signup rules: blank values are
    /// rejected before anything is written.
    pub async fn update_profile(&self, update: ProfileUpdate) -> Result<AccountInfo> {
        for (value, field) in [
            (&update.full_name, "Full name"),
            (&update.company_name, "Company name"),
            (&update.job_title, "Job title"),
        ] {
            if let Some(value) = value {
                require(value, field)?;
            }
        }
        if update.is_empty() {
            return self.current_user().ok_or(AuthError::NotAuthenticated);
        }
        self.modify(|account| update.apply(account)).await
    }

    /// Record a new ERP connection on the signed-in account.
    pub async fn add_erp_connection(&self, kind: &str) -> Result<AccountInfo> {
        let kind = require(kind, "ERP system")?.to_string();
        self.modify(|account| {
            account.erp_connections.push(ErpConnection {
                kind,
                status: ConnectionStatus::Connected,
                date: Utc::now(),
            })
        })
        .await
    }

    /// Save a completed MRP run on the signed-in account.
    pub async fn record_mrp_run(&self, results: &str) -> Result<AccountInfo> {
        let results = results.trim().to_string();
        self.modify(|account| {
            account.saved_mrp_runs.push(MrpRun {
                date: Utc::now(),
                status: RunStatus::Completed,
                results,
            })
        })
        .await
    }

    /// Load the signed-in account, apply `change`, and persist it everywhere.
    async fn modify<F: FnOnce(&mut Account)>(&self, change: F) -> Result<AccountInfo> {
        let Active {
            record,
            remember_me,
        } = self.active().clone().ok_or(AuthError::NotAuthenticated)?;

        let mut account = self.signed_in_account(&record.account).await?;
        change(&mut account);
        self.directory.upsert(&account).await?;

        let record = SessionRecord {
            account: account.to_info(),
            signed_in_at: record.signed_in_at,
        };
        self.sessions.save(&record, remember_me).await?;
        let info = record.account.clone();
        self.set_active(record, remember_me);
        tracing::debug!(account_id = %info.id, "Account updated");
        Ok(info)
    }

    async fn signed_in_account(&self, info: &AccountInfo) -> Result<Account> {
        match self.directory.find_by_email(&info.email).await? {
            Some(account) if account.id == info.id => Ok(account),
            _ => Err(AuthError::AccountNotFound),
        }
    }

    /// Re-send the verification email for the signed-in account.
    pub async fn send_verification_email(&self) -> Result<()> {
        let info = self.current_user().ok_or(AuthError::NotAuthenticated)?;
        let account = self.signed_in_account(&info).await?;
        self.directory.send_verification_email(&account).await
    }

    /// Apply the code from a verification email.
    pub async fn verify_email(&self, code: &str) -> Result<()> {
        let code = require(code, "Verification code")?;
        self.directory.apply_verification_code(code).await
    }

    /// Set a new password using the code from a reset email.
    pub async fn reset_password(&self, code: &str, new_password: &str) -> Result<()> {
        let code = require(code, "Reset code")?;
        require(new_password, "Password")?;
        self.directory.confirm_password_reset(code, new_password).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::{HostedDirectory, LocalDirectory};
    use crate::notify::NotificationKind;
    use crate::testing::{profile, FakeProvider, RecordingSink};
    use store::MemoryStore;

    type LocalService = AuthService<LocalDirectory<MemoryStore>, MemoryStore, RecordingSink>;

    fn service_with(store: &MemoryStore, sink: &RecordingSink, options: ServiceOptions) -> LocalService {
        AuthService::new(
            LocalDirectory::new(store.clone()),
            SessionStore::new(store.clone()),
            sink.clone(),
            options,
        )
    }

    fn service(store: &MemoryStore, sink: &RecordingSink) -> LocalService {
        service_with(store, sink, ServiceOptions::default())
    }

    #[tokio::test]
    async fn test_signup_signs_in_with_empty_lists() {
        let store = MemoryStore::new();
        let sink = RecordingSink::new();
        let auth = service(&store, &sink);

        let info = auth.signup("a@x.com", "pw1", &profile("A B")).await.unwrap();
        assert_eq!(info.email, "a@x.com");
        assert_eq!(auth.state(), AuthState::Authenticated(info.clone()));

        let stored = auth.directory().find_by_email("a@x.com").await.unwrap().unwrap();
        assert!(stored.erp_connections.is_empty());
        assert!(stored.saved_mrp_runs.is_empty());

        let sent = sink.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].kind, NotificationKind::Signup);
        assert_eq!(sent[0].recipient, "polymrai.business@gmail.com");
        assert!(store.get("currentUser").await.unwrap().is_some());
        assert!(store.get("rememberMe").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_second_signup_is_duplicate() {
        let store = MemoryStore::new();
        let auth = service(&store, &RecordingSink::new());
        auth.signup("a@x.com", "pw1", &profile("A B")).await.unwrap();

        let err = auth
            .signup(" A@X.com ", "pw2", &profile("Someone Else"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::DuplicateAccount));
        assert_eq!(auth.directory().all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_signup_requires_every_field() {
        let store = MemoryStore::new();
        let auth = service(&store, &RecordingSink::new());
        let mut incomplete = profile("A B");
        incomplete.company_name = "  ".into();

        assert!(matches!(
            auth.signup("a@x.com", "pw1", &incomplete).await,
            Err(AuthError::MissingField("Company name"))
        ));
        assert!(matches!(
            auth.signup("a@x.com", "", &profile("A B")).await,
            Err(AuthError::MissingField("Password"))
        ));
        assert!(matches!(
            auth.signup("not-an-email", "pw1", &profile("A B")).await,
            Err(AuthError::InvalidEmail)
        ));
        assert!(auth.directory().all().await.unwrap().is_empty());
        assert_eq!(auth.state(), AuthState::Anonymous);
    }

    #[tokio::test]
    async fn test_login_unknown_email_stays_anonymous() {
        let store = MemoryStore::new();
        let auth = service(&store, &RecordingSink::new());
        assert!(matches!(
            auth.login("b@x.com", "pw", false).await,
            Err(AuthError::AccountNotFound)
        ));
        assert_eq!(auth.state(), AuthState::Anonymous);
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let store = MemoryStore::new();
        let auth = service(&store, &RecordingSink::new());
        auth.signup("a@x.com", "pw1", &profile("A B")).await.unwrap();
        auth.logout().await.unwrap();

        assert!(matches!(
            auth.login("a@x.com", "pw2", false).await,
            Err(AuthError::InvalidCredential)
        ));
        assert!(!auth.is_authenticated());
    }

    #[tokio::test]
    async fn test_login_advances_last_login() {
        let store = MemoryStore::new();
        let sink = RecordingSink::new();
        let auth = service(&store, &sink);
        let created = auth.signup("a@x.com", "pw1", &profile("A B")).await.unwrap();
        auth.logout().await.unwrap();

        let first = auth.login("A@x.com", "pw1", true).await.unwrap();
        assert_eq!(first.id, created.id);
        assert!(first.last_login > created.last_login);
        assert_eq!(auth.current_user(), Some(first.clone()));

        let second = auth.login("a@x.com", "pw1", true).await.unwrap();
        assert!(second.last_login > first.last_login);

        let stored = auth.directory().find_by_email("a@x.com").await.unwrap().unwrap();
        assert_eq!(stored.last_login, second.last_login);
        assert_eq!(store.get("rememberMe").await.unwrap().as_deref(), Some("true"));

        let kinds: Vec<_> = sink.sent().iter().map(|n| n.kind).collect();
        assert_eq!(
            kinds,
            vec![NotificationKind::Signup, NotificationKind::Login, NotificationKind::Login]
        );
    }

    #[tokio::test]
    async fn test_failing_sink_does_not_block() {
        let store = MemoryStore::new();
        let sink = RecordingSink::failing();
        let auth = service(&store, &sink);

        auth.signup("a@x.com", "pw1", &profile("A B")).await.unwrap();
        auth.logout().await.unwrap();
        auth.login("a@x.com", "pw1", false).await.unwrap();
        assert!(auth.is_authenticated());
        assert_eq!(sink.sent().len(), 2);
    }

    #[tokio::test]
    async fn test_logout_then_restore_is_anonymous() {
        let store = MemoryStore::new();
        let auth = service(&store, &RecordingSink::new());
        auth.signup("a@x.com", "pw1", &profile("A B")).await.unwrap();
        auth.logout().await.unwrap();

        assert!(store.get("currentUser").await.unwrap().is_none());
        let fresh = service(&store, &RecordingSink::new());
        assert_eq!(fresh.restore().await.unwrap(), AuthState::Anonymous);
    }

    #[tokio::test]
    async fn test_restore_after_login() {
        let store = MemoryStore::new();
        let auth = service(&store, &RecordingSink::new());
        auth.signup("a@x.com", "pw1", &profile("A B")).await.unwrap();
        let info = auth.login("a@x.com", "pw1", true).await.unwrap();

        let fresh = service(&store, &RecordingSink::new());
        assert_eq!(fresh.restore().await.unwrap(), AuthState::Authenticated(info));
    }

    #[tokio::test]
    async fn test_restore_rejects_tampered_session() {
        let store = MemoryStore::new();
        let auth = service(&store, &RecordingSink::new());
        auth.signup("a@x.com", "pw1", &profile("A B")).await.unwrap();

        let sessions = SessionStore::new(store.clone());
        let mut record = sessions.load().await.unwrap().unwrap().record;
        record.account.id = "forged".into();
        sessions.save(&record, true).await.unwrap();

        let fresh = service(&store, &RecordingSink::new());
        assert_eq!(fresh.restore().await.unwrap(), AuthState::Anonymous);
        assert!(store.get("currentUser").await.unwrap().is_none());
        assert!(store.get("rememberMe").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_restore_rejects_unknown_account() {
        let store = MemoryStore::new();
        let auth = service(&store, &RecordingSink::new());
        auth.signup("a@x.com", "pw1", &profile("A B")).await.unwrap();
        store.remove("registeredUsers").await.unwrap();

        let fresh = service(&store, &RecordingSink::new());
        assert_eq!(fresh.restore().await.unwrap(), AuthState::Anonymous);
        assert!(store.get("currentUser").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_restore_rejects_expired_session() {
        let store = MemoryStore::new();
        let auth = service(&store, &RecordingSink::new());
        auth.signup("a@x.com", "pw1", &profile("A B")).await.unwrap();

        let sessions = SessionStore::new(store.clone());
        let mut record = sessions.load().await.unwrap().unwrap().record;
        record.signed_in_at = Utc::now() - Duration::days(2);
        sessions.save(&record, false).await.unwrap();

        let options = ServiceOptions {
            session: settings::Session {
                max_age_secs: 60 * 60 * 24,
                remember_max_age_secs: 60 * 60 * 24 * 30,
            },
            ..ServiceOptions::default()
        };

        // Remember-me stretches the window past two days
        sessions.save(&record, true).await.unwrap();
        let remembered = service_with(&store, &RecordingSink::new(), options.clone());
        assert!(remembered.restore().await.unwrap().account().is_some());

        sessions.save(&record, false).await.unwrap();
        let fresh = service_with(&store, &RecordingSink::new(), options);
        assert_eq!(fresh.restore().await.unwrap(), AuthState::Anonymous);
        assert!(store.get("currentUser").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_profile_requires_session() {
        let auth = service(&MemoryStore::new(), &RecordingSink::new());
        let update = ProfileUpdate {
            job_title: Some("CTO".into()),
            ..Default::default()
        };
        assert!(matches!(
            auth.update_profile(update).await,
            Err(AuthError::NotAuthenticated)
        ));
        assert!(matches!(
            auth.add_erp_connection("NetSuite").await,
            Err(AuthError::NotAuthenticated)
        ));
    }

    #[tokio::test]
    async fn test_update_profile_merges_supplied_fields() {
        let store = MemoryStore::new();
        let auth = service(&store, &RecordingSink::new());
        auth.signup("a@x.com", "pw1", &profile("A B")).await.unwrap();

        let info = auth
            .update_profile(ProfileUpdate {
                job_title: Some("CTO".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(info.job_title, "CTO");
        assert_eq!(info.full_name, "A B");
        assert_eq!(info.company_name, "Acme");

        let stored = auth.directory().find_by_email("a@x.com").await.unwrap().unwrap();
        assert_eq!(stored.job_title, "CTO");
        assert_eq!(stored.full_name, "A B");

        let persisted = SessionStore::new(store).load().await.unwrap().unwrap();
        assert_eq!(persisted.record.account, info);

        // Credentials survive the merge
        auth.logout().await.unwrap();
        auth.login("a@x.com", "pw1", false).await.unwrap();
    }

    #[tokio::test]
    async fn test_update_profile_rejects_blank_fields() {
        let store = MemoryStore::new();
        let auth = service(&store, &RecordingSink::new());
        let before = auth.signup("a@x.com", "pw1", &profile("A B")).await.unwrap();

        let err = auth
            .update_profile(ProfileUpdate {
                full_name: Some("   ".into()),
                company_name: Some(String::new()),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::MissingField("Full name")));
        assert!(matches!(
            auth.update_profile(ProfileUpdate {
                job_title: Some(" ".into()),
                ..Default::default()
            })
            .await,
            Err(AuthError::MissingField("Job title"))
        ));

        let stored = auth.directory().find_by_email("a@x.com").await.unwrap().unwrap();
        assert_eq!(stored.full_name, "A B");
        assert_eq!(stored.company_name, "Acme");
        assert_eq!(stored.job_title, "Planner");
        assert_eq!(auth.current_user(), Some(before));
    }

    #[tokio::test]
    async fn test_dashboard_records_append() {
        let store = MemoryStore::new();
        let auth = service(&store, &RecordingSink::new());
        auth.signup("a@x.com", "pw1", &profile("A B")).await.unwrap();

        auth.add_erp_connection("NetSuite").await.unwrap();
        let info = auth.record_mrp_run("42 planned orders").await.unwrap();

        assert_eq!(info.erp_connections.len(), 1);
        assert_eq!(info.erp_connections[0].kind, "NetSuite");
        assert_eq!(info.erp_connections[0].status, ConnectionStatus::Connected);
        assert_eq!(info.saved_mrp_runs.len(), 1);
        assert_eq!(info.saved_mrp_runs[0].status, RunStatus::Completed);

        let stored = auth.directory().find_by_email("a@x.com").await.unwrap().unwrap();
        assert_eq!(stored.erp_connections, info.erp_connections);
        assert!(matches!(
            auth.add_erp_connection(" ").await,
            Err(AuthError::MissingField(_))
        ));
    }

    #[tokio::test]
    async fn test_register_checks_confirmation() {
        let store = MemoryStore::new();
        let auth = service(&store, &RecordingSink::new());
        let mut form = SignupForm {
            full_name: "A B".into(),
            company_name: "Acme".into(),
            job_title: "Planner".into(),
            email: "a@x.com".into(),
            password: "pw1".into(),
            confirm_password: "pw2".into(),
            remember_me: true,
        };

        assert!(matches!(
            auth.register(&form).await,
            Err(AuthError::PasswordMismatch)
        ));
        assert!(auth.directory().all().await.unwrap().is_empty());

        form.confirm_password = "pw1".into();
        auth.register(&form).await.unwrap();
        assert_eq!(store.get("rememberMe").await.unwrap().as_deref(), Some("true"));
    }

    #[tokio::test]
    async fn test_local_directory_has_no_verification() {
        let auth = service(&MemoryStore::new(), &RecordingSink::new());
        auth.signup("a@x.com", "pw1", &profile("A B")).await.unwrap();

        auth.send_password_reset("a@x.com").await;
        assert!(matches!(
            auth.send_verification_email().await,
            Err(AuthError::Unsupported(_))
        ));
        assert!(matches!(
            auth.verify_email("code").await,
            Err(AuthError::Unsupported(_))
        ));
    }

    #[tokio::test]
    async fn test_hosted_flows() {
        let provider = FakeProvider::new();
        let store = MemoryStore::new();
        let auth = AuthService::new(
            HostedDirectory::new(provider.clone(), store.clone()),
            SessionStore::new(store.clone()),
            RecordingSink::new(),
            ServiceOptions::default(),
        );

        let info = auth.signup("a@x.com", "pw1", &profile("A B")).await.unwrap();
        auth.send_verification_email().await.unwrap();
        assert_eq!(provider.verification_emails(), vec![info.id.clone(), info.id.clone()]);
        auth.verify_email("verify-code").await.unwrap();

        // Unknown addresses are not reported to the caller
        auth.send_password_reset("nobody@x.com").await;
        auth.send_password_reset("a@x.com").await;
        assert_eq!(provider.reset_emails(), vec!["a@x.com".to_string()]);

        auth.reset_password("reset-code", "pw2").await.unwrap();
        auth.logout().await.unwrap();
        let again = auth.login("a@x.com", "pw2", false).await.unwrap();
        assert_eq!(again.id, info.id);
        assert!(again.last_login > info.last_login);
    }

    fn hosted_service(
        provider: &FakeProvider,
        store: &MemoryStore,
    ) -> AuthService<HostedDirectory<FakeProvider, MemoryStore>, MemoryStore, RecordingSink> {
        AuthService::new(
            HostedDirectory::new(provider.clone(), store.clone()),
            SessionStore::new(store.clone()),
            RecordingSink::new(),
            ServiceOptions::default(),
        )
    }

    #[tokio::test]
    async fn test_restored_hosted_session_asks_for_sign_in_to_resend() {
        let provider = FakeProvider::new();
        let store = MemoryStore::new();
        let auth = hosted_service(&provider, &store);
        auth.signup("a@x.com", "pw1", &profile("A B")).await.unwrap();

        let restarted = hosted_service(&provider, &store);
        assert!(restarted.restore().await.unwrap().account().is_some());
        let err = restarted.send_verification_email().await.unwrap_err();
        assert!(matches!(err, AuthError::ExternalServiceFailure(_)));
        assert!(err.to_string().contains("sign in again"));

        // A fresh sign-in makes the resend work again
        restarted.login("a@x.com", "pw1", false).await.unwrap();
        restarted.send_verification_email().await.unwrap();
        assert_eq!(provider.verification_emails().len(), 2);
    }

    #[tokio::test]
    async fn test_logout_forgets_provider_token() {
        let provider = FakeProvider::new();
        let store = MemoryStore::new();
        let auth = hosted_service(&provider, &store);
        auth.signup("a@x.com", "pw1", &profile("A B")).await.unwrap();
        auth.logout().await.unwrap();

        let account = auth.directory().find_by_email("a@x.com").await.unwrap().unwrap();
        assert!(matches!(
            auth.directory().send_verification_email(&account).await,
            Err(AuthError::ExternalServiceFailure(_))
        ));
        assert_eq!(provider.verification_emails().len(), 1);
    }
}
