//! Test doubles shared by the unit tests in this crate.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use store::{Account, AccountInfo, Credential, Profile};

use crate::auth::{IdentityProvider, ProviderAccount, ProviderError};
use crate::error::{AuthError, Result};
use crate::notify::{Notification, NotificationSink};

pub fn profile(full_name: &str) -> Profile {
    Profile {
        full_name: full_name.to_string(),
        company_name: "Acme".to_string(),
        job_title: "Planner".to_string(),
    }
}

pub fn sample_info(email: &str) -> AccountInfo {
    Account::new(
        "id-1",
        email,
        &profile("A B"),
        Credential::Password { hash: "h".into() },
        Utc::now(),
    )
    .to_info()
}

/// Records every notification it is asked to send.
#[derive(Clone, Default)]
pub struct RecordingSink {
    sent: Arc<Mutex<Vec<Notification>>>,
    fail: bool,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink that records the attempt and then reports failure.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }
}

impl NotificationSink for RecordingSink {
    async fn send(&self, notification: &Notification) -> Result<()> {
        self.sent.lock().unwrap().push(notification.clone());
        if self.fail {
            Err(AuthError::external("sink offline"))
        } else {
            Ok(())
        }
    }
}

#[derive(Default)]
struct FakeState {
    /// email -> (uid, password)
    users: HashMap<String, (String, String)>,
    verification_emails: Vec<String>,
    reset_emails: Vec<String>,
}

/// In-memory identity provider.
///
/// Accepts the verification code `"verify-code"` and the reset code
/// `"reset-code"`, which applies to the most recent reset request.
#[derive(Clone, Default)]
pub struct FakeProvider {
    state: Arc<Mutex<FakeState>>,
    fail_verification: bool,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_verification(mut self) -> Self {
        self.fail_verification = true;
        self
    }

    pub fn verification_emails(&self) -> Vec<String> {
        self.state.lock().unwrap().verification_emails.clone()
    }

    pub fn reset_emails(&self) -> Vec<String> {
        self.state.lock().unwrap().reset_emails.clone()
    }
}

impl IdentityProvider for FakeProvider {
    fn name(&self) -> &str {
        "fake"
    }

    async fn create_account(&self, email: &str, password: &str) -> Result<ProviderAccount, ProviderError> {
        let mut state = self.state.lock().unwrap();
        if state.users.contains_key(email) {
            return Err(ProviderError::EmailExists);
        }
        let uid = format!("uid-{}", state.users.len() + 1);
        state
            .users
            .insert(email.to_string(), (uid.clone(), password.to_string()));
        Ok(ProviderAccount {
            id_token: format!("token-{uid}"),
            uid,
            email: email.to_string(),
        })
    }

    async fn verify_credentials(&self, email: &str, password: &str) -> Result<ProviderAccount, ProviderError> {
        let state = self.state.lock().unwrap();
        let (uid, stored) = state.users.get(email).ok_or(ProviderError::EmailNotFound)?;
        if stored != password {
            return Err(ProviderError::InvalidPassword);
        }
        Ok(ProviderAccount {
            id_token: format!("token-{uid}"),
            uid: uid.clone(),
            email: email.to_string(),
        })
    }

    async fn send_verification_email(&self, account: &ProviderAccount) -> Result<(), ProviderError> {
        if self.fail_verification {
            return Err(ProviderError::Transport("mail relay down".into()));
        }
        self.state
            .lock()
            .unwrap()
            .verification_emails
            .push(account.uid.clone());
        Ok(())
    }

    async fn send_password_reset(&self, email: &str) -> Result<(), ProviderError> {
        let mut state = self.state.lock().unwrap();
        if !state.users.contains_key(email) {
            return Err(ProviderError::EmailNotFound);
        }
        state.reset_emails.push(email.to_string());
        Ok(())
    }

    async fn apply_verification_code(&self, code: &str) -> Result<(), ProviderError> {
        if code == "verify-code" {
            Ok(())
        } else {
            Err(ProviderError::Rejected("INVALID_OOB_CODE".into()))
        }
    }

    async fn confirm_password_reset(&self, code: &str, new_password: &str) -> Result<(), ProviderError> {
        let mut state = self.state.lock().unwrap();
        let email = state
            .reset_emails
            .last()
            .cloned()
            .filter(|_| code == "reset-code")
            .ok_or_else(|| ProviderError::Rejected("INVALID_OOB_CODE".into()))?;
        if let Some(user) = state.users.get_mut(&email) {
            user.1 = new_password.to_string();
        }
        Ok(())
    }
}
