//! # Notification sink — operator emails on signup, login, demo and contact
//!
//! [`Notification`] is a one-shot message with no persisted identity.
//! [`NotificationSink`] is the seam; [`FormSink`] is the production
//! implementation, posting a JSON form submission to a hosted form endpoint
//! (Formspree-style fields: `_replyto`, `_to`, `_format`).
//!
//! Account flows never wait on the outcome: they call [`notify`], which logs
//! a failure and carries on. Demo and contact submissions call
//! [`NotificationSink::send`] directly because the send *is* the operation.

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::Serialize;
use store::AccountInfo;

use crate::error::{AuthError, Result};
use crate::settings::Notifications;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Signup,
    Login,
    Demo,
    Contact,
}

/// Outbound operator message.
#[derive(Clone, Debug, PartialEq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub name: String,
    pub email: String,
    pub subject: String,
    pub body: String,
    pub reply_to: String,
    pub recipient: String,
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

impl Notification {
    pub fn signup(account: &AccountInfo, recipient: &str, at: DateTime<Utc>) -> Self {
        let body = format!(
            "New user registration details:\n\n\
             Name: {}\nCompany: {}\nJob Title: {}\nEmail: {}\nRegistration Time: {}\n\n\
             Please follow up with the new user.",
            account.full_name,
            account.company_name,
            account.job_title,
            account.email,
            timestamp(at),
        );
        Self {
            kind: NotificationKind::Signup,
            name: account.display_name().to_string(),
            email: account.email.clone(),
            subject: "New User Registration - polymr.ai".to_string(),
            body,
            reply_to: account.email.clone(),
            recipient: recipient.to_string(),
        }
    }

    pub fn login(account: &AccountInfo, recipient: &str, at: DateTime<Utc>) -> Self {
        let body = format!(
            "User login notification:\n\nName: {}\nEmail: {}\nLogin Time: {}",
            account.full_name,
            account.email,
            timestamp(at),
        );
        Self {
            kind: NotificationKind::Login,
            name: account.display_name().to_string(),
            email: account.email.clone(),
            subject: "User Login - polymr.ai".to_string(),
            body,
            reply_to: account.email.clone(),
            recipient: recipient.to_string(),
        }
    }
}

/// Something that can deliver a [`Notification`].
pub trait NotificationSink {
    fn send(&self, notification: &Notification) -> impl Future<Output = Result<()>>;
}

/// Send `notification`, logging instead of returning any failure.
pub async fn notify<N: NotificationSink>(sink: &N, notification: &Notification) {
    match sink.send(notification).await {
        Ok(()) => tracing::debug!(kind = ?notification.kind, "Notification sent"),
        Err(e) => tracing::warn!(kind = ?notification.kind, "Failed to send notification: {}", e),
    }
}

/// JSON body accepted by the form endpoint.
#[derive(Debug, Serialize)]
struct FormBody<'a> {
    name: &'a str,
    email: &'a str,
    subject: &'a str,
    message: &'a str,
    #[serde(rename = "_replyto")]
    reply_to: &'a str,
    #[serde(rename = "_to")]
    to: &'a str,
    #[serde(rename = "_format")]
    format: &'static str,
    #[serde(rename = "type")]
    kind: NotificationKind,
}

impl<'a> From<&'a Notification> for FormBody<'a> {
    fn from(n: &'a Notification) -> Self {
        Self {
            name: &n.name,
            email: &n.email,
            subject: &n.subject,
            message: &n.body,
            reply_to: &n.reply_to,
            to: &n.recipient,
            format: "plain",
            kind: n.kind,
        }
    }
}

/// Posts notifications to a hosted form endpoint.
///
/// Without an endpoint the sink is disabled: sends are logged and succeed.
#[derive(Clone, Debug)]
pub struct FormSink {
    client: reqwest::Client,
    endpoint: Option<String>,
}

impl FormSink {
    pub fn new(endpoint: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.filter(|e| !e.trim().is_empty()),
        }
    }

    pub fn from_settings(settings: &Notifications) -> Self {
        Self::new(settings.endpoint.clone())
    }

    pub fn is_enabled(&self) -> bool {
        self.endpoint.is_some()
    }
}

impl NotificationSink for FormSink {
    async fn send(&self, notification: &Notification) -> Result<()> {
        let Some(endpoint) = &self.endpoint else {
            tracing::debug!(subject = %notification.subject, "Notifications disabled, not sending");
            return Ok(());
        };

        let response = self
            .client
            .post(endpoint)
            .header("Accept", "application/json")
            .json(&FormBody::from(notification))
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(AuthError::external(format!(
                "notification endpoint returned {}",
                status
            )))
        }
    }
}
