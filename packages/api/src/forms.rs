//! Marketing-site forms: signup, demo request and contact.
//!
//! Each form validates its own required fields and knows how to turn itself
//! into a [`Notification`]. Demo requests report a failed send to the caller.
//! Contact messages fall back to a prefilled `mailto:` link instead.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::Deserialize;
use store::Profile;

use crate::error::{require, require_email, AuthError, Result};
use crate::notify::{Notification, NotificationKind, NotificationSink};

/// The signup page's form.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupForm {
    pub full_name: String,
    pub company_name: String,
    pub job_title: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    #[serde(default)]
    pub remember_me: bool,
}

impl SignupForm {
    pub fn validate(&self) -> Result<()> {
        require(&self.full_name, "Full name")?;
        require(&self.company_name, "Company name")?;
        require(&self.job_title, "Job title")?;
        require_email(&self.email)?;
        require(&self.password, "Password")?;
        if self.password != self.confirm_password {
            return Err(AuthError::PasswordMismatch);
        }
        Ok(())
    }

    pub fn profile(&self) -> Profile {
        Profile {
            full_name: self.full_name.clone(),
            company_name: self.company_name.clone(),
            job_title: self.job_title.clone(),
        }
    }
}

fn or_default<'a>(value: &'a Option<String>, default: &'a str) -> &'a str {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(default)
}

/// A request for a product demo.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DemoRequest {
    pub full_name: String,
    pub company_name: String,
    #[serde(default)]
    pub job_title: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub sku_count: String,
    #[serde(default)]
    pub erp_system: String,
    #[serde(default)]
    pub best_time: String,
    #[serde(default)]
    pub comments: Option<String>,
}

impl DemoRequest {
    pub fn validate(&self) -> Result<()> {
        require(&self.full_name, "Full name")?;
        require(&self.company_name, "Company name")?;
        require_email(&self.email)?;
        Ok(())
    }

    pub fn to_notification(&self, recipient: &str) -> Notification {
        let body = format!(
            "Company: {}\nJob Title: {}\nPhone: {}\nNumber of SKUs: {}\n\
             ERP System: {}\nBest Time for Demo: {}\nAdditional Comments: {}",
            self.company_name.trim(),
            self.job_title.trim(),
            or_default(&self.phone, "Not provided"),
            self.sku_count.trim(),
            self.erp_system.trim(),
            self.best_time.trim(),
            or_default(&self.comments, "None"),
        );
        Notification {
            kind: NotificationKind::Demo,
            name: self.full_name.trim().to_string(),
            email: self.email.trim().to_string(),
            subject: "Demo Request".to_string(),
            body,
            reply_to: self.email.trim().to_string(),
            recipient: recipient.to_string(),
        }
    }
}

/// Validate and send a demo request. A failed send is returned to the caller.
pub async fn submit_demo_request<N: NotificationSink>(
    sink: &N,
    request: &DemoRequest,
    recipient: &str,
) -> Result<()> {
    request.validate()?;
    sink.send(&request.to_notification(recipient)).await?;
    tracing::info!("Demo request sent");
    Ok(())
}

const DEFAULT_CONTACT_SUBJECT: &str = "Contact Form Submission";

/// A message from the contact page.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ContactMessage {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub subject: Option<String>,
    pub message: String,
}

/// How a contact message left the site.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ContactOutcome {
    Sent,
    /// The sink failed; the UI should open this `mailto:` link instead.
    MailtoFallback(String),
}

impl ContactMessage {
    pub fn validate(&self) -> Result<()> {
        require(&self.name, "Name")?;
        require_email(&self.email)?;
        require(&self.message, "Message")?;
        Ok(())
    }

    pub fn subject(&self) -> &str {
        or_default(&self.subject, DEFAULT_CONTACT_SUBJECT)
    }

    pub fn to_notification(&self, recipient: &str) -> Notification {
        Notification {
            kind: NotificationKind::Contact,
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            subject: self.subject().to_string(),
            body: self.message.clone(),
            reply_to: self.email.trim().to_string(),
            recipient: recipient.to_string(),
        }
    }

    /// A `mailto:` link carrying the whole message.
    pub fn mailto_link(&self, recipient: &str) -> String {
        let body = format!(
            "Name: {}\nEmail: {}\nSubject: {}\n\nMessage:\n{}",
            self.name.trim(),
            self.email.trim(),
            self.subject(),
            self.message,
        );
        format!(
            "mailto:{}?subject={}&body={}",
            recipient,
            encode_component(self.subject()),
            encode_component(&body)
        )
    }
}

/// Validate and send a contact message, falling back to a `mailto:` link
/// when the sink fails.
pub async fn submit_contact<N: NotificationSink>(
    sink: &N,
    message: &ContactMessage,
    recipient: &str,
) -> Result<ContactOutcome> {
    message.validate()?;
    match sink.send(&message.to_notification(recipient)).await {
        Ok(()) => {
            tracing::info!("Contact message sent");
            Ok(ContactOutcome::Sent)
        }
        Err(e) => {
            tracing::warn!("Failed to send contact message, offering mailto: {}", e);
            Ok(ContactOutcome::MailtoFallback(message.mailto_link(recipient)))
        }
    }
}

/// Bytes escaped in a URI component: everything but ASCII alphanumerics and
/// `- _ . ! ~ * ' ( )`.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

fn encode_component(s: &str) -> String {
    utf8_percent_encode(s, COMPONENT).to_string()
}
