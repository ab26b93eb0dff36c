//! # Firebase identity provider over the Identity Toolkit REST API
//!
//! [`FirebaseIdentity`] implements [`IdentityProvider`] with plain JSON POSTs
//! to `https://identitytoolkit.googleapis.com/v1/<method>?key=<api_key>`.
//!
//! | Operation | Method | Body |
//! |-----------|--------|------|
//! | `create_account` | `accounts:signUp` | `email`, `password`, `returnSecureToken` |
//! | `verify_credentials` | `accounts:signInWithPassword` | `email`, `password`, `returnSecureToken` |
//! | `send_verification_email` | `accounts:sendOobCode` | `requestType = VERIFY_EMAIL`, `idToken` |
//! | `send_password_reset` | `accounts:sendOobCode` | `requestType = PASSWORD_RESET`, `email` |
//! | `apply_verification_code` | `accounts:update` | `oobCode` |
//! | `confirm_password_reset` | `accounts:resetPassword` | `oobCode`, `newPassword` |
//!
//! Failures come back as `{"error": {"code": 400, "message": "EMAIL_EXISTS"}}`;
//! the message may carry a detail after ` : ` (`WEAK_PASSWORD : Password
//! should be at least 6 characters`). [`classify`] maps the reason code onto
//! [`ProviderError`].

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::config::IdentityConfig;
use super::provider::{IdentityProvider, ProviderAccount, ProviderError};

/// Successful signUp / signInWithPassword response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenResponse {
    local_id: String,
    email: String,
    id_token: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Map an Identity Toolkit error message onto a [`ProviderError`].
fn classify(message: &str) -> ProviderError {
    let code = message.split(" : ").next().unwrap_or(message).trim();
    match code {
        "EMAIL_EXISTS" => ProviderError::EmailExists,
        "EMAIL_NOT_FOUND" => ProviderError::EmailNotFound,
        "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" => ProviderError::InvalidPassword,
        other => ProviderError::Rejected(other.to_string()),
    }
}

fn transport(e: reqwest::Error) -> ProviderError {
    ProviderError::Transport(e.to_string())
}

/// Firebase Authentication handler.
pub struct FirebaseIdentity {
    config: IdentityConfig,
    client: Client,
}

impl FirebaseIdentity {
    pub fn new(config: IdentityConfig) -> Self {
        Self {
            config,
            client: Client::new(),
        }
    }

    async fn call<B, T>(&self, method: &str, body: &B) -> Result<T, ProviderError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .client
            .post(self.config.endpoint(method))
            .query(&[("key", self.config.api_key.as_str())])
            .json(body)
            .send()
            .await
            .map_err(transport)?;

        if response.status().is_success() {
            return response.json().await.map_err(transport);
        }

        let status = response.status();
        let text = response.text().await.map_err(transport)?;
        match serde_json::from_str::<ErrorEnvelope>(&text) {
            Ok(envelope) => Err(classify(&envelope.error.message)),
            Err(_) => Err(ProviderError::Transport(format!(
                "{} returned {}",
                method, status
            ))),
        }
    }

    async fn sign(&self, method: &str, email: &str, password: &str) -> Result<ProviderAccount, ProviderError> {
        let token: TokenResponse = self
            .call(
                method,
                &json!({
                    "email": email,
                    "password": password,
                    "returnSecureToken": true,
                }),
            )
            .await?;
        Ok(ProviderAccount {
            uid: token.local_id,
            email: token.email,
            id_token: token.id_token,
        })
    }
}

impl IdentityProvider for FirebaseIdentity {
    fn name(&self) -> &str {
        &self.config.provider
    }

    async fn create_account(&self, email: &str, password: &str) -> Result<ProviderAccount, ProviderError> {
        self.sign("accounts:signUp", email, password).await
    }

    async fn verify_credentials(&self, email: &str, password: &str) -> Result<ProviderAccount, ProviderError> {
        self.sign("accounts:signInWithPassword", email, password).await
    }

    async fn send_verification_email(&self, account: &ProviderAccount) -> Result<(), ProviderError> {
        let _: serde_json::Value = self
            .call(
                "accounts:sendOobCode",
                &json!({ "requestType": "VERIFY_EMAIL", "idToken": account.id_token }),
            )
            .await?;
        Ok(())
    }

    async fn send_password_reset(&self, email: &str) -> Result<(), ProviderError> {
        let _: serde_json::Value = self
            .call(
                "accounts:sendOobCode",
                &json!({ "requestType": "PASSWORD_RESET", "email": email }),
            )
            .await?;
        Ok(())
    }

    async fn apply_verification_code(&self, code: &str) -> Result<(), ProviderError> {
        let _: serde_json::Value = self
            .call("accounts:update", &json!({ "oobCode": code }))
            .await?;
        Ok(())
    }

    async fn confirm_password_reset(&self, code: &str, new_password: &str) -> Result<(), ProviderError> {
        let _: serde_json::Value = self
            .call(
                "accounts:resetPassword",
                &json!({ "oobCode": code, "newPassword": new_password }),
            )
            .await?;
        Ok(())
    }
}
