//! Identity provider configuration from settings.

use crate::settings::Provider;

/// Hosted identity provider configuration.
#[derive(Debug, Clone)]
pub struct IdentityConfig {
    /// Provider name recorded on external credentials, e.g. "firebase"
    pub provider: String,
    pub api_key: String,
    pub base_url: String,
}

impl IdentityConfig {
    /// Build from the `[provider]` settings section.
    pub fn from_settings(settings: &Provider) -> Result<Self, String> {
        if settings.api_key.trim().is_empty() {
            return Err("provider.api_key not set".to_string());
        }
        let base_url = settings.base_url.trim_end_matches('/').to_string();
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(format!("Invalid provider.base_url: {}", settings.base_url));
        }

        Ok(Self {
            provider: settings.name.clone(),
            api_key: settings.api_key.clone(),
            base_url,
        })
    }

    /// URL of an Identity Toolkit method such as `accounts:signUp`.
    pub fn endpoint(&self, method: &str) -> String {
        format!("{}/{}", self.base_url, method)
    }
}
