//! Credential handling: local password hashing and the hosted identity provider.

mod config;
mod firebase;
mod password;
mod provider;

pub use config::IdentityConfig;
pub use firebase::FirebaseIdentity;
pub use password::{hash_password, verify_password};
pub use provider::{IdentityProvider, ProviderAccount, ProviderError};
