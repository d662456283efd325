//! Traits for credential refresh and persistence
//!
//! These traits keep the token guardian independent of any particular OAuth
//! server or storage backend.

use async_trait::async_trait;

use super::token_guardian::TokenGuardianError;
use super::types::Credential;

/// Obtains a fresh credential from an authorization server.
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    /// Exchange for a new credential.
    ///
    /// `current` is the credential being replaced (if any); refresh-token
    /// grants read the refresh token from it, client-credentials grants ignore
    /// it.
    ///
    /// # Errors
    /// Returns error if the token endpoint rejects the request or is
    /// unreachable
    async fn refresh(&self, current: Option<&Credential>)
        -> Result<Credential, TokenGuardianError>;
}

/// Persists the credential between runs.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Load the stored credential, `Ok(None)` when nothing is stored yet.
    ///
    /// # Errors
    /// Returns error if the backing store exists but cannot be read
    async fn load(&self) -> Result<Option<Credential>, String>;

    /// Replace the stored credential.
    ///
    /// # Errors
    /// Returns error if the write fails
    async fn save(&self, credential: &Credential) -> Result<(), String>;
}

/// Hands out a currently valid bearer token.
///
/// API clients depend on this rather than on a concrete guardian.
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    /// # Errors
    /// Returns error if no valid token can be produced
    async fn access_token(&self) -> Result<String, TokenGuardianError>;
}
