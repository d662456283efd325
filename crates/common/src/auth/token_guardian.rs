//! Token guardian with single-flight refresh
//!
//! Owns the credential for one upstream API:
//! - Credential loaded from a [`CredentialStore`] at startup
//! - Synchronous refresh on first use after expiry (configurable skew)
//! - Concurrent expiry detection collapses to one token-endpoint call
//! - Refreshed credential written back to the store
//! - A rejected refresh is final: later calls fail fast until a new
//!   credential is installed

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, warn};

use super::traits::{AccessTokenProvider, CredentialStore, TokenRefresher};
use super::types::Credential;

/// Error type for token guardian operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenGuardianError {
    /// No credential held and the refresher cannot mint one
    #[error("Not authenticated (no credential)")]
    NotAuthenticated,

    /// Credential expired and carries no refresh token
    #[error("No refresh token available")]
    NoRefreshToken,

    /// Token endpoint answered with a non-success status
    #[error("Token endpoint rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// Token endpoint unreachable
    #[error("Token endpoint unreachable: {0}")]
    Transport(String),

    /// Token endpoint response could not be parsed
    #[error("Malformed token response: {0}")]
    Decode(String),

    /// Credential store failure
    #[error("Credential store error: {0}")]
    Storage(String),
}

/// Guards one credential and hands out valid access tokens.
///
/// Readers take the `RwLock` briefly; refreshes are serialized by a separate
/// mutex and re-check expiry after acquiring it, so waiters that queued
/// behind an in-flight refresh pick up its result instead of refreshing
/// again.
pub struct TokenGuardian {
    name: String,
    refresher: Arc<dyn TokenRefresher>,
    store: Arc<dyn CredentialStore>,
    current: RwLock<Option<Credential>>,
    refresh_lock: Mutex<()>,
    rejection: parking_lot::Mutex<Option<TokenGuardianError>>,
    skew_secs: i64,
    refresh_count: AtomicU64,
}

impl TokenGuardian {
    /// Create a guardian with no credential loaded.
    ///
    /// # Arguments
    /// * `name` - Upstream name used in log fields (e.g. "source_ap")
    /// * `refresher` - Grant used when the credential must be replaced
    /// * `store` - Persistence for refreshed credentials
    /// * `skew_secs` - Refresh this many seconds before expiry
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        refresher: Arc<dyn TokenRefresher>,
        store: Arc<dyn CredentialStore>,
        skew_secs: i64,
    ) -> Self {
        Self {
            name: name.into(),
            refresher,
            store,
            current: RwLock::new(None),
            refresh_lock: Mutex::new(()),
            rejection: parking_lot::Mutex::new(None),
            skew_secs,
            refresh_count: AtomicU64::new(0),
        }
    }

    /// Load the stored credential into memory.
    ///
    /// Returns whether a credential was found.
    ///
    /// # Errors
    /// Returns error if the store exists but cannot be read
    pub async fn initialize(&self) -> Result<bool, TokenGuardianError> {
        let loaded = self.store.load().await.map_err(TokenGuardianError::Storage)?;
        let found = loaded.is_some();
        if found {
            info!(upstream = %self.name, "Loaded stored credential");
        } else {
            debug!(upstream = %self.name, "No stored credential");
        }
        *self.current.write().await = loaded;
        Ok(found)
    }

    /// Install a credential obtained outside the refresh path (e.g. an
    /// authorization-code exchange) and persist it.
    ///
    /// # Errors
    /// Returns error if the store rejects the write
    pub async fn install(&self, credential: Credential) -> Result<(), TokenGuardianError> {
        self.store.save(&credential).await.map_err(TokenGuardianError::Storage)?;
        *self.current.write().await = Some(credential);
        *self.rejection.lock() = None;
        info!(upstream = %self.name, "Credential installed");
        Ok(())
    }

    /// Return a valid access token, refreshing first if the held credential
    /// is missing or expired.
    ///
    /// # Errors
    /// Returns the refresher's error; the caller's request must not proceed.
    /// Once the token endpoint has rejected a refresh, that rejection is
    /// returned without another network call.
    pub async fn ensure_valid(&self) -> Result<String, TokenGuardianError> {
        if let Some(token) = self.valid_token().await {
            return Ok(token);
        }
        self.check_rejection()?;

        let _guard = self.refresh_lock.lock().await;

        // Another caller may have refreshed, or been rejected, while we waited.
        if let Some(token) = self.valid_token().await {
            return Ok(token);
        }
        self.check_rejection()?;

        let previous = self.current.read().await.clone();
        let refreshed = match self.refresher.refresh(previous.as_ref()).await {
            Ok(credential) => credential,
            Err(err @ TokenGuardianError::Rejected { .. }) => {
                error!(
                    upstream = %self.name,
                    error = %err,
                    "Token endpoint rejected the refresh; no further attempts this run"
                );
                *self.rejection.lock() = Some(err.clone());
                return Err(err);
            }
            Err(err) => return Err(err),
        };
        self.refresh_count.fetch_add(1, Ordering::Relaxed);

        if let Err(e) = self.store.save(&refreshed).await {
            warn!(
                upstream = %self.name,
                error = %e,
                "Failed to persist refreshed credential; continuing with in-memory token"
            );
        }

        let token = refreshed.access_token.clone();
        info!(
            upstream = %self.name,
            expires_in_secs = refreshed.seconds_until_expiry(),
            "Access token refreshed"
        );
        *self.current.write().await = Some(refreshed);
        Ok(token)
    }

    /// True when there is no credential, or it is expired and cannot be
    /// refreshed. Interactive authorization is the only way forward then.
    pub async fn needs_authorization(&self) -> bool {
        match self.current.read().await.as_ref() {
            Some(credential) => credential.is_expired(self.skew_secs) && !credential.can_refresh(),
            None => true,
        }
    }

    /// Current credential without refreshing.
    pub async fn credential(&self) -> Option<Credential> {
        self.current.read().await.clone()
    }

    /// Number of refreshes performed by this guardian.
    #[must_use]
    pub fn refresh_count(&self) -> u64 {
        self.refresh_count.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    fn check_rejection(&self) -> Result<(), TokenGuardianError> {
        match self.rejection.lock().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn valid_token(&self) -> Option<String> {
        self.current
            .read()
            .await
            .as_ref()
            .filter(|credential| !credential.is_expired(self.skew_secs))
            .map(|credential| credential.access_token.clone())
    }
}

#[async_trait]
impl AccessTokenProvider for TokenGuardian {
    async fn access_token(&self) -> Result<String, TokenGuardianError> {
        self.ensure_valid().await
    }
}

impl std::fmt::Debug for TokenGuardian {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenGuardian")
            .field("name", &self.name)
            .field("skew_secs", &self.skew_secs)
            .field("refresh_count", &self.refresh_count())
            .finish_non_exhaustive()
    }
}
