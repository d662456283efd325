//! Mock implementations of the auth traits.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::auth::{AccessTokenProvider, Credential, TokenGuardianError, TokenRefresher};

/// Refresher that mints `mock-token-{n}` credentials without network calls.
#[derive(Debug, Default)]
pub struct MockTokenRefresher {
    calls: AtomicU64,
    failure: Mutex<Option<TokenGuardianError>>,
    lifetime_secs: Mutex<Option<i64>>,
}

impl MockTokenRefresher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent refresh fail with `error`.
    pub fn fail_with(&self, error: TokenGuardianError) {
        *self.failure.lock() = Some(error);
    }

    /// Lifetime of minted credentials (default one hour).
    pub fn set_lifetime_secs(&self, secs: i64) {
        *self.lifetime_secs.lock() = Some(secs);
    }

    /// Number of refresh calls observed, failed ones included.
    #[must_use]
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenRefresher for MockTokenRefresher {
    async fn refresh(
        &self,
        current: Option<&Credential>,
    ) -> Result<Credential, TokenGuardianError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;

        if let Some(error) = self.failure.lock().clone() {
            return Err(error);
        }

        let lifetime = self.lifetime_secs.lock().unwrap_or(3600);
        let refresh_token = current.and_then(|c| c.refresh_token.clone());
        Ok(Credential::from_lifetime(format!("mock-token-{n}"), refresh_token, lifetime))
    }
}

/// Provider that always hands out the same token.
#[derive(Debug, Clone)]
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self { token: token.into() }
    }
}

#[async_trait]
impl AccessTokenProvider for StaticTokenProvider {
    async fn access_token(&self) -> Result<String, TokenGuardianError> {
        Ok(self.token.clone())
    }
}
