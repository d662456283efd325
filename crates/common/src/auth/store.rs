//! In-memory credential store

use async_trait::async_trait;
use parking_lot::Mutex;

use super::traits::CredentialStore;
use super::types::Credential;

/// Process-local store for credentials that are never written to disk
/// (client-credentials tokens are simply re-requested on the next run).
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    credential: Mutex<Option<Credential>>,
}

impl MemoryCredentialStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_credential(credential: Credential) -> Self {
        Self { credential: Mutex::new(Some(credential)) }
    }

    /// Snapshot of the stored credential.
    #[must_use]
    pub fn current(&self) -> Option<Credential> {
        self.credential.lock().clone()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn load(&self) -> Result<Option<Credential>, String> {
        Ok(self.credential.lock().clone())
    }

    async fn save(&self, credential: &Credential) -> Result<(), String> {
        *self.credential.lock() = Some(credential.clone());
        Ok(())
    }
}
