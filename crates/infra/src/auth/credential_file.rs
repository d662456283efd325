//! Flat-file credential store.
//!
//! Layout: `{ "access_token", "refresh_token", "expires_at" }` with
//! `expires_at` in RFC 3339. Written with mode 0600 on Unix.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use ledgerlink_common::auth::{Credential, CredentialStore};
use ledgerlink_domain::{LedgerLinkError, Result};
use tracing::debug;

use crate::errors::InfraError;

/// Credential store backed by a single JSON file.
#[derive(Debug, Clone)]
pub struct CredentialFile {
    path: PathBuf,
}

impl CredentialFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the credential, `Ok(None)` if the file does not exist.
    pub async fn read(&self) -> Result<Option<Credential>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "credential file not found");
                return Ok(None);
            }
            Err(err) => return Err(LedgerLinkError::from(InfraError::from(err))),
        };

        let credential: Credential = serde_json::from_slice(&bytes).map_err(|err| {
            LedgerLinkError::Storage(format!(
                "credential file {} is malformed: {err}",
                self.path.display()
            ))
        })?;
        Ok(Some(credential))
    }

    /// Replace the file contents with `credential`.
    pub async fn write(&self, credential: &Credential) -> Result<()> {
        let json = serde_json::to_vec_pretty(credential)
            .map_err(|err| LedgerLinkError::from(InfraError::from(err)))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|err| LedgerLinkError::from(InfraError::from(err)))?;
        }

        let mut options = tokio::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(0o600);

        let mut file = options
            .open(&self.path)
            .await
            .map_err(|err| LedgerLinkError::from(InfraError::from(err)))?;
        tokio::io::AsyncWriteExt::write_all(&mut file, &json)
            .await
            .map_err(|err| LedgerLinkError::from(InfraError::from(err)))?;
        tokio::io::AsyncWriteExt::flush(&mut file)
            .await
            .map_err(|err| LedgerLinkError::from(InfraError::from(err)))?;

        // `mode` only applies on creation.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tokio::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))
                .await
                .map_err(|err| LedgerLinkError::from(InfraError::from(err)))?;
        }

        debug!(path = %self.path.display(), "credential file written");
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for CredentialFile {
    async fn load(&self) -> std::result::Result<Option<Credential>, String> {
        self.read().await.map_err(|err| err.to_string())
    }

    async fn save(&self, credential: &Credential) -> std::result::Result<(), String> {
        self.write(credential).await.map_err(|err| err.to_string())
    }
}
