//! Error types used throughout the application

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for LedgerLink
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum LedgerLinkError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl LedgerLinkError {
    /// Stable label suitable for structured log fields.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::Network(_) => "network",
            Self::RateLimited(_) => "rate_limited",
            Self::Auth(_) => "auth",
            Self::NotFound(_) => "not_found",
            Self::Decode(_) => "decode",
            Self::Storage(_) => "storage",
            Self::Internal(_) => "internal",
        }
    }
}

/// Result type alias for LedgerLink operations
pub type Result<T> = std::result::Result<T, LedgerLinkError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_type_tag() {
        let err = LedgerLinkError::RateLimited("failed to get a response after 5 retries".into());
        let json = serde_json::to_value(&err).unwrap();

        assert_eq!(json["type"], "RateLimited");
        assert_eq!(json["message"], "failed to get a response after 5 retries");
    }

    #[test]
    fn display_includes_category_prefix() {
        let err = LedgerLinkError::NotFound("invoice 1001 preview".into());
        assert_eq!(err.to_string(), "Not found: invoice 1001 preview");
        assert_eq!(err.label(), "not_found");
    }
}
