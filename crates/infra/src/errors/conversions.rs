//! Conversions from external infrastructure errors into domain errors.

use std::io::Error as IoError;

use ledgerlink_common::auth::TokenGuardianError;
use ledgerlink_domain::LedgerLinkError;
use reqwest::Error as HttpError;
use reqwest::StatusCode;
use serde_json::Error as JsonError;
use toml::de::Error as TomlError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub LedgerLinkError);

impl From<InfraError> for LedgerLinkError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<LedgerLinkError> for InfraError {
    fn from(value: LedgerLinkError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoLedgerLinkError {
    fn into_ledgerlink(self) -> LedgerLinkError;
}

/// Map a non-success response status onto the domain taxonomy.
///
/// `context` names the call (e.g. "create invoice"); `body` is the response
/// text, kept for diagnostics.
pub fn status_error(status: StatusCode, context: &str, body: &str) -> LedgerLinkError {
    let message = format!(
        "{context}: HTTP {} {}{}{}",
        status.as_u16(),
        status.canonical_reason().unwrap_or("unknown status"),
        if body.is_empty() { "" } else { " - " },
        body.trim()
    );

    match status.as_u16() {
        401 | 403 => LedgerLinkError::Auth(message),
        404 => LedgerLinkError::NotFound(message),
        429 => LedgerLinkError::RateLimited(message),
        _ => LedgerLinkError::Network(message),
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → LedgerLinkError */
/* -------------------------------------------------------------------------- */

impl IntoLedgerLinkError for HttpError {
    fn into_ledgerlink(self) -> LedgerLinkError {
        if self.is_timeout() {
            return LedgerLinkError::Network("HTTP request timed out".into());
        }

        #[cfg(not(target_arch = "wasm32"))]
        if self.is_connect() {
            return LedgerLinkError::Network(format!("HTTP connection failure: {self}"));
        }

        if self.is_decode() {
            return LedgerLinkError::Decode(format!("failed to decode HTTP response: {self}"));
        }

        if let Some(status) = self.status() {
            return status_error(status, "HTTP request", "");
        }

        if self.is_builder() {
            return LedgerLinkError::Internal(format!("invalid HTTP request: {self}"));
        }

        LedgerLinkError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_ledgerlink())
    }
}

/* -------------------------------------------------------------------------- */
/* std::io::Error → LedgerLinkError */
/* -------------------------------------------------------------------------- */

impl IntoLedgerLinkError for IoError {
    fn into_ledgerlink(self) -> LedgerLinkError {
        use std::io::ErrorKind;

        match self.kind() {
            ErrorKind::NotFound => LedgerLinkError::NotFound(format!("file not found: {self}")),
            ErrorKind::PermissionDenied => {
                LedgerLinkError::Storage(format!("permission denied: {self}"))
            }
            _ => LedgerLinkError::Storage(self.to_string()),
        }
    }
}

impl From<IoError> for InfraError {
    fn from(value: IoError) -> Self {
        InfraError(value.into_ledgerlink())
    }
}

/* -------------------------------------------------------------------------- */
/* serde_json / toml → LedgerLinkError */
/* -------------------------------------------------------------------------- */

impl IntoLedgerLinkError for JsonError {
    fn into_ledgerlink(self) -> LedgerLinkError {
        LedgerLinkError::Decode(format!("invalid JSON: {self}"))
    }
}

impl From<JsonError> for InfraError {
    fn from(value: JsonError) -> Self {
        InfraError(value.into_ledgerlink())
    }
}

impl IntoLedgerLinkError for TomlError {
    fn into_ledgerlink(self) -> LedgerLinkError {
        LedgerLinkError::Config(format!("invalid TOML: {self}"))
    }
}

impl From<TomlError> for InfraError {
    fn from(value: TomlError) -> Self {
        InfraError(value.into_ledgerlink())
    }
}

/* -------------------------------------------------------------------------- */
/* TokenGuardianError → LedgerLinkError */
/* -------------------------------------------------------------------------- */

impl IntoLedgerLinkError for TokenGuardianError {
    fn into_ledgerlink(self) -> LedgerLinkError {
        match self {
            TokenGuardianError::Storage(msg) => LedgerLinkError::Storage(msg),
            TokenGuardianError::Transport(msg) => {
                LedgerLinkError::Network(format!("token endpoint unreachable: {msg}"))
            }
            TokenGuardianError::Decode(msg) => {
                LedgerLinkError::Decode(format!("token response: {msg}"))
            }
            other => LedgerLinkError::Auth(other.to_string()),
        }
    }
}

impl From<TokenGuardianError> for InfraError {
    fn from(value: TokenGuardianError) -> Self {
        InfraError(value.into_ledgerlink())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
