//! # LedgerLink Infrastructure
//!
//! Implementations of the `ledgerlink-core` ports and everything that
//! touches the network or the filesystem:
//! - 429-aware HTTP client
//! - OAuth grants, credential file, interactive authorization
//! - Source AP and Target CRM clients
//! - Configuration loader

pub mod auth;
pub mod config;
pub mod errors;
pub mod http;
pub mod integrations;

pub use auth::{authorize_interactively, CredentialFile, SourceApOAuth, TargetCrmOAuth};
pub use errors::InfraError;
pub use http::HttpClient;
pub use integrations::{SourceApClient, TargetCrmClient};
