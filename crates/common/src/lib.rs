//! Reusable primitives shared across LedgerLink crates.
//!
//! # Feature Tiers
//!
//! Enable cargo features to opt into the tiers you need:
//! - `foundation`: plain data types (credentials, serde helpers)
//! - `runtime`: async infrastructure (rate gate)
//! - `platform`: credential lifecycle (token guardian, credential stores)
//! - `test-utils`: scripted refreshers and static token providers for tests

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

// Runtime tier
// --------------------------------------------------------------------
#[cfg(feature = "runtime")]
pub mod resilience;

// Platform tier
// -------------------------------------------------------------------
#[cfg(feature = "platform")]
pub mod auth;

// Testing utilities
// ---------------------------------------------------------------
#[cfg(feature = "test-utils")]
pub mod testing;

// Re-export commonly used types and traits for convenience
// ------------------------
#[cfg(feature = "platform")]
pub use auth::{
    AccessTokenProvider, Credential, CredentialStore, MemoryCredentialStore, TokenGuardian,
    TokenGuardianError, TokenRefresher,
};
#[cfg(feature = "runtime")]
pub use resilience::RateGate;
