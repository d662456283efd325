//! Testing utilities and helpers
//!
//! - **[`mocks`]**: Mock implementations of the auth traits
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use ledgerlink_common::auth::{MemoryCredentialStore, TokenGuardian};
//! use ledgerlink_common::testing::MockTokenRefresher;
//!
//! let refresher = Arc::new(MockTokenRefresher::new());
//! let guardian = TokenGuardian::new(
//!     "test",
//!     refresher.clone(),
//!     Arc::new(MemoryCredentialStore::new()),
//!     30,
//! );
//! # let _ = guardian;
//! ```

pub mod mocks;

pub use mocks::{MockTokenRefresher, StaticTokenProvider};
