//! Credential lifecycle for upstream APIs
//!
//! Each upstream API gets its own [`TokenGuardian`]. The guardian does not
//! know how tokens are obtained or where they are kept; that is supplied
//! through [`TokenRefresher`] and [`CredentialStore`].
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │  API client      │  holds Arc<dyn AccessTokenProvider>
//! └────────┬─────────┘
//!          │
//!          └──► TokenGuardian      (expiry check + single-flight refresh)
//!                    │
//!                    ├──► TokenRefresher   (refresh_token / client_credentials grant)
//!                    └──► CredentialStore  (credential file, in-memory)
//! ```
//!
//! # Module Organization
//!
//! - **[`types`]**: [`Credential`]
//! - **[`traits`]**: [`TokenRefresher`], [`CredentialStore`],
//!   [`AccessTokenProvider`]
//! - **[`token_guardian`]**: [`TokenGuardian`] and [`TokenGuardianError`]
//! - **[`store`]**: [`MemoryCredentialStore`]

pub mod store;
pub mod token_guardian;
pub mod traits;
pub mod types;

pub use store::MemoryCredentialStore;
pub use token_guardian::{TokenGuardian, TokenGuardianError};
pub use traits::{AccessTokenProvider, CredentialStore, TokenRefresher};
pub use types::Credential;
