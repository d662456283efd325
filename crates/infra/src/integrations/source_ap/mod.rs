//! Source AP (accounting platform) integration
//!
//! - **Client**: [`SourceApClient`] - paginated invoice listing and PDF preview
//! - **Types**: collection envelope ([`InvoicePage`], [`MetaInformation`])
//!
//! Authentication lives in [`crate::auth`]; the client only consumes an
//! [`AccessTokenProvider`](ledgerlink_common::auth::AccessTokenProvider).

pub mod client;
pub mod types;

pub use client::SourceApClient;
pub use types::{InvoicePage, MetaInformation};
