//! # LedgerLink Domain
//!
//! Business domain types and models for LedgerLink.
//!
//! This crate contains:
//! - Invoice records as read from the accounting platform
//! - CRM invoice payloads and customer account references
//! - Domain error types and Result definitions
//! - Configuration structures and defaults
//!
//! ## Architecture
//! - No dependencies on other LedgerLink crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
