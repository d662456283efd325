//! Shared test helpers for `ledgerlink-core` integration tests.
//!
//! In-memory stand-ins for the accounting platform and the CRM so the sync
//! tests can focus on behaviour instead of HTTP plumbing.

pub mod fakes;
