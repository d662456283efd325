//! Outbound HTTP with the shared 429 backoff policy.

pub mod client;

pub use client::{ensure_success, HttpClient, HttpClientBuilder};
