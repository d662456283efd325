//! Resilience patterns for outbound API traffic
//!
//! - **[`rate_gate`]**: minimum spacing between calls to one upstream API
//!
//! Retry on `429 Too Many Requests` lives in the infra HTTP client, since it
//! is tied to response status codes.

pub mod rate_gate;

pub use rate_gate::RateGate;
