//! Application constants
//!
//! Centralized location for all domain-level constants used throughout the
//! application.

// Dispatch pool defaults
pub const DEFAULT_WORKER_COUNT: usize = 5;
pub const DEFAULT_RATE_LIMIT: u32 = 25;
pub const DEFAULT_RATE_LIMIT_PERIOD_SECS: u64 = 5;

// Source AP
pub const DEFAULT_PAGE_SIZE: u32 = 500;
pub const DEFAULT_SOURCE_AP_TOKEN_ENDPOINT: &str = "https://apps.fortnox.se/oauth-v1/token";
pub const DEFAULT_SOURCE_AP_AUTHORIZATION_ENDPOINT: &str = "https://apps.fortnox.se/oauth-v1/auth";
pub const DEFAULT_SOURCE_AP_CREDENTIAL_PATH: &str = "source_ap_tokens.json";

// Target CRM (Dataverse service protection: 6000 requests per 5 minutes)
pub const DEFAULT_TARGET_CRM_RATE_LIMIT: u32 = 6000;
pub const DEFAULT_TARGET_CRM_RATE_LIMIT_PERIOD_SECS: u64 = 300;
pub const TARGET_CRM_API_PATH: &str = "api/data/v9.2";
pub const DEFAULT_DISTRIBUTOR_CODE: i64 = 100_000_001;
pub const INVOICE_PDF_COLUMN: &str = "new_invoicepdf";

// HTTP behaviour
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_BACKOFF_BASE_MS: u64 = 100;
pub const DEFAULT_MAX_ATTEMPTS: usize = 5;

// Token handling
pub const DEFAULT_REFRESH_SKEW_SECS: i64 = 30;

/// Upper bound for `http.refresh_skew_secs` (one day).
pub const MAX_REFRESH_SKEW_SECS: i64 = 86_400;
pub const AUTHORIZATION_TIMEOUT_SECS: u64 = 300;
