//! Configuration structures
//!
//! Every numeric parameter is fixed before a run starts; nothing here changes
//! while invoices are being dispatched.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_BACKOFF_BASE_MS, DEFAULT_DISTRIBUTOR_CODE, DEFAULT_HTTP_TIMEOUT_SECS,
    DEFAULT_MAX_ATTEMPTS, DEFAULT_PAGE_SIZE, DEFAULT_RATE_LIMIT, DEFAULT_RATE_LIMIT_PERIOD_SECS,
    DEFAULT_REFRESH_SKEW_SECS, DEFAULT_SOURCE_AP_AUTHORIZATION_ENDPOINT,
    DEFAULT_SOURCE_AP_CREDENTIAL_PATH, DEFAULT_SOURCE_AP_TOKEN_ENDPOINT,
    DEFAULT_TARGET_CRM_RATE_LIMIT, DEFAULT_TARGET_CRM_RATE_LIMIT_PERIOD_SECS, DEFAULT_WORKER_COUNT,
    MAX_REFRESH_SKEW_SECS,
};
use crate::errors::{LedgerLinkError, Result};

/// Top-level configuration for one batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub source_ap: SourceApConfig,
    pub target_crm: TargetCrmConfig,
    #[serde(default)]
    pub dispatch: DispatchConfig,
    #[serde(default)]
    pub http: HttpConfig,
    /// Static filters appended to every invoice page request.
    #[serde(default)]
    pub filters: BTreeMap<String, String>,
}

impl AppConfig {
    /// Validate all sections.
    pub fn validate(&self) -> Result<()> {
        self.source_ap.validate()?;
        self.target_crm.validate()?;
        self.dispatch.validate()?;
        self.http.validate()
    }
}

/// Accounting platform (Source AP) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceApConfig {
    pub api_base_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    #[serde(default)]
    pub scopes: String,
    #[serde(default = "default_source_token_endpoint")]
    pub token_endpoint: String,
    #[serde(default = "default_source_authorization_endpoint")]
    pub authorization_endpoint: String,
    #[serde(default = "default_credential_path")]
    pub credential_path: PathBuf,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default = "default_rate_limit")]
    pub rate_limit: u32,
    #[serde(default = "default_rate_limit_period_secs")]
    pub rate_limit_period_secs: u64,
}

impl SourceApConfig {
    fn validate(&self) -> Result<()> {
        require("source_ap.api_base_url", &self.api_base_url)?;
        require("source_ap.client_id", &self.client_id)?;
        require("source_ap.client_secret", &self.client_secret)?;
        require("source_ap.redirect_uri", &self.redirect_uri)?;
        if self.page_size == 0 {
            return Err(LedgerLinkError::Config("source_ap.page_size must be at least 1".into()));
        }
        validate_rate("source_ap", self.rate_limit, self.rate_limit_period_secs)
    }
}

/// CRM (Target CRM) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetCrmConfig {
    pub api_base_url: String,
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: String,
    /// Defaults to the tenant's `oauth2/token` endpoint.
    #[serde(default)]
    pub token_endpoint: Option<String>,
    #[serde(default = "default_distributor")]
    pub distributor: i64,
    #[serde(default = "default_crm_rate_limit")]
    pub rate_limit: u32,
    #[serde(default = "default_crm_rate_limit_period_secs")]
    pub rate_limit_period_secs: u64,
}

impl TargetCrmConfig {
    /// Token endpoint, falling back to the tenant-scoped default.
    pub fn resolved_token_endpoint(&self) -> String {
        self.token_endpoint.clone().unwrap_or_else(|| {
            format!("https://login.microsoftonline.com/{}/oauth2/token", self.tenant_id)
        })
    }

    fn validate(&self) -> Result<()> {
        require("target_crm.api_base_url", &self.api_base_url)?;
        require("target_crm.client_id", &self.client_id)?;
        require("target_crm.client_secret", &self.client_secret)?;
        if self.token_endpoint.is_none() {
            require("target_crm.tenant_id", &self.tenant_id)?;
        }
        validate_rate("target_crm", self.rate_limit, self.rate_limit_period_secs)
    }
}

/// Worker pool settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchConfig {
    #[serde(default = "default_workers")]
    pub workers: usize,
    #[serde(default = "default_rate_limit")]
    pub rate_limit: u32,
    #[serde(default = "default_rate_limit_period_secs")]
    pub rate_limit_period_secs: u64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKER_COUNT,
            rate_limit: DEFAULT_RATE_LIMIT,
            rate_limit_period_secs: DEFAULT_RATE_LIMIT_PERIOD_SECS,
        }
    }
}

impl DispatchConfig {
    /// Per-worker cadence: `rate_limit_period / rate_limit`.
    pub fn cadence(&self) -> Duration {
        Duration::from_secs(self.rate_limit_period_secs) / self.rate_limit.max(1)
    }

    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(LedgerLinkError::Config("dispatch.workers must be at least 1".into()));
        }
        validate_rate("dispatch", self.rate_limit, self.rate_limit_period_secs)
    }
}

/// Outbound HTTP behaviour shared by both API clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,
    /// Tokens are refreshed this many seconds before they expire.
    #[serde(default = "default_refresh_skew_secs")]
    pub refresh_skew_secs: i64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            backoff_base_ms: DEFAULT_BACKOFF_BASE_MS,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            refresh_skew_secs: DEFAULT_REFRESH_SKEW_SECS,
        }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_ms)
    }

    fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(LedgerLinkError::Config("http.max_attempts must be at least 1".into()));
        }
        if !(0..=MAX_REFRESH_SKEW_SECS).contains(&self.refresh_skew_secs) {
            return Err(LedgerLinkError::Config(format!(
                "http.refresh_skew_secs must be between 0 and {MAX_REFRESH_SKEW_SECS}"
            )));
        }
        Ok(())
    }
}

fn require(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(LedgerLinkError::Config(format!("{field} must not be empty")));
    }
    Ok(())
}

fn validate_rate(section: &str, limit: u32, period_secs: u64) -> Result<()> {
    if limit == 0 {
        return Err(LedgerLinkError::Config(format!("{section}.rate_limit must be at least 1")));
    }
    if period_secs == 0 {
        return Err(LedgerLinkError::Config(format!(
            "{section}.rate_limit_period_secs must be at least 1"
        )));
    }
    // The pacing interval is period / limit; it must stay above zero.
    if (Duration::from_secs(period_secs) / limit).is_zero() {
        return Err(LedgerLinkError::Config(format!(
            "{section}.rate_limit of {limit} per {period_secs}s gives a zero pacing interval"
        )));
    }
    Ok(())
}

fn default_source_token_endpoint() -> String {
    DEFAULT_SOURCE_AP_TOKEN_ENDPOINT.to_string()
}

fn default_source_authorization_endpoint() -> String {
    DEFAULT_SOURCE_AP_AUTHORIZATION_ENDPOINT.to_string()
}

fn default_credential_path() -> PathBuf {
    PathBuf::from(DEFAULT_SOURCE_AP_CREDENTIAL_PATH)
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

fn default_rate_limit() -> u32 {
    DEFAULT_RATE_LIMIT
}

fn default_rate_limit_period_secs() -> u64 {
    DEFAULT_RATE_LIMIT_PERIOD_SECS
}

fn default_crm_rate_limit() -> u32 {
    DEFAULT_TARGET_CRM_RATE_LIMIT
}

fn default_crm_rate_limit_period_secs() -> u64 {
    DEFAULT_TARGET_CRM_RATE_LIMIT_PERIOD_SECS
}

fn default_distributor() -> i64 {
    DEFAULT_DISTRIBUTOR_CODE
}

fn default_workers() -> usize {
    DEFAULT_WORKER_COUNT
}

fn default_timeout_secs() -> u64 {
    DEFAULT_HTTP_TIMEOUT_SECS
}

fn default_backoff_base_ms() -> u64 {
    DEFAULT_BACKOFF_BASE_MS
}

fn default_max_attempts() -> usize {
    DEFAULT_MAX_ATTEMPTS
}

fn default_refresh_skew_secs() -> i64 {
    DEFAULT_REFRESH_SKEW_SECS
}
