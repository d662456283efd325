//! Configuration loader
//!
//! ## Loading Strategy
//! 1. Environment variables (after the binary has applied `.env`)
//! 2. If any required variable is missing, a config file: the path in
//!    `LEDGERLINK_CONFIG`, else the first of `./ledgerlink.toml`,
//!    `./config.toml`, `./ledgerlink.json`, `./config.json`
//!
//! The result is validated before it is returned.
//!
//! ## Environment Variables
//! Required:
//! - `SOURCE_AP_CLIENT_ID`, `SOURCE_AP_CLIENT_SECRET`, `SOURCE_AP_REDIRECT_URI`,
//!   `SOURCE_AP_API_BASE_URL`
//! - `TARGET_CRM_API_BASE_URL`, `TARGET_CRM_TENANT_ID`, `TARGET_CRM_CLIENT_ID`,
//!   `TARGET_CRM_CLIENT_SECRET`
//!
//! Optional:
//! - `SOURCE_AP_SCOPES`, `SOURCE_AP_TOKEN_ENDPOINT`,
//!   `SOURCE_AP_AUTHORIZATION_ENDPOINT`, `SOURCE_AP_CREDENTIAL_PATH`
//! - `SOURCE_AP_FILTERS`: `key=value,key=value`
//! - `SOURCE_AP_PAGE_SIZE`, `SOURCE_AP_RATE_LIMIT`,
//!   `SOURCE_AP_RATE_LIMIT_PERIOD_SECS`
//! - `TARGET_CRM_TOKEN_ENDPOINT`, `TARGET_CRM_DISTRIBUTOR`,
//!   `TARGET_CRM_RATE_LIMIT`, `TARGET_CRM_RATE_LIMIT_PERIOD_SECS`
//! - `LEDGERLINK_WORKERS`, `LEDGERLINK_RATE_LIMIT`,
//!   `LEDGERLINK_RATE_LIMIT_PERIOD_SECS`

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use ledgerlink_domain::constants::{
    DEFAULT_DISTRIBUTOR_CODE, DEFAULT_PAGE_SIZE, DEFAULT_RATE_LIMIT,
    DEFAULT_RATE_LIMIT_PERIOD_SECS, DEFAULT_SOURCE_AP_AUTHORIZATION_ENDPOINT,
    DEFAULT_SOURCE_AP_CREDENTIAL_PATH, DEFAULT_SOURCE_AP_TOKEN_ENDPOINT,
    DEFAULT_TARGET_CRM_RATE_LIMIT, DEFAULT_TARGET_CRM_RATE_LIMIT_PERIOD_SECS, DEFAULT_WORKER_COUNT,
};
use ledgerlink_domain::{
    AppConfig, DispatchConfig, HttpConfig, LedgerLinkError, Result, SourceApConfig,
    TargetCrmConfig,
};

/// Names of the config files probed in the working directory, in order.
pub const CONFIG_FILE_CANDIDATES: [&str; 4] =
    ["ledgerlink.toml", "config.toml", "ledgerlink.json", "config.json"];

/// Load and validate configuration: environment first, then file.
///
/// # Errors
/// Returns `LedgerLinkError::Config` if neither source yields a complete,
/// valid configuration.
pub fn load() -> Result<AppConfig> {
    let config = match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            config
        }
        Err(e) => {
            tracing::debug!(error = %e, "Environment incomplete, trying config file");
            let explicit = std::env::var_os("LEDGERLINK_CONFIG").map(PathBuf::from);
            load_from_file(explicit)?
        }
    };

    config.validate()?;
    Ok(config)
}

/// Load configuration from the process environment.
pub fn load_from_env() -> Result<AppConfig> {
    load_from_source(|key| std::env::var(key).ok())
}

/// Build configuration from an arbitrary key lookup.
///
/// Empty values count as unset.
///
/// # Errors
/// Returns `LedgerLinkError::Config` if a required key is missing or a
/// numeric value does not parse.
pub fn load_from_source<F>(lookup: F) -> Result<AppConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
    let required = |key: &str| {
        get(key).ok_or_else(|| {
            LedgerLinkError::Config(format!("Missing required environment variable: {key}"))
        })
    };

    let source_ap = SourceApConfig {
        api_base_url: required("SOURCE_AP_API_BASE_URL")?,
        client_id: required("SOURCE_AP_CLIENT_ID")?,
        client_secret: required("SOURCE_AP_CLIENT_SECRET")?,
        redirect_uri: required("SOURCE_AP_REDIRECT_URI")?,
        scopes: get("SOURCE_AP_SCOPES").unwrap_or_default(),
        token_endpoint: get("SOURCE_AP_TOKEN_ENDPOINT")
            .unwrap_or_else(|| DEFAULT_SOURCE_AP_TOKEN_ENDPOINT.to_string()),
        authorization_endpoint: get("SOURCE_AP_AUTHORIZATION_ENDPOINT")
            .unwrap_or_else(|| DEFAULT_SOURCE_AP_AUTHORIZATION_ENDPOINT.to_string()),
        credential_path: get("SOURCE_AP_CREDENTIAL_PATH")
            .map_or_else(|| PathBuf::from(DEFAULT_SOURCE_AP_CREDENTIAL_PATH), PathBuf::from),
        page_size: parsed(&get, "SOURCE_AP_PAGE_SIZE", DEFAULT_PAGE_SIZE)?,
        rate_limit: parsed(&get, "SOURCE_AP_RATE_LIMIT", DEFAULT_RATE_LIMIT)?,
        rate_limit_period_secs: parsed(
            &get,
            "SOURCE_AP_RATE_LIMIT_PERIOD_SECS",
            DEFAULT_RATE_LIMIT_PERIOD_SECS,
        )?,
    };

    let target_crm = TargetCrmConfig {
        api_base_url: required("TARGET_CRM_API_BASE_URL")?,
        tenant_id: required("TARGET_CRM_TENANT_ID")?,
        client_id: required("TARGET_CRM_CLIENT_ID")?,
        client_secret: required("TARGET_CRM_CLIENT_SECRET")?,
        token_endpoint: get("TARGET_CRM_TOKEN_ENDPOINT"),
        distributor: parsed(&get, "TARGET_CRM_DISTRIBUTOR", DEFAULT_DISTRIBUTOR_CODE)?,
        rate_limit: parsed(&get, "TARGET_CRM_RATE_LIMIT", DEFAULT_TARGET_CRM_RATE_LIMIT)?,
        rate_limit_period_secs: parsed(
            &get,
            "TARGET_CRM_RATE_LIMIT_PERIOD_SECS",
            DEFAULT_TARGET_CRM_RATE_LIMIT_PERIOD_SECS,
        )?,
    };

    let dispatch = DispatchConfig {
        workers: parsed(&get, "LEDGERLINK_WORKERS", DEFAULT_WORKER_COUNT)?,
        rate_limit: parsed(&get, "LEDGERLINK_RATE_LIMIT", DEFAULT_RATE_LIMIT)?,
        rate_limit_period_secs: parsed(
            &get,
            "LEDGERLINK_RATE_LIMIT_PERIOD_SECS",
            DEFAULT_RATE_LIMIT_PERIOD_SECS,
        )?,
    };

    let filters = match get("SOURCE_AP_FILTERS") {
        Some(raw) => parse_filters(&raw)?,
        None => BTreeMap::new(),
    };

    Ok(AppConfig { source_ap, target_crm, dispatch, http: HttpConfig::default(), filters })
}

/// Load configuration from a file.
///
/// If `path` is `None`, the working directory is probed with
/// [`probe_config_paths`]. Format is chosen by extension.
///
/// # Errors
/// Returns `LedgerLinkError::Config` if the file is missing, unreadable or
/// malformed.
pub fn load_from_file(path: Option<PathBuf>) -> Result<AppConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(LedgerLinkError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            LedgerLinkError::Config(
                "Configuration incomplete: environment variables missing and no config file found"
                    .to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| LedgerLinkError::Config(format!("Failed to read config file: {e}")))?;

    parse_config(&contents, &config_path)
}

fn parse_config(contents: &str, path: &Path) -> Result<AppConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| LedgerLinkError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| LedgerLinkError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(LedgerLinkError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// First existing file among [`CONFIG_FILE_CANDIDATES`] in the working
/// directory.
pub fn probe_config_paths() -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    probe_in(&cwd)
}

fn probe_in(dir: &Path) -> Option<PathBuf> {
    CONFIG_FILE_CANDIDATES.iter().map(|name| dir.join(name)).find(|path| path.exists())
}

/// Parse `key=value,key=value` into a filter map.
pub fn parse_filters(raw: &str) -> Result<BTreeMap<String, String>> {
    raw.split(',')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once('=').ok_or_else(|| {
                LedgerLinkError::Config(format!("Invalid filter (expected key=value): {pair}"))
            })?;
            let key = key.trim();
            if key.is_empty() {
                return Err(LedgerLinkError::Config(format!("Invalid filter (empty key): {pair}")));
            }
            Ok((key.to_string(), value.trim().to_string()))
        })
        .collect()
}

fn parsed<T, F>(get: &F, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| LedgerLinkError::Config(format!("Invalid value for {key}: {e}"))),
        None => Ok(default),
    }
}
