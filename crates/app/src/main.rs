//! LedgerLink - invoice sync from the accounting platform into the CRM
//!
//! Runs one batch and exits. Configuration comes from the environment (with
//! `.env` applied first) or a config file; see `ledgerlink_infra::config`.

use anyhow::Context;
use ledgerlink_app::utils::logging::{self, LogFormat};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // `.env` first so RUST_LOG and LEDGERLINK_LOG_FORMAT can come from it.
    let dotenv = dotenvy::dotenv();

    logging::init_tracing(LogFormat::from_env());

    match dotenv {
        Ok(path) => tracing::info!(path = %path.display(), "Loaded .env"),
        Err(e) => tracing::debug!(error = %e, "No .env file loaded"),
    }

    let config = ledgerlink_infra::config::load().context("failed to load configuration")?;
    let summary = ledgerlink_app::run(config).await?;

    if summary.failed > 0 {
        tracing::warn!(failed = summary.failed, "Some invoices failed to sync; see log for details");
    }
    Ok(())
}
