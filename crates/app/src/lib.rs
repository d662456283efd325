//! LedgerLink application layer
//!
//! Wires configuration into clients and runs one sync batch:
//! credentials, fetch, dispatch, summary.

pub mod context;
pub mod utils;

use std::time::Instant;

use anyhow::Context;
use ledgerlink_core::{DispatchSummary, InvoiceSource};
use ledgerlink_domain::AppConfig;

pub use context::AppContext;

/// Run one batch end to end.
///
/// Startup failures (client construction, credentials, invoice listing) are
/// returned as errors. Per-invoice failures are only counted in the summary.
pub async fn run(config: AppConfig) -> anyhow::Result<DispatchSummary> {
    let started = Instant::now();
    let context = AppContext::new(config).context("failed to build application context")?;

    context.prepare_credentials().await.context("failed to obtain API credentials")?;

    let invoices =
        context.source.fetch_invoices().await.context("failed to fetch invoices from Source AP")?;

    let summary = context.dispatch.run(invoices).await;
    utils::logging::log_summary(&summary, started.elapsed());
    Ok(summary)
}
