//! Pipeline + dispatch pool against in-memory ports.

mod support;

use std::sync::Arc;

use ledgerlink_core::{DispatchPool, DispatchSummary, InvoicePipeline, InvoiceSource};
use ledgerlink_domain::DispatchConfig;
use support::fakes::{invoice, InMemoryCrm, StubSource};

fn config() -> DispatchConfig {
    DispatchConfig { workers: 4, rate_limit: 25, rate_limit_period_secs: 5 }
}

/// Every invoice with a known customer ends up created, attached and
/// linked; unknown customers are skipped and missing PDFs fail one invoice
/// without creating anything.
#[tokio::test(start_paused = true)]
async fn test_batch_sync_against_in_memory_crm() {
    let mut invoices: Vec<_> = (1..=10).map(|n| invoice(&format!("{n}"), "C1")).collect();
    invoices.push(invoice("11", "UNKNOWN"));
    invoices.push(invoice("12", "C2"));
    let source = Arc::new(StubSource { invoices, missing_pdfs: vec!["12".into()] });
    let crm = Arc::new(InMemoryCrm::with_accounts(&[("C1", "acc-1"), ("C2", "acc-2")]));

    let pipeline = Arc::new(InvoicePipeline::new(source.clone(), crm.clone(), 100_000_001));
    let pool = DispatchPool::new(pipeline, config()).unwrap();

    let summary = pool.run(source.fetch_invoices().await.unwrap()).await;

    assert_eq!(
        summary,
        DispatchSummary { dispatched: 12, synced: 10, already_present: 0, skipped: 1, failed: 1 }
    );
    let stored = crm.stored();
    assert_eq!(stored.len(), 10);
    for record in stored.values() {
        assert_eq!(record.customer.as_deref(), Some("acc-1"));
        let (file_name, _) = record.attachment.clone().unwrap();
        assert_eq!(file_name, format!("{}.pdf", record.payload.invoice_number));
        assert_eq!(record.payload.distributor, 100_000_001);
    }
}

/// Running the same batch twice creates nothing new the second time.
#[tokio::test(start_paused = true)]
async fn test_rerun_is_idempotent() {
    let invoices: Vec<_> = (1..=6).map(|n| invoice(&format!("{n}"), "C1")).collect();
    let source = Arc::new(StubSource { invoices: invoices.clone(), ..StubSource::default() });
    let crm = Arc::new(InMemoryCrm::with_accounts(&[("C1", "acc-1")]));
    let pipeline = Arc::new(InvoicePipeline::new(source, crm.clone(), 100_000_001));
    let pool = DispatchPool::new(pipeline, config()).unwrap();

    let first = pool.run(invoices.clone()).await;
    let second = pool.run(invoices).await;

    assert_eq!(first.synced, 6);
    assert_eq!(second.already_present, 6);
    assert_eq!(second.synced, 0);
    assert_eq!(crm.stored().len(), 6);
}
