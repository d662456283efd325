//! Rate-paced worker pool over a closed set of invoices.
//!
//! All invoices are known up front. The pool spawns its workers, fills a
//! bounded queue sized to the batch, closes it and then waits for every
//! worker to drain it. Each worker waits for its own cadence tick before
//! every item, on top of whatever rate gates the API clients apply.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use ledgerlink_core::{DispatchPool, InvoiceProcessor};
//! use ledgerlink_domain::{DispatchConfig, InvoiceRecord};
//!
//! # async fn example(processor: Arc<dyn InvoiceProcessor>, invoices: Vec<InvoiceRecord>)
//! # -> ledgerlink_domain::Result<()> {
//! let pool = DispatchPool::new(processor, DispatchConfig::default())?;
//! let summary = pool.run(invoices).await;
//! println!("{} synced, {} failed", summary.synced, summary.failed);
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use ledgerlink_domain::{DispatchConfig, InvoiceRecord, Result};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use super::pipeline::{PipelineError, PipelineOutcome};
use super::ports::InvoiceProcessor;

type SharedQueue = Arc<Mutex<mpsc::Receiver<InvoiceRecord>>>;

/// Per-outcome counts for one dispatch run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchSummary {
    /// Invoices placed on the queue
    pub dispatched: usize,
    pub synced: usize,
    pub already_present: usize,
    /// Skipped because the customer is unknown to the CRM
    pub skipped: usize,
    pub failed: usize,
}

impl DispatchSummary {
    /// Invoices whose pipeline run finished, successfully or not.
    pub fn processed(&self) -> usize {
        self.synced + self.already_present + self.skipped + self.failed
    }

    fn record(&mut self, result: &std::result::Result<PipelineOutcome, PipelineError>) {
        match result {
            Ok(PipelineOutcome::Synced { .. }) => self.synced += 1,
            Ok(PipelineOutcome::AlreadyExists { .. }) => self.already_present += 1,
            Ok(PipelineOutcome::CustomerNotFound) => self.skipped += 1,
            Err(_) => self.failed += 1,
        }
    }

    fn merge(&mut self, other: DispatchSummary) {
        self.synced += other.synced;
        self.already_present += other.already_present;
        self.skipped += other.skipped;
        self.failed += other.failed;
    }
}

/// Fixed-size worker pool that runs an [`InvoiceProcessor`] over a batch.
pub struct DispatchPool {
    processor: Arc<dyn InvoiceProcessor>,
    config: DispatchConfig,
}

impl DispatchPool {
    /// Create a pool; the configuration is validated here, before any worker
    /// exists.
    pub fn new(processor: Arc<dyn InvoiceProcessor>, config: DispatchConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { processor, config })
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Process every invoice exactly once and return after all workers exit.
    ///
    /// Per-invoice failures are logged and counted; they never stop the run.
    pub async fn run(&self, invoices: Vec<InvoiceRecord>) -> DispatchSummary {
        let cadence = self.config.cadence();
        let (sender, receiver) = mpsc::channel(invoices.len().max(1));
        let queue: SharedQueue = Arc::new(Mutex::new(receiver));

        let mut workers = JoinSet::new();
        for worker_id in 0..self.config.workers {
            workers.spawn(worker_loop(worker_id, queue.clone(), self.processor.clone(), cadence));
        }
        debug!(
            workers = self.config.workers,
            cadence_ms = cadence.as_millis() as u64,
            "Dispatch workers started"
        );

        let mut summary = DispatchSummary::default();
        for invoice in invoices {
            if sender.send(invoice).await.is_err() {
                // Only possible if every worker has died.
                error!("Dispatch queue closed before all invoices were enqueued");
                break;
            }
            summary.dispatched += 1;
        }
        drop(sender);

        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(tally) => summary.merge(tally),
                Err(e) => error!(error = %e, "Dispatch worker terminated abnormally"),
            }
        }

        summary
    }
}

async fn worker_loop(
    worker_id: usize,
    queue: SharedQueue,
    processor: Arc<dyn InvoiceProcessor>,
    cadence: Duration,
) -> DispatchSummary {
    let mut ticker = interval_at(Instant::now() + cadence, cadence);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut tally = DispatchSummary::default();

    loop {
        let next = queue.lock().await.recv().await;
        let Some(invoice) = next else {
            break;
        };

        ticker.tick().await;

        let started = Instant::now();
        let result = processor.process(&invoice).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match &result {
            Ok(outcome) => info!(
                worker = worker_id,
                document_number = %invoice.document_number,
                outcome = outcome.label(),
                elapsed_ms,
                "Processed invoice"
            ),
            Err(e) => warn!(
                worker = worker_id,
                document_number = %e.document_number,
                customer_number = %e.customer_number,
                step = %e.step,
                crm_invoice_id = e.crm_invoice_id.as_deref().unwrap_or(""),
                error_kind = e.source.label(),
                error = %e.source,
                elapsed_ms,
                "Invoice sync failed"
            ),
        }
        tally.record(&result);
    }

    debug!(worker = worker_id, processed = tally.processed(), "Dispatch worker finished");
    tally
}
