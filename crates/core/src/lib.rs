//! # LedgerLink Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - Port interfaces for the accounting platform and the CRM
//! - The per-invoice sync pipeline
//! - The rate-paced worker pool that drives the pipeline
//!
//! ## Architecture Principles
//! - Only depends on `ledgerlink-domain`
//! - No HTTP or platform code
//! - All external dependencies via traits

pub mod sync;

pub use sync::dispatch::{DispatchPool, DispatchSummary};
pub use sync::pipeline::{InvoicePipeline, PipelineError, PipelineOutcome, PipelineStep};
pub use sync::ports::{CrmGateway, InvoiceProcessor, InvoiceSource};
