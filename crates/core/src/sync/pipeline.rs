//! Per-invoice sync pipeline
//!
//! Steps run strictly in order and the first failure ends the run for that
//! invoice. Nothing is rolled back: a CRM record created before a later step
//! fails stays in place and is reported as already present on the next run.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use ledgerlink_domain::{CrmInvoice, InvoiceRecord, LedgerLinkError};
use thiserror::Error;
use tracing::{debug, info};

use super::ports::{CrmGateway, InvoiceProcessor, InvoiceSource};

/// Pipeline stage, used to report where a failure happened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineStep {
    DuplicateCheck,
    CustomerLookup,
    PdfFetch,
    CreateInvoice,
    UploadAttachment,
    LinkCustomer,
}

impl PipelineStep {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DuplicateCheck => "duplicate_check",
            Self::CustomerLookup => "customer_lookup",
            Self::PdfFetch => "pdf_fetch",
            Self::CreateInvoice => "create_invoice",
            Self::UploadAttachment => "upload_attachment",
            Self::LinkCustomer => "link_customer",
        }
    }
}

impl fmt::Display for PipelineStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Successful (non-error) result for one invoice
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineOutcome {
    /// Created, attached and linked
    Synced { crm_invoice_id: String, customer_account_id: String },
    /// A CRM invoice with this document number already exists
    AlreadyExists { crm_invoice_id: String },
    /// No CRM account carries this customer number; invoice skipped
    CustomerNotFound,
}

impl PipelineOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Synced { .. } => "synced",
            Self::AlreadyExists { .. } => "already_exists",
            Self::CustomerNotFound => "customer_not_found",
        }
    }
}

/// Failure of one pipeline step for one invoice
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{step} failed for invoice {document_number} (customer {customer_number}): {source}")]
pub struct PipelineError {
    pub step: PipelineStep,
    pub document_number: String,
    pub customer_number: String,
    /// Set once step 4 has created the CRM record
    pub crm_invoice_id: Option<String>,
    pub source: LedgerLinkError,
}

/// Runs duplicate check, customer lookup, PDF fetch, create, upload and link
/// for one invoice.
pub struct InvoicePipeline {
    source: Arc<dyn InvoiceSource>,
    crm: Arc<dyn CrmGateway>,
    distributor: i64,
}

impl InvoicePipeline {
    pub fn new(source: Arc<dyn InvoiceSource>, crm: Arc<dyn CrmGateway>, distributor: i64) -> Self {
        Self { source, crm, distributor }
    }

    pub async fn run(&self, invoice: &InvoiceRecord) -> Result<PipelineOutcome, PipelineError> {
        let fail = |step: PipelineStep, crm_invoice_id: Option<&str>| {
            let document_number = invoice.document_number.clone();
            let customer_number = invoice.customer_number.clone();
            let crm_invoice_id = crm_invoice_id.map(str::to_owned);
            move |source: LedgerLinkError| PipelineError {
                step,
                document_number,
                customer_number,
                crm_invoice_id,
                source,
            }
        };

        // Searches by the plain document number; the created record's
        // invoice number is the composite `{date}-{document}` form.
        if let Some(existing) = self
            .crm
            .find_invoice_by_document_number(&invoice.document_number)
            .await
            .map_err(fail(PipelineStep::DuplicateCheck, None))?
        {
            debug!(document_number = %invoice.document_number, crm_invoice_id = %existing, "Invoice already in CRM");
            return Ok(PipelineOutcome::AlreadyExists { crm_invoice_id: existing });
        }

        let Some(account) = self
            .crm
            .find_customer_account(&invoice.customer_number)
            .await
            .map_err(fail(PipelineStep::CustomerLookup, None))?
        else {
            info!(
                document_number = %invoice.document_number,
                customer_number = %invoice.customer_number,
                "Customer not found in CRM, skipping invoice"
            );
            return Ok(PipelineOutcome::CustomerNotFound);
        };

        let pdf = self
            .source
            .fetch_invoice_pdf(&invoice.document_number)
            .await
            .map_err(fail(PipelineStep::PdfFetch, None))?;

        let payload = CrmInvoice::from_invoice(invoice, self.distributor);
        let crm_invoice_id = self
            .crm
            .create_invoice(&payload)
            .await
            .map_err(fail(PipelineStep::CreateInvoice, None))?;

        self.crm
            .upload_invoice_pdf(&crm_invoice_id, &invoice.attachment_file_name(), pdf)
            .await
            .map_err(fail(PipelineStep::UploadAttachment, Some(crm_invoice_id.as_str())))?;

        self.crm
            .link_customer(&crm_invoice_id, &account.account_id)
            .await
            .map_err(fail(PipelineStep::LinkCustomer, Some(crm_invoice_id.as_str())))?;

        Ok(PipelineOutcome::Synced { crm_invoice_id, customer_account_id: account.account_id })
    }
}

#[async_trait]
impl InvoiceProcessor for InvoicePipeline {
    async fn process(&self, invoice: &InvoiceRecord) -> Result<PipelineOutcome, PipelineError> {
        self.run(invoice).await
    }
}
