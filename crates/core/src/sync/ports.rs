//! Port interfaces for sync operations

use async_trait::async_trait;
use ledgerlink_domain::{CrmInvoice, CustomerAccount, InvoiceRecord, Result};

use super::pipeline::{PipelineError, PipelineOutcome};

/// Read side: the accounting platform
#[async_trait]
pub trait InvoiceSource: Send + Sync {
    /// Fetch every invoice, walking all pages in order
    async fn fetch_invoices(&self) -> Result<Vec<InvoiceRecord>>;

    /// Fetch the PDF rendition of one invoice
    async fn fetch_invoice_pdf(&self, document_number: &str) -> Result<Vec<u8>>;
}

/// Write side: the CRM
#[async_trait]
pub trait CrmGateway: Send + Sync {
    /// Look up an existing CRM invoice by source document number, returning
    /// its identifier
    async fn find_invoice_by_document_number(&self, document_number: &str)
        -> Result<Option<String>>;

    /// Look up the customer account by customer number
    async fn find_customer_account(&self, customer_number: &str)
        -> Result<Option<CustomerAccount>>;

    /// Create an invoice record, returning its identifier
    async fn create_invoice(&self, invoice: &CrmInvoice) -> Result<String>;

    /// Upload the PDF into the invoice's file column
    async fn upload_invoice_pdf(
        &self,
        invoice_id: &str,
        file_name: &str,
        content: Vec<u8>,
    ) -> Result<()>;

    /// Associate the invoice with the customer account
    async fn link_customer(&self, invoice_id: &str, account_id: &str) -> Result<()>;
}

/// Unit of work executed by each dispatch worker
#[async_trait]
pub trait InvoiceProcessor: Send + Sync {
    async fn process(
        &self,
        invoice: &InvoiceRecord,
    ) -> std::result::Result<PipelineOutcome, PipelineError>;
}
