//! In-memory port implementations

use std::collections::HashMap;

use async_trait::async_trait;
use ledgerlink_core::{CrmGateway, InvoiceSource};
use ledgerlink_domain::{
    CrmInvoice, CustomerAccount, InvoiceRecord, LedgerLinkError, Result as DomainResult,
};
use parking_lot::Mutex;

pub fn invoice(document_number: &str, customer_number: &str) -> InvoiceRecord {
    InvoiceRecord {
        document_number: document_number.into(),
        customer_number: customer_number.into(),
        customer_name: Some(format!("Customer {customer_number}")),
        invoice_date: "2024-06-24".into(),
        due_date: "2024-07-24".into(),
        total: 500.0,
        balance: 0.0,
        booked: true,
        cancelled: false,
    }
}

/// Source with a fixed invoice list; PDFs are derived from the document
/// number. Document numbers listed in `missing_pdfs` answer with NotFound.
#[derive(Default)]
pub struct StubSource {
    pub invoices: Vec<InvoiceRecord>,
    pub missing_pdfs: Vec<String>,
}

#[async_trait]
impl InvoiceSource for StubSource {
    async fn fetch_invoices(&self) -> DomainResult<Vec<InvoiceRecord>> {
        Ok(self.invoices.clone())
    }

    async fn fetch_invoice_pdf(&self, document_number: &str) -> DomainResult<Vec<u8>> {
        if self.missing_pdfs.iter().any(|d| d == document_number) {
            return Err(LedgerLinkError::NotFound(format!("invoice {document_number} preview")));
        }
        Ok(format!("%PDF-1.4 {document_number}").into_bytes())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredInvoice {
    pub payload: CrmInvoice,
    pub attachment: Option<(String, usize)>,
    pub customer: Option<String>,
}

/// CRM backed by a map of created invoices.
#[derive(Default)]
pub struct InMemoryCrm {
    accounts: HashMap<String, String>,
    invoices: Mutex<HashMap<String, StoredInvoice>>,
    next_id: Mutex<u32>,
}

impl InMemoryCrm {
    pub fn with_accounts(accounts: &[(&str, &str)]) -> Self {
        Self {
            accounts: accounts.iter().map(|(c, a)| (c.to_string(), a.to_string())).collect(),
            ..Self::default()
        }
    }

    pub fn stored(&self) -> HashMap<String, StoredInvoice> {
        self.invoices.lock().clone()
    }
}

#[async_trait]
impl CrmGateway for InMemoryCrm {
    async fn find_invoice_by_document_number(
        &self,
        document_number: &str,
    ) -> DomainResult<Option<String>> {
        Ok(self
            .invoices
            .lock()
            .iter()
            .find(|(_, stored)| stored.payload.document_number == document_number)
            .map(|(id, _)| id.clone()))
    }

    async fn find_customer_account(
        &self,
        customer_number: &str,
    ) -> DomainResult<Option<CustomerAccount>> {
        Ok(self
            .accounts
            .get(customer_number)
            .map(|id| CustomerAccount { account_id: id.clone(), odata_id: None }))
    }

    async fn create_invoice(&self, invoice: &CrmInvoice) -> DomainResult<String> {
        let id = {
            let mut next = self.next_id.lock();
            *next += 1;
            format!("00000000-0000-0000-0000-{:012}", *next)
        };
        self.invoices.lock().insert(
            id.clone(),
            StoredInvoice { payload: invoice.clone(), attachment: None, customer: None },
        );
        Ok(id)
    }

    async fn upload_invoice_pdf(
        &self,
        invoice_id: &str,
        file_name: &str,
        content: Vec<u8>,
    ) -> DomainResult<()> {
        let mut invoices = self.invoices.lock();
        let stored = invoices
            .get_mut(invoice_id)
            .ok_or_else(|| LedgerLinkError::NotFound(format!("invoice {invoice_id}")))?;
        stored.attachment = Some((file_name.to_string(), content.len()));
        Ok(())
    }

    async fn link_customer(&self, invoice_id: &str, account_id: &str) -> DomainResult<()> {
        let mut invoices = self.invoices.lock();
        let stored = invoices
            .get_mut(invoice_id)
            .ok_or_else(|| LedgerLinkError::NotFound(format!("invoice {invoice_id}")))?;
        stored.customer = Some(account_id.to_string());
        Ok(())
    }
}
