//! Invoice records as published by the accounting platform.

use serde::{Deserialize, Serialize};

/// A single invoice read from the Source AP collection endpoint.
///
/// Field names follow the upstream JSON (`DocumentNumber`, `CustomerNumber`,
/// ...). Records are read-only once fetched and are cloned into the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InvoiceRecord {
    pub document_number: String,
    pub customer_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    pub invoice_date: String,
    pub due_date: String,
    #[serde(default)]
    pub total: f64,
    #[serde(default)]
    pub balance: f64,
    #[serde(default)]
    pub booked: bool,
    #[serde(default)]
    pub cancelled: bool,
}

impl InvoiceRecord {
    /// Composite number written to the CRM record: `{invoice_date}-{document_number}`.
    ///
    /// Duplicate detection searches by the plain document number, not by this
    /// value.
    pub fn invoice_number(&self) -> String {
        format!("{}-{}", self.invoice_date, self.document_number)
    }

    /// File name used for the PDF attachment.
    pub fn attachment_file_name(&self) -> String {
        format!("{}.pdf", self.invoice_number())
    }
}
