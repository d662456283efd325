//! CRM-side records.

use serde::{Deserialize, Serialize};

use super::invoice::InvoiceRecord;

/// Invoice payload created in the Target CRM (`new_fakturas` entity set).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrmInvoice {
    #[serde(rename = "new_fakturanummer")]
    pub invoice_number: String,
    #[serde(rename = "new_balance")]
    pub balance: f64,
    #[serde(rename = "new_booked")]
    pub booked: bool,
    #[serde(rename = "new_cancelled")]
    pub cancelled: bool,
    #[serde(rename = "new_documentnumber")]
    pub document_number: String,
    #[serde(rename = "new_duedate")]
    pub due_date: String,
    #[serde(rename = "new_invoicedate")]
    pub invoice_date: String,
    #[serde(rename = "new_total")]
    pub total: f64,
    #[serde(rename = "new_distributor")]
    pub distributor: i64,
}

impl CrmInvoice {
    /// Shape a source invoice into the CRM payload.
    pub fn from_invoice(invoice: &InvoiceRecord, distributor: i64) -> Self {
        Self {
            invoice_number: invoice.invoice_number(),
            balance: invoice.balance,
            booked: invoice.booked,
            cancelled: invoice.cancelled,
            document_number: invoice.document_number.clone(),
            due_date: invoice.due_date.clone(),
            invoice_date: invoice.invoice_date.clone(),
            total: invoice.total,
            distributor,
        }
    }
}

/// Customer account resolved by customer number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerAccount {
    #[serde(rename = "accountid")]
    pub account_id: String,
    #[serde(rename = "@odata.id", default, skip_serializing_if = "Option::is_none")]
    pub odata_id: Option<String>,
}
