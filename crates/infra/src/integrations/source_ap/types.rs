//! Wire types for the Source AP invoice collection.

use ledgerlink_domain::InvoiceRecord;
use serde::Deserialize;

/// Paging envelope returned with every collection page.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct MetaInformation {
    #[serde(rename = "@TotalResources", default)]
    pub total_resources: u64,
    #[serde(rename = "@TotalPages", default)]
    pub total_pages: u32,
    #[serde(rename = "@CurrentPage", default)]
    pub current_page: u32,
}

/// One page of `GET /invoices`.
#[derive(Debug, Deserialize)]
pub struct InvoicePage {
    #[serde(rename = "MetaInformation", default)]
    pub meta: MetaInformation,
    #[serde(rename = "Invoices", default)]
    pub invoices: Vec<InvoiceRecord>,
}
