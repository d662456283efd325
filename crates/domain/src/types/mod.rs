//! Domain types and models

pub mod crm;
pub mod invoice;

pub use crm::{CrmInvoice, CustomerAccount};
pub use invoice::InvoiceRecord;
