//! Target CRM integration over the OData Web API (`api/data/v9.2`).

pub mod client;
pub mod types;

pub use client::TargetCrmClient;
pub use types::{odata_literal, EntityReference, InvoiceRef, ODataCollection};
