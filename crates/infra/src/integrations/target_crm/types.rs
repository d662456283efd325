//! OData wire types for the Target CRM.

use serde::{Deserialize, Serialize};

/// Collection response: `{ "value": [...] }`.
#[derive(Debug, Deserialize)]
pub struct ODataCollection<T> {
    #[serde(default = "Vec::new")]
    pub value: Vec<T>,
}

impl<T> ODataCollection<T> {
    pub fn into_first(self) -> Option<T> {
        self.value.into_iter().next()
    }
}

/// Identifier of an invoice record, as returned by search and create.
#[derive(Debug, Deserialize)]
pub struct InvoiceRef {
    #[serde(rename = "new_fakturaid")]
    pub id: String,
}

/// Body of a `$ref` association request.
#[derive(Debug, Serialize)]
pub struct EntityReference {
    #[serde(rename = "@odata.id")]
    pub odata_id: String,
}

/// Quote a string literal for an OData `$filter` expression.
pub fn odata_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}
