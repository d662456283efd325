use std::sync::Arc;

use async_trait::async_trait;
use ledgerlink_common::auth::AccessTokenProvider;
use ledgerlink_common::RateGate;
use ledgerlink_core::sync::ports::CrmGateway;
use ledgerlink_domain::constants::{INVOICE_PDF_COLUMN, TARGET_CRM_API_PATH};
use ledgerlink_domain::{CrmInvoice, CustomerAccount, LedgerLinkError, Result, TargetCrmConfig};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, instrument};

use super::types::{odata_literal, EntityReference, InvoiceRef, ODataCollection};
use crate::errors::{status_error, InfraError};
use crate::http::HttpClient;

const INVOICE_ENTITY_SET: &str = "new_fakturas";
const ACCOUNT_ENTITY_SET: &str = "accounts";
const CUSTOMER_NAVIGATION: &str = "new_customer_account";
const FILE_NAME_HEADER: &str = "x-ms-file-name";
const PREFER_HEADER: &str = "Prefer";

/// Client for the CRM's OData Web API.
pub struct TargetCrmClient {
    api_root: String,
    http: HttpClient,
    gate: Arc<RateGate>,
    tokens: Arc<dyn AccessTokenProvider>,
}

impl TargetCrmClient {
    pub fn new(
        config: &TargetCrmConfig,
        http: HttpClient,
        gate: Arc<RateGate>,
        tokens: Arc<dyn AccessTokenProvider>,
    ) -> Self {
        let api_root =
            format!("{}/{}", config.api_base_url.trim_end_matches('/'), TARGET_CRM_API_PATH);
        Self { api_root, http, gate, tokens }
    }

    /// `{base}/api/data/v9.2`
    pub fn api_root(&self) -> &str {
        &self.api_root
    }

    /// First record of `entity_set` whose `field` equals `value`.
    pub async fn search_one<T: DeserializeOwned>(
        &self,
        entity_set: &str,
        field: &str,
        value: &str,
    ) -> Result<Option<T>> {
        let filter = format!("{field} eq {}", odata_literal(value));
        let url = format!(
            "{}/{entity_set}?$filter={}&$top=1",
            self.api_root,
            urlencoding::encode(&filter)
        );

        let response = self
            .send_authorized(self.http.request(Method::GET, &url), &[StatusCode::OK], "search")
            .await?;
        let collection: ODataCollection<T> = decode(response, entity_set).await?;
        Ok(collection.into_first())
    }

    /// Create a record and return the server representation.
    pub async fn create<B, T>(&self, entity_set: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}/{entity_set}", self.api_root);
        let builder = self
            .http
            .request(Method::POST, &url)
            .header(PREFER_HEADER, "return=representation")
            .json(body);

        let response = self
            .send_authorized(builder, &[StatusCode::OK, StatusCode::CREATED], "create record")
            .await?;
        decode(response, entity_set).await
    }

    /// Partially update an invoice record. Helper for callers outside the
    /// sync pipeline, which never updates existing records.
    #[instrument(skip(self, changes))]
    pub async fn update_invoice<B: Serialize + ?Sized>(
        &self,
        invoice_id: &str,
        changes: &B,
    ) -> Result<()> {
        let url = format!("{}/{INVOICE_ENTITY_SET}({invoice_id})", self.api_root);
        let builder = self
            .http
            .request(Method::PATCH, &url)
            .header(PREFER_HEADER, "return=representation")
            .json(changes);

        self.send_authorized(builder, &[StatusCode::OK, StatusCode::NO_CONTENT], "update invoice")
            .await?;
        Ok(())
    }

    async fn send_authorized(
        &self,
        builder: RequestBuilder,
        accepted: &[StatusCode],
        context: &str,
    ) -> Result<Response> {
        self.gate.acquire().await;
        let token = self
            .tokens
            .access_token()
            .await
            .map_err(|err| LedgerLinkError::from(InfraError::from(err)))?;

        let builder = builder
            .bearer_auth(token)
            .header(ACCEPT, "application/json")
            .header("OData-MaxVersion", "4.0")
            .header("OData-Version", "4.0");
        let response = self.http.send(builder).await?;

        let status = response.status();
        if accepted.contains(&status) {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        if status.is_success() {
            return Err(LedgerLinkError::Network(format!(
                "{context}: unexpected HTTP {} - {}",
                status.as_u16(),
                body.trim()
            )));
        }
        Err(status_error(status, context, &body))
    }
}

async fn decode<T: DeserializeOwned>(response: Response, what: &str) -> Result<T> {
    let body =
        response.bytes().await.map_err(|err| LedgerLinkError::from(InfraError::from(err)))?;
    serde_json::from_slice(&body)
        .map_err(|err| LedgerLinkError::Decode(format!("{what} response: {err}")))
}

#[async_trait]
impl CrmGateway for TargetCrmClient {
    #[instrument(skip(self))]
    async fn find_invoice_by_document_number(
        &self,
        document_number: &str,
    ) -> Result<Option<String>> {
        let found: Option<InvoiceRef> =
            self.search_one(INVOICE_ENTITY_SET, "new_documentnumber", document_number).await?;
        Ok(found.map(|invoice| invoice.id))
    }

    #[instrument(skip(self))]
    async fn find_customer_account(
        &self,
        customer_number: &str,
    ) -> Result<Option<CustomerAccount>> {
        self.search_one(ACCOUNT_ENTITY_SET, "new_kundnummer", customer_number).await
    }

    #[instrument(skip(self, invoice), fields(document_number = %invoice.document_number))]
    async fn create_invoice(&self, invoice: &CrmInvoice) -> Result<String> {
        let created: InvoiceRef = self.create(INVOICE_ENTITY_SET, invoice).await?;
        debug!(crm_invoice_id = %created.id, "invoice record created");
        Ok(created.id)
    }

    #[instrument(skip(self, content), fields(size = content.len()))]
    async fn upload_invoice_pdf(
        &self,
        invoice_id: &str,
        file_name: &str,
        content: Vec<u8>,
    ) -> Result<()> {
        let url =
            format!("{}/{INVOICE_ENTITY_SET}({invoice_id})/{INVOICE_PDF_COLUMN}", self.api_root);
        let builder = self
            .http
            .request(Method::PUT, &url)
            .header(CONTENT_TYPE, "application/octet-stream")
            .header(FILE_NAME_HEADER, file_name)
            .body(content);

        self.send_authorized(
            builder,
            &[StatusCode::OK, StatusCode::NO_CONTENT],
            "upload invoice pdf",
        )
        .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn link_customer(&self, invoice_id: &str, account_id: &str) -> Result<()> {
        let url = format!(
            "{}/{INVOICE_ENTITY_SET}({invoice_id})/{CUSTOMER_NAVIGATION}/$ref",
            self.api_root
        );
        let reference = EntityReference {
            odata_id: format!("{}/{ACCOUNT_ENTITY_SET}({account_id})", self.api_root),
        };
        let builder = self.http.request(Method::POST, &url).json(&reference);

        self.send_authorized(
            builder,
            &[StatusCode::OK, StatusCode::CREATED, StatusCode::NO_CONTENT],
            "link customer",
        )
        .await?;
        Ok(())
    }
}
