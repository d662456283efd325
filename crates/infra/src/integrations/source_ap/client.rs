use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use ledgerlink_common::auth::AccessTokenProvider;
use ledgerlink_common::RateGate;
use ledgerlink_core::sync::ports::InvoiceSource;
use ledgerlink_domain::{InvoiceRecord, LedgerLinkError, Result, SourceApConfig};
use reqwest::header::ACCEPT;
use reqwest::{Method, RequestBuilder, Response};
use tracing::{debug, info, instrument};

use super::types::InvoicePage;
use crate::errors::InfraError;
use crate::http::HttpClient;

/// Client for the accounting platform's invoice API.
///
/// Every call passes the shared [`RateGate`] first, then obtains a bearer
/// token, then goes out through the 429-aware [`HttpClient`].
pub struct SourceApClient {
    base_url: String,
    page_size: u32,
    filters: BTreeMap<String, String>,
    http: HttpClient,
    gate: Arc<RateGate>,
    tokens: Arc<dyn AccessTokenProvider>,
}

impl SourceApClient {
    /// # Arguments
    /// * `config` - Base URL and page size
    /// * `filters` - Static query filters appended to every page request
    /// * `http` - Shared HTTP client
    /// * `gate` - Request pacing for this API
    /// * `tokens` - Bearer token source (normally the Source AP guardian)
    pub fn new(
        config: &SourceApConfig,
        filters: BTreeMap<String, String>,
        http: HttpClient,
        gate: Arc<RateGate>,
        tokens: Arc<dyn AccessTokenProvider>,
    ) -> Self {
        Self {
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            page_size: config.page_size,
            filters,
            http,
            gate,
            tokens,
        }
    }

    /// Fetch one page of the invoice collection (1-based).
    #[instrument(skip(self))]
    pub async fn fetch_page(&self, page: u32) -> Result<InvoicePage> {
        let url = format!("{}/invoices", self.base_url);
        let builder = self
            .http
            .request(Method::GET, &url)
            .query(&[("limit", self.page_size), ("page", page)])
            .query(&self.filters);

        let response = self.send_authorized(builder, "list invoices").await?;
        let body =
            response.bytes().await.map_err(|err| LedgerLinkError::from(InfraError::from(err)))?;
        serde_json::from_slice(&body)
            .map_err(|err| LedgerLinkError::Decode(format!("invoice page {page}: {err}")))
    }

    /// Walk every page in order and concatenate the invoices.
    pub async fn fetch_all(&self) -> Result<Vec<InvoiceRecord>> {
        let started = Instant::now();
        let mut invoices = Vec::new();
        let mut page = 1;

        loop {
            let InvoicePage { meta, invoices: batch } = self.fetch_page(page).await?;
            debug!(
                page,
                total_pages = meta.total_pages,
                received = batch.len(),
                "fetched invoice page"
            );
            invoices.extend(batch);

            if page >= meta.total_pages {
                break;
            }
            page += 1;
        }

        info!(
            count = invoices.len(),
            pages = page,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Fetched {} invoices in {:?}",
            invoices.len(),
            started.elapsed()
        );
        Ok(invoices)
    }

    /// Fetch the PDF rendition of an invoice.
    #[instrument(skip(self))]
    pub async fn fetch_pdf(&self, document_number: &str) -> Result<Vec<u8>> {
        let url = format!(
            "{}/invoices/{}/preview",
            self.base_url,
            urlencoding::encode(document_number)
        );
        let builder = self.http.request(Method::GET, &url);
        let response = self.send_authorized(builder, "fetch invoice preview").await?;
        let bytes =
            response.bytes().await.map_err(|err| LedgerLinkError::from(InfraError::from(err)))?;
        debug!(size = bytes.len(), "fetched invoice preview");
        Ok(bytes.to_vec())
    }

    async fn send_authorized(&self, builder: RequestBuilder, context: &str) -> Result<Response> {
        self.gate.acquire().await;
        let token = self
            .tokens
            .access_token()
            .await
            .map_err(|err| LedgerLinkError::from(InfraError::from(err)))?;

        self.http
            .send_checked(builder.bearer_auth(token).header(ACCEPT, "application/json"), context)
            .await
    }
}

#[async_trait]
impl InvoiceSource for SourceApClient {
    async fn fetch_invoices(&self) -> Result<Vec<InvoiceRecord>> {
        self.fetch_all().await
    }

    async fn fetch_invoice_pdf(&self, document_number: &str) -> Result<Vec<u8>> {
        self.fetch_pdf(document_number).await
    }
}
