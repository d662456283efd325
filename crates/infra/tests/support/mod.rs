//! Shared fixtures for infra integration tests.

#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use ledgerlink_common::auth::{
    AccessTokenProvider, Credential, CredentialStore, MemoryCredentialStore, TokenGuardian,
    TokenRefresher,
};
use ledgerlink_common::RateGate;
use ledgerlink_domain::{SourceApConfig, TargetCrmConfig};
use ledgerlink_infra::http::HttpClient;
use serde_json::{json, Value};
use wiremock::MockServer;

pub fn http() -> HttpClient {
    HttpClient::builder().base_backoff(Duration::from_millis(1)).build().expect("http client")
}

pub fn open_gate() -> Arc<RateGate> {
    Arc::new(RateGate::new(Duration::ZERO))
}

pub fn source_ap_config(server: &MockServer, credential_path: &Path) -> SourceApConfig {
    SourceApConfig {
        api_base_url: format!("{}/3", server.uri()),
        client_id: "ap-client".into(),
        client_secret: "ap-secret".into(),
        redirect_uri: "http://127.0.0.1:0/callback".into(),
        scopes: "invoice".into(),
        token_endpoint: format!("{}/oauth-v1/token", server.uri()),
        authorization_endpoint: format!("{}/oauth-v1/auth", server.uri()),
        credential_path: credential_path.to_path_buf(),
        page_size: 2,
        rate_limit: 25,
        rate_limit_period_secs: 5,
    }
}

pub fn target_crm_config(server: &MockServer) -> TargetCrmConfig {
    TargetCrmConfig {
        api_base_url: server.uri(),
        tenant_id: "tenant".into(),
        client_id: "crm-client".into(),
        client_secret: "crm-secret".into(),
        token_endpoint: Some(format!("{}/tenant/oauth2/token", server.uri())),
        distributor: 100_000_001,
        rate_limit: 6000,
        rate_limit_period_secs: 300,
    }
}

/// Guardian preloaded with `credential` in an in-memory store.
pub async fn guardian_with(
    refresher: Arc<dyn TokenRefresher>,
    credential: Option<Credential>,
) -> Arc<TokenGuardian> {
    let store: Arc<dyn CredentialStore> = match credential {
        Some(credential) => Arc::new(MemoryCredentialStore::with_credential(credential)),
        None => Arc::new(MemoryCredentialStore::new()),
    };
    let guardian = Arc::new(TokenGuardian::new("test", refresher, store, 30));
    guardian.initialize().await.expect("initialize guardian");
    guardian
}

pub fn as_provider(guardian: Arc<TokenGuardian>) -> Arc<dyn AccessTokenProvider> {
    guardian
}

/// One Source AP collection page.
pub fn invoice_page(total_pages: u32, current: u32, docs: &[&str]) -> Value {
    json!({
        "MetaInformation": {
            "@TotalResources": docs.len(),
            "@TotalPages": total_pages,
            "@CurrentPage": current
        },
        "Invoices": docs.iter().map(|doc| json!({
            "DocumentNumber": doc,
            "CustomerNumber": format!("C-{doc}"),
            "CustomerName": "Ale Folkets Hus",
            "InvoiceDate": "2024-06-24",
            "DueDate": "2024-07-24",
            "Total": 1250.0,
            "Balance": 1250.0,
            "Booked": true,
            "Cancelled": false
        })).collect::<Vec<_>>()
    })
}
