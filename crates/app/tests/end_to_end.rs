//! Full batches against mocked Source AP and Target CRM servers.
//!
//! Mixed batch, three invoices over two pages:
//! - `1001`: new, customer known → created, PDF uploaded, linked
//! - `1002`: already in the CRM → left alone
//! - `1003`: customer unknown → skipped before its PDF is fetched

use std::collections::BTreeMap;

use ledgerlink_common::auth::Credential;
use ledgerlink_domain::{
    AppConfig, DispatchConfig, HttpConfig, SourceApConfig, TargetCrmConfig,
};
use ledgerlink_infra::CredentialFile;
use serde_json::{json, Value};
use tempfile::TempDir;
use wiremock::matchers::{header, method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

fn invoice(doc: &str) -> Value {
    json!({
        "DocumentNumber": doc,
        "CustomerNumber": format!("C-{doc}"),
        "CustomerName": "Ale Folkets Hus",
        "InvoiceDate": "2024-06-24",
        "DueDate": "2024-07-24",
        "Total": 1250.0,
        "Balance": 1250.0,
        "Booked": true,
        "Cancelled": false
    })
}

fn page(current: u32, docs: &[&str]) -> Value {
    json!({
        "MetaInformation": {
            "@TotalResources": 3,
            "@TotalPages": 2,
            "@CurrentPage": current
        },
        "Invoices": docs.iter().map(|doc| invoice(doc)).collect::<Vec<_>>()
    })
}

fn config(ap: &MockServer, crm: &MockServer, dir: &TempDir) -> AppConfig {
    AppConfig {
        source_ap: SourceApConfig {
            api_base_url: format!("{}/3", ap.uri()),
            client_id: "ap-client".into(),
            client_secret: "ap-secret".into(),
            redirect_uri: "http://127.0.0.1:0/callback".into(),
            scopes: "invoice".into(),
            token_endpoint: format!("{}/oauth-v1/token", ap.uri()),
            authorization_endpoint: format!("{}/oauth-v1/auth", ap.uri()),
            credential_path: dir.path().join("source_ap.json"),
            page_size: 2,
            rate_limit: 1000,
            rate_limit_period_secs: 1,
        },
        target_crm: TargetCrmConfig {
            api_base_url: crm.uri(),
            tenant_id: "tenant".into(),
            client_id: "crm-client".into(),
            client_secret: "crm-secret".into(),
            token_endpoint: Some(format!("{}/tenant/oauth2/token", crm.uri())),
            distributor: 100_000_001,
            rate_limit: 1000,
            rate_limit_period_secs: 1,
        },
        dispatch: DispatchConfig { workers: 2, rate_limit: 1000, rate_limit_period_secs: 1 },
        http: HttpConfig {
            timeout_secs: 5,
            backoff_base_ms: 1,
            max_attempts: 3,
            refresh_skew_secs: 30,
        },
        filters: BTreeMap::from([("filter".to_string(), "unpaid".to_string())]),
    }
}

async fn mount_source_ap(server: &MockServer) {
    for (current, docs) in [(1, vec!["1001", "1002"]), (2, vec!["1003"])] {
        Mock::given(method("GET"))
            .and(path("/3/invoices"))
            .and(query_param("page", current.to_string()))
            .and(query_param("filter", "unpaid"))
            .and(header("authorization", "Bearer ap-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page(current, &docs)))
            .expect(1)
            .mount(server)
            .await;
    }

    Mock::given(method("GET"))
        .and(path("/3/invoices/1001/preview"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"%PDF-1001".to_vec()))
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_target_crm(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/tenant/oauth2/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "crm-token",
            "token_type": "Bearer",
            "expires_in": "3599"
        })))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/data/v9.2/new_fakturas"))
        .and(query_param("$filter", "new_documentnumber eq '1002'"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"value": [{"new_fakturaid": "f-existing"}]})),
        )
        .with_priority(1)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/data/v9.2/new_fakturas"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"value": []})))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/data/v9.2/accounts"))
        .and(query_param("$filter", "new_kundnummer eq 'C-1001'"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"value": [{"accountid": "acc-1001"}]})),
        )
        .with_priority(1)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/data/v9.2/accounts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"value": []})))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/data/v9.2/new_fakturas"))
        .and(header("authorization", "Bearer crm-token"))
        .respond_with(|req: &Request| {
            let body: Value = serde_json::from_slice(&req.body).unwrap_or_default();
            let doc = body["new_documentnumber"].as_str().unwrap_or("unknown");
            ResponseTemplate::new(201).set_body_json(json!({"new_fakturaid": format!("f-{doc}")}))
        })
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("PUT"))
        .and(path_regex(r"^/api/data/v9\.2/new_fakturas\(f-1001\)/[a-z_]+$"))
        .and(header("x-ms-file-name", "2024-06-24-1001.pdf"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/data/v9.2/new_fakturas(f-1001)/new_customer_account/$ref"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn batch_syncs_new_invoices_and_leaves_the_rest() {
    let ap = MockServer::start().await;
    let crm = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = config(&ap, &crm, &dir);

    CredentialFile::new(&config.source_ap.credential_path)
        .write(&Credential::from_lifetime("ap-token", Some("ap-refresh".into()), 3600))
        .await
        .unwrap();

    mount_source_ap(&ap).await;
    mount_target_crm(&crm).await;

    let summary = ledgerlink_app::run(config).await.unwrap();

    assert_eq!(summary.dispatched, 3);
    assert_eq!(summary.synced, 1);
    assert_eq!(summary.already_present, 1);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.failed, 0);

    let created: Vec<Value> = crm
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.method.as_str() == "POST" && r.url.path() == "/api/data/v9.2/new_fakturas")
        .map(|r| serde_json::from_slice(&r.body).unwrap())
        .collect();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0]["new_fakturanummer"], "2024-06-24-1001");
    assert_eq!(created[0]["new_distributor"], 100_000_001);
}

#[tokio::test]
async fn rejected_crm_credentials_fail_before_any_invoice_is_fetched() {
    let ap = MockServer::start().await;
    let crm = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = config(&ap, &crm, &dir);

    CredentialFile::new(&config.source_ap.credential_path)
        .write(&Credential::from_lifetime("ap-token", Some("ap-refresh".into()), 3600))
        .await
        .unwrap();

    Mock::given(method("POST"))
        .and(path("/tenant/oauth2/token"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid_client"))
        .expect(1)
        .mount(&crm)
        .await;
    Mock::given(method("GET"))
        .and(path("/3/invoices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(1, &[])))
        .expect(0)
        .mount(&ap)
        .await;

    let err = ledgerlink_app::run(config).await.unwrap_err();
    assert!(format!("{err:#}").contains("credentials"), "unexpected error: {err:#}");
}

#[tokio::test]
async fn two_invoices_over_two_pages_are_created_uploaded_and_linked() {
    let ap = MockServer::start().await;
    let crm = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let mut config = config(&ap, &crm, &dir);
    config.source_ap.page_size = 1;
    config.filters.clear();

    CredentialFile::new(&config.source_ap.credential_path)
        .write(&Credential::from_lifetime("ap-token", Some("ap-refresh".into()), 3600))
        .await
        .unwrap();

    for (current, doc) in [(1, "2001"), (2, "2002")] {
        Mock::given(method("GET"))
            .and(path("/3/invoices"))
            .and(query_param("page", current.to_string()))
            .and(query_param("limit", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page(current, &[doc])))
            .expect(1)
            .mount(&ap)
            .await;
    }
    Mock::given(method("GET"))
        .and(path_regex(r"^/3/invoices/200[12]/preview$"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"%PDF".to_vec()))
        .expect(2)
        .mount(&ap)
        .await;

    Mock::given(method("POST"))
        .and(path("/tenant/oauth2/token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"access_token": "crm-token", "expires_in": 3599})),
        )
        .expect(1)
        .mount(&crm)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/data/v9.2/new_fakturas"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"value": []})))
        .expect(2)
        .mount(&crm)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/data/v9.2/accounts"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"value": [{"accountid": "acc-1"}]})),
        )
        .expect(2)
        .mount(&crm)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/data/v9.2/new_fakturas"))
        .respond_with(|req: &Request| {
            let body: Value = serde_json::from_slice(&req.body).unwrap_or_default();
            let doc = body["new_documentnumber"].as_str().unwrap_or("unknown");
            ResponseTemplate::new(201).set_body_json(json!({"new_fakturaid": format!("f-{doc}")}))
        })
        .expect(2)
        .mount(&crm)
        .await;
    Mock::given(method("PUT"))
        .and(path_regex(r"^/api/data/v9\.2/new_fakturas\(f-200[12]\)/[a-z_]+$"))
        .respond_with(ResponseTemplate::new(204))
        .expect(2)
        .mount(&crm)
        .await;
    Mock::given(method("POST"))
        .and(path_regex(
            r"^/api/data/v9\.2/new_fakturas\(f-200[12]\)/new_customer_account/\$ref$",
        ))
        .respond_with(ResponseTemplate::new(204))
        .expect(2)
        .mount(&crm)
        .await;

    let summary = ledgerlink_app::run(config).await.unwrap();

    assert_eq!(summary.dispatched, 2);
    assert_eq!(summary.synced, 2);
    assert_eq!(summary.failed, 0);
}
