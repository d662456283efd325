//! Interactive authorization-code bootstrap.
//!
//! A loopback HTTP server listens on the configured redirect URI; the user
//! opens the authorization URL printed to the log, the provider redirects
//! back with `code` and `state`, and the code is exchanged for the first
//! credential.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::Query;
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::get;
use axum::Router;
use ledgerlink_common::auth::TokenGuardian;
use ledgerlink_domain::{LedgerLinkError, Result};
use parking_lot::Mutex;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use url::Url;
use uuid::Uuid;

use super::oauth::SourceApOAuth;
use crate::errors::InfraError;

const SUCCESS_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><title>Authorization Complete</title></head>
<body><h1>Authorization Successful</h1><p>You can close this window.</p></body>
</html>"#;

const FAILURE_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><title>Authorization Failed</title></head>
<body><h1>Authorization Failed</h1><p>Invalid or unexpected callback parameters.</p></body>
</html>"#;

type CodeSender = Arc<Mutex<Option<oneshot::Sender<String>>>>;

/// Loopback server that receives the OAuth redirect.
pub struct CallbackServer {
    local_addr: SocketAddr,
    code_rx: Option<oneshot::Receiver<String>>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl CallbackServer {
    /// Bind to the host, port and path of `redirect_uri`.
    ///
    /// Only callbacks carrying `expected_state` are accepted; anything else
    /// gets a 400 and the server keeps waiting.
    pub async fn bind(redirect_uri: &str, expected_state: impl Into<String>) -> Result<Self> {
        let url = Url::parse(redirect_uri)
            .map_err(|err| LedgerLinkError::Config(format!("invalid redirect URI: {err}")))?;
        let host = url
            .host_str()
            .ok_or_else(|| LedgerLinkError::Config("redirect URI has no host".into()))?
            .to_string();
        let port = url.port_or_known_default().unwrap_or(80);
        let path = match url.path() {
            "" => "/".to_string(),
            path => path.to_string(),
        };

        let listener = TcpListener::bind((host.as_str(), port)).await.map_err(|err| {
            LedgerLinkError::Network(format!("failed to bind callback server on {host}:{port}: {err}"))
        })?;
        let local_addr =
            listener.local_addr().map_err(|err| LedgerLinkError::from(InfraError::from(err)))?;

        let (code_tx, code_rx) = oneshot::channel();
        let code_tx: CodeSender = Arc::new(Mutex::new(Some(code_tx)));
        let expected_state: Arc<str> = Arc::from(expected_state.into());

        let app = Router::new().route(
            &path,
            get(move |query: Query<HashMap<String, String>>| {
                handle_callback(query, code_tx.clone(), expected_state.clone())
            }),
        );

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            if let Err(err) = axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.await;
                })
                .await
            {
                error!(error = %err, "callback server error");
            }
        });

        debug!(%local_addr, %path, "callback server listening");
        Ok(Self {
            local_addr,
            code_rx: Some(code_rx),
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Wait for the first callback with a matching state.
    pub async fn wait_for_code(&mut self, timeout: Duration) -> Result<String> {
        let code_rx = self
            .code_rx
            .take()
            .ok_or_else(|| LedgerLinkError::Internal("authorization code already consumed".into()))?;

        match tokio::time::timeout(timeout, code_rx).await {
            Ok(Ok(code)) => Ok(code),
            Ok(Err(_)) => Err(LedgerLinkError::Internal("callback server stopped".into())),
            Err(_) => Err(LedgerLinkError::Auth(format!(
                "timed out after {}s waiting for the authorization callback",
                timeout.as_secs()
            ))),
        }
    }

    /// Stop the server and wait for it to exit.
    pub async fn shutdown(mut self) -> Result<()> {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            if let Err(err) = handle.await {
                if err.is_panic() {
                    return Err(LedgerLinkError::Internal(format!(
                        "callback server panicked: {err}"
                    )));
                }
            }
        }
        Ok(())
    }
}

impl Drop for CallbackServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            if !handle.is_finished() {
                handle.abort();
            }
        }
    }
}

async fn handle_callback(
    Query(params): Query<HashMap<String, String>>,
    code_tx: CodeSender,
    expected_state: Arc<str>,
) -> (StatusCode, Html<&'static str>) {
    let code = params.get("code").filter(|code| !code.is_empty());
    let state = params.get("state");

    match (code, state) {
        (Some(code), Some(state)) if state.as_str() == &*expected_state => {
            match code_tx.lock().take() {
                Some(tx) => {
                    let _ = tx.send(code.clone());
                    (StatusCode::OK, Html(SUCCESS_PAGE))
                }
                None => (StatusCode::CONFLICT, Html(FAILURE_PAGE)),
            }
        }
        _ => {
            warn!(
                has_code = code.is_some(),
                state_matches = state.is_some_and(|s| s.as_str() == &*expected_state),
                "rejected authorization callback"
            );
            (StatusCode::BAD_REQUEST, Html(FAILURE_PAGE))
        }
    }
}

/// Run the interactive authorization-code flow and install the resulting
/// credential into `guardian`.
pub async fn authorize_interactively(
    oauth: &SourceApOAuth,
    guardian: &TokenGuardian,
    timeout: Duration,
) -> Result<()> {
    let state = Uuid::new_v4().to_string();
    let mut server = CallbackServer::bind(oauth.redirect_uri(), state.clone()).await?;
    let authorization_url = oauth.authorization_url(&state)?;

    info!(
        upstream = guardian.name(),
        url = %authorization_url,
        "Authorization required: open this URL in a browser to grant access"
    );

    let code = server.wait_for_code(timeout).await?;
    let credential = oauth
        .exchange_code(&code)
        .await
        .map_err(|err| LedgerLinkError::from(InfraError::from(err)))?;
    guardian
        .install(credential)
        .await
        .map_err(|err| LedgerLinkError::from(InfraError::from(err)))?;

    server.shutdown().await?;
    info!(upstream = guardian.name(), "Authorization complete");
    Ok(())
}
