use std::time::Duration;

use ledgerlink_domain::constants::{
    DEFAULT_BACKOFF_BASE_MS, DEFAULT_HTTP_TIMEOUT_SECS, DEFAULT_MAX_ATTEMPTS,
};
use ledgerlink_domain::{HttpConfig, LedgerLinkError};
use reqwest::{Client as ReqwestClient, Method, Request, RequestBuilder, Response, StatusCode};
use tracing::{debug, warn};

use crate::errors::{status_error, InfraError};

/// Backoff schedule for rate-limited responses: `base`, `2×base`, `4×base`, …
#[derive(Debug, Clone, Copy)]
struct RetryPolicy {
    max_attempts: usize,
    base: Duration,
}

impl RetryPolicy {
    /// Delay before retry number `retry` (1-based).
    fn delay(&self, retry: usize) -> Duration {
        let exponent = retry.saturating_sub(1).min(8) as u32;
        self.base.saturating_mul(2u32.pow(exponent))
    }
}

/// Shared HTTP client for both upstream APIs.
///
/// Only `429 Too Many Requests` is retried. Any other status goes back to the
/// caller as-is, and transport errors are returned on the first failure.
#[derive(Clone)]
pub struct HttpClient {
    inner: ReqwestClient,
    policy: RetryPolicy,
}

impl HttpClient {
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    pub fn from_config(config: &HttpConfig) -> Result<Self, LedgerLinkError> {
        Self::builder()
            .timeout(config.timeout())
            .base_backoff(config.backoff_base())
            .max_attempts(config.max_attempts)
            .build()
    }

    pub fn request<U>(&self, method: Method, url: U) -> RequestBuilder
    where
        U: reqwest::IntoUrl,
    {
        self.inner.request(method, url)
    }

    /// Send `builder`, sleeping and retrying while the server answers 429.
    ///
    /// The request is rebuilt for each attempt, so bodies must be buffered
    /// (streams cannot be retried).
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response, LedgerLinkError> {
        let attempts = self.policy.max_attempts;

        for attempt in 1..=attempts {
            let request = rebuild(&builder)?;
            let (method, url) = (request.method().clone(), request.url().clone());

            let response = self.inner.execute(request).await.map_err(|err| {
                debug!(attempt, %method, %url, error = %err, "HTTP transport error");
                to_domain(err)
            })?;

            if response.status() != StatusCode::TOO_MANY_REQUESTS {
                debug!(attempt, %method, %url, status = %response.status(), "HTTP response");
                return Ok(response);
            }
            if attempt == attempts {
                break;
            }

            let delay = self.policy.delay(attempt);
            warn!(
                attempt,
                %method,
                %url,
                delay_ms = delay.as_millis() as u64,
                "Rate limited; backing off"
            );
            tokio::time::sleep(delay).await;
        }

        Err(LedgerLinkError::RateLimited(format!(
            "failed to get a response after {attempts} retries"
        )))
    }

    /// [`send`](Self::send) followed by [`ensure_success`]; `context` names
    /// the call in the error message.
    pub async fn send_checked(
        &self,
        builder: RequestBuilder,
        context: &str,
    ) -> Result<Response, LedgerLinkError> {
        let response = self.send(builder).await?;
        ensure_success(response, context).await
    }
}

fn rebuild(builder: &RequestBuilder) -> Result<Request, LedgerLinkError> {
    let cloned = builder.try_clone().ok_or_else(|| {
        LedgerLinkError::Internal("streaming request bodies cannot be retried".into())
    })?;
    cloned.build().map_err(to_domain)
}

fn to_domain(err: reqwest::Error) -> LedgerLinkError {
    InfraError::from(err).into()
}

/// Pass 2xx responses through. Anything else becomes a domain error that
/// carries the response body.
pub async fn ensure_success(response: Response, context: &str) -> Result<Response, LedgerLinkError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(status_error(status, context, &body))
}

/// Builder for [`HttpClient`]; defaults come from the domain constants.
#[derive(Debug)]
pub struct HttpClientBuilder {
    timeout: Duration,
    policy: RetryPolicy,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            policy: RetryPolicy {
                max_attempts: DEFAULT_MAX_ATTEMPTS,
                base: Duration::from_millis(DEFAULT_BACKOFF_BASE_MS),
            },
        }
    }
}

impl HttpClientBuilder {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Total attempts including the first one; at least 1.
    pub fn max_attempts(mut self, attempts: usize) -> Self {
        self.policy.max_attempts = attempts.max(1);
        self
    }

    pub fn base_backoff(mut self, base: Duration) -> Self {
        self.policy.base = base;
        self
    }

    pub fn build(self) -> Result<HttpClient, LedgerLinkError> {
        let inner = ReqwestClient::builder()
            .timeout(self.timeout)
            .user_agent(concat!("ledgerlink/", env!("CARGO_PKG_VERSION")))
            .no_proxy()
            .build()
            .map_err(to_domain)?;

        Ok(HttpClient { inner, policy: self.policy })
    }
}
