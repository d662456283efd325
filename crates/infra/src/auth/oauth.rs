//! OAuth2 token grants for the two upstream APIs.
//!
//! - Source AP: authorization-code and refresh-token grants, client
//!   authenticated with HTTP basic auth.
//! - Target CRM: client-credentials grant with the CRM base URL as the
//!   `resource`.

use async_trait::async_trait;
use ledgerlink_common::auth::{Credential, TokenGuardianError, TokenRefresher};
use ledgerlink_domain::{LedgerLinkError, Result, SourceApConfig, TargetCrmConfig};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, RequestBuilder};
use serde::Deserialize;
use tracing::{debug, instrument};
use url::Url;

use crate::http::HttpClient;

/// Token endpoint response.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub expires_in: ExpiresIn,
    #[serde(default)]
    pub token_type: Option<String>,
}

/// `expires_in` arrives as a number from most servers and as a string from
/// the CRM's token endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ExpiresIn {
    Seconds(i64),
    Text(String),
}

impl ExpiresIn {
    pub fn seconds(&self) -> std::result::Result<i64, TokenGuardianError> {
        match self {
            Self::Seconds(secs) => Ok(*secs),
            Self::Text(text) => text
                .trim()
                .parse()
                .map_err(|_| TokenGuardianError::Decode(format!("expires_in is not a number: {text}"))),
        }
    }
}

impl TokenResponse {
    /// Convert into a credential. When the server omits a refresh token the
    /// previous one is kept.
    pub fn into_credential(
        self,
        previous_refresh_token: Option<String>,
    ) -> std::result::Result<Credential, TokenGuardianError> {
        let expires_in = self.expires_in.seconds()?;
        let refresh_token =
            self.refresh_token.filter(|token| !token.is_empty()).or(previous_refresh_token);
        Credential::try_from_lifetime(self.access_token, refresh_token, expires_in)
            .ok_or_else(|| TokenGuardianError::Decode(format!("expires_in out of range: {expires_in}")))
    }
}

async fn request_token(
    http: &HttpClient,
    builder: RequestBuilder,
    previous_refresh_token: Option<String>,
) -> std::result::Result<Credential, TokenGuardianError> {
    let response = http
        .send(builder)
        .await
        .map_err(|err| TokenGuardianError::Transport(err.to_string()))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|err| TokenGuardianError::Transport(err.to_string()))?;

    if !status.is_success() {
        return Err(TokenGuardianError::Rejected { status: status.as_u16(), message: body });
    }

    let parsed: TokenResponse =
        serde_json::from_str(&body).map_err(|err| TokenGuardianError::Decode(err.to_string()))?;
    parsed.into_credential(previous_refresh_token)
}

/* -------------------------------------------------------------------------- */
/* Source AP */
/* -------------------------------------------------------------------------- */

/// OAuth client for the accounting platform.
#[derive(Clone)]
pub struct SourceApOAuth {
    http: HttpClient,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    scopes: String,
    authorization_endpoint: String,
    token_endpoint: String,
}

impl SourceApOAuth {
    pub fn new(http: HttpClient, config: &SourceApConfig) -> Self {
        Self {
            http,
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            redirect_uri: config.redirect_uri.clone(),
            scopes: config.scopes.clone(),
            authorization_endpoint: config.authorization_endpoint.clone(),
            token_endpoint: config.token_endpoint.clone(),
        }
    }

    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    /// URL the user opens to grant access.
    pub fn authorization_url(&self, state: &str) -> Result<Url> {
        let mut url = Url::parse(&self.authorization_endpoint).map_err(|err| {
            LedgerLinkError::Config(format!("invalid authorization endpoint: {err}"))
        })?;
        url.query_pairs_mut()
            .append_pair("client_id", &self.client_id)
            .append_pair("redirect_uri", &self.redirect_uri)
            .append_pair("scope", &self.scopes)
            .append_pair("state", state)
            .append_pair("response_type", "code")
            .append_pair("access_type", "offline");
        Ok(url)
    }

    /// Exchange an authorization code for a credential.
    #[instrument(skip(self, code))]
    pub async fn exchange_code(
        &self,
        code: &str,
    ) -> std::result::Result<Credential, TokenGuardianError> {
        debug!("exchanging authorization code");
        let form = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.redirect_uri.as_str()),
        ];
        request_token(&self.http, self.token_request(&form), None).await
    }

    /// Refresh-token grant.
    #[instrument(skip_all)]
    pub async fn refresh_with(
        &self,
        refresh_token: &str,
    ) -> std::result::Result<Credential, TokenGuardianError> {
        debug!("refreshing access token");
        let form = [("grant_type", "refresh_token"), ("refresh_token", refresh_token)];
        request_token(&self.http, self.token_request(&form), Some(refresh_token.to_string())).await
    }

    fn token_request(&self, form: &[(&str, &str)]) -> RequestBuilder {
        self.http
            .request(Method::POST, self.token_endpoint.as_str())
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .form(form)
    }
}

#[async_trait]
impl TokenRefresher for SourceApOAuth {
    async fn refresh(
        &self,
        current: Option<&Credential>,
    ) -> std::result::Result<Credential, TokenGuardianError> {
        let current = current.ok_or(TokenGuardianError::NotAuthenticated)?;
        match current.refresh_token.as_deref() {
            Some(token) if !token.is_empty() => self.refresh_with(token).await,
            _ => Err(TokenGuardianError::NoRefreshToken),
        }
    }
}

/* -------------------------------------------------------------------------- */
/* Target CRM */
/* -------------------------------------------------------------------------- */

/// Client-credentials grant for the CRM.
#[derive(Clone)]
pub struct TargetCrmOAuth {
    http: HttpClient,
    token_endpoint: String,
    client_id: String,
    client_secret: String,
    resource: String,
}

impl TargetCrmOAuth {
    pub fn new(http: HttpClient, config: &TargetCrmConfig) -> Self {
        Self {
            http,
            token_endpoint: config.resolved_token_endpoint(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            resource: config.api_base_url.clone(),
        }
    }
}

#[async_trait]
impl TokenRefresher for TargetCrmOAuth {
    #[instrument(skip_all)]
    async fn refresh(
        &self,
        _current: Option<&Credential>,
    ) -> std::result::Result<Credential, TokenGuardianError> {
        debug!("requesting client-credentials token");
        let form = [
            ("client_id", self.client_id.as_str()),
            ("resource", self.resource.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("grant_type", "client_credentials"),
        ];
        let builder = self
            .http
            .request(Method::POST, self.token_endpoint.as_str())
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .form(&form);
        request_token(&self.http, builder, None).await
    }
}
