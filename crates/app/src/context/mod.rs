//! Application context - dependency injection container

use std::sync::Arc;
use std::time::Duration;

use ledgerlink_common::auth::{
    CredentialStore, MemoryCredentialStore, TokenGuardian, TokenGuardianError,
};
use ledgerlink_common::RateGate;
use ledgerlink_core::{CrmGateway, DispatchPool, InvoicePipeline, InvoiceSource};
use ledgerlink_domain::constants::AUTHORIZATION_TIMEOUT_SECS;
use ledgerlink_domain::{AppConfig, LedgerLinkError, Result};
use ledgerlink_infra::auth::{
    authorize_interactively, CredentialFile, SourceApOAuth, TargetCrmOAuth,
};
use ledgerlink_infra::{HttpClient, InfraError, SourceApClient, TargetCrmClient};
use tracing::{info, warn};

/// Everything one batch run needs, built once from [`AppConfig`].
pub struct AppContext {
    pub config: AppConfig,
    pub source: Arc<dyn InvoiceSource>,
    pub crm: Arc<dyn CrmGateway>,
    pub dispatch: DispatchPool,

    source_oauth: SourceApOAuth,
    source_tokens: Arc<TokenGuardian>,
    crm_tokens: Arc<TokenGuardian>,
}

impl AppContext {
    /// Build clients, guardians and the dispatch pool.
    ///
    /// No network traffic happens here.
    pub fn new(config: AppConfig) -> Result<Self> {
        config.validate()?;

        let http = HttpClient::from_config(&config.http)?;
        let skew = config.http.refresh_skew_secs;

        let source_oauth = SourceApOAuth::new(http.clone(), &config.source_ap);
        let source_store: Arc<dyn CredentialStore> =
            Arc::new(CredentialFile::new(&config.source_ap.credential_path));
        let source_tokens = Arc::new(TokenGuardian::new(
            "source_ap",
            Arc::new(source_oauth.clone()),
            source_store,
            skew,
        ));

        // Client-credentials tokens are cheap to mint; nothing is persisted.
        let crm_tokens = Arc::new(TokenGuardian::new(
            "target_crm",
            Arc::new(TargetCrmOAuth::new(http.clone(), &config.target_crm)),
            Arc::new(MemoryCredentialStore::new()),
            skew,
        ));

        let source_gate = Arc::new(
            RateGate::per_period(
                config.source_ap.rate_limit,
                Duration::from_secs(config.source_ap.rate_limit_period_secs),
            )
            .named("source_ap"),
        );
        let crm_gate = Arc::new(
            RateGate::per_period(
                config.target_crm.rate_limit,
                Duration::from_secs(config.target_crm.rate_limit_period_secs),
            )
            .named("target_crm"),
        );

        let source: Arc<dyn InvoiceSource> = Arc::new(SourceApClient::new(
            &config.source_ap,
            config.filters.clone(),
            http.clone(),
            source_gate,
            source_tokens.clone(),
        ));
        let crm: Arc<dyn CrmGateway> = Arc::new(TargetCrmClient::new(
            &config.target_crm,
            http,
            crm_gate,
            crm_tokens.clone(),
        ));

        let pipeline = Arc::new(InvoicePipeline::new(
            source.clone(),
            crm.clone(),
            config.target_crm.distributor,
        ));
        let dispatch = DispatchPool::new(pipeline, config.dispatch.clone())?;

        Ok(Self { config, source, crm, dispatch, source_oauth, source_tokens, crm_tokens })
    }

    /// Make sure both APIs have a usable token before any invoice is touched.
    ///
    /// The Source AP credential is loaded from its file and refreshed if
    /// needed; when that is impossible the interactive authorization flow
    /// runs. The CRM token is fetched eagerly so bad client credentials fail
    /// the run up front.
    pub async fn prepare_credentials(&self) -> Result<()> {
        self.source_tokens.initialize().await.map_err(to_domain)?;

        if self.source_tokens.needs_authorization().await {
            info!(
                path = %self.config.source_ap.credential_path.display(),
                "No usable Source AP credential"
            );
            self.authorize_source().await?;
        } else if let Err(e) = self.source_tokens.ensure_valid().await {
            match e {
                TokenGuardianError::Rejected { .. }
                | TokenGuardianError::NoRefreshToken
                | TokenGuardianError::NotAuthenticated => {
                    warn!(error = %e, "Stored Source AP credential was rejected; re-authorizing");
                    self.authorize_source().await?;
                }
                other => return Err(to_domain(other)),
            }
        }

        self.crm_tokens.ensure_valid().await.map_err(to_domain)?;
        info!("API credentials ready");
        Ok(())
    }

    async fn authorize_source(&self) -> Result<()> {
        authorize_interactively(
            &self.source_oauth,
            &self.source_tokens,
            Duration::from_secs(AUTHORIZATION_TIMEOUT_SECS),
        )
        .await
    }
}

fn to_domain(err: TokenGuardianError) -> LedgerLinkError {
    InfraError::from(err).into()
}
