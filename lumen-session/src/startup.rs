use std::sync::Arc;
use std::time::Duration;

use lumen_net::{
    ApiClient, ClientConfig, CredentialCell, CredentialProvider, MediaBackend, RefreshHandle,
    TokenIssuer, TokenRefresher,
};
use tracing::{info, warn};

use crate::error::SessionError;
use crate::location::LocationSink;
use crate::session::SearchSession;

/// A wired session plus the background work it owns.
pub struct SessionRuntime {
    pub config: ClientConfig,
    pub credentials: Arc<CredentialCell>,
    pub session: SearchSession,
    refresher: Option<RefreshHandle>,
}

impl SessionRuntime {
    /// Connect to the configured backend over HTTP.
    pub async fn start(
        config: ClientConfig,
        issuer: Arc<dyn TokenIssuer>,
        location: Arc<dyn LocationSink>,
    ) -> Result<Self, SessionError> {
        let credentials = Arc::new(CredentialCell::new());
        let provider: Arc<dyn CredentialProvider> = credentials.clone();
        let client = ApiClient::new(&config, provider)?;
        info!(target: "lumen_session", "api client ready ({})", client.base_url());
        Self::start_with_backend(config, issuer, credentials, Arc::new(client), location).await
    }

    /// Wire a session around any backend. The credential cell must be the one
    /// the backend reads its token from.
    ///
    /// Obtains the first token before returning, starts the periodic
    /// refresher when an interval is configured, and loads bookmarks when
    /// signed in. A failed bookmark load is logged, not returned.
    pub async fn start_with_backend(
        config: ClientConfig,
        issuer: Arc<dyn TokenIssuer>,
        credentials: Arc<CredentialCell>,
        backend: Arc<dyn MediaBackend>,
        location: Arc<dyn LocationSink>,
    ) -> Result<Self, SessionError> {
        let interval = config.token_refresh_interval();
        let refresher = TokenRefresher::new(
            issuer,
            Arc::clone(&credentials),
            interval.unwrap_or(Duration::ZERO),
        );
        refresher.refresh_once().await;
        let refresher = interval.map(|_| refresher.spawn());

        let provider: Arc<dyn CredentialProvider> = credentials.clone();
        let session = SearchSession::new(backend, provider, location, &config);

        if credentials.current().is_some() {
            match session.refresh_bookmarks().await {
                Ok(set) => info!(target: "lumen_session", "signed in; {} bookmarks", set.len()),
                Err(e) => warn!(target: "lumen_session", "initial bookmark load failed: {e}"),
            }
        } else {
            info!(target: "lumen_session", "no credential; starting anonymous");
        }

        Ok(Self {
            config,
            credentials,
            session,
            refresher,
        })
    }

    pub fn refresher_running(&self) -> bool {
        self.refresher.as_ref().is_some_and(RefreshHandle::is_running)
    }

    /// Stop background work. The session itself stays usable.
    pub async fn shutdown(mut self) {
        if let Some(handle) = self.refresher.take() {
            handle.shutdown().await;
        }
        info!(target: "lumen_session", "session runtime stopped");
    }
}
