use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::credentials::CredentialCell;
use crate::error::ApiError;

/// The external identity provider. Opaque to this crate.
#[async_trait]
pub trait TokenIssuer: Send + Sync + 'static {
    /// A fresh token, or `Ok(None)` when the user is signed out.
    async fn issue(&self) -> Result<Option<String>, ApiError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    Updated,
    SignedOut,
    /// The issuer failed; the previous token was kept.
    Failed(ApiError),
}

/// Periodically re-validates the capability token and writes it into the
/// shared [`CredentialCell`].
pub struct TokenRefresher {
    issuer: Arc<dyn TokenIssuer>,
    cell: Arc<CredentialCell>,
    interval: Duration,
}

impl TokenRefresher {
    pub fn new(issuer: Arc<dyn TokenIssuer>, cell: Arc<CredentialCell>, interval: Duration) -> Self {
        Self {
            issuer,
            cell,
            interval,
        }
    }

    pub async fn refresh_once(&self) -> RefreshOutcome {
        match self.issuer.issue().await {
            Ok(Some(token)) => {
                self.cell.set(Some(token));
                debug!(target: "lumen_net", "credential refreshed");
                RefreshOutcome::Updated
            }
            Ok(None) => {
                self.cell.clear();
                debug!(target: "lumen_net", "signed out; credential cleared");
                RefreshOutcome::SignedOut
            }
            Err(e) => {
                warn!(target: "lumen_net", "token refresh failed, keeping previous token: {e}");
                RefreshOutcome::Failed(e)
            }
        }
    }

    /// Run on the current runtime: one refresh immediately, then one per
    /// interval until the returned handle is shut down or dropped.
    pub fn spawn(self) -> RefreshHandle {
        let cancel = CancellationToken::new();
        let stop = cancel.clone();
        let task = tokio::spawn(async move {
            info!(target: "lumen_net", "token refresher started (interval={:?})", self.interval);
            let mut ticker = tokio::time::interval(self.interval.max(Duration::from_millis(1)));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = stop.cancelled() => break,
                    _ = ticker.tick() => {
                        self.refresh_once().await;
                    }
                }
            }
            info!(target: "lumen_net", "token refresher stopped");
        });
        RefreshHandle {
            cancel,
            task: Some(task),
        }
    }
}

/// Owner of a running refresher. Dropping it cancels the task.
pub struct RefreshHandle {
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl RefreshHandle {
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Cancel and wait for the task to exit.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for RefreshHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
