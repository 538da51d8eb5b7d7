use std::sync::Arc;

use lumen_api::HistoryEntry;
use lumen_net::MediaBackend;
use tracing::debug;

use crate::error::SessionError;

/// The signed-in user's server-side search history.
#[derive(Clone)]
pub struct HistoryLog {
    backend: Arc<dyn MediaBackend>,
    limit: u32,
}

impl HistoryLog {
    pub fn new(backend: Arc<dyn MediaBackend>, limit: u32) -> Self {
        Self {
            backend,
            limit: limit.max(1),
        }
    }

    /// Most recent entries first, as the server orders them.
    pub async fn list(&self) -> Result<Vec<HistoryEntry>, SessionError> {
        let entries = self.backend.history(self.limit).await?;
        debug!(target: "lumen_session", "history listed ({} entries)", entries.len());
        Ok(entries)
    }

    pub async fn delete(&self, id: &str) -> Result<(), SessionError> {
        if id.trim().is_empty() {
            return Err(SessionError::Validation("history id must not be empty".to_string()));
        }
        self.backend.delete_history(id).await?;
        Ok(())
    }

    pub async fn clear(&self) -> Result<(), SessionError> {
        self.backend.clear_history().await?;
        debug!(target: "lumen_session", "history cleared");
        Ok(())
    }
}
