use lumen_net::ApiError;

/// Errors surfaced by the session core.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// Transport failure, 5xx, oversized or undecodable response.
    #[error("network failure: {0}")]
    Network(String),

    /// No signed-in identity, or the server rejected the credential.
    #[error("sign in required")]
    Unauthenticated,

    /// Rejected locally before any request was made.
    #[error("invalid request: {0}")]
    Validation(String),

    /// Another toggle of the same media item has not finished yet.
    #[error("bookmark change already in progress for {0}")]
    BookmarkPending(String),
}

impl SessionError {
    pub fn is_unauthenticated(&self) -> bool {
        matches!(self, SessionError::Unauthenticated)
    }
}

impl From<ApiError> for SessionError {
    fn from(e: ApiError) -> Self {
        match e {
            ApiError::Unauthenticated => SessionError::Unauthenticated,
            other => SessionError::Network(other.to_string()),
        }
    }
}
