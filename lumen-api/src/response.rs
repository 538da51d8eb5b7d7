use serde::{Deserialize, Serialize};

use crate::media::MediaItem;

/// `auth_status` of a search response. Anything other than `authenticated`
/// (the backend sends `anonymous` or `unauthenticated`) counts as anonymous.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AuthStatus {
    Authenticated,
    #[default]
    Anonymous,
}

impl AuthStatus {
    pub fn is_authenticated(self) -> bool {
        self == AuthStatus::Authenticated
    }
}

impl From<String> for AuthStatus {
    fn from(s: String) -> Self {
        if s.trim().eq_ignore_ascii_case("authenticated") {
            AuthStatus::Authenticated
        } else {
            AuthStatus::Anonymous
        }
    }
}

impl From<AuthStatus> for String {
    fn from(s: AuthStatus) -> Self {
        match s {
            AuthStatus::Authenticated => "authenticated".to_string(),
            AuthStatus::Anonymous => "anonymous".to_string(),
        }
    }
}

/// `GET /search` body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub results: Vec<MediaItem>,
    #[serde(default, alias = "result_count")]
    pub count: u64,
    #[serde(default)]
    pub auth_status: AuthStatus,
}

/// `GET /popular/{media_type}` body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopularResponse {
    #[serde(default)]
    pub results: Vec<MediaItem>,
}

/// Standard `{success, message, data}` wrapper used by the user endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataEnvelope<T> {
    #[serde(default = "default_success")]
    pub success: bool,
    #[serde(default)]
    pub message: String,
    pub data: T,
}

fn default_success() -> bool {
    true
}
