use std::sync::RwLock;

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, TimeZone, Utc};
use tracing::debug;

use crate::error::ApiError;

/// Pluggable bearer-token source, consulted before every request.
///
/// Returns `Ok(None)` when there is no signed-in user; the request then goes
/// out without an Authorization header.
#[async_trait]
pub trait CredentialProvider: Send + Sync + 'static {
    async fn token(&self) -> Result<Option<String>, ApiError>;
}

/// Anonymous requests only.
pub struct NoCredentials;

#[async_trait]
impl CredentialProvider for NoCredentials {
    async fn token(&self) -> Result<Option<String>, ApiError> {
        Ok(None)
    }
}

/// A token obtained elsewhere that never changes.
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

#[async_trait]
impl CredentialProvider for StaticToken {
    async fn token(&self) -> Result<Option<String>, ApiError> {
        Ok(Some(self.0.clone()))
    }
}

/// Shared credential cell written by the refresher and read by every request.
///
/// A JWT whose `exp` claim has passed is treated as absent, so requests go
/// out anonymous instead of being rejected.
#[derive(Default)]
pub struct CredentialCell {
    token: RwLock<Option<String>>,
}

impl CredentialCell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(Some(token.into())),
        }
    }

    pub fn set(&self, token: Option<String>) {
        let mut guard = self.token.write().unwrap_or_else(|e| e.into_inner());
        *guard = token.filter(|t| !t.is_empty());
    }

    pub fn clear(&self) {
        self.set(None);
    }

    /// The stored token, expired or not.
    pub fn current(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// The stored token if it is present and not known to be expired.
    pub fn usable(&self, now: DateTime<Utc>) -> Option<String> {
        let token = self.current()?;
        match expires_at(&token) {
            Some(exp) if exp <= now => {
                debug!(target: "lumen_net", "credential expired at {exp}; sending anonymous");
                None
            }
            _ => Some(token),
        }
    }
}

#[async_trait]
impl CredentialProvider for CredentialCell {
    async fn token(&self) -> Result<Option<String>, ApiError> {
        Ok(self.usable(Utc::now()))
    }
}

/// Decode the payload segment of a JWT without verifying it.
pub fn token_claims(token: &str) -> Option<serde_json::Value> {
    let payload = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    serde_json::from_slice(&bytes).ok()
}

/// The `exp` claim of a JWT, if it has one.
pub fn expires_at(token: &str) -> Option<DateTime<Utc>> {
    let exp = token_claims(token)?.get("exp")?.as_i64()?;
    Utc.timestamp_opt(exp, 0).single()
}
