use std::sync::Arc;

use async_trait::async_trait;
use lumen_api::limits::enforce_max_response_size;
use lumen_api::status::StatusClass;
use lumen_api::{
    BookmarkRecord, DataEnvelope, Endpoint, HistoryEntry, MediaItem, Method, NewBookmark,
    PopularResponse, SearchResponse,
};
use lumen_query::{backend_pairs, MediaType, SearchParams};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::backend::MediaBackend;
use crate::config::ClientConfig;
use crate::credentials::CredentialProvider;
use crate::error::ApiError;

/// HTTP implementation of [`MediaBackend`].
///
/// Every request carries `Authorization: Bearer <token>` when the credential
/// provider has one. Requests are never retried here; retry happens when the
/// cache is asked again.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    credentials: Arc<dyn CredentialProvider>,
    max_response_bytes: usize,
}

impl ApiClient {
    pub fn new(config: &ClientConfig, credentials: Arc<dyn CredentialProvider>) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self {
            http,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            credentials,
            max_response_bytes: config.max_response_bytes,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: &Endpoint) -> String {
        format!("{}{}", self.base_url, endpoint.path())
    }

    async fn send(
        &self,
        endpoint: Endpoint,
        query: &[(&str, String)],
        body: Option<&NewBookmark>,
    ) -> Result<Vec<u8>, ApiError> {
        let method = match endpoint.method() {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Delete => reqwest::Method::DELETE,
        };
        let mut req = self.http.request(method, self.url(&endpoint));
        if !query.is_empty() {
            req = req.query(query);
        }
        if let Some(body) = body {
            req = req.json(body);
        }
        if let Some(token) = self.credentials.token().await? {
            req = req.bearer_auth(token);
        }

        debug!(target: "lumen_net", "{} {}", endpoint.method(), endpoint.path());
        let resp = req.send().await?;
        let status = resp.status().as_u16();
        if let Some(len) = resp.content_length() {
            enforce_max_response_size(len as usize, self.max_response_bytes)?;
        }
        let bytes = resp.bytes().await?;
        enforce_max_response_size(bytes.len(), self.max_response_bytes)?;

        match StatusClass::of(status) {
            StatusClass::Success => Ok(bytes.to_vec()),
            StatusClass::Unauthenticated => {
                debug!(target: "lumen_net", "{} {} rejected as unauthenticated ({status})", endpoint.method(), endpoint.path());
                Err(ApiError::Unauthenticated)
            }
            _ => {
                let message = error_detail(&bytes);
                warn!(target: "lumen_net", "{} {} failed: HTTP {status} {message}", endpoint.method(), endpoint.path());
                Err(ApiError::Server { status, message })
            }
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let bytes = self.send(endpoint, query, None).await?;
        decode(&bytes)
    }
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(bytes).map_err(|e| ApiError::Decode(format!("response body: {e}")))
}

/// The `detail` field of a JSON error body, else the body text (truncated).
fn error_detail(bytes: &[u8]) -> String {
    if let Ok(v) = serde_json::from_slice::<serde_json::Value>(bytes) {
        if let Some(d) = v.get("detail").and_then(|d| d.as_str()) {
            return d.to_string();
        }
    }
    String::from_utf8_lossy(bytes).chars().take(200).collect()
}

#[async_trait]
impl MediaBackend for ApiClient {
    async fn search(&self, params: &SearchParams) -> Result<SearchResponse, ApiError> {
        self.get_json(Endpoint::Search, &backend_pairs(params)).await
    }

    async fn popular(&self, media_type: MediaType, limit: u32) -> Result<Vec<MediaItem>, ApiError> {
        let resp: PopularResponse = self
            .get_json(Endpoint::Popular(media_type), &[("limit", limit.to_string())])
            .await?;
        Ok(resp.results)
    }

    async fn list_bookmarks(&self) -> Result<Vec<BookmarkRecord>, ApiError> {
        let env: DataEnvelope<Vec<BookmarkRecord>> =
            self.get_json(Endpoint::ListBookmarks, &[]).await?;
        Ok(env.data)
    }

    async fn create_bookmark(&self, bookmark: &NewBookmark) -> Result<(), ApiError> {
        self.send(Endpoint::CreateBookmark, &[], Some(bookmark)).await?;
        Ok(())
    }

    async fn delete_bookmark(&self, media_id: &str) -> Result<(), ApiError> {
        self.send(Endpoint::DeleteBookmark(media_id.to_string()), &[], None)
            .await?;
        Ok(())
    }

    async fn history(&self, limit: u32) -> Result<Vec<HistoryEntry>, ApiError> {
        let env: DataEnvelope<Option<Vec<HistoryEntry>>> = self
            .get_json(Endpoint::ListHistory, &[("limit", limit.to_string())])
            .await?;
        Ok(env.data.unwrap_or_default())
    }

    async fn delete_history(&self, id: &str) -> Result<(), ApiError> {
        self.send(Endpoint::DeleteHistoryEntry(id.to_string()), &[], None)
            .await?;
        Ok(())
    }

    async fn clear_history(&self) -> Result<(), ApiError> {
        self.send(Endpoint::ClearHistory, &[], None).await?;
        Ok(())
    }
}
