use async_trait::async_trait;
use lumen_api::{BookmarkRecord, HistoryEntry, MediaItem, NewBookmark, SearchResponse};
use lumen_query::{MediaType, SearchParams};

use crate::error::ApiError;

/// The backend REST surface the session core consumes.
#[async_trait]
pub trait MediaBackend: Send + Sync + 'static {
    /// `GET /search`.
    async fn search(&self, params: &SearchParams) -> Result<SearchResponse, ApiError>;

    /// `GET /popular/{media_type}?limit`.
    async fn popular(&self, media_type: MediaType, limit: u32) -> Result<Vec<MediaItem>, ApiError>;

    /// `GET /users/bookmarks`.
    async fn list_bookmarks(&self) -> Result<Vec<BookmarkRecord>, ApiError>;

    /// `POST /users/bookmarks`.
    async fn create_bookmark(&self, bookmark: &NewBookmark) -> Result<(), ApiError>;

    /// `DELETE /users/bookmarks/{media_id}`.
    async fn delete_bookmark(&self, media_id: &str) -> Result<(), ApiError>;

    /// `GET /history?limit`.
    async fn history(&self, limit: u32) -> Result<Vec<HistoryEntry>, ApiError>;

    /// `DELETE /history/{id}`.
    async fn delete_history(&self, id: &str) -> Result<(), ApiError>;

    /// `DELETE /history`.
    async fn clear_history(&self) -> Result<(), ApiError>;
}
