use chrono::{DateTime, Utc};
use lumen_api::{MediaItem, SearchResponse};
use lumen_query::{MediaType, SearchParams};
use serde::Serialize;

/// One fetched page of search results, owned by the result cache.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResultPage {
    pub params: SearchParams,
    pub items: Vec<MediaItem>,
    pub total_count: u64,
    pub fetched_at: DateTime<Utc>,
    pub authenticated: bool,
}

impl SearchResultPage {
    pub fn from_response(params: SearchParams, resp: SearchResponse) -> Self {
        Self {
            params,
            items: resp.results,
            total_count: resp.count,
            fetched_at: Utc::now(),
            authenticated: resp.auth_status.is_authenticated(),
        }
    }

    pub fn total_pages(&self) -> u32 {
        self.params.total_pages(self.total_count)
    }
}

/// The feed shown while no search has been performed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PopularFeed {
    pub media_type: MediaType,
    pub items: Vec<MediaItem>,
    pub fetched_at: DateTime<Utc>,
}

impl PopularFeed {
    pub fn new(media_type: MediaType, items: Vec<MediaItem>) -> Self {
        Self {
            media_type,
            items,
            fetched_at: Utc::now(),
        }
    }
}
