use lumen_api::MediaItem;
use lumen_query::SearchParams;
use serde::Serialize;

use super::sort::SortOrder;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionMode {
    /// No search performed; the popular feed is shown.
    #[default]
    Idle,
    Searching,
}

/// A media item as displayed, with its bookmark membership.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayItem {
    #[serde(flatten)]
    pub item: MediaItem,
    pub bookmarked: bool,
}

/// Snapshot of everything the UI needs to render the session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchViewState {
    pub mode: SessionMode,
    pub params: SearchParams,
    pub items: Vec<DisplayItem>,
    pub total_count: u64,
    pub total_pages: u32,
    pub current_page: u32,
    pub loading: bool,
    /// The items come from an entry past its TTL that is being revalidated.
    pub stale: bool,
    pub auth_error: bool,
    pub error: Option<String>,
    pub sort: SortOrder,
}

impl SearchViewState {
    pub fn item_ids(&self) -> Vec<&str> {
        self.items.iter().map(|d| d.item.id.as_str()).collect()
    }
}
