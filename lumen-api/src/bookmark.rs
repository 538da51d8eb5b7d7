use chrono::{DateTime, Utc};
use lumen_query::MediaType;
use serde::{Deserialize, Serialize};

use crate::media::MediaItem;

/// A bookmark as listed by `GET /users/bookmarks`. The server owns these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookmarkRecord {
    pub media_id: String,
    #[serde(default)]
    pub media_url: String,
    #[serde(default)]
    pub media_type: String,
    #[serde(default)]
    pub media_title: Option<String>,
    #[serde(default)]
    pub media_creator: Option<String>,
    #[serde(default)]
    pub media_license: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Body of `POST /users/bookmarks`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBookmark {
    pub media_id: String,
    pub media_url: String,
    pub media_type: String,
    pub media_title: Option<String>,
    pub media_creator: Option<String>,
    pub media_license: Option<String>,
}

impl NewBookmark {
    pub fn from_item(item: &MediaItem, media_type: MediaType) -> Self {
        Self {
            media_id: item.id.clone(),
            media_url: item.primary_url().unwrap_or_default().to_string(),
            media_type: media_type.as_str().to_string(),
            media_title: item.title.clone(),
            media_creator: item.creator.clone(),
            media_license: item.license.clone(),
        }
    }
}

impl From<&NewBookmark> for BookmarkRecord {
    fn from(b: &NewBookmark) -> Self {
        Self {
            media_id: b.media_id.clone(),
            media_url: b.media_url.clone(),
            media_type: b.media_type.clone(),
            media_title: b.media_title.clone(),
            media_creator: b.media_creator.clone(),
            media_license: b.media_license.clone(),
            created_at: None,
        }
    }
}
