use chrono::{DateTime, Utc};
use lumen_query::{MediaType, ParamsPatch};
use serde::{Deserialize, Deserializer, Serialize};

/// One entry of `GET /history`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(deserialize_with = "id_as_string")]
    pub id: String,
    pub search_query: String,
    #[serde(default)]
    pub search_params: Option<HistoryParams>,
    #[serde(default)]
    pub result_count: Option<u64>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Parameters stored alongside a history entry, in backend naming.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryParams {
    #[serde(default)]
    pub media_type: Option<String>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub page_size: Option<u32>,
    #[serde(default)]
    pub license_type: Option<String>,
    #[serde(default)]
    pub creator: Option<String>,
    #[serde(default)]
    pub tags: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
}

impl HistoryEntry {
    /// The patch that replays this entry as a fresh search. Filters the entry
    /// did not record are cleared rather than inherited; the page is left for
    /// the caller to reset.
    pub fn replay_patch(&self) -> ParamsPatch {
        let p = self.search_params.clone().unwrap_or_default();
        ParamsPatch {
            query: Some(self.search_query.clone()),
            media_type: Some(
                p.media_type
                    .as_deref()
                    .and_then(|t| t.parse::<MediaType>().ok())
                    .unwrap_or_default(),
            ),
            page: None,
            page_size: None,
            license_type: Some(p.license_type.unwrap_or_default()),
            creator: Some(p.creator.unwrap_or_default()),
            tags: Some(p.tags.unwrap_or_default()),
            source: Some(p.source.unwrap_or_default()),
        }
    }
}

fn id_as_string<'de, D>(de: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Int(i64),
        Text(String),
    }
    Ok(match RawId::deserialize(de)? {
        RawId::Int(n) => n.to_string(),
        RawId::Text(s) => s,
    })
}
