use serde::{Deserialize, Serialize};

/// A tag as sent by the backend: either a bare name or an object carrying
/// the name and an optional machine-generated accuracy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Tag {
    Name(String),
    Detailed {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        accuracy: Option<f64>,
    },
}

impl Tag {
    pub fn name(&self) -> &str {
        match self {
            Tag::Name(n) => n,
            Tag::Detailed { name, .. } => name,
        }
    }
}

/// One search or popular-feed result. Never mutated after decoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaItem {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub creator: Option<String>,
    #[serde(default)]
    pub creator_url: Option<String>,
    #[serde(default)]
    pub license: Option<String>,
    #[serde(default)]
    pub license_version: Option<String>,
    #[serde(default)]
    pub license_url: Option<String>,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub foreign_landing_url: Option<String>,
    #[serde(default)]
    pub tags: Vec<Tag>,
    /// Audio only, milliseconds.
    #[serde(default)]
    pub duration: Option<u64>,
    /// Audio only.
    #[serde(default)]
    pub waveform: Option<String>,
    #[serde(default)]
    pub filesize: Option<u64>,
    #[serde(default)]
    pub filetype: Option<String>,
}

impl MediaItem {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: None,
            creator: None,
            creator_url: None,
            license: None,
            license_version: None,
            license_url: None,
            provider: None,
            source: None,
            url: None,
            thumbnail: None,
            foreign_landing_url: None,
            tags: Vec::new(),
            duration: None,
            waveform: None,
            filesize: None,
            filetype: None,
        }
    }

    pub fn title_or_empty(&self) -> &str {
        self.title.as_deref().unwrap_or("")
    }

    pub fn creator_or_empty(&self) -> &str {
        self.creator.as_deref().unwrap_or("")
    }

    /// The URL used when bookmarking: the media file, else its thumbnail,
    /// else the landing page.
    pub fn primary_url(&self) -> Option<&str> {
        [&self.url, &self.thumbnail, &self.foreign_landing_url]
            .into_iter()
            .filter_map(|u| u.as_deref())
            .find(|u| !u.is_empty())
    }

    pub fn tag_names(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(Tag::name)
    }
}
