use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

mod codec;

pub use codec::{backend_pairs, decode, decode_onto, encode};

pub const DEFAULT_PAGE_SIZE: u32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    #[default]
    Images,
    Audio,
}

impl MediaType {
    pub fn as_str(self) -> &'static str {
        match self {
            MediaType::Images => "images",
            MediaType::Audio => "audio",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownMediaType(pub String);

impl fmt::Display for UnknownMediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown media type: {}", self.0)
    }
}

impl std::error::Error for UnknownMediaType {}

impl FromStr for MediaType {
    type Err = UnknownMediaType;

    /// Case-insensitive; the singular `image` is accepted as an alias.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "images" | "image" => Ok(MediaType::Images),
            "audio" => Ok(MediaType::Audio),
            other => Err(UnknownMediaType(other.to_string())),
        }
    }
}

/// The full set of inputs that determine a results page.
///
/// Optional filters use the empty string for "unset". Structural equality and
/// hashing make the value usable directly as a cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SearchParams {
    pub query: String,
    pub media_type: MediaType,
    pub page: u32,
    pub page_size: u32,
    pub license_type: String,
    pub creator: String,
    /// Comma-joined tag set.
    pub tags: String,
    pub source: String,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            query: String::new(),
            media_type: MediaType::Images,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            license_type: String::new(),
            creator: String::new(),
            tags: String::new(),
            source: String::new(),
        }
    }
}

impl SearchParams {
    pub fn new(query: impl Into<String>, media_type: MediaType) -> Self {
        Self {
            query: query.into(),
            media_type,
            ..Self::default()
        }
    }

    /// True when the query has at least one non-whitespace character.
    pub fn has_query(&self) -> bool {
        !self.query.trim().is_empty()
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = page.max(1);
        self
    }

    /// Split the comma-joined tag set into trimmed, non-empty tags.
    pub fn tag_list(&self) -> Vec<&str> {
        self.tags
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect()
    }

    /// Number of pages needed to show `total` results at this page size.
    pub fn total_pages(&self, total: u64) -> u32 {
        let size = u64::from(self.page_size.max(1));
        total.div_ceil(size).min(u64::from(u32::MAX)) as u32
    }
}

/// A partial update to [`SearchParams`]. `None` leaves a field untouched;
/// `Some(String::new())` clears an optional filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamsPatch {
    pub query: Option<String>,
    pub media_type: Option<MediaType>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub license_type: Option<String>,
    pub creator: Option<String>,
    pub tags: Option<String>,
    pub source: Option<String>,
}

impl ParamsPatch {
    pub fn query(query: impl Into<String>) -> Self {
        Self {
            query: Some(query.into()),
            ..Self::default()
        }
    }

    pub fn media_type(mut self, media_type: MediaType) -> Self {
        self.media_type = Some(media_type);
        self
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    pub fn license_type(mut self, license: impl Into<String>) -> Self {
        self.license_type = Some(license.into());
        self
    }

    pub fn creator(mut self, creator: impl Into<String>) -> Self {
        self.creator = Some(creator.into());
        self
    }

    pub fn tags(mut self, tags: impl Into<String>) -> Self {
        self.tags = Some(tags.into());
        self
    }

    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Produce a new value with this patch merged over `base`. The page is
    /// copied as given (clamped to 1); callers decide whether to reset it.
    pub fn apply(&self, base: &SearchParams) -> SearchParams {
        let mut next = base.clone();
        if let Some(q) = &self.query {
            next.query = q.clone();
        }
        if let Some(t) = self.media_type {
            next.media_type = t;
        }
        if let Some(p) = self.page {
            next.page = p.max(1);
        }
        if let Some(s) = self.page_size {
            if s > 0 {
                next.page_size = s;
            }
        }
        if let Some(v) = &self.license_type {
            next.license_type = v.clone();
        }
        if let Some(v) = &self.creator {
            next.creator = v.clone();
        }
        if let Some(v) = &self.tags {
            next.tags = v.clone();
        }
        if let Some(v) = &self.source {
            next.source = v.clone();
        }
        next
    }
}
