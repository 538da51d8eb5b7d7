use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use lumen_api::MediaItem;
use serde::{Deserialize, Serialize};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Client-side ordering of the currently displayed page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    /// Server order.
    #[default]
    Relevance,
    TitleAsc,
    TitleDesc,
    CreatorAsc,
    CreatorDesc,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Relevance => "relevance",
            SortOrder::TitleAsc => "title_asc",
            SortOrder::TitleDesc => "title_desc",
            SortOrder::CreatorAsc => "creator_asc",
            SortOrder::CreatorDesc => "creator_desc",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "relevance" | "" => Ok(SortOrder::Relevance),
            "title_asc" => Ok(SortOrder::TitleAsc),
            "title_desc" => Ok(SortOrder::TitleDesc),
            "creator_asc" => Ok(SortOrder::CreatorAsc),
            "creator_desc" => Ok(SortOrder::CreatorDesc),
            other => Err(format!("unknown sort order: {other}")),
        }
    }
}

/// Stable sort of `items` in place. Ties keep server order.
pub fn sort_items(items: &mut [MediaItem], order: SortOrder) {
    match order {
        SortOrder::Relevance => {}
        SortOrder::TitleAsc => items.sort_by(|a, b| locale_cmp(a.title_or_empty(), b.title_or_empty())),
        SortOrder::TitleDesc => items.sort_by(|a, b| locale_cmp(b.title_or_empty(), a.title_or_empty())),
        SortOrder::CreatorAsc => {
            items.sort_by(|a, b| locale_cmp(a.creator_or_empty(), b.creator_or_empty()))
        }
        SortOrder::CreatorDesc => {
            items.sort_by(|a, b| locale_cmp(b.creator_or_empty(), a.creator_or_empty()))
        }
    }
}

/// Collation close to a browser's default locale compare: letters first by
/// base character (accents and case ignored), then accents, then case with
/// lowercase before uppercase.
pub fn locale_cmp(a: &str, b: &str) -> Ordering {
    let (ka, kb) = (base_key(a), base_key(b));
    ka.cmp(&kb)
        .then_with(|| accent_key(a).cmp(&accent_key(b)))
        .then_with(|| case_key(a).cmp(&case_key(b)))
}

fn base_key(s: &str) -> String {
    s.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

fn accent_key(s: &str) -> String {
    s.nfd().flat_map(char::to_lowercase).collect()
}

fn case_key(s: &str) -> Vec<bool> {
    s.chars().map(char::is_uppercase).collect()
}
