use std::fmt;

use lumen_query::MediaType;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

/// Characters escaped inside a single path segment.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Delete,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every backend call the client makes. Paths are relative to the API base.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    Search,
    Popular(MediaType),
    ListHistory,
    DeleteHistoryEntry(String),
    ClearHistory,
    ListBookmarks,
    CreateBookmark,
    DeleteBookmark(String),
}

impl Endpoint {
    pub fn method(&self) -> Method {
        match self {
            Endpoint::Search
            | Endpoint::Popular(_)
            | Endpoint::ListHistory
            | Endpoint::ListBookmarks => Method::Get,
            Endpoint::CreateBookmark => Method::Post,
            Endpoint::DeleteHistoryEntry(_)
            | Endpoint::ClearHistory
            | Endpoint::DeleteBookmark(_) => Method::Delete,
        }
    }

    pub fn path(&self) -> String {
        match self {
            Endpoint::Search => "/search".to_string(),
            Endpoint::Popular(t) => format!("/popular/{}", t.as_str()),
            Endpoint::ListHistory | Endpoint::ClearHistory => "/history".to_string(),
            Endpoint::DeleteHistoryEntry(id) => format!("/history/{}", segment(id)),
            Endpoint::ListBookmarks | Endpoint::CreateBookmark => "/users/bookmarks".to_string(),
            Endpoint::DeleteBookmark(id) => format!("/users/bookmarks/{}", segment(id)),
        }
    }

    /// Whether the call changes server state and therefore needs a signed-in user.
    pub fn is_mutation(&self) -> bool {
        self.method() != Method::Get
    }
}

fn segment(s: &str) -> String {
    utf8_percent_encode(s, SEGMENT).to_string()
}
