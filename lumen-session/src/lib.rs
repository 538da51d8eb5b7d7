pub mod auth;
pub mod bookmarks;
pub mod cache;
pub mod error;
pub mod history;
pub mod location;
pub mod page;
pub mod session;
pub mod startup;

pub use auth::{AuthGate, Identity};
pub use bookmarks::{BookmarkIndex, BookmarkSet};
pub use cache::{CacheStatus, FetchFuture, Lookup, ResultCache};
pub use error::SessionError;
pub use history::HistoryLog;
pub use location::{LocationSink, MemoryLocation, NullLocation};
pub use page::{PopularFeed, SearchResultPage};
pub use session::{DisplayItem, SearchSession, SearchViewState, SessionMode, SortOrder};
pub use startup::SessionRuntime;
