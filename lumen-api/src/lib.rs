pub mod bookmark;
pub mod endpoint;
pub mod history;
pub mod limits;
pub mod media;
pub mod response;
pub mod status;

pub use bookmark::{BookmarkRecord, NewBookmark};
pub use endpoint::{Endpoint, Method};
pub use history::{HistoryEntry, HistoryParams};
pub use media::{MediaItem, Tag};
pub use response::{AuthStatus, DataEnvelope, PopularResponse, SearchResponse};
