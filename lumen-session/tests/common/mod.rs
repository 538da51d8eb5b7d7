#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use lumen_api::{AuthStatus, BookmarkRecord, HistoryEntry, MediaItem, NewBookmark, SearchResponse};
use lumen_net::{ApiError, ClientConfig, MediaBackend};
use lumen_query::{MediaType, SearchParams};

#[derive(Default)]
struct Script {
    authenticated: bool,
    counts: HashMap<String, u64>,
    items: HashMap<String, Vec<MediaItem>>,
    delays: HashMap<String, Duration>,
    failures: HashMap<String, ApiError>,
    popular: HashMap<MediaType, Vec<MediaItem>>,
    bookmarks: Vec<BookmarkRecord>,
    next_create_error: Option<ApiError>,
    next_delete_error: Option<ApiError>,
    mutation_delay: Duration,
    list_delay: Duration,
    history: Vec<HistoryEntry>,
    search_log: Vec<SearchParams>,
}

/// Scripted in-memory backend. Search results are generated from the query
/// and page unless items were set for the query explicitly.
pub struct FakeBackend {
    script: Mutex<Script>,
    pub search_calls: AtomicUsize,
    pub popular_calls: AtomicUsize,
    pub list_calls: AtomicUsize,
    pub create_calls: AtomicUsize,
    pub delete_calls: AtomicUsize,
    pub history_calls: AtomicUsize,
}

impl FakeBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(Script {
                authenticated: true,
                ..Script::default()
            }),
            search_calls: AtomicUsize::new(0),
            popular_calls: AtomicUsize::new(0),
            list_calls: AtomicUsize::new(0),
            create_calls: AtomicUsize::new(0),
            delete_calls: AtomicUsize::new(0),
            history_calls: AtomicUsize::new(0),
        })
    }

    fn script(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap()
    }

    pub fn set_authenticated(&self, yes: bool) {
        self.script().authenticated = yes;
    }

    pub fn set_count(&self, query: &str, count: u64) {
        self.script().counts.insert(query.to_string(), count);
    }

    pub fn set_items(&self, query: &str, items: Vec<MediaItem>) {
        self.script().items.insert(query.to_string(), items);
    }

    pub fn delay(&self, query: &str, delay: Duration) {
        self.script().delays.insert(query.to_string(), delay);
    }

    pub fn fail(&self, query: &str, error: ApiError) {
        self.script().failures.insert(query.to_string(), error);
    }

    pub fn recover(&self, query: &str) {
        self.script().failures.remove(query);
    }

    pub fn set_popular(&self, media_type: MediaType, items: Vec<MediaItem>) {
        self.script().popular.insert(media_type, items);
    }

    pub fn set_bookmarks(&self, records: Vec<BookmarkRecord>) {
        self.script().bookmarks = records;
    }

    pub fn server_bookmarks(&self) -> Vec<String> {
        self.script()
            .bookmarks
            .iter()
            .map(|r| r.media_id.clone())
            .collect()
    }

    pub fn fail_next_create(&self, error: ApiError) {
        self.script().next_create_error = Some(error);
    }

    pub fn fail_next_delete(&self, error: ApiError) {
        self.script().next_delete_error = Some(error);
    }

    pub fn set_mutation_delay(&self, delay: Duration) {
        self.script().mutation_delay = delay;
    }

    /// Delay `list_bookmarks` after it has taken its snapshot, so the listing
    /// it returns can predate later mutations.
    pub fn set_list_delay(&self, delay: Duration) {
        self.script().list_delay = delay;
    }

    pub fn set_history(&self, entries: Vec<HistoryEntry>) {
        self.script().history = entries;
    }

    pub fn search_log(&self) -> Vec<SearchParams> {
        self.script().search_log.clone()
    }

    pub fn searches(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MediaBackend for FakeBackend {
    async fn search(&self, params: &SearchParams) -> Result<SearchResponse, ApiError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        let delay = {
            let mut s = self.script();
            s.search_log.push(params.clone());
            s.delays.get(&params.query).copied()
        };
        if let Some(d) = delay {
            tokio::time::sleep(d).await;
        }

        let s = self.script();
        if let Some(e) = s.failures.get(&params.query) {
            return Err(e.clone());
        }
        let results = s.items.get(&params.query).cloned().unwrap_or_else(|| {
            (0..3)
                .map(|i| item(&format!("{}-{}-{}", params.query, params.page, i), "t", "c"))
                .collect()
        });
        Ok(SearchResponse {
            results,
            count: s.counts.get(&params.query).copied().unwrap_or(45),
            auth_status: if s.authenticated {
                AuthStatus::Authenticated
            } else {
                AuthStatus::Anonymous
            },
        })
    }

    async fn popular(&self, media_type: MediaType, limit: u32) -> Result<Vec<MediaItem>, ApiError> {
        self.popular_calls.fetch_add(1, Ordering::SeqCst);
        let s = self.script();
        let items = s.popular.get(&media_type).cloned().unwrap_or_else(|| {
            vec![item(&format!("popular-{media_type}"), "Popular", "someone")]
        });
        Ok(items.into_iter().take(limit as usize).collect())
    }

    async fn list_bookmarks(&self) -> Result<Vec<BookmarkRecord>, ApiError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let (listing, delay) = {
            let s = self.script();
            (s.bookmarks.clone(), s.list_delay)
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        Ok(listing)
    }

    async fn create_bookmark(&self, bookmark: &NewBookmark) -> Result<(), ApiError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        let delay = self.script().mutation_delay;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let mut s = self.script();
        if let Some(e) = s.next_create_error.take() {
            return Err(e);
        }
        s.bookmarks.push(BookmarkRecord::from(bookmark));
        Ok(())
    }

    async fn delete_bookmark(&self, media_id: &str) -> Result<(), ApiError> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        let delay = self.script().mutation_delay;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let mut s = self.script();
        if let Some(e) = s.next_delete_error.take() {
            return Err(e);
        }
        s.bookmarks.retain(|r| r.media_id != media_id);
        Ok(())
    }

    async fn history(&self, limit: u32) -> Result<Vec<HistoryEntry>, ApiError> {
        self.history_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .script()
            .history
            .iter()
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn delete_history(&self, id: &str) -> Result<(), ApiError> {
        let mut s = self.script();
        let before = s.history.len();
        s.history.retain(|e| e.id != id);
        if s.history.len() == before {
            return Err(ApiError::Server {
                status: 404,
                message: "history entry not found".to_string(),
            });
        }
        Ok(())
    }

    async fn clear_history(&self) -> Result<(), ApiError> {
        self.script().history.clear();
        Ok(())
    }
}

pub fn item(id: &str, title: &str, creator: &str) -> MediaItem {
    let mut item = MediaItem::new(id);
    item.title = Some(title.to_string());
    item.creator = Some(creator.to_string());
    item.url = Some(format!("https://cdn.example/{id}.jpg"));
    item.license = Some("by".to_string());
    item
}

pub fn record(id: &str) -> BookmarkRecord {
    BookmarkRecord {
        media_id: id.to_string(),
        media_url: format!("https://cdn.example/{id}.jpg"),
        media_type: "images".to_string(),
        media_title: Some(id.to_string()),
        media_creator: None,
        media_license: None,
        created_at: None,
    }
}

pub fn server_error(status: u16) -> ApiError {
    ApiError::Server {
        status,
        message: format!("scripted {status}"),
    }
}

pub fn config() -> ClientConfig {
    ClientConfig::default()
}
