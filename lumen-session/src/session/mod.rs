pub mod sort;
pub mod view;

use std::sync::{Arc, Mutex, MutexGuard};

use lumen_api::{HistoryEntry, MediaItem, NewBookmark};
use lumen_net::{ClientConfig, CredentialProvider, MediaBackend};
use lumen_query::{decode_onto, encode, MediaType, ParamsPatch, SearchParams};
use tracing::{debug, info};

use crate::auth::{AuthGate, Identity};
use crate::bookmarks::{BookmarkIndex, BookmarkSet};
use crate::cache::{CacheStatus, FetchFuture, ResultCache};
use crate::error::SessionError;
use crate::history::HistoryLog;
use crate::location::LocationSink;
use crate::page::{PopularFeed, SearchResultPage};

pub use sort::{locale_cmp, sort_items, SortOrder};
pub use view::{DisplayItem, SearchViewState, SessionMode};

struct SessionState {
    params: SearchParams,
    mode: SessionMode,
    /// Bumped on every param change; a fetch whose generation is no longer
    /// current has its result ignored.
    generation: u64,
    current: Option<Arc<SearchResultPage>>,
    popular: Option<Arc<PopularFeed>>,
    loading: bool,
    error: Option<SessionError>,
    auth: AuthGate,
    sort: SortOrder,
    last_published: Option<String>,
}

struct SessionInner {
    backend: Arc<dyn MediaBackend>,
    results: ResultCache<SearchParams, SearchResultPage>,
    popular: ResultCache<MediaType, PopularFeed>,
    bookmarks: BookmarkIndex,
    location: Arc<dyn LocationSink>,
    defaults: SearchParams,
    popular_limit: u32,
    history_limit: u32,
    state: Mutex<SessionState>,
}

/// One search session: current params, mode, displayed page and bookmark
/// membership, kept consistent with the address bar.
///
/// Clones share the session. Intents may be issued concurrently; the last
/// param change wins and results of superseded fetches are discarded.
#[derive(Clone)]
pub struct SearchSession {
    inner: Arc<SessionInner>,
}

impl SearchSession {
    pub fn new(
        backend: Arc<dyn MediaBackend>,
        credentials: Arc<dyn CredentialProvider>,
        location: Arc<dyn LocationSink>,
        config: &ClientConfig,
    ) -> Self {
        let bookmarks = BookmarkIndex::new(Arc::clone(&backend), credentials);
        Self::with_bookmarks(backend, bookmarks, location, config)
    }

    /// Build a session around an existing index, shared with other views.
    pub fn with_bookmarks(
        backend: Arc<dyn MediaBackend>,
        bookmarks: BookmarkIndex,
        location: Arc<dyn LocationSink>,
        config: &ClientConfig,
    ) -> Self {
        let defaults = SearchParams {
            page_size: config.page_size,
            ..SearchParams::default()
        };
        Self {
            inner: Arc::new(SessionInner {
                backend,
                results: ResultCache::new("search", config.search_ttl(), config.cache_capacity),
                // one entry per media type
                popular: ResultCache::new("popular", config.popular_ttl(), 2),
                bookmarks,
                location,
                popular_limit: config.popular_limit,
                history_limit: config.history_limit,
                state: Mutex::new(SessionState {
                    params: defaults.clone(),
                    mode: SessionMode::Idle,
                    generation: 0,
                    current: None,
                    popular: None,
                    loading: false,
                    error: None,
                    auth: AuthGate::new(),
                    sort: SortOrder::Relevance,
                    last_published: None,
                }),
                defaults,
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.inner.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn params(&self) -> SearchParams {
        self.state().params.clone()
    }

    pub fn mode(&self) -> SessionMode {
        self.state().mode
    }

    pub fn auth_error(&self) -> bool {
        self.state().auth.auth_error()
    }

    pub fn identity(&self) -> Identity {
        self.state().auth.identity()
    }

    pub fn bookmarks(&self) -> &BookmarkIndex {
        &self.inner.bookmarks
    }

    pub fn history(&self) -> HistoryLog {
        HistoryLog::new(Arc::clone(&self.inner.backend), self.inner.history_limit)
    }

    /// Adopt the params encoded in the address bar. Never publishes back.
    pub async fn restore_from_location(&self, query_string: &str) -> Result<(), SessionError> {
        let params = decode_onto(query_string, &self.inner.defaults);
        let mode = if params.has_query() {
            SessionMode::Searching
        } else {
            SessionMode::Idle
        };
        let generation = {
            let mut st = self.state();
            st.last_published = Some(encode(&params));
            Self::adopt(&mut st, params.clone(), mode)
        };
        info!(target: "lumen_session", "restored {mode:?} session from location");
        match mode {
            SessionMode::Searching => self.fetch_results(params, generation).await,
            SessionMode::Idle => self.fetch_popular(params.media_type, generation).await,
        }
    }

    /// Merge `patch` into the current params and search. The page resets to
    /// 1 unless the patch sets it.
    pub async fn submit_search(&self, patch: ParamsPatch) -> Result<(), SessionError> {
        let current = self.params();
        let mut next = patch.apply(&current);
        next.query = next.query.trim().to_string();
        if patch.page.is_none() {
            next.page = 1;
        }
        if !next.has_query() {
            return Err(SessionError::Validation("search query must not be empty".to_string()));
        }
        let generation = self.replace_params(next.clone(), SessionMode::Searching);
        self.fetch_results(next, generation).await
    }

    /// Same search, page `n`. Filters are kept.
    pub async fn change_page(&self, page: u32) -> Result<(), SessionError> {
        let (next, mode) = {
            let st = self.state();
            (st.params.clone().with_page(page), st.mode)
        };
        if mode != SessionMode::Searching {
            return Err(SessionError::Validation("no active search to paginate".to_string()));
        }
        let generation = self.replace_params(next.clone(), SessionMode::Searching);
        self.fetch_results(next, generation).await
    }

    /// Merge a filter patch, back to page 1. Refetches only while searching;
    /// in `Idle` the params are updated and published for the next search.
    pub async fn change_filter(&self, patch: ParamsPatch) -> Result<(), SessionError> {
        let (current, mode) = {
            let st = self.state();
            (st.params.clone(), st.mode)
        };
        let next = patch.apply(&current).with_page(1);
        if mode == SessionMode::Searching && !next.has_query() {
            return Err(SessionError::Validation("search query must not be empty".to_string()));
        }
        let generation = self.replace_params(next.clone(), mode);
        match mode {
            SessionMode::Searching => self.fetch_results(next, generation).await,
            SessionMode::Idle => Ok(()),
        }
    }

    pub async fn change_media_type(&self, media_type: MediaType) -> Result<(), SessionError> {
        if self.mode() == SessionMode::Searching {
            return self
                .change_filter(ParamsPatch::default().media_type(media_type))
                .await;
        }
        let mut next = self.params();
        next.media_type = media_type;
        next.page = 1;
        let generation = self.replace_params(next, SessionMode::Idle);
        self.fetch_popular(media_type, generation).await
    }

    /// Back to default params in `Idle`, with auth and error state cleared.
    /// The popular feed is refetched.
    pub async fn reset(&self) -> Result<(), SessionError> {
        self.inner.popular.invalidate_all();
        let defaults = self.inner.defaults.clone();
        let generation = {
            let mut st = self.state();
            st.auth.clear();
            st.sort = SortOrder::Relevance;
            st.popular = None;
            self.adopt_and_publish(st, defaults.clone(), SessionMode::Idle)
        };
        info!(target: "lumen_session", "session reset");
        self.fetch_popular(defaults.media_type, generation).await
    }

    /// Run a history entry again as a fresh search.
    pub async fn replay_history(&self, entry: &HistoryEntry) -> Result<(), SessionError> {
        self.submit_search(entry.replay_patch()).await
    }

    pub fn set_sort(&self, sort: SortOrder) {
        self.state().sort = sort;
    }

    /// Flip the bookmark of `item`. Refused locally, with `auth_error` set,
    /// when the session is known to be anonymous or has no credential.
    pub async fn toggle_bookmark(&self, item: &MediaItem) -> Result<bool, SessionError> {
        let media_type = {
            let mut st = self.state();
            if !st.auth.allows_mutation() {
                st.auth.observe_rejection();
                debug!(target: "lumen_session", "bookmark toggle blocked: anonymous session");
                return Err(SessionError::Unauthenticated);
            }
            st.params.media_type
        };
        let bookmark = NewBookmark::from_item(item, media_type);
        let result = self.inner.bookmarks.toggle(&bookmark).await;
        if matches!(result, Err(SessionError::Unauthenticated)) {
            self.state().auth.observe_rejection();
        }
        result
    }

    pub async fn refresh_bookmarks(&self) -> Result<BookmarkSet, SessionError> {
        self.inner.bookmarks.load().await
    }

    /// Snapshot for rendering. Reads through to the cache so a background
    /// revalidation shows up without another intent.
    pub fn view(&self) -> SearchViewState {
        let mut st = self.state();
        let bookmarks = self.inner.bookmarks.snapshot();

        let (items, total_count, total_pages, loading, stale, cache_error) = match st.mode {
            SessionMode::Searching => {
                let lookup = self.inner.results.peek(&st.params);
                if let Some(landed) = &lookup.value {
                    let replaced = st.current.as_ref().map_or(true, |c| !Arc::ptr_eq(c, landed));
                    if replaced {
                        // a background revalidation landed; its auth flag is the latest word
                        st.auth.observe_read(landed.authenticated);
                        st.current = Some(Arc::clone(landed));
                    }
                }
                let page = lookup.value.clone().or_else(|| {
                    st.current
                        .clone()
                        .filter(|p| p.params == st.params)
                });
                let (items, total, pages) = match &page {
                    Some(p) => (p.items.clone(), p.total_count, p.total_pages()),
                    None => (Vec::new(), 0, 0),
                };
                (
                    items,
                    total,
                    pages,
                    st.loading || lookup.status == CacheStatus::Loading,
                    lookup.status == CacheStatus::Stale,
                    lookup.error,
                )
            }
            SessionMode::Idle => {
                let lookup = self.inner.popular.peek(&st.params.media_type);
                let feed = lookup.value.clone().or_else(|| {
                    st.popular
                        .clone()
                        .filter(|f| f.media_type == st.params.media_type)
                });
                let items = feed.map(|f| f.items.clone()).unwrap_or_default();
                let total = items.len() as u64;
                (
                    items,
                    total,
                    u32::from(total > 0),
                    st.loading || lookup.status == CacheStatus::Loading,
                    lookup.status == CacheStatus::Stale,
                    lookup.error,
                )
            }
        };

        let mut items = items;
        sort_items(&mut items, st.sort);
        let items = items
            .into_iter()
            .map(|item| DisplayItem {
                bookmarked: bookmarks.contains(&item.id),
                item,
            })
            .collect();

        SearchViewState {
            mode: st.mode,
            params: st.params.clone(),
            items,
            total_count,
            total_pages,
            current_page: st.params.page,
            loading,
            stale,
            auth_error: st.auth.auth_error(),
            error: st
                .error
                .as_ref()
                .map(ToString::to_string)
                .or_else(|| {
                    cache_error
                        .map(SessionError::from)
                        .filter(|e| !e.is_unauthenticated())
                        .map(|e| e.to_string())
                }),
            sort: st.sort,
        }
    }

    /// Install `params` and publish them to the location.
    fn replace_params(&self, params: SearchParams, mode: SessionMode) -> u64 {
        let st = self.state();
        self.adopt_and_publish(st, params, mode)
    }

    fn adopt_and_publish(
        &self,
        mut st: MutexGuard<'_, SessionState>,
        params: SearchParams,
        mode: SessionMode,
    ) -> u64 {
        let generation = Self::adopt(&mut st, params, mode);
        let encoded = encode(&st.params);
        let publish = st.last_published.as_deref() != Some(encoded.as_str());
        if publish {
            st.last_published = Some(encoded.clone());
        }
        drop(st);
        if publish {
            debug!(target: "lumen_session", "publishing location ?{encoded}");
            self.inner.location.replace(&encoded);
        }
        generation
    }

    fn adopt(st: &mut SessionState, params: SearchParams, mode: SessionMode) -> u64 {
        if st.mode != mode {
            info!(target: "lumen_session", "session mode {:?} -> {:?}", st.mode, mode);
        }
        st.params = params;
        st.mode = mode;
        st.generation += 1;
        st.error = None;
        st.loading = false;
        if mode == SessionMode::Idle {
            st.current = None;
        }
        st.generation
    }

    async fn fetch_results(&self, params: SearchParams, generation: u64) -> Result<(), SessionError> {
        {
            let mut st = self.state();
            if st.generation != generation {
                return Ok(());
            }
            st.loading = true;
        }

        let backend = Arc::clone(&self.inner.backend);
        let key = params.clone();
        let fetch = move || -> FetchFuture<SearchResultPage> {
            Box::pin(async move {
                let resp = backend.search(&key).await?;
                Ok(SearchResultPage::from_response(key, resp))
            })
        };
        let result = self.inner.results.load(&params, fetch).await;

        let mut st = self.state();
        if st.generation != generation {
            debug!(target: "lumen_session", "ignoring superseded result for {:?}", params);
            return Ok(());
        }
        st.loading = false;
        match result {
            Ok((page, status)) => {
                st.auth.observe_read(page.authenticated);
                if !page.authenticated {
                    debug!(target: "lumen_session", "search served anonymously; bookmarks gated");
                }
                debug!(target: "lumen_session", "showing {:?} page {} ({} items)", status, page.params.page, page.items.len());
                st.current = Some(page);
                st.error = None;
                Ok(())
            }
            Err(e) => {
                let err = SessionError::from(e);
                st.current = self.inner.results.peek(&params).value;
                if err.is_unauthenticated() {
                    // a rejected read gates bookmarks; it is not a page error
                    st.auth.observe_rejection();
                    return Ok(());
                }
                st.error = Some(err.clone());
                Err(err)
            }
        }
    }

    async fn fetch_popular(&self, media_type: MediaType, generation: u64) -> Result<(), SessionError> {
        {
            let mut st = self.state();
            if st.generation != generation {
                return Ok(());
            }
            st.loading = true;
        }

        let backend = Arc::clone(&self.inner.backend);
        let limit = self.inner.popular_limit;
        let fetch = move || -> FetchFuture<PopularFeed> {
            Box::pin(async move {
                let items = backend.popular(media_type, limit).await?;
                Ok(PopularFeed::new(media_type, items))
            })
        };
        let result = self.inner.popular.load(&media_type, fetch).await;

        let mut st = self.state();
        if st.generation != generation {
            return Ok(());
        }
        st.loading = false;
        match result {
            Ok((feed, _)) => {
                st.popular = Some(feed);
                Ok(())
            }
            Err(e) => {
                let err = SessionError::from(e);
                st.error = Some(err.clone());
                Err(err)
            }
        }
    }
}
