use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::hash::Hash;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use lumen_net::ApiError;
use serde::Serialize;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, warn};

/// A boxed fetch, produced lazily only when the cache decides to go to the network.
pub type FetchFuture<V> = Pin<Box<dyn Future<Output = Result<V, ApiError>> + Send>>;

type Outcome<V> = Option<Result<Arc<V>, ApiError>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheStatus {
    /// Present and younger than the TTL.
    Fresh,
    /// Present but older than the TTL; a read revalidates in the background.
    Stale,
    /// Never fetched (or evicted).
    Miss,
    /// No usable value yet, a fetch is outstanding.
    Loading,
    /// The last fetch for this key failed. Any prior value is still returned.
    Error,
}

/// Result of a non-blocking read.
#[derive(Debug, Clone)]
pub struct Lookup<V> {
    pub value: Option<Arc<V>>,
    pub status: CacheStatus,
    pub error: Option<ApiError>,
}

struct Entry<V> {
    value: Option<Arc<V>>,
    fetched_at: Option<Instant>,
    error: Option<ApiError>,
    last_used: u64,
}

struct Flight<V> {
    id: u64,
    rx: watch::Receiver<Outcome<V>>,
}

struct State<K, V> {
    entries: HashMap<K, Entry<V>>,
    inflight: HashMap<K, Flight<V>>,
    tick: u64,
    next_flight: u64,
}

struct Inner<K, V> {
    name: &'static str,
    ttl: Duration,
    capacity: usize,
    state: Mutex<State<K, V>>,
}

/// Keyed stale-while-revalidate cache with in-flight de-duplication and LRU
/// eviction.
///
/// A completed fetch is always stored under the key it was issued for, so a
/// slow response for an old key can never overwrite a newer key's entry.
/// Fetches run on spawned tasks and complete even if every caller stops
/// waiting.
pub struct ResultCache<K, V> {
    inner: Arc<Inner<K, V>>,
}

impl<K, V> Clone for ResultCache<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K, V> ResultCache<K, V>
where
    K: Eq + Hash + Clone + fmt::Debug + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    pub fn new(name: &'static str, ttl: Duration, capacity: usize) -> Self {
        Self {
            inner: Arc::new(Inner {
                name,
                ttl,
                capacity: capacity.max(1),
                state: Mutex::new(State {
                    entries: HashMap::new(),
                    inflight: HashMap::new(),
                    tick: 0,
                    next_flight: 0,
                }),
            }),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.inner.ttl
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current state of `key` without starting any fetch.
    pub fn peek(&self, key: &K) -> Lookup<V> {
        let mut st = self.inner.lock();
        st.tick += 1;
        let tick = st.tick;
        let loading = st.inflight.contains_key(key);
        let Some(entry) = st.entries.get_mut(key) else {
            let status = if loading { CacheStatus::Loading } else { CacheStatus::Miss };
            return Lookup {
                value: None,
                status,
                error: None,
            };
        };
        entry.last_used = tick;

        let status = if entry.error.is_some() {
            if loading {
                CacheStatus::Loading
            } else {
                CacheStatus::Error
            }
        } else if entry.value.is_none() {
            if loading {
                CacheStatus::Loading
            } else {
                CacheStatus::Miss
            }
        } else if entry
            .fetched_at
            .is_some_and(|at| at.elapsed() < self.inner.ttl)
        {
            CacheStatus::Fresh
        } else {
            CacheStatus::Stale
        };
        Lookup {
            value: entry.value.clone(),
            status,
            error: entry.error.clone(),
        }
    }

    /// Non-blocking read. Starts a fetch on miss or error and a background
    /// revalidation on staleness, then reports the state after doing so.
    pub fn get<F>(&self, key: &K, fetch: F) -> Lookup<V>
    where
        F: FnOnce() -> FetchFuture<V>,
    {
        let before = self.peek(key);
        match before.status {
            CacheStatus::Fresh | CacheStatus::Loading => before,
            CacheStatus::Miss | CacheStatus::Error | CacheStatus::Stale => {
                self.start_fetch(key.clone(), fetch);
                self.peek(key)
            }
        }
    }

    /// Read that waits when there is nothing to show yet.
    ///
    /// Fresh and stale values return immediately (stale ones revalidate in the
    /// background). Otherwise the caller joins the outstanding fetch for `key`,
    /// starting one if needed, and receives its outcome.
    pub async fn load<F>(&self, key: &K, fetch: F) -> Result<(Arc<V>, CacheStatus), ApiError>
    where
        F: FnOnce() -> FetchFuture<V>,
    {
        let before = self.peek(key);
        match (before.status, before.value) {
            (CacheStatus::Fresh, Some(v)) => {
                debug!(target: "lumen_session", "{} cache hit {:?}", self.inner.name, key);
                return Ok((v, CacheStatus::Fresh));
            }
            (CacheStatus::Stale, Some(v)) => {
                debug!(target: "lumen_session", "{} cache stale {:?}; revalidating", self.inner.name, key);
                self.start_fetch(key.clone(), fetch);
                return Ok((v, CacheStatus::Stale));
            }
            _ => {}
        }

        let mut rx = self.start_fetch(key.clone(), fetch);
        let outcome = match rx.wait_for(|o| o.is_some()).await {
            Ok(guard) => (*guard).clone(),
            Err(_) => None,
        };
        match outcome {
            Some(Ok(v)) => Ok((v, CacheStatus::Fresh)),
            Some(Err(e)) => Err(e),
            None => Err(ApiError::Network("fetch task aborted".to_string())),
        }
    }

    /// Issue `fetch` for `key` unless one is already outstanding; either way
    /// return a receiver for the shared outcome.
    fn start_fetch<F>(&self, key: K, fetch: F) -> watch::Receiver<Outcome<V>>
    where
        F: FnOnce() -> FetchFuture<V>,
    {
        let (tx, rx, id) = {
            let mut st = self.inner.lock();
            if let Some(flight) = st.inflight.get(&key) {
                debug!(target: "lumen_session", "{} joining in-flight fetch {:?}", self.inner.name, key);
                return flight.rx.clone();
            }
            st.next_flight += 1;
            let id = st.next_flight;
            let (tx, rx) = watch::channel(None);
            st.inflight.insert(
                key.clone(),
                Flight {
                    id,
                    rx: rx.clone(),
                },
            );
            (tx, rx, id)
        };

        debug!(target: "lumen_session", "{} fetching {:?}", self.inner.name, key);
        let fut = fetch();
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            let result = fut.await.map(Arc::new);
            inner.complete(key, id, &result);
            tx.send_replace(Some(result));
        });
        rx
    }

    /// Drop `key`, including interest in any outstanding fetch for it. That
    /// fetch still completes for its waiters but is not stored.
    pub fn invalidate(&self, key: &K) {
        let mut st = self.inner.lock();
        st.entries.remove(key);
        st.inflight.remove(key);
    }

    pub fn invalidate_all(&self) {
        let mut st = self.inner.lock();
        st.entries.clear();
        st.inflight.clear();
    }
}

impl<K, V> Inner<K, V>
where
    K: Eq + Hash + Clone + fmt::Debug,
{
    fn lock(&self) -> MutexGuard<'_, State<K, V>> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn complete(&self, key: K, flight: u64, result: &Result<Arc<V>, ApiError>) {
        let mut st = self.lock();
        if !st.inflight.get(&key).is_some_and(|f| f.id == flight) {
            debug!(target: "lumen_session", "{} dropping result for invalidated {:?}", self.name, key);
            return;
        }
        st.inflight.remove(&key);
        st.tick += 1;
        let tick = st.tick;

        match result {
            Ok(v) => {
                st.entries.insert(
                    key,
                    Entry {
                        value: Some(Arc::clone(v)),
                        fetched_at: Some(Instant::now()),
                        error: None,
                        last_used: tick,
                    },
                );
            }
            Err(e) => {
                warn!(target: "lumen_session", "{} fetch failed for {:?}: {e}", self.name, key);
                let entry = st.entries.entry(key).or_insert(Entry {
                    value: None,
                    fetched_at: None,
                    error: None,
                    last_used: tick,
                });
                entry.error = Some(e.clone());
                entry.last_used = tick;
            }
        }

        while st.entries.len() > self.capacity {
            let oldest = st
                .entries
                .iter()
                .min_by_key(|(_, e)| e.last_used)
                .map(|(k, _)| k.clone());
            match oldest {
                Some(k) => {
                    debug!(target: "lumen_session", "{} evicting {:?}", self.name, k);
                    st.entries.remove(&k);
                }
                None => break,
            }
        }
    }
}
