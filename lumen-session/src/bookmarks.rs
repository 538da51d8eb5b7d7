use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use lumen_api::{BookmarkRecord, NewBookmark};
use lumen_net::{ApiError, CredentialProvider, MediaBackend};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::error::SessionError;

/// Immutable snapshot of bookmarked media ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookmarkSet(Arc<HashSet<String>>);

impl BookmarkSet {
    pub fn contains(&self, media_id: &str) -> bool {
        self.0.contains(media_id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl FromIterator<String> for BookmarkSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self(Arc::new(iter.into_iter().collect()))
    }
}

/// Outstanding and recently settled toggles, overlaid on any listing that
/// may predate them.
enum Mark {
    /// A toggle toward this membership is in flight.
    InFlight(bool),
    /// Settled at revision `at` while a listing was being fetched.
    Settled { member: bool, at: u64 },
}

#[derive(Default)]
struct Ledger {
    revision: u64,
    loads: usize,
    marks: HashMap<String, Mark>,
}

impl Ledger {
    fn in_flight(&self, id: &str) -> bool {
        matches!(self.marks.get(id), Some(Mark::InFlight(_)))
    }

    fn settle(&mut self, id: &str, member: bool) {
        if self.loads == 0 {
            self.marks.remove(id);
            return;
        }
        self.revision += 1;
        let at = self.revision;
        self.marks.insert(id.to_string(), Mark::Settled { member, at });
    }

    /// Membership a listing fetched at revision `started` must show for `id`,
    /// if a toggle overrides it.
    fn overlay(&self, id: &str, started: u64) -> Option<bool> {
        match self.marks.get(id)? {
            Mark::InFlight(target) => Some(*target),
            Mark::Settled { member, at } if *at > started => Some(*member),
            Mark::Settled { .. } => None,
        }
    }
}

/// Counts an outstanding listing; settled marks are dropped once none remain.
struct LoadGuard<'a>(&'a Mutex<Ledger>);

impl Drop for LoadGuard<'_> {
    fn drop(&mut self) {
        let mut ledger = lock(self.0);
        ledger.loads -= 1;
        if ledger.loads == 0 {
            ledger.marks.retain(|_, m| matches!(m, Mark::InFlight(_)));
        }
    }
}

struct IndexInner {
    backend: Arc<dyn MediaBackend>,
    credentials: Arc<dyn CredentialProvider>,
    ids: watch::Sender<BookmarkSet>,
    records: Mutex<Vec<BookmarkRecord>>,
    ledger: Mutex<Ledger>,
}

/// Set of bookmarked media ids, rebuilt from the server listing and patched
/// optimistically by [`BookmarkIndex::toggle`].
///
/// Clones share state. Every change is published on a watch channel so other
/// views holding a [`BookmarkIndex::subscribe`] receiver converge.
#[derive(Clone)]
pub struct BookmarkIndex {
    inner: Arc<IndexInner>,
}

impl BookmarkIndex {
    pub fn new(backend: Arc<dyn MediaBackend>, credentials: Arc<dyn CredentialProvider>) -> Self {
        let (ids, _) = watch::channel(BookmarkSet::default());
        Self {
            inner: Arc::new(IndexInner {
                backend,
                credentials,
                ids,
                records: Mutex::new(Vec::new()),
                ledger: Mutex::new(Ledger::default()),
            }),
        }
    }

    /// Replace the index wholesale with the server listing.
    ///
    /// Toggles still in flight, or settled while the listing was fetched, keep
    /// their local membership.
    pub async fn load(&self) -> Result<BookmarkSet, SessionError> {
        let (started, _load) = self.begin_load();
        let mut listing = self.inner.backend.list_bookmarks().await?;

        let ledger = lock(&self.inner.ledger);
        let mut records = lock(&self.inner.records);
        for id in ledger.marks.keys() {
            if let Some(member) = ledger.overlay(id, started) {
                debug!(target: "lumen_session", "listing overridden by local toggle of {id} -> {member}");
                overlay(&mut listing, &records, id, member);
            }
        }
        let set: BookmarkSet = listing.iter().map(|r| r.media_id.clone()).collect();
        *records = listing;
        drop(records);
        self.inner.ids.send_replace(set.clone());
        drop(ledger);

        info!(target: "lumen_session", "bookmark index loaded ({} ids)", set.len());
        Ok(set)
    }

    fn begin_load(&self) -> (u64, LoadGuard<'_>) {
        let mut ledger = lock(&self.inner.ledger);
        ledger.loads += 1;
        (ledger.revision, LoadGuard(&self.inner.ledger))
    }

    pub fn snapshot(&self) -> BookmarkSet {
        self.inner.ids.borrow().clone()
    }

    pub fn contains(&self, media_id: &str) -> bool {
        self.inner.ids.borrow().contains(media_id)
    }

    pub fn subscribe(&self) -> watch::Receiver<BookmarkSet> {
        self.inner.ids.subscribe()
    }

    /// Records from the last listing, with local toggles applied.
    pub fn records(&self) -> Vec<BookmarkRecord> {
        lock(&self.inner.records).clone()
    }

    /// Flip membership of `bookmark.media_id`, optimistically.
    ///
    /// Fails fast with `Unauthenticated` when there is no credential, and with
    /// `BookmarkPending` while another toggle of the same id is in flight. On
    /// any backend failure the local change is reverted and the error returned.
    /// Returns the resulting membership.
    ///
    /// The request runs on its own task: if the caller stops waiting, the
    /// change is still confirmed or rolled back.
    pub async fn toggle(&self, bookmark: &NewBookmark) -> Result<bool, SessionError> {
        if self.inner.credentials.token().await?.is_none() {
            debug!(target: "lumen_session", "bookmark toggle refused: no credential");
            return Err(SessionError::Unauthenticated);
        }

        let (was_member, removed) = self.begin(bookmark)?;
        let index = self.clone();
        let bookmark = bookmark.clone();
        tokio::spawn(async move { index.finish(bookmark, was_member, removed).await })
            .await
            .map_err(|e| SessionError::Network(format!("bookmark task failed: {e}")))?
    }

    /// Claim `bookmark.media_id` and apply the optimistic change.
    fn begin(&self, bookmark: &NewBookmark) -> Result<(bool, Option<BookmarkRecord>), SessionError> {
        let id = bookmark.media_id.as_str();
        let mut ledger = lock(&self.inner.ledger);
        if ledger.in_flight(id) {
            return Err(SessionError::BookmarkPending(id.to_string()));
        }
        let was_member = self.contains(id);
        ledger.marks.insert(id.to_string(), Mark::InFlight(!was_member));
        let removed = if was_member {
            self.remove_local(id)
        } else {
            self.insert_local(BookmarkRecord::from(bookmark));
            None
        };
        Ok((was_member, removed))
    }

    async fn finish(
        &self,
        bookmark: NewBookmark,
        was_member: bool,
        removed: Option<BookmarkRecord>,
    ) -> Result<bool, SessionError> {
        let id = bookmark.media_id.as_str();
        let outcome = if was_member {
            tolerate(self.inner.backend.delete_bookmark(id).await, ApiError::is_not_found)
        } else {
            tolerate(self.inner.backend.create_bookmark(&bookmark).await, ApiError::is_conflict)
        };

        let mut ledger = lock(&self.inner.ledger);
        match outcome {
            Ok(()) => {
                ledger.settle(id, !was_member);
                debug!(target: "lumen_session", "bookmark {id} -> {}", !was_member);
                Ok(!was_member)
            }
            Err(e) => {
                warn!(target: "lumen_session", "bookmark toggle for {id} failed, rolling back: {e}");
                if was_member {
                    let record = removed.unwrap_or_else(|| BookmarkRecord::from(&bookmark));
                    self.insert_local(record);
                } else {
                    self.remove_local(id);
                }
                ledger.settle(id, was_member);
                Err(e.into())
            }
        }
    }

    fn insert_local(&self, record: BookmarkRecord) {
        let id = record.media_id.clone();
        {
            let mut records = lock(&self.inner.records);
            records.retain(|r| r.media_id != id);
            records.insert(0, record);
        }
        self.inner.ids.send_modify(|set| {
            if !set.contains(&id) {
                Arc::make_mut(&mut set.0).insert(id);
            }
        });
    }

    fn remove_local(&self, id: &str) -> Option<BookmarkRecord> {
        let removed = {
            let mut records = lock(&self.inner.records);
            let pos = records.iter().position(|r| r.media_id == id);
            pos.map(|i| records.remove(i))
        };
        self.inner.ids.send_modify(|set| {
            if set.contains(id) {
                Arc::make_mut(&mut set.0).remove(id);
            }
        });
        removed
    }
}

/// Force `id` in or out of `listing`, taking the record from `local`.
fn overlay(listing: &mut Vec<BookmarkRecord>, local: &[BookmarkRecord], id: &str, member: bool) {
    let listed = listing.iter().any(|r| r.media_id == id);
    if member && !listed {
        if let Some(record) = local.iter().find(|r| r.media_id == id) {
            listing.insert(0, record.clone());
        }
    } else if !member && listed {
        listing.retain(|r| r.media_id != id);
    }
}

/// A create that hits an existing bookmark, or a delete of one that is
/// already gone, leaves the server in the requested state.
fn tolerate(result: Result<(), ApiError>, benign: fn(&ApiError) -> bool) -> Result<(), ApiError> {
    match result {
        Err(e) if benign(&e) => Ok(()),
        other => other,
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}
