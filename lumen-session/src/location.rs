use std::sync::Mutex;

/// The address bar. The session only ever writes to it; reading happens
/// once, through `SearchSession::restore_from_location`.
pub trait LocationSink: Send + Sync + 'static {
    /// Replace the current query string (no leading `?`) without adding a
    /// history entry.
    fn replace(&self, query: &str);
}

/// Discards every publish.
pub struct NullLocation;

impl LocationSink for NullLocation {
    fn replace(&self, _query: &str) {}
}

/// Records every publish; the last one is the current location.
#[derive(Debug, Default)]
pub struct MemoryLocation {
    published: Mutex<Vec<String>>,
}

impl MemoryLocation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<String> {
        self.lock().last().cloned()
    }

    pub fn history(&self) -> Vec<String> {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<String>> {
        self.published.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl LocationSink for MemoryLocation {
    fn replace(&self, query: &str) {
        self.lock().push(query.to_string());
    }
}
