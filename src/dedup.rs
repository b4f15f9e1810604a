//! dedup.rs — bounded history of insight ids already surfaced as
//! notifications, persisted across restarts.
//!
//! The history has a single writer (the poller, under its single-flight
//! guard). Corrupt or missing persisted data loads as an empty list; a bad
//! local cache must never crash startup.

use std::sync::Arc;

use tracing::warn;

use crate::store::StateStore;

/// Persisted key: plain JSON array of insight ids, oldest first.
const HISTORY_KEY: &str = "notified_insights.json";

/// Maximum ids kept; oldest dropped first once exceeded.
pub const HISTORY_CAP: usize = 50;

/// In-memory snapshot of the notified-ids list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifiedHistory {
    ids: Vec<String>,
    cap: usize,
}

impl Default for NotifiedHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl NotifiedHistory {
    pub fn new() -> Self {
        Self::with_cap(HISTORY_CAP)
    }

    pub fn with_cap(cap: usize) -> Self {
        Self { ids: Vec::new(), cap }
    }

    pub fn from_ids(ids: Vec<String>, cap: usize) -> Self {
        let mut h = Self { ids, cap };
        h.trim();
        h
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|x| x == id)
    }

    /// Append then trim to the most recent `cap`, oldest dropped first.
    pub fn add_all<I, S>(&mut self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ids.extend(ids.into_iter().map(Into::into));
        self.trim();
    }

    fn trim(&mut self) {
        if self.ids.len() > self.cap {
            let excess = self.ids.len() - self.cap;
            self.ids.drain(0..excess);
        }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }
}

/// Persistence wrapper: load/persist the history through a [`StateStore`].
pub struct DedupStore {
    store: Arc<dyn StateStore>,
    cap: usize,
}

impl DedupStore {
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        Self { store, cap: HISTORY_CAP }
    }

    pub fn with_cap(store: Arc<dyn StateStore>, cap: usize) -> Self {
        Self { store, cap }
    }

    /// Fail-open load: missing or malformed data yields an empty history.
    pub async fn load(&self) -> NotifiedHistory {
        let Some(raw) = self.store.read(HISTORY_KEY).await else {
            return NotifiedHistory::with_cap(self.cap);
        };
        match serde_json::from_str::<Vec<String>>(&raw) {
            Ok(ids) => NotifiedHistory::from_ids(ids, self.cap),
            Err(e) => {
                warn!("corrupt notified history, starting empty: {e:#}");
                NotifiedHistory::with_cap(self.cap)
            }
        }
    }

    /// Warn-only persist; the next cycle rewrites the full list anyway.
    pub async fn persist(&self, history: &NotifiedHistory) {
        let raw = match serde_json::to_string(history.ids()) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("encode notified history: {e:#}");
                return;
            }
        };
        if let Err(e) = self.store.write(HISTORY_KEY, &raw).await {
            warn!("persist notified history: {e:#}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_all_appends_in_order() {
        let mut h = NotifiedHistory::new();
        h.add_all(["a", "b", "c"]);
        assert_eq!(h.ids(), ["a", "b", "c"]);
        assert!(h.contains("b"));
        assert!(!h.contains("d"));
    }

    #[test]
    fn cap_evicts_oldest_first() {
        let mut h = NotifiedHistory::new();
        h.add_all((0..HISTORY_CAP).map(|i| format!("id-{i}")));
        assert_eq!(h.len(), HISTORY_CAP);

        h.add_all(["id-new"]);
        assert_eq!(h.len(), HISTORY_CAP);
        assert!(!h.contains("id-0"));
        assert!(h.contains("id-1"));
        assert!(h.contains("id-new"));
    }

    #[test]
    fn oversized_persisted_list_is_trimmed_on_load() {
        let ids: Vec<String> = (0..60).map(|i| format!("id-{i}")).collect();
        let h = NotifiedHistory::from_ids(ids, HISTORY_CAP);
        assert_eq!(h.len(), HISTORY_CAP);
        assert!(!h.contains("id-9"));
        assert!(h.contains("id-10"));
    }
}
