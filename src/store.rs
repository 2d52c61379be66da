//! Application state store.
//!
//! One [`Store`] holds everything a viewing session shows: the selected
//! repository, the active document, navigation UI flags and the podcast
//! viewer's filter state. It is created explicitly per session (each CLI
//! invocation, each server instance, each test) and handed to whoever needs
//! it. Nothing in the crate reaches for a global.
//!
//! Reads and writes are synchronous. Every committed write bumps a
//! [`tokio::sync::watch`] channel, so observers (the server's long-poll
//! endpoint, tests) can wait for changes with [`Store::subscribe`].
//!
//! The store makes no ordering decisions of its own. Stale async responses
//! are filtered by [`crate::navigation::Navigator`] before they get here.

use serde::Serialize;
use std::collections::BTreeSet;
use tokio::sync::watch;

use crate::models::{ActiveFile, Repository, ViewMode};
use crate::navigation::LoadPhase;

const IDLE_CONTENT: &str = "# Docs Navigator\n\nSelect a repository to view its documentation.\n";

/// Snapshot of a session's state.
#[derive(Debug, Clone, Serialize)]
pub struct AppState {
    pub repository: Option<Repository>,

    // Active document
    pub active_file: ActiveFile,
    /// Never empty: holds either the loaded markdown or a synthesized
    /// error document.
    pub current_markdown_content: String,
    pub view_mode: ViewMode,
    pub phase: LoadPhase,
    /// Sequence number of the most recently issued content request.
    pub request_seq: u64,

    // Navigation UI
    pub navigation_open: bool,
    pub scroll_top: u64,

    pub podcast: PodcastViewState,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            repository: None,
            active_file: ActiveFile::Index,
            current_markdown_content: IDLE_CONTENT.to_string(),
            view_mode: ViewMode::Html,
            phase: LoadPhase::Idle,
            request_seq: 0,
            navigation_open: true,
            scroll_top: 0,
            podcast: PodcastViewState::default(),
        }
    }
}

/// Filter and expand/collapse state of the podcast script viewer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PodcastViewState {
    pub selected_cluster_id: Option<String>,
    pub expanded_clusters: BTreeSet<String>,
    pub search_query: String,
    /// Podcast id of the document this state belongs to.
    pub document_id: Option<String>,
}

/// Shared, observable state container for one session.
pub struct Store {
    tx: watch::Sender<AppState>,
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    pub fn new() -> Self {
        Self::with_state(AppState::default())
    }

    pub fn with_state(state: AppState) -> Self {
        let (tx, _rx) = watch::channel(state);
        Self { tx }
    }

    /// Clone of the current state.
    pub fn snapshot(&self) -> AppState {
        self.tx.borrow().clone()
    }

    /// Reads a projection of the state without cloning all of it.
    pub fn read<R>(&self, f: impl FnOnce(&AppState) -> R) -> R {
        f(&self.tx.borrow())
    }

    /// Applies a mutation and notifies observers.
    pub fn update(&self, f: impl FnOnce(&mut AppState)) {
        self.tx.send_modify(f);
    }

    /// Applies a mutation that reports whether it changed anything; observers
    /// are only notified when it returns `true`.
    pub fn update_if(&self, f: impl FnOnce(&mut AppState) -> bool) -> bool {
        self.tx.send_if_modified(f)
    }

    pub fn subscribe(&self) -> watch::Receiver<AppState> {
        self.tx.subscribe()
    }

    // ============ View & navigation UI ============

    pub fn set_view_mode(&self, mode: ViewMode) {
        self.update_if(|s| {
            let changed = s.view_mode != mode;
            s.view_mode = mode;
            changed
        });
    }

    pub fn toggle_view_mode(&self) -> ViewMode {
        let mut mode = ViewMode::Html;
        self.update(|s| {
            s.view_mode = s.view_mode.toggled();
            mode = s.view_mode;
        });
        mode
    }

    pub fn set_navigation_open(&self, open: bool) {
        self.update_if(|s| {
            let changed = s.navigation_open != open;
            s.navigation_open = open;
            changed
        });
    }

    pub fn toggle_navigation(&self) -> bool {
        let mut open = false;
        self.update(|s| {
            s.navigation_open = !s.navigation_open;
            open = s.navigation_open;
        });
        open
    }

    pub fn set_scroll_top(&self, offset: u64) {
        self.update(|s| s.scroll_top = offset);
    }

    // ============ Podcast viewer ============

    /// Selects a single cluster, or clears the selection with `None`.
    pub fn select_cluster(&self, cluster_id: Option<String>) {
        self.update(|s| s.podcast.selected_cluster_id = cluster_id);
    }

    /// Flips a cluster between expanded and collapsed; returns the new state.
    pub fn toggle_cluster_expanded(&self, cluster_id: &str) -> bool {
        let mut expanded = false;
        self.update(|s| {
            let set = &mut s.podcast.expanded_clusters;
            expanded = if set.remove(cluster_id) {
                false
            } else {
                set.insert(cluster_id.to_string());
                true
            };
        });
        expanded
    }

    pub fn set_search_query(&self, query: impl Into<String>) {
        let query = query.into();
        self.update(|s| s.podcast.search_query = query);
    }

    /// Clears filters for a freshly loaded document. A no-op if the state
    /// already belongs to `document_id`.
    pub fn reset_podcast_view(&self, document_id: &str) {
        self.update_if(|s| {
            if s.podcast.document_id.as_deref() == Some(document_id) {
                return false;
            }
            s.podcast = PodcastViewState {
                document_id: Some(document_id.to_string()),
                ..PodcastViewState::default()
            };
            true
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_content_is_never_empty() {
        let store = Store::new();
        let state = store.snapshot();
        assert!(!state.current_markdown_content.is_empty());
        assert_eq!(state.phase, LoadPhase::Idle);
        assert_eq!(state.active_file, ActiveFile::Index);
    }

    #[test]
    fn test_stores_are_independent() {
        let a = Store::new();
        let b = Store::new();
        a.toggle_navigation();
        assert!(!a.read(|s| s.navigation_open));
        assert!(b.read(|s| s.navigation_open));
    }

    #[test]
    fn test_toggles() {
        let store = Store::new();
        assert_eq!(store.toggle_view_mode(), ViewMode::Markdown);
        assert_eq!(store.toggle_view_mode(), ViewMode::Html);
        assert!(!store.toggle_navigation());
        assert!(store.toggle_navigation());
    }

    #[test]
    fn test_subscribers_see_changes() {
        let store = Store::new();
        let mut rx = store.subscribe();
        assert!(!rx.has_changed().unwrap());
        store.set_view_mode(ViewMode::Markdown);
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().view_mode, ViewMode::Markdown);

        // Setting the same value again does not notify
        store.set_view_mode(ViewMode::Markdown);
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn test_cluster_expand_toggle() {
        let store = Store::new();
        assert!(store.toggle_cluster_expanded("c1"));
        assert!(store.toggle_cluster_expanded("c2"));
        assert!(!store.toggle_cluster_expanded("c1"));
        let expanded = store.read(|s| s.podcast.expanded_clusters.clone());
        assert_eq!(expanded.into_iter().collect::<Vec<_>>(), vec!["c2"]);
    }

    #[test]
    fn test_reset_podcast_view_on_new_document() {
        let store = Store::new();
        store.reset_podcast_view("p1");
        store.select_cluster(Some("c1".to_string()));
        store.set_search_query("apple");
        store.toggle_cluster_expanded("c1");

        // Same document keeps the filters
        store.reset_podcast_view("p1");
        assert_eq!(store.read(|s| s.podcast.search_query.clone()), "apple");

        store.reset_podcast_view("p2");
        let podcast = store.read(|s| s.podcast.clone());
        assert_eq!(podcast.document_id.as_deref(), Some("p2"));
        assert!(podcast.selected_cluster_id.is_none());
        assert!(podcast.expanded_clusters.is_empty());
        assert!(podcast.search_query.is_empty());
    }
}
