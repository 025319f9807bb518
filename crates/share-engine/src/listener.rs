//! Event broadcasting for the share tree, search instances, and directory
//! listings, mirroring `ConnectionManager`'s `broadcast::channel` fan-out.

use tokio::sync::broadcast;

use share_core::TTHValue;

use crate::search::{GroupedSearchResult, SearchQuery, SearchResult};

/// Share tree lifecycle events.
#[derive(Clone, Debug)]
pub enum ShareEvent {
    RefreshStarted { root_path: String },
    RefreshCompleted { root_path: String, directories: usize, files: usize },
    RefreshFailed { root_path: String, reason: String },
    FileAdded { root_path: String, tth: TTHValue },
}

/// Events a single `SearchInstance` publishes as results stream in.
#[derive(Clone, Debug)]
pub enum SearchInstanceEvent {
    /// The first result for a TTH not seen before by this instance created
    /// a new `GroupedSearchResult`.
    GroupedResultAdded { instance_id: u64, result: GroupedSearchResult },
    /// A subsequent result for an already-grouped TTH was accepted as a new
    /// child (a distinct user).
    GroupedResultUpdated { instance_id: u64, result: GroupedSearchResult },
    /// Fired for every individually accepted result, in addition to
    /// whichever of the above two group-level events it triggered.
    UserResult { instance_id: u64, result: SearchResult, parent: GroupedSearchResult },
    /// The hub search has been sent (or the hub disconnected) on every hub
    /// it was queued for; the queued-hub set has drained to empty.
    HubSearchSent { instance_id: u64 },
}

/// Events a `SearchManager` publishes about the fan-out as a whole.
#[derive(Clone, Debug)]
pub enum SearchManagerEvent {
    InstanceCreated { instance_id: u64, query: SearchQuery },
    InstanceClosed { instance_id: u64, result_count: usize },
}

/// Events from loading a remote `DirectoryListing`.
#[derive(Clone, Debug)]
pub enum DirectoryListingEvent {
    LoadQueued { path: String },
    LoadStarted { path: String },
    LoadCompleted { path: String },
    LoadFailed { path: String, reason: String },
}

/// Thin wrapper matching the `broadcast::channel` + `subscribe()` pattern
/// used throughout the daemon, generic over whichever event enum a
/// subsystem needs to publish.
pub struct EventBus<E: Clone> {
    tx: broadcast::Sender<E>,
}

impl<E: Clone> EventBus<E> {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<E> {
        self.tx.subscribe()
    }

    pub fn publish(&self, event: E) {
        let _ = self.tx.send(event);
    }
}

impl<E: Clone> Default for EventBus<E> {
    fn default() -> Self {
        Self::new(64)
    }
}
