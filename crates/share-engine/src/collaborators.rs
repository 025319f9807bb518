//! Traits the share engine consumes but doesn't implement.
//!
//! The engine owns the share index, search matching, and filelist
//! generation; it does not own a hub connection, a filesystem walker, a
//! hash database, or a download queue. Those live in the surrounding
//! application and are injected here as a transport trait, rather than the
//! engine opening sockets or touching the filesystem itself.

use std::path::Path;
use std::time::SystemTime;

use share_core::{ProfileToken, TTHValue};

use crate::error::EngineResult;

/// Sends search results and filelist notifications out to connected hubs.
pub trait HubGateway: Send + Sync {
    /// Broadcast a search result for a token that arrived over a hub (TCP
    /// results go back through the hub itself).
    fn send_search_result(&self, hub_url: &str, raw_message: &str) -> EngineResult<()>;

    /// Send a result over SUDP to `target` using the supplied already
    /// AES-encrypted datagram.
    fn send_udp_result(&self, target: std::net::SocketAddr, datagram: &[u8]) -> EngineResult<()>;
}

/// Abstracts filesystem access so the share tree can be rebuilt and
/// individual files added without the refresh/indexing code depending on
/// `std::fs` directly (tests substitute an in-memory tree).
pub trait FileSystemGateway: Send + Sync {
    fn list_dir(&self, path: &Path) -> EngineResult<Vec<DirEntryMeta>>;
    fn modified_time(&self, path: &Path) -> EngineResult<SystemTime>;
}

#[derive(Clone, Debug)]
pub struct DirEntryMeta {
    pub name: String,
    pub path: std::path::PathBuf,
    pub is_dir: bool,
    pub size: u64,
    pub modified: SystemTime,
}

/// Looks up or computes TTH values for files being added to the share.
/// Hashing itself (file I/O, Merkle tree construction) is out of scope for
/// this engine; it only needs the resulting value and whether it's already
/// known.
pub trait HashDatabase: Send + Sync {
    fn tth_for_path(&self, path: &Path) -> EngineResult<Option<TTHValue>>;
}

/// Lets the filelist/search subsystems ask whether a remote file is already
/// queued for download, to compute `DupeType` without depending on the
/// queue's internal representation.
pub trait QueueGateway: Send + Sync {
    fn is_queued(&self, tth: &TTHValue) -> bool;
    fn queue_target_profile(&self) -> Option<ProfileToken>;
}
