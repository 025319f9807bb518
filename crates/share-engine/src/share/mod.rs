//! The share index: `ShareDirectory`/`ShareRoot` tree, the `ShareTree`
//! coordinator that holds the derived indices, and the ephemeral
//! `TempShareManager` side-index.

pub mod directory;
pub mod temp;
pub mod tree;

use std::collections::HashSet;
use std::time::SystemTime;

use share_core::{DualString, ProfileToken};

pub use directory::{LocalSearchHit, ShareDirectory, ShareFile};
pub use temp::{TempShareInfo, TempShareManager, TempShareToken};
pub use tree::{ShareManager, ShareTree};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RefreshState {
    Normal,
    Pending,
    Running,
}

/// Marks a `ShareDirectory` as a root: the filesystem path it was added
/// from, its virtual (user-facing) name, and the profiles/refresh metadata
/// that only make sense at the top of a shared subtree.
#[derive(Clone, Debug)]
pub struct ShareRoot {
    pub path: String,
    pub path_lower: String,
    pub virtual_name: DualString,
    pub profiles: HashSet<ProfileToken>,
    pub incoming: bool,
    pub refresh_state: RefreshState,
    pub refresh_task_token: Option<u64>,
    pub last_write: SystemTime,
    pub last_refresh_time: SystemTime,
    pub cache_dirty: bool,
}

impl ShareRoot {
    pub fn new(path: String, virtual_name: String, profiles: HashSet<ProfileToken>, incoming: bool) -> Self {
        let path_lower = path.to_lowercase();
        Self {
            path,
            path_lower,
            virtual_name: DualString::new(virtual_name),
            profiles,
            incoming,
            refresh_state: RefreshState::Normal,
            refresh_task_token: None,
            last_write: SystemTime::now(),
            last_refresh_time: SystemTime::UNIX_EPOCH,
            cache_dirty: false,
        }
    }

    pub fn has_profile(&self, profile: ProfileToken) -> bool {
        self.profiles.contains(&profile)
    }
}
