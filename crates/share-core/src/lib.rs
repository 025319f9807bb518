//! Value types, containers, and configuration shared by the share tree,
//! search engine, and filelist subsystem.

pub mod base32;
pub mod bloom;
pub mod config;
pub mod dual_string;
pub mod error;
pub mod sorted_vector;
pub mod types;

pub use bloom::ShareBloom;
pub use config::Config;
pub use dual_string::DualString;
pub use error::{ShareError, ShareErrorKind};
pub use sorted_vector::{Keyed, SortedVector};
pub use types::{CID, DirectoryContentInfo, DupeType, ProfileToken, TTHValue};
