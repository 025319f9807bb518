//! The search engine: query parsing/matching, result grouping, SUDP
//! transport, and the per-session `SearchInstance`.

pub mod instance;
pub mod manager;
pub mod query;
pub mod result;
pub mod wire;

pub use instance::{InstanceToken, SearchInstance};
pub use manager::{SearchManager, SearchQueueInfo};
pub use query::{FileTypeMode, ItemType, MatchType, Recursion, SearchQuery};
pub use result::{
    synthesize_directory_tth, GroupedSearchResult, HintedUser, RelevanceInfo, ResultType, SearchResult,
};
