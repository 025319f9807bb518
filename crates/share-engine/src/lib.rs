//! The share tree, search engine, and filelist subsystem of an ADC/NMDC
//! hub client: everything downstream of "files are hashed and on disk" up
//! to "a peer can search them and browse a filelist", with no networking
//! or hashing code of its own.

pub mod collaborators;
pub mod error;
pub mod filelist;
pub mod listener;
pub mod search;
pub mod share;

pub use collaborators::{FileSystemGateway, HashDatabase, HubGateway, QueueGateway};
pub use error::{EngineError, EngineResult};
pub use listener::{DirectoryListingEvent, SearchInstanceEvent, SearchManagerEvent, ShareEvent};
