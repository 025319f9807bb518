//! Filelist XML element/attribute names and the share-cache header shape.
//!
//! These mirror what `writer.rs`/`listing.rs` already emit and parse; kept
//! as named constants so both sides (and any future wire-layer code serving
//! the bytes over a hub connection) read from one vocabulary instead of
//! scattered string literals.

pub const ELEM_FILE_LISTING: &str = "FileListing";
pub const ELEM_DIRECTORY: &str = "Directory";
pub const ELEM_FILE: &str = "File";

pub const ATTR_VERSION: &str = "Version";
pub const ATTR_CID: &str = "CID";
pub const ATTR_BASE: &str = "Base";
pub const ATTR_BASE_DATE: &str = "BaseDate";
pub const ATTR_GENERATOR: &str = "Generator";
pub const ATTR_NAME: &str = "Name";
pub const ATTR_DATE: &str = "Date";
pub const ATTR_SIZE: &str = "Size";
pub const ATTR_TTH: &str = "TTH";
pub const ATTR_INCOMPLETE: &str = "Incomplete";
pub const ATTR_FILES: &str = "Files";
pub const ATTR_DIRECTORIES: &str = "Directories";

/// Current filelist document version, per the `Version` attribute on the
/// root `<FileListing>` element.
pub const FILE_LISTING_VERSION: &str = "1";
