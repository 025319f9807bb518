//! ADC `SEARCH`/`RES` parameter names and the NMDC `$SR` field shape.
//!
//! This crate never opens a hub connection; these constants exist so the
//! (external) wire layer and this core agree on the same vocabulary when the
//! wire layer builds an outgoing message from a `SearchQuery` or parses one
//! into a `SearchResult`.

/// ADC `SEARCH` parameters, two-letter codes per the ADC protocol.
pub mod adc_search {
    /// Token correlating results back to the originating request.
    pub const TOKEN: &str = "TO";
    /// Minimum file size, in bytes.
    pub const SIZE_MIN: &str = "GE";
    /// Maximum file size, in bytes.
    pub const SIZE_MAX: &str = "LE";
    /// Included search terms, one parameter per term.
    pub const AND: &str = "AN";
    /// Excluded search terms, one parameter per term.
    pub const NOT: &str = "NO";
    /// Required file extension, one parameter per extension.
    pub const EXTENSION: &str = "EX";
    /// File type group (`FileTypeMode` as ADC's numeric groups).
    pub const GROUP_TYPE: &str = "GR";
    /// Item type: `1` (file) or `2` (directory).
    pub const TYPE: &str = "TY";
    /// TTH being looked up directly, bypassing name matching.
    pub const TTH: &str = "TR";
    /// Extensions restricted to a particular `GR` group.
    pub const EXTENSION_GROUP: &str = "RX";
    /// Minimum last-modified date, in Unix seconds.
    pub const DATE_MIN: &str = "OT";
    /// Maximum last-modified date, in Unix seconds.
    pub const DATE_MAX: &str = "NT";
    /// Match type: `1` (full path) or `2` (partial, recursion-aware).
    pub const MATCH_TYPE: &str = "MT";
    /// Maximum number of results the requester wants back.
    pub const MAX_RESULTS: &str = "MR";
    /// Base path to search under, for a direct (non-broadcast) search.
    pub const BASE_PATH: &str = "PA";
    /// Reply-direct flag: ask for `RES` back over the originating
    /// connection rather than a hub broadcast.
    pub const REPLY_DIRECT: &str = "RE";
    /// SUDP key for encrypting the reply, base32-encoded.
    pub const SUDP_KEY: &str = "KY";
}

/// ADC `RES` (search result) parameters.
pub mod adc_result {
    pub const FILE_NAME: &str = "FN";
    pub const SIZE: &str = "SI";
    pub const SLOTS_FREE: &str = "SL";
    pub const TOKEN: &str = "TO";
    pub const TTH: &str = "TR";
    pub const DATE: &str = "DM";
    /// File count, for a directory result.
    pub const FILE_COUNT: &str = "FI";
    /// Subdirectory count, for a directory result.
    pub const FOLDER_COUNT: &str = "FO";
}

/// NMDC `$SR` field order: `$SR <nick> <path>\x05<size> <free>/<total>\x05<hub>(<ip:port>)`.
pub mod nmdc_sr {
    pub const COMMAND: &str = "$SR";
    pub const FIELD_SEPARATOR: u8 = 0x05;
}
