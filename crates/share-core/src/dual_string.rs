//! `DualString` — a name stored both as-typed and lowercased.
//!
//! Every directory and file name in the share tree is a `DualString`: the
//! `normal` form is what gets shown to the user and written into filelists,
//! the `lower` form is the locale-independent fold used for case-insensitive
//! lookup (child sorting, bloom membership, dupe detection).

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DualString {
    normal: String,
    lower: String,
    /// Set when `normal` was already all-lowercase, so callers can skip
    /// storing a second allocation-worth of identical bytes when persisting.
    already_lower: bool,
}

impl DualString {
    pub fn new(normal: impl Into<String>) -> Self {
        let normal = normal.into();
        let lower = fold(&normal);
        let already_lower = lower == normal;
        Self {
            normal,
            lower,
            already_lower,
        }
    }

    pub fn normal(&self) -> &str {
        &self.normal
    }

    pub fn lower(&self) -> &str {
        &self.lower
    }

    pub fn is_already_lower(&self) -> bool {
        self.already_lower
    }
}

impl std::fmt::Display for DualString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.normal)
    }
}

/// Locale-independent case fold used for every lookup key in the share tree.
///
/// Unicode full case folding (via `to_lowercase`) rather than ASCII-only,
/// since shared file names are not restricted to ASCII.
pub fn fold(name: &str) -> String {
    name.to_lowercase()
}
