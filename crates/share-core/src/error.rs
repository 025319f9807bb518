//! Error kinds shared by the share tree, search engine, and filelist subsystem.
//!
//! Mirrors the original's `ShareException`: a single exception type whose
//! user-visible message is drawn from a small resource table keyed by kind,
//! rather than one enum variant per call site.

use thiserror::Error;

/// Broad classification of a failure, matching the core's error taxonomy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShareErrorKind {
    /// TTH, virtual path, or real path not present in the tree.
    NotFound,
    /// Item exists but isn't visible in the caller's profile set.
    AccessDenied,
    /// Unparseable XML, bad base32, truncated packet, path tokens that escape share.
    Malformed,
    /// Filesystem I/O or network failure reported by a collaborator.
    Transient,
    /// Listing load aborted by a new navigation or an explicit close().
    Cancelled,
}

impl ShareErrorKind {
    fn resource_message(self) -> &'static str {
        match self {
            ShareErrorKind::NotFound => "The requested file or directory could not be found in the share",
            ShareErrorKind::AccessDenied => "You don't have access to this item",
            ShareErrorKind::Malformed => "The data could not be parsed",
            ShareErrorKind::Transient => "A temporary error occurred, please try again",
            ShareErrorKind::Cancelled => "The operation was cancelled",
        }
    }
}

/// Error surfaced by share tree lookups (`ShareTree::findVirtuals`,
/// `toRealWithSize`, `realToVirtualAdc`, ...).
#[derive(Clone, Debug, Error)]
#[error("{kind_message}: {detail}")]
pub struct ShareError {
    pub kind: ShareErrorKind,
    kind_message: &'static str,
    detail: String,
}

impl ShareError {
    pub fn new(kind: ShareErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            kind_message: kind.resource_message(),
            detail: detail.into(),
        }
    }

    pub fn not_found(detail: impl Into<String>) -> Self {
        Self::new(ShareErrorKind::NotFound, detail)
    }

    pub fn access_denied(detail: impl Into<String>) -> Self {
        Self::new(ShareErrorKind::AccessDenied, detail)
    }

    pub fn malformed(detail: impl Into<String>) -> Self {
        Self::new(ShareErrorKind::Malformed, detail)
    }

    pub fn transient(detail: impl Into<String>) -> Self {
        Self::new(ShareErrorKind::Transient, detail)
    }

    pub fn cancelled(detail: impl Into<String>) -> Self {
        Self::new(ShareErrorKind::Cancelled, detail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn carries_kind_and_detail() {
        let e = ShareError::not_found("/share/movies/");
        assert_eq!(e.kind, ShareErrorKind::NotFound);
        assert!(e.to_string().contains("/share/movies/"));
    }
}
