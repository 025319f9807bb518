//! Error plumbing for the share tree, search engine, and filelist subsystem.
//!
//! Re-exports `share_core::ShareError` as the common currency so callers
//! that cross the crate boundary don't have to juggle two error types, and
//! adds the handful of variants that only make sense once a network/disk
//! surface exists (filelist parsing, SUDP decryption).

use thiserror::Error;

pub use share_core::{ShareError, ShareErrorKind};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Share(#[from] ShareError),

    #[error("filelist xml error: {0}")]
    Filelist(String),

    #[error("SUDP decrypt failed: no key in the pool matched")]
    SudpDecryptFailed,

    #[error("search query rejected: {0}")]
    InvalidQuery(String),
}

pub type EngineResult<T> = Result<T, EngineError>;
