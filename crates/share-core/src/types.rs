//! Core value types shared across the share tree, search engine, and filelist
//! subsystem.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::base32;
use crate::error::ShareError;

/// An integer tag naming a sharing configuration. Each share root declares
/// which profiles it belongs to, and peers are served from a chosen profile.
pub type ProfileToken = i32;

/// Tiger Tree Hash: the 24-byte content identifier used as the primary
/// file-identity key everywhere in the share tree and search engine.
///
/// Equality and hashing are bitwise; base32 is used for serialization.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TTHValue(pub [u8; 24]);

impl TTHValue {
    pub const SIZE: usize = 24;

    pub fn new(bytes: [u8; 24]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 24] {
        &self.0
    }

    pub fn to_base32(&self) -> String {
        base32::encode(&self.0)
    }

    pub fn from_base32(text: &str) -> Result<Self, ShareError> {
        let bytes = base32::decode(text)?;
        let array: [u8; 24] = bytes
            .try_into()
            .map_err(|v: Vec<u8>| ShareError::malformed(format!("TTH must be 24 bytes, got {}", v.len())))?;
        Ok(Self(array))
    }
}

impl fmt::Debug for TTHValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TTHValue({})", self.to_base32())
    }
}

impl fmt::Display for TTHValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_base32())
    }
}

/// 24-byte client identifier, used to address a hinted user.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CID(pub [u8; 24]);

impl CID {
    pub fn to_base32(&self) -> String {
        base32::encode(&self.0)
    }
}

impl fmt::Debug for CID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CID({})", self.to_base32())
    }
}

/// Aggregate directory/file counts carried alongside `SearchResult`s and
/// `FilelistDirectory` nodes so a listing can show "X files, Y folders"
/// without recursing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryContentInfo {
    pub directories: usize,
    pub files: usize,
}

impl DirectoryContentInfo {
    pub const UNINITIALIZED: DirectoryContentInfo = DirectoryContentInfo {
        directories: usize::MAX,
        files: usize::MAX,
    };

    pub fn new(directories: usize, files: usize) -> Self {
        Self { directories, files }
    }

    /// The original distinguishes "known to be zero" from "not computed" by
    /// using a sentinel; `is_initialized` mirrors that check.
    pub fn is_initialized(&self) -> bool {
        *self != Self::UNINITIALIZED
    }
}

impl Default for DupeType {
    fn default() -> Self {
        DupeType::None
    }
}

/// Tri-state indicating whether a remote file or directory overlaps local
/// share or queue content.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DupeType {
    None,
    Partial,
    Full,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tth_base32_round_trip() {
        let tth = TTHValue([7u8; 24]);
        let encoded = tth.to_base32();
        let decoded = TTHValue::from_base32(&encoded).unwrap();
        assert_eq!(tth, decoded);
    }

    #[test]
    fn content_info_uninitialized_sentinel() {
        assert!(!DirectoryContentInfo::UNINITIALIZED.is_initialized());
        assert!(DirectoryContentInfo::new(1, 2).is_initialized());
    }
}
