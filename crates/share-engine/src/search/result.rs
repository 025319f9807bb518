//! `SearchResult` and its TTH-grouped aggregate, `GroupedSearchResult`.

use share_core::{CID, DirectoryContentInfo, DupeType, TTHValue};

static NEXT_RESULT_ID: std::sync::atomic::AtomicU64 = std::sync::atomic::AtomicU64::new(1);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResultType {
    File,
    Directory,
}

/// Identifies the hub+user a result came from, without pulling in the
/// connection-management layer itself.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HintedUser {
    pub cid: CID,
    pub hub_url: String,
}

#[derive(Clone, Debug)]
pub struct SearchResult {
    pub id: u64,
    pub user: HintedUser,
    pub result_type: ResultType,
    pub free_slots: u16,
    pub total_slots: u16,
    pub size: i64,
    /// ADC path, '/'-separated, trailing '/' for directories.
    pub adc_path: String,
    pub ip: Option<std::net::IpAddr>,
    /// For files, the real TTH. For directories, synthesized from the
    /// final path segment and size so grouping/dedup still has a key.
    pub tth: TTHValue,
    /// Correlates with the `SearchQuery`/outgoing search token this is a
    /// reply to.
    pub token: String,
    pub date: u64,
    pub connection: String,
    pub content_info: DirectoryContentInfo,
}

impl SearchResult {
    pub fn next_id() -> u64 {
        NEXT_RESULT_ID.fetch_add(1, std::sync::atomic::Ordering::Relaxed)
    }

    pub fn last_path_segment(&self) -> &str {
        self.adc_path.trim_end_matches('/').rsplit('/').next().unwrap_or("")
    }
}

/// Deterministic directory TTH: the original hashes the last path segment
/// plus the size so directory results can still be grouped by content
/// identity even though directories have no real TTH of their own.
pub fn synthesize_directory_tth(last_dir_name: &str, size: i64) -> TTHValue {
    let mut input = last_dir_name.as_bytes().to_vec();
    input.extend_from_slice(&size.to_le_bytes());
    let digest = xxhash_rust::xxh3::xxh3_128(&input);
    let mut bytes = [0u8; 24];
    bytes[..16].copy_from_slice(&digest.to_le_bytes());
    bytes[16..].copy_from_slice(&digest.to_be_bytes()[..8]);
    TTHValue::new(bytes)
}

#[derive(Clone, Copy, Debug, Default)]
pub struct RelevanceInfo {
    pub hits: u32,
    pub match_relevance: f64,
}

impl RelevanceInfo {
    /// `totalRelevance = hits * sourceScoreFactor + matchRelevance`: favors
    /// popular files but still lets a single very strong match rank well.
    pub fn total_relevance(&self, source_score_factor: f64) -> f64 {
        self.hits as f64 * source_score_factor + self.match_relevance
    }
}

/// All `SearchResult`s sharing a TTH, grouped for presentation.
#[derive(Clone, Debug)]
pub struct GroupedSearchResult {
    pub tth: TTHValue,
    base_result: SearchResult,
    children: Vec<SearchResult>,
    pub dupe: DupeType,
    pub relevance: RelevanceInfo,
}

impl GroupedSearchResult {
    pub fn new(base_result: SearchResult, match_relevance: f64) -> Self {
        Self {
            tth: base_result.tth,
            base_result,
            children: Vec::new(),
            dupe: DupeType::None,
            relevance: RelevanceInfo {
                hits: 1,
                match_relevance,
            },
        }
    }

    pub fn base_result(&self) -> &SearchResult {
        &self.base_result
    }

    pub fn children(&self) -> &[SearchResult] {
        &self.children
    }

    /// Adds a result from a further user, rejected if that user already
    /// contributed a child (at most one child per user per the invariant).
    pub fn add_child_result(&mut self, result: SearchResult) -> bool {
        if self.base_result.user.cid == result.user.cid
            || self.children.iter().any(|c| c.user.cid == result.user.cid)
        {
            return false;
        }
        self.relevance.hits += 1;
        self.children.push(result);
        true
    }

    /// Total free slots across base + every child, used for display and
    /// as a relevance input.
    pub fn total_free_slots(&self) -> u32 {
        std::iter::once(&self.base_result)
            .chain(self.children.iter())
            .map(|r| r.free_slots as u32)
            .sum()
    }

    pub fn oldest_date(&self) -> u64 {
        std::iter::once(&self.base_result)
            .chain(self.children.iter())
            .map(|r| r.date)
            .min()
            .unwrap_or(0)
    }

    /// The filename reported most often among base + children, matching
    /// the original's "most common filename" synthesis for display.
    pub fn most_common_filename(&self) -> &str {
        let mut counts: std::collections::HashMap<&str, usize> = std::collections::HashMap::new();
        for r in std::iter::once(&self.base_result).chain(self.children.iter()) {
            *counts.entry(r.last_path_segment()).or_insert(0) += 1;
        }
        counts
            .into_iter()
            .max_by_key(|(_, count)| *count)
            .map(|(name, _)| name)
            .unwrap_or_else(|| self.base_result.last_path_segment())
    }
}
