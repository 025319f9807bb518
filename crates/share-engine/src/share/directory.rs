//! `ShareDirectory` — one node of the in-memory share tree.
//!
//! Directories own their children by value (no parent pointers): a refresh
//! builds a whole new subtree and the tree swaps it in atomically under the
//! write lock, so nothing ever needs to walk upward through a half-built
//! tree. Paths are threaded down through recursion instead.

use share_core::{DirectoryContentInfo, DualString, Keyed, SortedVector, TTHValue};

use super::ShareRoot;
use crate::search::{synthesize_directory_tth, FileTypeMode, Recursion, SearchQuery};

/// A single shared file.
#[derive(Clone, Debug)]
pub struct ShareFile {
    name: DualString,
    pub size: i64,
    pub tth: TTHValue,
    pub last_write: u64,
    /// Absolute filesystem path, native separators. Empty for files built
    /// purely in memory (e.g. some test fixtures) that never need a real
    /// path resolved back out.
    pub real_path: String,
}

impl ShareFile {
    pub fn new(name: DualString, size: i64, tth: TTHValue, last_write: u64) -> Self {
        Self {
            name,
            size,
            tth,
            last_write,
            real_path: String::new(),
        }
    }

    /// Same as `new`, but carrying the file's real filesystem path —
    /// what a refresh walker or incremental hash-completion callback
    /// actually has on hand.
    pub fn with_real_path(name: DualString, size: i64, tth: TTHValue, last_write: u64, real_path: String) -> Self {
        Self {
            name,
            size,
            tth,
            last_write,
            real_path,
        }
    }

    pub fn name(&self) -> &DualString {
        &self.name
    }
}

impl Keyed for ShareFile {
    type Key = str;

    fn key(&self) -> &str {
        self.name.lower()
    }
}

/// A directory in the share tree: its own name, direct children, and the
/// files living directly inside it.
#[derive(Clone, Debug)]
pub struct ShareDirectory {
    name: DualString,
    pub dirs: SortedVector<ShareDirectory>,
    pub files: SortedVector<ShareFile>,
    pub last_write: u64,
    /// Size of files directly inside this directory (not recursive).
    level_size: i64,
    /// Present only on a directory that is itself a share root.
    pub root: Option<ShareRoot>,
}

impl ShareDirectory {
    pub fn new(name: DualString, last_write: u64) -> Self {
        Self {
            name,
            dirs: SortedVector::new(),
            files: SortedVector::new(),
            last_write,
            level_size: 0,
            root: None,
        }
    }

    pub fn name(&self) -> &DualString {
        &self.name
    }

    pub fn add_file(&mut self, file: ShareFile) -> bool {
        self.level_size += file.size;
        let (_, inserted) = self.files.insert_sorted(file);
        inserted
    }

    pub fn add_directory(&mut self, dir: ShareDirectory) -> bool {
        let (_, inserted) = self.dirs.insert_sorted(dir);
        inserted
    }

    /// Size of files directly inside this directory, not recursive.
    pub fn level_size(&self) -> i64 {
        self.level_size
    }

    /// Recursive total size of this directory and all its descendants.
    pub fn total_size(&self) -> i64 {
        self.level_size + self.dirs.iter().map(ShareDirectory::total_size).sum::<i64>()
    }

    /// Recursive directory/file counts, the `DirectoryContentInfo` shown in
    /// search results and filelists.
    pub fn content_info(&self) -> share_core::DirectoryContentInfo {
        let mut directories = self.dirs.len();
        let mut files = self.files.len();
        for child in self.dirs.iter() {
            let child_info = child.content_info();
            directories += child_info.directories;
            files += child_info.files;
        }
        share_core::DirectoryContentInfo::new(directories, files)
    }

    pub fn find_directory_lower(&self, name_lower: &str) -> Option<&ShareDirectory> {
        self.dirs.find(name_lower)
    }

    pub fn find_file_lower(&self, name_lower: &str) -> Option<&ShareFile> {
        self.files.find(name_lower)
    }

    /// Descend `path_components` (already lowercased), returning the
    /// directory at that path if every segment resolves.
    pub fn find_directory_by_path<'a>(&'a self, path_components: &[&str]) -> Option<&'a ShareDirectory> {
        match path_components.split_first() {
            None => Some(self),
            Some((head, rest)) => self.find_directory_lower(head)?.find_directory_by_path(rest),
        }
    }

    /// The ranking walk: prune on exclude match, emit a directory hit when
    /// every include token has been consumed along this path, walk direct
    /// child files, then recurse. `path_prefix` is this directory's own ADC
    /// path, including its trailing slash.
    pub fn search(&self, query: &SearchQuery, recursion: &Recursion, level: usize, path_prefix: &str, out: &mut Vec<LocalSearchHit>) {
        let name_lower = self.name.lower();

        if query.exclude.iter().any(|token| name_lower.contains(token.as_str())) {
            return;
        }

        let recursion = recursion.descend(query, name_lower);

        if !query.include.is_empty() && recursion.all_matched() && query.accepts_directories() {
            let relevance = directory_relevance(query, &recursion, name_lower, level);
            out.push(LocalSearchHit {
                is_directory: true,
                name: self.name.normal().to_string(),
                adc_path: path_prefix.to_string(),
                size: self.total_size(),
                tth: synthesize_directory_tth(name_lower, self.total_size()),
                last_write: self.last_write,
                content_info: self.content_info(),
                relevance,
            });
        }

        if query.accepts_files() {
            for file in self.files.iter() {
                if query.matches_file(file.name().lower(), file.size, file.last_write, &file.tth) {
                    let relevance = file_relevance(query, &recursion, file.name().lower(), level);
                    out.push(LocalSearchHit {
                        is_directory: false,
                        name: file.name().normal().to_string(),
                        adc_path: format!("{path_prefix}{}", file.name().normal()),
                        size: file.size,
                        tth: file.tth,
                        last_write: file.last_write,
                        content_info: DirectoryContentInfo::UNINITIALIZED,
                        relevance,
                    });
                    if query.add_parents {
                        break;
                    }
                }
            }
        }

        for child in self.dirs.iter() {
            let child_prefix = format!("{path_prefix}{}/", child.name().normal());
            child.search(query, &recursion, level + 1, &child_prefix, out);
        }
    }
}

impl Keyed for ShareDirectory {
    type Key = str;

    fn key(&self) -> &str {
        self.name.lower()
    }
}

/// One match produced by `ShareDirectory::search`, before the caller (the
/// tree/manager) fills in transport-level fields (user, token) to build a
/// full `SearchResult`.
#[derive(Clone, Debug)]
pub struct LocalSearchHit {
    pub is_directory: bool,
    pub name: String,
    pub adc_path: String,
    pub size: i64,
    pub tth: TTHValue,
    pub last_write: u64,
    pub content_info: DirectoryContentInfo,
    pub relevance: f64,
}

/// Shallower matches rank higher via this fixed per-level multiplier.
const LEVEL_DECAY: f64 = 0.9;

fn directory_relevance(query: &SearchQuery, recursion: &Recursion, name_lower: &str, level: usize) -> f64 {
    let total_tokens = query.include.len().max(1) as f64;
    let matched_ratio = recursion.matched_count() as f64 / total_tokens;

    let matched_len: usize = query
        .include
        .iter()
        .filter(|token| name_lower.contains(token.as_str()))
        .map(|token| token.len())
        .sum();
    let length_ratio = if name_lower.is_empty() {
        0.0
    } else {
        matched_len as f64 / name_lower.len() as f64
    };

    let consecutive_bonus = if tokens_appear_in_order(&query.include, name_lower) { 0.25 } else { 0.0 };

    (matched_ratio + length_ratio + consecutive_bonus) * LEVEL_DECAY.powi(level as i32)
}

fn file_relevance(query: &SearchQuery, recursion: &Recursion, name_lower: &str, level: usize) -> f64 {
    let base = directory_relevance(query, recursion, name_lower, level);
    let extension_bonus = if matches!(query.file_type, FileTypeMode::Any | FileTypeMode::Tth) {
        0.0
    } else {
        0.15
    };
    base + extension_bonus
}

fn tokens_appear_in_order(tokens: &[String], name_lower: &str) -> bool {
    let mut cursor = 0usize;
    for token in tokens {
        match name_lower[cursor..].find(token.as_str()) {
            Some(pos) => cursor += pos + token.len(),
            None => return false,
        }
    }
    true
}
