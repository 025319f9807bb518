//! Parsed search query and the recursion state carried down a directory
//! walk while matching it.

use share_core::TTHValue;

/// Whether a match must cover the whole path in one go, or may be
/// accumulated token-by-token across several directory levels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchType {
    PathFull,
    PathPartial,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ItemType {
    File,
    Directory,
    Any,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileTypeMode {
    Any,
    Audio,
    Compressed,
    Document,
    Executable,
    Picture,
    Video,
    Directory,
    Tth,
}

impl FileTypeMode {
    /// Extensions recognized for each non-generic mode. Grounded on the
    /// wire's `GR`/`RX` grouping semantics rather than an exhaustive MIME
    /// database: good enough to rank a match, not to classify content.
    fn matches_extension(self, ext_lower: &str) -> bool {
        const AUDIO: &[&str] = &["mp3", "flac", "wav", "ogg", "m4a", "aac", "wma"];
        const COMPRESSED: &[&str] = &["zip", "rar", "7z", "gz", "bz2", "tar", "xz"];
        const DOCUMENT: &[&str] = &["pdf", "doc", "docx", "txt", "epub", "odt"];
        const EXECUTABLE: &[&str] = &["exe", "msi", "deb", "rpm", "appimage"];
        const PICTURE: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "webp"];
        const VIDEO: &[&str] = &["mkv", "mp4", "avi", "mov", "wmv", "webm"];

        match self {
            FileTypeMode::Audio => AUDIO.contains(&ext_lower),
            FileTypeMode::Compressed => COMPRESSED.contains(&ext_lower),
            FileTypeMode::Document => DOCUMENT.contains(&ext_lower),
            FileTypeMode::Executable => EXECUTABLE.contains(&ext_lower),
            FileTypeMode::Picture => PICTURE.contains(&ext_lower),
            FileTypeMode::Video => VIDEO.contains(&ext_lower),
            FileTypeMode::Any | FileTypeMode::Directory | FileTypeMode::Tth => false,
        }
    }
}

#[derive(Clone, Debug)]
pub struct SearchQuery {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub size_min: Option<i64>,
    pub size_max: Option<i64>,
    pub date_min: Option<u64>,
    pub date_max: Option<u64>,
    pub file_type: FileTypeMode,
    pub tth: Option<TTHValue>,
    pub max_results: usize,
    pub match_type: MatchType,
    pub add_parents: bool,
    pub item_type: ItemType,
}

impl SearchQuery {
    pub fn new(include: Vec<String>) -> Self {
        Self {
            include: include.into_iter().map(|s| s.to_lowercase()).collect(),
            exclude: Vec::new(),
            size_min: None,
            size_max: None,
            date_min: None,
            date_max: None,
            file_type: FileTypeMode::Any,
            tth: None,
            max_results: 50,
            match_type: MatchType::PathPartial,
            add_parents: false,
            item_type: ItemType::Any,
        }
    }

    pub fn by_tth(tth: TTHValue) -> Self {
        Self {
            tth: Some(tth),
            file_type: FileTypeMode::Tth,
            item_type: ItemType::File,
            ..Self::new(Vec::new())
        }
    }

    fn size_matches(&self, size: i64) -> bool {
        self.size_min.map_or(true, |min| size >= min) && self.size_max.map_or(true, |max| size <= max)
    }

    fn date_matches(&self, date: u64) -> bool {
        self.date_min.map_or(true, |min| date >= min) && self.date_max.map_or(true, |max| date <= max)
    }

    fn extension_of(name_lower: &str) -> &str {
        name_lower.rsplit_once('.').map(|(_, ext)| ext).unwrap_or("")
    }

    pub fn matches_file(&self, name_lower: &str, size: i64, date: u64, tth: &TTHValue) -> bool {
        if let Some(wanted) = &self.tth {
            return wanted == tth;
        }
        if !self.size_matches(size) || !self.date_matches(date) {
            return false;
        }
        if self.exclude.iter().any(|token| name_lower.contains(token.as_str())) {
            return false;
        }
        if !self.include.is_empty() && !self.include.iter().all(|token| name_lower.contains(token.as_str())) {
            return false;
        }
        if !matches!(self.file_type, FileTypeMode::Any) && !matches!(self.file_type, FileTypeMode::Directory) {
            let ext = Self::extension_of(name_lower);
            if !self.file_type.matches_extension(ext) && !matches!(self.file_type, FileTypeMode::Tth) {
                // Extension filters only gate relevance scoring, not
                // acceptance, unless the caller explicitly asked for a
                // type-restricted search with no textual tokens at all.
                if self.include.is_empty() {
                    return false;
                }
            }
        }
        true
    }

    pub fn accepts_files(&self) -> bool {
        !matches!(self.item_type, ItemType::Directory)
    }

    pub fn accepts_directories(&self) -> bool {
        !matches!(self.item_type, ItemType::File)
    }
}

/// Recursion state carried down a directory walk, tracking which include
/// tokens have already been satisfied by an ancestor directory's name so a
/// child need only test the remainder.
///
/// Pushed on entry to a directory, dropped on return — an explicit `&mut`
/// threaded down the call stack rather than the original's raw pointer with
/// manual save/restore on unwind.
#[derive(Clone, Debug)]
pub struct Recursion {
    /// Parallel to `SearchQuery::include`: true once that token has matched
    /// somewhere along the path from the search root to here.
    matched: Vec<bool>,
}

impl Recursion {
    pub fn root(query: &SearchQuery) -> Self {
        Self {
            matched: vec![false; query.include.len()],
        }
    }

    /// Build the child frame reflecting any additional tokens this
    /// directory's own name satisfied, without mutating the parent's frame.
    pub fn descend(&self, query: &SearchQuery, dir_name_lower: &str) -> Self {
        let matched = self
            .matched
            .iter()
            .zip(query.include.iter())
            .map(|(&already, token)| already || dir_name_lower.contains(token.as_str()))
            .collect();
        Self { matched }
    }

    pub fn all_matched(&self) -> bool {
        self.matched.iter().all(|&m| m)
    }

    pub fn matched_count(&self) -> usize {
        self.matched.iter().filter(|&&m| m).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_file_respects_include_and_exclude() {
        let mut q = SearchQuery::new(vec!["matrix".into()]);
        q.exclude.push("sample".into());

        assert!(q.matches_file("the.matrix.1999.mkv", 100, 0, &TTHValue::new([0; 24])));
        assert!(!q.matches_file("the.matrix.sample.mkv", 100, 0, &TTHValue::new([0; 24])));
        assert!(!q.matches_file("inception.mkv", 100, 0, &TTHValue::new([0; 24])));
    }

    #[test]
    fn size_bounds_are_enforced() {
        let mut q = SearchQuery::new(vec![]);
        q.size_min = Some(100);
        q.size_max = Some(200);

        assert!(q.matches_file("f.bin", 150, 0, &TTHValue::new([0; 24])));
        assert!(!q.matches_file("f.bin", 50, 0, &TTHValue::new([0; 24])));
        assert!(!q.matches_file("f.bin", 250, 0, &TTHValue::new([0; 24])));
    }

    #[test]
    fn tth_query_bypasses_name_filtering() {
        let tth = TTHValue::new([9u8; 24]);
        let q = SearchQuery::by_tth(tth);
        assert!(q.matches_file("anything.bin", 1, 0, &tth));
        assert!(!q.matches_file("anything.bin", 1, 0, &TTHValue::new([1u8; 24])));
    }

    #[test]
    fn recursion_frame_accumulates_across_descent_without_mutating_parent() {
        let q = SearchQuery::new(vec!["movies".into(), "action".into()]);
        let root = Recursion::root(&q);
        assert!(!root.all_matched());

        let child = root.descend(&q, "movies");
        assert_eq!(child.matched_count(), 1);
        assert_eq!(root.matched_count(), 0);

        let grandchild = child.descend(&q, "action");
        assert!(grandchild.all_matched());
        assert_eq!(child.matched_count(), 1);
    }
}
