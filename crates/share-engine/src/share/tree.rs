//! `ShareTree` — the global indexed view of every shared root, and
//! `ShareManager`, the lock-guarded handle the rest of the engine talks to.
//!
//! A single `RwLock` serializes every mutation (root add/remove, refresh,
//! incremental file add) while readers (search, filelist generation, path
//! resolution) run concurrently, mirroring the original's single `cs` lock
//! around the whole tree plus its three derived indices.

use std::collections::HashMap;
use std::time::SystemTime;

use parking_lot::RwLock;
use share_core::{DualString, ProfileToken, ShareBloom, TTHValue};
use tracing::{debug, info, warn};

use crate::error::{EngineError, EngineResult, ShareError};
use crate::listener::{EventBus, ShareEvent};
use crate::search::{Recursion, SearchQuery};
use crate::share::{LocalSearchHit, RefreshState, ShareDirectory, ShareFile, ShareRoot};

/// One file's location in the tree, as recorded in the TTH index: which
/// root it lives under, its full ADC path, and its real filesystem path,
/// so a TTH lookup doesn't need to re-walk the tree.
#[derive(Clone, Debug)]
struct TthEntry {
    root_name_lower: String,
    adc_path: String,
    real_path: String,
    size: i64,
}

/// The tree plus its three derived indices, all rebuilt together whenever
/// a root is added, removed, or refreshed.
pub struct ShareTree {
    /// Each share root is itself a `ShareDirectory` (its `root` field set),
    /// keyed by lowercased virtual name the way child directories are keyed
    /// by lowercased name.
    roots: HashMap<String, ShareDirectory>,
    /// `rootPaths`: lowercased absolute filesystem path to the key each
    /// root is stored under in `roots`, used by `real_to_virtual_adc` to
    /// find which root a real path falls under without scanning every one.
    root_paths: HashMap<String, String>,
    tth_index: HashMap<TTHValue, Vec<TthEntry>>,
    /// Lowercased directory name to every ADC path using that name, across
    /// every root; used by `findVirtuals`-style lookups without a full walk.
    lower_dir_name_map: HashMap<String, Vec<String>>,
    bloom: ShareBloom,
    shared_size: i64,
    bloom_expected_items: usize,
}

impl ShareTree {
    pub fn new(bloom_expected_items: usize) -> Self {
        Self {
            roots: HashMap::new(),
            root_paths: HashMap::new(),
            tth_index: HashMap::new(),
            lower_dir_name_map: HashMap::new(),
            bloom: ShareBloom::with_expected_items(bloom_expected_items),
            shared_size: 0,
            bloom_expected_items,
        }
    }

    pub fn shared_size(&self) -> i64 {
        self.shared_size
    }

    pub fn root_count(&self) -> usize {
        self.roots.len()
    }

    /// Rejects a path that is the exact path, a parent, or a child of an
    /// existing root — a share can't overlap itself.
    fn validate_root_path(&self, path_lower: &str) -> EngineResult<()> {
        for existing in self.roots.values() {
            let existing_lower = &existing.root.as_ref().expect("root directory").path_lower;
            if path_lower == existing_lower.as_str()
                || path_lower.starts_with(&format!("{existing_lower}/"))
                || existing_lower.starts_with(&format!("{path_lower}/"))
            {
                return Err(EngineError::Share(ShareError::malformed(format!(
                    "'{path_lower}' overlaps an existing share root"
                ))));
            }
        }
        Ok(())
    }

    pub fn add_share_root(&mut self, root: ShareRoot) -> EngineResult<()> {
        self.validate_root_path(&root.path_lower)?;
        let key = root.virtual_name.lower().to_string();
        if self.roots.contains_key(&key) {
            return Err(EngineError::Share(ShareError::malformed(format!(
                "a root named '{key}' is already shared"
            ))));
        }

        self.bloom.add(&key);
        let path_lower = root.path_lower.clone();
        let mut dir = ShareDirectory::new(root.virtual_name.clone(), root.last_write.duration_since(SystemTime::UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or(0));
        dir.root = Some(root);
        self.lower_dir_name_map.entry(key.clone()).or_default().push(format!("/{}/", dir.name().normal()));
        self.root_paths.insert(path_lower, key.clone());
        self.roots.insert(key, dir);
        Ok(())
    }

    pub fn remove_share_root(&mut self, virtual_name_lower: &str) -> EngineResult<ShareRoot> {
        let mut dir = self
            .roots
            .remove(virtual_name_lower)
            .ok_or_else(|| EngineError::Share(ShareError::not_found(virtual_name_lower)))?;
        if let Some(root) = dir.root.as_ref() {
            self.root_paths.remove(&root.path_lower);
        }
        self.clean_indices(&format!("/{}/", dir.name().normal()));
        Ok(dir.root.take().expect("root directory"))
    }

    /// Atomically swaps in a freshly-enumerated subtree for a root: tear
    /// down the old subtree's index entries, attach the new one, rebuild
    /// its index entries. The replacement happens under the caller's write
    /// lock, so readers never observe a half-built tree.
    pub fn apply_refresh(&mut self, virtual_name_lower: &str, mut new_subtree: ShareDirectory) -> EngineResult<()> {
        let old = self
            .roots
            .get(virtual_name_lower)
            .ok_or_else(|| EngineError::Share(ShareError::not_found(virtual_name_lower)))?;
        let root_path = format!("/{}/", old.name().normal());

        self.shared_size -= old.total_size();
        self.clean_indices(&root_path);

        new_subtree.root = self.roots.get_mut(virtual_name_lower).and_then(|d| d.root.take());
        if let Some(root) = new_subtree.root.as_mut() {
            root.last_refresh_time = SystemTime::now();
            root.refresh_state = RefreshState::Normal;
        }

        self.index_subtree(&new_subtree, &root_path);
        self.shared_size += new_subtree.total_size();
        self.roots.insert(virtual_name_lower.to_string(), new_subtree);

        if self.bloom.len() > (self.bloom_expected_items as f64 * 1.5) as usize {
            self.rebuild_bloom();
        }
        Ok(())
    }

    fn clean_indices(&mut self, path_prefix: &str) {
        self.tth_index.retain(|_, entries| {
            entries.retain(|e| !e.adc_path.starts_with(path_prefix));
            !entries.is_empty()
        });
        self.lower_dir_name_map.retain(|_, paths| {
            paths.retain(|p| !p.starts_with(path_prefix));
            !paths.is_empty()
        });
    }

    fn index_subtree(&mut self, dir: &ShareDirectory, path_prefix: &str) {
        for file in dir.files.iter() {
            let adc_path = format!("{path_prefix}{}", file.name().normal());
            self.tth_index.entry(file.tth).or_default().push(TthEntry {
                root_name_lower: path_prefix.trim_matches('/').split('/').next().unwrap_or("").to_string(),
                adc_path,
                real_path: file.real_path.clone(),
                size: file.size,
            });
        }
        for child in dir.dirs.iter() {
            let child_prefix = format!("{path_prefix}{}/", child.name().normal());
            self.lower_dir_name_map
                .entry(child.name().lower().to_string())
                .or_default()
                .push(child_prefix.clone());
            self.index_subtree(child, &child_prefix);
        }
    }

    fn rebuild_bloom(&mut self) {
        debug!("rebuilding bloom filter, {} tokens before rebuild", self.bloom.len());
        let mut bloom = ShareBloom::with_expected_items(self.bloom_expected_items.max(self.tth_index.len() * 2));
        for name in self.lower_dir_name_map.keys() {
            bloom.add(name);
        }
        for dir in self.roots.values() {
            reseed_bloom(&mut bloom, dir);
        }
        self.bloom = bloom;
    }

    /// Roots visible under `profile`, used both as the starting set for a
    /// search and as the root listing of a `/` filelist.
    fn visible_roots(&self, profile: ProfileToken) -> impl Iterator<Item = &ShareDirectory> {
        self.roots.values().filter(move |dir| {
            dir.root.as_ref().map(|r| r.has_profile(profile)).unwrap_or(false)
        })
    }

    /// `ShareTree::searchText`: bloom short-circuit, then the ranking walk
    /// from every visible root, relevance-sorted and truncated.
    pub fn search_text(&self, query: &SearchQuery, profile: ProfileToken, max_results: usize) -> Vec<LocalSearchHit> {
        if !query.include.is_empty() && !self.bloom.contains_all(query.include.iter().map(String::as_str)) {
            return Vec::new();
        }

        let recursion = Recursion::root(query);
        let mut hits = Vec::new();
        for root in self.visible_roots(profile) {
            let prefix = format!("/{}/", root.name().normal());
            root.search(query, &recursion, 0, &prefix, &mut hits);
        }

        hits.sort_by(|a, b| b.relevance.partial_cmp(&a.relevance).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(max_results);
        hits
    }

    /// Resolve a TTH to its first file visible under `profile`. `noAccess`
    /// is reported by returning `Err(AccessDenied)` when the TTH exists but
    /// no entry's root carries the profile.
    pub fn to_real_with_size(&self, tth: &TTHValue, profile: Option<ProfileToken>) -> EngineResult<(String, i64)> {
        let entries = self
            .tth_index
            .get(tth)
            .ok_or_else(|| EngineError::Share(ShareError::not_found(tth.to_base32())))?;

        for entry in entries {
            let visible = profile
                .map(|p| self.roots.get(&entry.root_name_lower).and_then(|d| d.root.as_ref()).map(|r| r.has_profile(p)).unwrap_or(false))
                .unwrap_or(true);
            if visible {
                return Ok((entry.real_path.clone(), entry.size));
            }
        }
        Err(EngineError::Share(ShareError::access_denied(tth.to_base32())))
    }

    pub fn get_real_paths(&self, tth: &TTHValue) -> Vec<String> {
        self.tth_index
            .get(tth)
            .map(|entries| entries.iter().map(|e| e.real_path.clone()).collect())
            .unwrap_or_default()
    }

    /// `realToVirtualAdc`: resolve an absolute filesystem path back to its
    /// ADC virtual path, provided the containing directory is visible under
    /// `profile`. Walks from the owning root (found via `root_paths`) down
    /// through the remaining path components, matching each one
    /// case-insensitively the way `add_hashed_file`'s path resolution does.
    pub fn real_to_virtual_adc(&self, real_path: &str, profile: Option<ProfileToken>) -> EngineResult<String> {
        let real_path_lower = real_path.to_lowercase();
        let (root_key, relative) = self
            .root_paths
            .iter()
            .find_map(|(abs_path_lower, key)| {
                if real_path_lower == *abs_path_lower {
                    Some((key.clone(), String::new()))
                } else if let Some(rest) = real_path_lower.strip_prefix(&format!("{abs_path_lower}/")) {
                    Some((key.clone(), rest.to_string()))
                } else {
                    None
                }
            })
            .ok_or_else(|| EngineError::Share(ShareError::not_found(real_path)))?;

        let root = self
            .roots
            .get(&root_key)
            .ok_or_else(|| EngineError::Share(ShareError::not_found(real_path)))?;
        let visible = profile.map(|p| root.root.as_ref().map(|r| r.has_profile(p)).unwrap_or(false)).unwrap_or(true);
        if !visible {
            return Err(EngineError::Share(ShareError::access_denied(real_path)));
        }

        let mut adc_path = format!("/{}/", root.name().normal());
        if relative.is_empty() {
            return Ok(adc_path);
        }

        let components: Vec<&str> = relative.split('/').filter(|s| !s.is_empty()).collect();
        let (last, dirs) = components.split_last().expect("non-empty components");

        let mut cursor = root;
        for component in dirs {
            cursor = cursor
                .find_directory_lower(component)
                .ok_or_else(|| EngineError::Share(ShareError::not_found(real_path)))?;
            adc_path.push_str(cursor.name().normal());
            adc_path.push('/');
        }

        if let Some(dir) = cursor.find_directory_lower(last) {
            adc_path.push_str(dir.name().normal());
            adc_path.push('/');
        } else if let Some(file) = cursor.find_file_lower(last) {
            adc_path.push_str(file.name().normal());
        } else {
            return Err(EngineError::Share(ShareError::not_found(real_path)));
        }
        Ok(adc_path)
    }

    /// All ADC paths currently registered for a lowercased directory name,
    /// visible under `profile`. Multiple roots may share a virtual name, so
    /// more than one path can come back.
    pub fn find_virtuals(&self, adc_path_lower: &str, profile: ProfileToken) -> EngineResult<Vec<String>> {
        let components: Vec<&str> = adc_path_lower.trim_matches('/').split('/').filter(|s| !s.is_empty()).collect();
        if components.is_empty() {
            return Ok(self.visible_roots(profile).map(|d| format!("/{}/", d.name().normal())).collect());
        }

        let (root_key, rest) = components.split_first().expect("non-empty components");
        match self.roots.get(*root_key) {
            Some(dir) if dir.root.as_ref().map(|r| r.has_profile(profile)).unwrap_or(false) => {
                if dir.find_directory_by_path(rest).is_some() {
                    Ok(vec![format!("/{}/{}/", dir.name().normal(), rest.join("/"))])
                } else {
                    Err(EngineError::Share(ShareError::not_found(adc_path_lower)))
                }
            }
            _ => Err(EngineError::Share(ShareError::not_found(adc_path_lower))),
        }
    }

    pub fn root_by_name(&self, virtual_name_lower: &str) -> Option<&ShareDirectory> {
        self.roots.get(virtual_name_lower)
    }

    pub fn roots(&self) -> impl Iterator<Item = &ShareDirectory> {
        self.roots.values()
    }

    /// Resolves `adc_path` to the directories a filelist should be
    /// generated from: the visible roots themselves for `/`, or the single
    /// directory the path descends to (our root map forbids two roots from
    /// sharing a display name, so unlike the original there is at most one
    /// match below the root level).
    fn directories_for_filelist<'a>(&'a self, adc_path_lower: &str, profile: ProfileToken) -> EngineResult<Vec<&'a ShareDirectory>> {
        let components: Vec<&str> = adc_path_lower.trim_matches('/').split('/').filter(|s| !s.is_empty()).collect();
        if components.is_empty() {
            return Ok(self.visible_roots(profile).collect());
        }

        let (root_key, rest) = components.split_first().expect("non-empty components");
        let root = self
            .roots
            .get(*root_key)
            .filter(|dir| dir.root.as_ref().map(|r| r.has_profile(profile)).unwrap_or(false))
            .ok_or_else(|| EngineError::Share(ShareError::not_found(adc_path_lower)))?;

        let target = root
            .find_directory_by_path(rest)
            .ok_or_else(|| EngineError::Share(ShareError::not_found(adc_path_lower)))?;
        Ok(vec![target])
    }

    /// Incremental add outside a refresh: a single hashed file dropped into
    /// an already-indexed directory (e.g. a finished download moved into a
    /// shared folder). `dir_path_lower` is the ADC path of the containing
    /// directory, without the leading root segment.
    pub fn add_hashed_file(&mut self, root_name_lower: &str, dir_path_components: &[&str], file: ShareFile) -> EngineResult<()> {
        let root = self
            .roots
            .get_mut(root_name_lower)
            .ok_or_else(|| EngineError::Share(ShareError::not_found(root_name_lower)))?;

        let target = find_directory_mut(root, dir_path_components)
            .ok_or_else(|| EngineError::Share(ShareError::not_found(dir_path_components.join("/"))))?;

        self.bloom.add(file.name().lower());
        let adc_path = format!("/{root_name_lower}/{}/{}", dir_path_components.join("/"), file.name().normal());
        let tth = file.tth;
        let size = file.size;
        let real_path = file.real_path.clone();
        target.add_file(file);
        self.shared_size += size;
        self.tth_index.entry(tth).or_default().push(TthEntry {
            root_name_lower: root_name_lower.to_string(),
            adc_path,
            real_path,
            size,
        });
        Ok(())
    }
}

fn find_directory_mut<'a>(dir: &'a mut ShareDirectory, path_components: &[&str]) -> Option<&'a mut ShareDirectory> {
    match path_components.split_first() {
        None => Some(dir),
        Some((head, rest)) => find_directory_mut(dir.dirs.find_mut(&head.to_lowercase())?, rest),
    }
}

fn reseed_bloom(bloom: &mut ShareBloom, dir: &ShareDirectory) {
    for file in dir.files.iter() {
        bloom.add(file.name().lower());
    }
    for child in dir.dirs.iter() {
        bloom.add(child.name().lower());
        reseed_bloom(bloom, child);
    }
}

/// Lock-guarded handle to a `ShareTree`, the type the rest of the engine
/// (search, filelist, refresh scheduler) actually holds.
pub struct ShareManager {
    tree: RwLock<ShareTree>,
    events: EventBus<ShareEvent>,
}

impl ShareManager {
    pub fn new(bloom_expected_items: usize) -> Self {
        Self {
            tree: RwLock::new(ShareTree::new(bloom_expected_items)),
            events: EventBus::default(),
        }
    }

    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<ShareEvent> {
        self.events.subscribe()
    }

    pub fn read(&self) -> parking_lot::RwLockReadGuard<'_, ShareTree> {
        self.tree.read()
    }

    pub fn add_share_root(&self, root: ShareRoot) -> EngineResult<()> {
        let path = root.path.clone();
        self.tree.write().add_share_root(root)?;
        info!("added share root {}", path);
        Ok(())
    }

    pub fn remove_share_root(&self, virtual_name_lower: &str) -> EngineResult<ShareRoot> {
        self.tree.write().remove_share_root(virtual_name_lower)
    }

    pub fn refresh_root(&self, virtual_name_lower: &str, new_subtree: ShareDirectory) -> EngineResult<()> {
        self.events.publish(ShareEvent::RefreshStarted {
            root_path: virtual_name_lower.to_string(),
        });
        let info = new_subtree.content_info();
        match self.tree.write().apply_refresh(virtual_name_lower, new_subtree) {
            Ok(()) => {
                self.events.publish(ShareEvent::RefreshCompleted {
                    root_path: virtual_name_lower.to_string(),
                    directories: info.directories,
                    files: info.files,
                });
                Ok(())
            }
            Err(e) => {
                warn!("refresh of {} failed: {}", virtual_name_lower, e);
                self.events.publish(ShareEvent::RefreshFailed {
                    root_path: virtual_name_lower.to_string(),
                    reason: e.to_string(),
                });
                Err(e)
            }
        }
    }

    pub fn add_hashed_file(&self, root_name_lower: &str, dir_path_components: &[&str], file: ShareFile) -> EngineResult<()> {
        let tth = file.tth;
        self.tree.write().add_hashed_file(root_name_lower, dir_path_components, file)?;
        self.events.publish(ShareEvent::FileAdded {
            root_path: root_name_lower.to_string(),
            tth,
        });
        Ok(())
    }

    pub fn search_text(&self, query: &SearchQuery, profile: ProfileToken, max_results: usize) -> Vec<LocalSearchHit> {
        self.tree.read().search_text(query, profile, max_results)
    }

    pub fn to_real_with_size(&self, tth: &TTHValue, profile: Option<ProfileToken>) -> EngineResult<(String, i64)> {
        self.tree.read().to_real_with_size(tth, profile)
    }

    pub fn get_real_paths(&self, tth: &TTHValue) -> Vec<String> {
        self.tree.read().get_real_paths(tth)
    }

    pub fn real_to_virtual_adc(&self, real_path: &str, profile: Option<ProfileToken>) -> EngineResult<String> {
        self.tree.read().real_to_virtual_adc(real_path, profile)
    }

    pub fn find_virtuals(&self, adc_path: &str, profile: ProfileToken) -> EngineResult<Vec<String>> {
        self.tree.read().find_virtuals(&adc_path.to_lowercase(), profile)
    }

    pub fn shared_size(&self) -> i64 {
        self.tree.read().shared_size()
    }

    /// `ShareTree::toFilelist`: writes the full `<FileListing>` document for
    /// `adc_path` under `profile` to `out`.
    pub fn to_filelist(
        &self,
        out: &mut impl std::io::Write,
        cid: &share_core::CID,
        adc_path: &str,
        profile: ProfileToken,
        recursive: bool,
        generator: &str,
        dup: &mut crate::filelist::writer::DuplicateHandler,
    ) -> EngineResult<()> {
        let tree = self.tree.read();
        let dirs = tree.directories_for_filelist(&adc_path.to_lowercase(), profile)?;
        crate::filelist::writer::write_filelist(out, cid, adc_path, &dirs, recursive, generator, dup)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::time::Duration;

    fn root(name: &str, path: &str, profile: ProfileToken) -> ShareRoot {
        let mut profiles = HashSet::new();
        profiles.insert(profile);
        ShareRoot::new(path.into(), name.into(), profiles, false)
    }

    fn file(name: &str, size: i64, tth_byte: u8) -> ShareFile {
        ShareFile::with_real_path(
            DualString::new(name),
            size,
            TTHValue::new([tth_byte; 24]),
            0,
            format!("/srv/movies/{name}"),
        )
    }

    #[test]
    fn add_root_then_search_finds_file() {
        let manager = ShareManager::new(64);
        manager.add_share_root(root("Movies", "/srv/movies", 1)).unwrap();

        let mut subtree = ShareDirectory::new(DualString::new("Movies"), 0);
        subtree.add_file(file("matrix.mkv", 100, 7));
        manager.refresh_root("movies", subtree).unwrap();

        let hits = manager.search_text(&SearchQuery::new(vec!["matrix".into()]), 1, 50);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "matrix.mkv");
    }

    #[test]
    fn search_respects_profile_visibility() {
        let manager = ShareManager::new(64);
        manager.add_share_root(root("Movies", "/srv/movies", 1)).unwrap();
        let mut subtree = ShareDirectory::new(DualString::new("Movies"), 0);
        subtree.add_file(file("matrix.mkv", 100, 7));
        manager.refresh_root("movies", subtree).unwrap();

        let hits = manager.search_text(&SearchQuery::new(vec!["matrix".into()]), 2, 50);
        assert!(hits.is_empty());
    }

    #[test]
    fn adding_overlapping_root_is_rejected() {
        let manager = ShareManager::new(64);
        manager.add_share_root(root("Movies", "/srv/movies", 1)).unwrap();
        let err = manager.add_share_root(root("Sub", "/srv/movies/action", 1));
        assert!(err.is_err());
    }

    #[test]
    fn refresh_replaces_tth_index_entries() {
        let manager = ShareManager::new(64);
        manager.add_share_root(root("Movies", "/srv/movies", 1)).unwrap();

        let mut first = ShareDirectory::new(DualString::new("Movies"), 0);
        first.add_file(file("old.mkv", 1, 1));
        manager.refresh_root("movies", first).unwrap();
        assert_eq!(manager.get_real_paths(&TTHValue::new([1u8; 24])), vec!["/srv/movies/old.mkv"]);

        let mut second = ShareDirectory::new(DualString::new("Movies"), 0);
        second.add_file(file("new.mkv", 1, 2));
        manager.refresh_root("movies", second).unwrap();

        assert!(manager.get_real_paths(&TTHValue::new([1u8; 24])).is_empty());
        assert_eq!(manager.get_real_paths(&TTHValue::new([2u8; 24])), vec!["/srv/movies/new.mkv"]);
    }

    #[test]
    fn to_real_with_size_returns_filesystem_path_not_virtual_path() {
        let manager = ShareManager::new(64);
        manager.add_share_root(root("Movies", "/srv/movies", 1)).unwrap();
        let mut subtree = ShareDirectory::new(DualString::new("Movies"), 0);
        subtree.add_file(file("matrix.mkv", 100, 7));
        manager.refresh_root("movies", subtree).unwrap();

        let (path, size) = manager.to_real_with_size(&TTHValue::new([7u8; 24]), Some(1)).unwrap();
        assert_eq!(path, "/srv/movies/matrix.mkv");
        assert_eq!(size, 100);
    }

    #[test]
    fn to_real_with_size_reports_access_denied_for_wrong_profile() {
        let manager = ShareManager::new(64);
        manager.add_share_root(root("Movies", "/srv/movies", 1)).unwrap();
        let mut subtree = ShareDirectory::new(DualString::new("Movies"), 0);
        subtree.add_file(file("matrix.mkv", 100, 7));
        manager.refresh_root("movies", subtree).unwrap();

        let err = manager.to_real_with_size(&TTHValue::new([7u8; 24]), Some(99)).unwrap_err();
        assert!(matches!(err, EngineError::Share(ref e) if e.kind == share_core::ShareErrorKind::AccessDenied));

        let _ = Duration::from_secs(1);
    }

    #[test]
    fn real_to_virtual_adc_resolves_nested_file_path() {
        let manager = ShareManager::new(64);
        manager.add_share_root(root("Movies", "/srv/movies", 1)).unwrap();

        let mut action = ShareDirectory::new(DualString::new("Action"), 0);
        action.add_file(ShareFile::with_real_path(
            DualString::new("matrix.mkv"),
            100,
            TTHValue::new([9u8; 24]),
            0,
            "/srv/movies/Action/matrix.mkv".into(),
        ));
        let mut subtree = ShareDirectory::new(DualString::new("Movies"), 0);
        subtree.add_directory(action);
        manager.refresh_root("movies", subtree).unwrap();

        let adc_path = manager.real_to_virtual_adc("/srv/movies/Action/matrix.mkv", Some(1)).unwrap();
        assert_eq!(adc_path, "/Movies/Action/matrix.mkv");
    }

    #[test]
    fn real_to_virtual_adc_rejects_path_outside_any_root() {
        let manager = ShareManager::new(64);
        manager.add_share_root(root("Movies", "/srv/movies", 1)).unwrap();

        assert!(manager.real_to_virtual_adc("/etc/passwd", Some(1)).is_err());
    }
}
