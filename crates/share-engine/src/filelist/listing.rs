//! `DirectoryListing` — the mirror-side view of a filelist: either a fully
//! parsed remote `.xml` listing, or a partial tree grown one directory at a
//! time as the user navigates (for both remote peers and our own "browse my
//! share" case).

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use share_core::{DualString, DupeType, Keyed, SortedVector, TTHValue};

use crate::collaborators::QueueGateway;
use crate::error::{EngineError, EngineResult};
use crate::listener::{DirectoryListingEvent, EventBus};
use crate::share::ShareManager;

/// Per-directory load state, mirroring the original's state machine: a
/// directory starts `None` (unknown/stub), moves to one of the two loading
/// states while a fetch is outstanding, and returns to `None` on failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DirectoryLoadType {
    None,
    ChangeNormal,
    ChangeReload,
    LoadContent,
}

#[derive(Clone, Debug)]
pub struct ListingFile {
    name: DualString,
    pub size: i64,
    pub tth: TTHValue,
    pub dupe: DupeType,
}

impl ListingFile {
    pub fn name(&self) -> &DualString {
        &self.name
    }
}

impl Keyed for ListingFile {
    type Key = str;

    fn key(&self) -> &str {
        self.name.lower()
    }
}

#[derive(Clone, Debug)]
pub struct ListingDirectory {
    name: DualString,
    pub date: u64,
    /// `true` once every child directory/file for this node has been
    /// parsed in, as opposed to being a stub awaiting `LoadContent`.
    pub complete: bool,
    pub load_state: DirectoryLoadType,
    pub dupe: DupeType,
    pub dirs: SortedVector<ListingDirectory>,
    pub files: SortedVector<ListingFile>,
}

impl ListingDirectory {
    fn stub(name: DualString) -> Self {
        Self {
            name,
            date: 0,
            complete: false,
            load_state: DirectoryLoadType::None,
            dupe: DupeType::None,
            dirs: SortedVector::new(),
            files: SortedVector::new(),
        }
    }

    pub fn name(&self) -> &DualString {
        &self.name
    }
}

impl Keyed for ListingDirectory {
    type Key = str;

    fn key(&self) -> &str {
        self.name.lower()
    }
}

/// The mirror tree plus navigation/load state for one peer's filelist (or
/// our own, browsed the same way).
pub struct DirectoryListing {
    root: ListingDirectory,
    pub is_own_list: bool,
    /// `true` once a full `.xml`/`.xml.bz2` has been loaded; a fully loaded
    /// listing never needs another directory fetch.
    full_list_loaded: bool,
    events: EventBus<DirectoryListingEvent>,
}

impl DirectoryListing {
    pub fn new(is_own_list: bool) -> Self {
        Self {
            root: ListingDirectory::stub(DualString::new("")),
            is_own_list,
            full_list_loaded: false,
            events: EventBus::default(),
        }
    }

    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<DirectoryListingEvent> {
        self.events.subscribe()
    }

    pub fn root(&self) -> &ListingDirectory {
        &self.root
    }

    pub fn is_full_list(&self) -> bool {
        self.full_list_loaded
    }

    /// `loadXML`: parses a complete filelist document, replacing the whole
    /// mirror tree.
    pub fn load_full_xml(&mut self, xml: &str) -> EngineResult<()> {
        let parsed = parse_fragment(xml, true)?;
        self.root = ListingDirectory {
            name: DualString::new(""),
            date: 0,
            complete: true,
            load_state: DirectoryLoadType::None,
            dupe: DupeType::None,
            dirs: parsed.dirs,
            files: parsed.files,
        };
        self.full_list_loaded = true;
        Ok(())
    }

    /// Ensures a stub chain exists down to `path_components`, creating any
    /// missing intermediate directories as incomplete stubs. Mirrors
    /// `createBaseDirectory`.
    pub fn create_base_directory(&mut self, path_components: &[&str]) {
        let mut current = &mut self.root;
        for segment in path_components {
            let lower = segment.to_lowercase();
            if current.dirs.find(lower.as_str()).is_none() {
                current.dirs.insert_sorted(ListingDirectory::stub(DualString::new(*segment)));
            }
            current = current.dirs.find_mut(lower.as_str()).expect("just inserted");
        }
    }

    /// Parses a partial-list XML fragment into the directory at
    /// `path_components`, after ensuring the stub chain exists.
    pub fn load_partial_xml(&mut self, path_components: &[&str], xml: &str) -> EngineResult<()> {
        self.create_base_directory(path_components);
        let parsed = parse_fragment(xml, false)?;

        let target = find_mut(&mut self.root, path_components)
            .ok_or_else(|| EngineError::Filelist(format!("base directory '{}' missing after creation", path_components.join("/"))))?;
        target.dirs = parsed.dirs;
        target.files = parsed.files;
        target.complete = true;
        target.load_state = DirectoryLoadType::None;
        Ok(())
    }

    /// `addDirectoryChangeTask`: if the listing is already fully loaded, or
    /// the target subtree is already complete, there's nothing to fetch —
    /// the caller can navigate immediately. Otherwise marks the directory
    /// as loading and fires `LoadStarted`; a duplicate navigate to an
    /// already-loading directory is a no-op (it wraps into the same wait).
    /// Returns `true` if the caller must actually fetch content.
    pub fn add_directory_change_task(&mut self, path_components: &[&str], load_type: DirectoryLoadType) -> bool {
        let path = format!("/{}/", path_components.join("/"));
        self.create_base_directory(path_components);
        let target = find_mut(&mut self.root, path_components).expect("just created");

        if self.full_list_loaded || (target.complete && load_type != DirectoryLoadType::ChangeReload) {
            return false;
        }
        if target.load_state != DirectoryLoadType::None {
            return false;
        }

        target.load_state = load_type;
        self.events.publish(DirectoryListingEvent::LoadStarted { path });
        true
    }

    /// Completes a previously-started `add_directory_change_task`, parsing
    /// the fetched fragment into the target directory.
    pub fn complete_directory_change(&mut self, path_components: &[&str], xml: &str) -> EngineResult<()> {
        let path = format!("/{}/", path_components.join("/"));
        let result = self.load_partial_xml(path_components, xml);
        match &result {
            Ok(()) => self.events.publish(DirectoryListingEvent::LoadCompleted { path }),
            Err(e) => self.events.publish(DirectoryListingEvent::LoadFailed { path, reason: e.to_string() }),
        }
        result
    }

    /// Aborts an in-flight load: the state returns to `None`, the subtree
    /// may be partially populated, `LoadingFailed` fires.
    pub fn fail_directory_change(&mut self, path_components: &[&str], reason: &str) {
        let path = format!("/{}/", path_components.join("/"));
        if let Some(target) = find_mut(&mut self.root, path_components) {
            target.load_state = DirectoryLoadType::None;
        }
        self.events.publish(DirectoryListingEvent::LoadFailed { path, reason: reason.to_string() });
    }

    /// Walks the mirror tree checking every file's TTH against the local
    /// share and queue, writing `DupeType` back onto files and propagating
    /// it up to containing directories (full dupe only if every descendant
    /// is a full dupe).
    pub fn annotate_dupes(&mut self, share: &ShareManager, queue: &dyn QueueGateway) {
        annotate_node(&mut self.root, share, queue);
    }
}

fn annotate_node(dir: &mut ListingDirectory, share: &ShareManager, queue: &dyn QueueGateway) -> DupeType {
    let has_content = !dir.files.is_empty() || !dir.dirs.is_empty();
    let mut all_full = true;
    let mut any_dupe = false;

    let mut files: Vec<ListingFile> = dir.files.iter().cloned().collect();
    for file in files.iter_mut() {
        file.dupe = if !share.get_real_paths(&file.tth).is_empty() {
            DupeType::Full
        } else if queue.is_queued(&file.tth) {
            DupeType::Partial
        } else {
            DupeType::None
        };
        any_dupe |= file.dupe != DupeType::None;
        all_full &= file.dupe == DupeType::Full;
    }
    dir.files = SortedVector::new();
    for f in files {
        dir.files.insert_sorted(f);
    }

    let mut children: Vec<ListingDirectory> = dir.dirs.iter().cloned().collect();
    for child in children.iter_mut() {
        let child_dupe = annotate_node(child, share, queue);
        any_dupe |= child_dupe != DupeType::None;
        all_full &= child_dupe == DupeType::Full;
    }
    dir.dirs = SortedVector::new();
    for c in children {
        dir.dirs.insert_sorted(c);
    }

    dir.dupe = if has_content && all_full {
        DupeType::Full
    } else if any_dupe {
        DupeType::Partial
    } else {
        DupeType::None
    };
    dir.dupe
}

fn find_mut<'a>(dir: &'a mut ListingDirectory, path_components: &[&str]) -> Option<&'a mut ListingDirectory> {
    match path_components.split_first() {
        None => Some(dir),
        Some((head, rest)) => find_mut(dir.dirs.find_mut(&head.to_lowercase())?, rest),
    }
}

struct ParsedLevel {
    dirs: SortedVector<ListingDirectory>,
    files: SortedVector<ListingFile>,
}

/// Pull-parses a filelist fragment. `skip_outer_listing` strips a wrapping
/// `<FileListing>` element (present in a full list, absent in a partial
/// fragment received for a single base path).
fn parse_fragment(xml: &str, skip_outer_listing: bool) -> EngineResult<ParsedLevel> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut buf = Vec::new();

    // One frame per nesting level: (name, date, child dirs, child files).
    let mut stack: Vec<(DualString, u64, Vec<ListingDirectory>, Vec<ListingFile>)> = Vec::new();
    let mut top_dirs: Vec<ListingDirectory> = Vec::new();
    let mut top_files: Vec<ListingFile> = Vec::new();

    loop {
        match reader.read_event_into(&mut buf).map_err(xml_err)? {
            Event::Start(ref e) if tag_is(e, "FileListing") => {
                if !skip_outer_listing {
                    return Err(EngineError::Filelist("unexpected <FileListing> in partial fragment".into()));
                }
            }
            Event::Start(ref e) if tag_is(e, "Directory") => {
                let name = required_attr(e, "Name")?;
                let date = optional_attr(e, "Date")?.and_then(|v| v.parse().ok()).unwrap_or(0);
                stack.push((DualString::new(name), date, Vec::new(), Vec::new()));
            }
            Event::Empty(ref e) if tag_is(e, "Directory") => {
                let name = required_attr(e, "Name")?;
                let date = optional_attr(e, "Date")?.and_then(|v| v.parse().ok()).unwrap_or(0);
                let incomplete = optional_attr(e, "Incomplete")?.as_deref() == Some("1");
                let dir = ListingDirectory {
                    name: DualString::new(name),
                    date,
                    complete: !incomplete,
                    load_state: DirectoryLoadType::None,
                    dupe: DupeType::None,
                    dirs: SortedVector::new(),
                    files: SortedVector::new(),
                };
                push_dir(&mut stack, &mut top_dirs, dir);
            }
            Event::Empty(ref e) if tag_is(e, "File") => {
                let name = required_attr(e, "Name")?;
                let size: i64 = optional_attr(e, "Size")?.and_then(|v| v.parse().ok()).unwrap_or(0);
                let tth = optional_attr(e, "TTH")?
                    .map(|v| TTHValue::from_base32(&v).map_err(EngineError::Share))
                    .transpose()?
                    .unwrap_or(TTHValue::new([0u8; 24]));
                let file = ListingFile {
                    name: DualString::new(name),
                    size,
                    tth,
                    dupe: DupeType::None,
                };
                push_file(&mut stack, &mut top_files, file);
            }
            Event::End(ref e) if tag_is(e, "Directory") => {
                let (name, date, dirs, files) = stack.pop().ok_or_else(|| EngineError::Filelist("unbalanced </Directory>".into()))?;
                let mut dir_dirs = SortedVector::new();
                for d in dirs {
                    dir_dirs.insert_sorted(d);
                }
                let mut dir_files = SortedVector::new();
                for f in files {
                    dir_files.insert_sorted(f);
                }
                let dir = ListingDirectory {
                    name,
                    date,
                    complete: true,
                    load_state: DirectoryLoadType::None,
                    dupe: DupeType::None,
                    dirs: dir_dirs,
                    files: dir_files,
                };
                push_dir(&mut stack, &mut top_dirs, dir);
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if !stack.is_empty() {
        return Err(EngineError::Filelist("unclosed <Directory> at end of document".into()));
    }

    let mut dirs = SortedVector::new();
    for d in top_dirs {
        dirs.insert_sorted(d);
    }
    let mut files = SortedVector::new();
    for f in top_files {
        files.insert_sorted(f);
    }
    Ok(ParsedLevel { dirs, files })
}

/// Appends a finished directory to whichever frame is currently open: the
/// parent directory's frame on the stack, or the top-level result if the
/// stack is empty.
fn push_dir(stack: &mut [(DualString, u64, Vec<ListingDirectory>, Vec<ListingFile>)], top: &mut Vec<ListingDirectory>, dir: ListingDirectory) {
    match stack.last_mut() {
        Some((_, _, dirs, _)) => dirs.push(dir),
        None => top.push(dir),
    }
}

fn push_file(stack: &mut [(DualString, u64, Vec<ListingDirectory>, Vec<ListingFile>)], top: &mut Vec<ListingFile>, file: ListingFile) {
    match stack.last_mut() {
        Some((_, _, _, files)) => files.push(file),
        None => top.push(file),
    }
}

fn tag_is(e: &BytesStart, name: &str) -> bool {
    e.name().as_ref() == name.as_bytes()
}

fn required_attr(e: &BytesStart, name: &str) -> EngineResult<String> {
    optional_attr(e, name)?.ok_or_else(|| EngineError::Filelist(format!("missing required attribute '{name}'")))
}

fn optional_attr(e: &BytesStart, name: &str) -> EngineResult<Option<String>> {
    e.try_get_attribute(name)
        .map_err(|err| EngineError::Filelist(err.to_string()))?
        .map(|attr| attr.unescape_value().map(|v| v.into_owned()).map_err(xml_err))
        .transpose()
}

fn xml_err(e: quick_xml::Error) -> EngineError {
    EngineError::Filelist(e.to_string())
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use share_core::ProfileToken;

    use super::*;
    use crate::share::{ShareFile, ShareManager, ShareRoot};

    fn tth(byte: u8) -> TTHValue {
        TTHValue::new([byte; 24])
    }

    fn sample_full_xml() -> String {
        format!(
            r#"<?xml version="1.0"?>
        <FileListing Version="1" CID="ABC" Base="/" BaseDate="1000" Generator="test">
            <Directory Name="Movies" Date="1000">
                <Directory Name="Action" Date="1000">
                    <File Name="heat.mkv" Size="123" TTH="{}"/>
                </Directory>
                <File Name="readme.txt" Size="12" TTH="{}"/>
            </Directory>
        </FileListing>"#,
            tth(1).to_base32(),
            tth(2).to_base32(),
        )
    }

    #[test]
    fn full_xml_parses_nested_directories_and_files() {
        let mut listing = DirectoryListing::new(false);
        listing.load_full_xml(&sample_full_xml()).unwrap();

        assert!(listing.is_full_list());
        let movies = listing.root().dirs.find("movies").unwrap();
        assert!(movies.complete);
        assert_eq!(movies.files.len(), 1);
        assert_eq!(movies.files.find("readme.txt").unwrap().size, 12);

        let action = movies.dirs.find("action").unwrap();
        assert_eq!(action.files.len(), 1);
        assert_eq!(action.files.find("heat.mkv").unwrap().name().normal(), "heat.mkv");
    }

    #[test]
    fn create_base_directory_builds_incomplete_stub_chain() {
        let mut listing = DirectoryListing::new(false);
        listing.create_base_directory(&["Movies", "Action"]);

        let movies = listing.root().dirs.find("movies").unwrap();
        assert!(!movies.complete);
        let action = movies.dirs.find("action").unwrap();
        assert!(!action.complete);
    }

    #[test]
    fn load_partial_xml_fills_existing_stub_and_marks_complete() {
        let mut listing = DirectoryListing::new(false);
        listing.create_base_directory(&["Movies"]);

        let fragment = format!(
            r#"<Directory Name="Action" Date="500">
            <File Name="heat.mkv" Size="123" TTH="{}"/>
        </Directory>"#,
            tth(1).to_base32(),
        );
        listing.load_partial_xml(&["Movies"], &fragment).unwrap();

        let movies = listing.root().dirs.find("movies").unwrap();
        assert!(movies.complete);
        assert_eq!(movies.dirs.find("action").unwrap().files.len(), 1);
    }

    #[test]
    fn add_directory_change_task_skips_fetch_for_already_complete_directory() {
        let mut listing = DirectoryListing::new(false);
        listing.create_base_directory(&["Movies"]);
        listing.load_partial_xml(&["Movies"], "").unwrap();

        let needs_fetch = listing.add_directory_change_task(&["Movies"], DirectoryLoadType::ChangeNormal);
        assert!(!needs_fetch);
    }

    #[test]
    fn add_directory_change_task_collapses_duplicate_in_flight_request() {
        let mut listing = DirectoryListing::new(false);

        assert!(listing.add_directory_change_task(&["Movies"], DirectoryLoadType::ChangeNormal));
        // A second navigate to the same still-loading directory must not
        // fire another fetch.
        assert!(!listing.add_directory_change_task(&["Movies"], DirectoryLoadType::ChangeNormal));
    }

    #[test]
    fn fail_directory_change_resets_load_state_to_none() {
        let mut listing = DirectoryListing::new(false);
        listing.add_directory_change_task(&["Movies"], DirectoryLoadType::ChangeNormal);

        listing.fail_directory_change(&["Movies"], "peer disconnected");
        let movies = listing.root().dirs.find("movies").unwrap();
        assert_eq!(movies.load_state, DirectoryLoadType::None);

        // now a retry must be allowed to fetch again
        assert!(listing.add_directory_change_task(&["Movies"], DirectoryLoadType::ChangeNormal));
    }

    struct FakeQueue {
        queued: HashSet<[u8; 24]>,
    }

    impl crate::collaborators::QueueGateway for FakeQueue {
        fn is_queued(&self, tth: &TTHValue) -> bool {
            self.queued.contains(&tth.0)
        }

        fn queue_target_profile(&self) -> Option<ProfileToken> {
            None
        }
    }

    #[test]
    fn annotate_dupes_marks_full_when_shared_and_partial_when_mixed() {
        let shared_tth = tth(1);
        let queued_tth = tth(2);

        let share = ShareManager::new(64);
        share
            .add_share_root(ShareRoot::new("/srv/movies".into(), "Movies".into(), HashSet::from([1i32]), false))
            .unwrap();
        share
            .add_hashed_file("movies", &[], ShareFile::new(DualString::new("heat.mkv"), 100, shared_tth, 1000))
            .unwrap();

        let mut listing = DirectoryListing::new(false);
        listing
            .load_full_xml(&format!(
                r#"<FileListing Version="1" CID="X" Base="/" BaseDate="1" Generator="t">
                <Directory Name="Movies" Date="1">
                    <File Name="heat.mkv" Size="100" TTH="{}"/>
                    <File Name="other.mkv" Size="50" TTH="{}"/>
                </Directory>
            </FileListing>"#,
                shared_tth.to_base32(),
                queued_tth.to_base32(),
            ))
            .unwrap();

        let queue = FakeQueue { queued: HashSet::from([queued_tth.0]) };
        listing.annotate_dupes(&share, &queue);

        let movies = listing.root().dirs.find("movies").unwrap();
        assert_eq!(movies.files.find("heat.mkv").unwrap().dupe, DupeType::Full);
        assert_eq!(movies.files.find("other.mkv").unwrap().dupe, DupeType::Partial);
        assert_eq!(movies.dupe, DupeType::Partial);
    }
}
