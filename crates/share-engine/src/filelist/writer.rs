//! `FilelistDirectory` — an ephemeral view over one or more `ShareDirectory`s
//! sharing a virtual name, and the XML writer that serializes it.
//!
//! Several share roots (or directories deep in different roots reachable
//! under the same virtual path) can contribute the same directory name;
//! `FilelistDirectory::generate_root` unions their children before anything
//! is written, so the emitted document looks like one merged tree. The
//! merge tree itself is always built to full depth; a non-recursive write
//! just stops descending past the requested directory's direct children,
//! marking them `Incomplete="1"` instead of omitting their summary.

use std::io::Write;

use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::Writer;

use share_core::{CID, DirectoryContentInfo, DualString, TTHValue};

use crate::error::{EngineError, EngineResult};
use crate::share::ShareDirectory;

/// Fired once per file name that more than one contributing `ShareDirectory`
/// provides: `(name, tth_of_the_copy_that_was_kept)`.
pub type DuplicateHandler<'a> = dyn FnMut(&str, &str) + 'a;

struct MergedFile {
    name: DualString,
    size: i64,
    tth: TTHValue,
}

/// A node in the ephemeral merge tree, always built to full depth.
struct FilelistDirectory {
    name: DualString,
    date: u64,
    content_info: DirectoryContentInfo,
    dirs: Vec<FilelistDirectory>,
    files: Vec<MergedFile>,
}

impl FilelistDirectory {
    /// Merges every `ShareDirectory` in `share_dirs` (all sharing
    /// `virtual_name`) into one node, recursing fully into their children.
    fn generate_root(virtual_name: &DualString, share_dirs: &[&ShareDirectory], dup: &mut DuplicateHandler) -> Self {
        let mut files: Vec<MergedFile> = Vec::new();
        let mut seen_files: std::collections::HashMap<String, usize> = std::collections::HashMap::new();
        for share_dir in share_dirs {
            for file in share_dir.files.iter() {
                match seen_files.get(file.name().lower()) {
                    Some(&existing_idx) => dup(file.name().normal(), &files[existing_idx].tth.to_base32()),
                    None => {
                        seen_files.insert(file.name().lower().to_string(), files.len());
                        files.push(MergedFile {
                            name: file.name().clone(),
                            size: file.size,
                            tth: file.tth,
                        });
                    }
                }
            }
        }

        let mut child_groups: Vec<(String, Vec<&ShareDirectory>)> = Vec::new();
        for share_dir in share_dirs {
            for child in share_dir.dirs.iter() {
                match child_groups.iter_mut().find(|(name, _)| name == child.name().lower()) {
                    Some((_, group)) => group.push(child),
                    None => child_groups.push((child.name().lower().to_string(), vec![child])),
                }
            }
        }

        let dirs = child_groups
            .into_iter()
            .map(|(_, group)| Self::generate_root(group[0].name(), &group, dup))
            .collect();

        let date = share_dirs.iter().map(|d| d.last_write).max().unwrap_or(0);
        let mut content_info = DirectoryContentInfo::default();
        for dir in share_dirs {
            let child_info = dir.content_info();
            content_info.directories += child_info.directories;
            content_info.files += child_info.files;
        }

        Self {
            name: virtual_name.clone(),
            date,
            content_info,
            dirs,
            files,
        }
    }

    /// Writes this node as a `<Directory>` element. `depth_budget` bounds
    /// how much of the merge tree gets descended into: `None` writes
    /// everything, `Some(0)` writes this node as a self-closing, summary-only
    /// stub (the behavior a non-recursive listing wants for anything past
    /// the requested path's direct children).
    fn write_xml(&self, writer: &mut Writer<impl Write>, depth_budget: Option<usize>) -> quick_xml::Result<()> {
        let mut start = BytesStart::new("Directory");
        start.push_attribute(("Name", self.name.normal()));
        start.push_attribute(("Date", self.date.to_string().as_str()));

        if depth_budget == Some(0) {
            start.push_attribute(("Incomplete", "1"));
            start.push_attribute(("Files", self.content_info.files.to_string().as_str()));
            start.push_attribute(("Directories", self.content_info.directories.to_string().as_str()));
            writer.write_event(Event::Empty(start))?;
            return Ok(());
        }

        writer.write_event(Event::Start(start))?;
        let child_budget = depth_budget.map(|d| d - 1);
        for child in &self.dirs {
            child.write_xml(writer, child_budget)?;
        }
        for file in &self.files {
            write_file_element(writer, file)?;
        }
        writer.write_event(Event::End(BytesEnd::new("Directory")))?;
        Ok(())
    }

    /// Writes just this node's direct files and children, without a
    /// wrapping `<Directory>` element — used for the document body, whose
    /// containing path is already named by the header's `Base` attribute.
    fn write_children(&self, writer: &mut Writer<impl Write>, depth_budget: Option<usize>) -> quick_xml::Result<()> {
        for file in &self.files {
            write_file_element(writer, file)?;
        }
        for child in &self.dirs {
            child.write_xml(writer, depth_budget)?;
        }
        Ok(())
    }
}

fn write_file_element(writer: &mut Writer<impl Write>, file: &MergedFile) -> quick_xml::Result<()> {
    let mut start = BytesStart::new("File");
    start.push_attribute(("Name", file.name.normal()));
    start.push_attribute(("Size", file.size.to_string().as_str()));
    start.push_attribute(("TTH", file.tth.to_base32().as_str()));
    writer.write_event(Event::Empty(start))
}

/// `ShareTree::toFilelist`: the full `<FileListing>` document for
/// `share_dirs` (the directories, across all contributing roots, that the
/// caller has already resolved `base_path` to), written to `out`.
pub fn write_filelist(
    out: &mut impl Write,
    cid: &CID,
    base_path: &str,
    share_dirs: &[&ShareDirectory],
    recursive: bool,
    generator: &str,
    dup: &mut DuplicateHandler,
) -> EngineResult<()> {
    if share_dirs.is_empty() {
        return Err(EngineError::Filelist("no directories to list".into()));
    }
    let depth_budget = if recursive { None } else { Some(0) };

    let mut writer = Writer::new_with_indent(out, b' ', 2);
    let base_date = share_dirs.iter().map(|d| d.last_write).max().unwrap_or(0);

    let mut header = BytesStart::new("FileListing");
    header.push_attribute(("Version", "1"));
    header.push_attribute(("CID", cid.to_base32().as_str()));
    header.push_attribute(("Base", base_path));
    header.push_attribute(("BaseDate", base_date.to_string().as_str()));
    header.push_attribute(("Generator", generator));
    writer.write_event(Event::Start(header)).map_err(xml_err)?;

    if base_path == "/" {
        // The root's direct children are the per-profile share roots
        // themselves; each is merged individually (roots are never merged
        // with each other even if two happen to share a virtual name at
        // the top level, since each is a distinct profile-visible entry).
        for share_dir in share_dirs {
            let single = [*share_dir];
            let node = FilelistDirectory::generate_root(share_dir.name(), &single, dup);
            node.write_xml(&mut writer, depth_budget).map_err(xml_err)?;
        }
    } else {
        let virtual_name = share_dirs[0].name().clone();
        let node = FilelistDirectory::generate_root(&virtual_name, share_dirs, dup);
        node.write_children(&mut writer, depth_budget).map_err(xml_err)?;
    }

    writer.write_event(Event::End(BytesEnd::new("FileListing"))).map_err(xml_err)?;
    Ok(())
}

fn xml_err(e: quick_xml::Error) -> EngineError {
    EngineError::Filelist(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str, size: i64, tth_byte: u8) -> crate::share::ShareFile {
        crate::share::ShareFile::new(DualString::new(name), size, TTHValue::new([tth_byte; 24]), 1000)
    }

    #[test]
    fn duplicate_filename_keeps_first_added_and_fires_callback() {
        let mut a = ShareDirectory::new(DualString::new("Movies"), 1000);
        a.add_file(file("matrix.mkv", 100, 1));

        let mut b = ShareDirectory::new(DualString::new("Movies"), 1000);
        b.add_file(file("matrix.mkv", 200, 2));

        let mut duplicate_names = Vec::new();
        let mut dup = |name: &str, _tth: &str| duplicate_names.push(name.to_string());
        let merged = FilelistDirectory::generate_root(a.name(), &[&a, &b], &mut dup);

        assert_eq!(merged.files.len(), 1);
        assert_eq!(merged.files[0].size, 100);
        assert_eq!(duplicate_names, vec!["matrix.mkv"]);
    }

    #[test]
    fn non_recursive_write_marks_children_incomplete_without_nested_content() {
        let mut root = ShareDirectory::new(DualString::new("Movies"), 1000);
        let mut action = ShareDirectory::new(DualString::new("Action"), 1000);
        action.add_file(file("a.mkv", 1, 3));
        root.add_directory(action);

        let mut out = Vec::new();
        let mut dup = |_: &str, _: &str| {};
        write_filelist(&mut out, &CID([0u8; 24]), "/Movies/", &[&root], false, "airshare 0.1", &mut dup).unwrap();

        let xml = String::from_utf8(out).unwrap();
        assert!(xml.contains("Incomplete=\"1\""));
        assert!(xml.contains("Name=\"Action\""));
        assert!(!xml.contains("a.mkv"));
    }

    #[test]
    fn recursive_write_includes_nested_files_without_incomplete() {
        let mut root = ShareDirectory::new(DualString::new("Movies"), 1000);
        let mut action = ShareDirectory::new(DualString::new("Action"), 1000);
        action.add_file(file("a.mkv", 1, 3));
        root.add_directory(action);

        let mut out = Vec::new();
        let mut dup = |_: &str, _: &str| {};
        write_filelist(&mut out, &CID([0u8; 24]), "/Movies/", &[&root], true, "airshare 0.1", &mut dup).unwrap();

        let xml = String::from_utf8(out).unwrap();
        assert!(!xml.contains("Incomplete"));
        assert!(xml.contains("a.mkv"));
    }

    #[test]
    fn write_filelist_produces_well_formed_header() {
        let mut root = ShareDirectory::new(DualString::new("Movies"), 1000);
        root.add_file(file("matrix.mkv", 100, 4));

        let mut out = Vec::new();
        let mut dup = |_: &str, _: &str| {};
        write_filelist(&mut out, &CID([0u8; 24]), "/Movies/", &[&root], true, "airshare 0.1", &mut dup).unwrap();

        let xml = String::from_utf8(out).unwrap();
        assert!(xml.contains("<FileListing"));
        assert!(xml.contains("Version=\"1\""));
        assert!(xml.contains("matrix.mkv"));
    }
}
