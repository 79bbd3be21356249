//! Small directory-listing helpers shared by the scanners.
//!
//! All listings are non-recursive and sorted by file name so that every run
//! visits files in the same order.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use walkdir::WalkDir;

use crate::error::LabelprepError;

/// Entries found directly inside one directory.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DirListing {
    /// Matching entries, sorted by file name.
    pub paths: Vec<PathBuf>,
    /// Matching entries whose metadata could not be read, such as dangling
    /// symlinks. They are left out of `paths`.
    pub unreadable: Vec<UnreadableEntry>,
}

/// A directory entry that could not be inspected.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnreadableEntry {
    pub path: PathBuf,
    pub message: String,
}

/// List regular files directly inside `dir` whose extension is in `extensions`
/// (ASCII case-insensitive), sorted by file name.
///
/// Only a failure to open `dir` itself is an error. Entries that cannot be
/// inspected are collected in [`DirListing::unreadable`] when their name
/// carries one of the wanted extensions.
pub fn list_files_with_extensions(
    dir: &Path,
    extensions: &[&str],
) -> Result<DirListing, LabelprepError> {
    shallow_listing(
        dir,
        |entry| entry.file_type().is_file() && has_extension(entry.path(), extensions),
        |path| has_extension(path, extensions),
    )
}

/// List subdirectories directly inside `dir`, sorted by name.
pub fn list_subdirs(dir: &Path) -> Result<DirListing, LabelprepError> {
    shallow_listing(dir, |entry| entry.file_type().is_dir(), |_| true)
}

fn shallow_listing(
    dir: &Path,
    keep: impl Fn(&walkdir::DirEntry) -> bool,
    keep_unreadable: impl Fn(&Path) -> bool,
) -> Result<DirListing, LabelprepError> {
    let mut listing = DirListing::default();

    let walk = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name();

    for entry in walk {
        match entry {
            Ok(entry) if keep(&entry) => listing.paths.push(entry.into_path()),
            Ok(_) => {}
            Err(err) if err.depth() == 0 => return Err(walk_error(dir, err)),
            Err(err) => {
                let path = err.path().unwrap_or(dir).to_path_buf();
                if keep_unreadable(&path) {
                    listing.unreadable.push(UnreadableEntry {
                        path,
                        message: err.to_string(),
                    });
                }
            }
        }
    }

    Ok(listing)
}

/// Absolute form of `path` with `.`, `..` and symlinks resolved.
///
/// Components that do not exist yet are kept as written, so this also works
/// for an output directory that has not been created.
pub fn resolve_path(path: &Path) -> io::Result<PathBuf> {
    let mut resolved = PathBuf::new();
    for component in std::path::absolute(path)?.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                resolved.pop();
            }
            other => {
                resolved.push(other);
                if let Ok(canonical) = fs::canonicalize(&resolved) {
                    resolved = canonical;
                }
            }
        }
    }
    Ok(resolved)
}

/// File name with its final extension removed.
///
/// This is the join key between an image and its label file.
pub fn base_name(path: &Path) -> Option<String> {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
}

/// File name as a lossy UTF-8 string, for reports and diagnostics.
pub fn file_name_string(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

pub fn has_extension(path: &Path, allowed: &[&str]) -> bool {
    let Some(ext) = path.extension().and_then(|ext| ext.to_str()) else {
        return false;
    };

    allowed
        .iter()
        .any(|allowed_ext| ext.eq_ignore_ascii_case(allowed_ext))
}

fn walk_error(dir: &Path, source: walkdir::Error) -> LabelprepError {
    LabelprepError::DirectoryWalk {
        path: dir.to_path_buf(),
        message: source.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn has_extension_ignores_ascii_case() {
        assert!(has_extension(Path::new("a/IMG_01.JPG"), &["jpg"]));
        assert!(has_extension(Path::new("b.Png"), &["jpg", "png"]));
        assert!(!has_extension(Path::new("c.gif"), &["jpg", "png"]));
        assert!(!has_extension(Path::new("no_extension"), &["jpg"]));
    }

    #[test]
    fn base_name_strips_only_final_extension() {
        assert_eq!(
            base_name(Path::new("labels/carrot_train_001.txt")).as_deref(),
            Some("carrot_train_001")
        );
        assert_eq!(
            base_name(Path::new("archive.tar.gz")).as_deref(),
            Some("archive.tar")
        );
    }

    #[test]
    fn listing_is_sorted_and_shallow() {
        let temp = tempfile::tempdir().expect("create temp dir");
        fs::write(temp.path().join("b.txt"), "").expect("write b");
        fs::write(temp.path().join("a.txt"), "").expect("write a");
        fs::write(temp.path().join("c.jpg"), "").expect("write c");
        fs::create_dir_all(temp.path().join("nested")).expect("create nested");
        fs::write(temp.path().join("nested/d.txt"), "").expect("write d");

        let files = list_files_with_extensions(temp.path(), &["txt"]).expect("list files");
        let names: Vec<String> = files.paths.iter().map(|p| file_name_string(p)).collect();
        assert_eq!(names, vec!["a.txt", "b.txt"]);
        assert!(files.unreadable.is_empty());

        let dirs = list_subdirs(temp.path()).expect("list dirs");
        assert_eq!(dirs.paths, vec![temp.path().join("nested")]);
    }

    #[test]
    fn listing_missing_directory_is_an_error() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let err = list_files_with_extensions(&temp.path().join("nope"), &["txt"]).unwrap_err();
        assert!(matches!(err, LabelprepError::DirectoryWalk { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn dangling_symlink_is_set_aside_not_fatal() {
        let temp = tempfile::tempdir().expect("create temp dir");
        fs::write(temp.path().join("a.txt"), "").expect("write a");
        std::os::unix::fs::symlink(temp.path().join("gone.txt"), temp.path().join("b.txt"))
            .expect("create b link");
        std::os::unix::fs::symlink(temp.path().join("gone.bin"), temp.path().join("c.bin"))
            .expect("create c link");
        fs::write(temp.path().join("d.txt"), "").expect("write d");

        let files = list_files_with_extensions(temp.path(), &["txt"]).expect("list files");
        let names: Vec<String> = files.paths.iter().map(|p| file_name_string(p)).collect();
        assert_eq!(names, vec!["a.txt", "d.txt"]);
        assert_eq!(files.unreadable.len(), 1);
        assert_eq!(files.unreadable[0].path, temp.path().join("b.txt"));
    }

    #[test]
    fn resolve_path_collapses_parent_components() {
        let temp = tempfile::tempdir().expect("create temp dir");
        fs::create_dir_all(temp.path().join("data/raw")).expect("create raw dir");
        let root = fs::canonicalize(temp.path()).expect("canonical temp dir");

        let resolved = resolve_path(&temp.path().join("x/../data")).expect("resolve");
        assert_eq!(resolved, root.join("data"));

        let not_yet = resolve_path(&temp.path().join("data/./new/out")).expect("resolve");
        assert_eq!(not_yet, root.join("data/new/out"));
    }

    #[cfg(unix)]
    #[test]
    fn resolve_path_follows_symlinks() {
        let temp = tempfile::tempdir().expect("create temp dir");
        fs::create_dir_all(temp.path().join("real")).expect("create real dir");
        std::os::unix::fs::symlink(temp.path().join("real"), temp.path().join("alias"))
            .expect("create alias");
        let root = fs::canonicalize(temp.path()).expect("canonical temp dir");

        let resolved = resolve_path(&temp.path().join("alias/out")).expect("resolve");
        assert_eq!(resolved, root.join("real/out"));
    }
}
