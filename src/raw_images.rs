//! Index of raw images keyed by base name.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};

use crate::error::LabelprepError;
use crate::fsutil::{base_name, list_files_with_extensions, UnreadableEntry};

/// Extensions recognised as raw images (ASCII case-insensitive).
pub const RAW_IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// Raw images found directly inside one directory.
///
/// Files are visited in file-name order and the first file seen for a base
/// name wins; later files with the same base name are recorded as collisions.
/// Entries that cannot be inspected, such as dangling symlinks, are set aside
/// and never matched.
#[derive(Clone, Debug, Default)]
pub struct RawImageSet {
    images: BTreeMap<String, PathBuf>,
    collisions: Vec<BaseNameCollision>,
    unreadable: Vec<UnreadableEntry>,
}

/// Two raw images sharing a base name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BaseNameCollision {
    pub base_name: String,
    pub kept: PathBuf,
    pub ignored: PathBuf,
}

impl RawImageSet {
    /// Scan `dir` (non-recursively) for raw images.
    ///
    /// A missing directory is fatal: there is nothing to match labels against.
    pub fn scan(dir: &Path) -> Result<Self, LabelprepError> {
        if !dir.is_dir() {
            return Err(LabelprepError::RawImagesDirMissing {
                path: dir.to_path_buf(),
            });
        }

        let listing = list_files_with_extensions(dir, &RAW_IMAGE_EXTENSIONS)?;
        let mut set = Self::default();

        for entry in listing.unreadable {
            warn!(
                "Unreadable raw image '{}': {}. Ignoring it.",
                entry.path.display(),
                entry.message
            );
            set.unreadable.push(entry);
        }

        for path in listing.paths {
            let Some(base) = base_name(&path) else {
                continue;
            };

            match set.images.get(&base) {
                Some(kept) => {
                    warn!(
                        base_name = %base,
                        kept = %kept.display(),
                        ignored = %path.display(),
                        "raw images share a base name; ignoring the later one"
                    );
                    set.collisions.push(BaseNameCollision {
                        base_name: base,
                        kept: kept.clone(),
                        ignored: path,
                    });
                }
                None => {
                    set.images.insert(base, path);
                }
            }
        }

        info!("Found {} images in {}", set.images.len(), dir.display());
        Ok(set)
    }

    pub fn get(&self, base_name: &str) -> Option<&Path> {
        self.images.get(base_name).map(PathBuf::as_path)
    }

    pub fn contains(&self, base_name: &str) -> bool {
        self.images.contains_key(base_name)
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn collisions(&self) -> &[BaseNameCollision] {
        &self.collisions
    }

    /// Image entries that could not be inspected.
    pub fn unreadable(&self) -> &[UnreadableEntry] {
        &self.unreadable
    }
}
