//! Flatten per-category raw image folders into one directory.
//!
//! Source trees look like `<root>/<split>/<category>/<image>`. Each image is
//! copied to `<target>/<category>_<split>_<file name>`, giving every raw image
//! a unique, self-describing name before annotation starts. The target
//! directory is created if needed but never cleared.

use std::fmt;
use std::fs;
use std::path::PathBuf;

use serde::Serialize;
use tracing::{info, warn};

use crate::error::LabelprepError;
use crate::fsutil::{
    file_name_string, list_files_with_extensions, list_subdirs, UnreadableEntry,
};

/// Extensions picked up when flattening (ASCII case-insensitive).
pub const FLATTEN_IMAGE_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "gif", "bmp"];

/// Split folders visited when none are configured.
pub const DEFAULT_FLATTEN_SPLITS: [&str; 3] = ["train", "test", "validation"];

#[derive(Clone, Debug)]
pub struct FlattenOptions {
    /// Root containing one folder per split.
    pub source_root: PathBuf,
    /// Flat output directory.
    pub target_dir: PathBuf,
    /// Split folder names, visited in order.
    pub splits: Vec<String>,
}

/// Summary of a flatten run.
#[derive(Clone, Debug, Default, Serialize)]
pub struct FlattenReport {
    pub target_dir: PathBuf,
    pub copied: usize,
    /// Images copied per split and category.
    pub groups: Vec<FlattenGroup>,
    /// Split folders that did not exist under the source root.
    pub missing_splits: Vec<String>,
    pub failures: Vec<FlattenFailure>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FlattenGroup {
    pub split: String,
    pub category: String,
    pub images: usize,
}

#[derive(Clone, Debug, Serialize)]
pub struct FlattenFailure {
    pub source: PathBuf,
    pub message: String,
}

/// Name an image receives in the flat directory.
pub fn flattened_name(category: &str, split: &str, file_name: &str) -> String {
    format!("{category}_{split}_{file_name}")
}

/// Copy every categorised raw image into the flat target directory.
pub fn flatten_raw_images(opts: &FlattenOptions) -> Result<FlattenReport, LabelprepError> {
    if !opts.source_root.is_dir() {
        return Err(LabelprepError::SourceDirMissing {
            path: opts.source_root.clone(),
        });
    }
    fs::create_dir_all(&opts.target_dir)?;

    let mut report = FlattenReport {
        target_dir: opts.target_dir.clone(),
        ..Default::default()
    };

    for split in &opts.splits {
        let split_dir = opts.source_root.join(split);
        if !split_dir.is_dir() {
            warn!("Split folder not found: {}. Skipping.", split_dir.display());
            report.missing_splits.push(split.clone());
            continue;
        }

        let categories = list_subdirs(&split_dir)?;
        report.record_unreadable(categories.unreadable);

        for category_dir in categories.paths {
            let category = file_name_string(&category_dir);
            info!("Processing category: {} in split: {}", category, split);

            let mut group = FlattenGroup {
                split: split.clone(),
                category: category.clone(),
                images: 0,
            };
            let images = list_files_with_extensions(&category_dir, &FLATTEN_IMAGE_EXTENSIONS)?;
            report.record_unreadable(images.unreadable);

            for image in images.paths {
                let target = opts
                    .target_dir
                    .join(flattened_name(&category, split, &file_name_string(&image)));
                match fs::copy(&image, &target) {
                    Ok(_) => group.images += 1,
                    Err(err) => {
                        warn!("Failed to copy {}: {err}", image.display());
                        report.failures.push(FlattenFailure {
                            source: image,
                            message: err.to_string(),
                        });
                    }
                }
            }

            report.copied += group.images;
            report.groups.push(group);
        }
    }

    Ok(report)
}

impl FlattenReport {
    fn record_unreadable(&mut self, entries: Vec<UnreadableEntry>) {
        for entry in entries {
            warn!("Skipping unreadable entry {}: {}", entry.path.display(), entry.message);
            self.failures.push(FlattenFailure {
                source: entry.path,
                message: entry.message,
            });
        }
    }
}

impl fmt::Display for FlattenReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for group in &self.groups {
            writeln!(
                f,
                "  {}/{}: {} image(s)",
                group.split, group.category, group.images
            )?;
        }
        if !self.missing_splits.is_empty() {
            writeln!(f, "Missing split folders: {}", self.missing_splits.join(", "))?;
        }
        if !self.failures.is_empty() {
            writeln!(f, "Failed copies ({}):", self.failures.len())?;
            for failure in &self.failures {
                writeln!(f, "  - {}: {}", failure.source.display(), failure.message)?;
            }
        }
        writeln!(
            f,
            "All raw images flattened and renamed to '{}' ({} copied)",
            self.target_dir.display(),
            self.copied
        )
    }
}
