//! Preparation report types and terminal formatting.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::label::ClassCountEntry;
use crate::layout::Split;

/// The outcome of one dataset preparation run.
#[derive(Clone, Debug, Serialize)]
pub struct PrepareReport {
    /// Dataset root that was reset and populated.
    pub output_root: PathBuf,
    /// Number of raw images indexed.
    pub raw_images: usize,
    /// Per-split results, train first.
    pub splits: Vec<SplitSummary>,
    /// Label files that were not copied (one per skipped image).
    pub skipped: Vec<SkippedFile>,
    /// Instances per class across both splits, in class-table order.
    pub overall: Vec<ClassCountEntry>,
    /// Lines skipped for having too few fields or a non-integer class id.
    pub malformed_lines: usize,
    /// Lines skipped for a class id outside the class table.
    pub out_of_range_lines: usize,
    /// Manifest location; `None` when no images were accepted.
    pub manifest_path: Option<PathBuf>,
    /// Run-level notes that did not stop preparation.
    pub issues: Vec<PrepareIssue>,
}

impl PrepareReport {
    /// Images accepted across both splits.
    pub fn accepted_images(&self) -> usize {
        self.splits.iter().map(|split| split.accepted_images).sum()
    }

    pub fn skipped_images(&self) -> usize {
        self.skipped.len()
    }

    /// True when nothing was accepted and no manifest was written.
    pub fn is_empty(&self) -> bool {
        self.accepted_images() == 0
    }

    pub fn split(&self, split: Split) -> Option<&SplitSummary> {
        self.splits.iter().find(|summary| summary.split == split)
    }

    /// Overall instance count for a class name, if the class exists.
    pub fn class_count(&self, name: &str) -> Option<usize> {
        self.overall
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| entry.count)
    }
}

/// Results for one split.
#[derive(Clone, Debug, Serialize)]
pub struct SplitSummary {
    pub split: Split,
    /// Export label directory that was scanned.
    pub labels_dir: PathBuf,
    /// Whether the export label directory existed.
    pub found: bool,
    pub accepted_images: usize,
    pub objects: usize,
    pub per_class: Vec<ClassCountEntry>,
}

/// A label file that did not make it into the prepared dataset.
#[derive(Clone, Debug, Serialize)]
pub struct SkippedFile {
    pub split: Split,
    pub label_file: String,
    #[serde(flatten)]
    pub reason: FileSkipReason,
}

/// Why a label file (and its image) was skipped.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum FileSkipReason {
    /// No raw image shares the label's base name.
    MissingImage,
    /// The label file could not be read.
    LabelReadFailed { message: String },
    /// Copying the label or image into the output tree failed.
    CopyFailed { message: String },
}

impl fmt::Display for FileSkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileSkipReason::MissingImage => write!(f, "no corresponding raw image"),
            FileSkipReason::LabelReadFailed { message } => {
                write!(f, "failed to read label file: {message}")
            }
            FileSkipReason::CopyFailed { message } => write!(f, "copy failed: {message}"),
        }
    }
}

/// A run-level note.
#[derive(Clone, Debug, Serialize)]
pub struct PrepareIssue {
    pub code: PrepareIssueCode,
    pub message: String,
}

/// A stable code identifying the type of preparation note.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum PrepareIssueCode {
    /// An export split directory was absent; the split contributed nothing.
    MissingSplitDir,
    /// An export split directory could not be listed.
    SplitDirUnreadable,
    /// Two raw images share a base name; only the first is used.
    BaseNameCollision,
    /// A raw image entry could not be inspected and was ignored.
    UnreadableRawImage,
    /// The class table lists the same name more than once.
    DuplicateClassName,
}

impl fmt::Display for PrepareReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count_of = |split: Split| self.split(split).map_or(0, |s| s.accepted_images);

        writeln!(f, "--- Dataset Preparation Summary ---")?;
        writeln!(
            f,
            "Annotated and prepared: {} training images, {} validation images.",
            count_of(Split::Train),
            count_of(Split::Validation)
        )?;
        writeln!(f, "Total objects per class:")?;
        for entry in &self.overall {
            writeln!(f, "  {} (ID {}): {} objects", entry.name, entry.id, entry.count)?;
        }
        writeln!(
            f,
            "Skipped {} images (missing from raw images or error during processing).",
            self.skipped_images()
        )?;

        if self.malformed_lines > 0 || self.out_of_range_lines > 0 {
            writeln!(
                f,
                "Ignored {} malformed line(s) and {} out-of-range class id(s).",
                self.malformed_lines, self.out_of_range_lines
            )?;
        }

        if !self.skipped.is_empty() {
            writeln!(f)?;
            writeln!(f, "Skipped files ({}):", self.skipped.len())?;
            for skipped in &self.skipped {
                writeln!(
                    f,
                    "  - [{}] {}: {}",
                    skipped.split, skipped.label_file, skipped.reason
                )?;
            }
        }

        if !self.issues.is_empty() {
            writeln!(f)?;
            writeln!(f, "Notes ({}):", self.issues.len())?;
            for issue in &self.issues {
                writeln!(f, "  - {:?}: {}", issue.code, issue.message)?;
            }
        }

        writeln!(f)?;
        match &self.manifest_path {
            Some(path) => {
                writeln!(f, "data.yaml created at '{}'", path.display())?;
                writeln!(
                    f,
                    "Dataset prepared and saved to '{}'",
                    self.output_root.display()
                )?;
            }
            None => writeln!(
                f,
                "No annotated images were processed. '{}' contains no data.",
                self.output_root.display()
            )?,
        }

        Ok(())
    }
}
