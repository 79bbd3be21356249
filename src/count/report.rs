//! Count report types and terminal formatting.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::label::ClassCountEntry;
use crate::layout::Split;

/// The result of auditing an annotation export.
#[derive(Clone, Debug, Serialize)]
pub struct CountReport {
    pub export_root: PathBuf,
    /// Uniform per-class instance target.
    pub target_per_class: usize,
    /// Objects across both splits.
    pub total_objects: usize,
    /// True when every class reached the target.
    pub all_targets_met: bool,
    /// Per-split results, train first.
    pub splits: Vec<SplitCount>,
    /// Per-class totals and target status, in class-table order.
    pub classes: Vec<ClassProgress>,
    pub malformed_lines: usize,
    pub out_of_range_lines: usize,
    /// Label files that could not be read.
    pub unreadable_files: Vec<UnreadableFile>,
    /// Names listed more than once in the class table.
    pub duplicate_class_names: Vec<String>,
}

impl CountReport {
    pub fn split(&self, split: Split) -> Option<&SplitCount> {
        self.splits.iter().find(|s| s.split == split)
    }

    pub fn class(&self, name: &str) -> Option<&ClassProgress> {
        self.classes.iter().find(|c| c.name == name)
    }

    /// Classes still below target.
    pub fn classes_below_target(&self) -> impl Iterator<Item = &ClassProgress> {
        self.classes.iter().filter(|c| !c.target_met)
    }
}

/// Counts for one split.
#[derive(Clone, Debug, Serialize)]
pub struct SplitCount {
    pub split: Split,
    pub labels_dir: PathBuf,
    /// Whether the export label directory existed.
    pub found: bool,
    pub files_scanned: usize,
    pub total_objects: usize,
    pub per_class: Vec<ClassCountEntry>,
    /// Objects per label file, in file-name order.
    pub files: Vec<FileObjectCount>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FileObjectCount {
    pub file: String,
    pub objects: usize,
}

/// Overall count and target status for one class.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ClassProgress {
    pub id: usize,
    pub name: String,
    pub train: usize,
    pub validation: usize,
    pub overall: usize,
    pub target_met: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct UnreadableFile {
    pub split: Split,
    pub file: String,
    pub message: String,
}

impl fmt::Display for CountReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Annotation Summary Across Splits ---")?;

        for split in &self.splits {
            writeln!(f)?;
            let heading = match split.split {
                Split::Train => "Train",
                Split::Validation => "Validation",
            };
            writeln!(
                f,
                "{} Split (Files: {}, Total Objects: {}):",
                heading, split.files_scanned, split.total_objects
            )?;
            if !split.found {
                writeln!(f, "  Labels directory not found: {}", split.labels_dir.display())?;
            } else if split.total_objects == 0 {
                writeln!(f, "  No objects found in the {} annotations.", split.split)?;
            } else {
                for entry in &split.per_class {
                    writeln!(f, "  {} (ID {}): {} objects", entry.name, entry.id, entry.count)?;
                }
            }
        }

        writeln!(f)?;
        writeln!(f, "Overall Total Objects: {}", self.total_objects)?;
        if self.total_objects > 0 {
            for class in &self.classes {
                writeln!(f, "  {} (ID {}): {} objects", class.name, class.id, class.overall)?;
            }
        }

        if self.malformed_lines > 0 || self.out_of_range_lines > 0 {
            writeln!(
                f,
                "Ignored {} malformed line(s) and {} out-of-range class id(s).",
                self.malformed_lines, self.out_of_range_lines
            )?;
        }
        if !self.unreadable_files.is_empty() {
            writeln!(f, "Unreadable label files ({}):", self.unreadable_files.len())?;
            for file in &self.unreadable_files {
                writeln!(f, "  - [{}] {}: {}", file.split, file.file, file.message)?;
            }
        }

        if !self.duplicate_class_names.is_empty() {
            writeln!(
                f,
                "Class names listed more than once: {}",
                self.duplicate_class_names.join(", ")
            )?;
        }

        writeln!(f)?;
        writeln!(f, "--- Annotation Progress ---")?;
        for class in &self.classes {
            if class.target_met {
                writeln!(
                    f,
                    "  {} target met: {} / {} objects.",
                    class.name, class.overall, self.target_per_class
                )?;
            } else {
                writeln!(
                    f,
                    "  Needs more {}: Currently {}, target {}.",
                    class.name, class.overall, self.target_per_class
                )?;
            }
        }

        writeln!(f)?;
        if self.all_targets_met {
            writeln!(f, "All target instance counts have been met!")
        } else {
            writeln!(f, "Continue annotating to meet targets for all classes.")
        }
    }
}
