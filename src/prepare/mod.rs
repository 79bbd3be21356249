//! Dataset preparation.
//!
//! Matches exported per-split label files to raw images by base name, copies
//! each matched pair unmodified into `<output>/{train,val}/{images,labels}`,
//! counts object instances per class and writes a `data.yaml` manifest.
//!
//! The output root is destroyed and recreated at the start of every run, so
//! preparing twice from unchanged inputs produces an identical tree.

mod manifest;
mod report;

pub use manifest::DatasetManifest;
pub use report::{
    FileSkipReason, PrepareIssue, PrepareIssueCode, PrepareReport, SkippedFile, SplitSummary,
};

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::LabelprepError;
use crate::fsutil::{base_name, file_name_string, list_files_with_extensions, resolve_path};
use crate::label::{tally_label_file, ClassCounts, ClassTable, GeometryPolicy, LabelTally};
use crate::layout::{OutputLayout, Split, LABEL_EXTENSION};
use crate::raw_images::RawImageSet;

/// Inputs for one preparation run.
#[derive(Clone, Debug)]
pub struct PrepareOptions {
    /// Flat directory of raw images.
    pub raw_images_dir: PathBuf,
    /// Export root containing `labels/train` and `labels/validation`.
    pub export_root: PathBuf,
    /// Dataset root to reset and populate.
    pub output_root: PathBuf,
    pub classes: ClassTable,
    pub geometry: GeometryPolicy,
}

/// Run totals shared across splits.
struct RunTotals {
    overall: ClassCounts,
    malformed_lines: usize,
    out_of_range_lines: usize,
    skipped: Vec<SkippedFile>,
}

/// Prepare a train/val dataset from raw images and exported labels.
///
/// Only a missing raw-images directory or a failure to reset the output
/// root or write the manifest is an error. Problems with individual files
/// and lines are recorded in the returned report.
pub fn prepare_dataset(opts: &PrepareOptions) -> Result<PrepareReport, LabelprepError> {
    let raw_images = RawImageSet::scan(&opts.raw_images_dir)?;

    ensure_output_is_not_input(opts)?;
    let layout = OutputLayout::new(&opts.output_root);
    reset_output_root(&layout)?;

    let mut issues = Vec::new();
    for collision in raw_images.collisions() {
        issues.push(PrepareIssue {
            code: PrepareIssueCode::BaseNameCollision,
            message: format!(
                "'{}' and '{}' share base name '{}'; using '{}'",
                collision.kept.display(),
                collision.ignored.display(),
                collision.base_name,
                collision.kept.display()
            ),
        });
    }
    for entry in raw_images.unreadable() {
        issues.push(PrepareIssue {
            code: PrepareIssueCode::UnreadableRawImage,
            message: format!("'{}' ignored: {}", entry.path.display(), entry.message),
        });
    }
    for name in opts.classes.duplicate_names() {
        warn!(class = name, "class name appears more than once in the class table");
        issues.push(PrepareIssue {
            code: PrepareIssueCode::DuplicateClassName,
            message: format!("class name '{name}' appears more than once"),
        });
    }

    let mut totals = RunTotals {
        overall: opts.classes.zeroed_counts(),
        malformed_lines: 0,
        out_of_range_lines: 0,
        skipped: Vec::new(),
    };

    let splits: Vec<SplitSummary> = Split::ALL
        .into_iter()
        .map(|split| prepare_split(split, opts, &raw_images, &layout, &mut totals, &mut issues))
        .collect();

    let accepted: usize = splits.iter().map(|s| s.accepted_images).sum();
    let manifest_path = if accepted == 0 {
        info!("No annotated images were processed; not writing a manifest");
        None
    } else {
        let absolute_root = std::path::absolute(layout.root())?;
        let manifest = DatasetManifest::new(&absolute_root, &opts.classes);
        let path = layout.manifest_path();
        manifest.write(&path)?;
        info!("data.yaml created at '{}'", path.display());
        Some(path)
    };

    Ok(PrepareReport {
        output_root: opts.output_root.clone(),
        raw_images: raw_images.len(),
        splits,
        skipped: totals.skipped,
        overall: totals.overall.entries(&opts.classes),
        malformed_lines: totals.malformed_lines,
        out_of_range_lines: totals.out_of_range_lines,
        manifest_path,
        issues,
    })
}

fn prepare_split(
    split: Split,
    opts: &PrepareOptions,
    raw_images: &RawImageSet,
    layout: &OutputLayout,
    totals: &mut RunTotals,
    issues: &mut Vec<PrepareIssue>,
) -> SplitSummary {
    let labels_dir = split.export_labels_dir(&opts.export_root);
    let mut summary = SplitSummary {
        split,
        labels_dir: labels_dir.clone(),
        found: labels_dir.is_dir(),
        accepted_images: 0,
        objects: 0,
        per_class: Vec::new(),
    };
    let mut counts = opts.classes.zeroed_counts();

    let label_files = if summary.found {
        match list_files_with_extensions(&labels_dir, &[LABEL_EXTENSION]) {
            Ok(listing) => {
                for entry in listing.unreadable {
                    let reason = FileSkipReason::LabelReadFailed {
                        message: entry.message,
                    };
                    record_skip(totals, split, file_name_string(&entry.path), reason);
                }
                listing.paths
            }
            Err(err) => {
                warn!("Could not list {} labels: {err}", split);
                issues.push(PrepareIssue {
                    code: PrepareIssueCode::SplitDirUnreadable,
                    message: err.to_string(),
                });
                Vec::new()
            }
        }
    } else {
        warn!(
            "{} labels directory not found: {}",
            split,
            labels_dir.display()
        );
        issues.push(PrepareIssue {
            code: PrepareIssueCode::MissingSplitDir,
            message: format!(
                "{} labels directory not found: {}",
                split,
                labels_dir.display()
            ),
        });
        Vec::new()
    };

    for label_path in label_files {
        let label_file = file_name_string(&label_path);
        match accept_label_file(&label_path, split, opts, raw_images, layout) {
            Ok(tally) => {
                debug!(file = %label_file, %split, objects = tally.objects, "accepted");
                counts.merge(&tally.counts);
                summary.objects += tally.objects;
                summary.accepted_images += 1;
                totals.malformed_lines += tally.malformed_lines();
                totals.out_of_range_lines += tally.out_of_range_lines();
            }
            Err(reason) => record_skip(totals, split, label_file, reason),
        }
    }

    totals.overall.merge(&counts);
    summary.per_class = counts.entries(&opts.classes);
    summary
}

fn record_skip(totals: &mut RunTotals, split: Split, label_file: String, reason: FileSkipReason) {
    warn!("Label '{}' in {} export: {}. Skipping.", label_file, split, reason);
    totals.skipped.push(SkippedFile {
        split,
        label_file,
        reason,
    });
}

/// Tally and copy one label file and its image.
///
/// The tally is only returned once both copies succeeded, so a skipped file
/// never contributes to any count.
fn accept_label_file(
    label_path: &Path,
    split: Split,
    opts: &PrepareOptions,
    raw_images: &RawImageSet,
    layout: &OutputLayout,
) -> Result<LabelTally, FileSkipReason> {
    let image_path = base_name(label_path)
        .and_then(|base| raw_images.get(&base))
        .ok_or(FileSkipReason::MissingImage)?;

    let tally = tally_label_file(label_path, &opts.classes, opts.geometry).map_err(|err| {
        FileSkipReason::LabelReadFailed {
            message: err.to_string(),
        }
    })?;

    let copied_label = copy_into(label_path, &layout.labels_dir(split))?;
    if let Err(reason) = copy_into(image_path, &layout.images_dir(split)) {
        // Keep the output tree pairwise consistent.
        let _ = fs::remove_file(&copied_label);
        return Err(reason);
    }

    Ok(tally)
}

fn copy_into(source: &Path, dir: &Path) -> Result<PathBuf, FileSkipReason> {
    let file_name = source
        .file_name()
        .ok_or_else(|| FileSkipReason::CopyFailed {
            message: format!("'{}' has no file name", source.display()),
        })?;
    let target = dir.join(file_name);

    fs::copy(source, &target).map_err(|err| FileSkipReason::CopyFailed {
        message: format!("{} -> {}: {err}", source.display(), target.display()),
    })?;
    Ok(target)
}

/// Refuse to reset an output root that contains one of the inputs.
///
/// Both sides are compared after resolving `..` and symlinks.
fn ensure_output_is_not_input(opts: &PrepareOptions) -> Result<(), LabelprepError> {
    let output = resolve_path(&opts.output_root)?;
    for (label, input) in [
        ("raw images directory", &opts.raw_images_dir),
        ("export root", &opts.export_root),
    ] {
        let input = resolve_path(input)?;
        if input.starts_with(&output) {
            return Err(LabelprepError::ConfigInvalid {
                message: format!(
                    "output root '{}' contains the {label} '{}'; refusing to reset it",
                    opts.output_root.display(),
                    input.display()
                ),
            });
        }
    }
    Ok(())
}

fn reset_output_root(layout: &OutputLayout) -> Result<(), LabelprepError> {
    let root = layout.root();
    if root.exists() {
        info!("Cleaning existing output directory: {}", root.display());
        let removed = if root.is_dir() {
            fs::remove_dir_all(root)
        } else {
            fs::remove_file(root)
        };
        removed.map_err(|source| LabelprepError::OutputResetFailed {
            path: root.to_path_buf(),
            source,
        })?;
    }

    for dir in layout.all_dirs() {
        fs::create_dir_all(&dir)
            .map_err(|source| LabelprepError::OutputResetFailed { path: dir, source })?;
    }

    Ok(())
}
