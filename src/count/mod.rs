//! Read-only annotation audit.
//!
//! Counts object instances per class and split in an annotation export and
//! compares the overall per-class totals against a uniform target, without
//! touching raw images or any output directory.

mod report;

pub use report::{ClassProgress, CountReport, FileObjectCount, SplitCount, UnreadableFile};

use std::path::PathBuf;

use tracing::{info, warn};

use crate::fsutil::{file_name_string, list_files_with_extensions, DirListing};
use crate::label::{tally_label_file, ClassTable, GeometryPolicy};
use crate::layout::{Split, LABEL_EXTENSION};

/// Instance target used when none is configured.
pub const DEFAULT_TARGET_PER_CLASS: usize = 50;

/// Inputs for an annotation count.
#[derive(Clone, Debug)]
pub struct CountOptions {
    /// Export root containing `labels/train` and `labels/validation`.
    pub export_root: PathBuf,
    pub classes: ClassTable,
    /// Instances wanted for every class, summed over both splits.
    pub target_per_class: usize,
    pub geometry: GeometryPolicy,
}

/// Count annotations in an export without modifying anything on disk.
pub fn count_annotations(opts: &CountOptions) -> CountReport {
    let duplicate_class_names: Vec<String> = opts
        .classes
        .duplicate_names()
        .into_iter()
        .map(|name| {
            warn!(class = name, "class name appears more than once in the class table");
            name.to_string()
        })
        .collect();

    let mut malformed_lines = 0;
    let mut out_of_range_lines = 0;
    let mut unreadable_files = Vec::new();
    let mut overall = opts.classes.zeroed_counts();
    let mut split_counts = Vec::with_capacity(Split::ALL.len());

    for split in Split::ALL {
        let labels_dir = split.export_labels_dir(&opts.export_root);
        let mut counts = opts.classes.zeroed_counts();
        let mut split_count = SplitCount {
            split,
            labels_dir: labels_dir.clone(),
            found: labels_dir.is_dir(),
            files_scanned: 0,
            total_objects: 0,
            per_class: Vec::new(),
            files: Vec::new(),
        };

        if split_count.found {
            info!("Scanning {} annotations in: {}", split, labels_dir.display());
            let listing = list_files_with_extensions(&labels_dir, &[LABEL_EXTENSION])
                .unwrap_or_else(|err| {
                    warn!("Could not list {} labels: {err}", split);
                    DirListing::default()
                });
            for entry in listing.unreadable {
                let file = file_name_string(&entry.path);
                warn!("Error reading label file {}: {}", file, entry.message);
                split_count.files_scanned += 1;
                unreadable_files.push(UnreadableFile {
                    split,
                    file,
                    message: entry.message,
                });
            }
            let label_files = listing.paths;
            if label_files.is_empty() {
                info!("No .txt annotation files found in {} split.", split);
            }

            for label_path in label_files {
                let file = file_name_string(&label_path);
                split_count.files_scanned += 1;
                match tally_label_file(&label_path, &opts.classes, opts.geometry) {
                    Ok(tally) => {
                        counts.merge(&tally.counts);
                        split_count.total_objects += tally.objects;
                        malformed_lines += tally.malformed_lines();
                        out_of_range_lines += tally.out_of_range_lines();
                        split_count.files.push(FileObjectCount {
                            file,
                            objects: tally.objects,
                        });
                    }
                    Err(err) => {
                        warn!("Error reading label file {}: {err}", file);
                        unreadable_files.push(UnreadableFile {
                            split,
                            file,
                            message: err.to_string(),
                        });
                    }
                }
            }
        } else {
            warn!(
                "{} labels directory not found: {}. No {} annotations counted.",
                split,
                labels_dir.display(),
                split
            );
        }

        overall.merge(&counts);
        split_count.per_class = counts.entries(&opts.classes);
        split_counts.push(split_count);
    }

    let progress: Vec<ClassProgress> = opts
        .classes
        .names()
        .iter()
        .enumerate()
        .map(|(id, name)| {
            let per_split = |split: Split| {
                split_counts
                    .iter()
                    .find(|s| s.split == split)
                    .and_then(|s| s.per_class.get(id))
                    .map_or(0, |entry| entry.count)
            };
            let total = overall.get(id);
            ClassProgress {
                id,
                name: name.clone(),
                train: per_split(Split::Train),
                validation: per_split(Split::Validation),
                overall: total,
                target_met: total >= opts.target_per_class,
            }
        })
        .collect();

    CountReport {
        export_root: opts.export_root.clone(),
        target_per_class: opts.target_per_class,
        total_objects: overall.total(),
        all_targets_met: progress.iter().all(|class| class.target_met),
        splits: split_counts,
        classes: progress,
        malformed_lines,
        out_of_range_lines,
        unreadable_files,
        duplicate_class_names,
    }
}
