//! Directory layout of annotation exports and prepared datasets.
//!
//! Exports keep one label directory per split under `labels/`. Prepared
//! datasets use the Ultralytics layout: `<root>/{train,val}/{images,labels}`
//! plus a `data.yaml` manifest at the root.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

/// File name of the dataset manifest written at the output root.
pub const MANIFEST_FILE_NAME: &str = "data.yaml";

/// Extension of exported label files.
pub const LABEL_EXTENSION: &str = "txt";

/// Which half of the dataset an annotation file belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Split {
    Train,
    Validation,
}

impl Split {
    /// Splits in processing order.
    pub const ALL: [Split; 2] = [Split::Train, Split::Validation];

    /// Subdirectory name under `<export_root>/labels/`.
    pub fn export_dir_name(self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Validation => "validation",
        }
    }

    /// Subdirectory name under the prepared output root.
    pub fn output_dir_name(self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Validation => "val",
        }
    }

    /// `<export_root>/labels/<split>`.
    pub fn export_labels_dir(self, export_root: &Path) -> PathBuf {
        export_root.join("labels").join(self.export_dir_name())
    }

    /// Manifest-relative image path, e.g. `val/images`.
    pub fn manifest_images_path(self) -> String {
        format!("{}/images", self.output_dir_name())
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.export_dir_name())
    }
}

/// Paths inside a prepared dataset root.
#[derive(Clone, Debug)]
pub struct OutputLayout {
    root: PathBuf,
}

impl OutputLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn images_dir(&self, split: Split) -> PathBuf {
        self.root.join(split.output_dir_name()).join("images")
    }

    pub fn labels_dir(&self, split: Split) -> PathBuf {
        self.root.join(split.output_dir_name()).join("labels")
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.root.join(MANIFEST_FILE_NAME)
    }

    /// Every directory a prepared dataset contains.
    pub fn all_dirs(&self) -> Vec<PathBuf> {
        Split::ALL
            .iter()
            .flat_map(|&split| [self.images_dir(split), self.labels_dir(split)])
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn export_and_output_names_differ_for_validation() {
        assert_eq!(Split::Validation.export_dir_name(), "validation");
        assert_eq!(Split::Validation.output_dir_name(), "val");
        assert_eq!(
            Split::Validation.export_labels_dir(Path::new("exports")),
            Path::new("exports/labels/validation")
        );
        assert_eq!(Split::Train.manifest_images_path(), "train/images");
        assert_eq!(Split::Validation.manifest_images_path(), "val/images");
    }

    #[test]
    fn output_layout_lists_all_split_dirs() {
        let layout = OutputLayout::new("data");
        assert_eq!(
            layout.all_dirs(),
            vec![
                PathBuf::from("data/train/images"),
                PathBuf::from("data/train/labels"),
                PathBuf::from("data/val/images"),
                PathBuf::from("data/val/labels"),
            ]
        );
        assert_eq!(layout.manifest_path(), PathBuf::from("data/data.yaml"));
    }
}
