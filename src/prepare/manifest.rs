//! `data.yaml` manifest consumed by the training stage.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::LabelprepError;
use crate::label::ClassTable;
use crate::layout::Split;

/// Layout and class table of a prepared dataset.
///
/// Field order is the key order written to disk.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetManifest {
    /// Absolute dataset root.
    pub path: String,
    /// Training images, relative to `path`.
    pub train: String,
    /// Validation images, relative to `path`.
    pub val: String,
    /// Number of classes.
    pub nc: usize,
    /// Class names in class-id order.
    pub names: Vec<String>,
}

impl DatasetManifest {
    pub fn new(absolute_root: &Path, classes: &ClassTable) -> Self {
        Self {
            path: absolute_root.to_string_lossy().into_owned(),
            train: Split::Train.manifest_images_path(),
            val: Split::Validation.manifest_images_path(),
            nc: classes.len(),
            names: classes.names().to_vec(),
        }
    }

    pub fn to_yaml(&self) -> Result<String, LabelprepError> {
        serde_yaml::to_string(self).map_err(LabelprepError::ManifestSerialize)
    }

    pub fn write(&self, path: &Path) -> Result<(), LabelprepError> {
        let yaml = self.to_yaml()?;
        fs::write(path, yaml).map_err(|source| LabelprepError::ManifestWrite {
            path: path.to_path_buf(),
            source,
        })
    }
}
