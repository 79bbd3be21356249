//! Layered configuration.
//!
//! Values are resolved from CLI flags (which clap may fill from environment
//! variables), then an optional YAML config file, then built-in defaults.
//! The resolved [`ProjectConfig`] hands each operation an explicit options
//! struct; library code never reads the environment itself.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::count::{CountOptions, DEFAULT_TARGET_PER_CLASS};
use crate::error::LabelprepError;
use crate::flatten::{FlattenOptions, DEFAULT_FLATTEN_SPLITS};
use crate::label::{read_classes_txt, ClassTable, GeometryPolicy};
use crate::prepare::PrepareOptions;

/// Config file picked up from the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "labelprep.yaml";

pub const DEFAULT_RAW_IMAGES_DIR: &str = "raw_images";
pub const DEFAULT_EXPORT_ROOT: &str = "cvat_exports/annotations_v1";
pub const DEFAULT_OUTPUT_ROOT: &str = "data";
pub const DEFAULT_FLATTEN_SOURCE: &str = "data/raw";

/// Contents of a `labelprep.yaml` file. Every key is optional.
///
/// ```yaml
/// raw_images_dir: raw_images
/// export_root: cvat_exports/annotations_v1
/// output_root: data
/// class_names: [carrot, bean, radish]
/// target_per_class: 50
/// flatten:
///   source_root: data/raw
///   splits: [train, test, validation]
/// ```
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub raw_images_dir: Option<PathBuf>,
    pub export_root: Option<PathBuf>,
    pub output_root: Option<PathBuf>,
    pub class_names: Option<Vec<String>>,
    pub classes_file: Option<PathBuf>,
    pub target_per_class: Option<usize>,
    pub strict_geometry: Option<bool>,
    pub flatten: Option<FlattenFileConfig>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FlattenFileConfig {
    pub source_root: Option<PathBuf>,
    pub target_dir: Option<PathBuf>,
    pub splits: Option<Vec<String>>,
}

impl FileConfig {
    pub fn from_yaml_str(yaml: &str, path: &Path) -> Result<Self, LabelprepError> {
        // An empty file deserializes as null; treat it as "no settings".
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml).map_err(|source| LabelprepError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self, LabelprepError> {
        let yaml = fs::read_to_string(path).map_err(|source| LabelprepError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&yaml, path)
    }

    /// Load an explicit config file, or `labelprep.yaml` from the working
    /// directory if present. An explicit path must exist.
    pub fn discover(explicit: Option<&Path>) -> Result<Self, LabelprepError> {
        match explicit {
            Some(path) => Self::load(path),
            None => {
                let fallback = Path::new(DEFAULT_CONFIG_FILE);
                if fallback.is_file() {
                    Self::load(fallback)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }
}

/// Values supplied on the command line (or through clap's `env` fallback).
#[derive(Clone, Debug, Default)]
pub struct Overrides {
    pub raw_images_dir: Option<PathBuf>,
    pub export_root: Option<PathBuf>,
    pub output_root: Option<PathBuf>,
    pub class_names: Option<Vec<String>>,
    pub classes_file: Option<PathBuf>,
    pub target_per_class: Option<usize>,
    pub strict_geometry: Option<bool>,
    pub flatten_source: Option<PathBuf>,
    pub flatten_target: Option<PathBuf>,
    pub flatten_splits: Option<Vec<String>>,
}

/// Where the class table comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClassSource {
    Inline(Vec<String>),
    File(PathBuf),
    Unset,
}

/// Fully resolved configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct ProjectConfig {
    pub raw_images_dir: PathBuf,
    pub export_root: PathBuf,
    pub output_root: PathBuf,
    pub classes: ClassSource,
    pub target_per_class: usize,
    pub geometry: GeometryPolicy,
    pub flatten_source: PathBuf,
    /// Defaults to the raw images directory.
    pub flatten_target: PathBuf,
    pub flatten_splits: Vec<String>,
}

impl ProjectConfig {
    /// Merge overrides onto a file config, falling back to defaults.
    pub fn resolve(file: FileConfig, overrides: Overrides) -> Self {
        let classes = if let Some(names) = overrides.class_names {
            ClassSource::Inline(names)
        } else if let Some(path) = overrides.classes_file {
            ClassSource::File(path)
        } else if let Some(names) = file.class_names {
            ClassSource::Inline(names)
        } else if let Some(path) = file.classes_file {
            ClassSource::File(path)
        } else {
            ClassSource::Unset
        };

        let strict = overrides
            .strict_geometry
            .or(file.strict_geometry)
            .unwrap_or(false);
        let flatten = file.flatten.unwrap_or_default();

        let raw_images_dir = overrides
            .raw_images_dir
            .or(file.raw_images_dir)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_RAW_IMAGES_DIR));

        Self {
            export_root: overrides
                .export_root
                .or(file.export_root)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_EXPORT_ROOT)),
            output_root: overrides
                .output_root
                .or(file.output_root)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_ROOT)),
            classes,
            target_per_class: overrides
                .target_per_class
                .or(file.target_per_class)
                .unwrap_or(DEFAULT_TARGET_PER_CLASS),
            geometry: if strict {
                GeometryPolicy::Strict
            } else {
                GeometryPolicy::Lenient
            },
            flatten_source: overrides
                .flatten_source
                .or(flatten.source_root)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_FLATTEN_SOURCE)),
            flatten_target: overrides
                .flatten_target
                .or(flatten.target_dir)
                .unwrap_or_else(|| raw_images_dir.clone()),
            flatten_splits: overrides
                .flatten_splits
                .or(flatten.splits)
                .unwrap_or_else(|| DEFAULT_FLATTEN_SPLITS.map(String::from).to_vec()),
            raw_images_dir,
        }
    }

    /// Build the class table from whichever source was configured.
    pub fn class_table(&self) -> Result<ClassTable, LabelprepError> {
        match &self.classes {
            ClassSource::Inline(names) => ClassTable::new(names),
            ClassSource::File(path) => read_classes_txt(path),
            ClassSource::Unset => Err(LabelprepError::ConfigInvalid {
                message: "no class names configured; pass --classes, --classes-file, \
                          or set class_names in the config file"
                    .to_string(),
            }),
        }
    }

    pub fn prepare_options(&self) -> Result<PrepareOptions, LabelprepError> {
        Ok(PrepareOptions {
            raw_images_dir: self.raw_images_dir.clone(),
            export_root: self.export_root.clone(),
            output_root: self.output_root.clone(),
            classes: self.class_table()?,
            geometry: self.geometry,
        })
    }

    pub fn count_options(&self) -> Result<CountOptions, LabelprepError> {
        Ok(CountOptions {
            export_root: self.export_root.clone(),
            classes: self.class_table()?,
            target_per_class: self.target_per_class,
            geometry: self.geometry,
        })
    }

    pub fn flatten_options(&self) -> FlattenOptions {
        FlattenOptions {
            source_root: self.flatten_source.clone(),
            target_dir: self.flatten_target.clone(),
            splits: self.flatten_splits.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = ProjectConfig::resolve(FileConfig::default(), Overrides::default());
        assert_eq!(config.raw_images_dir, PathBuf::from("raw_images"));
        assert_eq!(
            config.export_root,
            PathBuf::from("cvat_exports/annotations_v1")
        );
        assert_eq!(config.output_root, PathBuf::from("data"));
        assert_eq!(config.target_per_class, 50);
        assert_eq!(config.geometry, GeometryPolicy::Lenient);
        assert_eq!(config.flatten_target, PathBuf::from("raw_images"));
        assert_eq!(config.flatten_splits, vec!["train", "test", "validation"]);
        assert_eq!(config.classes, ClassSource::Unset);

        let err = config.class_table().unwrap_err();
        assert!(matches!(err, LabelprepError::ConfigInvalid { .. }));
    }

    #[test]
    fn overrides_beat_file_values() {
        let file = FileConfig::from_yaml_str(
            "output_root: from_file\nclass_names: [a, b]\ntarget_per_class: 10\n",
            Path::new("labelprep.yaml"),
        )
        .expect("parse config");
        let overrides = Overrides {
            output_root: Some(PathBuf::from("from_cli")),
            class_names: Some(vec!["x".to_string()]),
            ..Default::default()
        };

        let config = ProjectConfig::resolve(file, overrides);
        assert_eq!(config.output_root, PathBuf::from("from_cli"));
        assert_eq!(config.classes, ClassSource::Inline(vec!["x".to_string()]));
        assert_eq!(config.target_per_class, 10);
    }

    #[test]
    fn classes_file_flag_beats_inline_file_names() {
        let file = FileConfig {
            class_names: Some(vec!["a".to_string()]),
            ..Default::default()
        };
        let overrides = Overrides {
            classes_file: Some(PathBuf::from("classes.txt")),
            ..Default::default()
        };
        let config = ProjectConfig::resolve(file, overrides);
        assert_eq!(
            config.classes,
            ClassSource::File(PathBuf::from("classes.txt"))
        );
    }

    #[test]
    fn strict_geometry_can_come_from_either_layer() {
        let file = FileConfig {
            strict_geometry: Some(true),
            ..Default::default()
        };
        let config = ProjectConfig::resolve(file, Overrides::default());
        assert_eq!(config.geometry, GeometryPolicy::Strict);

        let overrides = Overrides {
            strict_geometry: Some(true),
            ..Default::default()
        };
        let config = ProjectConfig::resolve(FileConfig::default(), overrides);
        assert_eq!(config.geometry, GeometryPolicy::Strict);
    }

    #[test]
    fn lenient_override_beats_strict_file_setting() {
        let file = FileConfig {
            strict_geometry: Some(true),
            ..Default::default()
        };
        let overrides = Overrides {
            strict_geometry: Some(false),
            ..Default::default()
        };
        let config = ProjectConfig::resolve(file, overrides);
        assert_eq!(config.geometry, GeometryPolicy::Lenient);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = FileConfig::from_yaml_str("class_nmes: [a]\n", Path::new("labelprep.yaml"))
            .unwrap_err();
        assert!(matches!(err, LabelprepError::ConfigParse { .. }));
    }

    #[test]
    fn empty_file_is_default() {
        let config =
            FileConfig::from_yaml_str("\n", Path::new("labelprep.yaml")).expect("parse empty");
        assert_eq!(config, FileConfig::default());
    }

    #[test]
    fn flatten_section_is_read() {
        let file = FileConfig::from_yaml_str(
            "flatten:\n  source_root: src\n  target_dir: flat\n  splits: [train]\n",
            Path::new("labelprep.yaml"),
        )
        .expect("parse config");
        let opts = ProjectConfig::resolve(file, Overrides::default()).flatten_options();
        assert_eq!(opts.source_root, PathBuf::from("src"));
        assert_eq!(opts.target_dir, PathBuf::from("flat"));
        assert_eq!(opts.splits, vec!["train"]);
    }

    #[test]
    fn load_reports_missing_explicit_file() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let missing = temp.path().join("missing.yaml");
        let err = FileConfig::discover(Some(missing.as_path())).unwrap_err();
        assert!(matches!(err, LabelprepError::ConfigRead { .. }));
    }
}
