use std::path::PathBuf;
use thiserror::Error;

/// The main error type for labelprep operations.
///
/// Only run-scoped failures end up here. Per-file and per-line problems are
/// recorded in the operation reports instead.
#[derive(Debug, Error)]
pub enum LabelprepError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Raw images directory not found: {path}")]
    RawImagesDirMissing { path: PathBuf },

    #[error("Source directory not found: {path}")]
    SourceDirMissing { path: PathBuf },

    #[error("Failed to traverse directory {path}: {message}")]
    DirectoryWalk { path: PathBuf, message: String },

    #[error("Failed to read config file {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid configuration: {message}")]
    ConfigInvalid { message: String },

    #[error("Invalid classes file {path}: {message}")]
    ClassesTxtInvalid { path: PathBuf, message: String },

    #[error("Failed to reset output directory {path}: {source}")]
    OutputResetFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize dataset manifest: {0}")]
    ManifestSerialize(#[source] serde_yaml::Error),

    #[error("Failed to write dataset manifest to {path}: {source}")]
    ManifestWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{below_target} class(es) below the target of {target} instances")]
    TargetsNotMet { below_target: usize, target: usize },

    #[error("Failed to serialize report as JSON: {0}")]
    ReportJson(#[from] serde_json::Error),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}
