//! Labelprep: YOLO dataset preparation from annotation-tool exports.
//!
//! Labelprep turns a flat directory of raw images plus per-split YOLO label
//! exports into a train/val dataset ready for training, and audits how many
//! object instances each class has before a preparation pass is run.
//!
//! # Modules
//!
//! - [`prepare`]: Reset the output tree, copy matched image/label pairs, write `data.yaml`
//! - [`count`]: Read-only per-class, per-split instance audit against a target
//! - [`flatten`]: Copy per-category raw image folders into one uniquely-named directory
//! - [`label`]: Label-line classification and the class table
//! - [`config`]: Layered configuration (flags, env, YAML file, defaults)
//! - [`error`]: Error types for labelprep operations

pub mod config;
pub mod count;
pub mod error;
pub mod flatten;
pub mod fsutil;
pub mod label;
pub mod layout;
pub mod logging;
pub mod prepare;
pub mod raw_images;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::Serialize;

pub use error::LabelprepError;

use config::{FileConfig, Overrides, ProjectConfig};
use logging::Verbosity;

/// The labelprep CLI application.
#[derive(Parser)]
#[command(name = "labelprep")]
#[command(version, about)]
#[command(propagate_version = true)]
struct Cli {
    /// YAML config file (defaults to ./labelprep.yaml when present).
    #[arg(long, global = true, env = "LABELPREP_CONFIG")]
    config: Option<PathBuf>,

    /// Increase diagnostic output (-v debug, -vv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only print errors on stderr.
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Build a train/val dataset from raw images and exported labels.
    Prepare(PrepareArgs),
    /// Count annotated instances per class and check them against a target.
    Count(CountArgs),
    /// Flatten per-category raw image folders into one directory.
    Flatten(FlattenArgs),
}

/// Class table arguments shared by prepare and count.
#[derive(clap::Args)]
struct ClassArgs {
    /// Comma-separated class names in class-id order.
    #[arg(long, value_delimiter = ',')]
    classes: Option<Vec<String>>,

    /// File with one class name per line, in class-id order.
    #[arg(long, conflicts_with = "classes")]
    classes_file: Option<PathBuf>,

    /// Also require the four box fields to be finite numbers.
    #[arg(long)]
    strict_geometry: bool,

    /// Check only field count and class id, even if the config file asks
    /// for strict geometry.
    #[arg(long, conflicts_with = "strict_geometry")]
    lenient_geometry: bool,
}

/// Arguments for the prepare subcommand.
#[derive(clap::Args)]
struct PrepareArgs {
    /// Directory of raw images (jpg, jpeg, png).
    #[arg(long, env = "LABELPREP_RAW_IMAGES")]
    raw_images: Option<PathBuf>,

    /// Export root containing labels/train and labels/validation.
    #[arg(long, env = "LABELPREP_EXPORT_ROOT")]
    export_root: Option<PathBuf>,

    /// Dataset root to create. Existing contents are deleted.
    #[arg(long, env = "LABELPREP_OUTPUT_ROOT")]
    output_root: Option<PathBuf>,

    #[command(flatten)]
    class_args: ClassArgs,

    /// Output format for the report ('text' or 'json').
    #[arg(long, default_value = "text")]
    output: String,
}

/// Arguments for the count subcommand.
#[derive(clap::Args)]
struct CountArgs {
    /// Export root containing labels/train and labels/validation.
    #[arg(long, env = "LABELPREP_EXPORT_ROOT")]
    export_root: Option<PathBuf>,

    #[command(flatten)]
    class_args: ClassArgs,

    /// Target instance count per class (default 50).
    #[arg(long, env = "LABELPREP_TARGET")]
    target: Option<usize>,

    /// Exit non-zero if any class is below target.
    #[arg(long)]
    strict: bool,

    /// Output format for the report ('text' or 'json').
    #[arg(long, default_value = "text")]
    output: String,
}

/// Arguments for the flatten subcommand.
#[derive(clap::Args)]
struct FlattenArgs {
    /// Root with one folder per split, each holding one folder per category.
    #[arg(long)]
    source_root: Option<PathBuf>,

    /// Flat output directory (defaults to the raw images directory).
    #[arg(long, env = "LABELPREP_RAW_IMAGES")]
    target_dir: Option<PathBuf>,

    /// Comma-separated split folder names to visit.
    #[arg(long, value_delimiter = ',')]
    splits: Option<Vec<String>>,

    /// Output format for the report ('text' or 'json').
    #[arg(long, default_value = "text")]
    output: String,
}

/// Report rendering requested with `--output`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    fn parse(raw: &str) -> Result<Self, LabelprepError> {
        match raw {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => Err(LabelprepError::UnsupportedFormat(format!(
                "'{}' (supported: text, json)",
                other
            ))),
        }
    }
}

/// Run the labelprep CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), LabelprepError> {
    let cli = Cli::parse();
    logging::init_logging(Verbosity::from_flags(cli.verbose, cli.quiet));

    let Some(command) = cli.command else {
        println!("labelprep {}", env!("CARGO_PKG_VERSION"));
        println!();
        println!("YOLO dataset preparation from annotation-tool exports.");
        println!();
        println!("Run 'labelprep --help' for usage information.");
        return Ok(());
    };

    let file = FileConfig::discover(cli.config.as_deref())?;
    match command {
        Commands::Prepare(args) => run_prepare(file, args),
        Commands::Count(args) => run_count(file, args),
        Commands::Flatten(args) => run_flatten(file, args),
    }
}

fn class_overrides(args: ClassArgs, overrides: &mut Overrides) {
    overrides.class_names = args.classes;
    overrides.classes_file = args.classes_file;
    overrides.strict_geometry = match (args.strict_geometry, args.lenient_geometry) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    };
}

/// Execute the prepare subcommand.
fn run_prepare(file: FileConfig, args: PrepareArgs) -> Result<(), LabelprepError> {
    let format = OutputFormat::parse(&args.output)?;
    let mut overrides = Overrides {
        raw_images_dir: args.raw_images,
        export_root: args.export_root,
        output_root: args.output_root,
        ..Default::default()
    };
    class_overrides(args.class_args, &mut overrides);

    let opts = ProjectConfig::resolve(file, overrides).prepare_options()?;
    let report = prepare::prepare_dataset(&opts)?;
    emit(&report, format)
}

/// Execute the count subcommand.
fn run_count(file: FileConfig, args: CountArgs) -> Result<(), LabelprepError> {
    let format = OutputFormat::parse(&args.output)?;
    let mut overrides = Overrides {
        export_root: args.export_root,
        target_per_class: args.target,
        ..Default::default()
    };
    class_overrides(args.class_args, &mut overrides);

    let opts = ProjectConfig::resolve(file, overrides).count_options()?;
    let report = count::count_annotations(&opts);
    emit(&report, format)?;

    let below_target = report.classes_below_target().count();
    if args.strict && below_target > 0 {
        Err(LabelprepError::TargetsNotMet {
            below_target,
            target: report.target_per_class,
        })
    } else {
        Ok(())
    }
}

/// Execute the flatten subcommand.
fn run_flatten(file: FileConfig, args: FlattenArgs) -> Result<(), LabelprepError> {
    let format = OutputFormat::parse(&args.output)?;
    let overrides = Overrides {
        flatten_source: args.source_root,
        flatten_target: args.target_dir,
        flatten_splits: args.splits,
        ..Default::default()
    };

    let opts = ProjectConfig::resolve(file, overrides).flatten_options();
    let report = flatten::flatten_raw_images(&opts)?;
    emit(&report, format)
}

fn emit<R>(report: &R, format: OutputFormat) -> Result<(), LabelprepError>
where
    R: Serialize + std::fmt::Display,
{
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(report)?),
        OutputFormat::Text => print!("{}", report),
    }
    Ok(())
}
