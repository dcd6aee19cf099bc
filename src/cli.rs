use crate::config::ReportFormat;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "archivist")]
#[command(about = "Reorganizes messy directory trees into a clean archive", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Scan the configured roots and organize files into the destination
    Run(RunArgs),
    /// Replay a manifest in reverse, restoring moved files
    Undo(UndoArgs),
    /// Check an organized tree for missing companion files
    Verify(VerifyArgs),
    /// Print merged configuration values
    PrintConfig,
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Root directories to scan (overrides the config file)
    #[arg(long = "root")]
    pub roots: Vec<String>,

    /// Regex matched against absolute paths to exclude from the scan
    #[arg(long = "exclude")]
    pub excludes: Vec<String>,

    /// File of newline-separated exclusion regexes
    #[arg(long = "exclude-from")]
    pub exclude_from: Option<PathBuf>,

    /// Destination root for organized files
    #[arg(long)]
    pub dest: Option<String>,

    /// Compute and log decisions without touching the filesystem
    #[arg(long)]
    pub dry_run: bool,

    /// Directory that receives the run manifest
    #[arg(long)]
    pub report: Option<String>,

    /// Manifest format
    #[arg(long, value_enum)]
    pub format: Option<ReportFormat>,

    /// Execute planned moves on a rayon worker pool
    #[arg(long)]
    pub parallel: bool,
}

#[derive(Debug, Args)]
pub struct UndoArgs {
    /// Manifest produced by a previous run
    pub manifest: PathBuf,

    /// Show what would be restored without touching the filesystem
    #[arg(long)]
    pub dry_run: bool,

    /// Skip the confirmation prompt
    #[arg(long)]
    pub yes: bool,
}

#[derive(Debug, Args)]
pub struct VerifyArgs {
    /// Organized tree to verify (defaults to the configured destination)
    #[arg(long)]
    pub dest: Option<String>,

    /// Role suffix identifying the primary file of an item
    #[arg(long, default_value = ".mp3")]
    pub primary: String,

    /// Companion suffixes expected alongside each primary file
    #[arg(long = "require", default_values_t = [
        String::from("_transcript.txt"),
        String::from("_analysis.txt"),
    ])]
    pub required: Vec<String>,
}
