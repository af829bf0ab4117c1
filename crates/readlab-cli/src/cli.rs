//! CLI command definitions and argument parsing.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// readlab - Summarize research papers into a digest.
#[derive(Debug, Parser)]
#[command(name = "readlab")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path
    #[arg(short, long, global = true, env = "READLAB_CONFIG")]
    pub config: Option<String>,

    /// Debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
    /// Quiet format (counts and paths only)
    Quiet,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Extract and chunk documents without summarizing them
    Ingest(BatchArgs),

    /// Summarize documents into the store
    Summarize(BatchArgs),

    /// Render the digest from stored summaries
    Aggregate(AggregateArgs),

    /// Summarize documents, then render the digest
    Run(RunArgs),

    /// Score stored summaries against their extracted text
    Quality,

    /// Manage the configuration file
    Config(ConfigArgs),
}

/// Arguments shared by the batch commands.
#[derive(Debug, Parser)]
pub struct BatchArgs {
    /// Files or directories (directories are searched for .pdf, .md and .txt)
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Documents processed at once (overrides the config file)
    #[arg(short = 'j', long)]
    pub concurrency: Option<usize>,
}

/// Arguments for the aggregate command.
#[derive(Debug, Parser)]
pub struct AggregateArgs {
    /// Digest output path (overrides the config file)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Group sections by primary tag, month or week
    #[arg(short, long)]
    pub group_by: Option<String>,

    /// Date shown in the heading (YYYY-MM-DD)
    #[arg(long, conflicts_with = "today")]
    pub date: Option<String>,

    /// Show today's date in the heading
    #[arg(long)]
    pub today: bool,
}

/// Arguments for the run command.
#[derive(Debug, Parser)]
pub struct RunArgs {
    #[command(flatten)]
    pub batch: BatchArgs,

    #[command(flatten)]
    pub digest: AggregateArgs,
}

/// Arguments for configuration management.
#[derive(Debug, Parser)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Configuration actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Write a configuration file with default values
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Show the effective configuration
    Show,
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
            CliFormat::Quiet => crate::config::OutputFormat::Quiet,
        }
    }
}
