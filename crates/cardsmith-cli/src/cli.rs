//! CLI command definitions and argument parsing.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Cardsmith - Generate flashcards from documents.
#[derive(Debug, Parser)]
#[command(name = "cardsmith")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Flashcard store file
    #[arg(short, long, global = true, env = "CARDSMITH_STORE")]
    pub store: Option<PathBuf>,

    /// Log more detail (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

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
    /// Quiet format (IDs only)
    Quiet,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate flashcards from a document
    Generate(GenerateArgs),

    /// List stored flashcards
    List(ListArgs),

    /// Remove duplicate flashcards from the store
    Clean,
}

/// Arguments for the generate command.
#[derive(Debug, Parser)]
pub struct GenerateArgs {
    /// Document to read (.txt, .md)
    pub file: PathBuf,

    /// Questions per chunk
    #[arg(short = 'n', long)]
    pub questions: Option<usize>,

    /// Generative model name
    #[arg(short, long, env = "CARDSMITH_MODEL")]
    pub model: Option<String>,

    /// Ollama endpoint
    #[arg(short, long, env = "CARDSMITH_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Pipeline preset, applied before other overrides
    #[arg(short, long, value_enum)]
    pub preset: Option<PresetArg>,

    /// Chunks generated in parallel
    #[arg(short = 'j', long)]
    pub concurrency: Option<usize>,

    /// Skip the chunk summary request
    #[arg(long)]
    pub no_summary: bool,

    /// Generate without writing to the store
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the list command.
#[derive(Debug, Parser)]
pub struct ListArgs {
    /// Maximum number of flashcards to show
    #[arg(short, long)]
    pub limit: Option<usize>,
}

/// Pipeline presets.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum PresetArg {
    /// No summaries, parallel chunks
    Fast,
    /// Smaller chunks, more questions, follow-up rounds
    Thorough,
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
