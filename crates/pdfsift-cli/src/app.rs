//! CLI argument definitions

use clap::{Args, Parser, Subcommand, ValueEnum};
use pdfsift_core::{StoreBackend, StrategyKind};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pdfsift")]
#[command(
    author,
    version,
    about = "Rank the PDF sections that matter for a persona and a job to be done"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (defaults to the user config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format for outline and chunk
    #[arg(long, global = true, value_enum, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Chunk, embed and rank every PDF in a directory
    Run(RunArgs),

    /// Write the input manifest only
    Manifest(ManifestArgs),

    /// Show the detected title and headings of a PDF
    Outline(OutlineArgs),

    /// Show the heading-labelled sections of a PDF
    Chunk(ChunkArgs),
}

#[derive(Args)]
pub struct RunArgs {
    /// Directory with PDF files
    #[arg(long, alias = "docs_dir")]
    pub docs_dir: PathBuf,

    /// Persona description
    #[arg(long)]
    pub persona: String,

    /// Job to be done
    #[arg(long)]
    pub job: String,

    /// Number of ranked sections
    #[arg(long, alias = "top_k")]
    pub top_k: Option<usize>,

    /// Chunking strategy (sentence-aware or simple)
    #[arg(long)]
    pub strategy: Option<StrategyKind>,

    /// Vector store backend (memory or sqlite)
    #[arg(long)]
    pub store: Option<StoreBackend>,

    /// Output file (defaults to challenge1b_output.json next to the docs directory)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct ManifestArgs {
    /// Directory with PDF files
    #[arg(long, alias = "docs_dir")]
    pub docs_dir: PathBuf,

    /// Persona description
    #[arg(long)]
    pub persona: String,

    /// Job to be done
    #[arg(long)]
    pub job: String,

    /// Output file (defaults to challenge1b_input.json next to the docs directory)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct OutlineArgs {
    /// PDF file
    pub file: PathBuf,
}

#[derive(Args)]
pub struct ChunkArgs {
    /// PDF file
    pub file: PathBuf,

    /// Chunking strategy (sentence-aware or simple)
    #[arg(long)]
    pub strategy: Option<StrategyKind>,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Cli,
    Json,
}
