use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "seicon",
    about = "Search engine icon resolution and engine inspection",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Resolve the icon for an engine identifier against a collection fixture
    Resolve(ResolveArgs),
    /// Check an engine identifier against icon record patterns
    Match(MatchArgs),
    /// Show an engine built from its configuration
    Engine(EngineArgs),
}

#[derive(Args)]
pub struct ResolveArgs {
    /// JSON file with the collection records and downloadable attachments
    #[arg(long)]
    pub fixture: PathBuf,
    /// Engine identifier to resolve
    pub identifier: String,
    /// Preferred icon width in pixels
    #[arg(short, long, default_value = "16")]
    pub width: u32,
    /// Keep downloaded attachments in this directory between runs
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,
    /// Icon cache configuration (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Do not download missing icons
    #[arg(long)]
    pub no_flush: bool,
}

#[derive(Args)]
pub struct MatchArgs {
    pub identifier: String,
    /// Exact identifiers, or prefixes ending in `*`
    #[arg(required = true)]
    pub patterns: Vec<String>,
}

#[derive(Args)]
pub struct EngineArgs {
    /// Engine configuration (JSON)
    pub config: PathBuf,
    /// Search terms for the example submissions
    #[arg(short, long, default_value = "example")]
    pub terms: String,
    /// Submission purpose, e.g. `keyword` or `searchbar`
    #[arg(short, long)]
    pub purpose: Option<String>,
    /// Also resolve the engine's icon against this collection fixture
    #[arg(long)]
    pub fixture: Option<PathBuf>,
    /// Preferred icon width in pixels
    #[arg(short, long, default_value = "16")]
    pub width: u32,
}
