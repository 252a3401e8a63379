use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Replays a CI build's event stream against its plan
///
/// Buildview builds the step tree of a build plan, applies recorded build
/// events to it in order and prints the resulting state. It is a
/// diagnostic tool for the build view model.
#[derive(Parser)]
#[command(version, about, name = "buildview")]
pub struct Args {
    /// Log debug output. RUST_LOG takes precedence when set
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for the Buildview CLI
#[derive(Subcommand)]
pub enum Commands {
    /// Build a plan's step tree and replay recorded events against it
    #[command(alias = "r")]
    Replay(ReplayArgs),
    /// Parse a log highlight fragment such as `#L12:3:9`
    Fragment {
        /// Fragment text, leading `#` included
        fragment: String,
    },
}

#[derive(clap::Args)]
pub struct ReplayArgs {
    /// JSON build plan
    #[arg(long)]
    pub plan: PathBuf,

    /// JSON list of the build's resource inputs
    #[arg(long)]
    pub resources: Option<PathBuf>,

    /// File of build events, one JSON object after another
    #[arg(long)]
    pub events: Option<PathBuf>,

    /// Initial highlight fragment; the highlighted step starts expanded
    #[arg(long)]
    pub highlight: Option<String>,

    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Outline)]
    pub format: Format,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    /// Indented plain-text outline
    Outline,
    /// JSON snapshot of the model
    Json,
}
