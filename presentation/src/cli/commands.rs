//! CLI command definitions

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Output format for the final report
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Outcome, consensus scores and summary
    Summary,
    /// Summary followed by the full transcript
    Full,
    /// JSON report (discussion, outcome and transcript)
    Json,
}

/// CLI arguments for conclave
#[derive(Parser, Debug)]
#[command(name = "conclave")]
#[command(author, version, about = "Panel discussion engine - LLM roles debate a topic until they agree")]
#[command(long_about = r#"
Conclave runs a moderated panel of LLM roles on a topic.

Each turn one role speaks: an @mention picks the next speaker, otherwise a
model suggests one, otherwise the panel takes turns in order. After every
turn the transcript is scored for consensus; the discussion ends when the
score passes the threshold or the turn budget runs out.

Configuration files are loaded from (in priority order):
1. CONCLAVE_* environment variables (e.g. CONCLAVE_ENGINE__MAX_TURNS=8)
2. --config <path>        Explicit config file
3. ./conclave.toml        Project-level config
4. ~/.config/conclave/config.toml   Global config

Press Ctrl-C once to stop the discussion after the current turn.

Example:
  conclave "Should cities ban cars from their centres?"
  conclave --roles 3 --max-turns 12 "Is nuclear power worth the risk?"
  conclave --transcript debate.jsonl -o json "Four-day work week"
"#)]
pub struct Cli {
    /// The topic to discuss
    pub topic: Option<String>,

    /// Number of roles drawn from the configured cast
    #[arg(short, long, value_name = "N")]
    pub roles: Option<usize>,

    /// Turn budget (overrides engine.max_turns)
    #[arg(short = 't', long, value_name = "N")]
    pub max_turns: Option<u32>,

    /// Output format of the final report
    #[arg(short, long, value_enum, default_value = "summary")]
    pub output: OutputFormat,

    /// Write every event as JSON lines to this file
    #[arg(long, value_name = "PATH")]
    pub transcript: Option<PathBuf>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress live output, print only the final report
    #[arg(short, long)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,
}
