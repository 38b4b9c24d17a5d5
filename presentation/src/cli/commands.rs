//! CLI command definitions

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Output format for query outcomes
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Only the answer (or "human assist")
    Answer,
    /// Verdict, status, and every provider response
    Full,
    /// JSON output
    Json,
}

/// CLI arguments for ensemble-broker
#[derive(Parser, Debug)]
#[command(name = "ensemble-broker")]
#[command(author, version, about = "Ensemble query broker - Weighted models answer within a time budget")]
#[command(long_about = r#"
Ensemble Broker asks several answering models the same question and combines
their (answer, confidence) pairs into one best answer within a time budget.

- Flat ensemble (default): every provider, weighted average of confidences
- Mix group (--group): a named subset with its own strategy (max or avg)

When no answer clears the confidence floor, "human assist" is printed instead.

Configuration files are loaded from (in priority order):
1. BROKER_* environment variables (nested keys split on "__")
2. --config <path>     Explicit config file
3. ./broker.toml       Project-level config
4. ~/.config/ensemble-broker/config.toml   Global config

Example:
  ensemble-broker "What is the capital of France?"
  ensemble-broker --group mix1 --budget-ms 80 "Which plan covers dental?"
  ensemble-broker -o json --floor 0.5 "Reset my password"
"#)]
pub struct Cli {
    /// The question to answer
    pub question: Option<String>,

    /// Mix group to use instead of the flat ensemble
    #[arg(short, long, value_name = "NAME")]
    pub group: Option<String>,

    /// Time budget in milliseconds
    #[arg(short, long, value_name = "MS")]
    pub budget_ms: Option<u64>,

    /// Maximum in-flight requests for this caller (0 = unlimited)
    #[arg(long, value_name = "N")]
    pub limit: Option<u32>,

    /// Minimum spacing between requests in milliseconds (0 = none)
    #[arg(long, value_name = "MS")]
    pub lag_ms: Option<u64>,

    /// Scheduling priority (lower is served first)
    #[arg(short, long, allow_hyphen_values = true)]
    pub priority: Option<i32>,

    /// Minimum combined confidence for an answer, in [0, 1]
    #[arg(short, long, value_name = "CONFIDENCE")]
    pub floor: Option<f64>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "answer")]
    pub output: OutputFormat,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress indicators
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
