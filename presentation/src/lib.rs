//! Presentation layer for ensemble-broker
//!
//! This crate contains CLI definitions, output formatters,
//! and the dispatch progress reporter.

pub mod cli;
pub mod output;
pub mod progress;

// Re-export commonly used types
pub use cli::commands::{Cli, OutputFormat};
pub use output::console::{ConsoleFormatter, HUMAN_ASSIST};
pub use progress::reporter::ProgressReporter;
