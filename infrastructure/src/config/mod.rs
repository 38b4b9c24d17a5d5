//! Configuration file loading for ensemble-broker
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `BROKER_*` environment variables
//! 2. `--config <path>` specified file
//! 3. Project root: `./broker.toml` or `./.broker.toml`
//! 4. Global: `$XDG_CONFIG_HOME/ensemble-broker/config.toml`
//! 5. Default values

mod error;
mod file_config;
mod loader;

pub use error::ConfigError;
pub use file_config::{
    ConfigIssue, FileAnswerConfig, FileConfig, FileMixGroupConfig, FileMixMemberConfig,
    FileProviderConfig, Severity,
};
pub use loader::ConfigLoader;
