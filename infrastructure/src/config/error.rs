//! Configuration errors

use super::file_config::ConfigIssue;
use broker_domain::RegistryError;
use thiserror::Error;

/// Errors that stop the broker from starting
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    #[error("Invalid configuration: {}", summarize(.0))]
    Invalid(Vec<ConfigIssue>),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),
}

fn summarize(issues: &[ConfigIssue]) -> String {
    issues
        .iter()
        .map(|i| i.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}
