//! Infrastructure layer for ensemble-broker
//!
//! This crate contains adapters for external systems:
//! - Configuration loading (TOML files and environment, via figment)
//! - HTTP provider adapter (reqwest)

pub mod config;
pub mod providers;

pub use config::{
    ConfigError, ConfigIssue, ConfigLoader, FileAnswerConfig, FileConfig, FileMixGroupConfig,
    FileMixMemberConfig, FileProviderConfig, Severity,
};
pub use providers::{HttpProvider, build_handles};
