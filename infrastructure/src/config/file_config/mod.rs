//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and converted into domain registries and
//! application parameters once at startup.

mod answer;
mod mix_groups;
mod providers;

pub use answer::FileAnswerConfig;
pub use mix_groups::{FileMixGroupConfig, FileMixMemberConfig};
pub use providers::FileProviderConfig;

use super::error::ConfigError;
use broker_domain::{MixGroupRegistry, ProviderRegistry, RegistryError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Severity level of a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Fatal: the broker cannot start with this configuration.
    Error,
    /// Non-fatal: the broker starts but may not behave as expected.
    Warning,
}

/// A detected issue in the configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigIssue {
    pub severity: Severity,
    pub message: String,
}

impl ConfigIssue {
    fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
        }
    }

    fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Providers in registration order
    pub providers: Vec<FileProviderConfig>,
    /// Mix groups by name
    pub mix_groups: BTreeMap<String, FileMixGroupConfig>,
    /// Facade defaults
    pub answer: FileAnswerConfig,
}

impl FileConfig {
    /// Validate the entire configuration, returning all detected issues.
    ///
    /// Only structural problems are reported here. Referential ones (unknown
    /// or duplicate providers, duplicate members) surface from
    /// [`build_registries`](Self::build_registries).
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        if self.providers.is_empty() {
            issues.push(ConfigIssue::warning(
                "no providers configured; every query will end without a confident answer",
            ));
        }

        for (i, provider) in self.providers.iter().enumerate() {
            if provider.name.trim().is_empty() {
                issues.push(ConfigIssue::error(format!(
                    "providers[{}]: name cannot be empty",
                    i
                )));
                continue;
            }
            if !(provider.weight.is_finite() && provider.weight > 0.0) {
                issues.push(ConfigIssue::error(format!(
                    "providers.{}: weight must be greater than 0 (got {})",
                    provider.name, provider.weight
                )));
            }
            match provider.endpoint.as_deref().map(str::trim) {
                None | Some("") => issues.push(ConfigIssue::warning(format!(
                    "providers.{}: no endpoint configured; it will never answer",
                    provider.name
                ))),
                Some(_) => {}
            }
        }

        for (name, group) in &self.mix_groups {
            if group.members.is_empty() {
                issues.push(ConfigIssue::error(format!(
                    "mix_groups.{}: a group needs at least one member",
                    name
                )));
            }
        }

        let answer = &self.answer;
        if !(0.0..=1.0).contains(&answer.confidence_floor) {
            issues.push(ConfigIssue::error(format!(
                "answer.confidence_floor must be within [0, 1] (got {})",
                answer.confidence_floor
            )));
        }
        if answer.time_budget_ms == 0 {
            issues.push(ConfigIssue::error("answer.time_budget_ms cannot be 0"));
        }
        if answer.workers == 0 {
            issues.push(ConfigIssue::error("answer.workers cannot be 0"));
        }

        issues
    }

    /// Fail on any error-level issue; otherwise return the warnings.
    pub fn ensure_valid(&self) -> Result<Vec<ConfigIssue>, ConfigError> {
        let (errors, warnings): (Vec<_>, Vec<_>) =
            self.validate().into_iter().partition(ConfigIssue::is_error);
        if errors.is_empty() {
            Ok(warnings)
        } else {
            Err(ConfigError::Invalid(errors))
        }
    }

    /// Build the immutable provider and mix group registries.
    pub fn build_registries(&self) -> Result<(ProviderRegistry, MixGroupRegistry), RegistryError> {
        let mut providers = ProviderRegistry::new();
        for provider in &self.providers {
            providers.register(provider.to_model_provider())?;
        }

        let mut groups = MixGroupRegistry::new();
        for (name, group) in &self.mix_groups {
            groups.define_group(&providers, name.clone(), group.to_mix_members(), group.strategy)?;
        }

        Ok((providers, groups))
    }
}
