//! Per-request options and caller identity

use crate::core::error::InvalidOptionsError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Identity of the caller context used for cross-request throttling
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CallerId(String);

impl CallerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CallerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for CallerId {
    fn from(s: &str) -> Self {
        CallerId::new(s)
    }
}

/// Options for one `answer` call
///
/// `cross_request_limit == 0` disables the concurrency bound and
/// `cross_request_lag_ms == 0` disables the spacing check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryOptions {
    /// Wall-clock budget, from admission to result
    pub time_budget_ms: u64,
    /// Maximum in-flight requests for the same caller
    pub cross_request_limit: u32,
    /// Minimum spacing between two admissions for the same caller
    pub cross_request_lag_ms: u64,
    /// Lower is served first; ties are FIFO by admission
    pub priority: i32,
    /// Mix group to use instead of the flat ensemble
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mix_group: Option<String>,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            time_budget_ms: 50,
            cross_request_limit: 1,
            cross_request_lag_ms: 10,
            priority: 0,
            mix_group: None,
        }
    }
}

impl QueryOptions {
    // ==================== Builder Methods ====================

    pub fn with_time_budget_ms(mut self, ms: u64) -> Self {
        self.time_budget_ms = ms;
        self
    }

    pub fn with_cross_request_limit(mut self, limit: u32) -> Self {
        self.cross_request_limit = limit;
        self
    }

    pub fn with_cross_request_lag_ms(mut self, ms: u64) -> Self {
        self.cross_request_lag_ms = ms;
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_mix_group(mut self, group: impl Into<String>) -> Self {
        self.mix_group = Some(group.into());
        self
    }

    // ==================== Accessors ====================

    pub fn time_budget(&self) -> Duration {
        Duration::from_millis(self.time_budget_ms)
    }

    pub fn cross_request_lag(&self) -> Duration {
        Duration::from_millis(self.cross_request_lag_ms)
    }

    /// Validate the parts of the options that do not need a registry
    pub fn validate(&self) -> Result<(), InvalidOptionsError> {
        if self.time_budget_ms == 0 {
            return Err(InvalidOptionsError::ZeroBudget);
        }
        Ok(())
    }
}
