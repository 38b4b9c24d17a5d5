//! Answer settings from TOML (`[answer]` section)

use broker_application::BrokerParams;
use broker_domain::QueryOptions;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Raw `[answer]` section: facade defaults and pool sizing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileAnswerConfig {
    /// Minimum combined confidence for an answer (0 disables the floor)
    pub confidence_floor: f64,
    /// Default per-request time budget
    pub time_budget_ms: u64,
    /// Default in-flight limit per caller (0 = unlimited)
    pub cross_request_limit: u32,
    /// Default spacing between admissions per caller (0 = none)
    pub cross_request_lag_ms: u64,
    /// Default scheduling priority (lower first)
    pub priority: i32,
    /// Worker pool size shared by all provider calls
    pub workers: usize,
    /// Seconds an idle caller's throttle state is kept
    pub idle_caller_retention_secs: u64,
}

impl Default for FileAnswerConfig {
    fn default() -> Self {
        let params = BrokerParams::default();
        let defaults = QueryOptions::default();
        Self {
            confidence_floor: params.confidence_floor,
            time_budget_ms: defaults.time_budget_ms,
            cross_request_limit: defaults.cross_request_limit,
            cross_request_lag_ms: defaults.cross_request_lag_ms,
            priority: defaults.priority,
            workers: params.workers,
            idle_caller_retention_secs: params.idle_caller_retention.as_secs(),
        }
    }
}

impl FileAnswerConfig {
    /// Default options for requests that bring none
    pub fn to_query_options(&self) -> QueryOptions {
        QueryOptions::default()
            .with_time_budget_ms(self.time_budget_ms)
            .with_cross_request_limit(self.cross_request_limit)
            .with_cross_request_lag_ms(self.cross_request_lag_ms)
            .with_priority(self.priority)
    }

    pub fn to_broker_params(&self) -> BrokerParams {
        BrokerParams::default()
            .with_confidence_floor(self.confidence_floor)
            .with_workers(self.workers)
            .with_idle_caller_retention(Duration::from_secs(self.idle_caller_retention_secs))
            .with_defaults(self.to_query_options())
    }
}
