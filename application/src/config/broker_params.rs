//! Broker parameters - facade wiring control.
//!
//! [`BrokerParams`] groups the static settings the [`AnswerQueryUseCase`]
//! is built with. Per-request knobs live in [`QueryOptions`]; these are the
//! process-wide ones.
//!
//! [`AnswerQueryUseCase`]: crate::use_cases::answer_query::AnswerQueryUseCase

use crate::throttle::controller::DEFAULT_IDLE_RETENTION;
use broker_domain::QueryOptions;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Process-wide broker parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerParams {
    /// Minimum combined confidence required to return an answer.
    pub confidence_floor: f64,
    /// Slots in the shared worker pool (concurrent provider calls).
    pub workers: usize,
    /// How long an idle caller's throttle state is kept.
    pub idle_caller_retention: Duration,
    /// Options applied when a caller does not supply its own.
    pub defaults: QueryOptions,
}

impl Default for BrokerParams {
    fn default() -> Self {
        Self {
            confidence_floor: 0.0,
            workers: 16,
            idle_caller_retention: DEFAULT_IDLE_RETENTION,
            defaults: QueryOptions::default(),
        }
    }
}

impl BrokerParams {
    // ==================== Builder Methods ====================

    pub fn with_confidence_floor(mut self, floor: f64) -> Self {
        self.confidence_floor = floor;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_idle_caller_retention(mut self, retention: Duration) -> Self {
        self.idle_caller_retention = retention;
        self
    }

    pub fn with_defaults(mut self, defaults: QueryOptions) -> Self {
        self.defaults = defaults;
        self
    }
}
