//! Provider entities

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A declared model provider (embedding lookup, SVM, Bayes, key search, ...)
///
/// The weight is the provider's estimated contribution relative to the
/// others; weights need not sum to any fixed total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelProvider {
    name: String,
    weight: f64,
    /// Offset added to the dispatch schedule before this provider is called
    #[serde(default)]
    launch_delay_ms: u64,
}

impl ModelProvider {
    pub fn new(name: impl Into<String>, weight: f64) -> Self {
        Self {
            name: name.into(),
            weight,
            launch_delay_ms: 0,
        }
    }

    pub fn with_launch_delay_ms(mut self, delay_ms: u64) -> Self {
        self.launch_delay_ms = delay_ms;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn launch_delay(&self) -> Duration {
        Duration::from_millis(self.launch_delay_ms)
    }
}

/// A provider as it participates in one ensemble.
///
/// `weight` is the effective weight for this ensemble (a mix group override
/// if present, else the registry weight). `index` is the provider's
/// registration order and is what every tie-break and output ordering uses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnsembleMember {
    pub name: String,
    pub index: usize,
    pub weight: f64,
    pub launch_delay_ms: u64,
}

impl EnsembleMember {
    pub fn launch_delay(&self) -> Duration {
        Duration::from_millis(self.launch_delay_ms)
    }
}

pub(crate) fn is_valid_weight(weight: f64) -> bool {
    weight.is_finite() && weight > 0.0
}
