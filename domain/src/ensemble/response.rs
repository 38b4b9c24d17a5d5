//! Provider responses collected by the dispatcher

use crate::provider::EnsembleMember;
use serde::{Deserialize, Serialize};

/// Response from a single provider within the deadline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderResponse {
    /// Provider name
    pub provider: String,
    /// Registration index of the provider (ordering key)
    pub index: usize,
    /// The answer, if the provider produced one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    /// Confidence in [0, 1]
    pub confidence: f64,
    /// Time from dispatch start to completion
    pub latency_ms: u64,
}

impl ProviderResponse {
    /// A provider answered. Confidence is clamped to [0, 1]; NaN becomes 0.
    pub fn answered(
        member: &EnsembleMember,
        answer: impl Into<String>,
        confidence: f64,
        latency_ms: u64,
    ) -> Self {
        Self {
            provider: member.name.clone(),
            index: member.index,
            answer: Some(answer.into()),
            confidence: clamp_confidence(confidence),
            latency_ms,
        }
    }

    /// A provider completed without an answer (or its call failed).
    pub fn no_answer(member: &EnsembleMember, latency_ms: u64) -> Self {
        Self {
            provider: member.name.clone(),
            index: member.index,
            answer: None,
            confidence: 0.0,
            latency_ms,
        }
    }

    /// The answer if present and not blank
    pub fn usable_answer(&self) -> Option<&str> {
        self.answer.as_deref().filter(|a| !a.trim().is_empty())
    }
}

pub(crate) fn clamp_confidence(confidence: f64) -> f64 {
    if confidence.is_nan() {
        0.0
    } else {
        confidence.clamp(0.0, 1.0)
    }
}
