//! Terminal results of aggregation

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A single best answer with its combined confidence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerResult {
    pub answer: String,
    pub confidence: f64,
    /// Providers that produced the winning answer
    pub contributing_providers: BTreeSet<String>,
}

/// Outcome of aggregation
///
/// `NoConfidentAnswer` is an explicit sentinel, distinct from an answer that
/// happens to be an empty string. Callers typically escalate it to a human.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Verdict {
    Answered(AnswerResult),
    NoConfidentAnswer,
}

impl Verdict {
    pub fn is_answered(&self) -> bool {
        matches!(self, Verdict::Answered(_))
    }

    pub fn answer(&self) -> Option<&AnswerResult> {
        match self {
            Verdict::Answered(result) => Some(result),
            Verdict::NoConfidentAnswer => None,
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::Answered(result) => {
                write!(f, "{} ({:.3})", result.answer, result.confidence)
            }
            Verdict::NoConfidentAnswer => write!(f, "no confident answer"),
        }
    }
}
