//! Per-request state machine
//!
//! ```text
//! ADMITTED ──▶ DISPATCHED ──▶ AGGREGATED ──▶ RETURNED
//!                  │
//!                  └──────────▶ TIMED_OUT
//!
//! (throttled requests are never admitted and end in REJECTED)
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Phase of a single query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QueryPhase {
    Admitted,
    Dispatched,
    Aggregated,
    Returned,
    Rejected,
    TimedOut,
}

impl QueryPhase {
    pub fn as_str(&self) -> &str {
        match self {
            QueryPhase::Admitted => "admitted",
            QueryPhase::Dispatched => "dispatched",
            QueryPhase::Aggregated => "aggregated",
            QueryPhase::Returned => "returned",
            QueryPhase::Rejected => "rejected",
            QueryPhase::TimedOut => "timed_out",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            QueryPhase::Returned | QueryPhase::Rejected | QueryPhase::TimedOut
        )
    }

    fn can_advance_to(&self, next: QueryPhase) -> bool {
        matches!(
            (self, next),
            (QueryPhase::Admitted, QueryPhase::Dispatched)
                | (QueryPhase::Dispatched, QueryPhase::Aggregated)
                | (QueryPhase::Dispatched, QueryPhase::TimedOut)
                | (QueryPhase::Aggregated, QueryPhase::Returned)
        )
    }
}

impl std::fmt::Display for QueryPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Illegal query transition: {from} -> {to}")]
pub struct LifecycleError {
    pub from: QueryPhase,
    pub to: QueryPhase,
}

/// Tracks one query through its phases; every phase is entered at most once.
#[derive(Debug, Clone)]
pub struct QueryLifecycle {
    id: u64,
    phase: QueryPhase,
}

impl QueryLifecycle {
    pub fn admitted(id: u64) -> Self {
        Self {
            id,
            phase: QueryPhase::Admitted,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn phase(&self) -> QueryPhase {
        self.phase
    }

    pub fn advance(&mut self, next: QueryPhase) -> Result<(), LifecycleError> {
        if !self.phase.can_advance_to(next) {
            return Err(LifecycleError {
                from: self.phase,
                to: next,
            });
        }
        self.phase = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path() {
        let mut lifecycle = QueryLifecycle::admitted(7);
        lifecycle.advance(QueryPhase::Dispatched).unwrap();
        lifecycle.advance(QueryPhase::Aggregated).unwrap();
        lifecycle.advance(QueryPhase::Returned).unwrap();
        assert!(lifecycle.phase().is_terminal());
        assert_eq!(lifecycle.id(), 7);
    }

    #[test]
    fn test_dispatch_happens_once() {
        let mut lifecycle = QueryLifecycle::admitted(1);
        lifecycle.advance(QueryPhase::Dispatched).unwrap();
        let err = lifecycle.advance(QueryPhase::Dispatched).unwrap_err();
        assert_eq!(err.from, QueryPhase::Dispatched);
        assert_eq!(err.to, QueryPhase::Dispatched);
    }

    #[test]
    fn test_timed_out_is_terminal() {
        let mut lifecycle = QueryLifecycle::admitted(1);
        lifecycle.advance(QueryPhase::Dispatched).unwrap();
        lifecycle.advance(QueryPhase::TimedOut).unwrap();
        assert!(lifecycle.advance(QueryPhase::Aggregated).is_err());
    }

    #[test]
    fn test_rejected_is_terminal_and_unreachable_from_admission() {
        assert!(QueryPhase::Rejected.is_terminal());
        let mut lifecycle = QueryLifecycle::admitted(1);
        assert!(lifecycle.advance(QueryPhase::Rejected).is_err());
    }
}
