//! Per-request time budget

use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;

/// Raised internally once a request's deadline has passed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Time budget of {budget_ms} ms exceeded")]
pub struct BudgetExceededError {
    pub budget_ms: u64,
}

/// Monotonic deadline issued at admission
#[derive(Debug, Clone, Copy)]
pub struct Budget {
    admitted_at: Instant,
    deadline: Instant,
    total: Duration,
}

impl Budget {
    pub fn starting_at(admitted_at: Instant, total: Duration) -> Self {
        Self {
            admitted_at,
            deadline: admitted_at + total,
            total,
        }
    }

    pub fn start_now(total: Duration) -> Self {
        Self::starting_at(Instant::now(), total)
    }

    pub fn admitted_at(&self) -> Instant {
        self.admitted_at
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    pub fn elapsed(&self) -> Duration {
        self.admitted_at.elapsed()
    }

    /// Time left before the deadline, zero once it has passed
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining().is_zero()
    }

    /// Remaining time, or an error if none is left
    pub fn check(&self) -> Result<Duration, BudgetExceededError> {
        let remaining = self.remaining();
        if remaining.is_zero() {
            Err(BudgetExceededError {
                budget_ms: self.total.as_millis() as u64,
            })
        } else {
            Ok(remaining)
        }
    }
}
