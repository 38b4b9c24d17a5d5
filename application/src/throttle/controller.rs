//! Cross-request admission control
//!
//! Each caller context has two limits, both taken from the request's options:
//!
//! - **limit**: at most `cross_request_limit` requests in flight at once
//! - **lag**: at least `cross_request_lag_ms` between two admissions
//!
//! Rejection is immediate; nothing is queued. Callers retry on their own.
//! Counters change under one lock so concurrent admissions cannot overshoot.

use super::budget::Budget;
use broker_domain::{CallerId, QueryOptions};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tracing::debug;

/// Idle callers are forgotten after this long by default
pub const DEFAULT_IDLE_RETENTION: Duration = Duration::from_secs(60);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ThrottledError {
    #[error("Caller '{caller}' has {in_flight} requests in flight (limit: {limit})")]
    ConcurrencyLimit {
        caller: CallerId,
        in_flight: u32,
        limit: u32,
    },

    #[error("Caller '{caller}' must wait {wait_ms} ms before the next request (lag: {lag_ms} ms)")]
    TooSoon {
        caller: CallerId,
        wait_ms: u64,
        lag_ms: u64,
    },
}

#[derive(Debug, Default)]
struct CallerState {
    in_flight: u32,
    last_admitted: Option<Instant>,
    /// Lag in effect at the last admission
    lag: Duration,
}

impl CallerState {
    /// Whether throttling still needs this caller's history
    fn is_live(&self, now: Instant, retention: Duration) -> bool {
        self.in_flight > 0
            || self.last_admitted.is_some_and(|at| {
                now.saturating_duration_since(at) < retention.max(self.lag)
            })
    }
}

/// Per-caller admission gate shared by all requests
#[derive(Debug)]
pub struct ThrottleController {
    callers: Mutex<HashMap<CallerId, CallerState>>,
    next_sequence: AtomicU64,
    idle_retention: Duration,
}

impl Default for ThrottleController {
    fn default() -> Self {
        Self::new(DEFAULT_IDLE_RETENTION)
    }
}

impl ThrottleController {
    pub fn new(idle_retention: Duration) -> Self {
        Self {
            callers: Mutex::new(HashMap::new()),
            next_sequence: AtomicU64::new(0),
            idle_retention,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<CallerId, CallerState>> {
        self.callers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Admit a request or reject it immediately.
    ///
    /// The returned permit counts as one in-flight request until dropped.
    pub fn admit(
        self: &Arc<Self>,
        caller: &CallerId,
        options: &QueryOptions,
    ) -> Result<AdmissionPermit, ThrottledError> {
        let now = Instant::now();
        let mut callers = self.lock();

        let retention = self.idle_retention;
        callers.retain(|_, state| state.is_live(now, retention));

        let state = callers.entry(caller.clone()).or_default();

        let limit = options.cross_request_limit;
        if limit > 0 && state.in_flight >= limit {
            return Err(ThrottledError::ConcurrencyLimit {
                caller: caller.clone(),
                in_flight: state.in_flight,
                limit,
            });
        }

        let lag = options.cross_request_lag();
        if let Some(last) = state.last_admitted {
            let since = now.saturating_duration_since(last);
            if since < lag {
                return Err(ThrottledError::TooSoon {
                    caller: caller.clone(),
                    wait_ms: (lag - since).as_micros().div_ceil(1000) as u64,
                    lag_ms: options.cross_request_lag_ms,
                });
            }
        }

        state.in_flight += 1;
        state.last_admitted = Some(now);
        state.lag = lag;
        let sequence = self.next_sequence.fetch_add(1, Ordering::Relaxed);
        debug!(
            "Admitted request #{} for caller {} ({} in flight)",
            sequence, caller, state.in_flight
        );

        Ok(AdmissionPermit {
            controller: Arc::clone(self),
            caller: caller.clone(),
            sequence,
            budget: Budget::starting_at(now, options.time_budget()),
        })
    }

    /// Requests currently in flight for a caller
    pub fn in_flight(&self, caller: &CallerId) -> u32 {
        self.lock().get(caller).map_or(0, |s| s.in_flight)
    }

    fn release(&self, caller: &CallerId) {
        let mut callers = self.lock();
        if let Some(state) = callers.get_mut(caller) {
            state.in_flight = state.in_flight.saturating_sub(1);
        }
    }
}

/// Proof of admission. Dropping it ends the request's in-flight slot.
#[derive(Debug)]
pub struct AdmissionPermit {
    controller: Arc<ThrottleController>,
    caller: CallerId,
    sequence: u64,
    budget: Budget,
}

impl AdmissionPermit {
    /// Admission order across all callers (FIFO key for scheduling)
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn caller(&self) -> &CallerId {
        &self.caller
    }

    /// Budget whose deadline is admission time plus the request's time budget
    pub fn budget(&self) -> Budget {
        self.budget
    }
}

impl Drop for AdmissionPermit {
    fn drop(&mut self) {
        self.controller.release(&self.caller);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(limit: u32, lag_ms: u64) -> QueryOptions {
        QueryOptions::default()
            .with_cross_request_limit(limit)
            .with_cross_request_lag_ms(lag_ms)
    }

    #[tokio::test(start_paused = true)]
    async fn test_limit_one_rejects_second_in_flight() {
        let controller = Arc::new(ThrottleController::default());
        let caller = CallerId::new("alice");
        let opts = options(1, 0);

        let first = controller.admit(&caller, &opts).unwrap();
        let err = controller.admit(&caller, &opts).unwrap_err();
        assert!(matches!(err, ThrottledError::ConcurrencyLimit { limit: 1, .. }));

        drop(first);
        assert_eq!(controller.in_flight(&caller), 0);
        assert!(controller.admit(&caller, &opts).is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_callers_are_independent() {
        let controller = Arc::new(ThrottleController::default());
        let opts = options(1, 10);

        let _a = controller.admit(&CallerId::new("a"), &opts).unwrap();
        let _b = controller.admit(&CallerId::new("b"), &opts).unwrap();
        assert_eq!(controller.in_flight(&CallerId::new("a")), 1);
        assert_eq!(controller.in_flight(&CallerId::new("b")), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_lag_enforces_spacing() {
        let controller = Arc::new(ThrottleController::default());
        let caller = CallerId::new("alice");
        let opts = options(0, 10);

        let _first = controller.admit(&caller, &opts).unwrap();

        tokio::time::advance(Duration::from_millis(4)).await;
        let err = controller.admit(&caller, &opts).unwrap_err();
        assert_eq!(
            err,
            ThrottledError::TooSoon {
                caller: caller.clone(),
                wait_ms: 6,
                lag_ms: 10
            }
        );

        tokio::time::advance(Duration::from_millis(6)).await;
        assert!(controller.admit(&caller, &opts).is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_limit_and_lag_disable_checks() {
        let controller = Arc::new(ThrottleController::default());
        let caller = CallerId::new("batch");
        let opts = options(0, 0);

        let permits: Vec<_> = (0..5)
            .map(|_| controller.admit(&caller, &opts).unwrap())
            .collect();
        assert_eq!(controller.in_flight(&caller), 5);
        drop(permits);
        assert_eq!(controller.in_flight(&caller), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sequence_increases_and_budget_starts_at_admission() {
        let controller = Arc::new(ThrottleController::default());
        let opts = options(0, 0).with_time_budget_ms(40);

        let first = controller.admit(&CallerId::new("a"), &opts).unwrap();
        let second = controller.admit(&CallerId::new("b"), &opts).unwrap();
        assert!(first.sequence() < second.sequence());
        assert_eq!(first.budget().remaining(), Duration::from_millis(40));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_is_rounded_up() {
        let controller = Arc::new(ThrottleController::default());
        let caller = CallerId::new("alice");
        let opts = options(0, 10);

        let _first = controller.admit(&caller, &opts).unwrap();
        tokio::time::advance(Duration::from_micros(9_600)).await;

        let err = controller.admit(&caller, &opts).unwrap_err();
        assert!(matches!(err, ThrottledError::TooSoon { wait_ms: 1, .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_lag_outlives_idle_retention() {
        let controller = Arc::new(ThrottleController::default());
        let opts = options(1, 120_000);
        let caller = CallerId::new("alice");

        drop(controller.admit(&caller, &opts).unwrap());
        tokio::time::advance(Duration::from_secs(61)).await;

        // another caller's admission runs the pruning pass
        let _other = controller.admit(&CallerId::new("bob"), &opts).unwrap();
        let err = controller.admit(&caller, &opts).unwrap_err();
        assert!(matches!(
            err,
            ThrottledError::TooSoon { wait_ms: 59_000, lag_ms: 120_000, .. }
        ));

        tokio::time::advance(Duration::from_secs(59)).await;
        assert!(controller.admit(&caller, &opts).is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_callers_are_pruned_once_lag_has_passed() {
        let controller = Arc::new(ThrottleController::new(Duration::from_millis(100)));
        let opts = options(1, 50);
        let caller = CallerId::new("alice");

        drop(controller.admit(&caller, &opts).unwrap());
        tokio::time::advance(Duration::from_millis(150)).await;

        let _other = controller.admit(&CallerId::new("bob"), &opts).unwrap();
        assert!(!controller.lock().contains_key(&caller));
        assert!(controller.admit(&caller, &opts).is_ok());
    }
}
