//! Budget & throttle control.
//!
//! - [`ThrottleController`] - per-caller admission (concurrency limit and lag)
//! - [`Budget`] - per-request monotonic deadline
//! - [`WorkerPool`] - bounded, priority-ordered slots for provider calls

pub mod budget;
pub mod controller;
pub mod pool;

pub use budget::{Budget, BudgetExceededError};
pub use controller::{AdmissionPermit, ThrottleController, ThrottledError};
pub use pool::{WorkerPool, WorkerSlot};
