//! Query requests: options, caller identity, and lifecycle.

pub mod lifecycle;
pub mod options;

pub use lifecycle::{LifecycleError, QueryLifecycle, QueryPhase};
pub use options::{CallerId, QueryOptions};
