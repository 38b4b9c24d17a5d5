//! Application layer for ensemble-broker
//!
//! This crate contains use cases, port definitions, admission control, and
//! application configuration. It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod throttle;
pub mod use_cases;

// Re-export commonly used types
pub use config::BrokerParams;
pub use ports::{
    model_provider::{
        CallContext, ProviderAnswer, ProviderCapability, ProviderError, ProviderHandles,
    },
    progress::{DispatchNotifier, NoProgress, ProviderOutcome},
};
pub use throttle::{Budget, BudgetExceededError, ThrottleController, ThrottledError, WorkerPool};
pub use use_cases::answer_query::{
    AnswerError, AnswerQueryUseCase, FLAT_ENSEMBLE, QueryOutcome, QueryStatus,
};
pub use use_cases::dispatch::{DispatchReport, DispatchRequest, Dispatcher};
