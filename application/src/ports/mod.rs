//! Port definitions (interfaces implemented by outer layers).

pub mod model_provider;
pub mod progress;

pub use model_provider::{
    CallContext, ProviderAnswer, ProviderCapability, ProviderError, ProviderHandles,
};
pub use progress::{DispatchNotifier, NoProgress, ProviderOutcome};
