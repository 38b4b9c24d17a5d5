//! Model providers and the process-wide model registry.

pub mod entities;
pub mod registry;

pub use entities::{EnsembleMember, ModelProvider};
pub use registry::ProviderRegistry;
