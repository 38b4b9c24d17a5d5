//! Domain error types

use thiserror::Error;

/// Configuration-time errors raised while building the provider and mix group registries.
///
/// These are fatal to the registration call that produced them, never to the process.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegistryError {
    #[error("Provider name cannot be empty")]
    EmptyProviderName,

    #[error("Invalid weight for '{name}': {weight} (must be a finite number greater than 0)")]
    InvalidWeight { name: String, weight: f64 },

    #[error("Provider '{0}' is already registered")]
    DuplicateProvider(String),

    #[error("Mix group '{group}' references unknown provider '{provider}'")]
    UnknownProvider { group: String, provider: String },

    #[error("Mix group '{0}' has no members")]
    EmptyGroup(String),

    #[error("Mix group '{group}' lists provider '{provider}' more than once")]
    DuplicateMember { group: String, provider: String },

    #[error("Mix group '{0}' is already defined")]
    DuplicateGroup(String),

    #[error("Unknown mix group: {0}")]
    UnknownGroup(String),
}

/// Request-time validation errors. A request failing validation is never admitted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidOptionsError {
    #[error("Query text cannot be empty")]
    EmptyQuery,

    #[error("Time budget must be greater than 0 ms")]
    ZeroBudget,

    #[error("Unknown mix group: {0}")]
    UnknownGroup(String),
}
