//! Domain layer for ensemble-broker
//!
//! This crate contains the core types and pure logic of the broker.
//! It has no dependencies on infrastructure, async runtimes, or presentation.
//!
//! # Core Concepts
//!
//! ## Providers
//!
//! A provider is an external model (embedding lookup, SVM, Bayes, key search)
//! that answers a query with zero or one `(answer, confidence)` pair. Each has
//! a relative weight: its estimated contribution to the ensemble.
//!
//! ## Flat ensemble / Mix groups
//!
//! - **Flat ensemble** (default): every registered provider, registry
//!   weights, weighted-average combination
//! - **Mix group**: a named subset with per-member weight overrides and its
//!   own strategy (`max` or `avg`)
//!
//! ## Verdict
//!
//! Aggregation yields either one best answer or the explicit
//! `NoConfidentAnswer` sentinel, which callers escalate to a human.

pub mod core;
pub mod ensemble;
pub mod mix;
pub mod provider;
pub mod request;

// Re-export commonly used types
pub use core::{
    error::{InvalidOptionsError, RegistryError},
    query::Query,
};
pub use ensemble::{Aggregator, AnswerResult, ProviderResponse, Verdict};
pub use mix::{MixGroup, MixGroupRegistry, MixMember, MixStrategy};
pub use provider::{EnsembleMember, ModelProvider, ProviderRegistry};
pub use request::{CallerId, LifecycleError, QueryLifecycle, QueryOptions, QueryPhase};
