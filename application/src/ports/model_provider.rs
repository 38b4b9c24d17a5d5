//! Model provider port
//!
//! Defines the capability every external model exposes to the broker:
//! given a query, return zero or one `(answer, confidence)` within a deadline.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Errors a provider call can produce. The dispatcher absorbs all of them.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timeout")]
    Timeout,

    #[error("Cancelled")]
    Cancelled,

    #[error("Other error: {0}")]
    Other(String),
}

/// A provider's answer to a query
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderAnswer {
    pub answer: String,
    pub confidence: f64,
}

impl ProviderAnswer {
    pub fn new(answer: impl Into<String>, confidence: f64) -> Self {
        Self {
            answer: answer.into(),
            confidence,
        }
    }
}

/// Per-call context handed to a provider
///
/// `cancellation` fires when the broker stops waiting for this call; providers
/// that can abort their work early should watch it.
#[derive(Debug, Clone)]
pub struct CallContext {
    pub deadline: Instant,
    pub cancellation: CancellationToken,
}

impl CallContext {
    pub fn new(deadline: Instant) -> Self {
        Self {
            deadline,
            cancellation: CancellationToken::new(),
        }
    }

    /// Time left before the deadline (zero once passed)
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }
}

/// Capability exposed by one external model
///
/// Must be safe to call concurrently. Implementations should return promptly
/// after the deadline, but the dispatcher enforces it regardless.
#[async_trait]
pub trait ProviderCapability: Send + Sync {
    async fn call(
        &self,
        query: &str,
        ctx: &CallContext,
    ) -> Result<Option<ProviderAnswer>, ProviderError>;
}

/// Capabilities keyed by provider name
pub type ProviderHandles = HashMap<String, Arc<dyn ProviderCapability>>;
