//! HTTP provider adapter
//!
//! Calls a model served over HTTP:
//!
//! ```text
//! POST <endpoint>   {"query": "..."}
//! 200 OK            {"answer": "Paris", "confidence": 0.9}
//!                   {"answer": null}          (no answer)
//! ```
//!
//! The request timeout is the remaining budget at call time, and the call
//! is abandoned as soon as the dispatcher cancels it.

use async_trait::async_trait;
use broker_application::{CallContext, ProviderAnswer, ProviderCapability, ProviderError};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Serialize)]
struct AnswerRequest<'a> {
    query: &'a str,
}

#[derive(Debug, Deserialize)]
struct AnswerBody {
    #[serde(default)]
    answer: Option<String>,
    #[serde(default)]
    confidence: f64,
}

impl AnswerBody {
    fn into_answer(self) -> Option<ProviderAnswer> {
        let confidence = if self.confidence.is_nan() {
            0.0
        } else {
            self.confidence.clamp(0.0, 1.0)
        };
        self.answer
            .map(|answer| ProviderAnswer::new(answer, confidence))
    }
}

/// A model reachable over HTTP
#[derive(Debug, Clone)]
pub struct HttpProvider {
    name: String,
    endpoint: String,
    client: reqwest::Client,
}

impl HttpProvider {
    pub fn new(
        name: impl Into<String>,
        endpoint: impl Into<String>,
        client: reqwest::Client,
    ) -> Self {
        Self {
            name: name.into(),
            endpoint: endpoint.into(),
            client,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn post(
        &self,
        query: &str,
        ctx: &CallContext,
    ) -> Result<Option<ProviderAnswer>, ProviderError> {
        let response = self
            .client
            .post(&self.endpoint)
            .timeout(ctx.remaining())
            .json(&AnswerRequest { query })
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::RequestFailed(format!(
                "HTTP {} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown")
            )));
        }

        let body: AnswerBody = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;
        Ok(body.into_answer())
    }
}

fn map_reqwest_error(e: reqwest::Error) -> ProviderError {
    if e.is_timeout() {
        ProviderError::Timeout
    } else if e.is_connect() {
        ProviderError::ConnectionError(e.to_string())
    } else {
        ProviderError::RequestFailed(e.to_string())
    }
}

#[async_trait]
impl ProviderCapability for HttpProvider {
    async fn call(
        &self,
        query: &str,
        ctx: &CallContext,
    ) -> Result<Option<ProviderAnswer>, ProviderError> {
        if ctx.remaining().is_zero() {
            return Err(ProviderError::Timeout);
        }
        debug!("POST {} for provider {}", self.endpoint, self.name);

        tokio::select! {
            _ = ctx.cancellation.cancelled() => Err(ProviderError::Cancelled),
            result = self.post(query, ctx) => result,
        }
    }
}
