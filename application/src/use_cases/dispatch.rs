//! Dispatcher
//!
//! Fans a query out to an ensemble's providers and collects what comes back
//! before the deadline.
//!
//! - Calls are issued concurrently, each bounded by the remaining budget and
//!   holding a [`WorkerPool`] slot while it runs.
//! - An optional per-provider launch delay staggers calls: offsets accumulate
//!   in member order, and a provider whose launch time is not before the
//!   deadline is never called.
//! - Failed calls count as "no answer"; late calls are dropped silently.
//! - Output is in registration order, never completion order.

use crate::ports::model_provider::{CallContext, ProviderAnswer, ProviderError, ProviderHandles};
use crate::ports::progress::{DispatchNotifier, ProviderOutcome};
use crate::throttle::{Budget, WorkerPool};
use broker_domain::{EnsembleMember, ProviderResponse, Query};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::{Instant, error::Elapsed};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// One query as the dispatcher sees it
#[derive(Debug, Clone, Copy)]
pub struct DispatchRequest<'a> {
    pub query: &'a Query,
    pub budget: Budget,
    pub priority: i32,
    /// Admission sequence, the FIFO key among equal priorities
    pub sequence: u64,
}

/// What a dispatch collected
#[derive(Debug, Clone, Default)]
pub struct DispatchReport {
    /// In-time responses, ordered by registration index
    pub responses: Vec<ProviderResponse>,
    /// Number of provider calls actually issued
    pub issued: usize,
    /// Whether the budget ran out before every provider had been heard from
    pub deadline_reached: bool,
}

type CallResult = Result<Result<Option<ProviderAnswer>, ProviderError>, Elapsed>;

pub struct Dispatcher {
    providers: Arc<ProviderHandles>,
    pool: Arc<WorkerPool>,
}

impl Dispatcher {
    pub fn new(providers: Arc<ProviderHandles>, pool: Arc<WorkerPool>) -> Self {
        Self { providers, pool }
    }

    pub fn pool(&self) -> &Arc<WorkerPool> {
        &self.pool
    }

    /// Dispatch `request` to `members` and collect responses until every
    /// call has finished or the deadline passes, whichever comes first.
    pub async fn dispatch(
        &self,
        request: DispatchRequest<'_>,
        ensemble: &str,
        members: &[EnsembleMember],
        progress: &dyn DispatchNotifier,
    ) -> DispatchReport {
        let budget = request.budget;
        if budget.check().is_err() {
            debug!("Budget exhausted before dispatch; no providers called");
            progress.on_dispatch_start(ensemble, 0);
            progress.on_dispatch_complete(0, true);
            return DispatchReport {
                deadline_reached: true,
                ..DispatchReport::default()
            };
        }

        let deadline = budget.deadline();
        let cancellation = CancellationToken::new();
        let query: Arc<str> = Arc::from(request.query.text());
        let mut join_set = JoinSet::new();
        let mut offset = Duration::ZERO;
        let mut skipped_for_budget = 0usize;

        for member in members {
            offset += member.launch_delay();
            let launch_at = budget.admitted_at() + offset;
            if launch_at >= deadline {
                debug!(
                    "Provider {} scheduled at +{}ms, past the deadline; not called",
                    member.name,
                    offset.as_millis()
                );
                skipped_for_budget += 1;
                continue;
            }

            let Some(provider) = self.providers.get(&member.name).cloned() else {
                warn!("No capability registered for provider {}", member.name);
                continue;
            };

            let member = member.clone();
            let query = Arc::clone(&query);
            let pool = Arc::clone(&self.pool);
            let ctx = CallContext {
                deadline,
                cancellation: cancellation.child_token(),
            };
            let (priority, sequence) = (request.priority, request.sequence);

            join_set.spawn(async move {
                tokio::time::sleep_until(launch_at).await;
                let issued_at = Instant::now();
                let result: CallResult = tokio::time::timeout_at(deadline, async {
                    let _slot = pool.acquire(priority, sequence).await;
                    provider.call(&query, &ctx).await
                })
                .await;
                (member, result, issued_at, Instant::now())
            });
        }

        let issued = join_set.len();
        info!("Dispatching to {} provider(s) of {}", issued, ensemble);
        progress.on_dispatch_start(ensemble, issued);

        let mut responses = Vec::with_capacity(issued);
        let mut deadline_reached = skipped_for_budget > 0;

        loop {
            let next = match tokio::time::timeout_at(deadline, join_set.join_next()).await {
                Ok(Some(next)) => next,
                Ok(None) => break,
                Err(_) => {
                    deadline_reached = true;
                    break;
                }
            };

            let (member, result, issued_at, finished_at) = match next {
                Ok(joined) => joined,
                Err(e) => {
                    warn!("Provider task join error: {}", e);
                    continue;
                }
            };
            let latency_ms = finished_at.saturating_duration_since(issued_at).as_millis() as u64;

            if finished_at > deadline {
                debug!("Provider {} returned after the deadline; dropped", member.name);
                deadline_reached = true;
                progress.on_provider_complete(&member.name, ProviderOutcome::Late);
                continue;
            }

            match result {
                Ok(Ok(Some(answer))) => {
                    debug!(
                        "Provider {} answered {:?} ({:.3}) in {}ms",
                        member.name, answer.answer, answer.confidence, latency_ms
                    );
                    progress.on_provider_complete(&member.name, ProviderOutcome::Answered);
                    responses.push(ProviderResponse::answered(
                        &member,
                        answer.answer,
                        answer.confidence,
                        latency_ms,
                    ));
                }
                Ok(Ok(None)) => {
                    debug!("Provider {} had no answer", member.name);
                    progress.on_provider_complete(&member.name, ProviderOutcome::NoAnswer);
                    responses.push(ProviderResponse::no_answer(&member, latency_ms));
                }
                Ok(Err(e)) => {
                    warn!("Provider {} failed: {}", member.name, e);
                    progress.on_provider_complete(&member.name, ProviderOutcome::Failed);
                    responses.push(ProviderResponse::no_answer(&member, latency_ms));
                }
                Err(_) => {
                    debug!("Provider {} did not finish before the deadline", member.name);
                    deadline_reached = true;
                    progress.on_provider_complete(&member.name, ProviderOutcome::Late);
                }
            }
        }

        if !join_set.is_empty() {
            info!(
                "Deadline reached with {} call(s) outstanding; abandoning them",
                join_set.len()
            );
            cancellation.cancel();
            join_set.abort_all();
        }

        responses.sort_by_key(|r| r.index);
        progress.on_dispatch_complete(responses.len(), deadline_reached);

        DispatchReport {
            responses,
            issued,
            deadline_reached,
        }
    }
}
