//! Answer Query use case
//!
//! The single entry point callers use. Validates the request, resolves the
//! ensemble, asks the throttle controller for admission, dispatches, and
//! aggregates:
//!
//! ```text
//! validate ─▶ resolve ─▶ admit ──▶ dispatch ──▶ aggregate ──▶ RETURNED
//!                          │           │
//!                          │           └─ deadline, nothing usable ─▶ TIMED_OUT
//!                          └─ throttled ─▶ REJECTED
//! ```

use super::dispatch::{DispatchRequest, Dispatcher};
use crate::config::BrokerParams;
use crate::ports::model_provider::ProviderHandles;
use crate::ports::progress::{DispatchNotifier, NoProgress};
use crate::throttle::{ThrottleController, ThrottledError, WorkerPool};
use broker_domain::{
    Aggregator, CallerId, EnsembleMember, InvalidOptionsError, LifecycleError, MixGroupRegistry,
    MixStrategy, ProviderRegistry, ProviderResponse, Query, QueryLifecycle, QueryOptions,
    QueryPhase, Verdict,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Label used for the registry-wide ensemble
pub const FLAT_ENSEMBLE: &str = "flat";

/// Errors returned synchronously to the caller. The request was never dispatched.
#[derive(Error, Debug)]
pub enum AnswerError {
    #[error("Throttled: {0}")]
    Throttled(#[from] ThrottledError),

    #[error("Invalid options: {0}")]
    InvalidOptions(#[from] InvalidOptionsError),

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
}

impl AnswerError {
    /// Terminal phase of the refused request, if it reached admission
    pub fn phase(&self) -> Option<QueryPhase> {
        match self {
            AnswerError::Throttled(_) => Some(QueryPhase::Rejected),
            AnswerError::InvalidOptions(_) | AnswerError::Lifecycle(_) => None,
        }
    }
}

/// How the request ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryStatus {
    /// Aggregation ran; the verdict may still be `NoConfidentAnswer`
    Returned,
    /// The budget ran out before any usable response arrived
    TimedOut,
}

impl QueryStatus {
    pub fn as_str(&self) -> &str {
        match self {
            QueryStatus::Returned => "returned",
            QueryStatus::TimedOut => "timed_out",
        }
    }
}

impl std::fmt::Display for QueryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Everything the caller gets back from one `answer` call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryOutcome {
    pub query_id: u64,
    /// `flat` or the mix group name
    pub ensemble: String,
    pub verdict: Verdict,
    pub status: QueryStatus,
    /// In-time responses, in registration order
    pub responses: Vec<ProviderResponse>,
    pub elapsed_ms: u64,
}

impl QueryOutcome {
    pub fn is_timed_out(&self) -> bool {
        self.status == QueryStatus::TimedOut
    }
}

/// Ensemble selected for a request
struct Selection<'a> {
    label: &'a str,
    members: &'a [EnsembleMember],
    strategy: MixStrategy,
}

/// Use case for answering a query with the provider ensemble
pub struct AnswerQueryUseCase {
    groups: Arc<MixGroupRegistry>,
    flat_members: Vec<EnsembleMember>,
    dispatcher: Dispatcher,
    throttle: Arc<ThrottleController>,
    aggregator: Aggregator,
    defaults: QueryOptions,
}

impl AnswerQueryUseCase {
    pub fn new(
        providers: Arc<ProviderRegistry>,
        groups: Arc<MixGroupRegistry>,
        handles: Arc<ProviderHandles>,
        params: &BrokerParams,
    ) -> Self {
        Self {
            flat_members: providers.flat_members(),
            groups,
            dispatcher: Dispatcher::new(handles, WorkerPool::new(params.workers)),
            throttle: Arc::new(ThrottleController::new(params.idle_caller_retention)),
            aggregator: Aggregator::new(params.confidence_floor),
            defaults: params.defaults.clone(),
        }
    }

    /// Options applied when the caller has none of its own
    pub fn defaults(&self) -> &QueryOptions {
        &self.defaults
    }

    pub fn throttle(&self) -> &Arc<ThrottleController> {
        &self.throttle
    }

    /// Answer with no progress reporting
    pub async fn answer(
        &self,
        caller: &CallerId,
        text: &str,
        options: QueryOptions,
    ) -> Result<QueryOutcome, AnswerError> {
        self.answer_with_progress(caller, text, options, &NoProgress)
            .await
    }

    /// Answer with progress callbacks
    pub async fn answer_with_progress(
        &self,
        caller: &CallerId,
        text: &str,
        options: QueryOptions,
        progress: &dyn DispatchNotifier,
    ) -> Result<QueryOutcome, AnswerError> {
        let query = Query::try_new(text)?;
        options.validate()?;
        let selection = self.select(options.mix_group.as_deref())?;

        let permit = match self.throttle.admit(caller, &options) {
            Ok(permit) => permit,
            Err(e) => {
                let err = AnswerError::from(e);
                if let Some(phase) = err.phase() {
                    info!("Request from {} {}: {}", caller, phase, err);
                }
                return Err(err);
            }
        };

        let budget = permit.budget();
        let mut lifecycle = QueryLifecycle::admitted(permit.sequence());
        info!(
            "Query #{} admitted for {} ({} ensemble, {} ms budget)",
            lifecycle.id(),
            caller,
            selection.label,
            options.time_budget_ms
        );

        lifecycle.advance(QueryPhase::Dispatched)?;
        let report = self
            .dispatcher
            .dispatch(
                DispatchRequest {
                    query: &query,
                    budget,
                    priority: options.priority,
                    sequence: permit.sequence(),
                },
                selection.label,
                selection.members,
                progress,
            )
            .await;

        let has_usable = report
            .responses
            .iter()
            .any(|r| r.usable_answer().is_some());

        let (verdict, status) = if report.deadline_reached && !has_usable {
            lifecycle.advance(QueryPhase::TimedOut)?;
            info!(
                "Query #{} timed out with no usable response ({} of {} call(s) returned)",
                lifecycle.id(),
                report.responses.len(),
                report.issued
            );
            (Verdict::NoConfidentAnswer, QueryStatus::TimedOut)
        } else {
            lifecycle.advance(QueryPhase::Aggregated)?;
            let verdict =
                self.aggregator
                    .aggregate(&report.responses, selection.members, selection.strategy);
            lifecycle.advance(QueryPhase::Returned)?;
            match &verdict {
                Verdict::Answered(result) => info!(
                    "Query #{} answered {:?} ({:.3})",
                    lifecycle.id(),
                    result.answer,
                    result.confidence
                ),
                Verdict::NoConfidentAnswer => {
                    info!("Query #{} has no confident answer", lifecycle.id())
                }
            }
            (verdict, QueryStatus::Returned)
        };

        let elapsed_ms = budget.elapsed().as_millis() as u64;
        debug!("Query #{} finished in {} ms", lifecycle.id(), elapsed_ms);

        Ok(QueryOutcome {
            query_id: lifecycle.id(),
            ensemble: selection.label.to_string(),
            verdict,
            status,
            responses: report.responses,
            elapsed_ms,
        })
    }

    fn select<'a>(&'a self, mix_group: Option<&'a str>) -> Result<Selection<'a>, InvalidOptionsError> {
        match mix_group {
            None => Ok(Selection {
                label: FLAT_ENSEMBLE,
                members: &self.flat_members,
                strategy: MixStrategy::Avg,
            }),
            Some(name) => {
                let group = self
                    .groups
                    .resolve(name)
                    .map_err(|_| InvalidOptionsError::UnknownGroup(name.to_string()))?;
                Ok(Selection {
                    label: &group.name,
                    members: &group.members,
                    strategy: group.strategy,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::model_provider::{
        CallContext, ProviderAnswer, ProviderCapability, ProviderError,
    };
    use async_trait::async_trait;
    use broker_domain::{MixMember, ModelProvider};
    use std::collections::HashMap;
    use std::time::Duration;

    enum Script {
        Answer(&'static str, f64),
        Nothing,
        Fail,
    }

    struct ScriptedProvider {
        script: Script,
        delay: Duration,
    }

    #[async_trait]
    impl ProviderCapability for ScriptedProvider {
        async fn call(
            &self,
            _query: &str,
            _ctx: &CallContext,
        ) -> Result<Option<ProviderAnswer>, ProviderError> {
            tokio::time::sleep(self.delay).await;
            match self.script {
                Script::Answer(answer, confidence) => {
                    Ok(Some(ProviderAnswer::new(answer, confidence)))
                }
                Script::Nothing => Ok(None),
                Script::Fail => Err(ProviderError::ConnectionError("refused".to_string())),
            }
        }
    }

    const WEIGHTS: [(&str, f64); 4] = [
        ("embedding", 35.0),
        ("svm", 25.0),
        ("bayes", 15.0),
        ("keysearch", 5.0),
    ];

    fn broker(
        scripts: Vec<(&str, Script, u64)>,
        params: BrokerParams,
    ) -> AnswerQueryUseCase {
        let mut providers = ProviderRegistry::new();
        for (name, weight) in WEIGHTS {
            providers.register(ModelProvider::new(name, weight)).unwrap();
        }

        let mut groups = MixGroupRegistry::new();
        groups
            .define_group(
                &providers,
                "mix1",
                vec![
                    MixMember::new("embedding").with_weight(35.0),
                    MixMember::new("svm").with_weight(25.0),
                ],
                MixStrategy::Max,
            )
            .unwrap();

        let mut handles: ProviderHandles = HashMap::new();
        for (name, script, delay_ms) in scripts {
            handles.insert(
                name.to_string(),
                Arc::new(ScriptedProvider {
                    script,
                    delay: Duration::from_millis(delay_ms),
                }),
            );
        }

        AnswerQueryUseCase::new(
            Arc::new(providers),
            Arc::new(groups),
            Arc::new(handles),
            &params,
        )
    }

    fn paris_scripts() -> Vec<(&'static str, Script, u64)> {
        vec![
            ("embedding", Script::Answer("Paris", 0.9), 10),
            ("svm", Script::Answer("Paris", 0.6), 5),
            ("bayes", Script::Nothing, 5),
            ("keysearch", Script::Nothing, 1),
        ]
    }

    fn caller() -> CallerId {
        CallerId::new("test")
    }

    #[tokio::test(start_paused = true)]
    async fn test_flat_ensemble_weighted_average() {
        let broker = broker(paris_scripts(), BrokerParams::default());

        let outcome = broker
            .answer(&caller(), "capital of France", QueryOptions::default())
            .await
            .unwrap();

        assert_eq!(outcome.status, QueryStatus::Returned);
        assert_eq!(outcome.ensemble, FLAT_ENSEMBLE);
        assert_eq!(outcome.responses.len(), 4);
        let result = outcome.verdict.answer().unwrap();
        assert_eq!(result.answer, "Paris");
        assert!((result.confidence - 0.775).abs() < 1e-9);
        assert_eq!(
            result.contributing_providers.iter().collect::<Vec<_>>(),
            vec!["embedding", "svm"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_mix_group_max_strategy() {
        let broker = broker(
            vec![
                ("embedding", Script::Answer("A", 0.5), 5),
                ("svm", Script::Answer("B", 0.8), 5),
            ],
            BrokerParams::default(),
        );

        let outcome = broker
            .answer(
                &caller(),
                "which one",
                QueryOptions::default().with_mix_group("mix1"),
            )
            .await
            .unwrap();

        assert_eq!(outcome.ensemble, "mix1");
        let result = outcome.verdict.answer().unwrap();
        assert_eq!(result.answer, "B");
        assert!((result.confidence - 0.8 * 25.0 / 35.0).abs() < 1e-9);
    }

    #[tokio::test(start_paused = true)]
    async fn test_floor_yields_no_confident_answer() {
        let broker = broker(
            paris_scripts(),
            BrokerParams::default().with_confidence_floor(0.8),
        );

        let outcome = broker
            .answer(&caller(), "capital of France", QueryOptions::default())
            .await
            .unwrap();

        assert_eq!(outcome.status, QueryStatus::Returned);
        assert_eq!(outcome.verdict, Verdict::NoConfidentAnswer);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timed_out_when_nothing_usable_arrives() {
        let broker = broker(
            vec![
                ("embedding", Script::Answer("Paris", 0.9), 80),
                ("svm", Script::Nothing, 5),
            ],
            BrokerParams::default(),
        );

        let outcome = broker
            .answer(&caller(), "capital of France", QueryOptions::default())
            .await
            .unwrap();

        assert!(outcome.is_timed_out());
        assert_eq!(outcome.verdict, Verdict::NoConfidentAnswer);
        assert_eq!(outcome.elapsed_ms, 50);
    }

    #[tokio::test(start_paused = true)]
    async fn test_usable_answer_before_deadline_is_returned() {
        let broker = broker(
            vec![
                ("embedding", Script::Answer("Paris", 0.9), 80),
                ("svm", Script::Answer("Lyon", 0.6), 5),
            ],
            BrokerParams::default(),
        );

        let outcome = broker
            .answer(&caller(), "capital of France", QueryOptions::default())
            .await
            .unwrap();

        assert_eq!(outcome.status, QueryStatus::Returned);
        assert_eq!(outcome.verdict.answer().unwrap().answer, "Lyon");
    }

    #[tokio::test(start_paused = true)]
    async fn test_provider_failure_is_absorbed() {
        let broker = broker(
            vec![
                ("embedding", Script::Fail, 1),
                ("svm", Script::Answer("Paris", 0.6), 5),
            ],
            BrokerParams::default(),
        );

        let outcome = broker
            .answer(&caller(), "capital of France", QueryOptions::default())
            .await
            .unwrap();

        let result = outcome.verdict.answer().unwrap();
        assert_eq!(result.answer, "Paris");
        assert_eq!(result.confidence, 0.6);
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_concurrent_request_is_throttled() {
        let broker = Arc::new(broker(paris_scripts(), BrokerParams::default()));
        let opts = QueryOptions::default()
            .with_cross_request_limit(1)
            .with_cross_request_lag_ms(0);

        let first = tokio::spawn({
            let broker = Arc::clone(&broker);
            let opts = opts.clone();
            async move { broker.answer(&caller(), "first", opts).await }
        });
        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(broker.throttle().in_flight(&caller()), 1);

        let second = broker.answer(&caller(), "second", opts.clone()).await;
        let err = second.unwrap_err();
        assert!(matches!(
            err,
            AnswerError::Throttled(ThrottledError::ConcurrencyLimit { .. })
        ));
        assert_eq!(err.phase(), Some(QueryPhase::Rejected));

        assert!(first.await.unwrap().is_ok());
        assert_eq!(broker.throttle().in_flight(&caller()), 0);
        assert!(broker.answer(&caller(), "third", opts).await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_requests_are_never_admitted() {
        let broker = broker(paris_scripts(), BrokerParams::default());

        let err = broker
            .answer(&caller(), "   ", QueryOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AnswerError::InvalidOptions(InvalidOptionsError::EmptyQuery)
        ));

        let err = broker
            .answer(
                &caller(),
                "capital of France",
                QueryOptions::default().with_mix_group("nope"),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AnswerError::InvalidOptions(InvalidOptionsError::UnknownGroup(ref g)) if g == "nope"
        ));

        let err = broker
            .answer(
                &caller(),
                "capital of France",
                QueryOptions::default().with_time_budget_ms(0),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AnswerError::InvalidOptions(InvalidOptionsError::ZeroBudget)
        ));
        assert_eq!(err.phase(), None);

        // nothing above consumed the caller's lag window
        assert!(
            broker
                .answer(&caller(), "capital of France", QueryOptions::default())
                .await
                .is_ok()
        );
    }
}
