//! Dispatch progress port
//!
//! Defines the interface for reporting progress while a query fans out.

/// How a single provider call ended, from the dispatcher's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderOutcome {
    /// Returned an answer in time
    Answered,
    /// Returned in time without an answer
    NoAnswer,
    /// The call failed; counted as no answer
    Failed,
    /// Did not return before the deadline; discarded
    Late,
}

impl ProviderOutcome {
    pub fn as_str(&self) -> &str {
        match self {
            ProviderOutcome::Answered => "answered",
            ProviderOutcome::NoAnswer => "no answer",
            ProviderOutcome::Failed => "failed",
            ProviderOutcome::Late => "late",
        }
    }
}

/// Callback for progress updates during dispatch
///
/// Implementations live in the presentation layer.
pub trait DispatchNotifier: Send + Sync {
    /// Called once the calls for a query have been scheduled
    fn on_dispatch_start(&self, ensemble: &str, total_calls: usize);

    /// Called when a provider call ends (in completion order)
    fn on_provider_complete(&self, provider: &str, outcome: ProviderOutcome);

    /// Called when collection stops
    fn on_dispatch_complete(&self, collected: usize, deadline_reached: bool);
}

/// No-op notifier for when progress reporting is not needed
pub struct NoProgress;

impl DispatchNotifier for NoProgress {
    fn on_dispatch_start(&self, _ensemble: &str, _total_calls: usize) {}
    fn on_provider_complete(&self, _provider: &str, _outcome: ProviderOutcome) {}
    fn on_dispatch_complete(&self, _collected: usize, _deadline_reached: bool) {}
}
