//! Progress reporting for ensemble dispatch

use broker_application::{DispatchNotifier, ProviderOutcome};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// Reports dispatch progress on stderr with an indicatif bar
pub struct ProgressReporter {
    bar: Mutex<Option<ProgressBar>>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }

    fn dispatch_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{spinner:.green} {prefix:.bold.cyan} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-")
    }

    fn outcome_mark(outcome: ProviderOutcome) -> String {
        match outcome {
            ProviderOutcome::Answered => "v".green().to_string(),
            ProviderOutcome::NoAnswer => "-".dimmed().to_string(),
            ProviderOutcome::Failed => "x".red().to_string(),
            ProviderOutcome::Late => "~".yellow().to_string(),
        }
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl DispatchNotifier for ProgressReporter {
    fn on_dispatch_start(&self, ensemble: &str, total_calls: usize) {
        let pb = ProgressBar::with_draw_target(
            Some(total_calls as u64),
            ProgressDrawTarget::stderr(),
        );
        pb.set_style(Self::dispatch_style());
        pb.set_prefix(format!("Asking {}", ensemble));
        pb.set_message("waiting...");
        pb.enable_steady_tick(Duration::from_millis(80));

        *self.bar.lock().unwrap_or_else(PoisonError::into_inner) = Some(pb);
    }

    fn on_provider_complete(&self, provider: &str, outcome: ProviderOutcome) {
        if let Some(pb) = self
            .bar
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            pb.set_message(format!(
                "{} {} ({})",
                Self::outcome_mark(outcome),
                provider,
                outcome.as_str()
            ));
            pb.inc(1);
        }
    }

    fn on_dispatch_complete(&self, collected: usize, deadline_reached: bool) {
        if let Some(pb) = self
            .bar
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            let summary = format!("{} response(s)", collected);
            if deadline_reached {
                pb.finish_with_message(format!("{} {}", summary, "(deadline reached)".yellow()));
            } else {
                pb.finish_with_message(summary.green().to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reporter_lifecycle_clears_bar() {
        let reporter = ProgressReporter::new();
        reporter.on_dispatch_start("flat", 2);
        reporter.on_provider_complete("embedding", ProviderOutcome::Answered);
        reporter.on_provider_complete("svm", ProviderOutcome::Late);
        reporter.on_dispatch_complete(1, true);

        assert!(reporter.bar.lock().unwrap().is_none());
    }
}
