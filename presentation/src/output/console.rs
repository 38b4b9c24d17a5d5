//! Console output formatter for query outcomes

use broker_application::{QueryOutcome, QueryStatus};
use broker_domain::Verdict;
use colored::Colorize;

/// Printed when no provider produced a confident answer
pub const HUMAN_ASSIST: &str = "human assist";

/// Formats query outcomes for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Format the complete outcome
    pub fn format(question: &str, outcome: &QueryOutcome) -> String {
        let mut output = String::new();

        output.push_str(&Self::header("Ensemble Answer"));
        output.push('\n');

        output.push_str(&format!("{} {}\n", "Question:".cyan().bold(), question));
        output.push_str(&format!(
            "{} {}  {} {}  {} {} ms\n",
            "Ensemble:".cyan().bold(),
            outcome.ensemble,
            "Status:".cyan().bold(),
            Self::status_label(outcome.status),
            "Elapsed:".cyan().bold(),
            outcome.elapsed_ms
        ));

        output.push_str(&Self::section_header("Responses"));
        if outcome.responses.is_empty() {
            output.push_str(&format!("  {}\n", "(none before the deadline)".dimmed()));
        }
        for response in &outcome.responses {
            match response.usable_answer() {
                Some(answer) => output.push_str(&format!(
                    "  {} {:<12} {:<24} {:.3}  {}\n",
                    "v".green(),
                    response.provider,
                    answer,
                    response.confidence,
                    format!("{} ms", response.latency_ms).dimmed()
                )),
                None => output.push_str(&format!(
                    "  {} {:<12} {}  {}\n",
                    "-".dimmed(),
                    response.provider,
                    "no answer".dimmed(),
                    format!("{} ms", response.latency_ms).dimmed()
                )),
            }
        }

        output.push_str(&Self::section_header("Verdict"));
        match &outcome.verdict {
            Verdict::Answered(result) => {
                output.push_str(&format!(
                    "\n{} {}\n",
                    "Answer:".green().bold(),
                    result.answer
                ));
                output.push_str(&format!(
                    "{} {:.3}\n",
                    "Confidence:".cyan().bold(),
                    result.confidence
                ));
                output.push_str(&format!(
                    "{} {}\n",
                    "Contributors:".cyan().bold(),
                    result
                        .contributing_providers
                        .iter()
                        .map(String::as_str)
                        .collect::<Vec<_>>()
                        .join(", ")
                ));
            }
            Verdict::NoConfidentAnswer => {
                output.push_str(&format!("\n{}\n", HUMAN_ASSIST.yellow().bold()));
            }
        }

        output.push_str(&Self::footer());

        output
    }

    /// Format as JSON
    pub fn format_json(outcome: &QueryOutcome) -> String {
        serde_json::to_string_pretty(outcome).unwrap_or_else(|_| "{}".to_string())
    }

    /// Format the answer only: the answer text, or "human assist"
    pub fn format_answer_only(outcome: &QueryOutcome) -> String {
        match &outcome.verdict {
            Verdict::Answered(result) => result.answer.clone(),
            Verdict::NoConfidentAnswer => HUMAN_ASSIST.to_string(),
        }
    }

    fn status_label(status: QueryStatus) -> String {
        match status {
            QueryStatus::Returned => status.as_str().green().to_string(),
            QueryStatus::TimedOut => status.as_str().yellow().to_string(),
        }
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    fn footer() -> String {
        format!("\n{}\n", "=".repeat(60).cyan())
    }
}
