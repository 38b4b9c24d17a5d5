//! Ensemble results: provider responses, aggregation, and verdicts.

pub mod aggregator;
pub mod response;
pub mod verdict;

pub use aggregator::Aggregator;
pub use response::ProviderResponse;
pub use verdict::{AnswerResult, Verdict};
