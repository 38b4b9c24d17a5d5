//! Combination strategies for mix groups
//!
//! A strategy decides how the confidences of providers that agree on the
//! same answer are folded into one combined confidence.

use serde::{Deserialize, Serialize};

/// How agreeing providers' confidences are combined
///
/// - `Avg`: weighted average of the agreeing confidences (flat ensemble default)
/// - `Max`: best single confidence, scaled by the provider's weight relative
///   to the heaviest member of the ensemble
///
/// # Example
///
/// ```
/// use broker_domain::mix::MixStrategy;
///
/// let strategy: MixStrategy = "max".parse().unwrap();
/// assert_eq!(strategy, MixStrategy::Max);
/// assert_eq!(MixStrategy::default(), MixStrategy::Avg);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MixStrategy {
    /// Weight-normalized maximum confidence
    Max,

    /// Weighted average confidence
    #[default]
    Avg,
}

impl MixStrategy {
    pub fn as_str(&self) -> &str {
        match self {
            MixStrategy::Max => "max",
            MixStrategy::Avg => "avg",
        }
    }

    pub fn description(&self) -> &str {
        match self {
            MixStrategy::Max => "max (best weight-normalized confidence)",
            MixStrategy::Avg => "avg (weighted average confidence)",
        }
    }
}

impl std::fmt::Display for MixStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for MixStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "max" => Ok(MixStrategy::Max),
            "avg" | "average" => Ok(MixStrategy::Avg),
            _ => Err(format!("Unknown mix strategy: {}. Valid: max, avg", s)),
        }
    }
}
