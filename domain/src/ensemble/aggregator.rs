//! Answer aggregation
//!
//! Folds the responses collected for one query into a single [`Verdict`].
//! The fold is a pure function of the response set: responses are ordered by
//! registration index first, so arrival order never changes the outcome.

use super::response::{ProviderResponse, clamp_confidence};
use super::verdict::{AnswerResult, Verdict};
use crate::mix::MixStrategy;
use crate::provider::EnsembleMember;
use std::collections::BTreeSet;

/// Combines provider responses under a confidence floor
///
/// # Example
///
/// ```
/// use broker_domain::ensemble::{Aggregator, ProviderResponse};
/// use broker_domain::mix::MixStrategy;
/// use broker_domain::provider::{ModelProvider, ProviderRegistry};
///
/// let mut registry = ProviderRegistry::new();
/// registry.register(ModelProvider::new("embedding", 35.0)).unwrap();
/// registry.register(ModelProvider::new("svm", 25.0)).unwrap();
/// let members = registry.flat_members();
///
/// let responses = vec![
///     ProviderResponse::answered(&members[0], "Paris", 0.9, 12),
///     ProviderResponse::answered(&members[1], "Paris", 0.6, 20),
/// ];
///
/// let verdict = Aggregator::default().aggregate(&responses, &members, MixStrategy::Avg);
/// let result = verdict.answer().unwrap();
/// assert_eq!(result.answer, "Paris");
/// assert!((result.confidence - 0.775).abs() < 1e-9);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aggregator {
    confidence_floor: f64,
}

impl Default for Aggregator {
    fn default() -> Self {
        Self {
            confidence_floor: 0.0,
        }
    }
}

/// Running state for one distinct answer string
struct Tally<'a> {
    answer: &'a str,
    weighted_sum: f64,
    weight_total: f64,
    best_scaled: f64,
    /// Set while every contribution so far carries the same confidence
    uniform_confidence: Option<f64>,
    contributors: BTreeSet<String>,
}

impl<'a> Tally<'a> {
    fn new(answer: &'a str) -> Self {
        Self {
            answer,
            weighted_sum: 0.0,
            weight_total: 0.0,
            best_scaled: 0.0,
            uniform_confidence: None,
            contributors: BTreeSet::new(),
        }
    }

    fn add(&mut self, provider: &str, confidence: f64, weight: f64, max_weight: f64) {
        self.weighted_sum += confidence * weight;
        self.weight_total += weight;
        self.best_scaled = self.best_scaled.max(confidence * (weight / max_weight));
        self.uniform_confidence = match (self.contributors.is_empty(), self.uniform_confidence) {
            (true, _) => Some(confidence),
            (false, Some(seen)) if seen == confidence => Some(seen),
            _ => None,
        };
        self.contributors.insert(provider.to_string());
    }

    fn combined(&self, strategy: MixStrategy) -> f64 {
        match strategy {
            // the weighted mean of equal confidences is that confidence, not a rounding of it
            MixStrategy::Avg => self
                .uniform_confidence
                .unwrap_or(self.weighted_sum / self.weight_total),
            MixStrategy::Max => self.best_scaled,
        }
    }
}

impl Aggregator {
    /// Create an aggregator with the given floor (clamped to [0, 1])
    pub fn new(confidence_floor: f64) -> Self {
        Self {
            confidence_floor: clamp_confidence(confidence_floor),
        }
    }

    pub fn confidence_floor(&self) -> f64 {
        self.confidence_floor
    }

    /// Combine responses into a verdict.
    ///
    /// `members` supplies the effective weight of each provider. Responses
    /// from providers outside `members`, or without a usable answer, do not
    /// participate.
    pub fn aggregate(
        &self,
        responses: &[ProviderResponse],
        members: &[EnsembleMember],
        strategy: MixStrategy,
    ) -> Verdict {
        let max_weight = members.iter().map(|m| m.weight).fold(0.0, f64::max);

        let mut usable: Vec<(&ProviderResponse, &str, f64)> = responses
            .iter()
            .filter_map(|r| {
                let answer = r.usable_answer()?;
                let weight = members.iter().find(|m| m.name == r.provider)?.weight;
                Some((r, answer, weight))
            })
            .collect();
        usable.sort_by_key(|(r, _, _)| r.index);

        // tallies are created in order of their lowest contributing index
        let mut tallies: Vec<Tally> = Vec::new();
        for (response, answer, weight) in usable {
            let position = match tallies.iter().position(|t| t.answer == answer) {
                Some(position) => position,
                None => {
                    tallies.push(Tally::new(answer));
                    tallies.len() - 1
                }
            };
            tallies[position].add(&response.provider, response.confidence, weight, max_weight);
        }

        let mut winner: Option<(&Tally, f64)> = None;
        for tally in &tallies {
            let combined = tally.combined(strategy);
            match winner {
                Some((_, best)) if combined <= best => {}
                _ => winner = Some((tally, combined)),
            }
        }

        match winner {
            Some((tally, confidence)) if confidence >= self.confidence_floor => {
                Verdict::Answered(AnswerResult {
                    answer: tally.answer.to_string(),
                    confidence,
                    contributing_providers: tally.contributors.clone(),
                })
            }
            _ => Verdict::NoConfidentAnswer,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mix::{MixGroupRegistry, MixMember};
    use crate::provider::{ModelProvider, ProviderRegistry};

    fn registry() -> ProviderRegistry {
        let mut registry = ProviderRegistry::new();
        registry.register(ModelProvider::new("embedding", 35.0)).unwrap();
        registry.register(ModelProvider::new("svm", 25.0)).unwrap();
        registry.register(ModelProvider::new("bayes", 15.0)).unwrap();
        registry.register(ModelProvider::new("keysearch", 5.0)).unwrap();
        registry
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_weighted_average_example() {
        let members = registry().flat_members();
        let responses = vec![
            ProviderResponse::answered(&members[0], "Paris", 0.9, 10),
            ProviderResponse::answered(&members[1], "Paris", 0.6, 10),
            ProviderResponse::no_answer(&members[2], 10),
            ProviderResponse::no_answer(&members[3], 10),
        ];

        let verdict = Aggregator::default().aggregate(&responses, &members, MixStrategy::Avg);
        let result = verdict.answer().unwrap();
        assert_eq!(result.answer, "Paris");
        assert!(approx(result.confidence, 0.775));
        assert_eq!(
            result.contributing_providers,
            BTreeSet::from(["embedding".to_string(), "svm".to_string()])
        );
    }

    #[test]
    fn test_sole_answer_keeps_exact_confidence() {
        let members = registry().flat_members();
        for (i, confidence) in [0.1, 0.3, 0.7, 0.123456789, 1.0].into_iter().enumerate() {
            let member = &members[i % members.len()];
            let responses = vec![ProviderResponse::answered(member, "X", confidence, 1)];
            let verdict = Aggregator::default().aggregate(&responses, &members, MixStrategy::Avg);
            assert_eq!(verdict.answer().unwrap().confidence, confidence);
        }
    }

    #[test]
    fn test_max_strategy_mix_group() {
        let providers = registry();
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
        let group = groups.resolve("mix1").unwrap();

        let responses = vec![
            ProviderResponse::answered(&group.members[0], "A", 0.5, 5),
            ProviderResponse::answered(&group.members[1], "B", 0.8, 5),
        ];
        let verdict = Aggregator::default().aggregate(&responses, &group.members, group.strategy);
        let result = verdict.answer().unwrap();
        assert_eq!(result.answer, "B");
        assert!(approx(result.confidence, 0.8 * 25.0 / 35.0));
    }

    #[test]
    fn test_max_strategy_low_weight_cannot_dominate() {
        let members = registry().flat_members();
        let responses = vec![
            ProviderResponse::answered(&members[0], "Lyon", 0.80, 5),
            ProviderResponse::answered(&members[3], "Nice", 0.85, 5),
        ];
        let verdict = Aggregator::default().aggregate(&responses, &members, MixStrategy::Max);
        assert_eq!(verdict.answer().unwrap().answer, "Lyon");
    }

    #[test]
    fn test_tie_goes_to_lowest_registration_index() {
        let members = registry().flat_members();
        let responses = vec![
            ProviderResponse::answered(&members[2], "B", 0.6, 1),
            ProviderResponse::answered(&members[1], "A", 0.6, 9),
        ];
        for strategy in [MixStrategy::Avg, MixStrategy::Max] {
            let uniform: Vec<_> = members
                .iter()
                .cloned()
                .map(|mut m| {
                    m.weight = 10.0;
                    m
                })
                .collect();
            let verdict = Aggregator::default().aggregate(&responses, &uniform, strategy);
            assert_eq!(verdict.answer().unwrap().answer, "A");
        }
    }

    #[test]
    fn test_tie_with_uneven_weights_goes_to_lowest_index() {
        let mut registry = ProviderRegistry::new();
        registry.register(ModelProvider::new("embedding", 3.0)).unwrap();
        registry.register(ModelProvider::new("svm", 5.0)).unwrap();
        registry.register(ModelProvider::new("bayes", 7.0)).unwrap();
        let members = registry.flat_members();

        let responses = vec![
            ProviderResponse::answered(&members[2], "A", 0.1, 1),
            ProviderResponse::answered(&members[1], "A", 0.1, 2),
            ProviderResponse::answered(&members[0], "B", 0.1, 9),
        ];

        let verdict = Aggregator::default().aggregate(&responses, &members, MixStrategy::Avg);
        let result = verdict.answer().unwrap();
        assert_eq!(result.answer, "B");
        assert_eq!(result.confidence, 0.1);
    }

    #[test]
    fn test_agreeing_contributors_keep_exact_confidence() {
        let members = registry().flat_members();
        let responses = vec![
            ProviderResponse::answered(&members[0], "Paris", 0.3, 1),
            ProviderResponse::answered(&members[1], "Paris", 0.3, 1),
            ProviderResponse::answered(&members[3], "Paris", 0.3, 1),
        ];
        let verdict = Aggregator::default().aggregate(&responses, &members, MixStrategy::Avg);
        assert_eq!(verdict.answer().unwrap().confidence, 0.3);
    }

    #[test]
    fn test_arrival_order_does_not_matter() {
        let members = registry().flat_members();
        let mut responses = vec![
            ProviderResponse::answered(&members[0], "Paris", 0.7, 1),
            ProviderResponse::answered(&members[1], "Lyon", 0.9, 2),
            ProviderResponse::answered(&members[2], "Paris", 0.8, 3),
            ProviderResponse::answered(&members[3], "Lyon", 0.4, 4),
        ];
        let aggregator = Aggregator::default();
        let forward = aggregator.aggregate(&responses, &members, MixStrategy::Avg);
        responses.reverse();
        let backward = aggregator.aggregate(&responses, &members, MixStrategy::Avg);
        assert_eq!(forward, backward);
        // idempotent
        assert_eq!(
            backward,
            aggregator.aggregate(&responses, &members, MixStrategy::Avg)
        );
    }

    #[test]
    fn test_all_empty_answers_yield_no_confident_answer() {
        let members = registry().flat_members();
        let responses = vec![
            ProviderResponse::no_answer(&members[0], 1),
            ProviderResponse::answered(&members[1], "", 0.9, 1),
            ProviderResponse::answered(&members[2], "   ", 0.9, 1),
        ];
        for strategy in [MixStrategy::Avg, MixStrategy::Max] {
            assert_eq!(
                Aggregator::default().aggregate(&responses, &members, strategy),
                Verdict::NoConfidentAnswer
            );
        }
        assert_eq!(
            Aggregator::default().aggregate(&[], &members, MixStrategy::Avg),
            Verdict::NoConfidentAnswer
        );
    }

    #[test]
    fn test_confidence_floor() {
        let members = registry().flat_members();
        let responses = vec![ProviderResponse::answered(&members[0], "Paris", 0.4, 1)];

        let strict = Aggregator::new(0.5);
        assert_eq!(
            strict.aggregate(&responses, &members, MixStrategy::Avg),
            Verdict::NoConfidentAnswer
        );

        let at_floor = Aggregator::new(0.4);
        assert!(at_floor.aggregate(&responses, &members, MixStrategy::Avg).is_answered());
    }

    #[test]
    fn test_responses_outside_members_are_ignored() {
        let members = registry().flat_members();
        let group_members = vec![members[1].clone()];
        let responses = vec![
            ProviderResponse::answered(&members[0], "Paris", 0.99, 1),
            ProviderResponse::answered(&members[1], "Lyon", 0.3, 1),
        ];
        let verdict = Aggregator::default().aggregate(&responses, &group_members, MixStrategy::Avg);
        assert_eq!(verdict.answer().unwrap().answer, "Lyon");
    }
}
