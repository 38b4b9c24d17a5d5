//! Mix group entities

use super::strategy::MixStrategy;
use crate::provider::EnsembleMember;
use serde::{Deserialize, Serialize};

/// One entry of a mix group definition, before resolution against the registry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MixMember {
    pub provider: String,
    /// Overrides the provider's registry weight within this group only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
}

impl MixMember {
    pub fn new(provider: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            weight: None,
        }
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = Some(weight);
        self
    }
}

/// A named, resolved subset of providers with its combination strategy
///
/// Members keep their declared order and carry their effective weight
/// (override, else registry weight).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MixGroup {
    pub name: String,
    pub strategy: MixStrategy,
    pub members: Vec<EnsembleMember>,
}

impl MixGroup {
    pub fn member(&self, provider: &str) -> Option<&EnsembleMember> {
        self.members.iter().find(|m| m.name == provider)
    }

    pub fn member_names(&self) -> Vec<&str> {
        self.members.iter().map(|m| m.name.as_str()).collect()
    }
}
