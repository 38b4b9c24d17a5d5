//! Mix group registry

use super::group::{MixGroup, MixMember};
use super::strategy::MixStrategy;
use crate::core::error::RegistryError;
use crate::provider::{EnsembleMember, ProviderRegistry};
use crate::provider::entities::is_valid_weight;
use std::collections::HashMap;

/// Named mix groups, each resolved against the model registry at definition time
#[derive(Debug, Clone, Default)]
pub struct MixGroupRegistry {
    groups: HashMap<String, MixGroup>,
    order: Vec<String>,
}

impl MixGroupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Define a new group.
    ///
    /// Every member must name a registered provider, and overrides follow the
    /// same weight rule as the registry itself.
    pub fn define_group(
        &mut self,
        providers: &ProviderRegistry,
        name: impl Into<String>,
        members: Vec<MixMember>,
        strategy: MixStrategy,
    ) -> Result<(), RegistryError> {
        let name = name.into();
        if self.groups.contains_key(&name) {
            return Err(RegistryError::DuplicateGroup(name));
        }
        if members.is_empty() {
            return Err(RegistryError::EmptyGroup(name));
        }

        let mut resolved: Vec<EnsembleMember> = Vec::with_capacity(members.len());
        for member in members {
            let index = providers.index_of(&member.provider).ok_or_else(|| {
                RegistryError::UnknownProvider {
                    group: name.clone(),
                    provider: member.provider.clone(),
                }
            })?;
            if resolved.iter().any(|m| m.index == index) {
                return Err(RegistryError::DuplicateMember {
                    group: name,
                    provider: member.provider,
                });
            }

            let provider = &providers.list()[index];
            let weight = member.weight.unwrap_or(provider.weight());
            if !is_valid_weight(weight) {
                return Err(RegistryError::InvalidWeight {
                    name: member.provider,
                    weight,
                });
            }
            resolved.push(ProviderRegistry::member(index, provider, weight));
        }

        self.order.push(name.clone());
        self.groups.insert(
            name.clone(),
            MixGroup {
                name,
                strategy,
                members: resolved,
            },
        );
        Ok(())
    }

    /// Look up a group by name.
    pub fn resolve(&self, name: &str) -> Result<&MixGroup, RegistryError> {
        self.groups
            .get(name)
            .ok_or_else(|| RegistryError::UnknownGroup(name.to_string()))
    }

    /// Group names in definition order
    pub fn names(&self) -> &[String] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
