//! Model registry
//!
//! Built once at startup, then shared read-only. There is no removal
//! operation: providers are fixed for the lifetime of the process.

use super::entities::{EnsembleMember, ModelProvider, is_valid_weight};
use crate::core::error::RegistryError;
use std::collections::HashMap;

/// Ordered set of registered model providers
#[derive(Debug, Clone, Default)]
pub struct ProviderRegistry {
    providers: Vec<ModelProvider>,
    by_name: HashMap<String, usize>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider, returning its registration index.
    pub fn register(&mut self, provider: ModelProvider) -> Result<usize, RegistryError> {
        if provider.name().trim().is_empty() {
            return Err(RegistryError::EmptyProviderName);
        }
        if self.by_name.contains_key(provider.name()) {
            return Err(RegistryError::DuplicateProvider(provider.name().to_string()));
        }
        if !is_valid_weight(provider.weight()) {
            return Err(RegistryError::InvalidWeight {
                name: provider.name().to_string(),
                weight: provider.weight(),
            });
        }

        let index = self.providers.len();
        self.by_name.insert(provider.name().to_string(), index);
        self.providers.push(provider);
        Ok(index)
    }

    /// Registered providers in insertion order
    pub fn list(&self) -> &[ModelProvider] {
        &self.providers
    }

    pub fn get(&self, name: &str) -> Option<&ModelProvider> {
        self.by_name.get(name).map(|&i| &self.providers[i])
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Every registered provider at its registry weight (the flat ensemble).
    pub fn flat_members(&self) -> Vec<EnsembleMember> {
        self.providers
            .iter()
            .enumerate()
            .map(|(index, p)| Self::member(index, p, p.weight()))
            .collect()
    }

    pub(crate) fn member(index: usize, provider: &ModelProvider, weight: f64) -> EnsembleMember {
        EnsembleMember {
            name: provider.name().to_string(),
            index,
            weight,
            launch_delay_ms: provider.launch_delay().as_millis() as u64,
        }
    }
}
