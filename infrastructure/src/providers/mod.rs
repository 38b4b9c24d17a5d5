//! Provider capability adapters
//!
//! Turns the `[[providers]]` configuration into the capability table the
//! dispatcher calls through.

mod http;

pub use http::HttpProvider;

use crate::config::{ConfigError, FileProviderConfig};
use broker_application::ProviderHandles;
use std::sync::Arc;
use tracing::warn;

/// Build one HTTP capability per provider that has an endpoint.
///
/// All providers share one connection pool. Providers without an endpoint
/// are left out; the dispatcher skips them.
pub fn build_handles(providers: &[FileProviderConfig]) -> Result<ProviderHandles, ConfigError> {
    let client = reqwest::Client::builder()
        .user_agent(concat!("ensemble-broker/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

    let mut handles = ProviderHandles::new();
    for provider in providers {
        match provider.endpoint.as_deref().map(str::trim) {
            Some(endpoint) if !endpoint.is_empty() => {
                handles.insert(
                    provider.name.clone(),
                    Arc::new(HttpProvider::new(&provider.name, endpoint, client.clone())),
                );
            }
            _ => warn!(
                "Provider {} has no endpoint; it will never be called",
                provider.name
            ),
        }
    }
    Ok(handles)
}
