//! Provider declarations from TOML (`[[providers]]` array)

use broker_domain::ModelProvider;
use serde::{Deserialize, Serialize};

/// One `[[providers]]` entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileProviderConfig {
    /// Unique provider name, referenced by mix groups
    pub name: String,
    /// Relative weight (estimated contribution); must be > 0
    pub weight: f64,
    /// HTTP endpoint answering `POST {"query": ...}`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Delay before this provider is called, added to the previous provider's
    #[serde(default)]
    pub launch_delay_ms: u64,
}

impl FileProviderConfig {
    pub fn new(name: impl Into<String>, weight: f64) -> Self {
        Self {
            name: name.into(),
            weight,
            endpoint: None,
            launch_delay_ms: 0,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn to_model_provider(&self) -> ModelProvider {
        ModelProvider::new(self.name.clone(), self.weight).with_launch_delay_ms(self.launch_delay_ms)
    }
}
