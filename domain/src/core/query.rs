//! Query value object

use super::error::InvalidOptionsError;
use serde::{Deserialize, Serialize};

/// Free-text query to be answered by the ensemble (Value Object)
///
/// Holds the text exactly as given; only the emptiness check looks at
/// the trimmed form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    text: String,
}

impl Query {
    /// Create a query, rejecting empty or whitespace-only text
    pub fn try_new(text: impl Into<String>) -> Result<Self, InvalidOptionsError> {
        let text = text.into();
        if text.trim().is_empty() {
            Err(InvalidOptionsError::EmptyQuery)
        } else {
            Ok(Self { text })
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }
}

impl std::fmt::Display for Query {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.text)
    }
}

impl TryFrom<&str> for Query {
    type Error = InvalidOptionsError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Query::try_new(s)
    }
}
