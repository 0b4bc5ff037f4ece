//! Data model for resolver configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default execution timeout applied to deferred handles.
const DEFAULT_EXECUTION_TIMEOUT_MS: u64 = 30_000;

/// Tunables for model discovery, query construction and execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct ResolverConfig {
    /// Case-insensitive substrings identifying the target model in the schema registry.
    pub model_hints: Vec<String>,

    /// Literal model names tried, in order, when no registry entry matches a hint.
    pub model_name_guesses: Vec<String>,

    /// Filter keys tried in priority order, external spelling first.
    pub filter_keys: Vec<String>,

    /// Alternate identifying fields tried when no filter key is accepted.
    pub fallback_filter_keys: Vec<String>,

    /// Row limit applied when the backend supports limiting. `None` disables it.
    pub query_limit: Option<usize>,

    /// Upper bound on waiting for a deferred execution handle.
    pub execution_timeout_ms: u64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            model_hints: vec!["inquir".to_string(), "deal".to_string()],
            model_name_guesses: vec![
                "Inquiry".to_string(),
                "Inquiries".to_string(),
                "Deal".to_string(),
                "Deals".to_string(),
            ],
            filter_keys: vec!["Id".to_string(), "id".to_string()],
            fallback_filter_keys: vec!["UniqueId".to_string(), "unique_id".to_string()],
            query_limit: Some(1),
            execution_timeout_ms: DEFAULT_EXECUTION_TIMEOUT_MS,
        }
    }
}

impl ResolverConfig {
    pub fn execution_timeout(&self) -> Duration {
        Duration::from_millis(self.execution_timeout_ms)
    }

    pub fn with_execution_timeout(mut self, timeout: Duration) -> Self {
        self.execution_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }
}

/// Configuration validation failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{field} must contain at least one non-blank entry")]
    EmptyList { field: &'static str },

    #[error("queryLimit must be greater than zero when set")]
    ZeroLimit,

    #[error("executionTimeoutMs must be greater than zero")]
    ZeroTimeout,
}

/// Checks that a configuration can drive a resolution.
pub fn validate_config(config: &ResolverConfig) -> Result<(), ConfigError> {
    let lists = [
        ("modelHints", &config.model_hints),
        ("modelNameGuesses", &config.model_name_guesses),
        ("filterKeys", &config.filter_keys),
    ];
    for (field, entries) in lists {
        if entries.iter().all(|entry| entry.trim().is_empty()) {
            return Err(ConfigError::EmptyList { field });
        }
    }
    if config.query_limit == Some(0) {
        return Err(ConfigError::ZeroLimit);
    }
    if config.execution_timeout_ms == 0 {
        return Err(ConfigError::ZeroTimeout);
    }
    Ok(())
}
