//! Configuration IO helpers for the resolver settings file.

use std::{
    env, fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use dirs_next::config_dir;
use intake_util::expand_tilde;
use tracing::debug;

use super::{ResolverConfig, validate_config};

/// Environment variable overriding the settings file location.
pub const CONFIG_PATH_ENV: &str = "INTAKE_CONFIG_PATH";

/// Returns the default path for the resolver configuration file.
pub fn default_config_path() -> PathBuf {
    if let Ok(path) = env::var(CONFIG_PATH_ENV)
        && !path.trim().is_empty()
    {
        return expand_tilde(&path);
    }

    config_dir().unwrap_or_else(|| PathBuf::from(".")).join("intake").join("resolver.json")
}

/// Loads the resolver configuration from the default path.
pub fn load_config() -> anyhow::Result<ResolverConfig> {
    load_config_from_path(&default_config_path())
}

/// Loads the resolver configuration from `path`.
///
/// A missing file yields the defaults.
pub fn load_config_from_path(path: &Path) -> anyhow::Result<ResolverConfig> {
    if !path.exists() {
        debug!(path = %path.display(), "resolver config not found; using defaults");
        return Ok(ResolverConfig::default());
    }

    let content = fs::read_to_string(path).with_context(|| format!("failed to read resolver config: {}", path.display()))?;
    let config: ResolverConfig =
        serde_json::from_str(&content).with_context(|| format!("invalid resolver config: {}", path.display()))?;
    validate_config(&config)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_path_honors_environment_override() {
        let override_path = "~/custom/intake/resolver.json";
        temp_env::with_var(CONFIG_PATH_ENV, Some(override_path), || {
            assert_eq!(default_config_path(), expand_tilde(override_path));
        });
    }

    #[test]
    fn blank_override_falls_back_to_config_dir() {
        temp_env::with_var(CONFIG_PATH_ENV, Some("   "), || {
            assert!(default_config_path().ends_with("intake/resolver.json"));
        });
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = load_config_from_path(&dir.path().join("absent.json")).expect("load defaults");
        assert_eq!(config, ResolverConfig::default());
    }

    #[test]
    fn loads_and_validates_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("resolver.json");
        fs::write(&path, r#"{"modelNameGuesses": ["Opportunity"], "executionTimeoutMs": 1500}"#).expect("write config");

        let config = load_config_from_path(&path).expect("load config");
        assert_eq!(config.model_name_guesses, vec!["Opportunity".to_string()]);
        assert_eq!(config.execution_timeout_ms, 1500);

        fs::write(&path, r#"{"executionTimeoutMs": 0}"#).expect("write config");
        let error = load_config_from_path(&path).expect_err("zero timeout rejected");
        assert!(error.to_string().contains("executionTimeoutMs"), "error: {error}");
    }

    #[test]
    fn malformed_file_reports_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("resolver.json");
        fs::write(&path, "{ not json").expect("write config");

        let error = load_config_from_path(&path).expect_err("malformed config rejected");
        assert!(error.to_string().contains("invalid resolver config"), "error: {error}");
    }
}
