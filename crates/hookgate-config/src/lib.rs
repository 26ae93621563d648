//! hookgate-config: JSON5 configuration for the hook engine.
//!
//! Loaded from `~/.hookgate/config.json5`. Every field has a default so a
//! missing config file is not an error — hooks must keep working out of the
//! box.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON5 parse error: {0}")]
    Json5(#[from] json5::Error),
    #[error("Config directory not found")]
    NoDirFound,
}

/// One advisory rule: files whose path ends with `suffix` get `guidance`
/// surfaced the first time they are touched in a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvisoryRule {
    /// Path suffix to match (e.g. ".ts", "Dockerfile").
    pub suffix: String,
    /// Guidance text surfaced to the agent's model.
    pub guidance: String,
}

/// Top-level hookgate configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HookgateConfig {
    /// Path to the execution log database.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
    /// Debounce window for post-action reviews, in milliseconds.
    #[serde(default = "default_review_debounce_ms")]
    pub review_debounce_ms: i64,
    /// Advisory rules matched against file-touching pre-action events.
    #[serde(default)]
    pub advisories: Vec<AdvisoryRule>,
}

fn default_db_path() -> PathBuf {
    config_dir()
        .map(|d| d.join("hookgate.db"))
        .unwrap_or_else(|_| PathBuf::from("hookgate.db"))
}

fn default_review_debounce_ms() -> i64 {
    120_000
}

impl Default for HookgateConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            review_debounce_ms: default_review_debounce_ms(),
            advisories: Vec::new(),
        }
    }
}

/// Resolve the hookgate config directory (~/.hookgate/).
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    dirs::home_dir()
        .map(|h| h.join(".hookgate"))
        .ok_or(ConfigError::NoDirFound)
}

/// Resolve the config file path (~/.hookgate/config.json5).
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("config.json5"))
}

/// Load configuration from the default path, falling back to defaults.
pub fn load_config() -> Result<HookgateConfig, ConfigError> {
    let path = config_file_path()?;
    load_config_from(&path)
}

/// Load configuration from a specific path, falling back to defaults if not found.
pub fn load_config_from(path: &Path) -> Result<HookgateConfig, ConfigError> {
    if !path.exists() {
        tracing::debug!("Config file not found at {}, using defaults", path.display());
        return Ok(HookgateConfig::default());
    }

    let content = std::fs::read_to_string(path)?;
    let config: HookgateConfig = json5::from_str(&content)?;
    Ok(config)
}

/// Ensure the config directory exists.
pub fn ensure_config_dir() -> Result<PathBuf, ConfigError> {
    let dir = config_dir()?;
    if !dir.exists() {
        std::fs::create_dir_all(&dir)?;
    }
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = HookgateConfig::default();
        assert_eq!(config.review_debounce_ms, 120_000);
        assert!(config.advisories.is_empty());
        assert!(config.db_path.ends_with("hookgate.db"));
    }

    #[test]
    fn test_json5_parse() {
        let json5_str = r#"{
            db_path: "/tmp/hooks.db",
            review_debounce_ms: 3000,
            advisories: [
                { suffix: ".ts", guidance: "Use strict mode" },
            ],
        }"#;
        let config: HookgateConfig = json5::from_str(json5_str).unwrap();
        assert_eq!(config.db_path, PathBuf::from("/tmp/hooks.db"));
        assert_eq!(config.review_debounce_ms, 3000);
        assert_eq!(config.advisories.len(), 1);
        assert_eq!(config.advisories[0].suffix, ".ts");
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: HookgateConfig = json5::from_str("{ review_debounce_ms: 500 }").unwrap();
        assert_eq!(config.review_debounce_ms, 500);
        assert!(config.advisories.is_empty());
    }

    #[test]
    fn test_missing_file_falls_back() {
        let config = load_config_from(Path::new("/nonexistent/config.json5")).unwrap();
        assert_eq!(config.review_debounce_ms, 120_000);
    }
}
