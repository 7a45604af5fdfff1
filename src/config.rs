//! TOML-backed configuration (teacher's `LintConfig` pattern: parse from a
//! string, fall back to an embedded default via `include_str!`).

use std::path::PathBuf;

use serde::Deserialize;

use crate::error::RikaiError;

/// Embedded default configuration, used when no `--config` file is given.
pub static DEFAULT_CONFIG: &str = include_str!("config.toml");

#[derive(Debug, Clone, Deserialize)]
pub struct RikaiSection {
    pub ingest_path: PathBuf,
    pub ingest_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TypeDbSection {
    pub hostname: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RulesSection {
    pub path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RikaiConfig {
    pub rikai: RikaiSection,
    pub typedb: TypeDbSection,
    pub rules: RulesSection,
}

impl RikaiConfig {
    pub fn from_toml(text: &str) -> Result<Self, RikaiError> {
        toml::from_str(text).map_err(|e| RikaiError::MalformedRule(e.to_string()))
    }

    pub fn default_config() -> Self {
        Self::from_toml(DEFAULT_CONFIG).expect("embedded default config must be valid")
    }

    pub fn load(path: &std::path::Path) -> Result<Self, RikaiError> {
        let text = std::fs::read_to_string(path).map_err(|e| RikaiError::MalformedRule(e.to_string()))?;
        Self::from_toml(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_parses() {
        let config = RikaiConfig::default_config();
        assert_eq!(config.typedb.port, 1729);
        assert_eq!(config.rules.path, PathBuf::from("rules"));
    }

    #[test]
    fn from_toml_rejects_missing_fields() {
        let err = RikaiConfig::from_toml("[rikai]\ningest_path = \"x\"").unwrap_err();
        assert!(matches!(err, RikaiError::MalformedRule(_)));
    }
}
