//! Configuration parsing for `concord.yml`

use concord_concepts::RequestSettings;
use concord_engine::{EngineSettings, Record};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    ParseError(#[from] serde_yaml::Error),
}

/// Main configuration struct matching the concord.yml schema
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineSettings,

    #[serde(default)]
    pub server: RequestSettings,

    /// Requests replayed before any script, e.g. to register users
    #[serde(default)]
    pub seed: Vec<ScriptRequest>,
}

/// One request: a path plus arbitrary body fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptRequest {
    pub path: String,

    #[serde(flatten)]
    pub body: Record,
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&contents)
    }

    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        // an empty file is a valid, all-defaults config
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(contents)?)
    }

    /// Load `path` if it exists, defaults otherwise
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path.exists() {
            Self::from_file(path)
        } else {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            Ok(Self::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_sections() {
        let config = Config::from_yaml("engine:\n  max_depth: 8\n").unwrap();
        assert_eq!(config.engine.max_depth, 8);
        assert_eq!(config.engine.max_steps, 10_000);
        assert_eq!(config.server, RequestSettings::default());
        assert!(config.seed.is_empty());
    }

    #[test]
    fn test_seed_requests_keep_body_fields() {
        let yaml = r#"
seed:
  - path: /UserAuthentication/register
    username: alice
    password: pw1
"#;
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.seed.len(), 1);
        let seed = &config.seed[0];
        assert_eq!(seed.path, "/UserAuthentication/register");
        assert_eq!(seed.body.get("username"), Some(&serde_json::json!("alice")));
        assert!(!seed.body.contains_key("path"));
    }

    #[test]
    fn test_empty_file_is_default() {
        assert_eq!(Config::from_yaml("  \n").unwrap(), Config::default());
    }

    #[test]
    fn test_bad_yaml_is_a_parse_error() {
        let err = Config::from_yaml("engine: [").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }
}
