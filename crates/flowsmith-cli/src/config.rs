//! Runtime configuration.
//!
//! Reads the `[flowsmith]` section from `config/default.toml` (or the file
//! given with `--config`), then applies environment overrides.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Config file used when `--config` is not given.
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

pub const ENV_OUTPUT_DIR: &str = "FLOWSMITH_OUTPUT_DIR";
pub const ENV_DEFAULT_CATEGORY: &str = "FLOWSMITH_DEFAULT_CATEGORY";

/// Settings loaded from the `[flowsmith]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowsmithConfig {
    /// Root directory for deployed artifacts.
    pub output_dir: PathBuf,
    /// Default tracing filter when `RUST_LOG` is unset.
    pub log_level: String,
    /// Category for generated workflows that do not name one.
    pub default_category: String,
}

impl Default for FlowsmithConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("./generated_workflows"),
            log_level: "info".into(),
            default_category: "auto_generated".into(),
        }
    }
}

impl FlowsmithConfig {
    /// Parse a config document.  Missing keys (or a missing section) keep
    /// their defaults.
    pub fn from_toml(content: &str) -> Result<Self> {
        let defaults = Self::default();
        let table: toml::Table = content.parse().context("config is not valid TOML")?;

        let section = match table.get("flowsmith") {
            Some(toml::Value::Table(s)) => s,
            _ => return Ok(defaults),
        };

        Ok(Self {
            output_dir: section
                .get("output_dir")
                .and_then(|v| v.as_str())
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            log_level: section
                .get("log_level")
                .and_then(|v| v.as_str())
                .map(str::to_string)
                .unwrap_or(defaults.log_level),
            default_category: section
                .get("default_category")
                .and_then(|v| v.as_str())
                .filter(|s| !s.trim().is_empty())
                .map(str::to_string)
                .unwrap_or(defaults.default_category),
        })
    }

    /// Apply overrides from `lookup` (normally the process environment).
    pub fn with_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(dir) = lookup(ENV_OUTPUT_DIR).filter(|s| !s.is_empty()) {
            self.output_dir = PathBuf::from(dir);
        }
        if let Some(category) = lookup(ENV_DEFAULT_CATEGORY).filter(|s| !s.trim().is_empty()) {
            self.default_category = category;
        }
        self
    }
}

/// Load configuration.
///
/// An explicit path must exist.  The default path falls back to built-in
/// defaults when the file is missing.
pub fn load_config(explicit: Option<&Path>) -> Result<FlowsmithConfig> {
    let config = match explicit {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config file {}", path.display()))?;
            FlowsmithConfig::from_toml(&content)
                .with_context(|| format!("failed to parse {}", path.display()))?
        }
        None => match std::fs::read_to_string(DEFAULT_CONFIG_PATH) {
            Ok(content) => FlowsmithConfig::from_toml(&content)
                .with_context(|| format!("failed to parse {DEFAULT_CONFIG_PATH}"))?,
            Err(_) => FlowsmithConfig::default(),
        },
    };

    Ok(config.with_env(|key| std::env::var(key).ok()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_flowsmith_section() {
        let config = FlowsmithConfig::from_toml(
            r#"
            [flowsmith]
            output_dir = "/tmp/out"
            log_level = "debug"
            default_category = "ops"
            "#,
        )
        .unwrap();
        assert_eq!(config.output_dir, PathBuf::from("/tmp/out"));
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.default_category, "ops");
    }

    #[test]
    fn missing_section_and_keys_use_defaults() {
        assert_eq!(
            FlowsmithConfig::from_toml("[other]\nx = 1").unwrap(),
            FlowsmithConfig::default()
        );

        let partial = FlowsmithConfig::from_toml("[flowsmith]\nlog_level = \"warn\"").unwrap();
        assert_eq!(partial.log_level, "warn");
        assert_eq!(partial.output_dir, PathBuf::from("./generated_workflows"));
    }

    #[test]
    fn invalid_toml_is_an_error() {
        assert!(FlowsmithConfig::from_toml("[flowsmith").is_err());
    }

    #[test]
    fn env_overrides_file_values() {
        let config = FlowsmithConfig::default().with_env(|key| match key {
            ENV_OUTPUT_DIR => Some("/srv/flows".into()),
            ENV_DEFAULT_CATEGORY => Some(String::new()),
            _ => None,
        });
        assert_eq!(config.output_dir, PathBuf::from("/srv/flows"));
        assert_eq!(config.default_category, "auto_generated");
    }

    #[test]
    fn explicit_path_must_exist() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(load_config(Some(&tmp.path().join("missing.toml"))).is_err());

        let path = tmp.path().join("flowsmith.toml");
        std::fs::write(&path, "[flowsmith]\nlog_level = \"trace\"\n").unwrap();
        assert_eq!(load_config(Some(&path)).unwrap().log_level, "trace");
    }

    #[test]
    fn shipped_default_file_parses() {
        let content = include_str!("../../../config/default.toml");
        let config = FlowsmithConfig::from_toml(content).unwrap();
        assert_eq!(config, FlowsmithConfig::default());
    }
}
