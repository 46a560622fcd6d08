//! Configuration management for the CLI
//!
//! Values are layered: optional JSON file, then `RSV_*` environment
//! variables. Command-line flags override both in `main`.

use crate::output::OutputFormat;
use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// CLI configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Region offerings are priced in
    pub region: Option<String>,
    /// Default inventory snapshot path
    pub snapshot: Option<PathBuf>,
    /// Default output format
    pub default_format: Option<String>,
    /// Tags an EKS cluster must carry to be reconciled
    #[serde(default, skip_deserializing)]
    pub cluster_selector: BTreeMap<String, String>,
    /// DB engine name -> reserved instance product description
    #[serde(default, skip_deserializing)]
    pub engine_aliases: BTreeMap<String, String>,
}

/// Maps whose keys are tag names or engine names, read straight from the
/// file: the `config` layer lowercases keys and splits them on `.`.
#[derive(Debug, Default, Deserialize)]
struct KeyedMaps {
    #[serde(default)]
    cluster_selector: BTreeMap<String, String>,
    #[serde(default)]
    engine_aliases: BTreeMap<String, String>,
}

impl KeyedMaps {
    fn read(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config {}", path.display()))
    }
}

impl Config {
    /// Load configuration from file and environment.
    ///
    /// An explicitly given file must exist; the default file is optional.
    pub fn load(path_override: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        let path = match path_override {
            Some(path) => Some(path.to_path_buf()),
            None => Self::config_path(),
        };
        if let Some(path) = &path {
            builder = builder.add_source(
                config::File::from(path.as_path())
                    .format(config::FileFormat::Json)
                    .required(path_override.is_some()),
            );
        }

        let mut loaded: Config = builder
            .add_source(config::Environment::with_prefix("RSV"))
            .build()
            .context("Failed to read config")?
            .try_deserialize()
            .context("Failed to parse config")?;

        if let Some(path) = path.filter(|p| p.exists()) {
            let maps = KeyedMaps::read(&path)?;
            loaded.cluster_selector = maps.cluster_selector;
            loaded.engine_aliases = maps.engine_aliases;
        }

        if loaded.region.is_none() {
            loaded.region = std::env::var("AWS_REGION").ok();
        }
        Ok(loaded)
    }

    /// Output format from `default_format`, table if unset or unrecognised
    pub fn output_format(&self) -> OutputFormat {
        self.default_format
            .as_deref()
            .and_then(|f| OutputFormat::from_str(f, true).ok())
            .unwrap_or_default()
    }

    /// Get the default configuration file path
    fn config_path() -> Option<PathBuf> {
        dirs_next::home_dir().map(|home| home.join(".config").join("rsv").join("config.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_explicit_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{
                "region": "eu-west-1",
                "default_format": "json",
                "cluster_selector": { "ready": "true" },
                "engine_aliases": { "aurora-mysql": "aurora-mysql" }
            }"#,
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.region.as_deref(), Some("eu-west-1"));
        assert!(matches!(config.output_format(), OutputFormat::Json));
        assert_eq!(config.cluster_selector.get("ready").map(String::as_str), Some("true"));
        assert_eq!(config.engine_aliases.len(), 1);
    }

    #[test]
    fn test_map_keys_keep_case_and_dots() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{
                "cluster_selector": { "Environment": "prod", "k8s.io/ready": "true" },
                "engine_aliases": { "Postgres": "postgresql" }
            }"#,
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.cluster_selector.len(), 2);
        assert_eq!(config.cluster_selector.get("Environment").map(String::as_str), Some("prod"));
        assert_eq!(config.cluster_selector.get("k8s.io/ready").map(String::as_str), Some("true"));
        assert_eq!(config.engine_aliases.get("Postgres").map(String::as_str), Some("postgresql"));
    }

    #[test]
    fn test_missing_explicit_file_fails() {
        let dir = TempDir::new().unwrap();
        assert!(Config::load(Some(&dir.path().join("absent.json"))).is_err());
    }

    #[test]
    fn test_unknown_format_defaults_to_table() {
        let config = Config {
            default_format: Some("yaml".to_string()),
            ..Default::default()
        };
        assert!(matches!(config.output_format(), OutputFormat::Table));
    }
}
