//! Configuration loading and parsing

use anyhow::{Context, Result};
use health_events::ServiceConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main application configuration (loaded from config.toml)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub service: Option<ServiceConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
    /// JSON file holding the persisted collections
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

fn default_store_path() -> PathBuf {
    PathBuf::from("health-events.json")
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

/// Load a configuration file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;
    let config: AppConfig = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.store.path, PathBuf::from("health-events.json"));
        assert!(config.service.is_none());
    }

    #[test]
    fn test_full_config_parses() {
        let config: AppConfig = toml::from_str(
            r#"
            [store]
            path = "family.json"

            [service]
            collection = "family_events"
            subject_limit = 25
            "#,
        )
        .unwrap();

        assert_eq!(config.store.path, PathBuf::from("family.json"));
        let service = config.service.unwrap();
        assert_eq!(service.collection, "family_events");
        assert_eq!(service.subject_limit, 25);
        assert_eq!(service.family_limit, 100); // default filled in
    }
}
