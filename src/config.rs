//! Runtime configuration: media roots, hierarchy policy, HTTP context,
//! logging.

use std::path::{Path, PathBuf};

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

use crate::logging::LoggingConfig;
use crate::media::index::HierarchyMode;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MediatreeConfig {
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Indexing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Directory trees to index and watch.
    #[serde(default)]
    pub roots: Vec<PathBuf>,

    /// How directory structure maps onto containers.
    #[serde(default)]
    pub hierarchy: HierarchyMode,

    /// Base URL prepended to node ids to form resource locators.
    #[serde(default = "default_http_base")]
    pub http_base: String,
}

fn default_http_base() -> String {
    "http://localhost:8192".to_string()
}

impl Default for IndexConfig {
    fn default() -> Self {
        IndexConfig {
            roots: Vec::new(),
            hierarchy: HierarchyMode::default(),
            http_base: default_http_base(),
        }
    }
}

/// Layered configuration loading.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load config with precedence, lowest to highest: defaults, platform
    /// config file, ./mediatree.toml, explicit file, MEDIATREE__*
    /// environment overlay.
    pub fn load(explicit: Option<&Path>) -> Result<MediatreeConfig, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = platform_config_file() {
            builder = builder.add_source(File::from(path).required(false));
        }
        builder = builder.add_source(File::with_name("mediatree").required(false));
        if let Some(path) = explicit {
            builder = builder.add_source(File::from(path.to_path_buf()));
        }
        builder = add_environment(builder);

        builder.build()?.try_deserialize()
    }
}

fn platform_config_file() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "mediatree", "mediatree")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

/// MEDIATREE_* prefix with __ as separator for nested keys.
fn add_environment(builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
    builder.add_source(
        Environment::with_prefix("MEDIATREE")
            .separator("__")
            .try_parsing(true),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = MediatreeConfig::default();
        assert!(config.index.roots.is_empty());
        assert_eq!(config.index.hierarchy, HierarchyMode::Flatten);
        assert_eq!(config.index.http_base, "http://localhost:8192");
        assert!(config.logging.enabled);
    }

    #[test]
    fn test_deserialize_partial_toml() {
        let config: MediatreeConfig = toml::from_str(
            r#"
            [index]
            roots = ["/srv/media"]
            hierarchy = "preserve"
            "#,
        )
        .unwrap();
        assert_eq!(config.index.roots, vec![PathBuf::from("/srv/media")]);
        assert_eq!(config.index.hierarchy, HierarchyMode::Preserve);
        // untouched sections keep their defaults
        assert_eq!(config.index.http_base, "http://localhost:8192");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_load_explicit_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("custom.toml");
        std::fs::write(
            &path,
            r#"
            [index]
            http_base = "http://media.lan:9000"

            [logging]
            level = "debug"
            "#,
        )
        .unwrap();

        let config = ConfigLoader::load(Some(&path)).unwrap();
        assert_eq!(config.index.http_base, "http://media.lan:9000");
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_load_missing_explicit_file_fails() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("absent.toml");
        assert!(ConfigLoader::load(Some(&path)).is_err());
    }
}
