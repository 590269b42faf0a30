// ABOUTME: App configuration types and parsing for hangar.yml.
// ABOUTME: Handles discovery, YAML parsing, env merging, and the sanitized release definition.

mod build;
mod error;
mod machines;
mod platform;
mod resolver;
mod services;
mod validate;

pub use build::BuildConfig;
pub use error::{ConfigError, Result};
pub use machines::DEFAULT_PROCESS_GROUP;
pub use platform::Platform;
pub use resolver::ConfigResolver;
pub use services::{CheckConfig, CheckKind, DeployConfig, ServiceConfig, ServicePort};
pub use validate::Validation;

use crate::types::AppName;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

pub const CONFIG_FILENAME: &str = "hangar.yml";
pub const CONFIG_FILENAME_ALT: &str = "hangar.yaml";
pub const CONFIG_FILENAME_DIR: &str = ".hangar/config.yml";

/// Env key the pipeline fills from `primary_region` when unset.
pub const PRIMARY_REGION_ENV: &str = "PRIMARY_REGION";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app: Option<AppName>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub primary_region: String,

    #[serde(default)]
    pub env: HashMap<String, String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build: Option<BuildConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<Platform>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deploy: Option<DeployConfig>,

    /// Process group name to command line.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub processes: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub services: Vec<ServiceConfig>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub checks: BTreeMap<String, CheckConfig>,

    /// Where this config was loaded from. Empty for remote configs.
    #[serde(skip)]
    config_path: PathBuf,
}

impl AppConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(ConfigError::from)
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_yaml(&content)?;
        config.config_path = path.to_path_buf();
        Ok(config)
    }

    /// Look for a config file in `dir`. A missing file is not an error: the
    /// config is then fetched from the control plane.
    pub fn discover(dir: &Path) -> Result<Option<Self>> {
        let candidates = [
            dir.join(CONFIG_FILENAME),
            dir.join(CONFIG_FILENAME_ALT),
            dir.join(CONFIG_FILENAME_DIR),
        ];

        for path in &candidates {
            if path.is_file() {
                return Self::load(path).map(Some);
            }
        }

        Ok(None)
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn set_config_path(&mut self, path: impl Into<PathBuf>) {
        self.config_path = path.into();
    }

    /// Merge variables into `env`; incoming values replace existing ones.
    pub fn set_env_variables(&mut self, vars: impl IntoIterator<Item = (String, String)>) {
        self.env.extend(vars);
    }

    pub fn set_env_variable(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.env.insert(key.into(), value.into());
    }

    /// Copy `primary_region` into the `PRIMARY_REGION` env var unless it is
    /// already set to something non-empty.
    pub fn inject_primary_region(&mut self) {
        let already_set = self
            .env
            .get(PRIMARY_REGION_ENV)
            .is_some_and(|v| !v.is_empty());
        if !self.primary_region.is_empty() && !already_set {
            let region = self.primary_region.clone();
            self.set_env_variable(PRIMARY_REGION_ENV, region);
        }
    }

    pub fn build_strategies(&self) -> Vec<String> {
        self.build
            .as_ref()
            .map(BuildConfig::strategies)
            .unwrap_or_default()
    }

    pub fn build_image(&self) -> Option<&str> {
        self.build.as_ref().and_then(BuildConfig::image)
    }

    pub fn dockerfile(&self) -> Option<&str> {
        self.build.as_ref().and_then(BuildConfig::dockerfile)
    }

    pub fn ignorefile(&self) -> Option<&str> {
        self.build.as_ref().and_then(BuildConfig::ignorefile)
    }

    pub fn docker_build_target(&self) -> Option<&str> {
        self.build.as_ref().and_then(BuildConfig::build_target)
    }

    pub fn deploy_strategy(&self) -> Option<&str> {
        self.deploy
            .as_ref()
            .and_then(|d| d.strategy.as_deref())
            .filter(|s| !s.is_empty())
    }

    /// The app definition sent along with a release. Local-only sections
    /// (`app`, `build`) are stripped.
    pub fn sanitized_definition(&self) -> Result<serde_json::Map<String, serde_json::Value>> {
        let value = serde_json::to_value(self)?;
        let mut definition = match value {
            serde_json::Value::Object(map) => map,
            _ => serde_json::Map::new(),
        };
        definition.remove("app");
        definition.remove("build");
        Ok(definition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inject_primary_region_fills_missing_env() {
        let mut config = AppConfig {
            primary_region: "ams".to_string(),
            ..Default::default()
        };
        config.inject_primary_region();
        assert_eq!(config.env.get(PRIMARY_REGION_ENV).map(String::as_str), Some("ams"));
    }

    #[test]
    fn inject_primary_region_keeps_existing_value() {
        let mut config = AppConfig {
            primary_region: "ams".to_string(),
            ..Default::default()
        };
        config.set_env_variable(PRIMARY_REGION_ENV, "ord");
        config.inject_primary_region();
        assert_eq!(config.env.get(PRIMARY_REGION_ENV).map(String::as_str), Some("ord"));
    }

    #[test]
    fn inject_primary_region_overwrites_empty_value() {
        let mut config = AppConfig {
            primary_region: "ams".to_string(),
            ..Default::default()
        };
        config.set_env_variable(PRIMARY_REGION_ENV, "");
        config.inject_primary_region();
        assert_eq!(config.env.get(PRIMARY_REGION_ENV).map(String::as_str), Some("ams"));
    }

    #[test]
    fn inject_without_primary_region_is_noop() {
        let mut config = AppConfig::default();
        config.inject_primary_region();
        assert!(config.env.is_empty());
    }

    #[test]
    fn sanitized_definition_strips_local_sections() {
        let config = AppConfig::from_yaml(
            r#"
app: web
primary_region: ams
env:
  LOG_LEVEL: info
build:
  dockerfile: Dockerfile.prod
"#,
        )
        .unwrap();

        let definition = config.sanitized_definition().unwrap();
        assert!(!definition.contains_key("app"));
        assert!(!definition.contains_key("build"));
        assert_eq!(definition["primary_region"], "ams");
        assert_eq!(definition["env"]["LOG_LEVEL"], "info");
    }
}
