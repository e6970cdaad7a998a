//! In-process store of integration configs, loaded once at startup.

use crate::{ConfigError, ConfigResult, parse_integration_config, pattern_warnings};
use hookline_core::integration::IntegrationConfig;
use std::collections::HashMap;
use std::path::Path;
use tracing::{info, warn};

/// Integration configs keyed by `(namespace, name)`.
#[derive(Debug, Clone, Default)]
pub struct ConfigStore {
    configs: HashMap<(String, String), IntegrationConfig>,
}

impl ConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every `*.kdl` file in `dir`.
    pub fn load_dir(dir: impl AsRef<Path>) -> ConfigResult<Self> {
        let dir = dir.as_ref();
        let mut store = Self::new();

        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "kdl") {
                paths.push(path);
            }
        }
        paths.sort();

        for path in paths {
            let content = std::fs::read_to_string(&path)?;
            let config = parse_integration_config(&content).map_err(|e| {
                ConfigError::InvalidValue {
                    field: path.display().to_string(),
                    message: e.to_string(),
                }
            })?;

            for warning in pattern_warnings(&config) {
                warn!(path = %path.display(), "{}", warning);
            }

            info!(
                path = %path.display(),
                namespace = %config.namespace,
                config = %config.name,
                "Loaded integration config"
            );
            store.insert(config)?;
        }

        Ok(store)
    }

    /// Add a config. Fails if one with the same namespace and name exists.
    pub fn insert(&mut self, config: IntegrationConfig) -> ConfigResult<()> {
        let key = (config.namespace.clone(), config.name.clone());
        if self.configs.contains_key(&key) {
            return Err(ConfigError::Duplicate(format!(
                "integration config {}/{}",
                key.0, key.1
            )));
        }
        self.configs.insert(key, config);
        Ok(())
    }

    pub fn get(&self, namespace: &str, name: &str) -> Option<&IntegrationConfig> {
        self.configs
            .get(&(namespace.to_string(), name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }
}
