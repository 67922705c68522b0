// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Loader configuration.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::Result;
use crate::host::HostKind;

/// Project-local config file name
pub const PROJECT_CONFIG_FILE: &str = "rpglib.toml";

/// Environment variable prefix
pub const ENV_PREFIX: &str = "RPGLIB_";

/// Configuration for loading bundles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Override for the global property name
    pub global_name: Option<String>,

    /// Validate every dependency edge at assembly
    pub strict: bool,

    /// Host shape to load into
    pub host: HostKind,

    /// Tracing filter directive
    pub log_filter: String,

    /// Manifest to load instead of the built-in library
    pub manifest: Option<PathBuf>,

    /// Unrecognized keys
    #[serde(flatten)]
    pub extra: BTreeMap<String, String>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            global_name: None,
            strict: true,
            host: HostKind::default(),
            log_filter: "rpglib=warn".to_string(),
            manifest: None,
            extra: BTreeMap::new(),
        }
    }
}

impl LoaderConfig {
    /// Load configuration from default locations.
    pub fn load() -> Result<Self> {
        let mut config = LoaderConfig::default();

        // Load from user config file
        if let Some(user_config_path) = user_config_path() {
            if user_config_path.exists() {
                config.merge_from_file(&user_config_path)?;
            }
        }

        // Load from project config
        let project_config = PathBuf::from(PROJECT_CONFIG_FILE);
        if project_config.exists() {
            config.merge_from_file(&project_config)?;
        }

        // Load from environment variables
        config.load_from_env();

        Ok(config)
    }

    /// Merge configuration from a TOML file.
    ///
    /// Scalars are applied through [`LoaderConfig::set`]; tables and arrays
    /// are skipped.
    pub fn merge_from_file(&mut self, path: &Path) -> Result<()> {
        let content = std::fs::read_to_string(path)?;
        let table: toml::Table = toml::from_str(&content)?;

        for (key, value) in table {
            let value = match value {
                toml::Value::String(s) => s,
                toml::Value::Boolean(b) => b.to_string(),
                toml::Value::Integer(n) => n.to_string(),
                toml::Value::Float(n) => n.to_string(),
                other => {
                    warn!(key = %key, kind = other.type_str(), "Ignoring non-scalar config value");
                    continue;
                }
            };
            self.set(&key, &value);
        }

        debug!(path = %path.display(), "Merged config file");
        Ok(())
    }

    /// Load configuration from `RPGLIB_*` environment variables.
    fn load_from_env(&mut self) {
        self.merge_env(std::env::vars());
    }

    /// Apply `RPGLIB_*` pairs from an environment listing.
    pub fn merge_env<I>(&mut self, vars: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            if let Some(config_key) = key.strip_prefix(ENV_PREFIX) {
                self.set(&config_key.to_lowercase(), &value);
            }
        }
    }

    /// Set a configuration value.
    pub fn set(&mut self, key: &str, value: &str) {
        match key.replace('-', "_").as_str() {
            "global_name" => self.global_name = Some(value.to_string()),
            "strict" => self.strict = value == "true",
            "host" => match value.parse() {
                Ok(host) => self.host = host,
                Err(e) => warn!("{}", e),
            },
            "log_filter" => self.log_filter = value.to_string(),
            "manifest" => self.manifest = Some(PathBuf::from(value)),
            _ => {
                self.extra.insert(key.to_string(), value.to_string());
            }
        }
    }

    /// Get a configuration value.
    pub fn get(&self, key: &str) -> Option<String> {
        match key.replace('-', "_").as_str() {
            "global_name" => self.global_name.clone(),
            "strict" => Some(self.strict.to_string()),
            "host" => Some(self.host.to_string()),
            "log_filter" => Some(self.log_filter.clone()),
            "manifest" => self.manifest.as_ref().map(|p| p.display().to_string()),
            _ => self.extra.get(key).cloned(),
        }
    }
}

/// Get the user config path.
fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("rpglib").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = LoaderConfig::default();
        assert!(config.strict);
        assert_eq!(config.host, HostKind::Browser);
        assert_eq!(config.get("log-filter").as_deref(), Some("rpglib=warn"));
        assert_eq!(config.get("global_name"), None);
    }

    #[test]
    fn test_merge_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
global_name = "Lib"
strict = false
host = "node"
retries = 3

[ignored]
key = "value"
"#
        )
        .unwrap();

        let mut config = LoaderConfig::default();
        config.merge_from_file(file.path()).unwrap();

        assert_eq!(config.global_name.as_deref(), Some("Lib"));
        assert!(!config.strict);
        assert_eq!(config.host, HostKind::Node);
        assert_eq!(config.get("retries").as_deref(), Some("3"));
        assert!(config.get("ignored").is_none());
    }

    #[test]
    fn test_invalid_toml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "strict = ").unwrap();

        let mut config = LoaderConfig::default();
        let err = config.merge_from_file(file.path()).unwrap_err();
        assert_eq!(err.code(), "ERR_CONFIG");
    }

    #[test]
    fn test_env_overrides() {
        let mut config = LoaderConfig::default();
        config.merge_env(vec![
            ("RPGLIB_HOST".to_string(), "worker".to_string()),
            ("RPGLIB_LOG_FILTER".to_string(), "rpglib=trace".to_string()),
            ("HOME".to_string(), "/root".to_string()),
        ]);

        assert_eq!(config.host, HostKind::Worker);
        assert_eq!(config.log_filter, "rpglib=trace");
        assert!(config.extra.is_empty());
    }

    #[test]
    fn test_unknown_host_keeps_previous() {
        let mut config = LoaderConfig::default();
        config.set("host", "amd");
        config.set("host", "deno");
        assert_eq!(config.host, HostKind::Amd);
    }
}
