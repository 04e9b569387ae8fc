//! # Configuration Module
//!
//! Application configuration: the bound host plus options consumed by
//! collaborators such as the template engine.
//!
//! ## Sources
//!
//! Defaults are applied first, then caller-supplied values:
//!
//! - In code: [`Config::new`] and the builder setters
//! - From a YAML or JSON file: [`Config::from_file`]
//! - From the environment: [`Config::apply_env`]
//!
//! ## Environment Variables
//!
//! - `RHYTON_HOST`: overrides `host`
//! - `RHYTON_AUTOESCAPE`: overrides `autoescape` (`true`/`false`)
//! - `RHYTON_SEARCHPATH`: overrides `searchpath`, a platform path list
//!   (`:`-separated on Unix)
//!
//! ## Example
//!
//! ```yaml
//! host: example.com
//! autoescape: false
//! searchpath:
//!   - templates
//!   - shared/templates
//! capsule_title: My Capsule   # kept verbatim, see Config::get
//! ```

use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};

use crate::error::ConfigurationError;

/// Directory templates are looked up in when no search path is configured
pub const DEFAULT_TEMPLATE_DIR: &str = "templates";

fn default_searchpath() -> Vec<PathBuf> {
    vec![PathBuf::from(DEFAULT_TEMPLATE_DIR)]
}

/// Immutable application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// The host this application serves
    pub host: String,
    /// HTML-escape template output
    #[serde(default)]
    pub autoescape: bool,
    /// Template directories, searched in order
    #[serde(default = "default_searchpath")]
    pub searchpath: Vec<PathBuf>,
    /// Keys not recognized above, passed through unvalidated
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Config {
    /// Configuration for `host` with every other option at its default
    pub fn new(host: impl Into<String>) -> Result<Self, ConfigurationError> {
        let host = host.into();
        if host.trim().is_empty() {
            return Err(ConfigurationError::MissingHost);
        }
        Ok(Self {
            host,
            autoescape: false,
            searchpath: default_searchpath(),
            extra: BTreeMap::new(),
        })
    }

    /// Set `autoescape`
    #[must_use]
    pub fn autoescape(mut self, autoescape: bool) -> Self {
        self.autoescape = autoescape;
        self
    }

    /// Replace the template search path
    #[must_use]
    pub fn searchpath<I, P>(mut self, dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.searchpath = dirs.into_iter().map(Into::into).collect();
        self
    }

    /// Set a pass-through option
    #[must_use]
    pub fn option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Look up a pass-through option
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }

    /// Parse a YAML document
    pub fn from_yaml_str(content: &str) -> anyhow::Result<Self> {
        let config: Config = serde_yaml::from_str(content).context("Invalid configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a `.yaml`/`.yml` or `.json` file
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration from {}", path.display()))?;
        let is_json = path.extension().and_then(|e| e.to_str()) == Some("json");
        let config: Config = if is_json {
            serde_json::from_str(&content)?
        } else {
            serde_yaml::from_str(&content)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Apply `RHYTON_*` environment overrides
    pub fn apply_env(mut self) -> Result<Self, ConfigurationError> {
        if let Ok(host) = env::var("RHYTON_HOST") {
            self.host = host;
        }
        if let Some(autoescape) = env::var("RHYTON_AUTOESCAPE")
            .ok()
            .and_then(|s| s.parse().ok())
        {
            self.autoescape = autoescape;
        }
        if let Some(paths) = env::var_os("RHYTON_SEARCHPATH") {
            self.searchpath = env::split_paths(&paths).collect();
        }
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<(), ConfigurationError> {
        if self.host.trim().is_empty() {
            return Err(ConfigurationError::MissingHost);
        }
        Ok(())
    }
}
