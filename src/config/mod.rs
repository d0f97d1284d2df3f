//! Configuration system for unityquill.
//!
//! This module provides the configuration structure with sensible defaults
//! and support for serialization/deserialization via serde. Configuration is
//! loaded from a TOML file and merged with command-line arguments.
//!
//! # Example
//!
//! ```
//! use unityquill::config::Config;
//!
//! let config = Config::default();
//! assert_eq!(config.log_level, "warn");
//! assert!(config.extra_properties.is_empty());
//!
//! let custom = Config {
//!     extra_properties: vec!["SpawnRadius".to_string()],
//!     ..Config::default()
//! };
//! assert!(custom.property_catalog().contains("SpawnRadius"));
//! ```

use crate::graph::extractor::PropertyCatalog;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for the unityquill application.
///
/// # Fields
///
/// * `extra_properties` - Property names captured in addition to the built-in catalog (default: none)
/// * `log_level` - Tracing level used when no `-v` flag is given (default: "warn")
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Property names captured in addition to the built-in catalog
    #[serde(default)]
    pub extra_properties: Vec<String>,

    /// Tracing level: "error", "warn", "info", "debug" or "trace"
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Returns the default log level.
fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            extra_properties: Vec::new(),
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// Returns the path to the config file.
    ///
    /// Uses `~/.config/unityquill/config.toml` on all platforms.
    pub fn config_path() -> Option<std::path::PathBuf> {
        dirs::home_dir().map(|mut path| {
            path.push(".config");
            path.push("unityquill");
            path.push("config.toml");
            path
        })
    }

    /// Loads configuration from the default config file.
    ///
    /// A missing file (or no home directory) yields the defaults; a file that
    /// can't be read or parsed is an error the caller decides how to report.
    pub fn try_load() -> Result<Self> {
        match Self::config_path() {
            Some(path) => Self::try_load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Loads configuration from `path`. A missing file yields the defaults.
    pub fn try_load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    /// The built-in property catalog extended with `extra_properties`.
    pub fn property_catalog(&self) -> PropertyCatalog {
        let mut catalog = PropertyCatalog::default();
        catalog.extend(&self.extra_properties);
        catalog
    }
}
