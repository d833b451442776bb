//! # Loader configuration
//!
//! Where plugins are searched for. A [`PluginPathSource`] is consulted once per
//! init cycle; [`EnvPluginPaths`] reads the platform path list from an
//! environment variable and [`LoaderConfig`] reads it from a JSON, YAML or TOML
//! file (the latter two behind the `yaml-config` / `toml-config` features).
pub mod error;
pub mod paths;

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

pub use error::ConfigError;
pub use paths::{EnvPluginPaths, PluginPathSource};

/// Supported configuration file formats
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConfigFormat {
    /// JSON format (.json)
    Json,
    /// YAML format (.yaml, .yml) - requires "yaml-config" feature
    #[cfg(feature = "yaml-config")]
    Yaml,
    /// TOML format (.toml) - requires "toml-config" feature
    #[cfg(feature = "toml-config")]
    Toml,
}

impl ConfigFormat {
    /// Get the file extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            ConfigFormat::Json => "json",
            #[cfg(feature = "yaml-config")]
            ConfigFormat::Yaml => "yaml",
            #[cfg(feature = "toml-config")]
            ConfigFormat::Toml => "toml",
        }
    }

    /// Determine format from file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| match ext.to_lowercase().as_str() {
                "json" => Some(ConfigFormat::Json),
                #[cfg(feature = "yaml-config")]
                "yaml" | "yml" => Some(ConfigFormat::Yaml),
                #[cfg(feature = "toml-config")]
                "toml" => Some(ConfigFormat::Toml),
                _ => None,
            })
    }
}

/// Plugin search settings read from a file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Directories scanned on the first `init`. Empty means "use the default".
    pub plugin_directories: Vec<PathBuf>,
    /// Replaces the compile-time default plugin directory.
    pub default_plugin_directory: Option<PathBuf>,
}

impl LoaderConfig {
    /// Parse configuration text in the given format.
    pub fn parse(data: &str, format: ConfigFormat) -> Result<Self, ConfigError> {
        match format {
            ConfigFormat::Json => serde_json::from_str(data).map_err(|e| ConfigError::Deserialization {
                format: "json".to_string(),
                source: Box::new(e),
            }),
            #[cfg(feature = "yaml-config")]
            ConfigFormat::Yaml => serde_yaml::from_str(data).map_err(|e| ConfigError::Deserialization {
                format: "yaml".to_string(),
                source: Box::new(e),
            }),
            #[cfg(feature = "toml-config")]
            ConfigFormat::Toml => toml::from_str(data).map_err(|e| ConfigError::Deserialization {
                format: "toml".to_string(),
                source: Box::new(e),
            }),
        }
    }

    /// Load a configuration file, picking the format from its extension.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let format =
            ConfigFormat::from_path(path).ok_or_else(|| ConfigError::UnsupportedFormat(path.to_path_buf()))?;
        let data = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(&data, format)
    }
}

impl PluginPathSource for LoaderConfig {
    fn plugin_directories(&self) -> Vec<PathBuf> {
        self.plugin_directories.clone()
    }
}
