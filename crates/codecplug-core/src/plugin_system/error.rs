//! # Plugin System Errors
//!
//! Defines [`PluginSystemError`], the error returned by every loading,
//! unloading and scanning operation, together with the numeric
//! [`ErrorCode`] / [`SubCode`] pair that an outward-facing API layer reports
//! alongside the error message.
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PluginSystemError {
    /// The native module could not be opened, or it does not export a usable
    /// `plugin_info` descriptor. `message` carries the OS loader diagnostic.
    #[error("Cannot open plugin '{}': {message}", path.display())]
    PluginLoadFailure { path: PathBuf, message: String },

    #[error("Trying to remove a plugin that is not loaded")]
    PluginNotLoaded,

    #[error("Cannot read plugin directory '{}': {source}", path.display())]
    CannotReadPluginDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Plugin '{plugin}' uses unsupported plugin API version {version}")]
    UnsupportedPluginVersion { plugin: String, version: i32 },

    #[error("Plugins are not supported")]
    UnsupportedFeature,
}

/// Top-level error category of the code/subcode/message triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ErrorCode {
    Ok = 0,
    UnsupportedFeature = 4,
    UsageError = 5,
    PluginLoadingError = 6,
}

/// Detail code of the code/subcode/message triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum SubCode {
    Unspecified = 0,
    UnsupportedPluginVersion = 3004,
    PluginLoadingError = 6000,
    PluginIsNotLoaded = 6001,
    CannotReadPluginDirectory = 6002,
}

impl PluginSystemError {
    pub fn code(&self) -> ErrorCode {
        match self {
            PluginSystemError::PluginLoadFailure { .. }
            | PluginSystemError::PluginNotLoaded
            | PluginSystemError::CannotReadPluginDirectory { .. } => ErrorCode::PluginLoadingError,
            PluginSystemError::UnsupportedPluginVersion { .. } => ErrorCode::UsageError,
            PluginSystemError::UnsupportedFeature => ErrorCode::UnsupportedFeature,
        }
    }

    pub fn subcode(&self) -> SubCode {
        match self {
            PluginSystemError::PluginLoadFailure { .. } => SubCode::PluginLoadingError,
            PluginSystemError::PluginNotLoaded => SubCode::PluginIsNotLoaded,
            PluginSystemError::CannotReadPluginDirectory { .. } => SubCode::CannotReadPluginDirectory,
            PluginSystemError::UnsupportedPluginVersion { .. } => SubCode::UnsupportedPluginVersion,
            PluginSystemError::UnsupportedFeature => SubCode::Unspecified,
        }
    }

    /// Shorthand used by the loader backends.
    pub(crate) fn load_failure(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        PluginSystemError::PluginLoadFailure {
            path: path.into(),
            message: message.into(),
        }
    }
}
