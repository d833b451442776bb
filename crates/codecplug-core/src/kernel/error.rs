//! # Kernel Errors
//!
//! [`Error`] is the crate-level error: it wraps the typed errors of the plugin
//! system and of configuration loading.
use std::result::Result as StdResult;

use thiserror::Error as ThisError;

use crate::config::ConfigError;
use crate::plugin_system::error::{ErrorCode, PluginSystemError, SubCode};

#[derive(Debug, ThisError)]
pub enum Error {
    /// Specific, typed plugin system error
    #[error("Plugin system error: {0}")]
    PluginSystem(#[from] PluginSystemError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Shorthand for Result with our Error type
pub type Result<T> = StdResult<T, Error>;

impl Error {
    /// Code of the code/subcode/message triple; configuration failures are usage errors.
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::PluginSystem(e) => e.code(),
            Error::Config(_) => ErrorCode::UsageError,
        }
    }

    pub fn subcode(&self) -> SubCode {
        match self {
            Error::PluginSystem(e) => e.subcode(),
            Error::Config(_) => SubCode::Unspecified,
        }
    }

    /// The plugin system error, if this is one.
    pub fn as_plugin_error(&self) -> Option<&PluginSystemError> {
        match self {
            Error::PluginSystem(e) => Some(e),
            Error::Config(_) => None,
        }
    }
}
