use std::env;
use std::ffi::OsStr;
use std::path::PathBuf;

use crate::kernel::constants::PLUGIN_PATH_ENV_VAR;

/// Supplies the plugin search directories for one init cycle.
///
/// An empty list means "use the default plugin directory"; configured and
/// default directories are never combined.
pub trait PluginPathSource: Send + Sync {
    fn plugin_directories(&self) -> Vec<PathBuf>;
}

/// A fixed list of directories.
impl PluginPathSource for Vec<PathBuf> {
    fn plugin_directories(&self) -> Vec<PathBuf> {
        self.clone()
    }
}

/// Reads a path list from an environment variable at every call.
///
/// Entries are separated the way `PATH` is on this platform (`:` on Unix,
/// `;` on Windows). Empty entries are dropped.
#[derive(Debug, Clone)]
pub struct EnvPluginPaths {
    var: String,
}

impl EnvPluginPaths {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }

    pub fn var(&self) -> &str {
        &self.var
    }

    /// Splits a raw path list value.
    pub fn parse(value: &OsStr) -> Vec<PathBuf> {
        env::split_paths(value)
            .filter(|p| !p.as_os_str().is_empty())
            .collect()
    }
}

impl Default for EnvPluginPaths {
    fn default() -> Self {
        Self::new(PLUGIN_PATH_ENV_VAR)
    }
}

impl PluginPathSource for EnvPluginPaths {
    fn plugin_directories(&self) -> Vec<PathBuf> {
        env::var_os(&self.var)
            .map(|value| Self::parse(&value))
            .unwrap_or_default()
    }
}
