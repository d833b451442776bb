//! # Directory scanner
//!
//! Bulk-loads every native module sitting directly in one directory. Only an
//! unreadable directory is an error; modules that fail to load are logged and
//! skipped so one broken file cannot hide the rest.
use std::ffi::OsStr;
use std::fs;
use std::path::Path;

use log::{debug, warn};

use crate::plugin_system::descriptor::PluginDescriptor;
use crate::plugin_system::error::PluginSystemError;

/// File name suffix of native modules on this platform (`.so`, `.dylib`, `.dll`).
pub fn native_module_suffix() -> &'static str {
    std::env::consts::DLL_SUFFIX
}

/// Case-sensitive suffix match; the bare suffix alone does not count.
pub fn is_native_module_name(file_name: &OsStr) -> bool {
    let suffix = native_module_suffix();
    match file_name.to_str() {
        Some(name) => name.len() > suffix.len() && name.ends_with(suffix),
        None => false,
    }
}

/// Loads every matching module in `directory` through `load`.
///
/// Descriptors are written to `out` in enumeration order until it is full.
/// A full buffer does not stop the scan: every matching module is still
/// loaded and counted, so the returned count can be larger than `out.len()`.
/// That is not an error. Only the first `out.len()` descriptors are recorded;
/// the rest stay loaded and reachable through the registry. If the buffer is
/// not filled, a `None` sentinel follows the last written descriptor.
/// Enumeration order is whatever the OS reports.
pub fn scan_directory<F>(
    directory: &Path,
    mut out: Option<&mut [Option<PluginDescriptor>]>,
    mut load: F,
) -> Result<usize, PluginSystemError>
where
    F: FnMut(&Path) -> Result<PluginDescriptor, PluginSystemError>,
{
    let entries = fs::read_dir(directory).map_err(|e| PluginSystemError::CannotReadPluginDirectory {
        path: directory.to_path_buf(),
        source: e,
    })?;

    let mut loaded = 0usize;
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Error reading entry in {}: {}", directory.display(), e);
                continue;
            }
        };

        let file_type = match entry.file_type() {
            Ok(file_type) => file_type,
            Err(e) => {
                warn!("Cannot stat {}: {}", entry.path().display(), e);
                continue;
            }
        };
        if !(file_type.is_file() || file_type.is_symlink()) {
            continue;
        }
        if !is_native_module_name(&entry.file_name()) {
            continue;
        }

        let path = directory.join(entry.file_name());
        match load(&path) {
            Ok(descriptor) => {
                if let Some(slot) = out.as_deref_mut().and_then(|buf| buf.get_mut(loaded)) {
                    *slot = Some(descriptor);
                }
                loaded += 1;
            }
            Err(e) => warn!("Skipping plugin {}: {}", path.display(), e),
        }
    }

    if let Some(buf) = out {
        if loaded < buf.len() {
            buf[loaded] = None;
        } else if loaded > buf.len() {
            debug!(
                "Output buffer for {} holds {} of {} loaded plugins",
                directory.display(),
                buf.len(),
                loaded
            );
        }
    }

    debug!("Loaded {} plugins from {}", loaded, directory.display());
    Ok(loaded)
}
