//! # Native loader abstraction
//!
//! [`NativeLoader`] opens and closes native code modules and resolves the
//! `plugin_info` descriptor they export. [`LibloadingLoader`] is the real
//! backend (`dlopen` on POSIX, `LoadLibraryExW` on Windows, both via
//! `libloading`); tests substitute their own implementation.
//!
//! Every successful [`open`](NativeLoader::open) must be balanced by exactly
//! one [`close`](NativeLoader::close). `close` takes the module by value, so an
//! opened module cannot be released twice.
use std::fmt;
use std::path::Path;

use crate::plugin_system::descriptor::PluginDescriptor;
use crate::plugin_system::error::PluginSystemError;

/// Identity of a loaded native module: the raw OS handle value.
///
/// Opening the same file twice yields two module values with one identity,
/// because the OS loader reference-counts its handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId(pub usize);

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

pub trait NativeLoader: Send + Sync {
    /// One open reference on a native module.
    type Module: Send;

    /// Opens the module at `path`, taking one OS-level reference.
    fn open(&self, path: &Path) -> Result<Self::Module, PluginSystemError>;

    /// Identity shared by every open reference to the same module.
    fn identity(&self, module: &Self::Module) -> ModuleId;

    /// Resolves the exported `plugin_info` symbol.
    fn resolve_descriptor(&self, module: &Self::Module) -> Result<PluginDescriptor, PluginSystemError>;

    /// Releases one OS-level reference.
    fn close(&self, module: Self::Module);
}

#[cfg(feature = "plugin-loading")]
pub use self::dynamic::{LibloadingLoader, NativeModule};

#[cfg(feature = "plugin-loading")]
mod dynamic {
    use std::path::{Path, PathBuf};

    use libloading::{Library, Symbol};
    use log::{debug, warn};

    use super::{ModuleId, NativeLoader};
    use crate::kernel::constants::PLUGIN_INFO_SYMBOL;
    use crate::plugin_system::descriptor::{PluginDescriptor, PluginInfo};
    use crate::plugin_system::error::PluginSystemError;

    /// One `libloading` reference on a shared object / DLL.
    #[derive(Debug)]
    pub struct NativeModule {
        id: ModuleId,
        path: PathBuf,
        library: Library,
    }

    impl NativeModule {
        pub fn path(&self) -> &Path {
            &self.path
        }
    }

    /// Loader backed by the platform's dynamic linker.
    #[derive(Debug, Default, Clone, Copy)]
    pub struct LibloadingLoader;

    impl LibloadingLoader {
        pub fn new() -> Self {
            Self
        }
    }

    // Round-trips the library through its raw OS handle to read the handle value.
    #[cfg(unix)]
    fn split_identity(library: Library) -> (ModuleId, Library) {
        use libloading::os::unix;
        let raw = unix::Library::from(library).into_raw();
        // SAFETY: `raw` comes from `into_raw` above and is turned back into exactly one owner.
        let library = unsafe { unix::Library::from_raw(raw) };
        (ModuleId(raw as usize), library.into())
    }

    #[cfg(windows)]
    fn split_identity(library: Library) -> (ModuleId, Library) {
        use libloading::os::windows;
        let raw = windows::Library::from(library).into_raw();
        // SAFETY: `raw` comes from `into_raw` above and is turned back into exactly one owner.
        let library = unsafe { windows::Library::from_raw(raw) };
        (ModuleId(raw as usize), library.into())
    }

    impl NativeLoader for LibloadingLoader {
        type Module = NativeModule;

        fn open(&self, path: &Path) -> Result<NativeModule, PluginSystemError> {
            // SAFETY: loading runs the module's initializers; loaded code is trusted.
            let library = unsafe { Library::new(path) }.map_err(|e| {
                warn!("Failed to open native module {}: {}", path.display(), e);
                PluginSystemError::load_failure(path, e.to_string())
            })?;
            let (id, library) = split_identity(library);
            debug!("Opened native module {} (handle {})", path.display(), id);
            Ok(NativeModule {
                id,
                path: path.to_path_buf(),
                library,
            })
        }

        fn identity(&self, module: &NativeModule) -> ModuleId {
            module.id
        }

        fn resolve_descriptor(&self, module: &NativeModule) -> Result<PluginDescriptor, PluginSystemError> {
            // `plugin_info` is a data symbol, so the symbol value is its address.
            let symbol: Symbol<*const PluginInfo> = unsafe { module.library.get(PLUGIN_INFO_SYMBOL) }
                .map_err(|e| {
                    warn!("Symbol lookup failed in {}: {}", module.path.display(), e);
                    PluginSystemError::load_failure(&module.path, format!("missing symbol plugin_info: {}", e))
                })?;
            let info_ptr: *const PluginInfo = *symbol;
            // SAFETY: the module exports `plugin_info` with the descriptor layout;
            // the table keeps the module open for as long as the descriptor is tracked.
            unsafe { PluginDescriptor::from_raw(info_ptr) }.ok_or_else(|| {
                PluginSystemError::load_failure(&module.path, "symbol plugin_info resolved to a null address")
            })
        }

        fn close(&self, module: NativeModule) {
            let NativeModule { id, path, library } = module;
            match library.close() {
                Ok(()) => debug!("Closed native module {} (handle {})", path.display(), id),
                Err(e) => warn!("Failed to close native module {}: {}", path.display(), e),
            }
        }
    }
}
