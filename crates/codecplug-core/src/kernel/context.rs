use std::cell::RefCell;
use std::fmt::{self, Debug};
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use parking_lot::ReentrantMutex;

use crate::config::{EnvPluginPaths, LoaderConfig, PluginPathSource};
use crate::kernel::constants::DEFAULT_PLUGIN_DIRECTORY;
use crate::kernel::error::Result;
use crate::plugin_system::builtin::{BuiltinPlugins, NoBuiltins};
use crate::plugin_system::descriptor::{DecoderRef, EncoderRef, PluginDescriptor};
use crate::plugin_system::error::PluginSystemError;
use crate::plugin_system::native::NativeLoader;
use crate::plugin_system::registry::PluginRegistry;
use crate::plugin_system::scanner;
use crate::plugin_system::table::LoadedModuleTable;
#[cfg(feature = "plugin-loading")]
use crate::plugin_system::native::LibloadingLoader;

/// Mutable state guarded by the context lock.
struct ContextState<M> {
    /// Outstanding `init` calls not yet matched by `deinit`.
    init_count: usize,
    builtins_registered: bool,
    registry: PluginRegistry,
    modules: LoadedModuleTable<M>,
}

/// Library-wide plugin state: the init counter, the active plugin lists and
/// the table of loaded native modules.
///
/// Every mutating call takes one re-entrant lock for its whole duration, so
/// concurrent `init` / `deinit` / load / unload calls from several threads are
/// totally ordered and the counts always follow real call order.
///
/// Built-in plugins are active from construction. The first [`init`](Self::init)
/// bulk-loads the configured plugin directories; the [`deinit`](Self::deinit)
/// that brings the count back to zero unregisters everything and force-unloads
/// every module.
pub struct PluginContext<L: NativeLoader> {
    loader: L,
    builtins: Box<dyn BuiltinPlugins>,
    plugin_paths: Box<dyn PluginPathSource>,
    default_plugin_dir: PathBuf,
    state: ReentrantMutex<RefCell<ContextState<L::Module>>>,
}

/// Configures a [`PluginContext`] before its built-ins are registered.
pub struct PluginContextBuilder<L> {
    loader: L,
    builtins: Box<dyn BuiltinPlugins>,
    plugin_paths: Box<dyn PluginPathSource>,
    default_plugin_dir: PathBuf,
}

impl<L: NativeLoader> PluginContextBuilder<L> {
    fn new(loader: L) -> Self {
        Self {
            loader,
            builtins: Box::new(NoBuiltins),
            plugin_paths: Box::new(EnvPluginPaths::default()),
            default_plugin_dir: PathBuf::from(DEFAULT_PLUGIN_DIRECTORY),
        }
    }

    pub fn builtins(mut self, builtins: impl BuiltinPlugins + 'static) -> Self {
        self.builtins = Box::new(builtins);
        self
    }

    pub fn plugin_paths(mut self, source: impl PluginPathSource + 'static) -> Self {
        self.plugin_paths = Box::new(source);
        self
    }

    pub fn default_plugin_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.default_plugin_dir = dir.into();
        self
    }

    /// Take both the search directories and the default directory from a config file.
    pub fn config(mut self, config: LoaderConfig) -> Self {
        if let Some(dir) = config.default_plugin_directory.clone() {
            self.default_plugin_dir = dir;
        }
        self.plugin_paths = Box::new(config);
        self
    }

    /// Creates the context and registers the built-in plugins.
    pub fn build(self) -> Result<PluginContext<L>> {
        let mut registry = PluginRegistry::new();
        self.builtins.register(&mut registry)?;
        debug!(
            "Plugin context created, {} built-in encoders and {} built-in decoders",
            registry.encoders().len(),
            registry.decoders().len()
        );
        Ok(PluginContext {
            loader: self.loader,
            builtins: self.builtins,
            plugin_paths: self.plugin_paths,
            default_plugin_dir: self.default_plugin_dir,
            state: ReentrantMutex::new(RefCell::new(ContextState {
                init_count: 0,
                builtins_registered: true,
                registry,
                modules: LoadedModuleTable::new(),
            })),
        })
    }
}

#[cfg(feature = "plugin-loading")]
impl PluginContext<LibloadingLoader> {
    /// Context using the system loader, no built-ins and the
    /// `CODECPLUG_PLUGIN_PATH` search path.
    pub fn new() -> Result<Self> {
        Self::builder(LibloadingLoader::new()).build()
    }
}

fn ensure_loading_supported() -> std::result::Result<(), PluginSystemError> {
    if cfg!(feature = "plugin-loading") {
        Ok(())
    } else {
        Err(PluginSystemError::UnsupportedFeature)
    }
}

impl<L: NativeLoader> PluginContext<L> {
    pub fn builder(loader: L) -> PluginContextBuilder<L> {
        PluginContextBuilder::new(loader)
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    pub fn default_plugin_dir(&self) -> &Path {
        &self.default_plugin_dir
    }

    /// Takes one init reference. The first one (re)registers built-ins and
    /// loads every plugin directory, stopping at the first directory that
    /// cannot be read.
    ///
    /// The reference is held even when loading fails; balance it with
    /// [`deinit`](Self::deinit).
    pub fn init(&self) -> Result<()> {
        let guard = self.state.lock();
        let mut state = guard.borrow_mut();

        state.init_count += 1;
        debug!("init: count is now {}", state.init_count);
        if state.init_count != 1 {
            return Ok(());
        }

        if !state.builtins_registered {
            self.builtins.register(&mut state.registry)?;
            state.builtins_registered = true;
        }

        if cfg!(feature = "plugin-loading") {
            self.load_search_directories(&mut state)?;
        }
        Ok(())
    }

    /// Drops one init reference. Dropping the last one tears everything down.
    /// Extra calls are ignored.
    pub fn deinit(&self) {
        let guard = self.state.lock();
        let mut state = guard.borrow_mut();

        if state.init_count == 0 {
            warn!("deinit called more often than init; ignoring");
            return;
        }
        state.init_count -= 1;
        debug!("deinit: count is now {}", state.init_count);

        if state.init_count == 0 {
            self.teardown(&mut state);
        }
    }

    /// Loads one module, or takes another reference on it if it is already loaded.
    pub fn load_plugin(&self, path: impl AsRef<Path>) -> Result<PluginDescriptor> {
        ensure_loading_supported()?;
        let guard = self.state.lock();
        let mut state = guard.borrow_mut();
        let ContextState { registry, modules, .. } = &mut *state;
        Ok(modules.load_or_attach(&self.loader, registry, path.as_ref())?)
    }

    /// Releases one reference taken by [`load_plugin`](Self::load_plugin) or a scan.
    pub fn unload_plugin(&self, descriptor: PluginDescriptor) -> Result<()> {
        ensure_loading_supported()?;
        let guard = self.state.lock();
        let mut state = guard.borrow_mut();
        let ContextState { registry, modules, .. } = &mut *state;
        Ok(modules.unload(&self.loader, registry, descriptor)?)
    }

    /// Loads every module in `directory`. See [`scanner::scan_directory`] for
    /// how `out` is filled.
    pub fn load_plugins(
        &self,
        directory: impl AsRef<Path>,
        out: Option<&mut [Option<PluginDescriptor>]>,
    ) -> Result<usize> {
        ensure_loading_supported()?;
        let guard = self.state.lock();
        let mut state = guard.borrow_mut();
        Ok(self.scan_locked(&mut state, directory.as_ref(), out)?)
    }

    /// Unregisters and fully closes every loaded module. Returns the number of
    /// native references released.
    pub fn unload_all_plugins(&self) -> usize {
        let guard = self.state.lock();
        let mut state = guard.borrow_mut();
        let ContextState { registry, modules, .. } = &mut *state;
        modules.unload_all(&self.loader, registry)
    }

    /// Tears down whatever is still registered or loaded and drops the context.
    pub fn destroy(self) {
        drop(self);
    }

    pub fn init_count(&self) -> usize {
        self.state.lock().borrow().init_count
    }

    pub fn builtins_registered(&self) -> bool {
        self.state.lock().borrow().builtins_registered
    }

    pub fn encoders(&self) -> Vec<EncoderRef> {
        self.state.lock().borrow().registry.encoders().to_vec()
    }

    pub fn decoders(&self) -> Vec<DecoderRef> {
        self.state.lock().borrow().registry.decoders().to_vec()
    }

    /// Runs `f` against a snapshot of the registry taken under the context lock.
    ///
    /// The lock stays held while `f` runs, but the state itself is not
    /// borrowed, so `f` may call back into this context (including `init`,
    /// `deinit`, loads and unloads) on the same thread. Such changes are not
    /// visible through the snapshot.
    pub fn with_registry<R>(&self, f: impl FnOnce(&PluginRegistry) -> R) -> R {
        let guard = self.state.lock();
        let snapshot = guard.borrow().registry.clone();
        f(&snapshot)
    }

    /// Number of distinct loaded native modules.
    pub fn loaded_module_count(&self) -> usize {
        self.state.lock().borrow().modules.len()
    }

    pub fn loaded_plugins(&self) -> Vec<PluginDescriptor> {
        self.state.lock().borrow().modules.descriptors()
    }

    /// Outstanding references on the module exporting `descriptor`, `None` if not loaded.
    pub fn open_count(&self, descriptor: PluginDescriptor) -> Option<usize> {
        self.state.lock().borrow().modules.open_count(descriptor)
    }

    fn load_search_directories(&self, state: &mut ContextState<L::Module>) -> Result<()> {
        let configured = self.plugin_paths.plugin_directories();
        let directories = if configured.is_empty() {
            vec![self.default_plugin_dir.clone()]
        } else {
            configured
        };

        for dir in &directories {
            let count = self.scan_locked(state, dir, None)?;
            info!("Loaded {} plugins from {}", count, dir.display());
        }
        Ok(())
    }

    fn scan_locked(
        &self,
        state: &mut ContextState<L::Module>,
        directory: &Path,
        out: Option<&mut [Option<PluginDescriptor>]>,
    ) -> std::result::Result<usize, PluginSystemError> {
        let ContextState { registry, modules, .. } = state;
        scanner::scan_directory(directory, out, |path| {
            modules.load_or_attach(&self.loader, registry, path)
        })
    }

    fn teardown(&self, state: &mut ContextState<L::Module>) {
        state.registry.unregister_all_decoders();
        state.registry.unregister_all_encoders();
        state.builtins_registered = false;

        let ContextState { registry, modules, .. } = state;
        let released = modules.unload_all(&self.loader, registry);
        debug!("Teardown released {} native module references", released);
    }
}

impl<L: NativeLoader> Drop for PluginContext<L> {
    fn drop(&mut self) {
        let guard = self.state.lock();
        let mut state = guard.borrow_mut();
        if state.init_count > 0 {
            warn!(
                "Plugin context dropped with {} outstanding init references",
                state.init_count
            );
        }
        self.teardown(&mut state);
    }
}

impl<L: NativeLoader> Debug for PluginContext<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginContext")
            .field("default_plugin_dir", &self.default_plugin_dir)
            .finish_non_exhaustive() // State is behind the lock
    }
}
