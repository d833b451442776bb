use std::path::Path;

use log::{debug, info};

use crate::plugin_system::descriptor::PluginDescriptor;
use crate::plugin_system::error::PluginSystemError;
use crate::plugin_system::native::{ModuleId, NativeLoader};
use crate::plugin_system::registry::PluginRegistry;

/// One native module and every open reference held on it.
#[derive(Debug)]
struct LoadedModule<M> {
    id: ModuleId,
    descriptor: PluginDescriptor,
    /// One entry per successful open; never empty while the record exists.
    handles: Vec<M>,
}

impl<M> LoadedModule<M> {
    fn open_count(&self) -> usize {
        self.handles.len()
    }
}

/// Loaded modules, deduplicated by native handle identity.
///
/// The table is the only owner of opened modules. Its open count for a module
/// is the number of handles it holds, so every release path closes exactly
/// the references that were acquired.
#[derive(Debug)]
pub struct LoadedModuleTable<M> {
    modules: Vec<LoadedModule<M>>,
}

impl<M> Default for LoadedModuleTable<M> {
    fn default() -> Self {
        Self { modules: Vec::new() }
    }
}

impl<M> LoadedModuleTable<M> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct modules.
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn contains(&self, descriptor: PluginDescriptor) -> bool {
        self.modules.iter().any(|m| m.descriptor == descriptor)
    }

    /// Outstanding references on the module exporting `descriptor`.
    pub fn open_count(&self, descriptor: PluginDescriptor) -> Option<usize> {
        self.modules
            .iter()
            .find(|m| m.descriptor == descriptor)
            .map(LoadedModule::open_count)
    }

    pub fn descriptors(&self) -> Vec<PluginDescriptor> {
        self.modules.iter().map(|m| m.descriptor).collect()
    }

    /// Opens `path` and either attaches to an already tracked module or
    /// registers a new one.
    ///
    /// Attaching bumps the open count and returns the existing descriptor
    /// without touching the registry. A new module is only tracked once its
    /// descriptor resolved and registered; otherwise the fresh handle is
    /// closed again before the error is returned.
    pub fn load_or_attach<L>(
        &mut self,
        loader: &L,
        registry: &mut PluginRegistry,
        path: &Path,
    ) -> Result<PluginDescriptor, PluginSystemError>
    where
        L: NativeLoader<Module = M>,
    {
        let handle = loader.open(path)?;
        let id = loader.identity(&handle);

        if let Some(existing) = self.modules.iter_mut().find(|m| m.id == id) {
            existing.handles.push(handle);
            debug!(
                "Attached to loaded module {} via {} (open count {})",
                id,
                path.display(),
                existing.open_count()
            );
            return Ok(existing.descriptor);
        }

        let descriptor = match loader.resolve_descriptor(&handle) {
            Ok(descriptor) => descriptor,
            Err(e) => {
                loader.close(handle);
                return Err(e);
            }
        };

        if descriptor.plugin().is_none() {
            loader.close(handle);
            return Err(PluginSystemError::load_failure(
                path,
                format!(
                    "plugin_info has unknown plugin type or a null plugin table (version {})",
                    descriptor.version()
                ),
            ));
        }

        if let Err(e) = registry.register(descriptor) {
            loader.close(handle);
            return Err(e);
        }

        info!(
            "Loaded {} plugin from {} (handle {})",
            descriptor.kind().map(|k| k.to_string()).unwrap_or_default(),
            path.display(),
            id
        );
        self.modules.push(LoadedModule {
            id,
            descriptor,
            handles: vec![handle],
        });
        Ok(descriptor)
    }

    /// Releases one reference on the module exporting `descriptor`.
    ///
    /// The last release unregisters the descriptor before its module is
    /// closed, so plugin hooks never run on unmapped code.
    pub fn unload<L>(
        &mut self,
        loader: &L,
        registry: &mut PluginRegistry,
        descriptor: PluginDescriptor,
    ) -> Result<(), PluginSystemError>
    where
        L: NativeLoader<Module = M>,
    {
        let index = self
            .modules
            .iter()
            .position(|m| m.descriptor == descriptor)
            .ok_or(PluginSystemError::PluginNotLoaded)?;

        let record = &mut self.modules[index];
        let handle = match record.handles.pop() {
            Some(handle) => handle,
            None => return Err(PluginSystemError::PluginNotLoaded),
        };

        if record.handles.is_empty() {
            let record = self.modules.swap_remove(index);
            registry.unregister(descriptor);
            info!("Unloaded module {}", record.id);
        } else {
            debug!(
                "Released module {} (open count {})",
                record.id,
                record.open_count()
            );
        }

        loader.close(handle);
        Ok(())
    }

    /// Unregisters every tracked descriptor and closes every outstanding
    /// reference, however many explicit unloads are still missing.
    ///
    /// Returns the number of references closed.
    pub fn unload_all<L>(&mut self, loader: &L, registry: &mut PluginRegistry) -> usize
    where
        L: NativeLoader<Module = M>,
    {
        let mut closed = 0;
        for record in self.modules.drain(..) {
            registry.unregister(record.descriptor);
            let count = record.handles.len();
            for handle in record.handles {
                loader.close(handle);
            }
            debug!("Force-unloaded module {} ({} references)", record.id, count);
            closed += count;
        }
        closed
    }
}
