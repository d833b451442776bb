use std::collections::HashMap;
use std::ffi::{CString, c_void};
use std::path::{Path, PathBuf};
use std::ptr;
use std::sync::{Arc, Mutex};

use crate::plugin_system::descriptor::{
    DecoderPlugin, EncoderPlugin, PluginDescriptor, PluginHookFn, PluginInfo, PluginKind,
};
use crate::plugin_system::error::PluginSystemError;
use crate::plugin_system::native::{ModuleId, NativeLoader};

// --- Descriptor fixtures ---
// Fixtures are leaked so they outlive every context that references them,
// the same way a module's statics outlive its handles.

pub fn encoder_table(priority: i32) -> EncoderPlugin {
    EncoderPlugin {
        plugin_api_version: 3,
        compression_format: 1,
        id_name: ptr::null(),
        priority,
        supports_lossy_compression: 1,
        supports_lossless_compression: 0,
        get_plugin_name: None,
        init_plugin: None,
        cleanup_plugin: None,
    }
}

pub fn decoder_table() -> DecoderPlugin {
    DecoderPlugin {
        plugin_api_version: 1,
        get_plugin_name: None,
        init_plugin: None,
        deinit_plugin: None,
        does_support_format: None,
    }
}

fn leak_info(kind_tag: i32, table: *const c_void) -> PluginDescriptor {
    let info: &'static PluginInfo = Box::leak(Box::new(PluginInfo {
        version: 1,
        plugin_type: kind_tag,
        plugin: table,
        internal_handle: ptr::null_mut(),
    }));
    unsafe { PluginDescriptor::from_raw(info) }.expect("leaked info is non-null")
}

pub fn encoder_from(mut table: EncoderPlugin, name: &str) -> PluginDescriptor {
    table.id_name = CString::new(name).expect("fixture name").into_raw();
    let table: &'static EncoderPlugin = Box::leak(Box::new(table));
    leak_info(PluginKind::ENCODER_TAG, table as *const EncoderPlugin as *const c_void)
}

pub fn decoder_from(table: DecoderPlugin) -> PluginDescriptor {
    let table: &'static DecoderPlugin = Box::leak(Box::new(table));
    leak_info(PluginKind::DECODER_TAG, table as *const DecoderPlugin as *const c_void)
}

pub fn encoder(name: &str, priority: i32) -> PluginDescriptor {
    encoder_from(encoder_table(priority), name)
}

pub fn decoder() -> PluginDescriptor {
    decoder_from(decoder_table())
}

pub fn encoder_with_hooks(name: &str, init: Option<PluginHookFn>, cleanup: Option<PluginHookFn>) -> PluginDescriptor {
    let mut table = encoder_table(50);
    table.init_plugin = init;
    table.cleanup_plugin = cleanup;
    encoder_from(table, name)
}

pub fn decoder_with_hooks(init: Option<PluginHookFn>, deinit: Option<PluginHookFn>) -> PluginDescriptor {
    let mut table = decoder_table();
    table.init_plugin = init;
    table.deinit_plugin = deinit;
    decoder_from(table)
}

/// Descriptor whose kind tag is not encoder or decoder.
pub fn unknown_kind() -> PluginDescriptor {
    let table: &'static EncoderPlugin = Box::leak(Box::new(encoder_table(0)));
    leak_info(7, table as *const EncoderPlugin as *const c_void)
}

// --- Mock loader ---

#[derive(Debug, Clone)]
struct MockModuleSpec {
    id: ModuleId,
    descriptor: Option<PluginDescriptor>,
}

#[derive(Debug)]
pub struct MockModule {
    id: ModuleId,
    descriptor: Option<PluginDescriptor>,
    path: PathBuf,
}

#[derive(Debug, Default)]
struct MockState {
    modules: HashMap<PathBuf, MockModuleSpec>,
    opens: HashMap<ModuleId, usize>,
    closes: HashMap<ModuleId, usize>,
    next_id: usize,
}

/// In-memory loader. Paths map to module identities; every open and close
/// is counted per identity. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MockLoader {
    state: Arc<Mutex<MockState>>,
}

impl MockLoader {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&self, path: PathBuf, descriptor: Option<PluginDescriptor>) -> ModuleId {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = ModuleId(0x1000 + state.next_id);
        state.modules.insert(path, MockModuleSpec { id, descriptor });
        id
    }

    /// A loadable module exporting `descriptor`.
    pub fn add_module(&self, path: impl Into<PathBuf>, descriptor: PluginDescriptor) -> ModuleId {
        self.insert(path.into(), Some(descriptor))
    }

    /// A module that opens but exports no `plugin_info`.
    pub fn add_module_without_symbol(&self, path: impl Into<PathBuf>) -> ModuleId {
        self.insert(path.into(), None)
    }

    /// Another path the OS resolves to an already known module.
    pub fn add_alias(&self, path: impl Into<PathBuf>, of: impl AsRef<Path>) {
        let mut state = self.state.lock().unwrap();
        let spec = state.modules.get(of.as_ref()).cloned().expect("alias target registered");
        state.modules.insert(path.into(), spec);
    }

    pub fn opens(&self, id: ModuleId) -> usize {
        self.state.lock().unwrap().opens.get(&id).copied().unwrap_or(0)
    }

    pub fn closes(&self, id: ModuleId) -> usize {
        self.state.lock().unwrap().closes.get(&id).copied().unwrap_or(0)
    }

    /// Opens not yet matched by a close, over all modules.
    pub fn outstanding(&self) -> usize {
        let state = self.state.lock().unwrap();
        let opens: usize = state.opens.values().sum();
        let closes: usize = state.closes.values().sum();
        opens - closes
    }

    pub fn total_opens(&self) -> usize {
        self.state.lock().unwrap().opens.values().sum()
    }
}

impl NativeLoader for MockLoader {
    type Module = MockModule;

    fn open(&self, path: &Path) -> Result<MockModule, PluginSystemError> {
        let mut state = self.state.lock().unwrap();
        let spec = state
            .modules
            .get(path)
            .cloned()
            .ok_or_else(|| PluginSystemError::load_failure(path, "cannot open shared object file: No such file or directory"))?;
        *state.opens.entry(spec.id).or_default() += 1;
        Ok(MockModule {
            id: spec.id,
            descriptor: spec.descriptor,
            path: path.to_path_buf(),
        })
    }

    fn identity(&self, module: &MockModule) -> ModuleId {
        module.id
    }

    fn resolve_descriptor(&self, module: &MockModule) -> Result<PluginDescriptor, PluginSystemError> {
        module
            .descriptor
            .ok_or_else(|| PluginSystemError::load_failure(&module.path, "undefined symbol: plugin_info"))
    }

    fn close(&self, module: MockModule) {
        let mut state = self.state.lock().unwrap();
        *state.closes.entry(module.id).or_default() += 1;
    }
}
