//! # codecplug-core
//!
//! Discovery, loading, deduplication and reference counting of native codec
//! plugins (encoders and decoders), tied to a library-wide init/deinit counter.
//!
//! The entry point is [`PluginContext`]: build one, call
//! [`init`](PluginContext::init) / [`deinit`](PluginContext::deinit) in
//! balanced pairs, and load or unload individual modules in between.
pub mod config;
pub mod kernel;
pub mod plugin_system;

pub use kernel::{Error, PluginContext, PluginContextBuilder, Result};
pub use plugin_system::{
    BuiltinPlugins, DecoderRef, EncoderRef, LoadedModuleTable, ModuleId, NativeLoader,
    PluginDescriptor, PluginKind, PluginRegistry, PluginSystemError,
};
#[cfg(feature = "plugin-loading")]
pub use plugin_system::LibloadingLoader;
pub use config::{EnvPluginPaths, LoaderConfig, PluginPathSource};

#[cfg(test)]
mod tests;
