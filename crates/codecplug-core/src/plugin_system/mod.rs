//! # Plugin System
//!
//! Everything between a native module on disk and an active codec plugin.
//!
//! ## Key Submodules and Responsibilities:
//!
//! - **[`descriptor`]**: `#[repr(C)]` layout of the exported `plugin_info`
//!   descriptor and safe, non-owning handles onto it.
//! - **[`native`]**: the [`NativeLoader`] seam (open / resolve / close) and its
//!   `libloading` backend.
//! - **[`table`]**: [`LoadedModuleTable`], which deduplicates modules by native
//!   handle and counts open references.
//! - **[`registry`]**: [`PluginRegistry`], the active encoder and decoder lists.
//! - **[`builtin`]**: the [`BuiltinPlugins`] hook for statically linked plugins.
//! - **[`scanner`]**: bulk loading of every module in a directory.
//! - **[`error`]**: [`PluginSystemError`] and its code/subcode mapping.
pub mod builtin;
pub mod descriptor;
pub mod error;
pub mod native;
pub mod registry;
pub mod scanner;
pub mod table;

pub use builtin::{BuiltinPlugins, NoBuiltins};
pub use descriptor::{CodecPlugin, DecoderRef, EncoderRef, PluginDescriptor, PluginInfo, PluginKind};
pub use error::{ErrorCode, PluginSystemError, SubCode};
#[cfg(feature = "plugin-loading")]
pub use native::{LibloadingLoader, NativeModule};
pub use native::{ModuleId, NativeLoader};
pub use registry::PluginRegistry;
pub use table::LoadedModuleTable;
