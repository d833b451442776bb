//! # Kernel
//!
//! The library lifecycle: [`PluginContext`] owns the init counter, the plugin
//! registry and the loaded-module table and serializes every operation on
//! them. Also home to crate-wide constants and the top-level [`Error`].
pub mod constants;
pub mod context;
pub mod error;

pub use context::{PluginContext, PluginContextBuilder};
pub use error::{Error, Result};
