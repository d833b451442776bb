use crate::plugin_system::error::PluginSystemError;
use crate::plugin_system::registry::PluginRegistry;

/// Statically linked plugins, registered without any dynamic loading.
///
/// Implementations register their encoders and decoders directly with the
/// registry. The context calls this when it is built and again on the first
/// `init` after a full teardown.
pub trait BuiltinPlugins: Send + Sync {
    fn register(&self, registry: &mut PluginRegistry) -> Result<(), PluginSystemError>;
}

/// No built-in plugins.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoBuiltins;

impl BuiltinPlugins for NoBuiltins {
    fn register(&self, _registry: &mut PluginRegistry) -> Result<(), PluginSystemError> {
        Ok(())
    }
}

impl<F> BuiltinPlugins for F
where
    F: Fn(&mut PluginRegistry) -> Result<(), PluginSystemError> + Send + Sync,
{
    fn register(&self, registry: &mut PluginRegistry) -> Result<(), PluginSystemError> {
        self(registry)
    }
}
