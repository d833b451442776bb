/// Exported data symbol every plugin module must provide.
pub const PLUGIN_INFO_SYMBOL: &[u8] = b"plugin_info\0";

/// Environment variable holding the plugin search path list.
pub const PLUGIN_PATH_ENV_VAR: &str = "CODECPLUG_PLUGIN_PATH";

/// Directory scanned when no search directories are configured.
/// Can be overridden at build time through `CODECPLUG_PLUGIN_DIRECTORY`.
pub const DEFAULT_PLUGIN_DIRECTORY: &str = match option_env!("CODECPLUG_PLUGIN_DIRECTORY") {
    Some(dir) => dir,
    None => PLATFORM_PLUGIN_DIRECTORY,
};

#[cfg(windows)]
const PLATFORM_PLUGIN_DIRECTORY: &str = "C:\\codecplug\\plugins";
#[cfg(not(windows))]
const PLATFORM_PLUGIN_DIRECTORY: &str = "/usr/local/lib/codecplug/plugins";

/// Lowest plugin API version accepted for either plugin kind.
pub const MIN_PLUGIN_API_VERSION: i32 = 1;

/// Highest encoder plugin API version this registry understands.
pub const MAX_ENCODER_PLUGIN_API_VERSION: i32 = 3;

/// Highest decoder plugin API version this registry understands.
pub const MAX_DECODER_PLUGIN_API_VERSION: i32 = 4;
