#![allow(dead_code, non_upper_case_globals)] // FFI definitions and the fixed export name

use std::os::raw::{c_char, c_int, c_void};
use std::sync::atomic::{AtomicI32, Ordering};

// Same C layout codecplug-core reads from `plugin_info`.
#[repr(C)]
pub struct PluginInfo {
    pub version: c_int,
    pub plugin_type: c_int,
    pub plugin: *const c_void,
    pub internal_handle: *mut c_void,
}

#[repr(C)]
pub struct EncoderPlugin {
    pub plugin_api_version: c_int,
    pub compression_format: c_int,
    pub id_name: *const c_char,
    pub priority: c_int,
    pub supports_lossy_compression: c_int,
    pub supports_lossless_compression: c_int,
    pub get_plugin_name: Option<extern "C" fn() -> *const c_char>,
    pub init_plugin: Option<extern "C" fn()>,
    pub cleanup_plugin: Option<extern "C" fn()>,
}

// Statics holding raw pointers need an explicit Sync promise.
#[repr(transparent)]
pub struct ExportedInfo(PluginInfo);
unsafe impl Sync for ExportedInfo {}

#[repr(transparent)]
pub struct ExportedEncoder(EncoderPlugin);
unsafe impl Sync for ExportedEncoder {}

static ACTIVE: AtomicI32 = AtomicI32::new(0);

extern "C" fn plugin_name() -> *const c_char {
    b"Test Encoder\0".as_ptr() as *const c_char
}

extern "C" fn init_plugin() {
    ACTIVE.fetch_add(1, Ordering::SeqCst);
}

extern "C" fn cleanup_plugin() {
    ACTIVE.fetch_sub(1, Ordering::SeqCst);
}

static ENCODER: ExportedEncoder = ExportedEncoder(EncoderPlugin {
    plugin_api_version: 3,
    compression_format: 1,
    id_name: b"test-encoder\0".as_ptr() as *const c_char,
    priority: 60,
    supports_lossy_compression: 1,
    supports_lossless_compression: 1,
    get_plugin_name: Some(plugin_name),
    init_plugin: Some(init_plugin),
    cleanup_plugin: Some(cleanup_plugin),
});

#[no_mangle]
pub static plugin_info: ExportedInfo = ExportedInfo(PluginInfo {
    version: 1,
    plugin_type: 0, // encoder
    plugin: &ENCODER as *const ExportedEncoder as *const c_void,
    internal_handle: std::ptr::null_mut(),
});

/// Init calls not yet matched by a cleanup call.
#[no_mangle]
pub extern "C" fn encoder_plugin_active_count() -> c_int {
    ACTIVE.load(Ordering::SeqCst)
}
