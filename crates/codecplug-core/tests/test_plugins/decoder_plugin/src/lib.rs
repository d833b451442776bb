#![allow(dead_code, non_upper_case_globals)] // FFI definitions and the fixed export name

use std::os::raw::{c_char, c_int, c_void};

#[repr(C)]
pub struct PluginInfo {
    pub version: c_int,
    pub plugin_type: c_int,
    pub plugin: *const c_void,
    pub internal_handle: *mut c_void,
}

#[repr(C)]
pub struct DecoderPlugin {
    pub plugin_api_version: c_int,
    pub get_plugin_name: Option<extern "C" fn() -> *const c_char>,
    pub init_plugin: Option<extern "C" fn()>,
    pub deinit_plugin: Option<extern "C" fn()>,
    pub does_support_format: Option<extern "C" fn(format: c_int) -> c_int>,
}

#[repr(transparent)]
pub struct ExportedInfo(PluginInfo);
unsafe impl Sync for ExportedInfo {}

#[repr(transparent)]
pub struct ExportedDecoder(DecoderPlugin);
unsafe impl Sync for ExportedDecoder {}

extern "C" fn plugin_name() -> *const c_char {
    b"Test Decoder\0".as_ptr() as *const c_char
}

extern "C" fn does_support_format(format: c_int) -> c_int {
    if format == 1 {
        100
    } else {
        0
    }
}

static DECODER: ExportedDecoder = ExportedDecoder(DecoderPlugin {
    plugin_api_version: 1,
    get_plugin_name: Some(plugin_name),
    init_plugin: None,
    deinit_plugin: None,
    does_support_format: Some(does_support_format),
});

#[no_mangle]
pub static plugin_info: ExportedInfo = ExportedInfo(PluginInfo {
    version: 1,
    plugin_type: 1, // decoder
    plugin: &DECODER as *const ExportedDecoder as *const c_void,
    internal_handle: std::ptr::null_mut(),
});
