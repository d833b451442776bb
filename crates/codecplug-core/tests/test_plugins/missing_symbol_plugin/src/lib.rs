#![allow(dead_code)]

use std::os::raw::c_int;

// The loader looks for a data symbol named `plugin_info`; this module exports
// something else, so loading it must fail at symbol resolution.
#[no_mangle]
pub static plugin_information: c_int = 1;

#[no_mangle]
pub extern "C" fn unrelated_export() -> c_int {
    42
}
