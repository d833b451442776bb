//! # Plugin descriptor ABI
//!
//! `#[repr(C)]` mirrors of the data a codec module exports. Every module
//! exports a single `plugin_info` data symbol of type [`PluginInfo`]; its
//! `plugin` field points at either an [`EncoderPlugin`] or a
//! [`DecoderPlugin`] function table. Only the leading fields of those tables
//! that the registry needs are modelled here; the rest of the table belongs to
//! the codec layer and is never touched.
//!
//! [`PluginDescriptor`], [`EncoderRef`] and [`DecoderRef`] are non-owning,
//! copyable handles onto that foreign memory. They compare by address.
use std::ffi::{CStr, c_void};
use std::fmt;
use std::os::raw::{c_char, c_int};
use std::ptr::NonNull;

/// Hook without arguments or result (`init_plugin`, `cleanup_plugin`, ...).
pub type PluginHookFn = unsafe extern "C" fn();
/// Returns a static, NUL-terminated plugin name.
pub type PluginNameFn = unsafe extern "C" fn() -> *const c_char;

/// The structure behind the exported `plugin_info` symbol.
#[repr(C)]
#[derive(Debug)]
pub struct PluginInfo {
    /// Version of this structure, currently 1.
    pub version: c_int,
    /// Raw [`PluginKind`] tag.
    pub plugin_type: c_int,
    /// Pointer to an [`EncoderPlugin`] or [`DecoderPlugin`].
    pub plugin: *const c_void,
    /// Reserved for the module, never read.
    pub internal_handle: *mut c_void,
}

/// Leading fields of an encoder function table.
#[repr(C)]
#[derive(Debug)]
pub struct EncoderPlugin {
    pub plugin_api_version: c_int,
    pub compression_format: c_int,
    pub id_name: *const c_char,
    pub priority: c_int,
    pub supports_lossy_compression: c_int,
    pub supports_lossless_compression: c_int,
    pub get_plugin_name: Option<PluginNameFn>,
    pub init_plugin: Option<PluginHookFn>,
    pub cleanup_plugin: Option<PluginHookFn>,
}

/// Leading fields of a decoder function table.
#[repr(C)]
#[derive(Debug)]
pub struct DecoderPlugin {
    pub plugin_api_version: c_int,
    pub get_plugin_name: Option<PluginNameFn>,
    pub init_plugin: Option<PluginHookFn>,
    pub deinit_plugin: Option<PluginHookFn>,
    pub does_support_format: Option<unsafe extern "C" fn(format: c_int) -> c_int>,
}

/// Kind tag carried by [`PluginInfo::plugin_type`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PluginKind {
    Encoder,
    Decoder,
}

impl PluginKind {
    pub const ENCODER_TAG: c_int = 0;
    pub const DECODER_TAG: c_int = 1;

    pub fn from_raw(tag: c_int) -> Option<Self> {
        match tag {
            Self::ENCODER_TAG => Some(PluginKind::Encoder),
            Self::DECODER_TAG => Some(PluginKind::Decoder),
            _ => None,
        }
    }

    pub fn as_raw(self) -> c_int {
        match self {
            PluginKind::Encoder => Self::ENCODER_TAG,
            PluginKind::Decoder => Self::DECODER_TAG,
        }
    }
}

impl fmt::Display for PluginKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PluginKind::Encoder => write!(f, "encoder"),
            PluginKind::Decoder => write!(f, "decoder"),
        }
    }
}

/// Reads an optional C string.
/// # Safety
/// If `ptr` is non-null it must point to a NUL-terminated string that stays
/// valid for the duration of the call.
unsafe fn ffi_opt_string_from_ptr(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        None
    } else {
        Some(unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned())
    }
}

/// Non-owning handle on a module's `plugin_info`.
///
/// The pointee belongs to the native module and is only valid while that
/// module stays loaded.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PluginDescriptor(NonNull<PluginInfo>);

// The pointee is immutable foreign data; access is serialized by the context lock.
unsafe impl Send for PluginDescriptor {}
unsafe impl Sync for PluginDescriptor {}

impl PluginDescriptor {
    /// Wraps a raw `plugin_info` address. Returns `None` for null.
    ///
    /// # Safety
    /// A non-null `ptr` must point to a valid [`PluginInfo`] whose `plugin`
    /// field, if non-null, points to the function table matching its kind.
    /// Both must outlive every use of the returned descriptor.
    pub unsafe fn from_raw(ptr: *const PluginInfo) -> Option<Self> {
        NonNull::new(ptr as *mut PluginInfo).map(Self)
    }

    pub fn as_ptr(&self) -> *const PluginInfo {
        self.0.as_ptr()
    }

    fn info(&self) -> &PluginInfo {
        // SAFETY: guaranteed by the `from_raw` contract.
        unsafe { self.0.as_ref() }
    }

    pub fn version(&self) -> i32 {
        self.info().version
    }

    /// `None` when the module advertises a kind tag this core does not know.
    pub fn kind(&self) -> Option<PluginKind> {
        PluginKind::from_raw(self.info().plugin_type)
    }

    /// Typed view of the function table, `None` for an unknown kind or a null table.
    pub fn plugin(&self) -> Option<CodecPlugin> {
        let table = self.info().plugin;
        match self.kind()? {
            // SAFETY: the `from_raw` contract ties the table type to the kind tag.
            PluginKind::Encoder => unsafe { EncoderRef::from_raw(table as *const EncoderPlugin) }
                .map(CodecPlugin::Encoder),
            PluginKind::Decoder => unsafe { DecoderRef::from_raw(table as *const DecoderPlugin) }
                .map(CodecPlugin::Decoder),
        }
    }
}

impl fmt::Debug for PluginDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginDescriptor")
            .field("address", &self.0)
            .field("kind", &self.kind())
            .finish()
    }
}

/// A descriptor resolved to its typed function table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodecPlugin {
    Encoder(EncoderRef),
    Decoder(DecoderRef),
}

impl CodecPlugin {
    pub fn kind(&self) -> PluginKind {
        match self {
            CodecPlugin::Encoder(_) => PluginKind::Encoder,
            CodecPlugin::Decoder(_) => PluginKind::Decoder,
        }
    }

    pub fn name(&self) -> String {
        match self {
            CodecPlugin::Encoder(encoder) => encoder.name(),
            CodecPlugin::Decoder(decoder) => decoder.name(),
        }
    }
}

/// Non-owning handle on an encoder function table.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct EncoderRef(NonNull<EncoderPlugin>);

unsafe impl Send for EncoderRef {}
unsafe impl Sync for EncoderRef {}

impl EncoderRef {
    /// # Safety
    /// A non-null `ptr` must point to a valid [`EncoderPlugin`] that outlives
    /// every use of the returned handle.
    pub unsafe fn from_raw(ptr: *const EncoderPlugin) -> Option<Self> {
        NonNull::new(ptr as *mut EncoderPlugin).map(Self)
    }

    pub fn as_ptr(&self) -> *const EncoderPlugin {
        self.0.as_ptr()
    }

    fn table(&self) -> &EncoderPlugin {
        // SAFETY: guaranteed by the `from_raw` contract.
        unsafe { self.0.as_ref() }
    }

    pub fn api_version(&self) -> i32 {
        self.table().plugin_api_version
    }

    pub fn priority(&self) -> i32 {
        self.table().priority
    }

    pub fn compression_format(&self) -> i32 {
        self.table().compression_format
    }

    pub fn id_name(&self) -> Option<String> {
        unsafe { ffi_opt_string_from_ptr(self.table().id_name) }
    }

    /// Name reported by `get_plugin_name`, falling back to `id_name`.
    pub fn name(&self) -> String {
        let reported = self
            .table()
            .get_plugin_name
            .and_then(|get_name| unsafe { ffi_opt_string_from_ptr(get_name()) });
        reported
            .or_else(|| self.id_name())
            .unwrap_or_else(|| "<unnamed encoder>".to_string())
    }

    pub(crate) fn run_init(&self) {
        if let Some(init) = self.table().init_plugin {
            unsafe { init() }
        }
    }

    pub(crate) fn run_cleanup(&self) {
        if let Some(cleanup) = self.table().cleanup_plugin {
            unsafe { cleanup() }
        }
    }
}

impl fmt::Debug for EncoderRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncoderRef")
            .field("address", &self.0)
            .field("priority", &self.priority())
            .finish()
    }
}

/// Non-owning handle on a decoder function table.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct DecoderRef(NonNull<DecoderPlugin>);

unsafe impl Send for DecoderRef {}
unsafe impl Sync for DecoderRef {}

impl DecoderRef {
    /// # Safety
    /// A non-null `ptr` must point to a valid [`DecoderPlugin`] that outlives
    /// every use of the returned handle.
    pub unsafe fn from_raw(ptr: *const DecoderPlugin) -> Option<Self> {
        NonNull::new(ptr as *mut DecoderPlugin).map(Self)
    }

    pub fn as_ptr(&self) -> *const DecoderPlugin {
        self.0.as_ptr()
    }

    fn table(&self) -> &DecoderPlugin {
        // SAFETY: guaranteed by the `from_raw` contract.
        unsafe { self.0.as_ref() }
    }

    pub fn api_version(&self) -> i32 {
        self.table().plugin_api_version
    }

    pub fn name(&self) -> String {
        self.table()
            .get_plugin_name
            .and_then(|get_name| unsafe { ffi_opt_string_from_ptr(get_name()) })
            .unwrap_or_else(|| "<unnamed decoder>".to_string())
    }

    /// Asks the decoder whether it handles `format`. Zero means "no".
    pub fn support_level(&self, format: i32) -> i32 {
        match self.table().does_support_format {
            Some(supports) => unsafe { supports(format) },
            None => 0,
        }
    }

    pub(crate) fn run_init(&self) {
        if let Some(init) = self.table().init_plugin {
            unsafe { init() }
        }
    }

    pub(crate) fn run_deinit(&self) {
        if let Some(deinit) = self.table().deinit_plugin {
            unsafe { deinit() }
        }
    }
}

impl fmt::Debug for DecoderRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecoderRef").field("address", &self.0).finish()
    }
}
