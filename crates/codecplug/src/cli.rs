use std::fmt::Write;

use codecplug_core::plugin_system::CodecPlugin;
use codecplug_core::{DecoderRef, EncoderRef, Error, PluginDescriptor};

/// One-line summary of a loaded descriptor.
pub fn describe(descriptor: PluginDescriptor) -> String {
    match descriptor.plugin() {
        Some(CodecPlugin::Encoder(encoder)) => format!(
            "encoder '{}' (format {}, priority {})",
            encoder.name(),
            encoder.compression_format(),
            encoder.priority()
        ),
        Some(CodecPlugin::Decoder(decoder)) => format!("decoder '{}'", decoder.name()),
        None => format!("unknown plugin kind ({:?})", descriptor),
    }
}

/// The active plugin lists as printed by `list`. Encoders come in priority order.
pub fn render_registry(encoders: &[EncoderRef], decoders: &[DecoderRef]) -> String {
    let mut out = String::new();
    // Writing to a String cannot fail.
    let _ = writeln!(out, "{} encoders", encoders.len());
    for encoder in encoders {
        let _ = writeln!(
            out,
            "  {:>4}  {} (format {}, API v{})",
            encoder.priority(),
            encoder.name(),
            encoder.compression_format(),
            encoder.api_version()
        );
    }
    let _ = writeln!(out, "{} decoders", decoders.len());
    for decoder in decoders {
        let _ = writeln!(out, "        {} (API v{})", decoder.name(), decoder.api_version());
    }
    out
}

/// Code and subcode of a failure, for scripts that match on them.
pub fn codes(error: &Error) -> String {
    format!(
        "code {} ({:?}), subcode {} ({:?})",
        error.code() as i32,
        error.code(),
        error.subcode() as i32,
        error.subcode()
    )
}
