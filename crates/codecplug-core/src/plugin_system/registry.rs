use log::debug;

use crate::kernel::constants::{
    MAX_DECODER_PLUGIN_API_VERSION, MAX_ENCODER_PLUGIN_API_VERSION, MIN_PLUGIN_API_VERSION,
};
use crate::plugin_system::descriptor::{CodecPlugin, DecoderRef, EncoderRef, PluginDescriptor};
use crate::plugin_system::error::PluginSystemError;

/// Lists of the encoder and decoder plugins that are currently active.
///
/// Registration runs the plugin's `init_plugin` hook; removal runs its
/// `cleanup_plugin` (encoders) or `deinit_plugin` (decoders) hook first. The
/// registry does no locking of its own: it lives inside the
/// [`PluginContext`](crate::PluginContext) state and is only reached under the
/// context lock.
#[derive(Debug, Default, Clone)]
pub struct PluginRegistry {
    /// Ordered by descending priority; equal priorities keep insertion order.
    encoders: Vec<EncoderRef>,
    decoders: Vec<DecoderRef>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a descriptor with the list matching its kind.
    pub fn register(&mut self, descriptor: PluginDescriptor) -> Result<(), PluginSystemError> {
        match descriptor.plugin() {
            Some(CodecPlugin::Encoder(encoder)) => self.register_encoder(encoder),
            Some(CodecPlugin::Decoder(decoder)) => self.register_decoder(decoder),
            None => Err(PluginSystemError::PluginLoadFailure {
                path: Default::default(),
                message: format!("descriptor {:?} has no usable plugin table", descriptor),
            }),
        }
    }

    /// Remove a descriptor from the list matching its kind.
    ///
    /// Returns `false` when it was not registered, in which case no hook runs.
    pub fn unregister(&mut self, descriptor: PluginDescriptor) -> bool {
        match descriptor.plugin() {
            Some(CodecPlugin::Encoder(encoder)) => self.unregister_encoder(encoder),
            Some(CodecPlugin::Decoder(decoder)) => self.unregister_decoder(decoder),
            None => false,
        }
    }

    pub fn register_encoder(&mut self, encoder: EncoderRef) -> Result<(), PluginSystemError> {
        let version = encoder.api_version();
        if !(MIN_PLUGIN_API_VERSION..=MAX_ENCODER_PLUGIN_API_VERSION).contains(&version) {
            return Err(PluginSystemError::UnsupportedPluginVersion {
                plugin: encoder.name(),
                version,
            });
        }
        if self.encoders.contains(&encoder) {
            debug!("Encoder '{}' already registered", encoder.name());
            return Ok(());
        }

        encoder.run_init();

        let priority = encoder.priority();
        let position = self
            .encoders
            .iter()
            .position(|existing| existing.priority() < priority)
            .unwrap_or(self.encoders.len());
        self.encoders.insert(position, encoder);
        debug!("Registered encoder '{}' (priority {})", encoder.name(), priority);
        Ok(())
    }

    pub fn register_decoder(&mut self, decoder: DecoderRef) -> Result<(), PluginSystemError> {
        let version = decoder.api_version();
        if !(MIN_PLUGIN_API_VERSION..=MAX_DECODER_PLUGIN_API_VERSION).contains(&version) {
            return Err(PluginSystemError::UnsupportedPluginVersion {
                plugin: decoder.name(),
                version,
            });
        }
        if self.decoders.contains(&decoder) {
            debug!("Decoder '{}' already registered", decoder.name());
            return Ok(());
        }

        decoder.run_init();
        self.decoders.push(decoder);
        debug!("Registered decoder '{}'", decoder.name());
        Ok(())
    }

    /// Runs the encoder's cleanup hook, then removes it.
    pub fn unregister_encoder(&mut self, encoder: EncoderRef) -> bool {
        match self.encoders.iter().position(|e| *e == encoder) {
            Some(index) => {
                encoder.run_cleanup();
                self.encoders.remove(index);
                debug!("Unregistered encoder '{}'", encoder.name());
                true
            }
            None => {
                debug!("Encoder {:?} is not registered", encoder);
                false
            }
        }
    }

    /// Runs the decoder's deinit hook, then removes it.
    pub fn unregister_decoder(&mut self, decoder: DecoderRef) -> bool {
        match self.decoders.iter().position(|d| *d == decoder) {
            Some(index) => {
                decoder.run_deinit();
                self.decoders.remove(index);
                debug!("Unregistered decoder '{}'", decoder.name());
                true
            }
            None => {
                debug!("Decoder {:?} is not registered", decoder);
                false
            }
        }
    }

    pub fn unregister_all_decoders(&mut self) {
        for decoder in &self.decoders {
            decoder.run_deinit();
        }
        self.decoders.clear();
    }

    pub fn unregister_all_encoders(&mut self) {
        for encoder in &self.encoders {
            encoder.run_cleanup();
        }
        self.encoders.clear();
    }

    pub fn encoders(&self) -> &[EncoderRef] {
        &self.encoders
    }

    pub fn decoders(&self) -> &[DecoderRef] {
        &self.decoders
    }

    pub fn is_registered(&self, descriptor: PluginDescriptor) -> bool {
        match descriptor.plugin() {
            Some(CodecPlugin::Encoder(encoder)) => self.encoders.contains(&encoder),
            Some(CodecPlugin::Decoder(decoder)) => self.decoders.contains(&decoder),
            None => false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.encoders.is_empty() && self.decoders.is_empty()
    }

    /// Highest-priority encoder for a compression format.
    pub fn find_encoder(&self, compression_format: i32) -> Option<EncoderRef> {
        self.encoders
            .iter()
            .copied()
            .find(|e| e.compression_format() == compression_format)
    }

    /// Decoder reporting the highest support level for a format.
    pub fn find_decoder(&self, compression_format: i32) -> Option<DecoderRef> {
        self.decoders
            .iter()
            .copied()
            .map(|d| (d.support_level(compression_format), d))
            .filter(|(level, _)| *level > 0)
            .max_by_key(|(level, _)| *level)
            .map(|(_, d)| d)
    }
}
