//! # Decode Flags
//!
//! The settings object shared by the header parser and the decode engine.
//! It is created once per session from a [`DecoderConfig`]; the header parser
//! records what it learned about the stream so the engine can be primed
//! before the first frame is fed to it.

use crate::config::DecoderConfig;
use crate::header::{ChannelMode, Layer, MpegVersion};
use crate::metadata::StreamMetadata;

/// Stream parameters the engine should expect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamExpectations {
    pub version: MpegVersion,
    pub layer: Layer,
    pub sample_rate: u32,
    pub channel_mode: ChannelMode,
}

impl StreamExpectations {
    pub fn channels(&self) -> u16 {
        self.channel_mode.channels()
    }
}

/// Per-session decode settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodeFlags {
    config: DecoderConfig,
    expectations: Option<StreamExpectations>,
}

impl DecodeFlags {
    pub fn new(config: DecoderConfig) -> Self {
        Self {
            config,
            expectations: None,
        }
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Record the parameters of a parsed stream.
    pub fn record_stream(&mut self, metadata: &StreamMetadata) {
        self.expectations = Some(StreamExpectations {
            version: metadata.version,
            layer: metadata.layer,
            sample_rate: metadata.sample_rate,
            channel_mode: metadata.channel_mode,
        });
    }

    /// Parameters recorded by the header parser, if it has run.
    pub fn expectations(&self) -> Option<&StreamExpectations> {
        self.expectations.as_ref()
    }

    pub fn sample_rate(&self) -> Option<u32> {
        self.expectations.map(|e| e.sample_rate)
    }

    pub fn channels(&self) -> Option<u16> {
        self.expectations.map(|e| e.channels())
    }
}
