//! # MP3 Decoding Module
//!
//! Streams decoded PCM out of MP3 files without loading them into memory.
//!
//! ## Overview
//!
//! This module handles:
//! - Skipping leading ID3v2 tags and fencing off trailing ID3v1 tags
//! - Locating and parsing the first MPEG audio frame header
//! - Frame-by-frame decoding through a pluggable engine (symphonia by default)
//!
//! ## Pipeline
//!
//! ```text
//! Decoder::open(path)
//!   ├─ DecodeFlags::new(config)
//!   ├─ TagSkipper::skip         cursor moves past ID3v2
//!   ├─ HeaderParser::parse      StreamMetadata, flags primed
//!   └─ each_decoded_frame()     StreamDecoding ─► DecodeEngine ─► DecodedFrame*
//! ```

pub mod config;
pub mod decoder;
pub mod engine;
pub mod error;
pub mod flags;
pub mod frame;
pub mod header;
pub mod metadata;
pub mod parser;
pub mod session;
pub mod stream;
pub mod tag;

pub use config::DecoderConfig;
pub use decoder::{Decoder, DecoderBuilder};
pub use engine::{DecodeEngine, EngineOutput};
pub use error::{DecodingError, Result};
pub use flags::{DecodeFlags, StreamExpectations};
pub use frame::DecodedFrame;
pub use header::vbr::{VbrInfo, VbrKind};
pub use header::{ChannelMode, Emphasis, FrameHeader, Layer, MpegVersion};
pub use metadata::StreamMetadata;
pub use parser::{HeaderParser, Mp3HeaderParser};
pub use session::DecodeSession;
pub use stream::{DecodedFrames, EngineFactory, FrameIter, FrameStreamDecoder, StreamDecoding};
pub use tag::{Id3TagSkipper, TagKind, TagPresence, TagSkipper};

#[cfg(feature = "decoder-mp3")]
pub use engine::SymphoniaEngine;
