//! # Decoder
//!
//! Entry point for decoding an MP3 file.
//!
//! Construction is eager: the decode flags are created, leading tags are
//! skipped and the stream header is parsed before [`Decoder`] is returned.
//! Decoding itself is lazy and starts with [`Decoder::each_decoded_frame`].
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use core_decoding::Decoder;
//!
//! # fn example() -> core_decoding::Result<()> {
//! let mut decoder = Decoder::open("song.mp3")?;
//! println!("{:?} at {} Hz", decoder.channel_mode(), decoder.sample_rate());
//!
//! for frame in decoder.each_decoded_frame()? {
//!     let frame = frame?;
//!     println!("{} samples", frame.samples());
//! }
//! # Ok(())
//! # }
//! ```

use crate::config::DecoderConfig;
use crate::error::{DecodingError, Result};
use crate::flags::DecodeFlags;
use crate::header::ChannelMode;
use crate::metadata::StreamMetadata;
use crate::parser::{HeaderParser, Mp3HeaderParser};
use crate::session::DecodeSession;
use crate::stream::{FrameIter, StreamDecoding};
use crate::tag::{Id3TagSkipper, TagPresence, TagSkipper};
use std::borrow::Cow;
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};
use symphonia::core::io::MediaSource;
use tracing::{debug, info, instrument};

/// An opened MP3 stream, positioned on its first audio frame.
pub struct Decoder {
    path: PathBuf,
    session: DecodeSession,
    flags: DecodeFlags,
    metadata: StreamMetadata,
    leading_tag: TagPresence,
    stream_decoder: Box<dyn StreamDecoding>,
    consumed: bool,
}

impl Decoder {
    /// Open `path` with the default collaborators and configuration.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        DecoderBuilder::new().open(path)
    }

    pub fn builder() -> DecoderBuilder {
        DecoderBuilder::new()
    }

    /// Path the decoder was opened with.
    pub fn mp3_file(&self) -> &Path {
        &self.path
    }

    pub fn decode_flags(&self) -> &DecodeFlags {
        &self.flags
    }

    /// Parsed stream header.
    pub fn mp3_data(&self) -> &StreamMetadata {
        &self.metadata
    }

    pub fn channel_mode(&self) -> ChannelMode {
        self.metadata.channel_mode
    }

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.metadata.sample_rate
    }

    /// The leading tag skipped during construction.
    pub fn leading_tag(&self) -> TagPresence {
        self.leading_tag
    }

    /// Start decoding.
    ///
    /// Items are passed through from the stream decoder unchanged. The
    /// sequence can be taken once; later calls fail with
    /// [`DecodingError::StreamConsumed`].
    pub fn each_decoded_frame(&mut self) -> Result<FrameIter<'_>> {
        if self.consumed {
            return Err(DecodingError::StreamConsumed);
        }

        let frames = self
            .stream_decoder
            .each_decoded_frame(&self.flags, &self.metadata, &mut self.session)?;
        self.consumed = true;
        Ok(frames)
    }
}

impl fmt::Debug for Decoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Decoder")
            .field("path", &self.path)
            .field("session", &self.session)
            .field("metadata", &self.metadata)
            .field("leading_tag", &self.leading_tag)
            .field("consumed", &self.consumed)
            .finish()
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Builds a [`Decoder`] with injectable collaborators.
///
/// Every collaborator left unset falls back to the default implementation.
#[derive(Default)]
pub struct DecoderBuilder {
    config: DecoderConfig,
    tag_skipper: Option<Box<dyn TagSkipper>>,
    header_parser: Option<Box<dyn HeaderParser>>,
    stream_decoder: Option<Box<dyn StreamDecoding>>,
}

impl DecoderBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: DecoderConfig) -> Self {
        self.config = config;
        self
    }

    pub fn tag_skipper(mut self, skipper: impl TagSkipper + 'static) -> Self {
        self.tag_skipper = Some(Box::new(skipper));
        self
    }

    pub fn header_parser(mut self, parser: impl HeaderParser + 'static) -> Self {
        self.header_parser = Some(Box::new(parser));
        self
    }

    pub fn stream_decoder(mut self, decoder: impl StreamDecoding + 'static) -> Self {
        self.stream_decoder = Some(Box::new(decoder));
        self
    }

    /// Open the file at `path` and build the decoder over it.
    pub fn open(self, path: impl AsRef<Path>) -> Result<Decoder> {
        let path = path.as_ref();
        let file = File::open(path)?;
        self.build(path, Box::new(file))
    }

    /// Build a decoder over an already opened source.
    ///
    /// `path` is only recorded; all bytes come from `source`.
    #[instrument(skip_all, fields(file = %log_name(path.as_ref())))]
    pub fn build(self, path: impl AsRef<Path>, source: Box<dyn MediaSource>) -> Result<Decoder> {
        self.config.validate()?;

        let mut session = DecodeSession::new(source)?;
        let mut flags = DecodeFlags::new(self.config.clone());

        let tag_skipper = self
            .tag_skipper
            .unwrap_or_else(|| Box::new(Id3TagSkipper::new(self.config.detect_trailing_tag)));
        let leading_tag = tag_skipper.skip(&mut session)?;
        if let TagPresence::Present { kind, len } = leading_tag {
            debug!(?kind, len, "Skipped leading tag");
        }

        let header_parser = self
            .header_parser
            .unwrap_or_else(|| Box::new(Mp3HeaderParser::new()));
        let metadata = header_parser.parse(&mut flags, &mut session)?;

        let stream_decoder = match self.stream_decoder {
            Some(decoder) => decoder,
            None => default_stream_decoder()?,
        };

        info!(
            sample_rate = metadata.sample_rate,
            channel_mode = ?metadata.channel_mode,
            audio_offset = metadata.audio_offset,
            "Decoder ready"
        );

        Ok(Decoder {
            path: path.as_ref().to_path_buf(),
            session,
            flags,
            metadata,
            leading_tag,
            stream_decoder,
            consumed: false,
        })
    }
}

/// File name only, so logs don't carry full local paths.
fn log_name(path: &Path) -> Cow<'_, str> {
    path.file_name().unwrap_or(path.as_os_str()).to_string_lossy()
}

#[cfg(feature = "decoder-mp3")]
fn default_stream_decoder() -> Result<Box<dyn StreamDecoding>> {
    Ok(Box::new(crate::stream::FrameStreamDecoder::default()))
}

#[cfg(not(feature = "decoder-mp3"))]
fn default_stream_decoder() -> Result<Box<dyn StreamDecoding>> {
    Err(DecodingError::Engine(
        "no decode engine compiled in; enable the `decoder-mp3` feature or inject a stream decoder"
            .to_string(),
    ))
}
