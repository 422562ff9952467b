//! # Decode Engine
//!
//! The narrow seam between the streaming loop and the code that turns
//! compressed MPEG frames into PCM.
//!
//! ## Contract
//!
//! An engine is created fresh for every decode pass and fed the compressed
//! stream in arbitrary chunks:
//!
//! ```text
//! configure(flags) → decode(chunk)* → finish()
//! ```
//!
//! - `decode` buffers partial frames internally and returns
//!   [`EngineOutput::NeedMoreInput`] when a chunk completed no frame.
//! - Offsets in returned frames and errors are relative to the first byte
//!   ever fed to the engine; the stream decoder rebases them.
//! - `finish` drains what is left and reports a truncated final frame as an
//!   error.
//!
//! ## Implementations
//!
//! | Engine | Feature Flag | Backend |
//! |--------|--------------|---------|
//! | [`SymphoniaEngine`] | `decoder-mp3` | `symphonia-bundle-mp3` |

#[cfg(feature = "decoder-mp3")]
mod sample_converter;

#[cfg(feature = "decoder-mp3")]
mod symphonia;

#[cfg(feature = "decoder-mp3")]
pub use self::symphonia::SymphoniaEngine;

use crate::error::Result;
use crate::flags::DecodeFlags;
use crate::frame::DecodedFrame;

/// Result of feeding one chunk to an engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineOutput {
    /// One or more frames completed, in stream order
    Frames(Vec<DecodedFrame>),
    /// The chunk was buffered without completing a frame
    NeedMoreInput,
}

impl EngineOutput {
    /// Collapse into a possibly empty frame list.
    pub fn into_frames(self) -> Vec<DecodedFrame> {
        match self {
            EngineOutput::Frames(frames) => frames,
            EngineOutput::NeedMoreInput => Vec::new(),
        }
    }
}

/// MPEG audio decode engine.
pub trait DecodeEngine {
    /// Prime the engine with the stream parameters recorded in `flags`.
    ///
    /// Fails with [`DecodingError::Engine`](crate::DecodingError::Engine) when
    /// the flags carry no stream expectations or the backend rejects them.
    fn configure(&mut self, flags: &DecodeFlags) -> Result<()>;

    /// Feed the next chunk of compressed bytes.
    fn decode(&mut self, chunk: &[u8]) -> Result<EngineOutput>;

    /// Signal end of input and drain any buffered output.
    ///
    /// Called repeatedly until it returns no frames or fails, so an engine
    /// can hand out its last frames before reporting a failure behind them.
    fn finish(&mut self) -> Result<Vec<DecodedFrame>>;
}
