//! # Stream Decoder
//!
//! Drives a [`DecodeEngine`] over the audio region of a session and hands
//! decoded frames out one at a time.
//!
//! ## Lifecycle
//!
//! ```text
//! each_decoded_frame ─► engine created + configured
//!        │
//!        ▼
//!  next() ─► frame queued? ──yes──► yield it
//!        │ no
//!        ▼
//!  read chunk ─► bytes ─► engine.decode ─► Frames | NeedMoreInput | Err
//!        │ end of audio
//!        ▼
//!  engine.finish ─► remaining frames (repeat) | none | Err ─► exhausted
//! ```
//!
//! Nothing is read ahead of the consumer: a chunk is only pulled from the
//! session when the queue of decoded frames is empty. After the first error
//! the iterator is exhausted.

use crate::engine::DecodeEngine;
use crate::error::{DecodingError, Result};
use crate::flags::DecodeFlags;
use crate::frame::DecodedFrame;
use crate::metadata::StreamMetadata;
use crate::session::DecodeSession;
use std::collections::VecDeque;
use std::fmt;
use std::iter::FusedIterator;
use std::sync::Arc;
use tracing::{debug, error, instrument};

/// Lazy, single-pass sequence of decoded frames.
pub type FrameIter<'a> = Box<dyn Iterator<Item = Result<DecodedFrame>> + 'a>;

/// Creates one engine per decode pass.
pub type EngineFactory = Arc<dyn Fn() -> Box<dyn DecodeEngine> + Send + Sync>;

/// Produces the decoded frame sequence for a parsed stream.
pub trait StreamDecoding {
    /// Start decoding at the session cursor.
    ///
    /// The engine is configured before this returns, so an engine that
    /// rejects the flags fails here rather than on the first `next()`.
    fn each_decoded_frame<'a>(
        &self,
        flags: &DecodeFlags,
        metadata: &StreamMetadata,
        session: &'a mut DecodeSession,
    ) -> Result<FrameIter<'a>>;
}

/// Chunked stream decoder.
#[derive(Clone)]
pub struct FrameStreamDecoder {
    factory: EngineFactory,
}

impl FrameStreamDecoder {
    /// Decoder whose engines come from `factory`.
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn() -> Box<dyn DecodeEngine> + Send + Sync + 'static,
    {
        Self {
            factory: Arc::new(factory),
        }
    }
}

#[cfg(feature = "decoder-mp3")]
impl Default for FrameStreamDecoder {
    fn default() -> Self {
        Self::new(|| Box::new(crate::engine::SymphoniaEngine::new()))
    }
}

impl fmt::Debug for FrameStreamDecoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameStreamDecoder").finish_non_exhaustive()
    }
}

impl StreamDecoding for FrameStreamDecoder {
    #[instrument(skip_all, fields(audio_offset = metadata.audio_offset))]
    fn each_decoded_frame<'a>(
        &self,
        flags: &DecodeFlags,
        metadata: &StreamMetadata,
        session: &'a mut DecodeSession,
    ) -> Result<FrameIter<'a>> {
        let mut engine = (self.factory)();
        engine.configure(flags)?;

        debug!(
            chunk_size = flags.config().chunk_size,
            start = session.position(),
            audio_end = ?session.audio_end(),
            "Starting frame stream"
        );

        Ok(Box::new(DecodedFrames::new(
            engine,
            session,
            flags.config().chunk_size,
        )))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Reading,
    Draining,
    Done,
}

/// Iterator returned by [`FrameStreamDecoder`].
///
/// Owns the engine; dropping the iterator drops the engine.
pub struct DecodedFrames<'a> {
    engine: Box<dyn DecodeEngine>,
    session: &'a mut DecodeSession,
    chunk: Vec<u8>,
    /// Absolute offset of the first byte fed to the engine
    base_offset: u64,
    ready: VecDeque<DecodedFrame>,
    state: State,
    yielded: u64,
}

impl<'a> DecodedFrames<'a> {
    pub fn new(
        engine: Box<dyn DecodeEngine>,
        session: &'a mut DecodeSession,
        chunk_size: usize,
    ) -> Self {
        let base_offset = session.position();
        Self {
            engine,
            session,
            chunk: vec![0u8; chunk_size.max(1)],
            base_offset,
            ready: VecDeque::new(),
            state: State::Reading,
            yielded: 0,
        }
    }

    fn enqueue(&mut self, frames: Vec<DecodedFrame>) {
        let base = self.base_offset;
        self.ready.extend(frames.into_iter().map(|mut frame| {
            frame.offset += base;
            frame
        }));
    }

    /// Translate an engine failure into the terminal error of the sequence.
    fn fail(&mut self, err: DecodingError) -> DecodingError {
        self.state = State::Done;
        self.ready.clear();

        let err = match err {
            DecodingError::Decode { offset, message } => {
                DecodingError::decode(offset.map(|o| o + self.base_offset), message)
            }
            DecodingError::Io(e) => DecodingError::Io(e),
            other => DecodingError::decode(None, other.to_string()),
        };
        error!(frames = self.yielded, "Frame stream failed: {}", err);
        err
    }

    /// Advance the state machine until a frame is queued or the stream ends.
    fn fill(&mut self) -> Option<DecodingError> {
        while self.ready.is_empty() {
            match self.state {
                State::Done => return None,
                State::Draining => match self.engine.finish() {
                    Ok(frames) if frames.is_empty() => {
                        self.state = State::Done;
                        debug!(frames = self.yielded, "Frame stream exhausted");
                    }
                    Ok(frames) => self.enqueue(frames),
                    Err(e) => return Some(self.fail(e)),
                },
                State::Reading => {
                    let read = match self.session.read_chunk(&mut self.chunk) {
                        Ok(read) => read,
                        Err(e) => return Some(self.fail(e.into())),
                    };

                    if read == 0 {
                        self.state = State::Draining;
                        continue;
                    }

                    match self.engine.decode(&self.chunk[..read]) {
                        Ok(output) => self.enqueue(output.into_frames()),
                        Err(e) => return Some(self.fail(e)),
                    }
                }
            }
        }
        None
    }
}

impl Iterator for DecodedFrames<'_> {
    type Item = Result<DecodedFrame>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(err) = self.fill() {
            return Some(Err(err));
        }

        let frame = self.ready.pop_front()?;
        self.yielded += 1;
        Some(Ok(frame))
    }
}

impl FusedIterator for DecodedFrames<'_> {}

impl fmt::Debug for DecodedFrames<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodedFrames")
            .field("session", &self.session)
            .field("queued", &self.ready.len())
            .field("state", &self.state)
            .field("yielded", &self.yielded)
            .finish()
    }
}
