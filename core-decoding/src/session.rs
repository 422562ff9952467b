//! # Decode Session
//!
//! Owns the byte source of one decode and tracks the read cursor. An optional
//! end fence keeps trailing metadata away from the engine.

use std::fmt;
use std::io::{self, Cursor, ErrorKind, Read, Seek, SeekFrom};
use symphonia::core::io::MediaSource;

/// A byte source plus the cursor every parsing stage works from.
pub struct DecodeSession {
    source: Box<dyn MediaSource>,
    position: u64,
    len: Option<u64>,
    fence: Option<u64>,
}

impl DecodeSession {
    /// Wrap a media source. The cursor starts at the source's current position.
    pub fn new(mut source: Box<dyn MediaSource>) -> io::Result<Self> {
        let len = source.byte_len();
        let position = source.stream_position()?;

        Ok(Self {
            source,
            position,
            len,
            fence: None,
        })
    }

    /// Session over an in-memory buffer.
    pub fn from_bytes(data: impl Into<Vec<u8>>) -> Self {
        let data = data.into();
        Self {
            len: Some(data.len() as u64),
            source: Box::new(Cursor::new(data)),
            position: 0,
            fence: None,
        }
    }

    /// Current read cursor (absolute byte offset).
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Total length of the underlying source, if known.
    pub fn byte_len(&self) -> Option<u64> {
        self.len
    }

    /// Offset at which audio data ends.
    pub fn audio_end(&self) -> Option<u64> {
        match (self.fence, self.len) {
            (Some(fence), Some(len)) => Some(fence.min(len)),
            (Some(fence), None) => Some(fence),
            (None, len) => len,
        }
    }

    /// Stop reads at `end`.
    pub fn set_audio_end(&mut self, end: u64) {
        self.fence = Some(end);
    }

    /// Bytes between the cursor and the audio end, if the end is known.
    pub fn remaining(&self) -> Option<u64> {
        self.audio_end()
            .map(|end| end.saturating_sub(self.position))
    }

    /// Move the cursor to an absolute offset.
    pub fn seek_to(&mut self, position: u64) -> io::Result<()> {
        self.position = self.source.seek(SeekFrom::Start(position))?;
        Ok(())
    }

    /// Advance the cursor by `count` bytes.
    pub fn skip(&mut self, count: u64) -> io::Result<()> {
        self.seek_to(self.position + count)
    }

    /// Fill `buf` from the cursor, stopping at the audio end.
    ///
    /// Returns the number of bytes read; `0` means the stream is exhausted.
    /// A short count only happens right before the end.
    pub fn read_chunk(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let limit = match self.remaining() {
            Some(remaining) => remaining.min(buf.len() as u64) as usize,
            None => buf.len(),
        };

        let mut filled = 0;
        while filled < limit {
            match self.source.read(&mut buf[filled..limit]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }

        self.position += filled as u64;
        Ok(filled)
    }

    /// Read up to `len` bytes at the cursor without moving it.
    pub fn peek(&mut self, len: usize) -> io::Result<Vec<u8>> {
        let start = self.position;
        let mut buf = vec![0u8; len];
        let read = self.read_chunk(&mut buf)?;
        buf.truncate(read);
        self.seek_to(start)?;
        Ok(buf)
    }

    /// Read up to `len` bytes at an absolute offset, ignoring the audio end,
    /// without moving the cursor.
    pub fn read_at(&mut self, offset: u64, len: usize) -> io::Result<Vec<u8>> {
        let start = self.position;
        let fence = self.fence.take();

        let result = self.seek_to(offset).and_then(|_| {
            let mut buf = vec![0u8; len];
            let read = self.read_chunk(&mut buf)?;
            buf.truncate(read);
            Ok(buf)
        });

        self.fence = fence;
        self.seek_to(start)?;
        result
    }
}

impl fmt::Debug for DecodeSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodeSession")
            .field("position", &self.position)
            .field("len", &self.len)
            .field("audio_end", &self.audio_end())
            .finish()
    }
}
