//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use core_decoding::{
    DecodeEngine, DecodeFlags, DecodedFrame, DecodingError, EngineOutput, FrameHeader,
    FrameStreamDecoder, Result,
};
use std::io::{Cursor, Read, Seek, SeekFrom, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use symphonia::core::io::MediaSource;
use tempfile::NamedTempFile;

// ============================================================================
// Stream Builders
// ============================================================================

/// MPEG-1 Layer III, 128 kbps, 44100 Hz, stereo, no CRC, no padding.
pub const STEREO_44K: [u8; 4] = [0xFF, 0xFB, 0x90, 0x00];

/// Size of a [`STEREO_44K`] frame.
pub const FRAME_LEN: usize = 417;

/// A frame with a zeroed payload (decodes to silence).
pub fn silent_frame() -> Vec<u8> {
    let mut frame = vec![0u8; FRAME_LEN];
    frame[..4].copy_from_slice(&STEREO_44K);
    frame
}

pub fn silent_frames(count: usize) -> Vec<u8> {
    (0..count).flat_map(|_| silent_frame()).collect()
}

/// ID3v2.3 tag with `size` bytes of zeroed body.
pub fn id3v2_tag(size: u32) -> Vec<u8> {
    let mut tag = b"ID3".to_vec();
    tag.extend_from_slice(&[3, 0, 0]);
    tag.extend_from_slice(&[
        ((size >> 21) & 0x7F) as u8,
        ((size >> 14) & 0x7F) as u8,
        ((size >> 7) & 0x7F) as u8,
        (size & 0x7F) as u8,
    ]);
    tag.resize(10 + size as usize, 0);
    tag
}

/// 128-byte ID3v1 trailer.
pub fn id3v1_trailer() -> Vec<u8> {
    let mut tag = b"TAG".to_vec();
    tag.extend_from_slice(b"Title");
    tag.resize(128, 0);
    tag
}

pub fn write_temp(bytes: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp file");
    file.write_all(bytes).expect("write temp file");
    file.flush().expect("flush temp file");
    file
}

// ============================================================================
// Fake Engine
// ============================================================================

/// Counters shared between a test and the engines it creates.
#[derive(Debug, Clone, Default)]
pub struct EngineProbe {
    pub created: Arc<AtomicUsize>,
    pub decode_calls: Arc<AtomicUsize>,
    pub finishes: Arc<AtomicUsize>,
    pub drops: Arc<AtomicUsize>,
}

impl EngineProbe {
    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn decode_calls(&self) -> usize {
        self.decode_calls.load(Ordering::SeqCst)
    }

    pub fn finishes(&self) -> usize {
        self.finishes.load(Ordering::SeqCst)
    }

    pub fn drops(&self) -> usize {
        self.drops.load(Ordering::SeqCst)
    }

    /// Stream decoder whose engines report to this probe.
    pub fn stream_decoder(&self) -> FrameStreamDecoder {
        let probe = self.clone();
        FrameStreamDecoder::new(move || {
            probe.created.fetch_add(1, Ordering::SeqCst);
            Box::new(FakeEngine::new(probe.clone()))
        })
    }
}

/// Frames the stream by header and emits silent PCM for each frame.
pub struct FakeEngine {
    probe: EngineProbe,
    channels: u16,
    pending: Vec<u8>,
    offset: u64,
}

impl FakeEngine {
    pub fn new(probe: EngineProbe) -> Self {
        Self {
            probe,
            channels: 0,
            pending: Vec::new(),
            offset: 0,
        }
    }
}

impl DecodeEngine for FakeEngine {
    fn configure(&mut self, flags: &DecodeFlags) -> Result<()> {
        self.channels = flags
            .channels()
            .ok_or_else(|| DecodingError::Engine("unprimed flags".to_string()))?;
        Ok(())
    }

    fn decode(&mut self, chunk: &[u8]) -> Result<EngineOutput> {
        self.probe.decode_calls.fetch_add(1, Ordering::SeqCst);
        self.pending.extend_from_slice(chunk);

        let mut frames = Vec::new();
        while self.pending.len() >= 4 {
            let header = FrameHeader::parse(&self.pending)
                .map_err(|e| DecodingError::decode(Some(self.offset), e.to_string()))?;
            let size = header.frame_size();
            if self.pending.len() < size {
                break;
            }

            self.pending.drain(..size);
            let samples = vec![0i16; header.samples_per_frame() as usize];
            let frame = if self.channels == 2 {
                DecodedFrame::stereo(samples.clone(), samples, header.sample_rate, self.offset)
            } else {
                DecodedFrame::mono(samples, header.sample_rate, self.offset)
            };
            frames.push(frame);
            self.offset += size as u64;
        }

        if frames.is_empty() {
            Ok(EngineOutput::NeedMoreInput)
        } else {
            Ok(EngineOutput::Frames(frames))
        }
    }

    fn finish(&mut self) -> Result<Vec<DecodedFrame>> {
        self.probe.finishes.fetch_add(1, Ordering::SeqCst);
        if !self.pending.is_empty() {
            return Err(DecodingError::decode(
                Some(self.offset),
                format!("truncated frame ({} bytes)", self.pending.len()),
            ));
        }
        Ok(Vec::new())
    }
}

impl Drop for FakeEngine {
    fn drop(&mut self) {
        self.probe.drops.fetch_add(1, Ordering::SeqCst);
    }
}

// ============================================================================
// Tracked Source
// ============================================================================

/// In-memory media source that counts how often it is dropped.
pub struct TrackedSource {
    inner: Cursor<Vec<u8>>,
    drops: Arc<AtomicUsize>,
}

impl TrackedSource {
    pub fn new(data: Vec<u8>, drops: Arc<AtomicUsize>) -> Self {
        Self {
            inner: Cursor::new(data),
            drops,
        }
    }
}

impl Read for TrackedSource {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.inner.read(buf)
    }
}

impl Seek for TrackedSource {
    fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
        self.inner.seek(pos)
    }
}

impl MediaSource for TrackedSource {
    fn is_seekable(&self) -> bool {
        true
    }

    fn byte_len(&self) -> Option<u64> {
        Some(self.inner.get_ref().len() as u64)
    }
}

impl Drop for TrackedSource {
    fn drop(&mut self) {
        self.drops.fetch_add(1, Ordering::SeqCst);
    }
}
