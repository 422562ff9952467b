//! Symphonia-backed MPEG audio engine.

use super::sample_converter::SampleConverter;
use super::{DecodeEngine, EngineOutput};
use crate::error::{DecodingError, Result};
use crate::flags::{DecodeFlags, StreamExpectations};
use crate::frame::DecodedFrame;
use crate::header::{FrameHeader, Layer, HEADER_LEN};
use bytes::BytesMut;
use std::fmt;
use std::sync::OnceLock;
use symphonia::core::audio::Channels;
use symphonia::core::codecs::{
    CodecParameters, CodecRegistry, CodecType, Decoder, DecoderOptions, CODEC_TYPE_MP1,
    CODEC_TYPE_MP2, CODEC_TYPE_MP3,
};
use symphonia::core::formats::Packet;
use symphonia_bundle_mp3::MpaDecoder;
use tracing::{debug, error, instrument, trace};

/// Registry holding only the MPEG audio decoder.
fn codec_registry() -> &'static CodecRegistry {
    static CODEC_REGISTRY: OnceLock<CodecRegistry> = OnceLock::new();
    CODEC_REGISTRY.get_or_init(|| {
        let mut registry = CodecRegistry::new();
        registry.register_all::<MpaDecoder>();
        registry
    })
}

/// Decode engine that frames the byte stream itself and hands each complete
/// frame to symphonia's MPEG audio decoder.
///
/// Frames are located with the crate's own header parser so that chunk
/// boundaries never split a packet. A frame that is not followed by another
/// header, junk between frames and a truncated final frame are all reported
/// as decode errors at the offending frame.
pub struct SymphoniaEngine {
    decoder: Option<Box<dyn Decoder>>,
    expectations: Option<StreamExpectations>,
    /// Bytes fed but not yet framed
    pending: BytesMut,
    /// Engine-relative offset of `pending[0]`
    pending_offset: u64,
    /// Running timestamp in samples
    timestamp: u64,
    /// Failure found after frames that were already returned
    deferred: Option<DecodingError>,
}

impl Default for SymphoniaEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl SymphoniaEngine {
    pub fn new() -> Self {
        Self {
            decoder: None,
            expectations: None,
            pending: BytesMut::new(),
            pending_offset: 0,
            timestamp: 0,
            deferred: None,
        }
    }

    fn codec_for(layer: Layer) -> CodecType {
        match layer {
            Layer::Layer1 => CODEC_TYPE_MP1,
            Layer::Layer2 => CODEC_TYPE_MP2,
            Layer::Layer3 => CODEC_TYPE_MP3,
        }
    }

    /// Header at `at` if it parses and belongs to the configured stream.
    fn header_at(&self, at: usize) -> Option<FrameHeader> {
        let header = FrameHeader::parse(self.pending.get(at..)?).ok()?;
        let expected = self.expectations?;

        let compatible = header.version == expected.version
            && header.layer == expected.layer
            && header.sample_rate == expected.sample_rate;
        compatible.then_some(header)
    }

    /// Header of the frame at the front of the pending buffer, once it can
    /// be handed to the codec.
    ///
    /// A frame is only released when a compatible header follows it, or,
    /// with `at_end`, when it ends exactly at the end of the data. `Ok(None)`
    /// means more bytes are needed.
    fn next_frame(&self, at_end: bool) -> Result<Option<FrameHeader>> {
        let available = self.pending.len();
        if available == 0 || (available < HEADER_LEN && !at_end) {
            return Ok(None);
        }

        let Some(header) = self.header_at(0) else {
            let message = if available < HEADER_LEN {
                format!("truncated frame: stream ends after {} of a header", available)
            } else {
                "lost frame sync: no frame header at this offset".to_string()
            };
            return Err(DecodingError::decode(Some(self.pending_offset), message));
        };

        let size = header.frame_size();
        if available >= size + HEADER_LEN {
            if self.header_at(size).is_none() {
                return Err(DecodingError::decode(
                    Some(self.pending_offset),
                    format!(
                        "frame of {} bytes is not followed by a frame header at byte {}",
                        size,
                        self.pending_offset + size as u64
                    ),
                ));
            }
            return Ok(Some(header));
        }

        if !at_end {
            return Ok(None);
        }
        if available < size {
            return Err(DecodingError::decode(
                Some(self.pending_offset),
                format!(
                    "truncated frame: stream ends after {} of {} bytes",
                    available, size
                ),
            ));
        }
        if available > size {
            return Err(DecodingError::decode(
                Some(self.pending_offset),
                format!("{} stray bytes after the last frame", available - size),
            ));
        }
        Ok(Some(header))
    }

    /// Split complete frames off the pending buffer and decode them.
    ///
    /// An error hit after some frames were decoded is held back until the
    /// next call so those frames are still delivered.
    fn drain_frames(&mut self, at_end: bool) -> Result<Vec<DecodedFrame>> {
        if let Some(err) = self.deferred.take() {
            return Err(err);
        }

        let mut frames = Vec::new();
        loop {
            let step = match self.next_frame(at_end) {
                Ok(Some(header)) => {
                    let offset = self.pending_offset;
                    let frame = self.pending.split_to(header.frame_size()).freeze();
                    self.pending_offset += frame.len() as u64;
                    self.decode_frame(&header, &frame, offset)
                }
                Ok(None) => break,
                Err(err) => Err(err),
            };

            match step {
                Ok(frame) => frames.push(frame),
                Err(err) if frames.is_empty() => return Err(err),
                Err(err) => {
                    self.deferred = Some(err);
                    break;
                }
            }
        }

        Ok(frames)
    }

    fn decode_frame(
        &mut self,
        header: &FrameHeader,
        frame: &[u8],
        offset: u64,
    ) -> Result<DecodedFrame> {
        let decoder = self
            .decoder
            .as_mut()
            .ok_or_else(|| DecodingError::Engine("engine used before configure".to_string()))?;

        let duration = header.samples_per_frame() as u64;
        let packet = Packet::new_from_slice(0, self.timestamp, duration, frame);
        self.timestamp += duration;

        let decoded = decoder.decode(&packet).map_err(|e| {
            error!(offset, "Frame decode failed: {}", e);
            DecodingError::decode(Some(offset), e.to_string())
        })?;

        let (left, right) = SampleConverter::to_planar_i16(&decoded);
        trace!(offset, samples = left.len(), "Decoded frame");

        let frame = match right {
            Some(right) if header.channel_mode.channels() == 2 => {
                DecodedFrame::stereo(left, right, header.sample_rate, offset)
            }
            _ => DecodedFrame::mono(left, header.sample_rate, offset),
        };
        Ok(frame)
    }
}

impl DecodeEngine for SymphoniaEngine {
    #[instrument(skip_all)]
    fn configure(&mut self, flags: &DecodeFlags) -> Result<()> {
        let expected = flags.expectations().copied().ok_or_else(|| {
            DecodingError::Engine("decode flags carry no stream parameters".to_string())
        })?;

        let channels = match expected.channels() {
            1 => Channels::FRONT_LEFT,
            _ => Channels::FRONT_LEFT | Channels::FRONT_RIGHT,
        };

        let mut params = CodecParameters::new();
        params
            .for_codec(Self::codec_for(expected.layer))
            .with_sample_rate(expected.sample_rate)
            .with_channels(channels);

        let decoder = codec_registry()
            .make(&params, &DecoderOptions::default())
            .map_err(|e| {
                error!("Failed to create MPEG decoder: {}", e);
                DecodingError::Engine(format!("Failed to create codec decoder: {}", e))
            })?;

        debug!(
            layer = ?expected.layer,
            sample_rate = expected.sample_rate,
            channels = expected.channels(),
            "MPEG engine configured"
        );

        self.decoder = Some(decoder);
        self.expectations = Some(expected);
        self.pending.clear();
        self.pending_offset = 0;
        self.timestamp = 0;
        self.deferred = None;
        Ok(())
    }

    fn decode(&mut self, chunk: &[u8]) -> Result<EngineOutput> {
        self.pending.extend_from_slice(chunk);

        let frames = self.drain_frames(false)?;
        if frames.is_empty() {
            Ok(EngineOutput::NeedMoreInput)
        } else {
            Ok(EngineOutput::Frames(frames))
        }
    }

    fn finish(&mut self) -> Result<Vec<DecodedFrame>> {
        self.drain_frames(true)
    }
}

impl fmt::Debug for SymphoniaEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SymphoniaEngine")
            .field("configured", &self.decoder.is_some())
            .field("pending", &self.pending.len())
            .field("pending_offset", &self.pending_offset)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DecoderConfig;
    use crate::metadata::StreamMetadata;

    const STEREO_44K: [u8; 4] = [0xFF, 0xFB, 0x90, 0x00];

    fn silent_frame() -> Vec<u8> {
        let mut frame = vec![0u8; 417];
        frame[..4].copy_from_slice(&STEREO_44K);
        frame
    }

    fn configured() -> SymphoniaEngine {
        let header = FrameHeader::parse(&STEREO_44K).unwrap();
        let metadata = StreamMetadata::from_header(&header, 0, None, None);
        let mut flags = DecodeFlags::new(DecoderConfig::default());
        flags.record_stream(&metadata);

        let mut engine = SymphoniaEngine::new();
        engine.configure(&flags).unwrap();
        engine
    }

    #[test]
    fn test_configure_requires_expectations() {
        let mut engine = SymphoniaEngine::new();
        let err = engine.configure(&DecodeFlags::default()).unwrap_err();
        assert!(matches!(err, DecodingError::Engine(_)));
    }

    fn silent_frames(count: usize) -> Vec<u8> {
        (0..count).flat_map(|_| silent_frame()).collect()
    }

    #[test]
    fn test_frame_waits_for_successor_or_end() {
        let mut engine = configured();
        let frame = silent_frame();

        assert_eq!(engine.decode(&frame[..200]).unwrap(), EngineOutput::NeedMoreInput);
        assert_eq!(engine.decode(&frame[200..]).unwrap(), EngineOutput::NeedMoreInput);

        let frames = engine.finish().unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].samples(), 1152);
        assert_eq!(frames[0].channels(), 2);
        assert_eq!(frames[0].offset, 0);
        assert!(engine.finish().unwrap().is_empty());
    }

    #[test]
    fn test_frame_offsets_follow_input() {
        let mut engine = configured();

        let mut frames = engine.decode(&silent_frames(3)).unwrap().into_frames();
        assert_eq!(frames.len(), 2);
        frames.extend(engine.finish().unwrap());

        let offsets: Vec<u64> = frames.iter().map(|f| f.offset).collect();
        assert_eq!(offsets, vec![0, 417, 834]);
        assert!(engine.finish().unwrap().is_empty());
    }

    #[test]
    fn test_truncated_frame_inside_stream_fails() {
        let mut engine = configured();
        let mut data = silent_frames(3);
        data.extend_from_slice(&silent_frame()[..200]);
        data.extend(silent_frames(3));

        let frames = engine.decode(&data).unwrap().into_frames();
        let offsets: Vec<u64> = frames.iter().map(|f| f.offset).collect();
        assert_eq!(offsets, vec![0, 417, 834]);

        let err = engine.decode(&[]).unwrap_err();
        assert!(err.is_decode_error());
        assert_eq!(err.offset(), Some(1251));
    }

    #[test]
    fn test_failure_is_reported_after_good_frames() {
        let mut engine = configured();
        let mut data = silent_frames(2);
        data.extend_from_slice(&[0x12, 0x34, 0xFF, 0x00, 0x56]);

        assert_eq!(engine.decode(&data).unwrap().into_frames().len(), 1);
        let err = engine.finish().unwrap_err();
        assert_eq!(err.offset(), Some(417));
    }

    #[test]
    fn test_junk_between_frames_fails() {
        let mut engine = configured();
        let mut data = silent_frame();
        data.extend_from_slice(&[0x12, 0x34, 0xFF, 0x00, 0x56]);
        data.extend(silent_frame());

        let err = engine.decode(&data).unwrap_err();
        assert!(err.is_decode_error());
        assert_eq!(err.offset(), Some(0));
    }

    #[test]
    fn test_truncated_tail_fails_on_finish() {
        let mut engine = configured();
        let mut data = silent_frame();
        data.extend_from_slice(&silent_frame()[..100]);

        assert_eq!(engine.decode(&data).unwrap().into_frames().len(), 1);
        let err = engine.finish().unwrap_err();
        assert!(err.is_decode_error());
        assert_eq!(err.offset(), Some(417));
    }

    #[test]
    fn test_trailing_junk_fails_on_finish() {
        let mut engine = configured();
        let mut data = silent_frame();
        data.extend_from_slice(b"APETAGEX");

        let err = engine.decode(&data).unwrap_err();
        assert_eq!(err.offset(), Some(0));

        let mut engine = configured();
        let mut data = silent_frame();
        data.extend_from_slice(&[0x00, 0x00]);

        assert_eq!(engine.decode(&data).unwrap(), EngineOutput::NeedMoreInput);
        let err = engine.finish().unwrap_err();
        assert!(err.is_decode_error());
        assert_eq!(err.offset(), Some(0));
    }
}
