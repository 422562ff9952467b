//! End-to-end tests for the decoder pipeline
//!
//! This test suite verifies:
//! - Tag skipping and header parsing against real files
//! - Frame ordering, offsets and determinism
//! - Early termination and resource release
//! - Failure reporting for unusable and truncated streams

mod common;

use common::*;
use core_decoding::{
    ChannelMode, DecodedFrame, Decoder, DecoderBuilder, DecoderConfig, DecodingError, Result,
    TagKind, TagPresence,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn open_with_fake(path: &std::path::Path, probe: &EngineProbe, config: DecoderConfig) -> Decoder {
    DecoderBuilder::new()
        .config(config)
        .stream_decoder(probe.stream_decoder())
        .open(path)
        .expect("decoder should open")
}

fn collect(decoder: &mut Decoder) -> Vec<Result<DecodedFrame>> {
    decoder.each_decoded_frame().expect("stream").collect()
}

// ============================================================================
// Construction
// ============================================================================

#[test]
fn test_id3v2_tagged_file_end_to_end() {
    let mut data = id3v2_tag(128);
    data.extend(silent_frames(3));
    let file = write_temp(&data);
    let probe = EngineProbe::default();

    let mut decoder = open_with_fake(file.path(), &probe, DecoderConfig::default());

    assert_eq!(decoder.mp3_file(), file.path());
    assert_eq!(
        decoder.leading_tag(),
        TagPresence::Present {
            kind: TagKind::Id3v2 { major: 3 },
            len: 138
        }
    );
    assert_eq!(decoder.sample_rate(), 44100);
    assert_eq!(decoder.channel_mode(), ChannelMode::Stereo);
    assert_eq!(decoder.mp3_data().audio_offset, 138);
    assert_eq!(decoder.decode_flags().channels(), Some(2));

    let frames: Vec<DecodedFrame> = collect(&mut decoder)
        .into_iter()
        .collect::<Result<_>>()
        .unwrap();
    let offsets: Vec<u64> = frames.iter().map(|f| f.offset).collect();

    assert_eq!(offsets, vec![138, 555, 972]);
    assert!(frames.iter().all(|f| f.samples() == 1152 && f.channels() == 2));
    assert_eq!(probe.finishes(), 1);
}

#[test]
fn test_three_byte_file_fails_to_open() {
    let file = write_temp(&[0xFF, 0xFB, 0x90]);
    let err = Decoder::open(file.path()).unwrap_err();
    assert!(err.is_header_error());
}

#[test]
fn test_all_zero_file_fails_to_open() {
    let file = write_temp(&vec![0u8; 16 * 1024]);
    let err = Decoder::open(file.path()).unwrap_err();
    assert!(matches!(err, DecodingError::HeaderParse(_)));
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = Decoder::open(dir.path().join("missing.mp3")).unwrap_err();
    assert!(matches!(err, DecodingError::Io(_)));
}

#[test]
fn test_invalid_config_fails_to_open() {
    let file = write_temp(&silent_frames(2));
    let err = DecoderBuilder::new()
        .config(DecoderConfig::default().with_chunk_size(0))
        .open(file.path())
        .unwrap_err();
    assert!(matches!(err, DecodingError::InvalidConfig(_)));
}

// ============================================================================
// Streaming
// ============================================================================

#[test]
fn test_chunking_does_not_change_output() {
    let mut data = id3v2_tag(64);
    data.extend(silent_frames(5));
    let file = write_temp(&data);

    let mut outputs = Vec::new();
    for chunk_size in [1, 100, 417, 4096] {
        let probe = EngineProbe::default();
        let config = DecoderConfig::default().with_chunk_size(chunk_size);
        let mut decoder = open_with_fake(file.path(), &probe, config);
        let frames: Vec<DecodedFrame> = collect(&mut decoder)
            .into_iter()
            .collect::<Result<_>>()
            .unwrap();
        outputs.push(frames);
    }

    assert_eq!(outputs[0].len(), 5);
    assert!(outputs.windows(2).all(|pair| pair[0] == pair[1]));
}

#[test]
fn test_trailing_id3v1_is_not_decoded() {
    let mut data = silent_frames(3);
    data.extend(id3v1_trailer());
    let file = write_temp(&data);
    let probe = EngineProbe::default();

    let mut decoder = open_with_fake(file.path(), &probe, DecoderConfig::default());
    assert_eq!(decoder.mp3_data().audio_bytes, Some(3 * FRAME_LEN as u64));

    let results = collect(&mut decoder);
    assert_eq!(results.len(), 3);
    assert!(results.iter().all(|r| r.is_ok()));
}

#[test]
fn test_truncated_tail_reports_decode_error() {
    let mut data = silent_frames(2);
    data.extend_from_slice(&silent_frame()[..200]);
    let file = write_temp(&data);
    let probe = EngineProbe::default();

    let mut decoder = open_with_fake(file.path(), &probe, DecoderConfig::default());
    let results = collect(&mut decoder);

    assert_eq!(results.len(), 3);
    assert!(results[0].is_ok() && results[1].is_ok());
    let err = results[2].as_ref().unwrap_err();
    assert!(err.is_decode_error());
    assert_eq!(err.offset(), Some(2 * FRAME_LEN as u64));
}

#[test]
fn test_early_stop_makes_no_further_engine_calls() {
    let drops = Arc::new(AtomicUsize::new(0));
    let source = TrackedSource::new(silent_frames(10), drops.clone());
    let probe = EngineProbe::default();

    let mut decoder = DecoderBuilder::new()
        .config(DecoderConfig::default().with_chunk_size(FRAME_LEN))
        .stream_decoder(probe.stream_decoder())
        .build("in-memory.mp3", Box::new(source))
        .unwrap();

    {
        let mut frames = decoder.each_decoded_frame().unwrap();
        assert!(frames.next().unwrap().is_ok());
    }

    assert_eq!(probe.created(), 1);
    assert_eq!(probe.decode_calls(), 1);
    assert_eq!(probe.finishes(), 0);
    assert_eq!(probe.drops(), 1);
    assert_eq!(drops.load(Ordering::SeqCst), 0);

    drop(decoder);
    assert_eq!(drops.load(Ordering::SeqCst), 1);
}

#[test]
fn test_stream_can_only_be_taken_once() {
    let file = write_temp(&silent_frames(2));
    let probe = EngineProbe::default();
    let mut decoder = open_with_fake(file.path(), &probe, DecoderConfig::default());

    assert_eq!(collect(&mut decoder).len(), 2);
    assert!(matches!(
        decoder.each_decoded_frame(),
        Err(DecodingError::StreamConsumed)
    ));
    assert_eq!(probe.created(), 1);
}

#[test]
fn test_decoding_is_deterministic() {
    let mut data = id3v2_tag(32);
    data.extend(silent_frames(4));
    let file = write_temp(&data);

    let run = || {
        let probe = EngineProbe::default();
        let mut decoder = open_with_fake(file.path(), &probe, DecoderConfig::low_memory());
        collect(&mut decoder)
            .into_iter()
            .collect::<Result<Vec<_>>>()
            .unwrap()
    };

    assert_eq!(run(), run());
}

// ============================================================================
// Default Engine
// ============================================================================

#[cfg(feature = "decoder-mp3")]
#[test]
fn test_default_engine_decodes_silence() {
    let mut data = id3v2_tag(128);
    data.extend(silent_frames(3));
    let file = write_temp(&data);

    let mut decoder = Decoder::open(file.path()).unwrap();
    let frames: Vec<DecodedFrame> = decoder
        .each_decoded_frame()
        .unwrap()
        .collect::<Result<_>>()
        .unwrap();

    assert_eq!(frames.len(), 3);
    for frame in &frames {
        assert_eq!(frame.samples(), 1152);
        assert_eq!(frame.channels(), 2);
        assert_eq!(frame.sample_rate, 44100);
    }
    assert_eq!(frames[0].offset, 138);
}

#[cfg(feature = "decoder-mp3")]
#[test]
fn test_default_engine_rejects_truncated_frame_inside_stream() {
    let mut data = silent_frames(3);
    data.extend_from_slice(&silent_frame()[..200]);
    data.extend(silent_frames(3));
    let file = write_temp(&data);

    for chunk_size in [FRAME_LEN, 4096] {
        let config = DecoderConfig::default().with_chunk_size(chunk_size);
        let mut decoder = DecoderBuilder::new().config(config).open(file.path()).unwrap();
        let results = collect(&mut decoder);

        assert_eq!(results.len(), 4, "chunk size {chunk_size}");
        let offsets: Vec<u64> = results[..3]
            .iter()
            .map(|r| r.as_ref().unwrap().offset)
            .collect();
        assert_eq!(offsets, vec![0, 417, 834]);

        let err = results[3].as_ref().unwrap_err();
        assert!(err.is_decode_error());
        assert_eq!(err.offset(), Some(3 * FRAME_LEN as u64));
    }
}
