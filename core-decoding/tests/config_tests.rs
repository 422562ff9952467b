//! Configuration loading tests

use core_decoding::{DecoderConfig, DecodingError, StreamMetadata};

#[test]
fn test_empty_json_uses_defaults() {
    let config: DecoderConfig = serde_json::from_str("{}").unwrap();
    assert_eq!(config, DecoderConfig::default());
}

#[test]
fn test_partial_json_overrides_fields() {
    let config: DecoderConfig =
        serde_json::from_str(r#"{ "chunk_size": 512, "detect_trailing_tag": false }"#).unwrap();

    assert_eq!(config.chunk_size, 512);
    assert!(!config.detect_trailing_tag);
    assert_eq!(config.max_sync_scan, 64 * 1024);
    assert!(config.validate_next_header);
}

#[test]
fn test_loaded_config_is_validated() {
    let config: DecoderConfig = serde_json::from_str(r#"{ "chunk_size": 0 }"#).unwrap();
    assert!(matches!(
        config.validate(),
        Err(DecodingError::InvalidConfig(_))
    ));
}

#[test]
fn test_presets_serialize() {
    let json = serde_json::to_value(DecoderConfig::strict()).unwrap();
    assert_eq!(json["max_sync_scan"], 0);
    assert_eq!(json["chunk_size"], 4096);
}

#[test]
fn test_stream_metadata_serializes_channel_mode() {
    let json = r#"{
        "version": "Mpeg1",
        "layer": "Layer3",
        "channel_mode": "joint_stereo",
        "mode_extension": 2,
        "sample_rate": 44100,
        "bitrate_kbps": 128,
        "padding": false,
        "crc_protected": false,
        "emphasis": "None",
        "samples_per_frame": 1152,
        "frame_size": 417,
        "audio_offset": 138,
        "audio_bytes": 4170,
        "vbr": null
    }"#;

    let metadata: StreamMetadata = serde_json::from_str(json).unwrap();
    assert_eq!(metadata.channels(), 2);
    assert_eq!(metadata.total_frames(), Some(10));

    let value = serde_json::to_value(&metadata).unwrap();
    assert_eq!(value["channel_mode"], "joint_stereo");
}
