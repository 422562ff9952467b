//! # Stream Metadata
//!
//! The immutable description of an MP3 stream, derived once from its first
//! frame header.

use crate::header::vbr::VbrInfo;
use crate::header::{ChannelMode, Emphasis, FrameHeader, Layer, MpegVersion};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Audio parameters of an MP3 stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamMetadata {
    pub version: MpegVersion,
    pub layer: Layer,
    pub channel_mode: ChannelMode,
    pub mode_extension: u8,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Bitrate of the first frame in kbps
    pub bitrate_kbps: u32,
    pub padding: bool,
    pub crc_protected: bool,
    pub emphasis: Emphasis,
    /// PCM samples per channel in each frame
    pub samples_per_frame: u32,
    /// Size of the first frame in bytes
    pub frame_size: usize,
    /// Byte offset of the first audio frame
    pub audio_offset: u64,
    /// Bytes of audio data from `audio_offset` to the end fence, if known
    pub audio_bytes: Option<u64>,
    /// Xing/Info or VBRI totals, when the stream carries them
    pub vbr: Option<VbrInfo>,
}

impl StreamMetadata {
    pub(crate) fn from_header(
        header: &FrameHeader,
        audio_offset: u64,
        audio_bytes: Option<u64>,
        vbr: Option<VbrInfo>,
    ) -> Self {
        Self {
            version: header.version,
            layer: header.layer,
            channel_mode: header.channel_mode,
            mode_extension: header.mode_extension,
            sample_rate: header.sample_rate,
            bitrate_kbps: header.bitrate_kbps,
            padding: header.padding,
            crc_protected: header.crc_protected,
            emphasis: header.emphasis,
            samples_per_frame: header.samples_per_frame(),
            frame_size: header.frame_size(),
            audio_offset,
            audio_bytes,
            vbr,
        }
    }

    /// Number of output channels.
    pub fn channels(&self) -> u16 {
        self.channel_mode.channels()
    }

    /// Whether the stream announced itself as variable bitrate.
    pub fn is_vbr(&self) -> bool {
        matches!(
            self.vbr,
            Some(VbrInfo {
                kind: crate::header::vbr::VbrKind::Xing | crate::header::vbr::VbrKind::Vbri,
                ..
            })
        )
    }

    /// Total audio frames.
    ///
    /// Taken from the information frame when present, otherwise estimated
    /// from the audio length and the first frame's size.
    pub fn total_frames(&self) -> Option<u64> {
        if let Some(frames) = self.vbr.and_then(|info| info.frames) {
            return Some(frames as u64);
        }

        let bytes = self.audio_bytes?;
        if self.frame_size == 0 {
            return None;
        }
        Some(bytes / self.frame_size as u64)
    }

    /// Total PCM samples per channel.
    pub fn total_samples(&self) -> Option<u64> {
        self.total_frames()
            .map(|frames| frames * self.samples_per_frame as u64)
    }

    /// Estimated playing time.
    pub fn duration(&self) -> Option<Duration> {
        if self.sample_rate == 0 {
            return None;
        }
        self.total_samples()
            .map(|samples| Duration::from_secs_f64(samples as f64 / self.sample_rate as f64))
    }
}
