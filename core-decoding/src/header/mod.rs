//! # MPEG Audio Frame Headers
//!
//! Bit-exact decoding of the 32-bit MPEG-1/2/2.5 audio frame header
//! (ISO/IEC 11172-3, ISO/IEC 13818-3):
//!
//! ```text
//! AAAAAAAA AAABBCCD EEEEFFGH IIJJKLMM
//!
//! A  frame sync (all set)      E  bitrate index
//! B  version                   F  sample-rate index
//! C  layer                     G  padding
//! D  protection (0 = CRC)      H  private
//! I  channel mode              J  mode extension
//! K  copyright  L  original    M  emphasis
//! ```

pub mod vbr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Size of the fixed frame header in bytes.
pub const HEADER_LEN: usize = 4;

/// Bitrates in kbps, indexed by `[table][bitrate_index]`.
///
/// Tables: MPEG-1 Layer I, II, III, then MPEG-2/2.5 Layer I and Layer II/III.
const BITRATES: [[u32; 15]; 5] = [
    [0, 32, 64, 96, 128, 160, 192, 224, 256, 288, 320, 352, 384, 416, 448],
    [0, 32, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320, 384],
    [0, 32, 40, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320],
    [0, 32, 48, 56, 64, 80, 96, 112, 128, 144, 160, 176, 192, 224, 256],
    [0, 8, 16, 24, 32, 40, 48, 56, 64, 80, 96, 112, 128, 144, 160],
];

/// MPEG audio version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MpegVersion {
    /// ISO/IEC 11172-3
    Mpeg1,
    /// ISO/IEC 13818-3 low sample rate extension
    Mpeg2,
    /// Unofficial MPEG 2.5 extension
    Mpeg25,
}

impl MpegVersion {
    fn base_sample_rates(self) -> [u32; 3] {
        match self {
            MpegVersion::Mpeg1 => [44100, 48000, 32000],
            MpegVersion::Mpeg2 => [22050, 24000, 16000],
            MpegVersion::Mpeg25 => [11025, 12000, 8000],
        }
    }
}

/// MPEG audio layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Layer {
    Layer1,
    Layer2,
    Layer3,
}

/// How the stereo channels are coded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelMode {
    Stereo,
    JointStereo,
    DualChannel,
    Mono,
}

impl ChannelMode {
    /// Number of coded channels.
    pub fn channels(self) -> u16 {
        match self {
            ChannelMode::Mono => 1,
            _ => 2,
        }
    }
}

/// De-emphasis to apply after decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Emphasis {
    None,
    /// 50/15 microseconds
    Ms50By15,
    /// CCITT J.17
    CcittJ17,
}

/// Why four bytes are not a usable frame header.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderDefect {
    #[error("missing frame sync")]
    NoSync,
    #[error("reserved MPEG version")]
    ReservedVersion,
    #[error("reserved layer")]
    ReservedLayer,
    #[error("free-format bitrate is not supported")]
    FreeFormat,
    #[error("invalid bitrate index")]
    BadBitrate,
    #[error("reserved sample-rate index")]
    ReservedSampleRate,
    #[error("reserved emphasis")]
    ReservedEmphasis,
}

/// A decoded MPEG audio frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameHeader {
    pub version: MpegVersion,
    pub layer: Layer,
    /// A 16-bit CRC follows the header.
    pub crc_protected: bool,
    pub bitrate_kbps: u32,
    pub sample_rate: u32,
    pub padding: bool,
    pub private: bool,
    pub channel_mode: ChannelMode,
    /// Joint-stereo mode extension bits, raw.
    pub mode_extension: u8,
    pub copyright: bool,
    pub original: bool,
    pub emphasis: Emphasis,
}

impl FrameHeader {
    /// Decode a header from the first four bytes of `bytes`.
    pub fn parse(bytes: &[u8]) -> Result<Self, HeaderDefect> {
        if bytes.len() < HEADER_LEN || !is_sync(bytes[0], bytes[1]) {
            return Err(HeaderDefect::NoSync);
        }

        let version = match (bytes[1] >> 3) & 0b11 {
            0b00 => MpegVersion::Mpeg25,
            0b10 => MpegVersion::Mpeg2,
            0b11 => MpegVersion::Mpeg1,
            _ => return Err(HeaderDefect::ReservedVersion),
        };

        let layer = match (bytes[1] >> 1) & 0b11 {
            0b01 => Layer::Layer3,
            0b10 => Layer::Layer2,
            0b11 => Layer::Layer1,
            _ => return Err(HeaderDefect::ReservedLayer),
        };

        let crc_protected = bytes[1] & 0b1 == 0;

        let bitrate_index = (bytes[2] >> 4) as usize;
        let bitrate_kbps = match bitrate_index {
            0 => return Err(HeaderDefect::FreeFormat),
            15 => return Err(HeaderDefect::BadBitrate),
            index => BITRATES[bitrate_table(version, layer)][index],
        };

        let sample_rate = match (bytes[2] >> 2) & 0b11 {
            3 => return Err(HeaderDefect::ReservedSampleRate),
            index => version.base_sample_rates()[index as usize],
        };

        let channel_mode = match bytes[3] >> 6 {
            0b00 => ChannelMode::Stereo,
            0b01 => ChannelMode::JointStereo,
            0b10 => ChannelMode::DualChannel,
            _ => ChannelMode::Mono,
        };

        let emphasis = match bytes[3] & 0b11 {
            0b00 => Emphasis::None,
            0b01 => Emphasis::Ms50By15,
            0b11 => Emphasis::CcittJ17,
            _ => return Err(HeaderDefect::ReservedEmphasis),
        };

        Ok(Self {
            version,
            layer,
            crc_protected,
            bitrate_kbps,
            sample_rate,
            padding: (bytes[2] >> 1) & 0b1 == 1,
            private: bytes[2] & 0b1 == 1,
            channel_mode,
            mode_extension: (bytes[3] >> 4) & 0b11,
            copyright: (bytes[3] >> 3) & 0b1 == 1,
            original: (bytes[3] >> 2) & 0b1 == 1,
            emphasis,
        })
    }

    /// PCM samples per channel produced by one frame.
    pub fn samples_per_frame(&self) -> u32 {
        match (self.layer, self.version) {
            (Layer::Layer1, _) => 384,
            (Layer::Layer2, _) => 1152,
            (Layer::Layer3, MpegVersion::Mpeg1) => 1152,
            (Layer::Layer3, _) => 576,
        }
    }

    /// Total frame length in bytes, header included.
    pub fn frame_size(&self) -> usize {
        let bitrate = self.bitrate_kbps as usize * 1000;
        let sample_rate = self.sample_rate as usize;
        let padding = self.padding as usize;

        match self.layer {
            Layer::Layer1 => (12 * bitrate / sample_rate + padding) * 4,
            _ => self.samples_per_frame() as usize / 8 * bitrate / sample_rate + padding,
        }
    }

    /// Length of the Layer III side information block.
    pub fn side_info_len(&self) -> usize {
        match (self.version, self.channel_mode) {
            (MpegVersion::Mpeg1, ChannelMode::Mono) => 17,
            (MpegVersion::Mpeg1, _) => 32,
            (_, ChannelMode::Mono) => 9,
            _ => 17,
        }
    }

    /// Whether `other` can belong to the same elementary stream.
    pub fn is_compatible(&self, other: &FrameHeader) -> bool {
        self.version == other.version
            && self.layer == other.layer
            && self.sample_rate == other.sample_rate
    }
}

/// Whether two bytes start with the 11-bit frame sync.
pub fn is_sync(first: u8, second: u8) -> bool {
    first == 0xFF && second & 0xE0 == 0xE0
}

fn bitrate_table(version: MpegVersion, layer: Layer) -> usize {
    match (version, layer) {
        (MpegVersion::Mpeg1, Layer::Layer1) => 0,
        (MpegVersion::Mpeg1, Layer::Layer2) => 1,
        (MpegVersion::Mpeg1, Layer::Layer3) => 2,
        (_, Layer::Layer1) => 3,
        _ => 4,
    }
}
