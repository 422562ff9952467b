//! Encoder information frames.
//!
//! Encoders write a Xing/Info or VBRI block into the first frame slot. The
//! frame carries no audio; its payload records the stream totals.

use super::{FrameHeader, HEADER_LEN};
use serde::{Deserialize, Serialize};

const XING_FRAMES_FLAG: u32 = 0x1;
const XING_BYTES_FLAG: u32 = 0x2;

/// VBRI sits at a fixed offset regardless of the side information size.
const VBRI_OFFSET: usize = HEADER_LEN + 32;

/// Which information frame was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VbrKind {
    /// Variable bitrate (`Xing`)
    Xing,
    /// Constant bitrate written by LAME (`Info`)
    Info,
    /// Fraunhofer VBRI
    Vbri,
}

/// Totals recorded in an information frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VbrInfo {
    pub kind: VbrKind,
    /// Audio frames in the stream, excluding the information frame.
    pub frames: Option<u32>,
    /// Stream length in bytes.
    pub bytes: Option<u32>,
}

impl VbrInfo {
    /// Inspect a complete frame for an information block.
    ///
    /// `frame` must start at the frame header.
    pub fn detect(header: &FrameHeader, frame: &[u8]) -> Option<Self> {
        let crc_len = if header.crc_protected { 2 } else { 0 };
        let xing_offset = HEADER_LEN + crc_len + header.side_info_len();

        if let Some(info) = parse_xing(frame.get(xing_offset..)?) {
            return Some(info);
        }

        parse_vbri(frame.get(VBRI_OFFSET..)?)
    }
}

fn parse_xing(data: &[u8]) -> Option<VbrInfo> {
    let kind = match data.get(..4)? {
        b"Xing" => VbrKind::Xing,
        b"Info" => VbrKind::Info,
        _ => return None,
    };

    let flags = read_u32(data, 4)?;
    let mut cursor = 8;

    let frames = if flags & XING_FRAMES_FLAG != 0 {
        let value = read_u32(data, cursor)?;
        cursor += 4;
        Some(value)
    } else {
        None
    };

    let bytes = if flags & XING_BYTES_FLAG != 0 {
        Some(read_u32(data, cursor)?)
    } else {
        None
    };

    Some(VbrInfo { kind, frames, bytes })
}

fn parse_vbri(data: &[u8]) -> Option<VbrInfo> {
    if data.get(..4)? != b"VBRI" {
        return None;
    }

    // "VBRI" | version u16 | delay u16 | quality u16 | bytes u32 | frames u32
    Some(VbrInfo {
        kind: VbrKind::Vbri,
        bytes: Some(read_u32(data, 10)?),
        frames: Some(read_u32(data, 14)?),
    })
}

fn read_u32(data: &[u8], at: usize) -> Option<u32> {
    let bytes = data.get(at..at + 4)?;
    Some(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}
