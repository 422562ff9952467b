//! # Tag Skipping
//!
//! Moves the session cursor past leading ID3v2 tags and fences off a trailing
//! ID3v1 tag, so header parsing and decoding only ever see audio frames.

use crate::error::Result;
use crate::session::DecodeSession;
use tracing::{debug, warn};

/// ID3v2 header: "ID3", version (2), flags (1), synchsafe size (4).
pub const ID3V2_HEADER_LEN: u64 = 10;

/// ID3v2.4 footer, present when flag bit 4 is set.
pub const ID3V2_FOOTER_LEN: u64 = 10;

/// ID3v1 trailer: "TAG" plus 125 bytes of fixed fields.
pub const ID3V1_LEN: u64 = 128;

const ID3V2_FOOTER_FLAG: u8 = 0x10;

/// Which tag format was detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    /// Leading ID3v2 tag, with its major version
    Id3v2 { major: u8 },
    /// Trailing 128-byte ID3v1 tag
    Id3v1,
}

/// Outcome of a tag probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagPresence {
    Absent,
    Present {
        kind: TagKind,
        /// Total tag length, header and footer included
        len: u64,
    },
}

impl TagPresence {
    pub fn is_present(&self) -> bool {
        matches!(self, TagPresence::Present { .. })
    }

    /// Bytes the tag occupies, zero when absent.
    pub fn len(&self) -> u64 {
        match self {
            TagPresence::Absent => 0,
            TagPresence::Present { len, .. } => *len,
        }
    }
}

/// Skips metadata in front of the audio.
pub trait TagSkipper {
    /// Advance `session` past any leading tag.
    ///
    /// Absence of a tag is not an error and leaves the cursor untouched.
    /// Returns the leading tag that was skipped.
    fn skip(&self, session: &mut DecodeSession) -> Result<TagPresence>;
}

/// ID3 tag skipper.
#[derive(Debug, Clone, Copy)]
pub struct Id3TagSkipper {
    detect_trailer: bool,
}

impl Default for Id3TagSkipper {
    fn default() -> Self {
        Self {
            detect_trailer: true,
        }
    }
}

impl Id3TagSkipper {
    pub fn new(detect_trailer: bool) -> Self {
        Self { detect_trailer }
    }

    /// Inspect the bytes at the cursor for an ID3v2 header.
    ///
    /// A tag whose declared size runs past the end of the stream is reported
    /// as absent; the header parser will reject the stream on its own if the
    /// bytes are not audio.
    pub fn probe_leading(session: &mut DecodeSession) -> Result<TagPresence> {
        let header = session.peek(ID3V2_HEADER_LEN as usize)?;
        let Some(tag_len) = id3v2_tag_len(&header) else {
            return Ok(TagPresence::Absent);
        };

        if let Some(remaining) = session.remaining() {
            if tag_len > remaining {
                warn!(
                    offset = session.position(),
                    declared = tag_len,
                    remaining,
                    "ID3v2 tag size exceeds stream length, treating as untagged"
                );
                return Ok(TagPresence::Absent);
            }
        }

        Ok(TagPresence::Present {
            kind: TagKind::Id3v2 { major: header[3] },
            len: tag_len,
        })
    }

    /// Look for an ID3v1 trailer at the end of the stream.
    pub fn probe_trailing(session: &mut DecodeSession) -> Result<TagPresence> {
        let Some(len) = session.byte_len() else {
            return Ok(TagPresence::Absent);
        };
        if len < ID3V1_LEN || session.audio_end() != Some(len) {
            return Ok(TagPresence::Absent);
        }

        let trailer = session.read_at(len - ID3V1_LEN, 3)?;
        if trailer == b"TAG" && len - ID3V1_LEN >= session.position() {
            Ok(TagPresence::Present {
                kind: TagKind::Id3v1,
                len: ID3V1_LEN,
            })
        } else {
            Ok(TagPresence::Absent)
        }
    }
}

impl TagSkipper for Id3TagSkipper {
    fn skip(&self, session: &mut DecodeSession) -> Result<TagPresence> {
        let mut skipped = TagPresence::Absent;

        // Some writers prepend a second tag instead of rewriting the first.
        while let TagPresence::Present { kind, len } = Self::probe_leading(session)? {
            debug!(offset = session.position(), len, ?kind, "Skipping ID3v2 tag");
            session.skip(len)?;
            skipped = TagPresence::Present {
                kind,
                len: skipped.len() + len,
            };
        }

        if self.detect_trailer {
            if let TagPresence::Present { len, .. } = Self::probe_trailing(session)? {
                let end = session.byte_len().unwrap_or_default() - len;
                debug!(audio_end = end, "Fencing off ID3v1 trailer");
                session.set_audio_end(end);
            }
        }

        Ok(skipped)
    }
}

/// Total length of the ID3v2 tag starting at `header`, if it is one.
fn id3v2_tag_len(header: &[u8]) -> Option<u64> {
    if header.len() < ID3V2_HEADER_LEN as usize || &header[..3] != b"ID3" {
        return None;
    }

    let (major, minor, flags) = (header[3], header[4], header[5]);
    if major == 0xFF || minor == 0xFF {
        return None;
    }

    let size = decode_synchsafe(&header[6..10])?;
    let footer = if flags & ID3V2_FOOTER_FLAG != 0 {
        ID3V2_FOOTER_LEN
    } else {
        0
    };

    Some(ID3V2_HEADER_LEN + size as u64 + footer)
}

/// Decode a 28-bit synchsafe integer (7 significant bits per byte).
pub fn decode_synchsafe(bytes: &[u8]) -> Option<u32> {
    if bytes.len() != 4 || bytes.iter().any(|b| b & 0x80 != 0) {
        return None;
    }

    Some(bytes.iter().fold(0u32, |acc, b| (acc << 7) | *b as u32))
}
