//! # Header Parser
//!
//! Finds the first MPEG audio frame after any skipped tag and turns its
//! header into [`StreamMetadata`].

use crate::error::{DecodingError, Result};
use crate::flags::DecodeFlags;
use crate::header::vbr::VbrInfo;
use crate::header::{is_sync, FrameHeader, Layer, HEADER_LEN};
use crate::metadata::StreamMetadata;
use crate::session::DecodeSession;
use tracing::{debug, info, instrument, warn};

/// Parses the stream header at the session cursor.
pub trait HeaderParser {
    /// Locate the first frame, record the stream expectations into `flags`
    /// and leave the cursor on the first audio frame.
    fn parse(&self, flags: &mut DecodeFlags, session: &mut DecodeSession)
        -> Result<StreamMetadata>;
}

/// MPEG-1/2/2.5 Layer I/II/III header parser.
#[derive(Debug, Clone, Copy, Default)]
pub struct Mp3HeaderParser;

impl Mp3HeaderParser {
    pub fn new() -> Self {
        Self
    }
}

impl HeaderParser for Mp3HeaderParser {
    #[instrument(skip_all, fields(start = session.position()))]
    fn parse(
        &self,
        flags: &mut DecodeFlags,
        session: &mut DecodeSession,
    ) -> Result<StreamMetadata> {
        let config = flags.config().clone();
        let start = session.position();
        let window = session.peek(config.sync_window())?;

        if window.len() < HEADER_LEN {
            return Err(DecodingError::HeaderParse(format!(
                "stream ends at byte {} before a frame header",
                start + window.len() as u64
            )));
        }

        let at_end = window.len() < config.sync_window();
        let (skipped, header) = find_first_frame(
            &window,
            config.max_sync_scan,
            config.validate_next_header,
            at_end,
        )
        .ok_or_else(|| {
            DecodingError::HeaderParse(format!(
                "no valid MPEG frame sync within {} bytes of offset {}",
                config.max_sync_scan, start
            ))
        })?;

        if skipped > 0 {
            warn!(skipped, "Skipped junk before first frame");
        }

        let mut audio_offset = start + skipped as u64;
        let frame_end = (skipped + header.frame_size()).min(window.len());
        let vbr = match header.layer {
            Layer::Layer3 => VbrInfo::detect(&header, &window[skipped..frame_end]),
            _ => None,
        };

        if let Some(info) = vbr {
            debug!(?info, "Skipping encoder information frame");
            audio_offset += header.frame_size() as u64;
        }
        session.seek_to(audio_offset)?;

        let audio_bytes = session
            .audio_end()
            .map(|end| end.saturating_sub(audio_offset));
        let metadata = StreamMetadata::from_header(&header, audio_offset, audio_bytes, vbr);
        flags.record_stream(&metadata);

        info!(
            version = ?metadata.version,
            layer = ?metadata.layer,
            sample_rate = metadata.sample_rate,
            channel_mode = ?metadata.channel_mode,
            bitrate_kbps = metadata.bitrate_kbps,
            audio_offset,
            "Parsed MPEG stream header"
        );

        Ok(metadata)
    }
}

/// Scan `window` for the first acceptable frame header.
///
/// Candidates start at most `max_scan` bytes into the window. When `at_end`
/// is set the window ends at the audio end, and a candidate whose frame runs
/// past it is rejected. Returns the candidate's offset within the window and
/// its decoded header.
fn find_first_frame(
    window: &[u8],
    max_scan: usize,
    validate_next: bool,
    at_end: bool,
) -> Option<(usize, FrameHeader)> {
    let last = window.len().checked_sub(HEADER_LEN)?.min(max_scan);

    (0..=last).find_map(|at| {
        if !is_sync(window[at], window[at + 1]) {
            return None;
        }
        let header = FrameHeader::parse(&window[at..]).ok()?;

        if at_end && at + header.frame_size() > window.len() {
            debug!(at, "Rejected sync candidate running past the audio end");
            return None;
        }
        if validate_next && !next_header_agrees(window, at, &header) {
            debug!(at, "Rejected sync candidate without a matching successor");
            return None;
        }
        Some((at, header))
    })
}

/// Whether the frame following `header` is compatible.
///
/// The window always covers a successor unless the audio ends first, so a
/// missing successor is only accepted when the frame ends exactly at the end
/// of the window.
fn next_header_agrees(window: &[u8], at: usize, header: &FrameHeader) -> bool {
    let next = at + header.frame_size();
    match window.get(next..next + HEADER_LEN) {
        None => next == window.len(),
        Some(bytes) => FrameHeader::parse(bytes)
            .map(|following| header.is_compatible(&following))
            .unwrap_or(false),
    }
}
