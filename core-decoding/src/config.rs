//! # Decoder Configuration
//!
//! User-facing settings for a decode session.

use crate::error::{DecodingError, Result};
use serde::{Deserialize, Serialize};

/// Upper bound for a single MPEG audio frame (MPEG-2.5 Layer II, 160 kbps, 8 kHz,
/// padded) plus its header.
pub const MAX_FRAME_BYTES: usize = 2885;

/// Decoder configuration.
///
/// Controls chunk sizes for the streaming loop and how far the header parser
/// is allowed to search for a frame sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecoderConfig {
    /// Bytes read from the source per engine call.
    ///
    /// Chunks are not frame aligned; the engine buffers partial frames.
    ///
    /// Default: 4096 bytes.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Maximum number of bytes skipped while searching for the first frame
    /// sync after any leading tag.
    ///
    /// Default: 64 KiB.
    #[serde(default = "default_max_sync_scan")]
    pub max_sync_scan: usize,

    /// Whether a trailing ID3v1 tag is fenced off from the audio data.
    ///
    /// Default: true.
    #[serde(default = "default_detect_trailing_tag")]
    pub detect_trailing_tag: bool,

    /// Require the frame after a sync candidate to carry a compatible header.
    ///
    /// Disabling this accepts the first well-formed header, which is more
    /// prone to false syncs inside garbage.
    ///
    /// Default: true.
    #[serde(default = "default_validate_next_header")]
    pub validate_next_header: bool,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            max_sync_scan: default_max_sync_scan(),
            detect_trailing_tag: default_detect_trailing_tag(),
            validate_next_header: default_validate_next_header(),
        }
    }
}

impl DecoderConfig {
    /// Small chunks and a short sync window.
    pub fn low_memory() -> Self {
        Self {
            chunk_size: 1024,
            max_sync_scan: 8 * 1024,
            ..Default::default()
        }
    }

    /// Only accept a sync at the very first byte after the tag.
    pub fn strict() -> Self {
        Self {
            max_sync_scan: 0,
            ..Default::default()
        }
    }

    /// Set the chunk size.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Set the sync scan window.
    pub fn with_max_sync_scan(mut self, max_sync_scan: usize) -> Self {
        self.max_sync_scan = max_sync_scan;
        self
    }

    /// Enable or disable ID3v1 trailer detection.
    pub fn with_trailing_tag_detection(mut self, detect: bool) -> Self {
        self.detect_trailing_tag = detect;
        self
    }

    /// Enable or disable next-header validation.
    pub fn with_next_header_validation(mut self, validate: bool) -> Self {
        self.validate_next_header = validate;
        self
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(DecodingError::InvalidConfig(
                "chunk_size must be > 0".to_string(),
            ));
        }

        if self.chunk_size > 16 * 1024 * 1024 {
            return Err(DecodingError::InvalidConfig(
                "chunk_size must not exceed 16 MiB".to_string(),
            ));
        }

        Ok(())
    }

    /// Bytes the header parser reads to evaluate every sync candidate.
    pub(crate) fn sync_window(&self) -> usize {
        self.max_sync_scan + 2 * MAX_FRAME_BYTES
    }
}

// ============================================================================
// Default Functions (for serde)
// ============================================================================

fn default_chunk_size() -> usize {
    4096
}

fn default_max_sync_scan() -> usize {
    64 * 1024
}

fn default_detect_trailing_tag() -> bool {
    true
}

fn default_validate_next_header() -> bool {
    true
}
