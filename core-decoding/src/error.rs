//! # Decoding Error Types
//!
//! Error types for tag skipping, header parsing and frame decoding.

use thiserror::Error;

/// Errors that can occur while opening or decoding an MP3 stream.
#[derive(Error, Debug)]
pub enum DecodingError {
    // ========================================================================
    // Construction Errors
    // ========================================================================
    /// No valid MPEG frame header was found, or the header is unusable.
    ///
    /// Raised while the [`Decoder`](crate::Decoder) is being constructed.
    #[error("Header parse error: {0}")]
    HeaderParse(String),

    /// Decoder configuration values are out of range.
    #[error("Invalid decoder configuration: {0}")]
    InvalidConfig(String),

    /// The decode engine could not be created or primed.
    #[error("Decode engine error: {0}")]
    Engine(String),

    // ========================================================================
    // Streaming Errors
    // ========================================================================
    /// The engine reported an unrecoverable fault mid-stream.
    #[error("Decode error at {}: {message}", describe_offset(.offset))]
    Decode {
        /// Absolute byte offset of the failing frame, if known
        offset: Option<u64>,
        /// Engine-provided description
        message: String,
    },

    /// Frames were already streamed from this decoder.
    #[error("Decoded frames were already consumed; open a new decoder to decode again")]
    StreamConsumed,

    // ========================================================================
    // Generic Errors
    // ========================================================================
    /// I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DecodingError {
    /// Build a [`DecodingError::Decode`].
    pub fn decode(offset: Option<u64>, message: impl Into<String>) -> Self {
        DecodingError::Decode {
            offset,
            message: message.into(),
        }
    }

    /// Returns `true` if the stream header could not be parsed.
    pub fn is_header_error(&self) -> bool {
        matches!(self, DecodingError::HeaderParse(_))
    }

    /// Returns `true` if the engine failed while streaming frames.
    pub fn is_decode_error(&self) -> bool {
        matches!(self, DecodingError::Decode { .. })
    }

    /// Byte offset attached to a decode error.
    pub fn offset(&self) -> Option<u64> {
        match self {
            DecodingError::Decode { offset, .. } => *offset,
            _ => None,
        }
    }
}

fn describe_offset(offset: &Option<u64>) -> String {
    match offset {
        Some(offset) => format!("byte {}", offset),
        None => "unknown offset".to_string(),
    }
}

/// Result type for decoding operations.
pub type Result<T> = std::result::Result<T, DecodingError>;
