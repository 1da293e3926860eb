//! Protocol error types

use thiserror::Error;

/// Errors raised while interpreting MAVLink frames.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Message id has no entry in the message table
    #[error("unknown message id: {id}")]
    UnknownMessage {
        /// Message id announced by the frame
        id: u32,
    },

    /// Checksum mismatch
    #[error("checksum mismatch: expected {expected:#06x}, got {found:#06x}")]
    ChecksumMismatch {
        /// Checksum computed over the received bytes
        expected: u16,
        /// Checksum carried by the frame
        found: u16,
    },

    /// Signature did not verify against the configured key
    #[error("signature mismatch on link {link_id}")]
    SignatureMismatch {
        /// Link id carried in the signature block
        link_id: u8,
    },

    /// Frame announced incompatibility flags this parser does not understand
    #[error("unsupported incompat flags: {flags:#04x}")]
    UnsupportedIncompatFlags {
        /// Raw incompat flag byte
        flags: u8,
    },

    /// Invalid start-of-frame sentinel
    #[error("invalid frame sentinel: {found:#04x}")]
    InvalidSentinel {
        /// Byte found where a sentinel was expected
        found: u8,
    },

    /// Buffer too small
    #[error("buffer too small: need {needed} bytes, got {got}")]
    BufferTooSmall {
        /// Needed size
        needed: usize,
        /// Actual size
        got: usize,
    },

    /// v1 frame shorter than the base field set of its message
    #[error("truncated payload for message {id}: {len} bytes (min {min})")]
    TruncatedPayload {
        /// Message id announced by the frame
        id: u32,
        /// Payload length announced by the frame
        len: u8,
        /// Base payload length of the message
        min: u8,
    },

    /// Message id cannot be carried by a v1 frame
    #[error("message id {id} does not fit in a v1 frame")]
    MessageIdOutOfRange {
        /// Message id that overflowed
        id: u32,
    },
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
