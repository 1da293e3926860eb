//! MAVLink frame header and validated frame container
//!
//! # Wire Format
//!
//! ```text
//! v1:  STX(0xFE) LEN SEQ SYS COMP MSGID            PAYLOAD CRC(2)
//! v2:  STX(0xFD) LEN INC CMP SEQ SYS COMP MSGID(3) PAYLOAD CRC(2) [SIGNATURE(13)]
//! ```
//!
//! All multi-byte fields are little-endian. The checksum covers every byte
//! after the sentinel plus the per-message `CRC_EXTRA` seed.

use bytes::Bytes;

use super::{
    Error, HEADER_LEN_V1, HEADER_LEN_V2, IncompatFlags, Message, MessageId, Result, STX_V1,
    STX_V2, Signature,
};

/// MAVLink wire protocol revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ProtocolVersion {
    /// 6-byte header, 8-bit message ids, no signing
    #[default]
    V1,
    /// 10-byte header, 24-bit message ids, optional signing
    V2,
}

impl ProtocolVersion {
    /// Start-of-frame sentinel for this version
    #[must_use]
    pub const fn sentinel(self) -> u8 {
        match self {
            Self::V1 => STX_V1,
            Self::V2 => STX_V2,
        }
    }

    /// Header length including the sentinel
    #[must_use]
    pub const fn header_len(self) -> usize {
        match self {
            Self::V1 => HEADER_LEN_V1,
            Self::V2 => HEADER_LEN_V2,
        }
    }

    /// Identify the version announced by a sentinel byte
    #[must_use]
    pub const fn from_sentinel(byte: u8) -> Option<Self> {
        match byte {
            STX_V1 => Some(Self::V1),
            STX_V2 => Some(Self::V2),
            _ => None,
        }
    }
}

/// Decoded frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// Wire revision
    pub version: ProtocolVersion,
    /// Payload length announced by the header
    pub payload_len: u8,
    /// v2 incompatibility flags (always empty for v1)
    pub incompat_flags: IncompatFlags,
    /// v2 compatibility flags (always zero for v1)
    pub compat_flags: u8,
    /// Per-sender sequence number
    pub sequence: u8,
    /// Sending system id
    pub system_id: u8,
    /// Sending component id
    pub component_id: u8,
    /// Message id (8 bits in v1, 24 bits in v2)
    pub message_id: u32,
}

impl FrameHeader {
    /// Header length on the wire, sentinel included
    #[must_use]
    pub const fn len(&self) -> usize {
        self.version.header_len()
    }

    /// Headers are never empty; provided for symmetry with `len`.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// Whether a signature block follows the checksum
    #[must_use]
    pub const fn is_signed(&self) -> bool {
        self.incompat_flags.is_signed()
    }

    /// Serialize into `out`, returning the number of bytes written.
    pub fn write_to(&self, out: &mut Vec<u8>) -> Result<usize> {
        match self.version {
            ProtocolVersion::V1 => {
                let id = u8::try_from(self.message_id)
                    .map_err(|_| Error::MessageIdOutOfRange { id: self.message_id })?;
                out.extend_from_slice(&[
                    STX_V1,
                    self.payload_len,
                    self.sequence,
                    self.system_id,
                    self.component_id,
                    id,
                ]);
                Ok(HEADER_LEN_V1)
            }
            ProtocolVersion::V2 => {
                if self.message_id > 0x00FF_FFFF {
                    return Err(Error::MessageIdOutOfRange { id: self.message_id });
                }
                let id = self.message_id.to_le_bytes();
                out.extend_from_slice(&[
                    STX_V2,
                    self.payload_len,
                    self.incompat_flags.as_u8(),
                    self.compat_flags,
                    self.sequence,
                    self.system_id,
                    self.component_id,
                    id[0],
                    id[1],
                    id[2],
                ]);
                Ok(HEADER_LEN_V2)
            }
        }
    }

    /// Parse a complete header (sentinel included).
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let Some(&stx) = bytes.first() else {
            return Err(Error::BufferTooSmall { needed: 1, got: 0 });
        };
        let version =
            ProtocolVersion::from_sentinel(stx).ok_or(Error::InvalidSentinel { found: stx })?;
        let needed = version.header_len();
        if bytes.len() < needed {
            return Err(Error::BufferTooSmall {
                needed,
                got: bytes.len(),
            });
        }

        match version {
            ProtocolVersion::V1 => Ok(Self {
                version,
                payload_len: bytes[1],
                incompat_flags: IncompatFlags::default(),
                compat_flags: 0,
                sequence: bytes[2],
                system_id: bytes[3],
                component_id: bytes[4],
                message_id: u32::from(bytes[5]),
            }),
            ProtocolVersion::V2 => {
                let incompat_flags = IncompatFlags::from_u8(bytes[2])
                    .ok_or(Error::UnsupportedIncompatFlags { flags: bytes[2] })?;
                Ok(Self {
                    version,
                    payload_len: bytes[1],
                    incompat_flags,
                    compat_flags: bytes[3],
                    sequence: bytes[4],
                    system_id: bytes[5],
                    component_id: bytes[6],
                    message_id: u32::from_le_bytes([bytes[7], bytes[8], bytes[9], 0]),
                })
            }
        }
    }
}

/// A complete, checksum-validated frame.
///
/// The verbatim wire bytes are retained so relays can forward exactly what
/// was received, signature included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    header: FrameHeader,
    checksum: u16,
    signature: Option<Signature>,
    raw: Bytes,
}

impl Frame {
    pub(crate) fn from_parts(
        header: FrameHeader,
        checksum: u16,
        signature: Option<Signature>,
        raw: Bytes,
    ) -> Self {
        Self {
            header,
            checksum,
            signature,
            raw,
        }
    }

    /// Get header
    #[must_use]
    pub const fn header(&self) -> &FrameHeader {
        &self.header
    }

    /// Numeric message id
    #[must_use]
    pub const fn message_id(&self) -> u32 {
        self.header.message_id
    }

    /// Checksum carried by the frame
    #[must_use]
    pub const fn checksum(&self) -> u16 {
        self.checksum
    }

    /// Signature block, if the frame was signed
    #[must_use]
    pub const fn signature(&self) -> Option<&Signature> {
        self.signature.as_ref()
    }

    /// Payload bytes exactly as received (possibly truncated by the sender)
    #[must_use]
    pub fn payload(&self) -> Bytes {
        let start = self.header.len();
        self.raw.slice(start..start + usize::from(self.header.payload_len))
    }

    /// Verbatim wire bytes
    #[must_use]
    pub const fn raw(&self) -> &Bytes {
        &self.raw
    }

    /// Interpret the payload as a typed message
    pub fn message(&self) -> Result<Message> {
        let id = MessageId::from_u32(self.header.message_id).ok_or(Error::UnknownMessage {
            id: self.header.message_id,
        })?;
        Ok(Message::unpack(id, &self.payload()))
    }
}
