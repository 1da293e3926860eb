//! MAVLink HIL protocol core
//!
//! This module provides the wire framing, the HIL message set, and the
//! incremental frame parser used on both the datagram and serial links.

mod codec;
mod crc;
mod dialect;
mod error;
mod header;
mod message;
pub(crate) mod metrics;
mod signing;
mod types;

#[cfg(test)]
pub(crate) use dialect::encode_raw;
pub use codec::{FrameEncoder, FrameParser, Framing, encode_frame};
pub use crc::{X25_INIT, crc_accumulate, x25_checksum};
pub use error::{Error, Result};
pub use header::{Frame, FrameHeader, ProtocolVersion};
pub use message::{
    DistanceSensor, Heartbeat, HilActuatorControls, HilGps, HilOpticalFlow, HilSensor,
    HilStateQuaternion, LandingTarget, Message, VisionPositionEstimate,
};
pub use metrics::{LinkStatsSnapshot, ParserStats};
pub use signing::{SIGNATURE_BLOCK_LEN, Signature, SigningKey};
pub use types::{
    DistanceSensorType, IncompatFlags, LandingTargetType, MessageId, ModeFlags, SensorOrientation,
};

/// Start-of-frame sentinel for MAVLink v1 frames.
pub const STX_V1: u8 = 0xFE;

/// Start-of-frame sentinel for MAVLink v2 frames.
pub const STX_V2: u8 = 0xFD;

/// Header length of a v1 frame, sentinel included.
pub const HEADER_LEN_V1: usize = 6;

/// Header length of a v2 frame, sentinel included.
pub const HEADER_LEN_V2: usize = 10;

/// Checksum trailer length.
pub const CHECKSUM_LEN: usize = 2;

/// Largest payload a frame can announce.
pub const MAX_PAYLOAD_LEN: usize = 255;

/// Largest possible frame on the wire (v2, signed, full payload).
pub const MAX_FRAME_LEN: usize = HEADER_LEN_V2 + MAX_PAYLOAD_LEN + CHECKSUM_LEN + SIGNATURE_BLOCK_LEN;

/// System id used for frames produced by the bridge.
pub const DEFAULT_SYSTEM_ID: u8 = 1;

/// Component id used for frames produced by the bridge.
pub const DEFAULT_COMPONENT_ID: u8 = 200;
