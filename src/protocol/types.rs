//! Message ids, flag words and enumerations of the HIL message set

use std::fmt;

/// Message ids understood by the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum MessageId {
    /// Keep-alive / vehicle identification
    Heartbeat = 0,
    /// Actuator outputs computed by the flight controller
    HilActuatorControls = 93,
    /// External pose estimate
    VisionPositionEstimate = 102,
    /// Raw IMU, magnetometer and barometer sample
    HilSensor = 107,
    /// Simulated GNSS fix
    HilGps = 113,
    /// Simulated optical-flow integration
    HilOpticalFlow = 114,
    /// Ground-truth vehicle state
    HilStateQuaternion = 115,
    /// Rangefinder reading
    DistanceSensor = 132,
    /// Precision-landing target observation
    LandingTarget = 149,
}

impl MessageId {
    /// All supported ids, in ascending numeric order.
    pub const ALL: [Self; 9] = [
        Self::Heartbeat,
        Self::HilActuatorControls,
        Self::VisionPositionEstimate,
        Self::HilSensor,
        Self::HilGps,
        Self::HilOpticalFlow,
        Self::HilStateQuaternion,
        Self::DistanceSensor,
        Self::LandingTarget,
    ];

    /// Convert from the numeric wire id
    #[must_use]
    pub fn from_u32(value: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|id| id.as_u32() == value)
    }

    /// Convert to the numeric wire id
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self as u32
    }

    /// Seed byte folded into the checksum, derived from the message definition.
    #[must_use]
    pub const fn crc_extra(self) -> u8 {
        match self {
            Self::Heartbeat => 50,
            Self::HilActuatorControls => 47,
            Self::VisionPositionEstimate => 158,
            Self::HilSensor => 108,
            Self::HilGps => 124,
            Self::HilOpticalFlow => 237,
            Self::HilStateQuaternion => 4,
            Self::DistanceSensor => 85,
            Self::LandingTarget => 200,
        }
    }

    /// Payload length of the base (v1) field set.
    #[must_use]
    pub const fn base_len(self) -> usize {
        match self {
            Self::Heartbeat => 9,
            Self::HilActuatorControls => 81,
            Self::VisionPositionEstimate => 32,
            Self::HilSensor => 64,
            Self::HilGps => 36,
            Self::HilOpticalFlow => 44,
            Self::HilStateQuaternion => 64,
            Self::DistanceSensor => 14,
            Self::LandingTarget => 30,
        }
    }

    /// Payload length including the extension fields this crate packs.
    #[must_use]
    pub const fn full_len(self) -> usize {
        match self {
            // x, y, z, q[4], type, position_valid
            Self::LandingTarget => 60,
            other => other.base_len(),
        }
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Heartbeat => "HEARTBEAT",
            Self::HilActuatorControls => "HIL_ACTUATOR_CONTROLS",
            Self::VisionPositionEstimate => "VISION_POSITION_ESTIMATE",
            Self::HilSensor => "HIL_SENSOR",
            Self::HilGps => "HIL_GPS",
            Self::HilOpticalFlow => "HIL_OPTICAL_FLOW",
            Self::HilStateQuaternion => "HIL_STATE_QUATERNION",
            Self::DistanceSensor => "DISTANCE_SENSOR",
            Self::LandingTarget => "LANDING_TARGET",
        };
        write!(f, "{name}")
    }
}

/// `MAV_MODE_FLAG` bitmask carried by heartbeats and actuator controls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModeFlags(u8);

impl ModeFlags {
    /// Motors are enabled / running
    pub const SAFETY_ARMED: u8 = 1 << 7;
    /// Manual input is enabled
    pub const MANUAL_INPUT_ENABLED: u8 = 1 << 6;
    /// Hardware-in-the-loop simulation is active
    pub const HIL_ENABLED: u8 = 1 << 5;
    /// Stabilized mode
    pub const STABILIZE_ENABLED: u8 = 1 << 4;
    /// Guided mode
    pub const GUIDED_ENABLED: u8 = 1 << 3;
    /// Autonomous mode
    pub const AUTO_ENABLED: u8 = 1 << 2;
    /// Test mode
    pub const TEST_ENABLED: u8 = 1 << 1;
    /// Custom mode bits are valid
    pub const CUSTOM_MODE_ENABLED: u8 = 1 << 0;

    /// Create from byte
    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    /// Convert to byte
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Set a flag
    #[must_use]
    pub const fn with(mut self, flag: u8) -> Self {
        self.0 |= flag;
        self
    }

    /// Check if flag is set
    #[must_use]
    pub const fn has(self, flag: u8) -> bool {
        (self.0 & flag) != 0
    }

    /// Check whether the armed bit is set
    #[must_use]
    pub const fn is_armed(self) -> bool {
        self.has(Self::SAFETY_ARMED)
    }
}

/// v2 incompatibility flags. Any bit not listed here aborts parsing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IncompatFlags(u8);

impl IncompatFlags {
    /// Frame carries a 13-byte signature block
    pub const SIGNED: u8 = 0x01;
    /// Bits this parser understands
    pub const SUPPORTED_MASK: u8 = Self::SIGNED;

    /// Create from byte, rejecting unknown bits
    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        if value & !Self::SUPPORTED_MASK == 0 {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Convert to byte
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self.0
    }

    /// Check whether the signed bit is set
    #[must_use]
    pub const fn is_signed(self) -> bool {
        (self.0 & Self::SIGNED) != 0
    }

    /// Flag set with the signed bit raised
    #[must_use]
    pub const fn signed() -> Self {
        Self(Self::SIGNED)
    }
}

/// `MAV_DISTANCE_SENSOR`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DistanceSensorType {
    /// Laser rangefinder (lidar)
    Laser = 0,
    /// Ultrasound rangefinder (sonar)
    Ultrasound = 1,
    /// Infrared rangefinder
    Infrared = 2,
    /// Radar
    Radar = 3,
    /// Unknown sensor type
    Unknown = 4,
}

impl DistanceSensorType {
    /// Convert from byte, mapping unrecognised values to `Unknown`
    #[must_use]
    pub const fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Laser,
            1 => Self::Ultrasound,
            2 => Self::Infrared,
            3 => Self::Radar,
            _ => Self::Unknown,
        }
    }
}

/// Subset of `MAV_SENSOR_ORIENTATION` used by the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorOrientation(u8);

impl SensorOrientation {
    /// Facing along body forward
    pub const FORWARD: Self = Self(0);
    /// Pitched 270 degrees, facing down
    pub const DOWNWARD: Self = Self(25);

    /// Create from byte
    #[must_use]
    pub const fn from_u8(value: u8) -> Self {
        Self(value)
    }

    /// Convert to byte
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self.0
    }
}

/// `LANDING_TARGET_TYPE`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum LandingTargetType {
    /// Landing target signaled by light beacon (ex: IR-LOCK)
    LightBeacon = 0,
    /// Landing target signaled by radio beacon
    RadioBeacon = 1,
    /// Landing target represented by a fiducial marker
    VisionFiducial = 2,
    /// Landing target represented by a pre-defined visual shape
    VisionOther = 3,
}

impl LandingTargetType {
    /// Convert from byte
    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::LightBeacon),
            1 => Some(Self::RadioBeacon),
            2 => Some(Self::VisionFiducial),
            3 => Some(Self::VisionOther),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_id_roundtrip() {
        for id in MessageId::ALL {
            assert_eq!(MessageId::from_u32(id.as_u32()), Some(id));
        }
        assert_eq!(MessageId::from_u32(1), None);
    }

    #[test]
    fn armed_bit() {
        assert!(ModeFlags::from_bits(0b1000_0001).is_armed());
        assert!(!ModeFlags::from_bits(0b0111_1111).is_armed());
        assert!(ModeFlags::default().with(ModeFlags::SAFETY_ARMED).is_armed());
    }

    #[test]
    fn incompat_rejects_unknown_bits() {
        assert!(IncompatFlags::from_u8(0x01).unwrap().is_signed());
        assert!(IncompatFlags::from_u8(0x02).is_none());
    }
}
