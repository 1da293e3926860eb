//! HIL message set
//!
//! Field order follows the MAVLink wire layout (fields sorted by size, extension
//! fields last); everything is little-endian.

use bytes::{Buf, BufMut};

use super::{DistanceSensorType, LandingTargetType, MessageId, ModeFlags, SensorOrientation};

/// Typed payload of a single message id.
trait Payload: Sized {
    const ID: MessageId;

    fn pack(&self, buf: &mut Vec<u8>);

    /// `buf` always holds at least `ID.full_len()` bytes.
    fn unpack(buf: &mut &[u8]) -> Self;
}

/// `HEARTBEAT` (#0)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Heartbeat {
    /// Autopilot-specific mode
    pub custom_mode: u32,
    /// `MAV_TYPE`
    pub mav_type: u8,
    /// `MAV_AUTOPILOT`
    pub autopilot: u8,
    /// `MAV_MODE_FLAG` bitmask
    pub base_mode: ModeFlags,
    /// `MAV_STATE`
    pub system_status: u8,
    /// Protocol version byte
    pub mavlink_version: u8,
}

impl Payload for Heartbeat {
    const ID: MessageId = MessageId::Heartbeat;

    fn pack(&self, buf: &mut Vec<u8>) {
        buf.put_u32_le(self.custom_mode);
        buf.put_u8(self.mav_type);
        buf.put_u8(self.autopilot);
        buf.put_u8(self.base_mode.bits());
        buf.put_u8(self.system_status);
        buf.put_u8(self.mavlink_version);
    }

    fn unpack(buf: &mut &[u8]) -> Self {
        Self {
            custom_mode: buf.get_u32_le(),
            mav_type: buf.get_u8(),
            autopilot: buf.get_u8(),
            base_mode: ModeFlags::from_bits(buf.get_u8()),
            system_status: buf.get_u8(),
            mavlink_version: buf.get_u8(),
        }
    }
}

/// `HIL_ACTUATOR_CONTROLS` (#93)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HilActuatorControls {
    /// Timestamp (µs since boot or epoch)
    pub time_usec: u64,
    /// Flags bitmask
    pub flags: u64,
    /// Control outputs, nominally -1..1
    pub controls: [f32; 16],
    /// System mode, `MAV_MODE_FLAG` bitmask
    pub mode: ModeFlags,
}

impl Payload for HilActuatorControls {
    const ID: MessageId = MessageId::HilActuatorControls;

    fn pack(&self, buf: &mut Vec<u8>) {
        buf.put_u64_le(self.time_usec);
        buf.put_u64_le(self.flags);
        for control in self.controls {
            buf.put_f32_le(control);
        }
        buf.put_u8(self.mode.bits());
    }

    fn unpack(buf: &mut &[u8]) -> Self {
        let time_usec = buf.get_u64_le();
        let flags = buf.get_u64_le();
        let mut controls = [0.0; 16];
        for control in &mut controls {
            *control = buf.get_f32_le();
        }
        Self {
            time_usec,
            flags,
            controls,
            mode: ModeFlags::from_bits(buf.get_u8()),
        }
    }
}

/// `VISION_POSITION_ESTIMATE` (#102)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct VisionPositionEstimate {
    /// Timestamp (µs)
    pub usec: u64,
    /// Local X position (m, NED)
    pub x: f32,
    /// Local Y position (m, NED)
    pub y: f32,
    /// Local Z position (m, NED)
    pub z: f32,
    /// Roll angle (rad)
    pub roll: f32,
    /// Pitch angle (rad)
    pub pitch: f32,
    /// Yaw angle (rad)
    pub yaw: f32,
}

impl Payload for VisionPositionEstimate {
    const ID: MessageId = MessageId::VisionPositionEstimate;

    fn pack(&self, buf: &mut Vec<u8>) {
        buf.put_u64_le(self.usec);
        for value in [self.x, self.y, self.z, self.roll, self.pitch, self.yaw] {
            buf.put_f32_le(value);
        }
    }

    fn unpack(buf: &mut &[u8]) -> Self {
        Self {
            usec: buf.get_u64_le(),
            x: buf.get_f32_le(),
            y: buf.get_f32_le(),
            z: buf.get_f32_le(),
            roll: buf.get_f32_le(),
            pitch: buf.get_f32_le(),
            yaw: buf.get_f32_le(),
        }
    }
}

/// `HIL_SENSOR` (#107)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HilSensor {
    /// Timestamp (µs)
    pub time_usec: u64,
    /// Body-frame acceleration, X (m/s²)
    pub xacc: f32,
    /// Body-frame acceleration, Y (m/s²)
    pub yacc: f32,
    /// Body-frame acceleration, Z (m/s²)
    pub zacc: f32,
    /// Body-frame angular rate, X (rad/s)
    pub xgyro: f32,
    /// Body-frame angular rate, Y (rad/s)
    pub ygyro: f32,
    /// Body-frame angular rate, Z (rad/s)
    pub zgyro: f32,
    /// Magnetic field, X (gauss)
    pub xmag: f32,
    /// Magnetic field, Y (gauss)
    pub ymag: f32,
    /// Magnetic field, Z (gauss)
    pub zmag: f32,
    /// Absolute pressure (hPa)
    pub abs_pressure: f32,
    /// Differential pressure (hPa)
    pub diff_pressure: f32,
    /// Altitude computed from pressure (m)
    pub pressure_alt: f32,
    /// Temperature (°C)
    pub temperature: f32,
    /// Bitmap of fields updated since the last message
    pub fields_updated: u32,
}

impl Payload for HilSensor {
    const ID: MessageId = MessageId::HilSensor;

    fn pack(&self, buf: &mut Vec<u8>) {
        buf.put_u64_le(self.time_usec);
        for value in [
            self.xacc,
            self.yacc,
            self.zacc,
            self.xgyro,
            self.ygyro,
            self.zgyro,
            self.xmag,
            self.ymag,
            self.zmag,
            self.abs_pressure,
            self.diff_pressure,
            self.pressure_alt,
            self.temperature,
        ] {
            buf.put_f32_le(value);
        }
        buf.put_u32_le(self.fields_updated);
    }

    fn unpack(buf: &mut &[u8]) -> Self {
        Self {
            time_usec: buf.get_u64_le(),
            xacc: buf.get_f32_le(),
            yacc: buf.get_f32_le(),
            zacc: buf.get_f32_le(),
            xgyro: buf.get_f32_le(),
            ygyro: buf.get_f32_le(),
            zgyro: buf.get_f32_le(),
            xmag: buf.get_f32_le(),
            ymag: buf.get_f32_le(),
            zmag: buf.get_f32_le(),
            abs_pressure: buf.get_f32_le(),
            diff_pressure: buf.get_f32_le(),
            pressure_alt: buf.get_f32_le(),
            temperature: buf.get_f32_le(),
            fields_updated: buf.get_u32_le(),
        }
    }
}

/// `HIL_GPS` (#113)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HilGps {
    /// Timestamp (µs)
    pub time_usec: u64,
    /// Latitude (degE7)
    pub lat: i32,
    /// Longitude (degE7)
    pub lon: i32,
    /// Altitude above MSL (mm)
    pub alt: i32,
    /// Horizontal dilution of position (cm)
    pub eph: u16,
    /// Vertical dilution of position (cm)
    pub epv: u16,
    /// Ground speed (cm/s)
    pub vel: u16,
    /// Velocity north (cm/s)
    pub vn: i16,
    /// Velocity east (cm/s)
    pub ve: i16,
    /// Velocity down (cm/s)
    pub vd: i16,
    /// Course over ground, 0..35999 (cdeg)
    pub cog: u16,
    /// 0-1: no fix, 2: 2D fix, 3: 3D fix
    pub fix_type: u8,
    /// Number of satellites visible
    pub satellites_visible: u8,
}

impl Payload for HilGps {
    const ID: MessageId = MessageId::HilGps;

    fn pack(&self, buf: &mut Vec<u8>) {
        buf.put_u64_le(self.time_usec);
        buf.put_i32_le(self.lat);
        buf.put_i32_le(self.lon);
        buf.put_i32_le(self.alt);
        buf.put_u16_le(self.eph);
        buf.put_u16_le(self.epv);
        buf.put_u16_le(self.vel);
        buf.put_i16_le(self.vn);
        buf.put_i16_le(self.ve);
        buf.put_i16_le(self.vd);
        buf.put_u16_le(self.cog);
        buf.put_u8(self.fix_type);
        buf.put_u8(self.satellites_visible);
    }

    fn unpack(buf: &mut &[u8]) -> Self {
        Self {
            time_usec: buf.get_u64_le(),
            lat: buf.get_i32_le(),
            lon: buf.get_i32_le(),
            alt: buf.get_i32_le(),
            eph: buf.get_u16_le(),
            epv: buf.get_u16_le(),
            vel: buf.get_u16_le(),
            vn: buf.get_i16_le(),
            ve: buf.get_i16_le(),
            vd: buf.get_i16_le(),
            cog: buf.get_u16_le(),
            fix_type: buf.get_u8(),
            satellites_visible: buf.get_u8(),
        }
    }
}

/// `HIL_OPTICAL_FLOW` (#114)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HilOpticalFlow {
    /// Timestamp (µs)
    pub time_usec: u64,
    /// Integration time (µs)
    pub integration_time_us: u32,
    /// Flow around the sensor X axis (rad)
    pub integrated_x: f32,
    /// Flow around the sensor Y axis (rad)
    pub integrated_y: f32,
    /// Gyro integral around X (rad)
    pub integrated_xgyro: f32,
    /// Gyro integral around Y (rad)
    pub integrated_ygyro: f32,
    /// Gyro integral around Z (rad)
    pub integrated_zgyro: f32,
    /// Time since the distance was sampled (µs)
    pub time_delta_distance_us: u32,
    /// Distance to the center of the flow field (m)
    pub distance: f32,
    /// Temperature (cdegC)
    pub temperature: i16,
    /// Sensor id
    pub sensor_id: u8,
    /// Optical flow quality, 0 = bad, 255 = maximum
    pub quality: u8,
}

impl Payload for HilOpticalFlow {
    const ID: MessageId = MessageId::HilOpticalFlow;

    fn pack(&self, buf: &mut Vec<u8>) {
        buf.put_u64_le(self.time_usec);
        buf.put_u32_le(self.integration_time_us);
        buf.put_f32_le(self.integrated_x);
        buf.put_f32_le(self.integrated_y);
        buf.put_f32_le(self.integrated_xgyro);
        buf.put_f32_le(self.integrated_ygyro);
        buf.put_f32_le(self.integrated_zgyro);
        buf.put_u32_le(self.time_delta_distance_us);
        buf.put_f32_le(self.distance);
        buf.put_i16_le(self.temperature);
        buf.put_u8(self.sensor_id);
        buf.put_u8(self.quality);
    }

    fn unpack(buf: &mut &[u8]) -> Self {
        Self {
            time_usec: buf.get_u64_le(),
            integration_time_us: buf.get_u32_le(),
            integrated_x: buf.get_f32_le(),
            integrated_y: buf.get_f32_le(),
            integrated_xgyro: buf.get_f32_le(),
            integrated_ygyro: buf.get_f32_le(),
            integrated_zgyro: buf.get_f32_le(),
            time_delta_distance_us: buf.get_u32_le(),
            distance: buf.get_f32_le(),
            temperature: buf.get_i16_le(),
            sensor_id: buf.get_u8(),
            quality: buf.get_u8(),
        }
    }
}

/// `HIL_STATE_QUATERNION` (#115)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HilStateQuaternion {
    /// Timestamp (µs)
    pub time_usec: u64,
    /// Vehicle attitude, NED to FRD body, `[w, x, y, z]`
    pub attitude_quaternion: [f32; 4],
    /// Body roll rate (rad/s)
    pub rollspeed: f32,
    /// Body pitch rate (rad/s)
    pub pitchspeed: f32,
    /// Body yaw rate (rad/s)
    pub yawspeed: f32,
    /// Latitude (degE7)
    pub lat: i32,
    /// Longitude (degE7)
    pub lon: i32,
    /// Altitude (mm)
    pub alt: i32,
    /// Ground X speed, north (cm/s)
    pub vx: i16,
    /// Ground Y speed, east (cm/s)
    pub vy: i16,
    /// Ground Z speed, down (cm/s)
    pub vz: i16,
    /// Indicated airspeed (cm/s)
    pub ind_airspeed: u16,
    /// True airspeed (cm/s)
    pub true_airspeed: u16,
    /// Body X acceleration (mG)
    pub xacc: i16,
    /// Body Y acceleration (mG)
    pub yacc: i16,
    /// Body Z acceleration (mG)
    pub zacc: i16,
}

impl Payload for HilStateQuaternion {
    const ID: MessageId = MessageId::HilStateQuaternion;

    fn pack(&self, buf: &mut Vec<u8>) {
        buf.put_u64_le(self.time_usec);
        for value in self.attitude_quaternion {
            buf.put_f32_le(value);
        }
        buf.put_f32_le(self.rollspeed);
        buf.put_f32_le(self.pitchspeed);
        buf.put_f32_le(self.yawspeed);
        buf.put_i32_le(self.lat);
        buf.put_i32_le(self.lon);
        buf.put_i32_le(self.alt);
        buf.put_i16_le(self.vx);
        buf.put_i16_le(self.vy);
        buf.put_i16_le(self.vz);
        buf.put_u16_le(self.ind_airspeed);
        buf.put_u16_le(self.true_airspeed);
        buf.put_i16_le(self.xacc);
        buf.put_i16_le(self.yacc);
        buf.put_i16_le(self.zacc);
    }

    fn unpack(buf: &mut &[u8]) -> Self {
        let time_usec = buf.get_u64_le();
        let mut attitude_quaternion = [0.0; 4];
        for value in &mut attitude_quaternion {
            *value = buf.get_f32_le();
        }
        Self {
            time_usec,
            attitude_quaternion,
            rollspeed: buf.get_f32_le(),
            pitchspeed: buf.get_f32_le(),
            yawspeed: buf.get_f32_le(),
            lat: buf.get_i32_le(),
            lon: buf.get_i32_le(),
            alt: buf.get_i32_le(),
            vx: buf.get_i16_le(),
            vy: buf.get_i16_le(),
            vz: buf.get_i16_le(),
            ind_airspeed: buf.get_u16_le(),
            true_airspeed: buf.get_u16_le(),
            xacc: buf.get_i16_le(),
            yacc: buf.get_i16_le(),
            zacc: buf.get_i16_le(),
        }
    }
}

/// `DISTANCE_SENSOR` (#132)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DistanceSensor {
    /// Timestamp (ms since boot)
    pub time_boot_ms: u32,
    /// Minimum measurable distance (cm)
    pub min_distance: u16,
    /// Maximum measurable distance (cm)
    pub max_distance: u16,
    /// Current reading (cm)
    pub current_distance: u16,
    /// Sensor technology
    pub sensor_type: DistanceSensorType,
    /// Onboard sensor id
    pub id: u8,
    /// Mounting orientation
    pub orientation: SensorOrientation,
    /// Measurement variance (cm²), 0 if unknown
    pub covariance: u8,
}

impl Payload for DistanceSensor {
    const ID: MessageId = MessageId::DistanceSensor;

    fn pack(&self, buf: &mut Vec<u8>) {
        buf.put_u32_le(self.time_boot_ms);
        buf.put_u16_le(self.min_distance);
        buf.put_u16_le(self.max_distance);
        buf.put_u16_le(self.current_distance);
        buf.put_u8(self.sensor_type as u8);
        buf.put_u8(self.id);
        buf.put_u8(self.orientation.as_u8());
        buf.put_u8(self.covariance);
    }

    fn unpack(buf: &mut &[u8]) -> Self {
        Self {
            time_boot_ms: buf.get_u32_le(),
            min_distance: buf.get_u16_le(),
            max_distance: buf.get_u16_le(),
            current_distance: buf.get_u16_le(),
            sensor_type: DistanceSensorType::from_u8(buf.get_u8()),
            id: buf.get_u8(),
            orientation: SensorOrientation::from_u8(buf.get_u8()),
            covariance: buf.get_u8(),
        }
    }
}

/// `LANDING_TARGET` (#149), including the position extension fields.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LandingTarget {
    /// Timestamp (µs)
    pub time_usec: u64,
    /// X-axis angular offset of the target from the image center (rad)
    pub angle_x: f32,
    /// Y-axis angular offset of the target from the image center (rad)
    pub angle_y: f32,
    /// Distance to the target (m)
    pub distance: f32,
    /// Target size along X (rad)
    pub size_x: f32,
    /// Target size along Y (rad)
    pub size_y: f32,
    /// Target id
    pub target_num: u8,
    /// `MAV_FRAME` of the position fields
    pub frame: u8,
    /// Target X position (m)
    pub x: f32,
    /// Target Y position (m)
    pub y: f32,
    /// Target Z position (m)
    pub z: f32,
    /// Target orientation `[w, x, y, z]`
    pub q: [f32; 4],
    /// How the target is signalled; `None` if the sender used an unknown value
    pub target_type: Option<LandingTargetType>,
    /// Whether `x`, `y`, `z` and `q` are valid
    pub position_valid: bool,
}

impl Payload for LandingTarget {
    const ID: MessageId = MessageId::LandingTarget;

    fn pack(&self, buf: &mut Vec<u8>) {
        buf.put_u64_le(self.time_usec);
        buf.put_f32_le(self.angle_x);
        buf.put_f32_le(self.angle_y);
        buf.put_f32_le(self.distance);
        buf.put_f32_le(self.size_x);
        buf.put_f32_le(self.size_y);
        buf.put_u8(self.target_num);
        buf.put_u8(self.frame);
        buf.put_f32_le(self.x);
        buf.put_f32_le(self.y);
        buf.put_f32_le(self.z);
        for value in self.q {
            buf.put_f32_le(value);
        }
        buf.put_u8(self.target_type.map_or(u8::MAX, |kind| kind as u8));
        buf.put_u8(u8::from(self.position_valid));
    }

    fn unpack(buf: &mut &[u8]) -> Self {
        let time_usec = buf.get_u64_le();
        let angle_x = buf.get_f32_le();
        let angle_y = buf.get_f32_le();
        let distance = buf.get_f32_le();
        let size_x = buf.get_f32_le();
        let size_y = buf.get_f32_le();
        let target_num = buf.get_u8();
        let frame = buf.get_u8();
        let x = buf.get_f32_le();
        let y = buf.get_f32_le();
        let z = buf.get_f32_le();
        let mut q = [0.0; 4];
        for value in &mut q {
            *value = buf.get_f32_le();
        }
        Self {
            time_usec,
            angle_x,
            angle_y,
            distance,
            size_x,
            size_y,
            target_num,
            frame,
            x,
            y,
            z,
            q,
            target_type: LandingTargetType::from_u8(buf.get_u8()),
            position_valid: buf.get_u8() != 0,
        }
    }
}

/// A decoded HIL-subset message.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Message {
    /// `HEARTBEAT`
    Heartbeat(Heartbeat),
    /// `HIL_ACTUATOR_CONTROLS`
    HilActuatorControls(HilActuatorControls),
    /// `VISION_POSITION_ESTIMATE`
    VisionPositionEstimate(VisionPositionEstimate),
    /// `HIL_SENSOR`
    HilSensor(HilSensor),
    /// `HIL_GPS`
    HilGps(HilGps),
    /// `HIL_OPTICAL_FLOW`
    HilOpticalFlow(HilOpticalFlow),
    /// `HIL_STATE_QUATERNION`
    HilStateQuaternion(HilStateQuaternion),
    /// `DISTANCE_SENSOR`
    DistanceSensor(DistanceSensor),
    /// `LANDING_TARGET`
    LandingTarget(LandingTarget),
}

impl Message {
    /// Message id of this payload
    #[must_use]
    pub const fn id(&self) -> MessageId {
        match self {
            Self::Heartbeat(_) => Heartbeat::ID,
            Self::HilActuatorControls(_) => HilActuatorControls::ID,
            Self::VisionPositionEstimate(_) => VisionPositionEstimate::ID,
            Self::HilSensor(_) => HilSensor::ID,
            Self::HilGps(_) => HilGps::ID,
            Self::HilOpticalFlow(_) => HilOpticalFlow::ID,
            Self::HilStateQuaternion(_) => HilStateQuaternion::ID,
            Self::DistanceSensor(_) => DistanceSensor::ID,
            Self::LandingTarget(_) => LandingTarget::ID,
        }
    }

    /// Pack the full field set (base plus packed extensions).
    #[must_use]
    pub fn pack(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.id().full_len());
        match self {
            Self::Heartbeat(msg) => msg.pack(&mut buf),
            Self::HilActuatorControls(msg) => msg.pack(&mut buf),
            Self::VisionPositionEstimate(msg) => msg.pack(&mut buf),
            Self::HilSensor(msg) => msg.pack(&mut buf),
            Self::HilGps(msg) => msg.pack(&mut buf),
            Self::HilOpticalFlow(msg) => msg.pack(&mut buf),
            Self::HilStateQuaternion(msg) => msg.pack(&mut buf),
            Self::DistanceSensor(msg) => msg.pack(&mut buf),
            Self::LandingTarget(msg) => msg.pack(&mut buf),
        }
        debug_assert_eq!(buf.len(), self.id().full_len());
        buf
    }

    /// Unpack a payload. Short payloads are zero-extended, as v2 senders
    /// strip trailing zeros and v1 senders omit extensions.
    #[must_use]
    pub fn unpack(id: MessageId, payload: &[u8]) -> Self {
        let mut padded = [0u8; super::MAX_PAYLOAD_LEN];
        let len = payload.len().min(padded.len());
        padded[..len].copy_from_slice(&payload[..len]);
        let buf = &mut &padded[..];
        match id {
            MessageId::Heartbeat => Self::Heartbeat(Heartbeat::unpack(buf)),
            MessageId::HilActuatorControls => {
                Self::HilActuatorControls(HilActuatorControls::unpack(buf))
            }
            MessageId::VisionPositionEstimate => {
                Self::VisionPositionEstimate(VisionPositionEstimate::unpack(buf))
            }
            MessageId::HilSensor => Self::HilSensor(HilSensor::unpack(buf)),
            MessageId::HilGps => Self::HilGps(HilGps::unpack(buf)),
            MessageId::HilOpticalFlow => Self::HilOpticalFlow(HilOpticalFlow::unpack(buf)),
            MessageId::HilStateQuaternion => {
                Self::HilStateQuaternion(HilStateQuaternion::unpack(buf))
            }
            MessageId::DistanceSensor => Self::DistanceSensor(DistanceSensor::unpack(buf)),
            MessageId::LandingTarget => Self::LandingTarget(LandingTarget::unpack(buf)),
        }
    }
}

macro_rules! impl_from_payload {
    ($($ty:ident),* $(,)?) => {
        $(
            impl From<$ty> for Message {
                fn from(msg: $ty) -> Self {
                    Self::$ty(msg)
                }
            }
        )*
    };
}

impl_from_payload!(
    Heartbeat,
    HilActuatorControls,
    VisionPositionEstimate,
    HilSensor,
    HilGps,
    HilOpticalFlow,
    HilStateQuaternion,
    DistanceSensor,
    LandingTarget,
);
