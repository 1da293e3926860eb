//! Simulation samples and their translation into HIL messages
//!
//! Samples are expressed in the simulation's conventions (ENU world, FLU
//! body, SI units). [`SensorTranslator`] converts them into the autopilot's
//! conventions (NED world, FRD body, MAVLink units).

pub mod atmosphere;
pub mod frames;
pub mod magnetic;
mod noise;
mod translator;

use nalgebra::{UnitQuaternion, Vector3};

pub use magnetic::{DeclinationModel, DipoleDeclination, FixedDeclination};
pub use noise::NoiseGenerator;
pub use translator::SensorTranslator;

/// Standard gravity (m/s²)
pub const STANDARD_GRAVITY: f64 = 9.806_65;

/// IMU reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImuSample {
    /// Body attitude, ENU world to FLU body
    pub orientation: UnitQuaternion<f64>,
    /// Specific force, FLU (m/s²)
    pub linear_acceleration: Vector3<f64>,
    /// Angular rate, FLU (rad/s)
    pub angular_velocity: Vector3<f64>,
}

impl Default for ImuSample {
    fn default() -> Self {
        Self {
            orientation: UnitQuaternion::identity(),
            linear_acceleration: Vector3::new(0.0, 0.0, STANDARD_GRAVITY),
            angular_velocity: Vector3::zeros(),
        }
    }
}

/// Rigid-body state of the vehicle model at the time of an IMU sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelState {
    /// Position, ENU world (m)
    pub position: Vector3<f64>,
    /// Linear velocity, ENU world (m/s)
    pub world_linear_velocity: Vector3<f64>,
    /// Linear velocity, FLU body (m/s)
    pub body_linear_velocity: Vector3<f64>,
    /// Angular velocity, FLU body (rad/s)
    pub body_angular_velocity: Vector3<f64>,
    /// True linear acceleration, FLU body (m/s²)
    pub body_linear_acceleration: Vector3<f64>,
    /// Gravity magnitude of the world (m/s²)
    pub gravity: f64,
}

impl Default for ModelState {
    fn default() -> Self {
        Self {
            position: Vector3::zeros(),
            world_linear_velocity: Vector3::zeros(),
            body_linear_velocity: Vector3::zeros(),
            body_angular_velocity: Vector3::zeros(),
            body_linear_acceleration: Vector3::zeros(),
            gravity: STANDARD_GRAVITY,
        }
    }
}

/// GNSS fix.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GpsSample {
    /// Sample time (s)
    pub time: f64,
    /// Latitude (deg)
    pub latitude_deg: f64,
    /// Longitude (deg)
    pub longitude_deg: f64,
    /// Altitude above MSL (m)
    pub altitude: f64,
    /// Horizontal position accuracy (m)
    pub eph: f64,
    /// Vertical position accuracy (m)
    pub epv: f64,
    /// Ground speed (m/s)
    pub velocity: f64,
    /// Velocity north (m/s)
    pub velocity_north: f64,
    /// Velocity east (m/s)
    pub velocity_east: f64,
    /// Velocity up (m/s)
    pub velocity_up: f64,
}

/// Downward lidar reading.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LidarSample {
    /// Sensor timestamp (ms)
    pub time_msec: u32,
    /// Minimum range (m)
    pub min_distance: f64,
    /// Maximum range (m)
    pub max_distance: f64,
    /// Measured range (m)
    pub current_distance: f64,
}

/// Forward sonar reading.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SonarSample {
    /// Minimum range (m)
    pub min_distance: f64,
    /// Maximum range (m)
    pub max_distance: f64,
    /// Measured range (m)
    pub current_distance: f64,
}

/// Optical-flow integration window.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct OpticalFlowSample {
    /// Sensor id
    pub sensor_id: u8,
    /// Integration time (µs)
    pub integration_time_us: u32,
    /// Flow about the sensor X axis (rad)
    pub integrated_x: f32,
    /// Flow about the sensor Y axis (rad)
    pub integrated_y: f32,
    /// Sensor temperature (cdegC)
    pub temperature: i16,
    /// Flow quality, 0 = invalid
    pub quality: u8,
    /// Time since the last distance reading (µs)
    pub time_delta_distance_us: u32,
}

/// IR-LOCK beacon observation.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct IrLockSample {
    /// Beacon signature
    pub signature: u8,
    /// Angular X offset from the image center (rad)
    pub pos_x: f32,
    /// Angular Y offset from the image center (rad)
    pub pos_y: f32,
    /// Angular size along X (rad)
    pub size_x: f32,
    /// Angular size along Y (rad)
    pub size_y: f32,
}

/// Exact geodetic position of the vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GroundTruthSample {
    /// Latitude (rad)
    pub latitude_rad: f64,
    /// Longitude (rad)
    pub longitude_rad: f64,
    /// Altitude above MSL (m)
    pub altitude: f64,
}

/// External pose estimate, ENU world / FLU body.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct OdometrySample {
    /// Timestamp (µs)
    pub usec: u64,
    /// East (m)
    pub x: f64,
    /// North (m)
    pub y: f64,
    /// Up (m)
    pub z: f64,
    /// Roll (rad)
    pub roll: f64,
    /// Pitch (rad)
    pub pitch: f64,
    /// Yaw (rad)
    pub yaw: f64,
}
