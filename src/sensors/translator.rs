use std::f64::consts::TAU;

use nalgebra::Vector3;
use tracing::trace;

use super::atmosphere::Atmosphere;
use super::frames::{attitude_ned_frd, enu_to_ned, flu_to_frd};
use super::magnetic::field_ned;
use super::{
    DeclinationModel, DipoleDeclination, GpsSample, GroundTruthSample, ImuSample, IrLockSample,
    LidarSample, ModelState, NoiseGenerator, OdometrySample, OpticalFlowSample, STANDARD_GRAVITY,
    SonarSample,
};
use crate::config::SensorConfig;
use crate::protocol::{
    DistanceSensor, DistanceSensorType, HilGps, HilOpticalFlow, HilSensor, HilStateQuaternion,
    LandingTarget, LandingTargetType, Message, SensorOrientation, VisionPositionEstimate,
};

/// Every `HIL_SENSOR` field carries fresh data.
const FIELDS_UPDATED_ALL: u32 = 4095;

/// Minimum sample spacing before the flow gyro integral accumulates (µs).
const GYRO_INTEGRATION_MIN_DT_US: u64 = 1000;

const GPS_FIX_3D: u8 = 3;
const GPS_SATELLITES: u8 = 10;

/// Converts simulation samples into outbound HIL messages.
///
/// Holds the small amount of state the conversions need: IMU rate limiting,
/// the optical-flow gyro integral, the latest lidar range, and the cached
/// ground-truth position.
#[derive(Debug)]
pub struct SensorTranslator<D = DipoleDeclination> {
    config: SensorConfig,
    imu_interval: f64,
    declination: D,
    noise: NoiseGenerator,
    last_imu_time: Option<f64>,
    last_gyro_time_us: Option<u64>,
    flow_gyro: Vector3<f64>,
    flow_distance: f64,
    ground_truth: GroundTruthSample,
}

impl SensorTranslator {
    /// Translator using the dipole declination model.
    #[must_use]
    pub fn new(config: SensorConfig) -> Self {
        Self::with_declination(config, DipoleDeclination::default())
    }
}

impl<D: DeclinationModel> SensorTranslator<D> {
    /// Translator using a custom declination model.
    #[must_use]
    pub fn with_declination(config: SensorConfig, declination: D) -> Self {
        Self {
            imu_interval: config.imu_interval(),
            noise: NoiseGenerator::new(config.noise_seed),
            config,
            declination,
            last_imu_time: None,
            last_gyro_time_us: None,
            flow_gyro: Vector3::zeros(),
            flow_distance: 0.0,
            ground_truth: GroundTruthSample::default(),
        }
    }

    /// Active configuration
    #[must_use]
    pub const fn config(&self) -> &SensorConfig {
        &self.config
    }

    /// Gyro integral accumulated since the last optical-flow message (FRD, rad)
    #[must_use]
    pub const fn flow_gyro_integral(&self) -> Vector3<f64> {
        self.flow_gyro
    }

    fn sends_raw_sensors(&self) -> bool {
        !self.config.hil_mode || !self.config.hil_state_level
    }

    fn sends_state(&self) -> bool {
        !self.config.hil_mode || self.config.hil_state_level
    }

    /// IMU sample: a rate-limited `HIL_SENSOR` plus an `HIL_STATE_QUATERNION`
    /// on every call, subject to the HIL level flags.
    pub fn on_imu(&mut self, sim_time: f64, imu: &ImuSample, model: &ModelState) -> Vec<Message> {
        let q_nb = attitude_ned_frd(&imu.orientation);
        let vel_b = flu_to_frd(&model.body_linear_velocity);
        let mut out = Vec::with_capacity(2);

        let due = self
            .last_imu_time
            .is_none_or(|last| sim_time - last >= self.imu_interval);
        if due {
            let accel_b = flu_to_frd(&imu.linear_acceleration);
            let gyro_b = flu_to_frd(&imu.angular_velocity);

            let declination = self
                .declination
                .declination(self.ground_truth.latitude_rad, self.ground_truth.longitude_rad);
            let mag_noise = Vector3::from_fn(|_, _| self.noise.gaussian(self.config.mag_noise));
            let mag_b = q_nb.inverse_transform_vector(&field_ned(declination)) + mag_noise;

            let pos_n = enu_to_ned(&model.position);
            let alt_msl = self.config.home_alt - pos_n.z;
            let atmo = Atmosphere::at_altitude(alt_msl);
            let pressure_noise = self.config.baro_noise * self.noise.polar_box_muller();
            let airspeed = if self.config.vehicle_is_tailsitter {
                vel_b.z
            } else {
                vel_b.x
            };

            let time_usec = sim_usec(sim_time);
            self.integrate_flow_gyro(time_usec, &gyro_b);

            if self.sends_raw_sensors() {
                out.push(
                    HilSensor {
                        time_usec,
                        xacc: accel_b.x as f32,
                        yacc: accel_b.y as f32,
                        zacc: accel_b.z as f32,
                        xgyro: gyro_b.x as f32,
                        ygyro: gyro_b.y as f32,
                        zgyro: gyro_b.z as f32,
                        xmag: mag_b.x as f32,
                        ymag: mag_b.y as f32,
                        zmag: mag_b.z as f32,
                        abs_pressure: ((atmo.pressure + pressure_noise) * 0.01) as f32,
                        diff_pressure: atmo.differential_pressure_hpa(airspeed) as f32,
                        pressure_alt: (alt_msl - pressure_noise / (model.gravity * atmo.density))
                            as f32,
                        temperature: atmo.temperature_celsius() as f32,
                        fields_updated: FIELDS_UPDATED_ALL,
                    }
                    .into(),
                );
            }
            self.last_imu_time = Some(sim_time);
        }

        if self.sends_state() {
            let omega_b = flu_to_frd(&model.body_angular_velocity);
            let vel_n = enu_to_ned(&model.world_linear_velocity);
            let accel_true_b = flu_to_frd(&model.body_linear_acceleration);
            let to_mg = 1000.0 / STANDARD_GRAVITY;
            let gt = &self.ground_truth;

            out.push(
                HilStateQuaternion {
                    time_usec: sim_usec(sim_time),
                    attitude_quaternion: [
                        q_nb.w as f32,
                        q_nb.i as f32,
                        q_nb.j as f32,
                        q_nb.k as f32,
                    ],
                    rollspeed: omega_b.x as f32,
                    pitchspeed: omega_b.y as f32,
                    yawspeed: omega_b.z as f32,
                    lat: (gt.latitude_rad.to_degrees() * 1e7) as i32,
                    lon: (gt.longitude_rad.to_degrees() * 1e7) as i32,
                    alt: (gt.altitude * 1000.0) as i32,
                    vx: (vel_n.x * 100.0) as i16,
                    vy: (vel_n.y * 100.0) as i16,
                    vz: (vel_n.z * 100.0) as i16,
                    // Flow assumed aligned with a pitot along body X.
                    ind_airspeed: (vel_b.x * 100.0).max(0.0) as u16,
                    true_airspeed: (model.world_linear_velocity.norm() * 100.0) as u16,
                    xacc: (accel_true_b.x * to_mg) as i16,
                    yacc: (accel_true_b.y * to_mg) as i16,
                    zacc: (accel_true_b.z * to_mg) as i16,
                }
                .into(),
            );
        }
        out
    }

    fn integrate_flow_gyro(&mut self, time_usec: u64, gyro_b: &Vector3<f64>) {
        let Some(last) = self.last_gyro_time_us else {
            self.last_gyro_time_us = Some(time_usec);
            return;
        };
        let dt_us = time_usec.saturating_sub(last);
        if dt_us > GYRO_INTEGRATION_MIN_DT_US {
            self.flow_gyro += gyro_b * (dt_us as f64 * 1e-6);
            self.last_gyro_time_us = Some(time_usec);
        }
    }

    /// GNSS fix to `HIL_GPS`.
    pub fn on_gps(&mut self, gps: &GpsSample) -> Option<Message> {
        if !self.sends_raw_sensors() {
            trace!("HIL_GPS suppressed by state-level HIL");
            return None;
        }
        Some(
            HilGps {
                time_usec: sim_usec(gps.time),
                lat: (gps.latitude_deg * 1e7) as i32,
                lon: (gps.longitude_deg * 1e7) as i32,
                alt: (gps.altitude * 1000.0) as i32,
                eph: (gps.eph * 100.0) as u16,
                epv: (gps.epv * 100.0) as u16,
                vel: (gps.velocity * 100.0) as u16,
                vn: (gps.velocity_north * 100.0) as i16,
                ve: (gps.velocity_east * 100.0) as i16,
                vd: (-gps.velocity_up * 100.0) as i16,
                cog: course_over_ground(gps.velocity_north, gps.velocity_east),
                fix_type: GPS_FIX_3D,
                satellites_visible: GPS_SATELLITES,
            }
            .into(),
        )
    }

    /// Downward lidar to `DISTANCE_SENSOR`. The range also feeds the next
    /// optical-flow message.
    pub fn on_lidar(&mut self, lidar: &LidarSample) -> Message {
        self.flow_distance = lidar.current_distance;
        DistanceSensor {
            time_boot_ms: lidar.time_msec,
            min_distance: to_cm(lidar.min_distance),
            max_distance: to_cm(lidar.max_distance),
            current_distance: to_cm(lidar.current_distance),
            sensor_type: DistanceSensorType::Laser,
            id: 0,
            orientation: SensorOrientation::DOWNWARD,
            covariance: 0,
        }
        .into()
    }

    /// Forward sonar to `DISTANCE_SENSOR`.
    pub fn on_sonar(&mut self, sim_time: f64, sonar: &SonarSample) -> Message {
        DistanceSensor {
            time_boot_ms: (sim_time * 1e3) as u32,
            min_distance: to_cm(sonar.min_distance),
            max_distance: to_cm(sonar.max_distance),
            current_distance: to_cm(sonar.current_distance),
            sensor_type: DistanceSensorType::Ultrasound,
            id: 1,
            orientation: SensorOrientation::FORWARD,
            covariance: 0,
        }
        .into()
    }

    /// Optical flow to `HIL_OPTICAL_FLOW`, consuming the gyro integral.
    pub fn on_optical_flow(&mut self, sim_time: f64, flow: &OpticalFlowSample) -> Message {
        // Sensor X/Y are swapped relative to the body and Z points the other way.
        let gyro = if flow.quality > 0 {
            Vector3::new(-self.flow_gyro.y, self.flow_gyro.x, -self.flow_gyro.z)
        } else {
            Vector3::zeros()
        };
        self.flow_gyro = Vector3::zeros();

        HilOpticalFlow {
            time_usec: sim_usec(sim_time),
            integration_time_us: flow.integration_time_us,
            integrated_x: flow.integrated_x,
            integrated_y: flow.integrated_y,
            integrated_xgyro: gyro.x as f32,
            integrated_ygyro: gyro.y as f32,
            integrated_zgyro: gyro.z as f32,
            time_delta_distance_us: flow.time_delta_distance_us,
            distance: self.flow_distance as f32,
            temperature: flow.temperature,
            sensor_id: flow.sensor_id,
            quality: flow.quality,
        }
        .into()
    }

    /// IR-LOCK beacon to `LANDING_TARGET`.
    pub fn on_irlock(&mut self, sim_time: f64, irlock: &IrLockSample) -> Message {
        LandingTarget {
            time_usec: sim_usec(sim_time),
            angle_x: irlock.pos_x,
            angle_y: irlock.pos_y,
            distance: 0.0,
            size_x: irlock.size_x,
            size_y: irlock.size_y,
            target_num: irlock.signature,
            frame: 0,
            x: 0.0,
            y: 0.0,
            z: 0.0,
            q: [0.0; 4],
            target_type: Some(LandingTargetType::LightBeacon),
            position_valid: false,
        }
        .into()
    }

    /// External odometry (ENU/FLU) to `VISION_POSITION_ESTIMATE` (NED/FRD).
    pub fn on_odometry(&mut self, odom: &OdometrySample) -> Message {
        VisionPositionEstimate {
            usec: odom.usec,
            x: odom.y as f32,
            y: -odom.x as f32,
            z: -odom.z as f32,
            roll: odom.pitch as f32,
            pitch: -odom.roll as f32,
            yaw: -odom.yaw as f32,
        }
        .into()
    }

    /// Cache the ground-truth position used for state messages and declination.
    pub fn on_groundtruth(&mut self, gt: &GroundTruthSample) {
        self.ground_truth = *gt;
    }
}

fn sim_usec(sim_time: f64) -> u64 {
    (sim_time * 1e6) as u64
}

fn to_cm(meters: f64) -> u16 {
    (meters * 100.0) as u16
}

/// Course over ground in centidegrees, 0..36000.
fn course_over_ground(north: f64, east: f64) -> u16 {
    let cog = east.atan2(north).rem_euclid(TAU).to_degrees();
    let cog = if cog >= 360.0 { 0.0 } else { cog };
    (cog * 100.0) as u16
}
