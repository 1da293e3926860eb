//! Bridge configuration.
//!
//! Everything is loaded once at startup and read-only afterwards. Defaults
//! match a stock SITL setup: autopilot on UDP 14560, ground station on UDP
//! 14550, no serial link.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

#[cfg(feature = "debug-tools")]
use std::path::PathBuf;

use tracing::{info, warn};

use crate::actuators::ChannelConfig;
use crate::protocol::{ProtocolVersion, SigningKey};
use crate::transport::DEFAULT_TX_QUEUE_CAPACITY;

/// Default UDP port of the flight controller's simulator link.
pub const DEFAULT_AUTOPILOT_PORT: u16 = 14560;
/// Default UDP port of the ground-control station.
pub const DEFAULT_GCS_PORT: u16 = 14550;
/// Default serial device.
pub const DEFAULT_SERIAL_DEVICE: &str = "/dev/ttyACM0";
/// Default serial baud rate.
pub const DEFAULT_BAUD_RATE: u32 = 921_600;
/// Default home altitude above MSL (m).
pub const DEFAULT_HOME_ALT: f64 = 488.0;
/// Environment variable overriding the home altitude.
pub const HOME_ALT_ENV: &str = "PX4_HOME_ALT";
/// Default number of received serial frames buffered for the tick thread.
pub const DEFAULT_RX_QUEUE_CAPACITY: usize = 256;
/// Default interval between `HIL_SENSOR` messages (s).
pub const DEFAULT_IMU_INTERVAL: f64 = 0.004;

/// Serial link settings. The port is always 8N1 without flow control.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SerialConfig {
    /// Route autopilot traffic over the serial device instead of UDP.
    pub enabled: bool,
    /// Device path
    pub device: String,
    /// Baud rate
    pub baud_rate: u32,
    /// Maximum number of frames waiting to be written.
    pub tx_queue_capacity: usize,
    /// Maximum number of received frames waiting for the tick thread.
    pub rx_queue_capacity: usize,
    /// Read timeout of the reader worker; bounds how long shutdown waits.
    pub read_timeout: Duration,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            device: DEFAULT_SERIAL_DEVICE.to_owned(),
            baud_rate: DEFAULT_BAUD_RATE,
            tx_queue_capacity: DEFAULT_TX_QUEUE_CAPACITY,
            rx_queue_capacity: DEFAULT_RX_QUEUE_CAPACITY,
            read_timeout: Duration::from_millis(10),
        }
    }
}

/// Datagram and serial endpoint configuration.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TransportConfig {
    /// Local address bound when the serial link is disabled (port is OS-assigned).
    pub bind_addr: IpAddr,
    /// Flight-controller address. With the serial link enabled this is the
    /// local address the ground-station socket binds to.
    pub autopilot_addr: IpAddr,
    /// Flight-controller port
    pub autopilot_port: u16,
    /// Ground-station address
    pub gcs_addr: IpAddr,
    /// Ground-station port
    pub gcs_port: u16,
    /// How long a poll may wait for the first datagram. `None` never waits.
    pub poll_timeout: Option<Duration>,
    /// Outbound wire revision; both revisions are always accepted inbound.
    pub protocol_version: ProtocolVersion,
    /// Sign outbound v2 frames and verify inbound signed frames.
    #[cfg_attr(feature = "serde", serde(skip))]
    pub signing: Option<SigningKey>,
    /// Serial link settings
    pub serial: SerialConfig,
    /// Record every frame to a `.tlog` file.
    #[cfg(feature = "debug-tools")]
    pub tlog_path: Option<PathBuf>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            bind_addr: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            autopilot_addr: IpAddr::V4(Ipv4Addr::LOCALHOST),
            autopilot_port: DEFAULT_AUTOPILOT_PORT,
            gcs_addr: IpAddr::V4(Ipv4Addr::LOCALHOST),
            gcs_port: DEFAULT_GCS_PORT,
            poll_timeout: None,
            protocol_version: ProtocolVersion::V1,
            signing: None,
            serial: SerialConfig::default(),
            #[cfg(feature = "debug-tools")]
            tlog_path: None,
        }
    }
}

impl TransportConfig {
    /// Local address of the datagram socket and its initial peer.
    #[must_use]
    pub fn datagram_endpoints(&self) -> (SocketAddr, SocketAddr) {
        if self.serial.enabled {
            (
                SocketAddr::new(self.autopilot_addr, self.autopilot_port),
                SocketAddr::new(self.gcs_addr, self.gcs_port),
            )
        } else {
            (
                SocketAddr::new(self.bind_addr, 0),
                SocketAddr::new(self.autopilot_addr, self.autopilot_port),
            )
        }
    }
}

/// Sensor translation settings.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SensorConfig {
    /// `HIL_SENSOR` rate in Hz; overrides the default 250 Hz interval.
    pub imu_rate: Option<f64>,
    /// Restrict output to one HIL level (see `hil_state_level`).
    pub hil_mode: bool,
    /// With `hil_mode`, send only `HIL_STATE_QUATERNION` instead of
    /// `HIL_SENSOR` and `HIL_GPS`.
    pub hil_state_level: bool,
    /// Airspeed is measured along body Z instead of body X.
    pub vehicle_is_tailsitter: bool,
    /// Home altitude above MSL (m)
    pub home_alt: f64,
    /// Standard deviation of magnetometer noise (G)
    pub mag_noise: f64,
    /// RMS barometer noise (Pa)
    pub baro_noise: f64,
    /// Seed for the noise generator; `None` seeds from entropy.
    pub noise_seed: Option<u64>,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            imu_rate: None,
            hil_mode: false,
            hil_state_level: false,
            vehicle_is_tailsitter: false,
            home_alt: DEFAULT_HOME_ALT,
            mag_noise: 0.01,
            baro_noise: 1.0,
            noise_seed: None,
        }
    }
}

impl SensorConfig {
    /// Seconds between `HIL_SENSOR` messages.
    #[must_use]
    pub fn imu_interval(&self) -> f64 {
        match self.imu_rate {
            Some(rate) if rate > 0.0 && rate.is_finite() => 1.0 / rate,
            _ => DEFAULT_IMU_INTERVAL,
        }
    }

    /// Apply `PX4_HOME_ALT` if set.
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(value) = std::env::var(HOME_ALT_ENV) {
            self.apply_home_alt(&value);
        }
        self
    }

    fn apply_home_alt(&mut self, value: &str) {
        match value.trim().parse::<f64>() {
            Ok(alt) if alt.is_finite() => {
                info!(alt, "home altitude overridden from {HOME_ALT_ENV}");
                self.home_alt = alt;
            }
            _ => warn!(value, "ignoring unparseable {HOME_ALT_ENV}"),
        }
    }
}

/// Complete bridge configuration.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BridgeConfig {
    /// Endpoints
    pub transport: TransportConfig,
    /// Sensor translation
    pub sensors: SensorConfig,
    /// Actuator channels, in declaration order
    pub channels: Vec<ChannelConfig>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn imu_interval_defaults_and_overrides() {
        let mut config = SensorConfig::default();
        assert!((config.imu_interval() - 0.004).abs() < f64::EPSILON);

        config.imu_rate = Some(500.0);
        assert!((config.imu_interval() - 0.002).abs() < 1e-12);

        config.imu_rate = Some(0.0);
        assert!((config.imu_interval() - DEFAULT_IMU_INTERVAL).abs() < f64::EPSILON);
    }

    #[test]
    fn endpoints_follow_serial_mode() {
        let mut config = TransportConfig::default();
        let (local, remote) = config.datagram_endpoints();
        assert_eq!(local.port(), 0);
        assert_eq!(remote.port(), DEFAULT_AUTOPILOT_PORT);

        config.serial.enabled = true;
        let (local, remote) = config.datagram_endpoints();
        assert_eq!(local.port(), DEFAULT_AUTOPILOT_PORT);
        assert_eq!(remote.port(), DEFAULT_GCS_PORT);
    }

    #[test]
    fn home_alt_parsing() {
        let mut config = SensorConfig::default();
        config.apply_home_alt(" 1200.5 ");
        assert!((config.home_alt - 1200.5).abs() < f64::EPSILON);
        config.apply_home_alt("high");
        assert!((config.home_alt - 1200.5).abs() < f64::EPSILON);
    }
}
