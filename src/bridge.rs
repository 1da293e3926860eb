//! Host-facing bridge between a simulation and a flight controller.
//!
//! The simulation drives [`HilBridge`] from its tick thread: sensor callbacks
//! push HIL messages out, [`HilBridge::step`] pulls actuator commands in and
//! applies them through the [`SimulationHost`].

use tracing::{debug, instrument, trace, warn};

use crate::actuators::{ActuatorDecoder, ChannelMap, ControlMixer, VehicleState};
use crate::config::BridgeConfig;
use crate::protocol::Message;
use crate::sensors::{
    GpsSample, GroundTruthSample, ImuSample, IrLockSample, LidarSample, ModelState,
    OdometrySample, OpticalFlowSample, SensorTranslator, SonarSample,
};
use crate::transport::{TransportError, TransportManager, TransportStats};

/// What the bridge needs from the simulation.
///
/// Joints are addressed by name; the bridge only touches joints for which
/// [`has_joint`](Self::has_joint) returned `true`.
pub trait SimulationHost {
    /// Current simulation time (s)
    fn sim_time(&self) -> f64;

    /// Publish per-channel motor speed references.
    fn publish_motor_speeds(&mut self, speeds: &[f64]);

    /// Whether the model has a joint with this name
    fn has_joint(&self, joint: &str) -> bool;

    /// Joint velocity (rad/s or m/s)
    fn joint_velocity(&self, joint: &str) -> f64;

    /// Joint position (rad or m)
    fn joint_position(&self, joint: &str) -> f64;

    /// Apply a generalized force to a joint.
    fn set_joint_force(&mut self, joint: &str, force: f64);

    /// Set a joint position directly, bypassing dynamics.
    fn set_joint_position(&mut self, joint: &str, position: f64);

    /// Publish a joint target on a side-channel topic.
    fn publish_joint_target(&mut self, topic: &str, target: f64);
}

/// Hardware/software-in-the-loop bridge.
#[derive(Debug)]
pub struct HilBridge {
    transport: TransportManager,
    translator: SensorTranslator,
    decoder: ActuatorDecoder,
    mixer: ControlMixer,
    last_step: Option<f64>,
}

impl HilBridge {
    /// Open the transport and resolve the channel table.
    ///
    /// Fails only when the datagram socket cannot be bound.
    #[instrument(level = "info", skip(config))]
    pub fn new(config: BridgeConfig) -> Result<Self, TransportError> {
        let transport = TransportManager::open(&config.transport)?;
        let channels = ChannelMap::from_configs(&config.channels);
        Ok(Self {
            transport,
            translator: SensorTranslator::new(config.sensors.with_env_overrides()),
            decoder: ActuatorDecoder::new(channels.clone()),
            mixer: ControlMixer::new(channels),
            last_step: None,
        })
    }

    /// Local datagram address
    pub fn local_addr(&self) -> Result<std::net::SocketAddr, TransportError> {
        self.transport.local_addr()
    }

    /// Latest actuator state
    #[must_use]
    pub const fn vehicle_state(&self) -> &VehicleState {
        self.decoder.state()
    }

    /// Control mixer
    #[must_use]
    pub const fn mixer(&self) -> &ControlMixer {
        &self.mixer
    }

    /// Link counters
    #[must_use]
    pub fn transport_stats(&self) -> TransportStats {
        self.transport.stats()
    }

    /// One simulation tick: receive commands, actuate joints, publish motor
    /// speeds. Returns the number of inbound frames handled.
    ///
    /// The first tick only starts the controller clock; joints are actuated
    /// from the second tick on, once a time step exists.
    pub fn step<H: SimulationHost + ?Sized>(&mut self, host: &mut H) -> usize {
        let now = host.sim_time();

        let decoder = &mut self.decoder;
        let received = match self.transport.poll(|frame| {
            decoder.handle_frame(&frame, now);
        }) {
            Ok(n) => n,
            Err(err) => {
                warn!(%err, "poll failed");
                0
            }
        };

        match self.last_step.map(|last| now - last) {
            Some(dt) if dt > 0.0 => self.mixer.apply(self.decoder.state(), dt, host),
            Some(dt) => trace!(dt, "simulation clock did not advance, holding joints"),
            None => trace!(now, "seeded controller clock"),
        }
        self.mixer
            .publish_motor_speeds(self.decoder.state(), now, host);

        self.last_step = Some(now);
        received
    }

    /// IMU sample
    pub fn on_imu(&mut self, sim_time: f64, imu: &ImuSample, model: &ModelState) {
        for message in self.translator.on_imu(sim_time, imu, model) {
            self.send(&message);
        }
    }

    /// GNSS fix
    pub fn on_gps(&mut self, gps: &GpsSample) {
        if let Some(message) = self.translator.on_gps(gps) {
            self.send(&message);
        }
    }

    /// Downward lidar
    pub fn on_lidar(&mut self, lidar: &LidarSample) {
        let message = self.translator.on_lidar(lidar);
        self.send(&message);
    }

    /// Forward sonar
    pub fn on_sonar(&mut self, sim_time: f64, sonar: &SonarSample) {
        let message = self.translator.on_sonar(sim_time, sonar);
        self.send(&message);
    }

    /// Optical flow
    pub fn on_optical_flow(&mut self, sim_time: f64, flow: &OpticalFlowSample) {
        let message = self.translator.on_optical_flow(sim_time, flow);
        self.send(&message);
    }

    /// IR-LOCK beacon
    pub fn on_irlock(&mut self, sim_time: f64, irlock: &IrLockSample) {
        let message = self.translator.on_irlock(sim_time, irlock);
        self.send(&message);
    }

    /// Ground-truth position
    pub fn on_groundtruth(&mut self, gt: &GroundTruthSample) {
        self.translator.on_groundtruth(gt);
    }

    /// External odometry
    pub fn on_odometry(&mut self, odom: &OdometrySample) {
        let message = self.translator.on_odometry(odom);
        self.send(&message);
    }

    fn send(&mut self, message: &Message) {
        if let Err(err) = self.transport.send(message) {
            debug!(%err, id = %message.id(), "message not sent");
        }
    }

    /// Stop the serial workers.
    pub fn shutdown(&mut self) {
        self.transport.shutdown();
    }
}
