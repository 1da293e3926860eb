//! Minimal simulation loop driving the bridge against a local autopilot.
//!
//! Start a SITL autopilot listening on UDP 14560, then:
//!
//! ```text
//! RUST_LOG=hil_bridge=debug cargo run --example sitl_loop
//! ```

use std::thread;
use std::time::{Duration, Instant};

use hil_bridge::actuators::{ChannelConfig, PidGains};
use hil_bridge::sensors::{GpsSample, GroundTruthSample, ImuSample, ModelState};
use hil_bridge::{BridgeConfig, HilBridge, SimulationHost};
use tracing::info;
use tracing_subscriber::EnvFilter;

const ROTORS: usize = 4;
const TICK: Duration = Duration::from_millis(4);
const HOME_LAT: f64 = 47.397_742;
const HOME_LON: f64 = 8.545_594;

/// Four rotors with first-order spin dynamics on a vehicle that stays on the ground.
struct Quad {
    start: Instant,
    rotor_speed: [f64; ROTORS],
    rotor_force: [f64; ROTORS],
    last_speeds: Vec<f64>,
}

impl Quad {
    fn new() -> Self {
        Self {
            start: Instant::now(),
            rotor_speed: [0.0; ROTORS],
            rotor_force: [0.0; ROTORS],
            last_speeds: Vec::new(),
        }
    }

    fn rotor(joint: &str) -> Option<usize> {
        joint
            .strip_prefix("rotor_")
            .and_then(|rest| rest.strip_suffix("_joint"))
            .and_then(|n| n.parse().ok())
            .filter(|n| *n < ROTORS)
    }

    fn integrate(&mut self, dt: f64) {
        for (speed, force) in self.rotor_speed.iter_mut().zip(self.rotor_force) {
            *speed += (force - 0.05 * *speed) * dt;
        }
    }
}

impl SimulationHost for Quad {
    fn sim_time(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }

    fn publish_motor_speeds(&mut self, speeds: &[f64]) {
        self.last_speeds = speeds.to_vec();
    }

    fn has_joint(&self, joint: &str) -> bool {
        Self::rotor(joint).is_some()
    }

    fn joint_velocity(&self, joint: &str) -> f64 {
        Self::rotor(joint).map_or(0.0, |i| self.rotor_speed[i])
    }

    fn joint_position(&self, _joint: &str) -> f64 {
        0.0
    }

    fn set_joint_force(&mut self, joint: &str, force: f64) {
        if let Some(i) = Self::rotor(joint) {
            self.rotor_force[i] = force;
        }
    }

    fn set_joint_position(&mut self, _joint: &str, _position: f64) {}

    fn publish_joint_target(&mut self, _topic: &str, _target: f64) {}
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut config = BridgeConfig::default();
    config.transport.poll_timeout = Some(Duration::from_millis(1));
    config.channels = (0..ROTORS)
        .map(|i| ChannelConfig {
            input_index: i,
            input_scaling: 1000.0,
            zero_position_armed: 100.0,
            joint_control_type: Some("velocity".to_owned()),
            joint_name: Some(format!("rotor_{i}_joint")),
            pid: Some(PidGains {
                p: 0.1,
                ..PidGains::default()
            }),
            ..ChannelConfig::default()
        })
        .collect();

    let mut bridge = HilBridge::new(config)?;
    info!(local = %bridge.local_addr()?, "bridge up");

    let mut quad = Quad::new();
    bridge.on_groundtruth(&GroundTruthSample {
        latitude_rad: HOME_LAT.to_radians(),
        longitude_rad: HOME_LON.to_radians(),
        altitude: 488.0,
    });

    let mut ticks = 0u64;
    while quad.sim_time() < 30.0 {
        let now = quad.sim_time();
        bridge.on_imu(now, &ImuSample::default(), &ModelState::default());
        if ticks % 50 == 0 {
            bridge.on_gps(&GpsSample {
                time: now,
                latitude_deg: HOME_LAT,
                longitude_deg: HOME_LON,
                altitude: 488.0,
                eph: 0.3,
                epv: 0.4,
                ..GpsSample::default()
            });
        }

        bridge.step(&mut quad);
        quad.integrate(TICK.as_secs_f64());

        if ticks % 250 == 0 {
            info!(
                armed = bridge.vehicle_state().armed,
                speeds = ?quad.last_speeds,
                stats = ?bridge.transport_stats(),
                "status"
            );
        }
        ticks += 1;
        thread::sleep(TICK);
    }

    bridge.shutdown();
    Ok(())
}
