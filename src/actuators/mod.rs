//! Actuator command decoding and joint control
//!
//! [`ActuatorDecoder`] maps `HIL_ACTUATOR_CONTROLS` onto a per-channel
//! reference vector; [`ControlMixer`] turns that vector into joint forces,
//! positions, or side-channel targets on the simulation host.

mod config;
mod decoder;
mod mixer;
mod pid;

pub use config::{Channel, ChannelConfig, ChannelMap, ConfigError, ControlType, PidGains};
pub use decoder::{ActuatorDecoder, VehicleState};
pub use mixer::{COMMAND_TIMEOUT, ControlMixer};
pub use pid::Pid;

/// Number of actuator channels carried by `HIL_ACTUATOR_CONTROLS`.
pub const N_CHANNELS: usize = 16;
