//! HIL bridge - MAVLink hardware/software-in-the-loop link between a physics
//! simulation and a flight controller
//!
//! The bridge turns simulated sensor samples into MAVLink HIL messages and
//! turns the flight controller's actuator commands back into joint control.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use hil_bridge::{BridgeConfig, HilBridge};
//! use hil_bridge::sensors::{ImuSample, ModelState};
//!
//! let mut bridge = HilBridge::new(BridgeConfig::default())?;
//!
//! // Every IMU update from the simulation
//! bridge.on_imu(0.004, &ImuSample::default(), &ModelState::default());
//! # Ok::<(), hil_bridge::transport::TransportError>(())
//! ```
//!
//! # Layers
//!
//! - [`protocol`] - MAVLink v1/v2 framing, checksums, signing, HIL messages
//! - [`transport`] - UDP link plus optional serial link with a bounded TX queue
//! - [`sensors`] - frame conversions and sensor models
//! - [`actuators`] - actuator command decoding and per-joint control
//! - [`bridge`] - the host-facing surface

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_sign_loss)]

pub mod actuators;
pub mod bridge;
pub mod config;
pub mod protocol;
pub mod sensors;
pub mod transport;

pub use bridge::{HilBridge, SimulationHost};
pub use config::BridgeConfig;
pub use protocol::{Error, Frame, Message, ProtocolVersion, Result};
