//! Actuator command decoding.

use tracing::trace;

use super::{ChannelMap, N_CHANNELS};
use crate::protocol::{Frame, HilActuatorControls, Message};

/// Latest actuator command as seen by the vehicle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VehicleState {
    /// Armed bit of the last command
    pub armed: bool,
    /// Per-channel reference
    pub reference: [f64; N_CHANNELS],
    /// Simulation time of the last command (s)
    pub last_update: Option<f64>,
}

impl VehicleState {
    /// Disarmed state with every channel at its disarmed position.
    #[must_use]
    pub fn disarmed(channels: &ChannelMap) -> Self {
        let mut reference = [0.0; N_CHANNELS];
        for (slot, channel) in reference.iter_mut().zip(channels.iter()) {
            *slot = channel.zero_disarmed;
        }
        Self {
            armed: false,
            reference,
            last_update: None,
        }
    }

    /// Whether any command has arrived yet
    #[must_use]
    pub const fn received_first(&self) -> bool {
        self.last_update.is_some()
    }

    /// Whether the last command is older than `timeout` at `now`, or absent.
    #[must_use]
    pub fn is_stale(&self, now: f64, timeout: f64) -> bool {
        self.last_update.is_none_or(|t| now - t > timeout)
    }
}

/// Turns `HIL_ACTUATOR_CONTROLS` into per-channel references.
#[derive(Debug, Clone)]
pub struct ActuatorDecoder {
    channels: ChannelMap,
    state: VehicleState,
}

impl ActuatorDecoder {
    /// Decoder over a resolved channel table.
    #[must_use]
    pub fn new(channels: ChannelMap) -> Self {
        let state = VehicleState::disarmed(&channels);
        Self { channels, state }
    }

    /// Channel table
    #[must_use]
    pub const fn channels(&self) -> &ChannelMap {
        &self.channels
    }

    /// Current vehicle state
    #[must_use]
    pub const fn state(&self) -> &VehicleState {
        &self.state
    }

    /// Handle one received frame. Returns `true` when it updated the state.
    pub fn handle_frame(&mut self, frame: &Frame, now: f64) -> bool {
        match frame.message() {
            Ok(message) => self.handle_message(&message, now),
            Err(e) => {
                trace!(error = %e, "undecodable inbound frame");
                false
            }
        }
    }

    /// Handle one decoded message. Anything but actuator controls is ignored.
    pub fn handle_message(&mut self, message: &Message, now: f64) -> bool {
        match message {
            Message::HilActuatorControls(controls) => {
                self.apply(controls, now);
                true
            }
            other => {
                trace!(id = %other.id(), "ignoring inbound message");
                false
            }
        }
    }

    fn apply(&mut self, controls: &HilActuatorControls, now: f64) {
        let armed = controls.mode.is_armed();
        for ((reference, channel), control) in self
            .state
            .reference
            .iter_mut()
            .zip(self.channels.iter())
            .zip(controls.controls)
        {
            *reference = channel.reference(f64::from(control), armed);
        }
        self.state.armed = armed;
        self.state.last_update = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actuators::ChannelConfig;
    use crate::protocol::{Heartbeat, ModeFlags};

    fn decoder() -> ActuatorDecoder {
        let configs: Vec<ChannelConfig> = (0..4)
            .map(|i| ChannelConfig {
                input_index: i,
                input_offset: 0.0,
                input_scaling: 1000.0,
                zero_position_disarmed: -(i as f64),
                zero_position_armed: 100.0,
                joint_control_type: Some("velocity".to_owned()),
                ..ChannelConfig::default()
            })
            .collect();
        ActuatorDecoder::new(ChannelMap::from_configs(&configs))
    }

    fn controls(mode: ModeFlags, value: f32) -> Message {
        HilActuatorControls {
            time_usec: 0,
            flags: 0,
            controls: [value; 16],
            mode,
        }
        .into()
    }

    #[test]
    fn starts_disarmed_without_command() {
        let dec = decoder();
        assert!(!dec.state().received_first());
        assert!(dec.state().is_stale(0.0, 0.2));
        assert_eq!(dec.state().reference[2], -2.0);
    }

    #[test]
    fn disarmed_command_uses_disarmed_positions() {
        let mut dec = decoder();
        assert!(dec.handle_message(&controls(ModeFlags::default(), 0.7), 1.0));
        let state = dec.state();
        assert!(!state.armed);
        assert_eq!(&state.reference[..4], &[0.0, -1.0, -2.0, -3.0]);
        assert_eq!(state.last_update, Some(1.0));
    }

    #[test]
    fn armed_command_applies_affine_map() {
        let mut dec = decoder();
        let armed = ModeFlags::default().with(ModeFlags::SAFETY_ARMED);
        dec.handle_message(&controls(armed, 0.5), 2.0);
        let state = dec.state();
        assert!(state.armed);
        assert!((state.reference[0] - 600.0).abs() < 1e-9);
        // Unconfigured slots have zero scale.
        assert!(state.reference[10].abs() < f64::EPSILON);
    }

    #[test]
    fn other_messages_ignored() {
        let mut dec = decoder();
        let hb = Heartbeat {
            custom_mode: 0,
            mav_type: 2,
            autopilot: 12,
            base_mode: ModeFlags::default().with(ModeFlags::SAFETY_ARMED),
            system_status: 4,
            mavlink_version: 3,
        };
        assert!(!dec.handle_message(&hb.into(), 1.0));
        assert!(!dec.state().received_first());
    }

    #[test]
    fn staleness_threshold() {
        let mut dec = decoder();
        dec.handle_message(&controls(ModeFlags::default(), 0.0), 1.0);
        assert!(!dec.state().is_stale(1.2, 0.2));
        assert!(dec.state().is_stale(1.25, 0.2));
    }
}
