//! Per-channel joint control.

use tracing::{debug, error, warn};

use super::{ChannelMap, ControlType, N_CHANNELS, Pid, VehicleState};
use crate::bridge::SimulationHost;

/// Commands older than this are reported to the host as zero motor speed (s).
pub const COMMAND_TIMEOUT: f64 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Binding {
    Unresolved,
    Bound,
    Unbound,
}

#[derive(Debug, Clone)]
struct ChannelControl {
    pid: Pid,
    binding: Binding,
    reported: bool,
}

/// Drives simulated joints from the vehicle's reference vector.
#[derive(Debug, Clone)]
pub struct ControlMixer {
    channels: ChannelMap,
    controls: [ChannelControl; N_CHANNELS],
    motor_speeds: [f64; N_CHANNELS],
}

impl ControlMixer {
    /// Mixer over a resolved channel table. Joints are looked up on the
    /// first [`apply`](Self::apply).
    #[must_use]
    pub fn new(channels: ChannelMap) -> Self {
        let controls = std::array::from_fn(|i| ChannelControl {
            pid: Pid::new(channels.get(i).map(|c| c.pid).unwrap_or_default()),
            binding: Binding::Unresolved,
            reported: false,
        });
        Self {
            channels,
            controls,
            motor_speeds: [0.0; N_CHANNELS],
        }
    }

    /// Motor speeds from the last [`publish_motor_speeds`](Self::publish_motor_speeds)
    #[must_use]
    pub const fn motor_speeds(&self) -> &[f64; N_CHANNELS] {
        &self.motor_speeds
    }

    /// Last PID command of channel `index`
    #[must_use]
    pub fn pid_command(&self, index: usize) -> Option<f64> {
        self.controls.get(index).map(|c| c.pid.command())
    }

    /// Actuate every bound channel. Nothing is written before the first command.
    pub fn apply<H: SimulationHost + ?Sized>(
        &mut self,
        state: &VehicleState,
        dt: f64,
        host: &mut H,
    ) {
        if !state.received_first() {
            return;
        }

        for (index, (channel, control)) in self
            .channels
            .iter()
            .zip(self.controls.iter_mut())
            .enumerate()
        {
            let Some(joint) = channel.joint.as_deref() else {
                continue;
            };
            if control.binding == Binding::Unresolved {
                control.binding = if host.has_joint(joint) {
                    debug!(index, joint, "joint control active");
                    Binding::Bound
                } else {
                    warn!(index, joint, "joint not found, no joint control for channel");
                    Binding::Unbound
                };
            }
            if control.binding == Binding::Unbound {
                continue;
            }

            let target = state.reference[index];
            match channel.control_type {
                Some(ControlType::Velocity) => {
                    let error = host.joint_velocity(joint) - target;
                    let force = control.pid.update(error, dt);
                    host.set_joint_force(joint, force);
                }
                Some(ControlType::Position) => {
                    let error = host.joint_position(joint) - target;
                    let force = control.pid.update(error, dt);
                    host.set_joint_force(joint, force);
                }
                Some(ControlType::PositionGztopic) => {
                    host.publish_joint_target(&channel.topic, target);
                }
                Some(ControlType::PositionKinematic) => {
                    host.set_joint_position(joint, target);
                }
                None => {
                    if !control.reported {
                        error!(index, joint, "joint control type undefined");
                        control.reported = true;
                    }
                }
            }
        }
    }

    /// Publish the motor-speed references, zeroed when the command is stale.
    /// Nothing is published before the first command.
    pub fn publish_motor_speeds<H: SimulationHost + ?Sized>(
        &mut self,
        state: &VehicleState,
        now: f64,
        host: &mut H,
    ) {
        if !state.received_first() {
            return;
        }
        self.motor_speeds = if state.is_stale(now, COMMAND_TIMEOUT) {
            [0.0; N_CHANNELS]
        } else {
            state.reference
        };
        host.publish_motor_speeds(&self.motor_speeds);
    }
}
