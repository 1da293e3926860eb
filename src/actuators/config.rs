//! Actuator channel configuration.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use tracing::{debug, error, warn};

use super::N_CHANNELS;

/// Channel configuration errors. Reported once per occurrence; the affected
/// channel stays inactive.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Channel slot outside the actuator-controls vector
    #[error("input_index {index} out of range (max {max})")]
    IndexOutOfRange {
        /// Requested slot
        index: usize,
        /// Exclusive upper bound
        max: usize,
    },

    /// Control type string not recognized
    #[error("unknown joint control type: {name:?}")]
    UnknownControlType {
        /// Offending string
        name: String,
    },
}

/// How a channel's reference drives its joint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ControlType {
    /// PID on joint velocity, output as force
    Velocity,
    /// PID on joint position, output as force
    Position,
    /// Reference published on a side-channel topic
    PositionGztopic,
    /// Joint position set directly
    PositionKinematic,
}

impl ControlType {
    /// Configuration string
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Velocity => "velocity",
            Self::Position => "position",
            Self::PositionGztopic => "position_gztopic",
            Self::PositionKinematic => "position_kinematic",
        }
    }
}

impl FromStr for ControlType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "velocity" => Ok(Self::Velocity),
            "position" => Ok(Self::Position),
            "position_gztopic" => Ok(Self::PositionGztopic),
            "position_kinematic" => Ok(Self::PositionKinematic),
            other => Err(ConfigError::UnknownControlType {
                name: other.to_owned(),
            }),
        }
    }
}

impl fmt::Display for ControlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// PID gains and limits. A zero command limit leaves that side unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PidGains {
    /// Proportional gain
    pub p: f64,
    /// Integral gain
    pub i: f64,
    /// Derivative gain
    pub d: f64,
    /// Upper limit of the integral term
    pub i_max: f64,
    /// Lower limit of the integral term
    pub i_min: f64,
    /// Upper command limit
    pub cmd_max: f64,
    /// Lower command limit
    pub cmd_min: f64,
}

/// One declared actuator channel.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ChannelConfig {
    /// Slot in the actuator-controls vector this channel configures
    pub input_index: usize,
    /// Added to the raw control before scaling
    pub input_offset: f64,
    /// Scale applied to the offset control
    pub input_scaling: f64,
    /// Reference while disarmed
    pub zero_position_disarmed: f64,
    /// Added to the scaled control while armed
    pub zero_position_armed: f64,
    /// Control type string; `None` means velocity
    pub joint_control_type: Option<String>,
    /// Joint driven by this channel
    pub joint_name: Option<String>,
    /// Side-channel topic for `position_gztopic`
    pub topic: Option<String>,
    /// Joint controller gains
    pub pid: Option<PidGains>,
}

/// Resolved settings of one channel slot.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Channel {
    /// Added to the raw control before scaling
    pub offset: f64,
    /// Scale applied to the offset control
    pub scale: f64,
    /// Reference while disarmed
    pub zero_disarmed: f64,
    /// Added to the scaled control while armed
    pub zero_armed: f64,
    /// `None` when the configured type was not recognized
    pub control_type: Option<ControlType>,
    /// Joint driven by this channel
    pub joint: Option<String>,
    /// Side-channel topic
    pub topic: String,
    /// Joint controller gains
    pub pid: PidGains,
}

impl Channel {
    /// Reference for a raw control value.
    #[inline]
    #[must_use]
    pub fn reference(&self, control: f64, armed: bool) -> f64 {
        if armed {
            (control + self.offset) * self.scale + self.zero_armed
        } else {
            self.zero_disarmed
        }
    }
}

/// Per-slot channel table built from the declared channels.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelMap {
    channels: [Channel; N_CHANNELS],
}

impl Default for ChannelMap {
    fn default() -> Self {
        Self {
            channels: std::array::from_fn(|_| Channel::default()),
        }
    }
}

impl ChannelMap {
    /// Build the table, logging and skipping invalid declarations.
    #[must_use]
    pub fn from_configs(configs: &[ChannelConfig]) -> Self {
        let mut map = Self::default();
        for config in configs {
            if let Err(e) = map.insert(config) {
                error!(error = %e, "channel configuration rejected");
            }
        }
        map
    }

    /// Apply one declaration. An unknown control type is reported but still
    /// stores the channel's scaling, leaving it without a control type.
    pub fn insert(&mut self, config: &ChannelConfig) -> Result<(), ConfigError> {
        let index = config.input_index;
        let slot = self
            .channels
            .get_mut(index)
            .ok_or(ConfigError::IndexOutOfRange {
                index,
                max: N_CHANNELS,
            })?;

        let control_type = match config.joint_control_type.as_deref() {
            None => {
                warn!(index, "joint control type not specified, using velocity");
                Ok(ControlType::Velocity)
            }
            Some(name) => name.parse(),
        };

        if config.joint_name.is_none() {
            debug!(index, "no joint for channel, no joint control");
        }

        *slot = Channel {
            offset: config.input_offset,
            scale: config.input_scaling,
            zero_disarmed: config.zero_position_disarmed,
            zero_armed: config.zero_position_armed,
            control_type: control_type.as_ref().ok().copied(),
            joint: config.joint_name.clone(),
            topic: config
                .topic
                .clone()
                .unwrap_or_else(|| format!("control_position_gztopic_{index}")),
            pid: config.pid.unwrap_or_default(),
        };
        control_type.map(|_| ())
    }

    /// Channel in slot `index`
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Channel> {
        self.channels.get(index)
    }

    /// All slots in index order
    pub fn iter(&self) -> impl Iterator<Item = &Channel> {
        self.channels.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn control_type_strings() {
        for ty in [
            ControlType::Velocity,
            ControlType::Position,
            ControlType::PositionGztopic,
            ControlType::PositionKinematic,
        ] {
            assert_eq!(ty.as_str().parse::<ControlType>(), Ok(ty));
        }
        assert_eq!(
            "servo".parse::<ControlType>(),
            Err(ConfigError::UnknownControlType {
                name: "servo".to_owned()
            })
        );
    }

    #[test]
    fn missing_type_defaults_to_velocity() {
        let map = ChannelMap::from_configs(&[ChannelConfig {
            input_index: 3,
            input_scaling: 1000.0,
            ..ChannelConfig::default()
        }]);
        let channel = map.get(3).unwrap();
        assert_eq!(channel.control_type, Some(ControlType::Velocity));
        assert_eq!(channel.topic, "control_position_gztopic_3");
    }

    #[test]
    fn out_of_range_index_rejected() {
        let mut map = ChannelMap::default();
        let err = map
            .insert(&ChannelConfig {
                input_index: N_CHANNELS,
                ..ChannelConfig::default()
            })
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::IndexOutOfRange {
                index: N_CHANNELS,
                max: N_CHANNELS
            }
        );
        assert_eq!(map, ChannelMap::default());
    }

    #[test]
    fn unknown_type_keeps_scaling_without_control() {
        let mut map = ChannelMap::default();
        let result = map.insert(&ChannelConfig {
            input_index: 1,
            input_offset: 1.0,
            input_scaling: 2.0,
            joint_control_type: Some("servo".to_owned()),
            joint_name: Some("rotor_1_joint".to_owned()),
            ..ChannelConfig::default()
        });
        assert!(result.is_err());
        let channel = map.get(1).unwrap();
        assert_eq!(channel.control_type, None);
        assert!((channel.reference(0.5, true) - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn reference_formula() {
        let channel = Channel {
            offset: 1.0,
            scale: 500.0,
            zero_disarmed: -1.0,
            zero_armed: 100.0,
            ..Channel::default()
        };
        assert!((channel.reference(0.5, true) - 850.0).abs() < f64::EPSILON);
        assert!((channel.reference(0.5, false) + 1.0).abs() < f64::EPSILON);
    }
}
