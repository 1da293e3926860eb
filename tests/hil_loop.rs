use std::net::{Ipv4Addr, SocketAddr, UdpSocket};
use std::time::Duration;

use hil_bridge::actuators::{ChannelConfig, PidGains};
use hil_bridge::protocol::{
    FrameParser, HilActuatorControls, ModeFlags, ProtocolVersion, encode_frame,
};
use hil_bridge::sensors::{GpsSample, ImuSample, ModelState};
use hil_bridge::{BridgeConfig, HilBridge, Message, SimulationHost};

#[derive(Default)]
struct RecordingHost {
    time: f64,
    forces: Vec<(String, f64)>,
    speeds: Vec<Vec<f64>>,
}

impl SimulationHost for RecordingHost {
    fn sim_time(&self) -> f64 {
        self.time
    }
    fn publish_motor_speeds(&mut self, speeds: &[f64]) {
        self.speeds.push(speeds.to_vec());
    }
    fn has_joint(&self, joint: &str) -> bool {
        joint == "rotor_0_joint"
    }
    fn joint_velocity(&self, _joint: &str) -> f64 {
        0.0
    }
    fn joint_position(&self, _joint: &str) -> f64 {
        0.0
    }
    fn set_joint_force(&mut self, joint: &str, force: f64) {
        self.forces.push((joint.to_owned(), force));
    }
    fn set_joint_position(&mut self, _joint: &str, _position: f64) {}
    fn publish_joint_target(&mut self, _topic: &str, _target: f64) {}
}

fn autopilot_socket() -> UdpSocket {
    let socket = UdpSocket::bind(SocketAddr::from((Ipv4Addr::LOCALHOST, 0))).unwrap();
    socket
        .set_read_timeout(Some(Duration::from_secs(2)))
        .unwrap();
    socket
}

fn bridge_config(autopilot_port: u16) -> BridgeConfig {
    let mut config = BridgeConfig::default();
    config.transport.bind_addr = Ipv4Addr::LOCALHOST.into();
    config.transport.autopilot_port = autopilot_port;
    config.transport.poll_timeout = Some(Duration::from_millis(500));
    config.sensors.noise_seed = Some(3);
    config.channels.push(ChannelConfig {
        input_index: 0,
        input_scaling: 1000.0,
        zero_position_armed: 100.0,
        joint_control_type: Some("velocity".to_owned()),
        joint_name: Some("rotor_0_joint".to_owned()),
        pid: Some(PidGains {
            p: 0.01,
            ..PidGains::default()
        }),
        ..ChannelConfig::default()
    });
    config
}

fn receive_messages(socket: &UdpSocket, count: usize) -> Vec<Message> {
    let mut parser = FrameParser::new();
    let mut messages = Vec::new();
    let mut buf = [0u8; 2048];
    while messages.len() < count {
        let (len, _) = socket.recv_from(&mut buf).expect("datagram from bridge");
        for frame in parser.decode_slice(&buf[..len]) {
            messages.push(frame.message().unwrap());
        }
    }
    messages
}

#[test]
fn sensors_reach_autopilot() {
    let autopilot = autopilot_socket();
    let mut bridge = HilBridge::new(bridge_config(autopilot.local_addr().unwrap().port())).unwrap();

    bridge.on_imu(1.0, &ImuSample::default(), &ModelState::default());
    bridge.on_gps(&GpsSample {
        time: 1.0,
        latitude_deg: 47.397_742,
        longitude_deg: 8.545_594,
        altitude: 488.0,
        ..GpsSample::default()
    });

    let messages = receive_messages(&autopilot, 3);
    assert!(matches!(messages[0], Message::HilSensor(_)));
    assert!(matches!(messages[1], Message::HilStateQuaternion(_)));
    let Message::HilGps(gps) = messages[2] else {
        panic!("expected HIL_GPS, got {:?}", messages[2]);
    };
    assert!((gps.lat - 473_977_420).abs() <= 1);
    assert_eq!(bridge.transport_stats().datagram.frames_sent, 3);
}

#[test]
fn actuator_commands_drive_joints() {
    let autopilot = autopilot_socket();
    let mut bridge = HilBridge::new(bridge_config(autopilot.local_addr().unwrap().port())).unwrap();
    let bridge_addr = bridge.local_addr().unwrap();

    let mut host = RecordingHost {
        time: 10.0,
        ..RecordingHost::default()
    };
    // Nothing received yet: no actuation, nothing published.
    bridge.step(&mut host);
    assert!(host.forces.is_empty());
    assert!(host.speeds.is_empty());

    let controls = HilActuatorControls {
        time_usec: 0,
        flags: 0,
        controls: [0.5; 16],
        mode: ModeFlags::default().with(ModeFlags::SAFETY_ARMED),
    };
    let frame = encode_frame(ProtocolVersion::V2, 0, 1, 1, &controls.into(), None);
    autopilot.send_to(&frame, bridge_addr).unwrap();

    host.time = 10.004;
    assert_eq!(bridge.step(&mut host), 1);
    assert!(bridge.vehicle_state().armed);
    assert!((host.speeds[0][0] - 600.0).abs() < 1e-3);
    // Joint at rest, reference 600: error -600, p 0.01 -> force 6.
    assert_eq!(host.forces.len(), 1);
    assert!((host.forces[0].1 - 6.0).abs() < 1e-6);

    // Command goes stale after 0.2 s.
    host.time = 10.3;
    bridge.step(&mut host);
    assert!(host.speeds.last().unwrap().iter().all(|s| *s == 0.0));
}

#[test]
fn first_step_seeds_clock_before_actuating() {
    let autopilot = autopilot_socket();
    let mut bridge = HilBridge::new(bridge_config(autopilot.local_addr().unwrap().port())).unwrap();
    let bridge_addr = bridge.local_addr().unwrap();

    let controls = HilActuatorControls {
        time_usec: 0,
        flags: 0,
        controls: [0.5; 16],
        mode: ModeFlags::default().with(ModeFlags::SAFETY_ARMED),
    };
    let frame = encode_frame(ProtocolVersion::V2, 0, 1, 1, &controls.into(), None);
    autopilot.send_to(&frame, bridge_addr).unwrap();

    let mut host = RecordingHost {
        time: 10.0,
        ..RecordingHost::default()
    };
    // Command already waiting, but there is no time step to integrate over.
    assert_eq!(bridge.step(&mut host), 1);
    assert!(bridge.vehicle_state().armed);
    assert!(host.forces.is_empty());
    assert!((host.speeds[0][0] - 600.0).abs() < 1e-3);

    // A repeated timestamp holds the joints as well.
    bridge.step(&mut host);
    assert!(host.forces.is_empty());

    host.time = 10.004;
    bridge.step(&mut host);
    assert_eq!(host.forces.len(), 1);
    assert!((host.forces[0].1 - 6.0).abs() < 1e-6);
}
