//! Checksum seeds of the common dialect
//!
//! The bridge only decodes the HIL set, but it relays everything else
//! between the GCS and the flight controller. Relayed frames still have to
//! pass checksum validation, so the parser needs the CRC_EXTRA of every
//! message it may forward.

/// Validation data for one message id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct DialectEntry {
    pub id: u32,
    pub crc_extra: u8,
    /// Payload length of the base field set; v1 frames never carry less.
    pub min_len: u8,
}

const fn entry(id: u32, crc_extra: u8, min_len: u8) -> DialectEntry {
    DialectEntry {
        id,
        crc_extra,
        min_len,
    }
}

/// Sorted by id.
static COMMON: &[DialectEntry] = &[
    entry(0, 50, 9),     // HEARTBEAT
    entry(1, 124, 31),   // SYS_STATUS
    entry(2, 137, 12),   // SYSTEM_TIME
    entry(4, 237, 14),   // PING
    entry(11, 89, 6),    // SET_MODE
    entry(20, 214, 20),  // PARAM_REQUEST_READ
    entry(21, 159, 2),   // PARAM_REQUEST_LIST
    entry(22, 220, 25),  // PARAM_VALUE
    entry(23, 168, 23),  // PARAM_SET
    entry(24, 24, 30),   // GPS_RAW_INT
    entry(26, 170, 22),  // SCALED_IMU
    entry(27, 144, 26),  // RAW_IMU
    entry(29, 115, 14),  // SCALED_PRESSURE
    entry(30, 39, 28),   // ATTITUDE
    entry(31, 246, 32),  // ATTITUDE_QUATERNION
    entry(32, 185, 28),  // LOCAL_POSITION_NED
    entry(33, 104, 28),  // GLOBAL_POSITION_INT
    entry(35, 244, 22),  // RC_CHANNELS_RAW
    entry(36, 222, 21),  // SERVO_OUTPUT_RAW
    entry(39, 254, 37),  // MISSION_ITEM
    entry(40, 230, 4),   // MISSION_REQUEST
    entry(41, 28, 4),    // MISSION_SET_CURRENT
    entry(42, 28, 2),    // MISSION_CURRENT
    entry(43, 132, 2),   // MISSION_REQUEST_LIST
    entry(44, 221, 4),   // MISSION_COUNT
    entry(45, 232, 2),   // MISSION_CLEAR_ALL
    entry(46, 11, 2),    // MISSION_ITEM_REACHED
    entry(47, 153, 3),   // MISSION_ACK
    entry(48, 41, 13),   // SET_GPS_GLOBAL_ORIGIN
    entry(49, 39, 12),   // GPS_GLOBAL_ORIGIN
    entry(51, 196, 4),   // MISSION_REQUEST_INT
    entry(62, 183, 26),  // NAV_CONTROLLER_OUTPUT
    entry(65, 118, 42),  // RC_CHANNELS
    entry(66, 148, 6),   // REQUEST_DATA_STREAM
    entry(69, 243, 11),  // MANUAL_CONTROL
    entry(70, 124, 18),  // RC_CHANNELS_OVERRIDE
    entry(73, 38, 37),   // MISSION_ITEM_INT
    entry(74, 20, 20),   // VFR_HUD
    entry(75, 158, 35),  // COMMAND_INT
    entry(76, 152, 33),  // COMMAND_LONG
    entry(77, 143, 3),   // COMMAND_ACK
    entry(82, 49, 39),   // SET_ATTITUDE_TARGET
    entry(83, 22, 37),   // ATTITUDE_TARGET
    entry(84, 143, 53),  // SET_POSITION_TARGET_LOCAL_NED
    entry(85, 140, 51),  // POSITION_TARGET_LOCAL_NED
    entry(86, 5, 53),    // SET_POSITION_TARGET_GLOBAL_INT
    entry(87, 150, 51),  // POSITION_TARGET_GLOBAL_INT
    entry(93, 47, 81),   // HIL_ACTUATOR_CONTROLS
    entry(102, 158, 32), // VISION_POSITION_ESTIMATE
    entry(105, 93, 62),  // HIGHRES_IMU
    entry(107, 108, 64), // HIL_SENSOR
    entry(109, 185, 9),  // RADIO_STATUS
    entry(110, 84, 254), // FILE_TRANSFER_PROTOCOL
    entry(111, 34, 16),  // TIMESYNC
    entry(113, 124, 36), // HIL_GPS
    entry(114, 237, 44), // HIL_OPTICAL_FLOW
    entry(115, 4, 64),   // HIL_STATE_QUATERNION
    entry(116, 76, 22),  // SCALED_IMU2
    entry(117, 128, 6),  // LOG_REQUEST_LIST
    entry(118, 56, 14),  // LOG_ENTRY
    entry(119, 116, 12), // LOG_REQUEST_DATA
    entry(120, 134, 97), // LOG_DATA
    entry(121, 237, 2),  // LOG_ERASE
    entry(122, 203, 2),  // LOG_REQUEST_END
    entry(124, 87, 35),  // GPS2_RAW
    entry(125, 203, 6),  // POWER_STATUS
    entry(126, 220, 79), // SERIAL_CONTROL
    entry(132, 85, 14),  // DISTANCE_SENSOR
    entry(136, 1, 22),   // TERRAIN_REPORT
    entry(137, 195, 14), // SCALED_PRESSURE2
    entry(141, 47, 32),  // ALTITUDE
    entry(147, 154, 36), // BATTERY_STATUS
    entry(148, 178, 60), // AUTOPILOT_VERSION
    entry(149, 200, 30), // LANDING_TARGET
    entry(230, 163, 42), // ESTIMATOR_STATUS
    entry(241, 90, 32),  // VIBRATION
    entry(242, 104, 52), // HOME_POSITION
    entry(243, 85, 53),  // SET_HOME_POSITION
    entry(244, 95, 6),   // MESSAGE_INTERVAL
    entry(245, 130, 2),  // EXTENDED_SYS_STATE
    entry(246, 184, 38), // ADSB_VEHICLE
    entry(253, 83, 51),  // STATUSTEXT
    entry(254, 46, 9),   // DEBUG
    entry(300, 217, 22), // PROTOCOL_VERSION
    entry(331, 91, 230), // ODOMETRY
];

/// Look up the validation data for a wire id.
pub(crate) fn lookup(id: u32) -> Option<DialectEntry> {
    COMMON
        .binary_search_by_key(&id, |entry| entry.id)
        .ok()
        .map(|index| COMMON[index])
}

/// Frame an arbitrary payload the way a GCS or autopilot would, for ids
/// outside the typed message set.
#[cfg(test)]
pub(crate) fn encode_raw(
    version: super::ProtocolVersion,
    sequence: u8,
    message_id: u32,
    payload: &[u8],
) -> Vec<u8> {
    use super::{FrameHeader, IncompatFlags, x25_checksum};

    let crc_extra = lookup(message_id).map_or(0, |entry| entry.crc_extra);
    let header = FrameHeader {
        version,
        payload_len: u8::try_from(payload.len()).unwrap(),
        incompat_flags: IncompatFlags::default(),
        compat_flags: 0,
        sequence,
        system_id: 255,
        component_id: 190,
        message_id,
    };
    let mut out = Vec::new();
    header.write_to(&mut out).unwrap();
    out.extend_from_slice(payload);
    let crc = x25_checksum(&out[1..], crc_extra);
    out.extend_from_slice(&crc.to_le_bytes());
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::MessageId;

    #[test]
    fn table_is_sorted_and_unique() {
        assert!(COMMON.windows(2).all(|pair| pair[0].id < pair[1].id));
    }

    #[test]
    fn hil_ids_agree_with_typed_table() {
        for id in MessageId::ALL {
            let entry = lookup(id.as_u32()).unwrap();
            assert_eq!(entry.crc_extra, id.crc_extra(), "{id}");
            assert_eq!(usize::from(entry.min_len), id.base_len(), "{id}");
        }
    }

    #[test]
    fn relay_only_ids_resolve() {
        assert_eq!(lookup(76).map(|e| e.crc_extra), Some(152));
        assert_eq!(lookup(30).map(|e| e.min_len), Some(28));
        assert_eq!(lookup(9999), None);
    }
}
