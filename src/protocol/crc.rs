//! CRC-16/MCRF4XX ("X.25") checksum used by MAVLink frames.

/// Initial accumulator value.
pub const X25_INIT: u16 = 0xFFFF;

/// Fold one byte into a running checksum.
#[inline]
#[must_use]
pub const fn crc_accumulate(byte: u8, crc: u16) -> u16 {
    let mut tmp = byte ^ (crc & 0xFF) as u8;
    tmp ^= tmp << 4;
    let tmp = tmp as u16;
    (crc >> 8) ^ (tmp << 8) ^ (tmp << 3) ^ (tmp >> 4)
}

/// Checksum a frame body and seed it with the message's `CRC_EXTRA` byte.
///
/// `body` is everything after the start-of-frame sentinel up to (not
/// including) the checksum trailer.
#[must_use]
pub fn x25_checksum(body: &[u8], crc_extra: u8) -> u16 {
    let crc = body
        .iter()
        .fold(X25_INIT, |crc, &byte| crc_accumulate(byte, crc));
    crc_accumulate(crc_extra, crc)
}
