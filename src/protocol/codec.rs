//! Frame codec (encode / incremental decode)
//!
//! The decoder is a byte-at-a-time state machine so it can sit behind a
//! stream (serial) as easily as behind a datagram socket. Malformed frames
//! are dropped and the parser resynchronizes on the next sentinel.

use bytes::Bytes;
use tracing::{debug, trace};

use super::dialect;
use super::signing::signing_timestamp_now;
use super::{
    CHECKSUM_LEN, DEFAULT_COMPONENT_ID, DEFAULT_SYSTEM_ID, Error, Frame, FrameHeader,
    IncompatFlags, MAX_FRAME_LEN, Message, ParserStats, ProtocolVersion, Result,
    SIGNATURE_BLOCK_LEN, Signature, SigningKey, x25_checksum,
};

/// Outcome of feeding one byte to a [`FrameParser`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Framing {
    /// More bytes are needed
    Incomplete,
    /// A complete, validated frame
    Ok(Frame),
    /// A frame completed but failed validation and was discarded
    BadChecksum,
    /// A signed frame completed but its signature did not verify
    BadSignature,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Header(ProtocolVersion),
    Body,
}

/// Incremental frame parser. One instance per inbound byte stream.
#[derive(Debug)]
pub struct FrameParser {
    phase: Phase,
    buf: Vec<u8>,
    expected: usize,
    header: Option<FrameHeader>,
    signing: Option<SigningKey>,
    stats: ParserStats,
}

impl Default for FrameParser {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameParser {
    /// Create a parser that accepts signed and unsigned frames without
    /// verifying signatures.
    #[must_use]
    pub fn new() -> Self {
        Self {
            phase: Phase::Idle,
            buf: Vec::with_capacity(MAX_FRAME_LEN),
            expected: 0,
            header: None,
            signing: None,
            stats: ParserStats::default(),
        }
    }

    /// Verify signatures of signed frames against `key`.
    #[must_use]
    pub fn with_signing(mut self, key: SigningKey) -> Self {
        self.signing = Some(key);
        self
    }

    /// Counters accumulated since construction
    #[must_use]
    pub const fn stats(&self) -> ParserStats {
        self.stats
    }

    /// Drop any partially assembled frame.
    pub fn reset(&mut self) {
        self.phase = Phase::Idle;
        self.buf.clear();
        self.expected = 0;
        self.header = None;
    }

    /// Feed a single byte.
    pub fn decode_byte(&mut self, byte: u8) -> Framing {
        match self.phase {
            Phase::Idle => {
                self.start(byte);
                Framing::Incomplete
            }
            Phase::Header(version) => {
                self.buf.push(byte);
                // Unknown incompat bits make the rest of the frame unparseable.
                if version == ProtocolVersion::V2
                    && self.buf.len() == 3
                    && IncompatFlags::from_u8(byte).is_none()
                {
                    debug!(flags = byte, "unsupported incompat flags, resynchronizing");
                    return self.reject(byte, Framing::BadChecksum);
                }
                if self.buf.len() == version.header_len() {
                    match FrameHeader::parse(&self.buf) {
                        Ok(header) => {
                            self.expected = header.len()
                                + usize::from(header.payload_len)
                                + CHECKSUM_LEN
                                + if header.is_signed() { SIGNATURE_BLOCK_LEN } else { 0 };
                            self.header = Some(header);
                            self.phase = Phase::Body;
                        }
                        Err(err) => {
                            debug!(%err, "bad header, resynchronizing");
                            return self.reject(byte, Framing::BadChecksum);
                        }
                    }
                }
                Framing::Incomplete
            }
            Phase::Body => {
                self.buf.push(byte);
                if self.buf.len() < self.expected {
                    return Framing::Incomplete;
                }
                match self.finish() {
                    Framing::Ok(frame) => {
                        self.stats.frames_ok += 1;
                        self.reset();
                        Framing::Ok(frame)
                    }
                    failure => self.reject(byte, failure),
                }
            }
        }
    }

    /// Feed a whole buffer, collecting every frame it completes.
    pub fn decode_slice(&mut self, bytes: &[u8]) -> Vec<Frame> {
        bytes
            .iter()
            .filter_map(|&byte| match self.decode_byte(byte) {
                Framing::Ok(frame) => Some(frame),
                _ => None,
            })
            .collect()
    }

    fn start(&mut self, byte: u8) {
        if let Some(version) = ProtocolVersion::from_sentinel(byte) {
            self.buf.clear();
            self.buf.push(byte);
            self.phase = Phase::Header(version);
        } else {
            self.stats.bytes_skipped += 1;
        }
    }

    fn reject(&mut self, byte: u8, outcome: Framing) -> Framing {
        match outcome {
            Framing::BadSignature => self.stats.signature_errors += 1,
            _ => self.stats.checksum_errors += 1,
        }
        self.reset();
        // The offending byte may itself open the next frame.
        if ProtocolVersion::from_sentinel(byte).is_some() {
            self.start(byte);
        }
        outcome
    }

    fn finish(&self) -> Framing {
        match self.validate() {
            Ok(frame) => Framing::Ok(frame),
            Err(err @ Error::SignatureMismatch { .. }) => {
                debug!(%err, "dropping frame");
                Framing::BadSignature
            }
            Err(err @ Error::UnknownMessage { .. }) => {
                trace!(%err, "cannot validate frame");
                Framing::BadChecksum
            }
            Err(err) => {
                debug!(%err, "dropping frame");
                Framing::BadChecksum
            }
        }
    }

    /// Check a fully buffered frame against the dialect table and the
    /// signing key.
    fn validate(&self) -> Result<Frame> {
        let header = self.header.ok_or(Error::BufferTooSmall {
            needed: self.expected,
            got: self.buf.len(),
        })?;
        let entry = dialect::lookup(header.message_id).ok_or(Error::UnknownMessage {
            id: header.message_id,
        })?;
        if header.version == ProtocolVersion::V1 && header.payload_len < entry.min_len {
            return Err(Error::TruncatedPayload {
                id: header.message_id,
                len: header.payload_len,
                min: entry.min_len,
            });
        }

        let crc_end = header.len() + usize::from(header.payload_len);
        let found = u16::from_le_bytes([self.buf[crc_end], self.buf[crc_end + 1]]);
        let expected = x25_checksum(&self.buf[1..crc_end], entry.crc_extra);
        if found != expected {
            return Err(Error::ChecksumMismatch { expected, found });
        }

        let signature = if header.is_signed() {
            let start = crc_end + CHECKSUM_LEN;
            let mut block = [0u8; SIGNATURE_BLOCK_LEN];
            block.copy_from_slice(&self.buf[start..start + SIGNATURE_BLOCK_LEN]);
            let signature = Signature::from_block(&block);
            if let Some(key) = &self.signing {
                if !key.verify(&self.buf[..start], &signature) {
                    return Err(Error::SignatureMismatch {
                        link_id: signature.link_id,
                    });
                }
            }
            Some(signature)
        } else {
            None
        };

        Ok(Frame::from_parts(
            header,
            found,
            signature,
            Bytes::copy_from_slice(&self.buf),
        ))
    }
}

/// Encode one message into a complete frame.
///
/// v1 frames carry only the base fields; v2 frames drop trailing zero bytes
/// from the payload. `signing` is ignored for v1.
#[must_use]
pub fn encode_frame(
    version: ProtocolVersion,
    sequence: u8,
    system_id: u8,
    component_id: u8,
    message: &Message,
    signing: Option<(&SigningKey, u64)>,
) -> Vec<u8> {
    let id = message.id();
    let mut payload = message.pack();
    match version {
        ProtocolVersion::V1 => payload.truncate(id.base_len()),
        ProtocolVersion::V2 => {
            let used = payload.iter().rposition(|&b| b != 0).map_or(1, |pos| pos + 1);
            payload.truncate(used);
        }
    }

    let signing = signing.filter(|_| version == ProtocolVersion::V2);
    let header = FrameHeader {
        version,
        // Every payload in the HIL set is shorter than 256 bytes.
        payload_len: u8::try_from(payload.len()).unwrap_or(u8::MAX),
        incompat_flags: if signing.is_some() {
            IncompatFlags::signed()
        } else {
            IncompatFlags::default()
        },
        compat_flags: 0,
        sequence,
        system_id,
        component_id,
        message_id: id.as_u32(),
    };

    let mut out = Vec::with_capacity(
        header.len() + payload.len() + CHECKSUM_LEN + SIGNATURE_BLOCK_LEN,
    );
    let written = header.write_to(&mut out);
    debug_assert!(written.is_ok(), "HIL message ids fit every header version");
    out.extend_from_slice(&payload);
    let crc = x25_checksum(&out[1..], id.crc_extra());
    out.extend_from_slice(&crc.to_le_bytes());

    if let Some((key, timestamp)) = signing {
        let signature = Signature {
            link_id: key.link_id(),
            timestamp,
            value: key.sign(&out, key.link_id(), timestamp),
        };
        out.extend_from_slice(&signature.to_block());
    }
    out
}

/// Stateful encoder: owns the sequence counter and the sender identity.
#[derive(Debug, Clone)]
pub struct FrameEncoder {
    version: ProtocolVersion,
    system_id: u8,
    component_id: u8,
    sequence: u8,
    signing: Option<SigningKey>,
    last_timestamp: u64,
}

impl Default for FrameEncoder {
    fn default() -> Self {
        Self::new(ProtocolVersion::default())
    }
}

impl FrameEncoder {
    /// Encoder with the bridge's default system and component ids.
    #[must_use]
    pub const fn new(version: ProtocolVersion) -> Self {
        Self {
            version,
            system_id: DEFAULT_SYSTEM_ID,
            component_id: DEFAULT_COMPONENT_ID,
            sequence: 0,
            signing: None,
            last_timestamp: 0,
        }
    }

    /// Override the sender identity.
    #[must_use]
    pub const fn with_ids(mut self, system_id: u8, component_id: u8) -> Self {
        self.system_id = system_id;
        self.component_id = component_id;
        self
    }

    /// Sign outgoing v2 frames.
    #[must_use]
    pub fn with_signing(mut self, key: SigningKey) -> Self {
        self.signing = Some(key);
        self
    }

    /// Outbound protocol version
    #[must_use]
    pub const fn version(&self) -> ProtocolVersion {
        self.version
    }

    /// Sequence number the next frame will carry
    #[must_use]
    pub const fn next_sequence(&self) -> u8 {
        self.sequence
    }

    /// Encode a message, advancing the sequence counter.
    pub fn encode(&mut self, message: &Message) -> Vec<u8> {
        let sequence = self.sequence;
        self.sequence = self.sequence.wrapping_add(1);

        let timestamp = match self.signing {
            Some(_) if self.version == ProtocolVersion::V2 => {
                // Signing timestamps must strictly increase per link.
                let now = signing_timestamp_now().max(self.last_timestamp + 1);
                self.last_timestamp = now;
                now
            }
            _ => 0,
        };

        encode_frame(
            self.version,
            sequence,
            self.system_id,
            self.component_id,
            message,
            self.signing.as_ref().map(|key| (key, timestamp)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{
        Heartbeat, HilActuatorControls, HilGps, HilSensor, ModeFlags, STX_V1, STX_V2, encode_raw,
    };

    fn sensor() -> Message {
        HilSensor {
            time_usec: 1_000_000,
            xacc: 0.1,
            zacc: -9.81,
            abs_pressure: 1013.25,
            temperature: 15.0,
            fields_updated: 4095,
            ..Default::default()
        }
        .into()
    }

    fn decode_all(parser: &mut FrameParser, bytes: &[u8]) -> Vec<Framing> {
        bytes
            .iter()
            .map(|&b| parser.decode_byte(b))
            .filter(|f| *f != Framing::Incomplete)
            .collect()
    }

    #[test]
    fn test_v1_roundtrip() {
        let bytes = encode_frame(ProtocolVersion::V1, 7, 1, 200, &sensor(), None);
        assert_eq!(bytes[0], STX_V1);
        assert_eq!(bytes.len(), 6 + 64 + 2);

        let mut parser = FrameParser::new();
        let frames = parser.decode_slice(&bytes);
        assert_eq!(frames.len(), 1);
        let frame = &frames[0];
        assert_eq!(frame.header().sequence, 7);
        assert_eq!(frame.header().component_id, 200);
        assert_eq!(frame.message().unwrap(), sensor());
        assert_eq!(frame.raw().as_ref(), bytes.as_slice());
    }

    #[test]
    fn test_v2_truncates_trailing_zeros() {
        let msg: Message = HilGps {
            time_usec: 5,
            ..Default::default()
        }
        .into();
        let bytes = encode_frame(ProtocolVersion::V2, 0, 1, 200, &msg, None);
        assert_eq!(bytes[0], STX_V2);
        assert_eq!(bytes[1], 1);

        let mut parser = FrameParser::new();
        let frames = parser.decode_slice(&bytes);
        assert_eq!(frames[0].message().unwrap(), msg);
    }

    #[test]
    fn test_v2_all_zero_payload_keeps_one_byte() {
        let msg: Message = Heartbeat::default().into();
        let bytes = encode_frame(ProtocolVersion::V2, 0, 1, 200, &msg, None);
        assert_eq!(bytes[1], 1);
        let frames = FrameParser::new().decode_slice(&bytes);
        assert_eq!(frames[0].message().unwrap(), msg);
    }

    #[test]
    fn test_checksum_mismatch_is_reported() {
        let mut bytes = encode_frame(ProtocolVersion::V1, 0, 1, 200, &sensor(), None);
        let last = bytes.len() - 1;
        bytes[last] ^= 0x55;

        let mut parser = FrameParser::new();
        assert_eq!(decode_all(&mut parser, &bytes), vec![Framing::BadChecksum]);
        assert_eq!(parser.stats().checksum_errors, 1);
    }

    #[test]
    fn test_checksum_mismatch_carries_both_values() {
        let bytes = encode_frame(ProtocolVersion::V2, 0, 1, 200, &sensor(), None);
        let (body, last) = bytes.split_at(bytes.len() - 1);

        let mut parser = FrameParser::new();
        assert!(parser.decode_slice(body).is_empty());
        parser.buf.push(last[0] ^ 0x55);
        let found = u16::from_le_bytes([bytes[bytes.len() - 2], last[0] ^ 0x55]);
        let expected = u16::from_le_bytes([bytes[bytes.len() - 2], last[0]]);
        assert_eq!(
            parser.validate(),
            Err(Error::ChecksumMismatch { expected, found })
        );
    }

    #[test]
    fn test_unknown_message_id_is_bad_checksum() {
        let bytes = encode_raw(ProtocolVersion::V2, 0, 9999, &[1, 2, 3]);
        let mut parser = FrameParser::new();
        assert_eq!(decode_all(&mut parser, &bytes), vec![Framing::BadChecksum]);
        assert_eq!(parser.stats().checksum_errors, 1);
    }

    #[test]
    fn test_misdeclared_message_id_is_bad_checksum() {
        let mut bytes = encode_frame(ProtocolVersion::V1, 0, 1, 200, &sensor(), None);
        bytes[5] = 1;
        let mut parser = FrameParser::new();
        assert_eq!(decode_all(&mut parser, &bytes), vec![Framing::BadChecksum]);
    }

    #[test]
    fn test_common_dialect_frame_validates_for_relay() {
        // COMMAND_LONG: outside the typed set but must reach the other link.
        let payload: Vec<u8> = (0..33).collect();
        let bytes = encode_raw(ProtocolVersion::V1, 3, 76, &payload);

        let mut parser = FrameParser::new();
        let outcomes = decode_all(&mut parser, &bytes);
        let [Framing::Ok(frame)] = outcomes.as_slice() else {
            panic!("expected one frame, got {outcomes:?}");
        };
        assert_eq!(frame.raw().as_ref(), bytes.as_slice());
        assert_eq!(frame.payload().as_ref(), payload.as_slice());
        assert_eq!(frame.message(), Err(Error::UnknownMessage { id: 76 }));
        assert_eq!(parser.stats().frames_ok, 1);
    }

    #[test]
    fn test_short_v1_payload_is_rejected() {
        let bytes = encode_raw(ProtocolVersion::V1, 0, 30, &[7; 20]);
        let (body, last) = bytes.split_at(bytes.len() - 1);

        let mut parser = FrameParser::new();
        assert!(parser.decode_slice(body).is_empty());
        parser.buf.push(last[0]);
        assert_eq!(
            parser.validate(),
            Err(Error::TruncatedPayload { id: 30, len: 20, min: 28 })
        );

        // v2 may trim the same payload.
        let trimmed = encode_raw(ProtocolVersion::V2, 0, 30, &[7; 20]);
        assert_eq!(FrameParser::new().decode_slice(&trimmed).len(), 1);
    }

    #[test]
    fn test_unsupported_incompat_flags_resync() {
        let good = encode_frame(ProtocolVersion::V2, 0, 1, 200, &sensor(), None);
        let mut bad = good.clone();
        bad[2] = 0x04;

        let mut stream = bad[..3].to_vec();
        stream.extend_from_slice(&good);
        let mut parser = FrameParser::new();
        let outcomes = decode_all(&mut parser, &stream);
        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0], Framing::BadChecksum);
        assert!(matches!(outcomes[1], Framing::Ok(_)));
    }

    #[test]
    fn test_garbage_before_frame_is_skipped() {
        let frame = encode_frame(ProtocolVersion::V1, 0, 1, 200, &sensor(), None);
        let mut stream = vec![0x00, 0x11, 0x22];
        stream.extend_from_slice(&frame);

        let mut parser = FrameParser::new();
        assert_eq!(parser.decode_slice(&stream).len(), 1);
        assert_eq!(parser.stats().bytes_skipped, 3);
        assert_eq!(parser.stats().frames_ok, 1);
    }

    #[test]
    fn test_signed_frame_verifies() {
        let key = SigningKey::new([0x42; 32], 1);
        let mut encoder = FrameEncoder::new(ProtocolVersion::V2).with_signing(key.clone());
        let msg: Message = HilActuatorControls {
            time_usec: 10,
            mode: ModeFlags::default().with(ModeFlags::SAFETY_ARMED),
            ..Default::default()
        }
        .into();
        let bytes = encoder.encode(&msg);
        assert_eq!(bytes[2], IncompatFlags::SIGNED);

        let mut parser = FrameParser::new().with_signing(key);
        let frames = parser.decode_slice(&bytes);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].signature().map(|s| s.link_id), Some(1));
        assert_eq!(frames[0].message().unwrap(), msg);
    }

    #[test]
    fn test_signed_frame_with_wrong_key() {
        let mut encoder =
            FrameEncoder::new(ProtocolVersion::V2).with_signing(SigningKey::new([1; 32], 0));
        let bytes = encoder.encode(&sensor());

        let mut parser = FrameParser::new().with_signing(SigningKey::new([2; 32], 0));
        let (body, last) = bytes.split_at(bytes.len() - 1);
        assert!(parser.decode_slice(body).is_empty());
        parser.buf.push(last[0]);
        assert_eq!(parser.validate(), Err(Error::SignatureMismatch { link_id: 0 }));

        parser.reset();
        assert_eq!(decode_all(&mut parser, &bytes), vec![Framing::BadSignature]);
        assert_eq!(parser.stats().signature_errors, 1);

        // Without a key the same frame is accepted as-is.
        let mut open = FrameParser::new();
        assert_eq!(open.decode_slice(&bytes).len(), 1);
    }

    #[test]
    fn test_encoder_sequence_wraps() {
        let mut encoder = FrameEncoder::default();
        for _ in 0..255 {
            encoder.encode(&sensor());
        }
        assert_eq!(encoder.next_sequence(), 255);
        let bytes = encoder.encode(&sensor());
        assert_eq!(bytes[2], 255);
        assert_eq!(encoder.next_sequence(), 0);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn version_strategy() -> impl Strategy<Value = ProtocolVersion> {
            prop_oneof![Just(ProtocolVersion::V1), Just(ProtocolVersion::V2)]
        }

        fn stream(version: ProtocolVersion, count: usize) -> (Vec<u8>, Vec<Message>, Vec<usize>) {
            let mut encoder = FrameEncoder::new(version);
            let mut bytes = Vec::new();
            let mut messages = Vec::new();
            let mut lengths = Vec::new();
            for i in 0..count {
                let msg: Message = HilSensor {
                    time_usec: i as u64 + 1,
                    xgyro: i as f32 * 0.5,
                    ..Default::default()
                }
                .into();
                let frame = encoder.encode(&msg);
                lengths.push(frame.len());
                bytes.extend(frame);
                messages.push(msg);
            }
            (bytes, messages, lengths)
        }

        proptest! {
            /// Property: splitting a stream at arbitrary points yields the same frames
            #[test]
            fn prop_chunking_is_irrelevant(
                version in version_strategy(),
                count in 1usize..8,
                cuts in prop::collection::vec(any::<prop::sample::Index>(), 0..10),
            ) {
                let (bytes, messages, _) = stream(version, count);
                let mut points: Vec<usize> = cuts.iter().map(|c| c.index(bytes.len())).collect();
                points.sort_unstable();

                let mut parser = FrameParser::new();
                let mut decoded = Vec::new();
                let mut last = 0;
                for point in points.into_iter().chain(std::iter::once(bytes.len())) {
                    decoded.extend(parser.decode_slice(&bytes[last..point]));
                    last = point;
                }

                let decoded: Vec<Message> = decoded.iter().map(|f| f.message().unwrap()).collect();
                prop_assert_eq!(decoded, messages);
            }

            /// Property: a corrupted payload or checksum costs exactly one frame
            #[test]
            fn prop_resyncs_after_corruption(
                version in version_strategy(),
                offset in any::<prop::sample::Index>(),
                flip in 1u8..=255,
            ) {
                let (mut bytes, messages, lengths) = stream(version, 2);
                let header_len = version.header_len();
                bytes[header_len + offset.index(lengths[0] - header_len)] ^= flip;
                // A sentinel in the final byte legitimately opens a new frame.
                prop_assume!(ProtocolVersion::from_sentinel(bytes[lengths[0] - 1]).is_none());

                let mut parser = FrameParser::new();
                let frames = parser.decode_slice(&bytes);
                prop_assert_eq!(frames.len(), 1);
                prop_assert_eq!(frames[0].message().unwrap(), messages[1]);
                prop_assert_eq!(parser.stats().checksum_errors, 1);
            }
        }
    }
}
