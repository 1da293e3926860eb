//! MAVLink v2 message signing.
//!
//! A signed frame carries a 13-byte block after the checksum:
//! `link_id(1) timestamp(6, LE, 10µs ticks since 2015-01-01) signature(6)`.
//! The signature is the first six bytes of
//! `SHA-256(secret ‖ header ‖ payload ‖ crc ‖ link_id ‖ timestamp)`.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use sha2::{Digest, Sha256};

/// Length of the signature block appended to signed frames.
pub const SIGNATURE_BLOCK_LEN: usize = 13;

/// Seconds between the Unix epoch and the MAVLink signing epoch (2015-01-01).
const SIGNING_EPOCH_OFFSET: Duration = Duration::from_secs(1_420_070_400);

const TIMESTAMP_MASK: u64 = 0xFFFF_FFFF_FFFF;

/// Shared secret plus the link id stamped on outgoing signatures.
#[derive(Clone, PartialEq, Eq)]
pub struct SigningKey {
    secret: [u8; 32],
    link_id: u8,
}

impl SigningKey {
    /// Build a key from a 32-byte secret.
    #[must_use]
    pub const fn new(secret: [u8; 32], link_id: u8) -> Self {
        Self { secret, link_id }
    }

    /// Link id written into outgoing signature blocks
    #[must_use]
    pub const fn link_id(&self) -> u8 {
        self.link_id
    }

    /// Compute the 6-byte signature over a signed frame prefix.
    ///
    /// `prefix` is the frame from the sentinel through the checksum.
    #[must_use]
    pub fn sign(&self, prefix: &[u8], link_id: u8, timestamp: u64) -> [u8; 6] {
        let ts = (timestamp & TIMESTAMP_MASK).to_le_bytes();
        let mut hasher = Sha256::new();
        hasher.update(self.secret);
        hasher.update(prefix);
        hasher.update([link_id]);
        hasher.update(&ts[..6]);
        let digest = hasher.finalize();
        let mut out = [0u8; 6];
        out.copy_from_slice(&digest[..6]);
        out
    }

    /// Check a received signature block against the frame prefix.
    #[must_use]
    pub fn verify(&self, prefix: &[u8], signature: &Signature) -> bool {
        self.sign(prefix, signature.link_id, signature.timestamp) == signature.value
    }
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKey")
            .field("link_id", &self.link_id)
            .finish_non_exhaustive()
    }
}

/// Parsed signature block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature {
    /// Link the frame was signed for
    pub link_id: u8,
    /// 48-bit timestamp in 10µs ticks since 2015-01-01
    pub timestamp: u64,
    /// Truncated SHA-256
    pub value: [u8; 6],
}

impl Signature {
    /// Parse a 13-byte signature block.
    #[must_use]
    pub fn from_block(block: &[u8; SIGNATURE_BLOCK_LEN]) -> Self {
        let mut ts = [0u8; 8];
        ts[..6].copy_from_slice(&block[1..7]);
        let mut value = [0u8; 6];
        value.copy_from_slice(&block[7..13]);
        Self {
            link_id: block[0],
            timestamp: u64::from_le_bytes(ts),
            value,
        }
    }

    /// Serialize into the 13-byte wire block.
    #[must_use]
    pub fn to_block(&self) -> [u8; SIGNATURE_BLOCK_LEN] {
        let mut block = [0u8; SIGNATURE_BLOCK_LEN];
        block[0] = self.link_id;
        block[1..7].copy_from_slice(&(self.timestamp & TIMESTAMP_MASK).to_le_bytes()[..6]);
        block[7..13].copy_from_slice(&self.value);
        block
    }
}

/// Current wall-clock time in signing ticks.
#[must_use]
pub(crate) fn signing_timestamp_now() -> u64 {
    let since_unix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    let since_epoch = since_unix.saturating_sub(SIGNING_EPOCH_OFFSET);
    u64::try_from(since_epoch.as_micros() / 10).unwrap_or(TIMESTAMP_MASK) & TIMESTAMP_MASK
}
