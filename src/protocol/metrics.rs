use std::sync::atomic::{AtomicU64, Ordering};

/// Counters kept by a single [`FrameParser`](super::FrameParser).
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserStats {
    /// Frames that passed checksum (and signature) validation
    pub frames_ok: u64,
    /// Frames dropped for a bad checksum, unknown id or unsupported flags
    pub checksum_errors: u64,
    /// Signed frames whose signature did not verify
    pub signature_errors: u64,
    /// Bytes discarded while hunting for a start-of-frame sentinel
    pub bytes_skipped: u64,
}

/// Per-link traffic counters shared between the tick thread and the
/// serial workers.
#[derive(Debug, Default)]
pub(crate) struct LinkStats {
    frames_sent: AtomicU64,
    frames_received: AtomicU64,
    send_failures: AtomicU64,
    queue_drops: AtomicU64,
    inbound_drops: AtomicU64,
}

impl LinkStats {
    #[inline]
    pub(crate) fn record_sent(&self) {
        self.frames_sent.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_received(&self) {
        self.frames_received.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_send_failure(&self) {
        self.send_failures.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_queue_drop(&self) {
        self.queue_drops.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_inbound_drop(&self) {
        self.inbound_drops.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn snapshot(&self) -> LinkStatsSnapshot {
        LinkStatsSnapshot {
            frames_sent: self.frames_sent.load(Ordering::Relaxed),
            frames_received: self.frames_received.load(Ordering::Relaxed),
            send_failures: self.send_failures.load(Ordering::Relaxed),
            queue_drops: self.queue_drops.load(Ordering::Relaxed),
            inbound_drops: self.inbound_drops.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of a link's counters.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkStatsSnapshot {
    /// Frames handed to the link for transmission
    pub frames_sent: u64,
    /// Valid frames read from the link
    pub frames_received: u64,
    /// Sends that failed or were dropped because the link was closed
    pub send_failures: u64,
    /// Frames rejected by a full transmit queue
    pub queue_drops: u64,
    /// Received frames discarded because the consumer fell behind
    pub inbound_drops: u64,
}

impl LinkStatsSnapshot {
    /// Total frames that never made it onto the wire.
    #[must_use]
    pub const fn dropped(&self) -> u64 {
        self.send_failures + self.queue_drops
    }
}
