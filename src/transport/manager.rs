//! Transport facade: one datagram link, one optional serial link.

use std::time::Duration;

use tracing::{debug, error, instrument, warn};

#[cfg(feature = "debug-tools")]
use super::debug::TlogRecorder;
use super::error::TransportError;
use super::serial::SerialLink;
use super::socket::DatagramLink;
use crate::config::TransportConfig;
use crate::protocol::metrics::LinkStats;
use crate::protocol::{
    Frame, FrameEncoder, FrameParser, LinkStatsSnapshot, MAX_FRAME_LEN, Message, ParserStats,
};

/// Upper bound on datagrams consumed by a single poll.
const MAX_DATAGRAMS_PER_POLL: usize = 64;

/// Datagram receive buffer; comfortably above one frame.
const RECV_BUFFER_LEN: usize = 4 * MAX_FRAME_LEN;

/// Counters for both links.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TransportStats {
    /// Datagram link traffic
    pub datagram: LinkStatsSnapshot,
    /// Serial link traffic (zero when the link is disabled or failed to open)
    pub serial: LinkStatsSnapshot,
    /// Datagram parser counters
    pub parser: ParserStats,
}

/// Routes outbound frames and gathers inbound ones.
///
/// With the serial link disabled, everything goes over UDP to the flight
/// controller. With it enabled, autopilot traffic uses the serial port and the
/// UDP socket becomes a ground-station relay in both directions.
#[derive(Debug)]
pub struct TransportManager {
    datagram: DatagramLink,
    serial: Option<SerialLink>,
    serial_enabled: bool,
    parser: FrameParser,
    encoder: FrameEncoder,
    poll_timeout: Option<Duration>,
    stats: LinkStats,
    recv_buf: Vec<u8>,
    #[cfg(feature = "debug-tools")]
    tlog: Option<TlogRecorder>,
}

impl TransportManager {
    /// Bind the datagram socket and, if enabled, open the serial link.
    ///
    /// A serial open failure is logged and leaves the serial path closed;
    /// only a datagram bind failure is returned.
    #[instrument(level = "info", skip(config))]
    pub fn open(config: &TransportConfig) -> Result<Self, TransportError> {
        let (local, remote) = config.datagram_endpoints();
        let datagram = DatagramLink::bind(local, remote)
            .map_err(|source| TransportError::Bind { addr: local, source })?;

        let serial = if config.serial.enabled {
            match SerialLink::open(
                &config.serial,
                Some(datagram.clone()),
                config.signing.clone(),
            ) {
                Ok(link) => Some(link),
                Err(err) => {
                    error!(%err, "serial link unavailable, continuing on UDP only");
                    None
                }
            }
        } else {
            None
        };

        let mut parser = FrameParser::new();
        let mut encoder = FrameEncoder::new(config.protocol_version);
        if let Some(key) = &config.signing {
            parser = parser.with_signing(key.clone());
            encoder = encoder.with_signing(key.clone());
        }

        #[cfg(feature = "debug-tools")]
        let tlog = config.tlog_path.as_deref().and_then(|path| {
            TlogRecorder::create(path)
                .map_err(|err| warn!(%err, path = %path.display(), "cannot create tlog"))
                .ok()
        });

        Ok(Self {
            datagram,
            serial,
            serial_enabled: config.serial.enabled,
            parser,
            encoder,
            poll_timeout: config.poll_timeout,
            stats: LinkStats::default(),
            recv_buf: vec![0; RECV_BUFFER_LEN],
            #[cfg(feature = "debug-tools")]
            tlog,
        })
    }

    /// Local datagram address (useful when the port was OS-assigned).
    pub fn local_addr(&self) -> Result<std::net::SocketAddr, TransportError> {
        Ok(self.datagram.local_addr()?)
    }

    /// Whether autopilot traffic is routed over a live serial port
    #[must_use]
    pub fn serial_active(&self) -> bool {
        self.serial.as_ref().is_some_and(SerialLink::is_open)
    }

    /// Encode and send a message to the flight controller.
    #[instrument(level = "trace", skip(self, message), fields(id = %message.id()))]
    pub fn send(&mut self, message: &Message) -> Result<(), TransportError> {
        let frame = self.encoder.encode(message);
        self.send_frame(frame)
    }

    /// Send already-encoded frame bytes to the flight controller.
    pub fn send_frame(&mut self, frame: Vec<u8>) -> Result<(), TransportError> {
        #[cfg(feature = "debug-tools")]
        self.record(&frame);

        if self.serial_enabled {
            return match &self.serial {
                Some(link) => link.send(frame),
                None => {
                    error!("serial port closed, dropping frame");
                    Err(TransportError::SerialClosed)
                }
            };
        }

        match self.datagram.send(&frame) {
            Ok(_) => {
                self.stats.record_sent();
                Ok(())
            }
            Err(err) => {
                self.stats.record_send_failure();
                warn!(%err, "failed sending datagram");
                Err(err.into())
            }
        }
    }

    /// Collect inbound frames from both links and hand each to `handler`.
    ///
    /// Serial frames arrive first (they were already relayed to the ground
    /// station by the reader). Datagram frames are relayed onto the serial
    /// link, if one is active, before being handed over. Returns the number
    /// of frames dispatched.
    #[instrument(level = "trace", skip(self, handler))]
    pub fn poll(&mut self, mut handler: impl FnMut(Frame)) -> Result<usize, TransportError> {
        let mut dispatched = 0;

        if let Some(link) = &self.serial {
            for frame in link.drain() {
                #[cfg(feature = "debug-tools")]
                self.record(frame.raw());
                handler(frame);
                dispatched += 1;
            }
        }

        let mut wait = self.poll_timeout;
        for _ in 0..MAX_DATAGRAMS_PER_POLL {
            let Some(len) = self.datagram.recv(&mut self.recv_buf, wait)? else {
                break;
            };
            // Only the first receive may wait; the rest just drain.
            wait = None;

            for frame in self.parser.decode_slice(&self.recv_buf[..len]) {
                self.stats.record_received();
                #[cfg(feature = "debug-tools")]
                self.record(frame.raw());
                if let Some(link) = self.serial.as_ref().filter(|link| link.is_open()) {
                    if let Err(err) = link.send(frame.raw().clone()) {
                        debug!(%err, "failed to relay datagram frame to serial");
                    }
                }
                handler(frame);
                dispatched += 1;
            }
        }
        Ok(dispatched)
    }

    /// Counters for both links.
    #[must_use]
    pub fn stats(&self) -> TransportStats {
        TransportStats {
            datagram: self.stats.snapshot(),
            serial: self
                .serial
                .as_ref()
                .map(SerialLink::stats)
                .unwrap_or_default(),
            parser: self.parser.stats(),
        }
    }

    /// Stop the serial workers. The datagram socket closes on drop.
    pub fn shutdown(&mut self) {
        if let Some(mut link) = self.serial.take() {
            link.shutdown();
        }
    }

    #[cfg(feature = "debug-tools")]
    fn record(&self, frame: &[u8]) {
        if let Some(tlog) = &self.tlog {
            if let Err(err) = tlog.record(frame) {
                debug!(%err, "failed to record frame");
            }
        }
    }
}

impl Drop for TransportManager {
    fn drop(&mut self) {
        self.shutdown();
    }
}
