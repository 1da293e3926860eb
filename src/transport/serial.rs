//! Serial link with dedicated reader and writer workers.
//!
//! The writer drains a [`TxQueue`] one write at a time: it copies the head's
//! unwritten bytes out under the lock, writes without holding it, then
//! records progress. The reader parses the byte stream, forwards each valid
//! frame to the ground station and hands it to the tick thread over a
//! bounded channel.

use std::io::{self, Read, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use bytes::Bytes;
use parking_lot::{Condvar, Mutex};
use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};
use tracing::{debug, error, info, instrument, trace, warn};

use super::error::TransportError;
use super::queue::TxQueue;
use super::socket::DatagramLink;
use crate::config::SerialConfig;
use crate::protocol::metrics::LinkStats;
use crate::protocol::{Frame, FrameParser, Framing, LinkStatsSnapshot, SigningKey};

const READ_CHUNK: usize = 512;

/// Pause after a write that made no progress.
const WRITE_RETRY_BACKOFF: Duration = Duration::from_millis(1);

#[derive(Debug)]
struct SerialState {
    queue: TxQueue,
    open: bool,
}

#[derive(Debug)]
struct Shared {
    state: Mutex<SerialState>,
    wake: Condvar,
    running: AtomicBool,
    stats: LinkStats,
}

impl Shared {
    fn new(tx_capacity: usize) -> Self {
        Self {
            state: Mutex::new(SerialState {
                queue: TxQueue::new(tx_capacity),
                open: true,
            }),
            wake: Condvar::new(),
            running: AtomicBool::new(true),
            stats: LinkStats::default(),
        }
    }

    fn close(&self) {
        self.running.store(false, Ordering::Release);
        let mut state = self.state.lock();
        state.open = false;
        state.queue.clear();
        drop(state);
        self.wake.notify_all();
    }
}

/// An open serial port plus its worker threads.
#[derive(Debug)]
pub struct SerialLink {
    shared: Arc<Shared>,
    inbound: Receiver<Frame>,
    reader: Option<JoinHandle<()>>,
    writer: Option<JoinHandle<()>>,
    device: String,
}

impl SerialLink {
    /// Open the device (8N1, no flow control) and start both workers.
    ///
    /// Every valid inbound frame is forwarded verbatim over `forward` when
    /// given.
    #[instrument(level = "debug", skip(config, forward, signing), fields(device = %config.device))]
    pub fn open(
        config: &SerialConfig,
        forward: Option<DatagramLink>,
        signing: Option<SigningKey>,
    ) -> Result<Self, TransportError> {
        let open_err = |source| TransportError::SerialOpen {
            path: config.device.clone(),
            source,
        };
        let read_port = serialport::new(config.device.as_str(), config.baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(config.read_timeout)
            .open()
            .map_err(open_err)?;
        let write_port = read_port.try_clone().map_err(open_err)?;
        info!(device = %config.device, baud = config.baud_rate, "opened serial device");

        Self::start(read_port, write_port, config, forward, signing)
    }

    /// Start both workers on an already configured port pair.
    fn start(
        read_port: Box<dyn SerialPort>,
        write_port: Box<dyn SerialPort>,
        config: &SerialConfig,
        forward: Option<DatagramLink>,
        signing: Option<SigningKey>,
    ) -> Result<Self, TransportError> {
        let spawn_err = |err: io::Error| TransportError::SerialOpen {
            path: config.device.clone(),
            source: err.into(),
        };
        let shared = Arc::new(Shared::new(config.tx_queue_capacity));

        let mut parser = FrameParser::new();
        if let Some(key) = signing {
            parser = parser.with_signing(key);
        }
        let (tx, inbound) = mpsc::sync_channel(config.rx_queue_capacity);

        let reader = {
            let shared = Arc::clone(&shared);
            thread::Builder::new()
                .name("serial-reader".into())
                .spawn(move || read_loop(read_port, parser, forward, tx, &shared))
                .map_err(spawn_err)?
        };
        let writer = {
            let shared = Arc::clone(&shared);
            thread::Builder::new()
                .name("serial-writer".into())
                .spawn(move || write_loop(write_port, &shared))
                .map_err(spawn_err)?
        };

        Ok(Self {
            shared,
            inbound,
            reader: Some(reader),
            writer: Some(writer),
            device: config.device.clone(),
        })
    }

    /// Queue an encoded frame for transmission.
    pub fn send(&self, frame: impl Into<Bytes>) -> Result<(), TransportError> {
        let mut state = self.shared.state.lock();
        if !state.open {
            self.shared.stats.record_send_failure();
            error!(device = %self.device, "serial port closed, dropping frame");
            return Err(TransportError::SerialClosed);
        }
        if let Err(err) = state.queue.push(frame) {
            self.shared.stats.record_queue_drop();
            warn!(device = %self.device, %err, "dropping outbound frame");
            return Err(err.into());
        }
        drop(state);
        self.shared.stats.record_sent();
        self.shared.wake.notify_one();
        Ok(())
    }

    /// Frames received since the last call, in arrival order.
    pub fn drain(&self) -> impl Iterator<Item = Frame> + '_ {
        self.inbound.try_iter()
    }

    /// Whether the port is still usable
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.shared.state.lock().open
    }

    /// Frames waiting in the transmit queue
    #[must_use]
    pub fn pending(&self) -> usize {
        self.shared.state.lock().queue.len()
    }

    /// Traffic counters
    #[must_use]
    pub fn stats(&self) -> LinkStatsSnapshot {
        self.shared.stats.snapshot()
    }

    /// Stop both workers and release the port. Pending frames are dropped.
    pub fn shutdown(&mut self) {
        self.shared.close();
        for handle in [self.reader.take(), self.writer.take()].into_iter().flatten() {
            if handle.join().is_err() {
                error!(device = %self.device, "serial worker panicked");
            }
        }
    }
}

impl Drop for SerialLink {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn read_loop(
    mut port: Box<dyn SerialPort>,
    mut parser: FrameParser,
    forward: Option<DatagramLink>,
    tx: SyncSender<Frame>,
    shared: &Shared,
) {
    let mut buf = [0u8; READ_CHUNK];
    while shared.running.load(Ordering::Acquire) {
        let len = match port.read(&mut buf) {
            Ok(len) => len,
            Err(err) if is_transient(&err) => continue,
            Err(err) => {
                error!(%err, "serial read failed");
                shared.close();
                break;
            }
        };

        for &byte in &buf[..len] {
            match parser.decode_byte(byte) {
                Framing::Ok(frame) => {
                    shared.stats.record_received();
                    if let Some(link) = &forward {
                        if let Err(err) = link.send(frame.raw()) {
                            debug!(%err, "failed to forward serial frame");
                        }
                    }
                    match tx.try_send(frame) {
                        Ok(()) => {}
                        Err(TrySendError::Full(_)) => {
                            shared.stats.record_inbound_drop();
                            debug!("inbound queue full, dropping serial frame");
                        }
                        // Link handle dropped; nobody left to deliver to.
                        Err(TrySendError::Disconnected(_)) => return,
                    }
                }
                Framing::BadChecksum | Framing::BadSignature => {
                    trace!("discarded malformed serial frame");
                }
                Framing::Incomplete => {}
            }
        }
    }
    debug!("serial reader stopped");
}

fn write_loop<W: Write>(mut port: W, shared: &Shared) {
    loop {
        let pending = {
            let mut state = shared.state.lock();
            loop {
                if !state.open {
                    debug!("serial writer stopped");
                    return;
                }
                if let Some(pending) = state.queue.front_pending() {
                    break pending;
                }
                // Fully written heads are popped right after the write, so an
                // empty pending slice means an empty queue.
                shared.wake.wait(&mut state);
            }
        };

        match port.write(&pending) {
            Ok(0) => thread::sleep(WRITE_RETRY_BACKOFF),
            Ok(written) => {
                let mut state = shared.state.lock();
                state.queue.advance_head(written);
                state.queue.pop_front_if_drained();
            }
            Err(err) if is_transient(&err) => {
                trace!(%err, "serial write stalled");
                thread::sleep(WRITE_RETRY_BACKOFF);
            }
            Err(err) => {
                error!(%err, "serial write failed");
                shared.close();
                return;
            }
        }
    }
}

fn is_transient(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
    )
}
