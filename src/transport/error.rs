//! Transport-level error types covering socket, serial, and queue failures.

use std::net::SocketAddr;

use super::queue::QueueError;
use super::socket::SocketError;

/// Unified error type for transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The datagram socket could not be bound.
    #[error("failed to bind datagram socket on {addr}: {source}")]
    Bind {
        /// Address the bind was attempted on.
        addr: SocketAddr,
        /// Underlying socket failure.
        #[source]
        source: SocketError,
    },
    /// Underlying socket failure after binding.
    #[error("socket error: {0}")]
    Socket(#[from] SocketError),
    /// The serial device could not be opened or cloned.
    #[error("serial port {path} unavailable: {source}")]
    SerialOpen {
        /// Device path.
        path: String,
        /// Driver error.
        #[source]
        source: serialport::Error,
    },
    /// Serial output is enabled but the port is not open.
    #[error("serial link closed")]
    SerialClosed,
    /// The serial transmit queue rejected the frame.
    #[error(transparent)]
    Queue(#[from] QueueError),
}
