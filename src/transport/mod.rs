//! Datagram and serial delivery of MAVLink frames

#[cfg(feature = "debug-tools")]
mod debug;
mod error;
mod manager;
mod queue;
mod serial;
mod socket;

#[cfg(feature = "debug-tools")]
pub use debug::TlogRecorder;
pub use error::TransportError;
pub use manager::{TransportManager, TransportStats};
pub use queue::{DEFAULT_TX_QUEUE_CAPACITY, OutboundBuffer, QueueError, TxQueue};
pub use serial::SerialLink;
pub use socket::{DatagramLink, SocketBinding, SocketError};
