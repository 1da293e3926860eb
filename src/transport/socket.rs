//! UDP socket wrapper and the datagram link built on it.

use std::io;
use std::net::{SocketAddr, UdpSocket};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, trace};

/// Error type for socket operations.
#[derive(Debug, thiserror::Error)]
pub enum SocketError {
    /// Underlying I/O error
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}

/// Binding for a UDP socket.
#[derive(Debug, Clone)]
pub struct SocketBinding {
    socket: Arc<UdpSocket>,
}

impl SocketBinding {
    /// Bind to the provided address.
    pub fn bind(addr: SocketAddr) -> Result<Self, SocketError> {
        let socket = UdpSocket::bind(addr)?;
        socket.set_nonblocking(true)?;
        Ok(Self {
            socket: Arc::new(socket),
        })
    }

    /// Set socket read timeout.
    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> Result<(), SocketError> {
        self.socket.set_read_timeout(timeout)?;
        Ok(())
    }

    /// Adjust the non-blocking mode.
    pub fn set_nonblocking(&self, nonblocking: bool) -> Result<(), SocketError> {
        self.socket.set_nonblocking(nonblocking)?;
        Ok(())
    }

    /// Send bytes to a remote address.
    pub fn send_to(&self, buf: &[u8], addr: SocketAddr) -> Result<usize, SocketError> {
        Ok(self.socket.send_to(buf, addr)?)
    }

    /// Receive bytes into the provided buffer.
    pub fn recv_from(&self, buf: &mut [u8]) -> Result<(usize, SocketAddr), SocketError> {
        Ok(self.socket.recv_from(buf)?)
    }

    /// Access the local address for this binding.
    pub fn local_addr(&self) -> Result<SocketAddr, SocketError> {
        Ok(self.socket.local_addr()?)
    }
}

/// Connectionless link to one peer whose address follows the most recent
/// sender.
///
/// Clones share the socket and the peer address, so the serial reader can
/// forward frames to whoever last spoke on the datagram side.
#[derive(Debug, Clone)]
pub struct DatagramLink {
    socket: SocketBinding,
    remote: Arc<Mutex<SocketAddr>>,
}

impl DatagramLink {
    /// Bind `local` and address `remote` until a datagram arrives from elsewhere.
    pub fn bind(local: SocketAddr, remote: SocketAddr) -> Result<Self, SocketError> {
        let socket = SocketBinding::bind(local)?;
        debug!(local = ?socket.local_addr().ok(), %remote, "datagram link bound");
        Ok(Self {
            socket,
            remote: Arc::new(Mutex::new(remote)),
        })
    }

    /// Current peer address
    #[must_use]
    pub fn remote(&self) -> SocketAddr {
        *self.remote.lock()
    }

    /// Local address of the bound socket.
    pub fn local_addr(&self) -> Result<SocketAddr, SocketError> {
        self.socket.local_addr()
    }

    /// Send one complete frame to the current peer.
    pub fn send(&self, frame: &[u8]) -> Result<usize, SocketError> {
        let remote = self.remote();
        trace!(%remote, len = frame.len(), "datagram send");
        self.socket.send_to(frame, remote)
    }

    /// Receive one datagram, waiting at most `wait` (or not at all when
    /// `None`). Returns `Ok(None)` if nothing arrived.
    pub fn recv(
        &self,
        buf: &mut [u8],
        wait: Option<Duration>,
    ) -> Result<Option<usize>, SocketError> {
        match wait {
            Some(timeout) if !timeout.is_zero() => {
                self.socket.set_nonblocking(false)?;
                self.socket.set_read_timeout(Some(timeout))?;
            }
            _ => self.socket.set_nonblocking(true)?,
        }

        match self.socket.recv_from(buf) {
            Ok((len, sender)) => {
                let mut remote = self.remote.lock();
                if *remote != sender {
                    let previous = std::mem::replace(&mut *remote, sender);
                    debug!(from = %previous, to = %sender, "peer address changed");
                }
                Ok(Some(len))
            }
            Err(SocketError::Io(err))
                if matches!(
                    err.kind(),
                    io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
                ) =>
            {
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loopback() -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], 0))
    }

    #[test]
    fn empty_poll_returns_none() {
        let link = DatagramLink::bind(loopback(), loopback()).unwrap();
        let mut buf = [0u8; 64];
        assert!(link.recv(&mut buf, None).unwrap().is_none());
        assert!(
            link.recv(&mut buf, Some(Duration::from_millis(5)))
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn remote_follows_sender() {
        let placeholder = SocketAddr::from(([127, 0, 0, 1], 9));
        let link = DatagramLink::bind(loopback(), placeholder).unwrap();
        let peer = UdpSocket::bind(loopback()).unwrap();
        peer.send_to(b"hi", link.local_addr().unwrap()).unwrap();

        let mut buf = [0u8; 64];
        let len = link.recv(&mut buf, Some(Duration::from_secs(1))).unwrap();
        assert_eq!(len, Some(2));
        assert_eq!(link.remote(), peer.local_addr().unwrap());
    }
}
