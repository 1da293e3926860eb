//! Print every MAVLink frame arriving on a UDP port.
//!
//! ```text
//! cargo run --example frame_dump -- 14560
//! ```

use std::net::{Ipv4Addr, UdpSocket};

use hil_bridge::protocol::{FrameParser, MAX_FRAME_LEN};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let port: u16 = match std::env::args().nth(1) {
        Some(arg) => arg.parse()?,
        None => 14560,
    };
    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, port))?;
    info!(local = %socket.local_addr()?, "listening");

    let mut parser = FrameParser::new();
    let mut buf = vec![0u8; 4 * MAX_FRAME_LEN];
    loop {
        let (len, from) = socket.recv_from(&mut buf)?;
        for frame in parser.decode_slice(&buf[..len]) {
            let header = frame.header();
            match frame.message() {
                Ok(message) => info!(
                    %from,
                    version = ?header.version,
                    seq = header.sequence,
                    sysid = header.system_id,
                    compid = header.component_id,
                    signed = frame.signature().is_some(),
                    "{message:?}"
                ),
                Err(err) => info!(%from, seq = header.sequence, %err, "frame outside the HIL set"),
            }
        }
        let stats = parser.stats();
        if stats.checksum_errors > 0 {
            info!(?stats, "parser");
        }
    }
}
