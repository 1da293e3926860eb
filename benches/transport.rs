//! Transport layer performance benchmarks
//!
//! Measures the serial TX queue and a UDP loopback round trip.

use std::net::{Ipv4Addr, SocketAddr, UdpSocket};
use std::time::Duration;

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use hil_bridge::config::TransportConfig;
use hil_bridge::protocol::{Heartbeat, ProtocolVersion, encode_frame};
use hil_bridge::transport::{TransportManager, TxQueue};

/// Queue push followed by a drain with short writes
fn bench_tx_queue(c: &mut Criterion) {
    let mut group = c.benchmark_group("tx_queue");
    let frame = vec![0xA5u8; 72];

    for write_size in [8usize, 32, 256] {
        group.throughput(Throughput::Bytes(64 * frame.len() as u64));
        group.bench_with_input(
            BenchmarkId::new("push_drain_64", write_size),
            &write_size,
            |b, &write_size| {
                let mut queue = TxQueue::new(128);
                b.iter(|| {
                    for _ in 0..64 {
                        queue.push(frame.clone()).unwrap();
                    }
                    while let Some(pending) = queue.front_pending() {
                        let n = pending.len().min(write_size);
                        black_box(&pending[..n]);
                        queue.advance_head(n);
                        queue.pop_front_if_drained();
                    }
                });
            },
        );
    }

    group.finish();
}

/// Send one heartbeat to a loopback peer and poll its echo
fn bench_loopback(c: &mut Criterion) {
    let mut group = c.benchmark_group("loopback");

    let peer = UdpSocket::bind(SocketAddr::from((Ipv4Addr::LOCALHOST, 0))).unwrap();
    peer.set_read_timeout(Some(Duration::from_secs(1))).unwrap();
    let config = TransportConfig {
        bind_addr: Ipv4Addr::LOCALHOST.into(),
        autopilot_port: peer.local_addr().unwrap().port(),
        poll_timeout: Some(Duration::from_millis(100)),
        ..TransportConfig::default()
    };
    let mut manager = TransportManager::open(&config).unwrap();
    let local = manager.local_addr().unwrap();
    let echo = encode_frame(ProtocolVersion::V2, 0, 1, 1, &Heartbeat::default().into(), None);
    let mut buf = [0u8; 512];

    group.bench_function("heartbeat_round_trip", |b| {
        b.iter(|| {
            manager.send(&Heartbeat::default().into()).unwrap();
            peer.recv_from(&mut buf).unwrap();
            peer.send_to(&echo, local).unwrap();
            black_box(manager.poll(|frame| drop(black_box(frame))).unwrap());
        });
    });

    group.finish();
}

criterion_group!(benches, bench_tx_queue, bench_loopback);
criterion_main!(benches);
