use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};
use hil_bridge::protocol::{
    FrameEncoder, FrameParser, HilActuatorControls, HilSensor, Message, ModeFlags,
    ProtocolVersion, SigningKey,
};

fn sensor_message() -> Message {
    HilSensor {
        time_usec: 1_000_000,
        xacc: 0.1,
        yacc: -0.2,
        zacc: -9.81,
        xgyro: 0.01,
        ygyro: 0.02,
        zgyro: -0.03,
        xmag: 0.2,
        ymag: 0.01,
        zmag: -0.42,
        abs_pressure: 955.95,
        diff_pressure: 0.3,
        pressure_alt: 488.0,
        temperature: 11.8,
        fields_updated: 4095,
    }
    .into()
}

fn actuator_message() -> Message {
    HilActuatorControls {
        time_usec: 1_000_000,
        flags: 0,
        controls: [0.5; 16],
        mode: ModeFlags::default().with(ModeFlags::SAFETY_ARMED),
    }
    .into()
}

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("codec");
    let msg = sensor_message();

    for version in [ProtocolVersion::V1, ProtocolVersion::V2] {
        let mut encoder = FrameEncoder::new(version);
        group.bench_function(format!("encode_hil_sensor_{version:?}"), |b| {
            b.iter(|| black_box(encoder.encode(black_box(&msg))));
        });
    }

    let mut signed =
        FrameEncoder::new(ProtocolVersion::V2).with_signing(SigningKey::new([7; 32], 1));
    group.bench_function("encode_hil_sensor_signed", |b| {
        b.iter(|| black_box(signed.encode(black_box(&msg))));
    });

    group.finish();
}

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("codec");

    let mut encoder = FrameEncoder::new(ProtocolVersion::V2);
    let stream: Vec<u8> = (0..64)
        .flat_map(|_| encoder.encode(&actuator_message()))
        .collect();
    group.throughput(Throughput::Bytes(stream.len() as u64));
    group.bench_function("parse_64_actuator_frames", |b| {
        let mut parser = FrameParser::new();
        b.iter(|| black_box(parser.decode_slice(black_box(&stream))));
    });

    let frame = encoder.encode(&actuator_message());
    group.bench_function("parse_and_unpack", |b| {
        let mut parser = FrameParser::new();
        b.iter(|| {
            for frame in parser.decode_slice(black_box(&frame)) {
                black_box(frame.message().ok());
            }
        });
    });

    group.finish();
}

criterion_group!(benches, bench_encode, bench_parse);
criterion_main!(benches);
