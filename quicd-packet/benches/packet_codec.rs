//! Benchmarks for packet codec hot paths.
//!
//! These benchmarks measure performance of:
//! - VarInt encode/decode
//! - Packet number truncation and reconstruction
//! - Parsing and serializing Initial and 1-RTT packets
//!
//! Run with: cargo bench -p quicd-packet --bench packet_codec

use bytes::{Bytes, BytesMut};
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use quicd_packet::frames::{RawPayload, RawPayloadDecoder};
use quicd_packet::packet::{InitialPacket, ShortPacket};
use quicd_packet::{
    ConnectionId, Packet, PacketNumberCodec, ParseContext, Token, VarIntCodec, Version,
};

fn initial_packet() -> Packet<RawPayload> {
    Packet::Initial(InitialPacket {
        version: Version::V1,
        dcid: ConnectionId::from_slice(&[0x83; 8]).unwrap_or_default(),
        scid: ConnectionId::from_slice(&[0xf0; 8]).unwrap_or_default(),
        token: Token::default(),
        packet_number: 2,
        frames: vec![RawPayload(Bytes::from(vec![0u8; 1100]))],
    })
}

fn short_packet() -> Packet<RawPayload> {
    Packet::OneRtt(ShortPacket {
        spin: false,
        key_phase: false,
        dcid: ConnectionId::from_slice(&[0x83; 8]).unwrap_or_default(),
        packet_number: 0x1_0000,
        frames: vec![RawPayload(Bytes::from(vec![0u8; 1200]))],
    })
}

/// Benchmark varint encode/decode (every length and token field)
fn bench_varint(c: &mut Criterion) {
    let mut group = c.benchmark_group("varint");
    group.throughput(Throughput::Elements(4));

    let values = [37u64, 15_293, 494_878_333, 151_288_809_941_952_652];
    group.bench_function("encode", |b| {
        let mut buf = BytesMut::with_capacity(32);
        b.iter(|| {
            buf.clear();
            for &value in &values {
                let _ = VarIntCodec::encode(black_box(value), &mut buf);
            }
        })
    });

    let mut encoded = BytesMut::new();
    for &value in &values {
        let _ = VarIntCodec::encode(value, &mut encoded);
    }
    let encoded = encoded.freeze();
    group.bench_function("decode", |b| {
        b.iter(|| {
            let mut input = encoded.clone();
            while let Ok(value) = VarIntCodec::decode(&mut input) {
                black_box(value);
            }
        })
    });

    group.finish();
}

/// Benchmark packet number truncation (per-packet hot path)
fn bench_packet_number(c: &mut Criterion) {
    let mut group = c.benchmark_group("packet_number");
    group.throughput(Throughput::Elements(1));

    group.bench_function("encoded_len", |b| {
        b.iter(|| PacketNumberCodec::encoded_len(black_box(0xa82f_9b32), Some(0xa82f_30ea)))
    });

    group.bench_function("decode_truncated", |b| {
        b.iter(|| PacketNumberCodec::decode_truncated(black_box(0x9b32), 2, Some(0xa82f_30ea)))
    });

    group.finish();
}

/// Benchmark full packet parse and serialize
fn bench_packets(c: &mut Criterion) {
    let mut group = c.benchmark_group("packet");

    for (name, packet, ctx) in [
        ("initial", initial_packet(), ParseContext::default()),
        (
            "one_rtt",
            short_packet(),
            ParseContext::default().with_dcid_len(8),
        ),
    ] {
        let mut buf = BytesMut::new();
        if packet.write(None, 0, &mut buf).is_err() {
            continue;
        }
        let wire = buf.freeze();
        group.throughput(Throughput::Bytes(wire.len() as u64));

        group.bench_function(format!("{name}/parse"), |b| {
            b.iter(|| {
                let mut input = wire.clone();
                Packet::parse(&mut input, &ctx, &RawPayloadDecoder)
            })
        });

        group.bench_function(format!("{name}/write"), |b| {
            let mut out = BytesMut::with_capacity(1500);
            b.iter(|| {
                out.clear();
                packet.write(black_box(None), 0, &mut out)
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_varint, bench_packet_number, bench_packets);
criterion_main!(benches);
