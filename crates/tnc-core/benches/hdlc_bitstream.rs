// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Bit-stuffing, destuffing and full HDLC encode/decode throughput (§4.3, §4.7).

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tnc_core::hdlc::bitstream::{stuff_bits, BitDestuffer};
use tnc_core::hdlc::{encode_frame, HdlcReceiver};

fn sample_payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 37 + 11) as u8).collect()
}

fn bench_stuff_bits(c: &mut Criterion) {
    let mut group = c.benchmark_group("hdlc_stuff_bits");
    for len in [32usize, 256, 2048] {
        let payload = sample_payload(len);
        group.bench_with_input(BenchmarkId::from_parameter(len), &payload, |b, payload| {
            b.iter(|| black_box(stuff_bits(payload)));
        });
    }
    group.finish();
}

fn bench_destuff(c: &mut Criterion) {
    let payload = sample_payload(256);
    let stuffed = stuff_bits(&payload);
    c.bench_function("hdlc_destuff_256b", |b| {
        b.iter(|| {
            let mut destuffer = BitDestuffer::new();
            for &bit in &stuffed {
                black_box(destuffer.push_bit(bit));
            }
        });
    });
}

fn bench_encode_decode_round_trip(c: &mut Criterion) {
    let payload = sample_payload(256);
    c.bench_function("hdlc_encode_256b", |b| {
        b.iter(|| black_box(encode_frame(&payload, 2, 2)));
    });

    let bits = encode_frame(&payload, 2, 2);
    c.bench_function("hdlc_decode_256b", |b| {
        b.iter(|| {
            let mut rx = HdlcReceiver::new();
            for &bit in &bits {
                black_box(rx.push_bit(bit)).ok();
            }
        });
    });
}

criterion_group!(hdlc_benches, bench_stuff_bits, bench_destuff, bench_encode_decode_round_trip);
criterion_main!(hdlc_benches);
