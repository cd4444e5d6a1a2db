// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Filter synthesis and Mark/Space correlator throughput (§4.1).

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tnc_core::dsp::filters::{bandpass_sinc, lowpass_sinc, FirFilter, ToneCorrelator};
use tnc_core::dsp::window::WindowKind;

fn bench_synthesis(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp_synthesis");
    for taps in [31usize, 63, 127] {
        group.bench_with_input(BenchmarkId::new("lowpass_sinc", taps), &taps, |b, &taps| {
            b.iter(|| black_box(lowpass_sinc(1200.0, 9600.0, taps, WindowKind::Hamming)));
        });
        group.bench_with_input(BenchmarkId::new("bandpass_sinc", taps), &taps, |b, &taps| {
            b.iter(|| black_box(bandpass_sinc(1000.0, 2400.0, 9600.0, taps, WindowKind::Hamming)));
        });
    }
    group.finish();
}

fn bench_fir_process(c: &mut Criterion) {
    let taps = lowpass_sinc(1200.0, 9600.0, 63, WindowKind::Hamming);
    let samples: Vec<f64> = (0..9600).map(|n| (n as f64 * 0.013).sin()).collect();

    c.bench_function("fir_process_sample_by_sample_9600", |b| {
        b.iter(|| {
            let mut filt = FirFilter::new(taps.clone());
            for &s in &samples {
                black_box(filt.process(s));
            }
        });
    });

    c.bench_function("fir_process_block_9600", |b| {
        b.iter(|| {
            let mut filt = FirFilter::new(taps.clone());
            black_box(filt.process_block(&samples));
        });
    });
}

fn bench_correlator(c: &mut Criterion) {
    let mut group = c.benchmark_group("tone_correlator");
    for size in [8usize, 16, 32] {
        let corr = ToneCorrelator::new(1200.0, 9600.0, size);
        let samples: Vec<f64> = (0..size).map(|n| (n as f64 * 0.2).cos()).collect();
        group.bench_with_input(BenchmarkId::from_parameter(size), &samples, |b, samples| {
            b.iter(|| black_box(corr.correlate(samples)));
        });
    }
    group.finish();
}

criterion_group!(dsp_benches, bench_synthesis, bench_fir_process, bench_correlator);
criterion_main!(dsp_benches);
