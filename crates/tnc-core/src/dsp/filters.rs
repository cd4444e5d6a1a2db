// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Windowed sinc low-pass/band-pass filter synthesis and Mark/Space
//! correlator tables (§4.1).
//!
//! Every generator here is a pure function of its parameters: given the
//! same sample rate, cutoff(s), tap count and window, the same kernel
//! comes out every time. None of this module touches sample state; that
//! lives in [`crate::demod`].

use crate::dsp::window::WindowKind;
use std::f64::consts::PI;

/// `sinc(x) = sin(pi*x) / (pi*x)`, with the removable singularity at 0
/// filled in.
fn sinc(x: f64) -> f64 {
    if x.abs() < 1e-12 {
        1.0
    } else {
        (PI * x).sin() / (PI * x)
    }
}

/// Synthesize a windowed low-pass FIR kernel.
///
/// `cutoff_hz` is the -6 dB point, `sample_rate_hz` the input sample
/// rate, `size` the number of taps (should be odd for a zero-phase
/// center tap, but any size is accepted). The kernel is normalized to
/// unity DC gain.
#[must_use]
pub fn lowpass_sinc(cutoff_hz: f64, sample_rate_hz: f64, size: usize, window: WindowKind) -> Vec<f64> {
    assert!(size > 0, "filter must have at least one tap");
    let fc = cutoff_hz / sample_rate_hz;
    let center = (size - 1) as f64 / 2.0;
    let mut taps: Vec<f64> = (0..size)
        .map(|j| {
            let x = j as f64 - center;
            2.0 * fc * sinc(2.0 * fc * x)
        })
        .collect();
    window.apply(&mut taps);
    normalize_dc_gain(&mut taps);
    taps
}

/// Synthesize a windowed band-pass FIR kernel as the difference of two
/// low-pass kernels (the "difference of sincs" technique).
///
/// Normalized to unity gain at the center frequency
/// `(low_hz + high_hz) / 2`.
#[must_use]
pub fn bandpass_sinc(
    low_hz: f64,
    high_hz: f64,
    sample_rate_hz: f64,
    size: usize,
    window: WindowKind,
) -> Vec<f64> {
    assert!(high_hz > low_hz, "band-pass requires high_hz > low_hz");
    let fc_low = low_hz / sample_rate_hz;
    let fc_high = high_hz / sample_rate_hz;
    let center = (size - 1) as f64 / 2.0;
    let mut taps: Vec<f64> = (0..size)
        .map(|j| {
            let x = j as f64 - center;
            2.0 * fc_high * sinc(2.0 * fc_high * x) - 2.0 * fc_low * sinc(2.0 * fc_low * x)
        })
        .collect();
    window.apply(&mut taps);
    normalize_bandpass_gain(&mut taps, (low_hz + high_hz) / 2.0, sample_rate_hz);
    taps
}

/// Rescale `taps` so the kernel's DC (z=1) gain is exactly 1.0.
fn normalize_dc_gain(taps: &mut [f64]) {
    let sum: f64 = taps.iter().sum();
    if sum.abs() > 1e-15 {
        for t in taps.iter_mut() {
            *t /= sum;
        }
    }
}

/// Rescale `taps` so the kernel's magnitude response at `freq_hz` is
/// exactly 1.0, evaluated by direct DTFT summation.
fn normalize_bandpass_gain(taps: &mut [f64], freq_hz: f64, sample_rate_hz: f64) {
    let omega = 2.0 * PI * freq_hz / sample_rate_hz;
    let (mut re, mut im) = (0.0, 0.0);
    for (n, &t) in taps.iter().enumerate() {
        re += t * (omega * n as f64).cos();
        im -= t * (omega * n as f64).sin();
    }
    let mag = (re * re + im * im).sqrt();
    if mag > 1e-15 {
        for t in taps.iter_mut() {
            *t /= mag;
        }
    }
}

/// Run a causal FIR filter over `samples`, keeping the running tap
/// history in a small ring so the caller can feed samples one block at
/// a time (e.g. one HDLC bit's worth) and get a continuous output.
#[derive(Debug, Clone)]
pub struct FirFilter {
    taps: Vec<f64>,
    history: std::collections::VecDeque<f64>,
}

impl FirFilter {
    /// Build a filter from a tap set; history starts zero-filled.
    #[must_use]
    pub fn new(taps: Vec<f64>) -> Self {
        let len = taps.len();
        Self {
            taps,
            history: std::collections::VecDeque::from(vec![0.0; len]),
        }
    }

    /// Push one input sample through the filter and return the
    /// corresponding output sample.
    pub fn process(&mut self, sample: f64) -> f64 {
        self.history.pop_front();
        self.history.push_back(sample);
        self.taps
            .iter()
            .zip(self.history.iter().rev())
            .map(|(t, s)| t * s)
            .sum()
    }

    /// Filter a whole buffer in place order, returning the output.
    pub fn process_block(&mut self, samples: &[f64]) -> Vec<f64> {
        samples.iter().map(|&s| self.process(s)).collect()
    }
}

/// A Mark/Space correlator pair: sine and cosine reference tables at a
/// given tone frequency, used to compute instantaneous I/Q energy via
/// quadrature correlation against the incoming audio.
#[derive(Debug, Clone)]
pub struct ToneCorrelator {
    /// Tone frequency this correlator was built for.
    pub freq_hz: f64,
    /// In-phase (cosine) reference samples.
    pub cos_table: Vec<f64>,
    /// Quadrature (sine) reference samples.
    pub sin_table: Vec<f64>,
}

impl ToneCorrelator {
    /// Build sine/cosine reference tables of `size` samples at `freq_hz`
    /// for a demodulator running at `sample_rate_hz`.
    #[must_use]
    pub fn new(freq_hz: f64, sample_rate_hz: f64, size: usize) -> Self {
        let omega = 2.0 * PI * freq_hz / sample_rate_hz;
        let cos_table = (0..size).map(|n| (omega * n as f64).cos()).collect();
        let sin_table = (0..size).map(|n| (omega * n as f64).sin()).collect();
        Self {
            freq_hz,
            cos_table,
            sin_table,
        }
    }

    /// Correlate `samples` (most recent `self.cos_table.len()` samples,
    /// oldest first) against the reference tables and return the
    /// complex correlator output as (I, Q).
    ///
    /// The magnitude of this value tracks how strongly `freq_hz` is
    /// present in `samples`; demodulator slicing compares Mark vs Space
    /// magnitudes (or, for AFSK, correlator output directly).
    #[must_use]
    pub fn correlate(&self, samples: &[f64]) -> num_complex::Complex<f64> {
        let n = self.cos_table.len().min(samples.len());
        let mut i = 0.0;
        let mut q = 0.0;
        for k in 0..n {
            i += samples[k] * self.cos_table[k];
            q += samples[k] * self.sin_table[k];
        }
        num_complex::Complex::new(i, q)
    }
}
