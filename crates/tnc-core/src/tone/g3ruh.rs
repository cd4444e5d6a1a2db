// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! 9600 bps G3RUH baseband transmit path (§4.7).
//!
//! Unlike [`crate::tone::afsk`], a 9600 bps channel does not shift
//! between two audio tones; it drives the radio's discriminator
//! directly with a two-level (NRZ) baseband signal. The data stream is
//! first run through the self-synchronizing scrambler
//! ([`crate::tone::scrambler`]) to guarantee transitions often enough
//! for receiver bit-timing recovery, then shaped with a low-pass filter
//! to keep the transmitted spectrum inside the channel.

use crate::dsp::{lowpass_sinc, FirFilter, WindowKind};
use crate::tone::scrambler::Scrambler;

/// Default shaping filter tap count.
const SHAPING_TAPS: usize = 31;

/// Scrambles, NRZ-levels, and low-pass shapes a 9600 bps bit stream
/// into a baseband audio waveform.
pub struct G3ruhTransmitter {
    scrambler: Scrambler,
    shaping: FirFilter,
    samples_per_bit: usize,
}

impl G3ruhTransmitter {
    /// Build a transmitter for the given sample rate and baud (9600 for
    /// a standard G3RUH channel).
    #[must_use]
    pub fn new(sample_rate_hz: f64, baud: f64) -> Self {
        let cutoff = baud * 0.6;
        let taps = lowpass_sinc(cutoff, sample_rate_hz, SHAPING_TAPS, WindowKind::Hamming);
        Self {
            scrambler: Scrambler::new(),
            shaping: FirFilter::new(taps),
            samples_per_bit: (sample_rate_hz / baud).round().max(1.0) as usize,
        }
    }

    /// Scramble and shape one data bit, appending baseband samples to
    /// `out`. Line level is `+1.0` for a scrambled `1`, `-1.0` for a `0`.
    pub fn transmit_bit(&mut self, data_bit: bool, out: &mut Vec<f32>) {
        let line_bit = self.scrambler.scramble_bit(data_bit);
        let level: f64 = if line_bit { 1.0 } else { -1.0 };
        for _ in 0..self.samples_per_bit {
            out.push(self.shaping.process(level) as f32);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn holds_baseband_level_for_the_full_bit_period() {
        let mut tx = G3ruhTransmitter::new(38400.0, 9600.0);
        assert_eq!(tx.samples_per_bit, 4);
        let mut out = Vec::new();
        tx.transmit_bit(true, &mut out);
        assert_eq!(out.len(), 4);
    }

    #[test]
    fn shaped_output_stays_bounded_for_sustained_input() {
        let mut tx = G3ruhTransmitter::new(38400.0, 9600.0);
        let mut out = Vec::new();
        for _ in 0..400 {
            tx.transmit_bit(true, &mut out);
        }
        assert!(out.iter().all(|s| s.is_finite() && s.abs() <= 2.0));
    }
}
