// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Per-(channel, sub-channel) demodulator state machine (§4.2).
//!
//! [`Demodulator`] is fed one audio sample at a time by the audio-receive
//! thread (live, via [`crate::audio`]) or by the offline WAV reader, and
//! drives one or more [`Slicer`]s, each with its own PLL-derived bit
//! timing and [`crate::hdlc::HdlcReceiver`]. Nothing in this module
//! blocks: every step is pure per-sample arithmetic over owned state, as
//! required for use inside the real-time audio callback (§5).

mod agc;
mod nrzi;
mod pll;
mod slicer;

pub use agc::{Agc, PeakFollower};
pub use slicer::{Slicer, SlicerConfig};

use crate::config::DEFAULT_DCD_THRESHOLD;
use crate::dsp::{FirFilter, ToneCorrelator};
use crate::hdlc::HdlcError;
use std::collections::VecDeque;

/// Which detection scheme a demodulator instance runs.
pub enum DemodMode {
    /// Bell 202-style AFSK: two tone correlators, difference-and-slice.
    Afsk {
        mark: ToneCorrelator,
        space: ToneCorrelator,
        window_len: usize,
    },
    /// 9600 bps G3RUH: the discriminator-audio sample *is* the baseband
    /// signal (after shaping/post-filtering); no tone correlation.
    Baseband9600,
}

/// Configuration fixed for the lifetime of one [`Demodulator`].
pub struct DemodConfig {
    pub sample_rate_hz: f64,
    pub baud: f64,
    pub mark_hz: f64,
    pub space_hz: f64,
    pub correlator_len: usize,
    pub prefilter: Option<Vec<f64>>,
    pub postfilter: Vec<f64>,
    pub nine_six_hundred: bool,
    pub slicer_offsets: Vec<f64>,
    pub hysteresis: f64,
}

impl DemodConfig {
    /// Standard 1200 bps Bell 202 AFSK configuration at `sample_rate_hz`,
    /// with a single centered slicer.
    #[must_use]
    pub fn afsk_1200(sample_rate_hz: f64) -> Self {
        use crate::dsp::{lowpass_sinc, WindowKind};
        use crate::tone::{DEFAULT_BAUD, DEFAULT_MARK_HZ, DEFAULT_SPACE_HZ};
        let correlator_len = (sample_rate_hz / DEFAULT_BAUD).round() as usize * 8;
        Self {
            sample_rate_hz,
            baud: DEFAULT_BAUD,
            mark_hz: DEFAULT_MARK_HZ,
            space_hz: DEFAULT_SPACE_HZ,
            correlator_len: correlator_len.max(8),
            prefilter: None,
            postfilter: lowpass_sinc(DEFAULT_BAUD * 0.6, sample_rate_hz, 31, WindowKind::Hamming),
            nine_six_hundred: false,
            slicer_offsets: vec![0.0],
            hysteresis: crate::config::DEFAULT_SLICER_HYSTERESIS,
        }
    }

    /// 9600 bps G3RUH baseband configuration at `sample_rate_hz`.
    #[must_use]
    pub fn g3ruh_9600(sample_rate_hz: f64) -> Self {
        use crate::dsp::{lowpass_sinc, WindowKind};
        Self {
            sample_rate_hz,
            baud: 9600.0,
            mark_hz: 0.0,
            space_hz: 0.0,
            correlator_len: 1,
            prefilter: None,
            postfilter: lowpass_sinc(9600.0 * 0.6, sample_rate_hz, 31, WindowKind::Hamming),
            nine_six_hundred: true,
            slicer_offsets: vec![0.0],
            hysteresis: crate::config::DEFAULT_SLICER_HYSTERESIS,
        }
    }
}

/// Signal-level snapshot for user-visible reporting (§4.2 step 4, §6,
/// the TNC-protocol `g` port-capabilities response's traffic byte).
#[derive(Debug, Clone, Copy, Default)]
pub struct LevelReport {
    /// Fast-responding envelope, 0-100 scaled.
    pub quick: u8,
    /// Slow-responding envelope, 0-100 scaled.
    pub sluggish: u8,
}

/// One demodulator instance: filters, correlators/baseband path, AGC,
/// and the parallel slicers it drives.
pub struct Demodulator {
    sample_rate_hz: f64,
    mode: DemodMode,
    prefilter: Option<FirFilter>,
    postfilter: FirFilter,
    corr_window: VecDeque<f64>,
    agc: Agc,
    slicers: Vec<Slicer>,
}

/// One slicer's output for a single processed sample: which slicer
/// index produced it, and the frame result.
pub struct SlicerEvent {
    pub slicer: usize,
    pub result: Result<Vec<u8>, HdlcError>,
}

impl Demodulator {
    /// Build a demodulator from `config`.
    #[must_use]
    pub fn new(config: &DemodConfig) -> Self {
        let mode = if config.nine_six_hundred {
            DemodMode::Baseband9600
        } else {
            DemodMode::Afsk {
                mark: ToneCorrelator::new(config.mark_hz, config.sample_rate_hz, config.correlator_len),
                space: ToneCorrelator::new(config.space_hz, config.sample_rate_hz, config.correlator_len),
                window_len: config.correlator_len,
            }
        };
        let prefilter = config.prefilter.clone().map(FirFilter::new);
        let postfilter = FirFilter::new(config.postfilter.clone());
        let window_len = config.correlator_len.max(1);
        let slicers = config
            .slicer_offsets
            .iter()
            .map(|&offset| {
                let slicer_cfg = SlicerConfig {
                    offset,
                    hysteresis: config.hysteresis,
                    scrambled: config.nine_six_hundred,
                };
                Slicer::new(slicer_cfg, config.sample_rate_hz, config.baud)
            })
            .collect();
        Self {
            sample_rate_hz: config.sample_rate_hz,
            mode,
            prefilter,
            postfilter,
            corr_window: VecDeque::from(vec![0.0; window_len]),
            agc: Agc::new(),
            slicers,
        }
    }

    /// The sample rate this demodulator was configured for.
    #[must_use]
    pub fn sample_rate_hz(&self) -> f64 {
        self.sample_rate_hz
    }

    /// Number of parallel slicers this demodulator drives.
    #[must_use]
    pub fn slicer_count(&self) -> usize {
        self.slicers.len()
    }

    /// Process one incoming audio sample (§4.2 steps 1-6).
    ///
    /// Returns every HDLC frame-boundary event produced by any slicer on
    /// this sample (almost always empty; HDLC frames complete once every
    /// several thousand samples).
    pub fn process_sample(&mut self, sample: f64) -> Vec<SlicerEvent> {
        let filtered = match &mut self.prefilter {
            Some(f) => f.process(sample),
            None => sample,
        };

        self.corr_window.pop_front();
        self.corr_window.push_back(filtered);

        let diff_raw = match &self.mode {
            DemodMode::Afsk { mark, space, window_len } => {
                let window: Vec<f64> = self.corr_window.iter().copied().collect();
                let scale = 1.0 / (*window_len).max(1) as f64;
                let mark_amp = mark.correlate(&window).norm() * scale;
                let space_amp = space.correlate(&window).norm() * scale;
                let _ = self.agc.process(mark_amp.max(space_amp));
                mark_amp - space_amp
            }
            DemodMode::Baseband9600 => {
                let _ = self.agc.process(filtered.abs());
                filtered
            }
        };

        let diff = self.postfilter.process(diff_raw);
        let envelope = self.agc.quick_level().max(1e-6);
        let dcd = envelope > DEFAULT_DCD_THRESHOLD;

        let mut events = Vec::new();
        for (i, slicer) in self.slicers.iter_mut().enumerate() {
            if let Some(result) = slicer.process(diff, envelope, dcd) {
                events.push(SlicerEvent { slicer: i, result });
            }
        }
        events
    }

    /// Whether a carrier is currently believed present (§4.6 DCD gate).
    #[must_use]
    pub fn data_carrier_detect(&self) -> bool {
        self.agc.quick_level() > DEFAULT_DCD_THRESHOLD
    }

    /// Current signal-level snapshot for reporting.
    #[must_use]
    pub fn level_report(&self) -> LevelReport {
        let scale = |v: f64| -> u8 { (v.clamp(0.0, 1.0) * 100.0) as u8 };
        LevelReport {
            quick: scale(self.agc.quick_level()),
            sluggish: scale(self.agc.sluggish_level()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn afsk_demod_recovers_a_frame_from_synthesized_tones() {
        let sample_rate = 9600.0;
        let config = DemodConfig::afsk_1200(sample_rate);
        let mut demod = Demodulator::new(&config);

        let payload = b"\x82\xA0\xA4\xA6\x40\x40\x60\x03\xF0hi".to_vec();
        let bits = crate::hdlc::encode_frame(&payload, 8, 4);

        let mut modulator = crate::tone::AfskModulator::new(
            sample_rate,
            config.baud,
            config.mark_hz,
            config.space_hz,
        );
        let mut line = crate::tone::NrziEncoder::new();

        let mut decoded = None;
        for bit in bits {
            let line_bit = line.encode_bit(bit);
            let mut samples = Vec::new();
            modulator.modulate_bit(line_bit, &mut samples);
            for s in samples {
                for event in demod.process_sample(f64::from(s)) {
                    if let Ok(frame) = event.result {
                        decoded = Some(frame);
                    }
                }
            }
        }
        assert_eq!(decoded, Some(payload));
    }

    #[test]
    fn level_report_rises_with_a_strong_tone() {
        let sample_rate = 9600.0;
        let config = DemodConfig::afsk_1200(sample_rate);
        let mut demod = Demodulator::new(&config);
        let mut modulator = crate::tone::AfskModulator::new(
            sample_rate,
            config.baud,
            config.mark_hz,
            config.space_hz,
        );
        let before = demod.level_report();
        let mut samples = Vec::new();
        for _ in 0..50 {
            modulator.modulate_bit(true, &mut samples);
        }
        for s in samples {
            demod.process_sample(f64::from(s));
        }
        let after = demod.level_report();
        assert!(after.quick >= before.quick);
    }
}
