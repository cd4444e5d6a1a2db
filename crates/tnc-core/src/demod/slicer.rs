// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! One bit-decision "slicer" (§3, §4.2 step 6): a decision threshold,
//! its own PLL register, NRZI decode, optional 9600 bps descrambler,
//! and the [`HdlcReceiver`] it feeds. A demodulator may run several
//! slicers in parallel at different thresholds; the best-scoring valid
//! frame across them wins (§3 Sub-channel and slicer).

use crate::config::{DEFAULT_PLL_LOCKED_INERTIA, DEFAULT_PLL_SEARCHING_INERTIA};
use crate::demod::nrzi::NrziDecoder;
use crate::demod::pll::Pll;
use crate::hdlc::{HdlcError, HdlcReceiver};
use crate::tone::scrambler::Scrambler;

/// Per-slicer tunables that do not change once the demodulator is
/// built.
#[derive(Debug, Clone, Copy)]
pub struct SlicerConfig {
    /// Decision threshold offset applied to the mark-minus-space
    /// difference signal.
    pub offset: f64,
    /// Hysteresis, as a fraction of the tracked envelope, around the
    /// threshold (§4.2 step 6a).
    pub hysteresis: f64,
    /// Whether this slicer runs a 9600 bps G3RUH descrambler after
    /// NRZI decode, rather than feeding HDLC directly.
    pub scrambled: bool,
}

impl SlicerConfig {
    /// A slicer at zero offset with the default hysteresis, for AFSK
    /// (unscrambled) channels.
    #[must_use]
    pub fn centered(hysteresis: f64) -> Self {
        Self {
            offset: 0.0,
            hysteresis,
            scrambled: false,
        }
    }
}

/// One bit-decision path: threshold, PLL, NRZI/descramble, and its own
/// HDLC receiver.
pub struct Slicer {
    config: SlicerConfig,
    pll: Pll,
    prev_decision: Option<bool>,
    nrzi: NrziDecoder,
    descrambler: Scrambler,
    hdlc: HdlcReceiver,
}

impl Slicer {
    /// Build a slicer running at `baud` bits/sec against a demodulator
    /// sampling at `sample_rate_hz`.
    #[must_use]
    pub fn new(config: SlicerConfig, sample_rate_hz: f64, baud: f64) -> Self {
        Self {
            config,
            pll: Pll::new(sample_rate_hz, baud),
            prev_decision: None,
            nrzi: NrziDecoder::new(),
            descrambler: Scrambler::new(),
            hdlc: HdlcReceiver::new(),
        }
    }

    /// Feed one sample's worth of the mark-minus-space difference
    /// signal and the current DCD state.
    ///
    /// Returns `Some(Ok(frame))` when a complete, CRC-valid frame (FCS
    /// stripped) completes on this sample, `Some(Err(_))` for an
    /// aborted/corrupt frame just terminated, or `None` otherwise.
    pub fn process(&mut self, diff: f64, envelope: f64, dcd: bool) -> Option<Result<Vec<u8>, HdlcError>> {
        let threshold = self.config.offset;
        let band = self.config.hysteresis * envelope.max(1e-9);
        let decision = if diff - threshold > band {
            true
        } else if diff - threshold < -band {
            false
        } else {
            self.prev_decision.unwrap_or(true)
        };

        if self.prev_decision.is_some_and(|prev| prev != decision) {
            let inertia = if dcd {
                DEFAULT_PLL_LOCKED_INERTIA
            } else {
                DEFAULT_PLL_SEARCHING_INERTIA
            };
            self.pll.resync(inertia);
        }
        self.prev_decision = Some(decision);

        if !self.pll.tick() {
            return None;
        }

        let mut data_bit = self.nrzi.decode(decision);
        if self.config.scrambled {
            data_bit = self.descrambler.descramble_bit(data_bit);
        }

        match self.hdlc.push_bit(data_bit) {
            Ok(Some(frame)) => Some(Ok(frame)),
            Ok(None) => None,
            Err(e) => Some(Err(e)),
        }
    }
}
