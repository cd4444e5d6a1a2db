// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Automatic gain control: fast-attack/slow-decay peak tracking and
//! signal-level reporting (§4.2).

/// An asymmetric peak follower: rises quickly toward a larger input,
/// decays slowly otherwise. Used both inside the slicer-feeding AGC and
/// for the independent "how strong is this signal" meters.
#[derive(Debug, Clone, Copy)]
pub struct PeakFollower {
    attack: f64,
    decay: f64,
    level: f64,
}

impl PeakFollower {
    /// `attack`/`decay` are per-sample exponential coefficients in
    /// `(0.0, 1.0]`; larger is faster.
    #[must_use]
    pub fn new(attack: f64, decay: f64) -> Self {
        Self {
            attack,
            decay,
            level: 0.0,
        }
    }

    /// Feed one rectified (non-negative) sample, return the updated level.
    pub fn update(&mut self, magnitude: f64) -> f64 {
        let rate = if magnitude > self.level {
            self.attack
        } else {
            self.decay
        };
        self.level += (magnitude - self.level) * rate;
        self.level
    }

    /// Current tracked level.
    #[must_use]
    pub fn level(&self) -> f64 {
        self.level
    }
}

/// Per-channel AGC: centers and scales the incoming signal to roughly
/// `[-1, 1]` using independent positive/negative peak tracking (so an
/// asymmetric, DC-biased input is still centered correctly), plus a
/// separate "quick" (fast) and "sluggish" (slow) level pair purely for
/// reporting signal strength to an operator or the TNC protocol (§4.2,
/// §6), decoupled from the tracking used to drive the slicer.
pub struct Agc {
    pos_peak: PeakFollower,
    neg_peak: PeakFollower,
    quick: PeakFollower,
    sluggish: PeakFollower,
}

impl Agc {
    /// Fast-attack/slow-decay AGC with the reporting trackers at their
    /// conventional, much slower time constants.
    #[must_use]
    pub fn new() -> Self {
        Self {
            pos_peak: PeakFollower::new(0.5, 0.002_5),
            neg_peak: PeakFollower::new(0.5, 0.002_5),
            quick: PeakFollower::new(0.1, 0.01),
            sluggish: PeakFollower::new(0.002, 0.000_2),
        }
    }

    /// Normalize one input sample to approximately `[-1, 1]`.
    pub fn process(&mut self, sample: f64) -> f64 {
        let pos = self.pos_peak.update(sample.max(0.0));
        let neg = self.neg_peak.update((-sample).max(0.0));
        self.quick.update(sample.abs());
        self.sluggish.update(sample.abs());

        let center = (pos - neg) / 2.0;
        let half_range = ((pos + neg) / 2.0).max(1e-6);
        (sample - center) / half_range
    }

    /// Fast-responding signal level, for a live meter.
    #[must_use]
    pub fn quick_level(&self) -> f64 {
        self.quick.level()
    }

    /// Slow-responding signal level, for a more stable average reading.
    #[must_use]
    pub fn sluggish_level(&self) -> f64 {
        self.sluggish.level()
    }
}

impl Default for Agc {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn peak_follower_attacks_faster_than_it_decays() {
        let mut pf = PeakFollower::new(0.9, 0.01);
        pf.update(1.0);
        let after_rise = pf.level();
        pf.update(0.0);
        let after_fall = pf.level();
        assert!(after_rise > 0.8);
        assert!(after_fall < after_rise && after_fall > after_rise * 0.9);
    }

    #[test]
    fn agc_normalizes_a_centered_sine_toward_unit_amplitude() {
        let mut agc = Agc::new();
        let mut last = 0.0;
        for n in 0..4000 {
            let sample = (n as f64 * 0.3).sin() * 0.2;
            last = agc.process(sample);
        }
        assert!(last.abs() <= 1.5);
    }

    #[test]
    fn quick_level_responds_faster_than_sluggish() {
        let mut agc = Agc::new();
        for _ in 0..20 {
            agc.process(1.0);
        }
        assert!(agc.quick_level() > agc.sluggish_level());
    }
}
