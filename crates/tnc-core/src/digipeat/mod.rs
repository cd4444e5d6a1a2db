// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Digipeater engine and recent-frame dedupe (§4.8).
//!
//! [`Digipeater::process`] is the single entry point the packet router
//! calls for each received frame: it resolves the first unused
//! digipeater address against this station's alias rules, applies the
//! configured per-(source channel, destination channel) filter, and
//! checks/records the frame in the dedupe table before handing back a
//! rewritten frame ready to enqueue on the outgoing channel's
//! high-priority lane.

mod alias;
mod dedupe;

pub use alias::{resolve as resolve_alias, AliasDecision};
pub use dedupe::{DedupeKey, DedupeTable};

use crate::ax25::Frame;
use crate::config::MAX_CHANNELS;
use std::time::Duration;

/// Per-(source channel, destination channel) digipeat permission
/// matrix (§4.8 step 3). Defaults to allowing every channel to
/// digipeat to every other channel, including itself.
#[derive(Debug, Clone)]
pub struct DigipeatFilter {
    allowed: [[bool; MAX_CHANNELS]; MAX_CHANNELS],
}

impl DigipeatFilter {
    /// A filter that allows all source/destination channel pairs.
    #[must_use]
    pub fn allow_all() -> Self {
        Self {
            allowed: [[true; MAX_CHANNELS]; MAX_CHANNELS],
        }
    }

    /// Permit or forbid digipeating from `src_channel` to `dst_channel`.
    pub fn set(&mut self, src_channel: usize, dst_channel: usize, allowed: bool) {
        if src_channel < MAX_CHANNELS && dst_channel < MAX_CHANNELS {
            self.allowed[src_channel][dst_channel] = allowed;
        }
    }

    /// Whether a frame received on `src_channel` may be digipeated out
    /// `dst_channel`.
    #[must_use]
    pub fn is_allowed(&self, src_channel: usize, dst_channel: usize) -> bool {
        src_channel < MAX_CHANNELS
            && dst_channel < MAX_CHANNELS
            && self.allowed[src_channel][dst_channel]
    }
}

impl Default for DigipeatFilter {
    fn default() -> Self {
        Self::allow_all()
    }
}

/// Digipeater engine for one station callsign.
pub struct Digipeater {
    my_callsign: String,
    filter: DigipeatFilter,
}

impl Digipeater {
    /// Build a digipeater answering to `my_callsign` (compared
    /// case-insensitively against path addresses), with the given
    /// channel filter.
    #[must_use]
    pub fn new(my_callsign: impl Into<String>, filter: DigipeatFilter) -> Self {
        Self {
            my_callsign: my_callsign.into(),
            filter,
        }
    }

    /// Index of the first digipeater address in `frame.digis` whose
    /// has-been-repeated bit is clear (§4.8 step 1).
    #[must_use]
    pub fn first_unused_digi(frame: &Frame) -> Option<usize> {
        frame.digis.iter().position(|d| !d.c_or_h_bit)
    }

    /// Evaluate a received frame for digipeating from `src_channel` to
    /// `dst_channel`.
    ///
    /// Returns `Some(rewritten_frame)` when the frame should be
    /// retransmitted (enqueued high-priority by the caller), or `None`
    /// when it should be dropped: no eligible digipeater hop, the
    /// channel filter forbids it, or it is a suppressed duplicate.
    pub fn process(
        &self,
        frame: &Frame,
        src_channel: usize,
        dst_channel: usize,
        dedupe: &mut DedupeTable,
        now: Duration,
    ) -> Option<Frame> {
        let idx = Self::first_unused_digi(frame)?;

        let mut rewritten = frame.clone();
        let decision = resolve_alias(&mut rewritten.digis[idx], &self.my_callsign);
        if decision == AliasDecision::NotMine {
            return None;
        }

        if !self.filter.is_allowed(src_channel, dst_channel) {
            return None;
        }

        let key = DedupeKey::new(
            &rewritten.source.callsign,
            &rewritten.destination.callsign,
            &rewritten.info,
        );
        if dedupe.check_and_record(key, now) {
            return None;
        }

        Some(rewritten)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ax25::Address;

    fn frame_via(digi_call: &str, digi_ssid: u8) -> Frame {
        Frame::new_ui(
            Address::new("N0CALL", 0, false).unwrap(),
            Address::new("APRS", 0, false).unwrap(),
            vec![Address::new(digi_call, digi_ssid, false).unwrap()],
            0xF0,
            b"test".to_vec(),
        )
        .unwrap()
    }

    #[test]
    fn digipeats_through_a_wide_alias_and_marks_hop_consumed() {
        let digi = Digipeater::new("N0CALL", DigipeatFilter::allow_all());
        let mut dedupe = DedupeTable::new();
        let frame = frame_via("WIDE1", 1);
        let out = digi
            .process(&frame, 0, 0, &mut dedupe, Duration::from_secs(0))
            .expect("should digipeat");
        assert!(out.digis[0].c_or_h_bit);
    }

    #[test]
    fn does_not_digipeat_when_no_unused_digi() {
        let digi = Digipeater::new("N0CALL", DigipeatFilter::allow_all());
        let mut dedupe = DedupeTable::new();
        let mut frame = frame_via("WIDE1", 1);
        frame.digis[0].c_or_h_bit = true;
        assert!(digi
            .process(&frame, 0, 0, &mut dedupe, Duration::from_secs(0))
            .is_none());
    }

    #[test]
    fn unrelated_digi_is_not_retransmitted() {
        let digi = Digipeater::new("N0CALL", DigipeatFilter::allow_all());
        let mut dedupe = DedupeTable::new();
        let frame = frame_via("OTHERCALL", 0);
        assert!(digi
            .process(&frame, 0, 0, &mut dedupe, Duration::from_secs(0))
            .is_none());
    }

    #[test]
    fn channel_filter_can_block_cross_channel_digipeat() {
        let mut filter = DigipeatFilter::allow_all();
        filter.set(0, 1, false);
        let digi = Digipeater::new("N0CALL", filter);
        let mut dedupe = DedupeTable::new();
        let frame = frame_via("WIDE1", 1);
        assert!(digi
            .process(&frame, 0, 1, &mut dedupe, Duration::from_secs(0))
            .is_none());
        assert!(digi
            .process(&frame, 0, 0, &mut dedupe, Duration::from_secs(0))
            .is_some());
    }

    #[test]
    fn duplicate_within_window_is_suppressed() {
        let digi = Digipeater::new("N0CALL", DigipeatFilter::allow_all());
        let mut dedupe = DedupeTable::new();
        let frame = frame_via("WIDE1", 1);
        assert!(digi
            .process(&frame, 0, 0, &mut dedupe, Duration::from_secs(0))
            .is_some());
        assert!(digi
            .process(&frame, 0, 0, &mut dedupe, Duration::from_secs(5))
            .is_none());
        assert!(digi
            .process(&frame, 0, 0, &mut dedupe, Duration::from_secs(31))
            .is_some());
    }
}
