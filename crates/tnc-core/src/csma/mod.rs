// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! CSMA channel-access scheduler (§4.6).
//!
//! Implements the classic "p-persistent" AX.25 channel access algorithm:
//! wait one slot time, then draw a random octet; if it falls at or below
//! the configured persistence parameter, key up, otherwise repeat. DCD
//! (squelch) being asserted suspends the loop without drawing. A
//! full-duplex channel skips the whole thing and keys up immediately.
//!
//! The decision loop is generic over its random source, DCD gate and
//! sleep function so it can be driven by a deterministic RNG and a
//! non-blocking clock in tests, and by [`rand`] plus real PTT/DCD
//! hardware at runtime.

use crate::config::ChannelParams;
use crate::tnc_trace_debug;
use std::time::Duration;

/// Drives the p-persistent channel-access decision loop.
///
/// `dcd_busy` is polled before every slot-time wait; `rng` is drawn once
/// per slot after the channel has been clear for one full slot time.
pub struct ChannelAccess<R, D, S> {
    persist: u8,
    slottime: Duration,
    rng: R,
    dcd_busy: D,
    sleep: S,
}

impl<R, D, S> ChannelAccess<R, D, S>
where
    R: FnMut() -> u8,
    D: FnMut() -> bool,
    S: FnMut(Duration),
{
    /// Build a channel-access driver from explicit parameters and
    /// injected RNG/DCD/sleep functions.
    pub fn new(persist: u8, slottime: Duration, rng: R, dcd_busy: D, sleep: S) -> Self {
        Self {
            persist,
            slottime,
            rng,
            dcd_busy,
            sleep,
        }
    }

    /// Block (via the injected `sleep`) until the channel is won, then
    /// return the total time spent waiting.
    ///
    /// `full_duplex` bypasses the whole algorithm: zero delay, transmit
    /// immediately regardless of DCD.
    pub fn acquire(&mut self, full_duplex: bool) -> Duration {
        if full_duplex {
            return Duration::ZERO;
        }
        let mut total = Duration::ZERO;
        loop {
            while (self.dcd_busy)() {
                (self.sleep)(self.slottime);
                total += self.slottime;
            }
            (self.sleep)(self.slottime);
            total += self.slottime;
            let draw = (self.rng)();
            if draw <= self.persist {
                tnc_trace_debug!("csma: won channel after {total:?}, draw={draw}");
                return total;
            }
        }
    }
}

/// Run the assert-PTT / txdelay / send / txtail / deassert-PTT sequence
/// for one transmission.
///
/// `ptt` is called with `true` to key up and `false` to unkey;
/// `send_frames` is invoked once txdelay has elapsed and should write
/// every queued frame for this transmission opportunity before
/// returning.
pub fn transmit_sequence(
    params: &ChannelParams,
    mut ptt: impl FnMut(bool),
    mut sleep: impl FnMut(Duration),
    mut send_frames: impl FnMut(),
) {
    ptt(true);
    sleep(Duration::from_millis(u64::from(params.txdelay_ms)));
    send_frames();
    sleep(Duration::from_millis(u64::from(params.txtail_ms)));
    ptt(false);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_duplex_bypasses_the_algorithm() {
        let mut access = ChannelAccess::new(63, Duration::from_millis(100), || 0, || true, |_| {});
        assert_eq!(access.acquire(true), Duration::ZERO);
    }

    #[test]
    fn scenario_two_failed_draws_then_success() {
        // persist=63, slottime=100ms, draws 200 then 50 (§8 scenario 4).
        let mut draws = [200u8, 50u8].into_iter();
        let mut slept = Duration::ZERO;
        let mut access = ChannelAccess::new(
            63,
            Duration::from_millis(100),
            || draws.next().expect("only two draws expected"),
            || false,
            |d| slept += d,
        );
        let total = access.acquire(false);
        assert_eq!(total, Duration::from_millis(200));
        assert_eq!(slept, Duration::from_millis(200));
    }

    #[test]
    fn dcd_busy_waits_without_drawing() {
        let mut dcd_calls = 0u32;
        let mut busy_for = 2;
        let mut access = ChannelAccess::new(
            255,
            Duration::from_millis(50),
            || 0,
            || {
                dcd_calls += 1;
                if busy_for > 0 {
                    busy_for -= 1;
                    true
                } else {
                    false
                }
            },
            |_| {},
        );
        access.acquire(false);
        assert!(dcd_calls >= 3); // two busy polls + one clear poll
    }

    #[test]
    fn transmit_sequence_keys_ptt_around_send() {
        let params = ChannelParams {
            txdelay_ms: 300,
            txtail_ms: 50,
            slottime_ms: 100,
            persist: 63,
            full_duplex: false,
        };
        let mut events: Vec<String> = Vec::new();
        transmit_sequence(
            &params,
            |on| events.push(format!("ptt={on}")),
            |d| events.push(format!("sleep={}", d.as_millis())),
            || events.push("send".into()),
        );
        assert_eq!(
            events,
            vec!["ptt=true", "sleep=300", "send", "sleep=50", "ptt=false"]
        );
    }
}
