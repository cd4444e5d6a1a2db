// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Audio/PTT driver trait boundary (§6): the core never talks to a
//! sound card or a radio's PTT line directly, only through these
//! traits, so it can run against `NullPtt` and a synthetic source in
//! tests, or an offline WAV file, with identical downstream code.

use std::io;

/// A live audio input device (§6: "opens a device at a requested
/// sample rate and channel count; delivers samples to the core by a
/// per-channel callback at sample rate").
pub trait AudioSource: Send {
    /// Open the device and begin delivering samples to `callback`:
    /// `(channel_index, sample)` called once per sample, per channel,
    /// at `sample_rate_hz`. Must not block the caller past device
    /// setup; delivery happens on the device's own driver thread.
    fn start(
        &mut self,
        sample_rate_hz: u32,
        channels: u16,
        callback: Box<dyn FnMut(usize, f64) + Send>,
    ) -> io::Result<()>;

    /// Stop delivering samples and release the device.
    fn stop(&mut self);
}

/// A live audio output device (§6: "accepts outbound PCM from the
/// tone generator via a non-blocking enqueue").
pub trait AudioSink: Send {
    /// Queue `samples` for channel `channel` without blocking.
    /// Returns `false` if the internal buffer was full and the
    /// samples were dropped.
    fn enqueue(&mut self, channel: usize, samples: &[f32]) -> bool;
}

/// A radio's push-to-talk control line (§6: "accepts `set(channel,
/// on|off)` calls from the transmit scheduler; idempotent; failure
/// logged but non-fatal").
pub trait PttDriver: Send + Sync {
    /// Key (`on = true`) or unkey (`on = false`) `channel`'s
    /// transmitter. Calling with the same value twice in a row must
    /// be a harmless no-op.
    fn set(&self, channel: usize, on: bool) -> io::Result<()>;
}

/// A `PttDriver` that only logs: the only concrete PTT implementation
/// shipped in-tree, enough to construct and exercise the runtime
/// without real radio hardware attached.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullPtt;

impl PttDriver for NullPtt {
    fn set(&self, channel: usize, on: bool) -> io::Result<()> {
        log::debug!("null ptt: channel {channel} -> {}", if on { "key" } else { "unkey" });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_ptt_always_succeeds() {
        let ptt = NullPtt;
        assert!(ptt.set(0, true).is_ok());
        assert!(ptt.set(0, false).is_ok());
    }
}
