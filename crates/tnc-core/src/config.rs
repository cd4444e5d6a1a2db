// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Global configuration - Single Source of Truth
//!
//! This module centralizes the wire-format constants (CRC polynomial, KISS
//! delimiter bytes, TNC-protocol header length) that must never drift, plus
//! [`RuntimeConfig`] for the handful of per-channel values an operator, a
//! `KISS` "set hardware" command, or the (out of scope) host config-file
//! parser may change at runtime.
//!
//! # Architecture
//!
//! - **Level 1 (static)**: compile-time constants (§4.3, §4.9, §4.10 wire formats)
//! - **Level 2 (dynamic)**: [`RuntimeConfig`] / [`ChannelParams`], updated via `ArcSwap`
//!
//! # Performance
//!
//! - Lock-free: `ArcSwap` per channel (no `RwLock` contention on the hot
//!   CSMA decision path, which reads these values every slot time).

use arc_swap::ArcSwap;
use std::sync::Arc;

// =======================================================================
// Channel limits (§3 Data Model)
// =======================================================================

/// Maximum number of logical radio channels the core supports.
pub const MAX_CHANNELS: usize = 6;

/// Default TCP port for the TNC server (§4.10, §6).
pub const DEFAULT_TNC_SERVER_PORT: u16 = 8000;

/// Maximum concurrent TNC-protocol TCP clients.
pub const MAX_TNC_CLIENTS: usize = 32;

/// Maximum entries in the registered-callsign table.
pub const MAX_REGISTERED_CALLSIGNS: usize = 256;

// =======================================================================
// HDLC / AX.25 wire constants (§4.3, §4.4, §4.7)
// =======================================================================

/// HDLC flag octet (01111110).
pub const HDLC_FLAG: u8 = 0x7E;

/// CRC-16/X-25 polynomial used for AX.25 FCS (reflected form 0x8408).
pub const AX25_CRC_POLY: u16 = 0x1021;

/// CRC-16/X-25 initial register value.
pub const AX25_CRC_INIT: u16 = 0xFFFF;

/// Expected residual of a valid frame+FCS when run back through the CRC.
pub const AX25_CRC_GOOD_RESIDUE: u16 = 0xF0B8;

/// Maximum AX.25 information field length commonly carried over the air.
pub const AX25_MAX_INFO_LEN: usize = 256;

/// Maximum number of digipeater addresses in a path (destination + source
/// + up to 8 repeaters, per AX.25 2.0).
pub const AX25_MAX_DIGIS: usize = 8;

// =======================================================================
// Demodulator defaults (§4.2)
// =======================================================================

/// Default AFSK audio sample rate, Hz.
pub const DEFAULT_SAMPLE_RATE_HZ: f64 = 9600.0;

/// Default hysteresis fraction of the tracked envelope applied around a
/// slicer's decision threshold.
pub const DEFAULT_SLICER_HYSTERESIS: f64 = 0.05;

/// PLL register scale-down applied on a detected transition while
/// data-carrier-detect is asserted (tighter lock, less phase noise).
pub const DEFAULT_PLL_LOCKED_INERTIA: f64 = 0.74;

/// PLL register scale-down applied on a detected transition while no
/// carrier is detected (looser, faster acquisition).
pub const DEFAULT_PLL_SEARCHING_INERTIA: f64 = 0.50;

/// Squelch threshold, as a fraction of the AGC quick-level envelope,
/// above which a channel is considered to have a carrier present (used
/// to pick locked vs. searching PLL inertia, and to gate CSMA DCD).
pub const DEFAULT_DCD_THRESHOLD: f64 = 0.15;

// =======================================================================
// KISS wire constants (§4.9)
// =======================================================================

/// Frame End delimiter.
pub const KISS_FEND: u8 = 0xC0;
/// Frame Escape.
pub const KISS_FESC: u8 = 0xDB;
/// Transposed FEND.
pub const KISS_TFEND: u8 = 0xDC;
/// Transposed FESC.
pub const KISS_TFESC: u8 = 0xDD;

/// Maximum bytes collected for one KISS frame before it is truncated.
///
/// §9 Design Notes: the source inconsistently truncates or logs when a
/// frame exceeds this; this core always truncates *and* logs (§9 open
/// question resolution, see DESIGN.md).
pub const KISS_MAX_FRAME_LEN: usize = 2048;

// =======================================================================
// Transmit queue / CSMA defaults (§4.5, §4.6)
// =======================================================================

/// Default bound on frames queued per (channel, priority).
pub const DEFAULT_TX_QUEUE_LIMIT: usize = 20;

/// Default TX-delay in milliseconds (preamble duration before first frame).
pub const DEFAULT_TXDELAY_MS: u32 = 300;

/// Default TX-tail in milliseconds (trailing flags after the last frame).
pub const DEFAULT_TXTAIL_MS: u32 = 50;

/// Default CSMA slot time in milliseconds.
pub const DEFAULT_SLOTTIME_MS: u32 = 100;

/// Default CSMA persistence parameter (0-255).
pub const DEFAULT_PERSIST: u8 = 63;

/// Default dedupe window in milliseconds (§4.8 step 4, §8 scenario 3).
pub const DEFAULT_DEDUPE_WINDOW_MS: u64 = 30_000;

/// Bound on the number of entries tracked per channel in the dedupe table.
pub const DEDUPE_TABLE_CAPACITY: usize = 512;

/// TCP read timeout (§5 Cancellation & timeout semantics).
pub const TCP_READ_TIMEOUT_MS: u64 = 30_000;

/// Queue poll timeout used during shutdown (§5).
pub const SHUTDOWN_POLL_TIMEOUT_MS: u64 = 1_000;

// =======================================================================
// Per-channel runtime-tunable parameters
// =======================================================================

/// The subset of channel parameters a KISS "set hardware" command (§4.9)
/// or an operator command can change while the TNC is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelParams {
    /// TX-delay, in milliseconds.
    pub txdelay_ms: u32,
    /// TX-tail, in milliseconds.
    pub txtail_ms: u32,
    /// CSMA slot time, in milliseconds.
    pub slottime_ms: u32,
    /// CSMA persistence (0-255; see §4.6 step 3).
    pub persist: u8,
    /// Full-duplex flag (§4.6: skips DCD/persistence checks when set).
    pub full_duplex: bool,
}

impl Default for ChannelParams {
    fn default() -> Self {
        Self {
            txdelay_ms: DEFAULT_TXDELAY_MS,
            txtail_ms: DEFAULT_TXTAIL_MS,
            slottime_ms: DEFAULT_SLOTTIME_MS,
            persist: DEFAULT_PERSIST,
            full_duplex: false,
        }
    }
}

/// Lock-free, hot-reloadable runtime configuration for up to
/// [`MAX_CHANNELS`] channels.
///
/// The CSMA scheduler reads a channel's [`ChannelParams`] on every slot-time
/// retry (§4.6); a `Mutex`/`RwLock` there would serialize every channel's
/// decision loop against KISS command updates. `ArcSwap` keeps the read side
/// a single atomic load.
pub struct RuntimeConfig {
    channels: Vec<Arc<ArcSwap<ChannelParams>>>,
}

impl RuntimeConfig {
    /// Build a runtime config with default parameters for `channel_count`
    /// channels (clamped to [`MAX_CHANNELS`]).
    #[must_use]
    pub fn new(channel_count: usize) -> Self {
        let count = channel_count.min(MAX_CHANNELS).max(1);
        Self {
            channels: (0..count)
                .map(|_| Arc::new(ArcSwap::new(Arc::new(ChannelParams::default()))))
                .collect(),
        }
    }

    /// Number of channels this config was built for.
    #[must_use]
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Snapshot the current parameters for a channel.
    #[must_use]
    pub fn params(&self, channel: usize) -> Option<ChannelParams> {
        self.channels.get(channel).map(|slot| **slot.load())
    }

    /// Atomically replace a channel's parameters.
    pub fn set_params(&self, channel: usize, params: ChannelParams) -> bool {
        match self.channels.get(channel) {
            Some(slot) => {
                slot.store(Arc::new(params));
                true
            }
            None => false,
        }
    }

    /// Update one field of a channel's parameters via a closure, returning
    /// whether the channel existed.
    pub fn update_params(&self, channel: usize, f: impl FnOnce(&mut ChannelParams)) -> bool {
        match self.channels.get(channel) {
            Some(slot) => {
                let mut params = **slot.load();
                f(&mut params);
                slot.store(Arc::new(params));
                true
            }
            None => false,
        }
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self::new(1)
    }
}
