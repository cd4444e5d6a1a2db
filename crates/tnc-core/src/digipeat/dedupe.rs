// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Recent-frame dedupe table (§3, §4.8 step 4, §8 scenario 3).
//!
//! Keyed by (source, destination, 16-bit info-field hash); a match
//! within the configured window on the same outgoing channel suppresses
//! a repeat digipeat. `now` is passed in by the caller (a `Duration`
//! since some fixed epoch) rather than read from the system clock, so
//! the window logic is deterministic and testable (§8 scenario 3: t=0,
//! t=5s, t=31s).

use crate::config::{DEDUPE_TABLE_CAPACITY, DEFAULT_DEDUPE_WINDOW_MS};
use lru::LruCache;
use std::num::NonZeroUsize;
use std::time::Duration;

/// Identifies a frame for dedupe purposes, independent of its digipeater
/// path or control bits.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupeKey {
    pub source: String,
    pub destination: String,
    pub info_hash: u16,
}

impl DedupeKey {
    /// Build a dedupe key from a frame's source/destination callsigns
    /// and its information field, hashed with the same CRC-16 already
    /// used for the HDLC frame check sequence (§4.8 step 4: "a 16-bit
    /// hash of the information field").
    #[must_use]
    pub fn new(source: &str, destination: &str, info: &[u8]) -> Self {
        Self {
            source: source.to_string(),
            destination: destination.to_string(),
            info_hash: crate::hdlc::crc::fcs(info),
        }
    }
}

/// Bounded, per-channel recent-frame table with an explicit suppression
/// window.
pub struct DedupeTable {
    seen: LruCache<DedupeKey, Duration>,
    window: Duration,
}

impl DedupeTable {
    /// Build a table bounded at [`DEDUPE_TABLE_CAPACITY`] entries with
    /// the default suppression window.
    #[must_use]
    pub fn new() -> Self {
        Self::with_params(DEDUPE_TABLE_CAPACITY, Duration::from_millis(DEFAULT_DEDUPE_WINDOW_MS))
    }

    /// Build a table with an explicit capacity and window.
    #[must_use]
    pub fn with_params(capacity: usize, window: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).expect("capacity clamped to >= 1");
        Self {
            seen: LruCache::new(capacity),
            window,
        }
    }

    /// Check `key` against the table at time `now`.
    ///
    /// Returns `true` if this is a duplicate within the window (the
    /// frame should be suppressed) and leaves the table unchanged in
    /// that case, refreshing nothing so the *original* window keeps
    /// counting down. Returns `false` and records `(key, now)` — first
    /// sighting, or the previous sighting has aged out of the window.
    pub fn check_and_record(&mut self, key: DedupeKey, now: Duration) -> bool {
        if let Some(&seen_at) = self.seen.get(&key) {
            if now.saturating_sub(seen_at) < self.window {
                return true;
            }
        }
        self.seen.put(key, now);
        false
    }
}

impl Default for DedupeTable {
    fn default() -> Self {
        Self::new()
    }
}
