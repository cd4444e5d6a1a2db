// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # tnc-core - software modem and packet TNC core
//!
//! Demodulates an audio stream into AX.25 frames, and performs the inverse
//! path for transmission: assembles frames, HDLC-encodes them, generates
//! audio tones, and keys a radio's push-to-talk line. A packet router sits
//! between the two directions, applying digipeater rules, duplicate
//! suppression and CSMA channel-access timing.
//!
//! ## Architecture
//!
//! ```text
//! +----------------------------------------------------------------+
//! |  audio in -> Demodulator -> HdlcReceiver -> Frame -> router     |
//! |  router -> Digipeater/Dedupe -> TxQueue -> Csma -> HdlcTransmit |
//! |  HdlcTransmit -> ToneGenerator -> audio out, PTT                |
//! +----------------------------------------------------------------+
//! |  KISS codec  <-> pty/serial/TCP endpoints                      |
//! |  TncServer   <-> TCP clients (AGW-style binary protocol)        |
//! +----------------------------------------------------------------+
//! ```
//!
//! ## Modules Overview
//!
//! - [`ax25`] - frame object and wire/text encoding (§4.4)
//! - [`hdlc`] - bit-level HDLC receive/transmit, CRC (§4.3, §4.7)
//! - [`dsp`] - filter synthesis (§4.1)
//! - [`demod`] - demodulator state machine (§4.2)
//! - [`tone`] - tone generator / G3RUH baseband (§4.7)
//! - [`txqueue`] - per-channel transmit queue (§4.5)
//! - [`csma`] - channel-access scheduler (§4.6)
//! - [`digipeat`] - digipeater + dedupe (§4.8)
//! - [`kiss`] - KISS frame codec + endpoints (§4.9)
//! - [`tncserver`] - TNC TCP protocol server (§4.10)
//! - [`audio`] - external audio/PTT driver boundary, offline WAV source (§6)
//! - [`runtime`] - wires every subsystem together; `init`/`shutdown` entry points

// Clippy: No blanket suppressions. Fix issues properly or use inline #[allow] with justification.

extern crate self as tnc_core;

/// Crate-wide error types and the public `Result` alias.
pub mod error;
/// Global configuration: wire-format constants + hot-reloadable `RuntimeConfig`.
pub mod config;
/// Compile-time configurable protocol tracing (zero-cost when disabled).
pub mod logging;

/// Filter synthesis: windowed low-pass/band-pass/correlator kernels (§4.1).
pub mod dsp;
/// Per-channel demodulator state machine: AGC, PLL, slicers, NRZI, descrambler (§4.2).
pub mod demod;
/// HDLC bit-level receive/transmit, CRC-16, bit (de)stuffing (§4.3, §4.7).
pub mod hdlc;
/// AX.25 frame object: addresses, control/PID, wire and text encoding (§4.4).
pub mod ax25;
/// Per-channel transmit queue with high/low priority FIFOs (§4.5).
pub mod txqueue;
/// CSMA channel-access scheduler (§4.6).
pub mod csma;
/// Tone generator: AFSK Mark/Space and 9600 bps G3RUH baseband (§4.7).
pub mod tone;
/// Digipeater alias resolution and recent-frame dedupe (§4.8).
pub mod digipeat;
/// KISS frame codec and pty/serial/TCP endpoints (§4.9).
pub mod kiss;
/// TNC TCP server protocol (§4.10).
pub mod tncserver;
/// External audio/PTT driver traits and the offline WAV file source (§6).
pub mod audio;
/// Top-level runtime: owns every channel's subsystems, thread orchestration.
pub mod runtime;

pub use error::{Error, Result};
pub use runtime::Tnc;

/// tnc-core version string.
pub const VERSION: &str = "0.1.0";
