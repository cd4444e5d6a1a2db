// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! KISS frame codec and host-facing endpoints (§4.9).
//!
//! [`KissCodec`] implements the byte-stuffing state machine shared by
//! every endpoint kind; [`endpoint`] wraps it around a pseudo-terminal,
//! serial port, or TCP socket so the rest of the core only ever deals
//! in decoded `(command, channel, payload)` frames.

mod command;
pub mod endpoint;

pub use command::KissCommand;

use crate::config::{KISS_FEND, KISS_FESC, KISS_MAX_FRAME_LEN, KISS_TFEND, KISS_TFESC};
use std::fmt;

/// KISS codec failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KissError {
    /// An escape byte (`FESC`) was followed by something other than
    /// `TFEND`/`TFESC`.
    InvalidEscape(u8),
    /// A frame exceeded [`KISS_MAX_FRAME_LEN`] and was truncated.
    FrameTooLong,
    /// A frame's first byte (command/channel nibble) was missing.
    EmptyFrame,
}

impl fmt::Display for KissError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidEscape(b) => write!(f, "invalid KISS escape sequence FESC {b:02X}"),
            Self::FrameTooLong => write!(f, "KISS frame exceeded {KISS_MAX_FRAME_LEN} bytes, truncated"),
            Self::EmptyFrame => write!(f, "empty KISS frame"),
        }
    }
}

impl std::error::Error for KissError {}

/// A decoded KISS frame: channel/port nibble, command, and body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KissFrame {
    pub channel: u8,
    pub command: KissCommand,
    pub body: Vec<u8>,
}

/// Escape `payload` and wrap it in leading/trailing `FEND`s (§4.9
/// encoder).
#[must_use]
pub fn encode(channel: u8, command: KissCommand, body: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(body.len() + 4);
    out.push(KISS_FEND);
    push_escaped(&mut out, (channel << 4) | command.nibble());
    for &b in body {
        push_escaped(&mut out, b);
    }
    out.push(KISS_FEND);
    out
}

fn push_escaped(out: &mut Vec<u8>, byte: u8) {
    match byte {
        KISS_FEND => {
            out.push(KISS_FESC);
            out.push(KISS_TFEND);
        }
        KISS_FESC => {
            out.push(KISS_FESC);
            out.push(KISS_TFESC);
        }
        b => out.push(b),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Searching,
    Collecting,
    Escaped,
}

/// Incremental KISS decoder state machine (§3 Data Model: `{SEARCHING,
/// COLLECTING}`).
///
/// Feed raw bytes one at a time via [`KissCodec::push_byte`]; a
/// complete frame is returned as soon as its closing `FEND` arrives.
/// Consecutive `FEND`s with nothing collected between them are ignored
/// rather than reported as empty frames.
pub struct KissCodec {
    state: State,
    buf: Vec<u8>,
}

impl KissCodec {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: State::Searching,
            buf: Vec::new(),
        }
    }

    /// Feed one raw byte from the endpoint's byte stream.
    ///
    /// Returns `Some(Ok(frame))` on a completed frame, `Some(Err(_))`
    /// for a malformed escape or an oversized frame (truncated and
    /// still decoded), or `None` while mid-frame.
    pub fn push_byte(&mut self, byte: u8) -> Option<Result<KissFrame, KissError>> {
        match self.state {
            State::Searching => {
                if byte == KISS_FEND {
                    self.state = State::Collecting;
                    self.buf.clear();
                }
                None
            }
            State::Collecting => match byte {
                KISS_FEND => {
                    if self.buf.is_empty() {
                        None
                    } else {
                        self.state = State::Searching;
                        Some(self.finish())
                    }
                }
                KISS_FESC => {
                    self.state = State::Escaped;
                    None
                }
                b => {
                    self.collect(b);
                    None
                }
            },
            State::Escaped => {
                self.state = State::Collecting;
                match byte {
                    KISS_TFEND => {
                        self.collect(KISS_FEND);
                        None
                    }
                    KISS_TFESC => {
                        self.collect(KISS_FESC);
                        None
                    }
                    other => Some(Err(KissError::InvalidEscape(other))),
                }
            }
        }
    }

    fn collect(&mut self, byte: u8) {
        if self.buf.len() < KISS_MAX_FRAME_LEN {
            self.buf.push(byte);
        }
    }

    fn finish(&mut self) -> Result<KissFrame, KissError> {
        if self.buf.is_empty() {
            return Err(KissError::EmptyFrame);
        }
        let header = self.buf[0];
        let channel = header >> 4;
        let command = KissCommand::from_nibble(header & 0x0F);
        let body = self.buf[1..].to_vec();
        let truncated = self.buf.len() >= KISS_MAX_FRAME_LEN;
        self.buf.clear();
        if truncated {
            log::warn!("KISS frame exceeded {KISS_MAX_FRAME_LEN} bytes, truncated and dropped");
            return Err(KissError::FrameTooLong);
        }
        Ok(KissFrame { channel, command, body })
    }
}

impl Default for KissCodec {
    fn default() -> Self {
        Self::new()
    }
}
